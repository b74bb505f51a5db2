//! Aggregate statistics over student marks.

use serde::Serialize;

use crate::store::{Mark, Student};

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct MarkStats {
    pub count: usize,
    pub average: f64,
    pub min: u8,
    pub max: u8,
}

impl MarkStats {
    /// All fields are zero when there are no marks.
    pub fn from_marks<I>(marks: I) -> Self
    where
        I: IntoIterator<Item = Mark>,
    {
        let mut count = 0_usize;
        let mut sum = 0_u64;
        let mut min = u8::MAX;
        let mut max = u8::MIN;

        for mark in marks {
            let value = mark.get();
            count += 1;
            sum += u64::from(value);
            min = min.min(value);
            max = max.max(value);
        }

        if count == 0 {
            return Self::default();
        }

        Self {
            count,
            average: sum as f64 / count as f64,
            min,
            max,
        }
    }

    pub fn from_students(students: &[Student]) -> Self {
        Self::from_marks(students.iter().map(|student| student.mark))
    }
}
