//! Turns loosely typed JSON request bodies into validated store inputs.
//!
//! Marks may arrive as JSON integers or as numeric strings (`"55"`, `" -3 "`); both
//! go through [`parse_mark`] so create and update reject exactly the same values.

use axum::extract::rejection::JsonRejection;
use axum::Json;
use serde_json::{Map, Value};

use crate::store::{Mark, NewStudent, StudentPatch};

use super::error::{ApiError, TextField};

pub type JsonObject = Map<String, Value>;

/// Accept only a successfully extracted JSON object.
pub fn json_object(payload: Result<Json<Value>, JsonRejection>) -> Result<JsonObject, ApiError> {
    match payload {
        Ok(Json(Value::Object(object))) => Ok(object),
        _ => Err(ApiError::InvalidBody),
    }
}

/// A mark as it appeared on the wire, before range checking.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RawMark {
    Integer(i64),
    Rejected,
}

impl RawMark {
    fn classify(value: &Value) -> Self {
        match value {
            Value::Number(number) => number.as_i64().map_or(Self::Rejected, Self::Integer),
            Value::String(text) => {
                parse_signed_digits(text.trim()).map_or(Self::Rejected, Self::Integer)
            }
            Value::Null | Value::Bool(_) | Value::Array(_) | Value::Object(_) => Self::Rejected,
        }
    }
}

/// Optional leading `-` followed by one or more ASCII digits.
fn parse_signed_digits(text: &str) -> Option<i64> {
    let digits = text.strip_prefix('-').unwrap_or(text);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    text.parse::<i64>().ok()
}

pub fn parse_mark(value: &Value) -> Result<Mark, ApiError> {
    match RawMark::classify(value) {
        RawMark::Integer(mark) => Mark::new(mark).ok_or(ApiError::InvalidMark),
        RawMark::Rejected => Err(ApiError::InvalidMark),
    }
}

/// A string that is non-empty after trimming; returns the trimmed form.
fn non_blank(value: &Value) -> Option<String> {
    value
        .as_str()
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .map(str::to_string)
}

fn required_text(body: &JsonObject, field: TextField) -> Result<String, ApiError> {
    body.get(field.key())
        .and_then(non_blank)
        .ok_or(ApiError::MissingField(field))
}

/// `null` counts as absent; anything else must be a non-blank string.
fn optional_text(body: &JsonObject, field: TextField) -> Result<Option<String>, ApiError> {
    match body.get(field.key()) {
        None | Some(Value::Null) => Ok(None),
        Some(value) => non_blank(value)
            .map(Some)
            .ok_or(ApiError::InvalidField(field)),
    }
}

fn optional_mark(body: &JsonObject) -> Result<Option<Mark>, ApiError> {
    body.get("mark").map(parse_mark).transpose()
}

pub fn parse_new_student(body: &JsonObject) -> Result<NewStudent, ApiError> {
    let name = required_text(body, TextField::Name)?;
    let course = required_text(body, TextField::Course)?;
    let mark = optional_mark(body)?.unwrap_or_default();

    Ok(NewStudent { name, course, mark })
}

pub fn parse_student_patch(body: &JsonObject) -> Result<StudentPatch, ApiError> {
    let name = optional_text(body, TextField::Name)?;
    let course = optional_text(body, TextField::Course)?;
    let mark = optional_mark(body)?;

    Ok(StudentPatch { name, course, mark })
}

/// Path ids are plain unsigned decimal integers; anything else matches no student.
pub fn parse_student_id(raw: &str) -> Result<u64, ApiError> {
    if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ApiError::NotFound);
    }
    raw.parse::<u64>().map_err(|_| ApiError::NotFound)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use serde_json::json;

    use super::*;

    fn object(value: Value) -> JsonObject {
        match value {
            Value::Object(object) => object,
            other => panic!("expected object, got {other}"),
        }
    }

    #[test]
    fn mark_accepts_integers_and_numeric_strings_in_range() {
        for m in 0..=100_i64 {
            assert_eq!(parse_mark(&json!(m)).unwrap().get() as i64, m);
            assert_eq!(parse_mark(&json!(m.to_string())).unwrap().get() as i64, m);
        }
        assert_eq!(parse_mark(&json!(" 42 ")).unwrap().get(), 42);
        assert_eq!(parse_mark(&json!("-0")).unwrap().get(), 0);
        assert_eq!(parse_mark(&json!("007")).unwrap().get(), 7);
    }

    #[test]
    fn mark_rejects_out_of_range_values() {
        for value in [json!(-1), json!(101), json!("-5"), json!("101"), json!(u64::MAX)] {
            assert!(matches!(parse_mark(&value), Err(ApiError::InvalidMark)), "{value}");
        }
    }

    #[test]
    fn mark_rejects_non_numeric_shapes() {
        let rejected = [
            json!(true),
            json!(false),
            json!(null),
            json!(""),
            json!("   "),
            json!("-"),
            json!("+5"),
            json!("5.0"),
            json!("abc"),
            json!("99999999999999999999999"),
            json!(50.5),
            json!(50.0),
            json!([50]),
            json!({ "mark": 50 }),
        ];
        for value in rejected {
            assert!(matches!(parse_mark(&value), Err(ApiError::InvalidMark)), "{value}");
        }
    }

    #[test]
    fn new_student_trims_text_and_defaults_mark() {
        let body = object(json!({ "name": "  Ann ", "course": "CS1\n" }));
        let student = parse_new_student(&body).unwrap();
        assert_eq!(student.name, "Ann");
        assert_eq!(student.course, "CS1");
        assert_eq!(student.mark.get(), 0);
    }

    #[test]
    fn new_student_requires_name_then_course() {
        let missing_both = object(json!({}));
        assert!(matches!(
            parse_new_student(&missing_both),
            Err(ApiError::MissingField(TextField::Name))
        ));

        let blank_course = object(json!({ "name": "Ann", "course": "  " }));
        assert!(matches!(
            parse_new_student(&blank_course),
            Err(ApiError::MissingField(TextField::Course))
        ));

        let numeric_name = object(json!({ "name": 5, "course": "CS1" }));
        assert!(matches!(
            parse_new_student(&numeric_name),
            Err(ApiError::MissingField(TextField::Name))
        ));
    }

    #[test]
    fn new_student_rejects_explicit_null_mark() {
        let body = object(json!({ "name": "Ann", "course": "CS1", "mark": null }));
        assert!(matches!(parse_new_student(&body), Err(ApiError::InvalidMark)));
    }

    #[test]
    fn patch_treats_null_text_as_absent() {
        let body = object(json!({ "name": null, "course": " CS2 " }));
        let patch = parse_student_patch(&body).unwrap();
        assert_eq!(patch.name, None);
        assert_eq!(patch.course.as_deref(), Some("CS2"));
        assert_eq!(patch.mark, None);
    }

    #[test]
    fn patch_rejects_blank_or_non_string_text_and_bad_mark() {
        let blank = object(json!({ "name": "" }));
        assert!(matches!(
            parse_student_patch(&blank),
            Err(ApiError::InvalidField(TextField::Name))
        ));

        let numeric_name = object(json!({ "name": 5 }));
        assert!(matches!(
            parse_student_patch(&numeric_name),
            Err(ApiError::InvalidField(TextField::Name))
        ));

        let list_course = object(json!({ "course": ["CS1"] }));
        assert!(matches!(
            parse_student_patch(&list_course),
            Err(ApiError::InvalidField(TextField::Course))
        ));

        let null_mark = object(json!({ "mark": null }));
        assert!(matches!(parse_student_patch(&null_mark), Err(ApiError::InvalidMark)));
    }

    #[test]
    fn student_id_must_be_unsigned_decimal() {
        assert_eq!(parse_student_id("12").unwrap(), 12);
        for raw in ["", "-1", "+1", "abc", "1.5", "99999999999999999999999"] {
            assert!(matches!(parse_student_id(raw), Err(ApiError::NotFound)), "{raw}");
        }
    }
}
