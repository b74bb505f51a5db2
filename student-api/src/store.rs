//! Store: student records keyed by id, optionally backed by a JSON snapshot file.
//!
//! Ids start at 1 and are never reused; the counter is part of the snapshot so a
//! deleted id stays dead across restarts. Every mutation is applied to a copy,
//! written to disk (when a data file is configured), and only then committed, so a
//! failed write leaves both memory and disk untouched.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::debug;

/// A mark in `0..=100`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "u8")]
pub struct Mark(u8);

impl Mark {
    pub const MAX: u8 = 100;

    pub fn new(value: i64) -> Option<Self> {
        u8::try_from(value)
            .ok()
            .filter(|mark| *mark <= Self::MAX)
            .map(Self)
    }

    pub fn get(self) -> u8 {
        self.0
    }
}

impl TryFrom<i64> for Mark {
    type Error = String;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::new(value).ok_or_else(|| format!("mark {value} is outside 0..=100"))
    }
}

impl From<Mark> for u8 {
    fn from(mark: Mark) -> Self {
        mark.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Student {
    pub id: u64,
    pub name: String,
    pub course: String,
    pub mark: Mark,
}

/// Validated input for [`StudentStore::insert`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewStudent {
    pub name: String,
    pub course: String,
    pub mark: Mark,
}

/// Validated partial update; `None` fields are left unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StudentPatch {
    pub name: Option<String>,
    pub course: Option<String>,
    pub mark: Option<Mark>,
}

impl StudentPatch {
    fn apply(self, student: &mut Student) {
        if let Some(name) = self.name {
            student.name = name;
        }
        if let Some(course) = self.course {
            student.course = course;
        }
        if let Some(mark) = self.mark {
            student.mark = mark;
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DeletedStudent {
    pub id: u64,
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to read data file {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },
    #[error("invalid data file {path}: {source}")]
    Parse {
        path: String,
        source: serde_json::Error,
    },
    #[error("failed to write data file {path}: {source}")]
    Write {
        path: String,
        source: std::io::Error,
    },
    #[error("failed to encode student snapshot: {0}")]
    Encode(#[source] serde_json::Error),
    #[error("inconsistent data file {path}: {reason}")]
    Inconsistent { path: String, reason: String },
    #[error("student ids exhausted")]
    IdsExhausted,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Snapshot {
    next_id: u64,
    students: Vec<Student>,
}

#[derive(Debug, Clone)]
struct Records {
    next_id: u64,
    students: BTreeMap<u64, Student>,
}

impl Default for Records {
    fn default() -> Self {
        Self {
            next_id: 1,
            students: BTreeMap::new(),
        }
    }
}

impl Records {
    /// Rejects duplicate ids and ids that leave no room for the next one.
    fn from_snapshot(snapshot: Snapshot) -> Result<Self, String> {
        let mut students = BTreeMap::new();
        for student in snapshot.students {
            let id = student.id;
            if students.insert(id, student).is_some() {
                return Err(format!("duplicate student id {id}"));
            }
        }

        let after_last = match students.keys().next_back() {
            Some(last) => last
                .checked_add(1)
                .ok_or_else(|| format!("student id {last} leaves no room for new ids"))?,
            None => 1,
        };

        Ok(Self {
            next_id: snapshot.next_id.max(after_last),
            students,
        })
    }

    fn to_snapshot(&self) -> Snapshot {
        Snapshot {
            next_id: self.next_id,
            students: self.students.values().cloned().collect(),
        }
    }
}

/// Shared handle to the student records. Cheap to clone.
#[derive(Debug, Clone, Default)]
pub struct StudentStore {
    records: Arc<RwLock<Records>>,
    data_file: Option<PathBuf>,
}

impl StudentStore {
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Open a store persisted at `path`. A missing file starts an empty store.
    pub async fn open(path: PathBuf) -> Result<Self, StoreError> {
        let records = match tokio::fs::read(&path).await {
            Ok(raw) => {
                let snapshot: Snapshot =
                    serde_json::from_slice(&raw).map_err(|source| StoreError::Parse {
                        path: path.display().to_string(),
                        source,
                    })?;
                Records::from_snapshot(snapshot).map_err(|reason| StoreError::Inconsistent {
                    path: path.display().to_string(),
                    reason,
                })?
            }
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "data file missing; starting empty");
                Records::default()
            }
            Err(source) => {
                return Err(StoreError::Read {
                    path: path.display().to_string(),
                    source,
                })
            }
        };

        Ok(Self {
            records: Arc::new(RwLock::new(records)),
            data_file: Some(path),
        })
    }

    pub fn data_file(&self) -> Option<&Path> {
        self.data_file.as_deref()
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.students.len()
    }

    /// All students ordered by id.
    pub async fn get_all(&self) -> Vec<Student> {
        self.records.read().await.students.values().cloned().collect()
    }

    pub async fn get_by_id(&self, id: u64) -> Option<Student> {
        self.records.read().await.students.get(&id).cloned()
    }

    pub async fn insert(&self, new: NewStudent) -> Result<Student, StoreError> {
        let mut guard = self.records.write().await;
        let mut next = guard.clone();

        let student = Student {
            id: next.next_id,
            name: new.name,
            course: new.course,
            mark: new.mark,
        };
        next.next_id = next
            .next_id
            .checked_add(1)
            .ok_or(StoreError::IdsExhausted)?;
        next.students.insert(student.id, student.clone());

        self.commit(&mut guard, next).await?;
        Ok(student)
    }

    pub async fn update(
        &self,
        id: u64,
        patch: StudentPatch,
    ) -> Result<Option<Student>, StoreError> {
        let mut guard = self.records.write().await;
        if !guard.students.contains_key(&id) {
            return Ok(None);
        }

        let mut next = guard.clone();
        let Some(student) = next.students.get_mut(&id) else {
            return Ok(None);
        };
        patch.apply(student);
        let updated = student.clone();

        self.commit(&mut guard, next).await?;
        Ok(Some(updated))
    }

    pub async fn delete(&self, id: u64) -> Result<Option<DeletedStudent>, StoreError> {
        let mut guard = self.records.write().await;
        if !guard.students.contains_key(&id) {
            return Ok(None);
        }

        let mut next = guard.clone();
        next.students.remove(&id);

        self.commit(&mut guard, next).await?;
        Ok(Some(DeletedStudent { id }))
    }

    async fn commit(&self, current: &mut Records, next: Records) -> Result<(), StoreError> {
        if let Some(path) = &self.data_file {
            write_snapshot(path, &next.to_snapshot()).await?;
        }
        *current = next;
        Ok(())
    }
}

async fn write_snapshot(path: &Path, snapshot: &Snapshot) -> Result<(), StoreError> {
    let encoded = serde_json::to_vec_pretty(snapshot).map_err(StoreError::Encode)?;
    let write_err = |source| StoreError::Write {
        path: path.display().to_string(),
        source,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await.map_err(write_err)?;
    }

    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);

    tokio::fs::write(&tmp, encoded).await.map_err(write_err)?;
    tokio::fs::rename(&tmp, path).await.map_err(write_err)?;
    debug!(path = %path.display(), students = snapshot.students.len(), "snapshot written");
    Ok(())
}
