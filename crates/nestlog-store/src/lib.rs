//! Storage layer: the `ActivityStore` contract plus in-memory and JSON-file
//! backends, and Arrow/Parquet export.

mod error;
pub use error::StoreError;

mod export;
pub use export::to_record_batch;
#[cfg(feature = "parquet")]
pub use export::write_parquet;

mod json;
pub use json::JsonStore;

mod memory;
pub use memory::MemoryStore;

use std::fmt;

use chrono::NaiveDateTime;
use nestlog_core::{ActivityRecord, Category};
use serde::{Deserialize, Serialize};

/// Opaque identifier assigned by a store on save.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(String);

impl RecordId {
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for RecordId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A record as persisted, with its store-assigned id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredRecord {
    pub id: RecordId,
    #[serde(flatten)]
    pub record: ActivityRecord,
}

/// Listing filter. Both time bounds are inclusive.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordFilter {
    pub from: Option<NaiveDateTime>,
    pub to: Option<NaiveDateTime>,
    pub category: Option<Category>,
}

impl RecordFilter {
    pub fn matches(&self, record: &ActivityRecord) -> bool {
        self.from.is_none_or(|from| record.occurred_at >= from)
            && self.to.is_none_or(|to| record.occurred_at <= to)
            && self.category.is_none_or(|c| record.category() == c)
    }
}

/// Persistence collaborator for finished activity records.
///
/// Implementations own their timeout and retry policy. Callers treat every
/// error as a per-record failure.
pub trait ActivityStore {
    /// Persist one record for `subject_id` and return its new id.
    fn save(&mut self, subject_id: &str, record: ActivityRecord) -> Result<RecordId, StoreError>;

    /// Records for `subject_id` matching `filter`, ordered by `occurred_at`.
    fn list(&self, subject_id: &str, filter: &RecordFilter)
    -> Result<Vec<StoredRecord>, StoreError>;
}

/// Reject subject ids that are empty or unsafe to use as file names.
pub(crate) fn check_subject(subject_id: &str) -> Result<(), StoreError> {
    let ok = !subject_id.is_empty()
        && subject_id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if ok {
        Ok(())
    } else {
        Err(StoreError::InvalidSubject(subject_id.to_string()))
    }
}

/// [`check_subject`], plus the record must belong to `subject_id`.
pub(crate) fn check_record(subject_id: &str, record: &ActivityRecord) -> Result<(), StoreError> {
    check_subject(subject_id)?;
    if record.subject_id != subject_id {
        return Err(StoreError::SubjectMismatch {
            subject: subject_id.to_string(),
            record: record.subject_id.clone(),
        });
    }
    Ok(())
}

/// Apply `filter` and sort by time, keeping insertion order for equal times.
pub(crate) fn select(records: &[StoredRecord], filter: &RecordFilter) -> Vec<StoredRecord> {
    let mut out: Vec<StoredRecord> = records
        .iter()
        .filter(|r| filter.matches(&r.record))
        .cloned()
        .collect();
    out.sort_by_key(|r| r.record.occurred_at);
    out
}
