//! In-memory store for tests, dry runs and embedding.

use std::collections::HashMap;

use nestlog_core::ActivityRecord;

use crate::{ActivityStore, RecordFilter, RecordId, StoreError, StoredRecord};

/// Keeps every saved record in a per-subject `Vec`.
#[derive(Debug, Default)]
pub struct MemoryStore {
    subjects: HashMap<String, Vec<StoredRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of records held for `subject_id`.
    pub fn len(&self, subject_id: &str) -> usize {
        self.subjects.get(subject_id).map_or(0, Vec::len)
    }

    pub fn is_empty(&self) -> bool {
        self.subjects.values().all(Vec::is_empty)
    }
}

impl ActivityStore for MemoryStore {
    fn save(&mut self, subject_id: &str, record: ActivityRecord) -> Result<RecordId, StoreError> {
        crate::check_record(subject_id, &record)?;
        let id = RecordId::new();
        self.subjects
            .entry(subject_id.to_string())
            .or_default()
            .push(StoredRecord {
                id: id.clone(),
                record,
            });
        Ok(id)
    }

    fn list(
        &self,
        subject_id: &str,
        filter: &RecordFilter,
    ) -> Result<Vec<StoredRecord>, StoreError> {
        crate::check_subject(subject_id)?;
        Ok(self
            .subjects
            .get(subject_id)
            .map(|records| crate::select(records, filter))
            .unwrap_or_default())
    }
}
