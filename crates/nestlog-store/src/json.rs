//! File-backed store: one JSON-lines file per subject.

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, Read, Write};
use std::path::{Path, PathBuf};

use nestlog_core::ActivityRecord;
use tracing::{debug, info, warn};

use crate::{ActivityStore, RecordFilter, RecordId, StoreError, StoredRecord};

/// JSON-lines store rooted at a data directory.
///
/// Records for subject `s` live in `<data_dir>/s.jsonl`, one record per line.
/// A save appends a single line, so its cost does not grow with the file. A
/// partial last line left by a crash is dropped the next time the subject is
/// opened for writing, and ignored when listing.
pub struct JsonStore {
    dir: PathBuf,
    files: HashMap<String, File>,
}

impl JsonStore {
    /// Open (and create if needed) a store directory.
    pub fn open(dir: &Path) -> Result<Self, StoreError> {
        fs::create_dir_all(dir)?;
        info!(dir = %dir.display(), "opened json store");
        Ok(Self {
            dir: dir.to_path_buf(),
            files: HashMap::new(),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn subject_path(&self, subject_id: &str) -> PathBuf {
        self.dir.join(format!("{subject_id}.jsonl"))
    }

    fn read_subject(&self, subject_id: &str) -> Result<Vec<StoredRecord>, StoreError> {
        let path = self.subject_path(subject_id);
        if !path.exists() {
            return Ok(Vec::new());
        }
        let mut reader = BufReader::new(File::open(&path)?);
        let mut records = Vec::new();
        let mut line = String::new();
        loop {
            line.clear();
            if reader.read_line(&mut line)? == 0 {
                break;
            }
            if !line.ends_with('\n') {
                warn!(subject_id, "ignoring partial last line");
                break;
            }
            if line.trim().is_empty() {
                continue;
            }
            records.push(serde_json::from_str(&line)?);
        }
        debug!(subject_id, count = records.len(), "loaded subject file");
        Ok(records)
    }

    /// The subject's file, opened for appending on first use.
    fn appender(&mut self, subject_id: &str) -> Result<&mut File, StoreError> {
        let path = self.subject_path(subject_id);
        match self.files.entry(subject_id.to_string()) {
            Entry::Occupied(entry) => Ok(entry.into_mut()),
            Entry::Vacant(entry) => {
                let mut file = OpenOptions::new()
                    .create(true)
                    .read(true)
                    .append(true)
                    .open(&path)?;
                let mut contents = Vec::new();
                file.read_to_end(&mut contents)?;
                let keep = contents
                    .iter()
                    .rposition(|&b| b == b'\n')
                    .map_or(0, |i| i + 1);
                if keep < contents.len() {
                    warn!(
                        subject_id,
                        dropped = contents.len() - keep,
                        "truncating partial last line"
                    );
                    file.set_len(keep as u64)?;
                }
                Ok(entry.insert(file))
            }
        }
    }
}

impl ActivityStore for JsonStore {
    fn save(&mut self, subject_id: &str, record: ActivityRecord) -> Result<RecordId, StoreError> {
        crate::check_record(subject_id, &record)?;

        let id = RecordId::new();
        let mut line = serde_json::to_vec(&StoredRecord {
            id: id.clone(),
            record,
        })?;
        line.push(b'\n');

        let file = self.appender(subject_id)?;
        file.write_all(&line)?;
        file.flush()?;
        Ok(id)
    }

    fn list(
        &self,
        subject_id: &str,
        filter: &RecordFilter,
    ) -> Result<Vec<StoredRecord>, StoreError> {
        crate::check_subject(subject_id)?;
        Ok(crate::select(&self.read_subject(subject_id)?, filter))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::*;
    use nestlog_core::Category;

    #[test]
    fn save_then_reopen() {
        let dir = tempfile::tempdir().unwrap();
        {
            let mut store = JsonStore::open(dir.path()).unwrap();
            store.save("b1", diaper("b1", at(21, 9, 0))).unwrap();
            store.save("b1", nap("b1", at(21, 13, 0))).unwrap();
        }
        assert!(dir.path().join("b1.jsonl").exists());

        let store = JsonStore::open(dir.path()).unwrap();
        let listed = store.list("b1", &RecordFilter::default()).unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].record.category(), Category::Diaper);
        assert_eq!(listed[1].record.category(), Category::Sleep);
    }

    #[test]
    fn each_save_appends_one_line() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = JsonStore::open(dir.path()).unwrap();
        let first = store.save("b1", diaper("b1", at(21, 9, 0))).unwrap();
        store.save("b1", diaper("b1", at(21, 10, 0))).unwrap();
        store.save("b1", nap("b1", at(21, 13, 0))).unwrap();

        let text = fs::read_to_string(dir.path().join("b1.jsonl")).unwrap();
        assert_eq!(text.lines().count(), 3);
        assert!(text.lines().next().unwrap().contains(first.as_str()));
        assert_eq!(store.list("b1", &RecordFilter::default()).unwrap().len(), 3);
    }

    #[test]
    fn partial_last_line_is_dropped() {
        let dir = tempfile::tempdir().unwrap();
        {
            let mut store = JsonStore::open(dir.path()).unwrap();
            store.save("b1", diaper("b1", at(21, 9, 0))).unwrap();
        }
        let path = dir.path().join("b1.jsonl");
        let mut file = OpenOptions::new().append(true).open(&path).unwrap();
        file.write_all(br#"{"id":"torn"#).unwrap();
        drop(file);

        let mut store = JsonStore::open(dir.path()).unwrap();
        assert_eq!(store.list("b1", &RecordFilter::default()).unwrap().len(), 1);
        store.save("b1", nap("b1", at(21, 13, 0))).unwrap();
        let listed = store.list("b1", &RecordFilter::default()).unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[1].record.category(), Category::Sleep);
    }

    #[test]
    fn list_filters_by_range() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = JsonStore::open(dir.path()).unwrap();
        store.save("b1", diaper("b1", at(20, 9, 0))).unwrap();
        store.save("b1", diaper("b1", at(21, 9, 0))).unwrap();
        store.save("b1", diaper("b1", at(22, 9, 0))).unwrap();

        let filter = RecordFilter {
            from: Some(at(21, 0, 0)),
            to: Some(at(21, 23, 59)),
            category: None,
        };
        let listed = store.list("b1", &filter).unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].record.occurred_at, at(21, 9, 0));
    }

    #[test]
    fn missing_subject_lists_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonStore::open(dir.path()).unwrap();
        assert!(store.list("nobody", &RecordFilter::default()).unwrap().is_empty());
    }

    #[test]
    fn path_like_subject_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = JsonStore::open(dir.path()).unwrap();
        let result = store.save("../escape", diaper("x", at(21, 9, 0)));
        assert!(matches!(result, Err(StoreError::InvalidSubject(_))));
    }

    #[test]
    fn record_for_another_subject_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = JsonStore::open(dir.path()).unwrap();
        let result = store.save("b1", diaper("b2", at(21, 9, 0)));
        assert!(matches!(result, Err(StoreError::SubjectMismatch { .. })));
        assert!(!dir.path().join("b1.jsonl").exists());
    }

    #[test]
    fn corrupt_line_is_a_json_error() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("b1.jsonl"), "not json\n").unwrap();
        let store = JsonStore::open(dir.path()).unwrap();
        let result = store.list("b1", &RecordFilter::default());
        assert!(matches!(result, Err(StoreError::Json(_))));
    }
}
