//! Whole-transcript runs: tokenize, analyze every message, deduplicate,
//! optionally persist, and account for every line in a [`BatchReport`].

use std::collections::HashSet;

use chrono::{NaiveDateTime, Timelike};
use nestlog_core::{ActivityRecord, BatchReport, Category, Source, WarningReason};
use nestlog_store::ActivityStore;
use tracing::{debug, info, trace, warn};

use crate::InputError;
use crate::pipeline::Pipeline;
use crate::tokenizer::{Token, Tokenizer};

/// Records with equal keys within one run are duplicates.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct DedupKey {
    category: Category,
    minute: NaiveDateTime,
    subtype: String,
}

impl DedupKey {
    fn of(record: &ActivityRecord) -> Self {
        let minute = record
            .occurred_at
            .with_second(0)
            .and_then(|t| t.with_nanosecond(0))
            .unwrap_or(record.occurred_at);
        Self {
            category: record.category(),
            minute,
            subtype: record.subtype().to_string(),
        }
    }
}

/// Decode raw transcript bytes, dropping a leading byte-order mark.
pub fn decode_transcript(bytes: &[u8]) -> Result<&str, InputError> {
    let text = std::str::from_utf8(bytes).map_err(|e| InputError::NotUtf8 {
        valid_up_to: e.valid_up_to(),
    })?;
    Ok(text.strip_prefix('\u{feff}').unwrap_or(text))
}

impl Pipeline<'_> {
    /// Extract every activity record from a transcript.
    ///
    /// Per-message problems become warnings in the report; only input that
    /// is empty or too short fails the whole run.
    pub fn process_transcript(
        &self,
        text: &str,
        subject_id: &str,
    ) -> Result<(Vec<ActivityRecord>, BatchReport), InputError> {
        self.run(text, subject_id, None)
    }

    /// Like [`process_transcript`](Self::process_transcript), saving each
    /// emitted record to `store` as it is produced. A failed save is counted
    /// and warned about; the run continues and the record is still returned.
    pub fn import_transcript(
        &self,
        text: &str,
        subject_id: &str,
        store: &mut dyn ActivityStore,
    ) -> Result<(Vec<ActivityRecord>, BatchReport), InputError> {
        self.run(text, subject_id, Some(store))
    }

    fn check_input(&self, text: &str) -> Result<(), InputError> {
        let len = text.chars().filter(|c| !c.is_whitespace()).count();
        if len == 0 {
            return Err(InputError::Empty);
        }
        if len < self.min_transcript_chars() {
            return Err(InputError::TooShort {
                len,
                min: self.min_transcript_chars(),
            });
        }
        Ok(())
    }

    fn run(
        &self,
        text: &str,
        subject_id: &str,
        mut store: Option<&mut dyn ActivityStore>,
    ) -> Result<(Vec<ActivityRecord>, BatchReport), InputError> {
        let text = text.strip_prefix('\u{feff}').unwrap_or(text);
        self.check_input(text)?;

        let mut report = BatchReport::default();
        let mut records = Vec::new();
        let mut seen: HashSet<DedupKey> = HashSet::new();
        let mut tokenizer = Tokenizer::new(text, self.date_order());

        for token in tokenizer.by_ref() {
            let message = match token {
                Token::Message(message) => message,
                Token::Skipped(warning) => {
                    report.skipped_lines += 1;
                    report.warnings.push(warning);
                    continue;
                }
            };
            report.messages_parsed += 1;

            let normalized = match self.analyze(&message, subject_id, Source::Imported) {
                Ok(normalized) => normalized,
                Err(_) => {
                    trace!(line = message.line, "no activity in message");
                    report.skipped_uncategorized += 1;
                    report.warn(message.line, WarningReason::Uncategorized);
                    continue;
                }
            };

            let record = normalized.record;
            if !seen.insert(DedupKey::of(&record)) {
                debug!(line = message.line, category = %record.category(), "duplicate record skipped");
                report.duplicates_skipped += 1;
                continue;
            }
            if let Some(reason) = normalized.warning {
                report.warn(message.line, reason);
            }
            report.record_emitted(record.category(), record.occurred_at);

            if let Some(store) = store.as_deref_mut() {
                match store.save(subject_id, record.clone()) {
                    Ok(id) => {
                        trace!(line = message.line, %id, "record saved");
                        report.persisted += 1;
                    }
                    Err(e) => {
                        warn!(line = message.line, error = %e, "failed to save record");
                        report.storage_failures += 1;
                        report.warn(message.line, WarningReason::StorageFailed(e.to_string()));
                    }
                }
            }
            records.push(record);
        }

        report.total_lines = tokenizer.lines_read();
        report.continuation_lines = tokenizer.continuation_lines();

        info!(
            subject_id,
            lines = report.total_lines,
            messages = report.messages_parsed,
            records = report.records_emitted,
            uncategorized = report.skipped_uncategorized,
            duplicates = report.duplicates_skipped,
            warnings = report.warnings.len(),
            "processed transcript"
        );
        Ok((records, report))
    }
}
