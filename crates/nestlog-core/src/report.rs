//! Per-transcript import summary.

use std::collections::BTreeMap;
use std::fmt;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::category::Category;
use crate::quantity::QuantityKind;

/// Why a line or message did not become a stored record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum WarningReason {
    /// Line has no timestamp header and there is no message to continue.
    UnrecognizedLine,
    /// Transcript system or media-placeholder line.
    SystemMessage,
    /// Header line without a `Sender:` part.
    MissingSender,
    /// Message matched no category rule.
    Uncategorized,
    /// More than one quantity could fill the record's slot; the first was used.
    AmbiguousQuantity {
        kind: QuantityKind,
        candidates: usize,
    },
    /// The storage collaborator rejected the record.
    StorageFailed(String),
}

impl fmt::Display for WarningReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnrecognizedLine => f.write_str("unrecognized line format"),
            Self::SystemMessage => f.write_str("system message"),
            Self::MissingSender => f.write_str("header without sender"),
            Self::Uncategorized => f.write_str("no activity recognised"),
            Self::AmbiguousQuantity { kind, candidates } => {
                write!(f, "{candidates} {kind} quantities, used the first")
            }
            Self::StorageFailed(e) => write!(f, "storage failed: {e}"),
        }
    }
}

/// A non-fatal problem tied to a transcript line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Warning {
    /// 1-based transcript line number.
    pub line: usize,
    pub reason: WarningReason,
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}: {}", self.line, self.reason)
    }
}

/// Summary of one transcript run.
///
/// Line accounting: `messages_parsed + continuation_lines + skipped_lines == total_lines`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchReport {
    pub total_lines: usize,
    pub messages_parsed: usize,
    /// Lines folded into the message above them.
    pub continuation_lines: usize,
    /// System lines, sender-less headers and orphan lines.
    pub skipped_lines: usize,
    pub records_emitted: usize,
    pub skipped_uncategorized: usize,
    pub duplicates_skipped: usize,
    /// Records accepted by the storage collaborator.
    pub persisted: usize,
    pub storage_failures: usize,
    pub per_category_counts: BTreeMap<Category, usize>,
    /// Earliest and latest `occurred_at` among emitted records.
    pub first_activity: Option<NaiveDateTime>,
    pub last_activity: Option<NaiveDateTime>,
    pub warnings: Vec<Warning>,
}

impl BatchReport {
    pub fn warn(&mut self, line: usize, reason: WarningReason) {
        self.warnings.push(Warning { line, reason });
    }

    /// Count an emitted record and widen the activity range.
    pub fn record_emitted(&mut self, category: Category, occurred_at: NaiveDateTime) {
        self.records_emitted += 1;
        *self.per_category_counts.entry(category).or_insert(0) += 1;
        self.first_activity = Some(match self.first_activity {
            Some(t) if t <= occurred_at => t,
            _ => occurred_at,
        });
        self.last_activity = Some(match self.last_activity {
            Some(t) if t >= occurred_at => t,
            _ => occurred_at,
        });
    }

    pub fn category_count(&self, category: Category) -> usize {
        self.per_category_counts.get(&category).copied().unwrap_or(0)
    }

    /// Whether every transcript line is accounted for.
    pub fn lines_balance(&self) -> bool {
        self.messages_parsed + self.continuation_lines + self.skipped_lines == self.total_lines
    }
}
