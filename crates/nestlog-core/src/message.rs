//! Transcript messages as produced by the line tokenizer.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// How to read a numeric date when both day and month are 12 or less.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DateOrder {
    /// `D/M/Y` (most non-US exports).
    #[default]
    DayFirst,
    /// `M/D/Y` (US exports).
    MonthFirst,
}

/// One transcript message, possibly merged from several physical lines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawMessage {
    /// 1-based line number of the message header in the transcript.
    pub line: usize,
    /// Naive timestamp in the transcript's own timezone.
    pub occurred_at: NaiveDateTime,
    /// Sender label as written; may be empty.
    pub sender: String,
    /// Message body. Continuation lines are joined with `\n`.
    pub text: String,
}
