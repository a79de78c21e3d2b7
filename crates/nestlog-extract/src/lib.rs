//! Activity extraction from baby-care chat transcripts.
//!
//! ```text
//! transcript ─▶ tokenizer ─▶ classifier ─┐
//!                         └▶ quantities ─┴▶ normalizer ─▶ ActivityRecord
//! ```
//!
//! [`Pipeline`] ties the stages together over shared rule and pattern
//! tables. The free functions below use the built-in tables.

mod batch;
pub use batch::decode_transcript;

pub mod classifier;
pub use classifier::Classifier;

mod error;
pub use error::InputError;

pub mod normalizer;
pub use normalizer::{Normalized, normalize};

mod pipeline;
pub use pipeline::Pipeline;

pub mod quantity;
pub use quantity::QuantityExtractor;

pub mod rules;
pub use rules::{Rule, RuleSet};

pub mod tokenizer;
pub use tokenizer::{Token, Tokenizer, tokenize};

use chrono::NaiveDateTime;
use nestlog_core::{ActivityRecord, BatchReport, CategoryMatch, DateOrder, ExtractedQuantity};

/// Classify one message with the built-in rules.
pub fn classify(text: &str) -> CategoryMatch {
    classifier::classify(text)
}

/// Every quantity in `text`, converted to canonical units.
pub fn extract_quantities(text: &str) -> Vec<ExtractedQuantity> {
    QuantityExtractor::standard().extract(text)
}

/// Run a whole transcript with the built-in tables.
pub fn process_transcript(
    text: &str,
    subject_id: &str,
    date_order: DateOrder,
) -> Result<(Vec<ActivityRecord>, BatchReport), InputError> {
    Pipeline::standard()
        .with_date_order(date_order)
        .process_transcript(text, subject_id)
}

/// Build a record from one manually entered message.
pub fn process_single_message(
    subject_id: &str,
    text: &str,
    sender: Option<&str>,
    occurred_at: Option<NaiveDateTime>,
) -> Option<ActivityRecord> {
    Pipeline::standard().process_single_message(subject_id, text, sender, occurred_at)
}
