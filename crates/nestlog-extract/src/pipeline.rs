//! Message-level pipeline: classify, extract quantities, normalize.

use chrono::{Local, NaiveDateTime};
use nestlog_core::config::ParseConfig;
use nestlog_core::{ActivityRecord, CategoryMatch, DateOrder, ExtractedQuantity, RawMessage, Source};
use tracing::debug;

use crate::classifier::Classifier;
use crate::normalizer::{Normalized, entry_time, normalize};
use crate::quantity::QuantityExtractor;
use crate::rules::RuleSet;
use crate::tokenizer::{parse_header, tokenize};

/// Extraction pipeline over shared rule and pattern tables.
///
/// Holds no per-run state; one pipeline can serve any number of transcripts.
#[derive(Debug, Clone, Copy)]
pub struct Pipeline<'r> {
    classifier: Classifier<'r>,
    extractor: &'r QuantityExtractor,
    date_order: DateOrder,
    min_transcript_chars: usize,
}

impl Pipeline<'static> {
    /// Pipeline over the built-in tables with default settings.
    pub fn standard() -> Self {
        Self::new(RuleSet::standard(), QuantityExtractor::standard())
    }

    /// Built-in tables with settings from the `[parse]` config section.
    pub fn from_config(config: &ParseConfig) -> Self {
        Self::standard()
            .with_date_order(config.date_order)
            .with_min_transcript_chars(config.min_transcript_chars)
    }
}

impl<'r> Pipeline<'r> {
    pub fn new(rules: &'r RuleSet, extractor: &'r QuantityExtractor) -> Self {
        Self {
            classifier: Classifier::new(rules),
            extractor,
            date_order: DateOrder::default(),
            min_transcript_chars: 1,
        }
    }

    pub fn with_date_order(mut self, date_order: DateOrder) -> Self {
        self.date_order = date_order;
        self
    }

    /// Values below 1 are raised to 1.
    pub fn with_min_transcript_chars(mut self, min: usize) -> Self {
        self.min_transcript_chars = min.max(1);
        self
    }

    pub fn date_order(&self) -> DateOrder {
        self.date_order
    }

    pub fn min_transcript_chars(&self) -> usize {
        self.min_transcript_chars
    }

    pub fn classify(&self, text: &str) -> CategoryMatch {
        self.classifier.classify(text)
    }

    pub fn extract_quantities(&self, text: &str) -> Vec<ExtractedQuantity> {
        self.extractor.extract(text)
    }

    /// Classify, extract and normalize one message. `Err` carries the
    /// uncategorized match.
    pub(crate) fn analyze(
        &self,
        message: &RawMessage,
        subject_id: &str,
        source: Source,
    ) -> Result<Normalized, CategoryMatch> {
        let matched = self.classify(&message.text);
        let quantities = self.extract_quantities(&message.text);
        debug!(
            line = message.line,
            category = %matched.category,
            score = matched.score,
            quantities = quantities.len(),
            "analyzed message"
        );
        normalize(message, &matched, &quantities, subject_id, source).ok_or(matched)
    }

    /// Build a record from one manually entered message.
    ///
    /// Time resolution, first match wins: `occurred_at`, a transcript header
    /// pasted into `text`, a clock time written in `text` (see
    /// [`entry_time`]), the current local time. Returns `None` for empty or
    /// uncategorized text.
    pub fn process_single_message(
        &self,
        subject_id: &str,
        text: &str,
        sender: Option<&str>,
        occurred_at: Option<NaiveDateTime>,
    ) -> Option<ActivityRecord> {
        self.process_single_message_at(
            subject_id,
            text,
            sender,
            occurred_at,
            Local::now().naive_local(),
        )
    }

    /// [`process_single_message`](Self::process_single_message) with an
    /// explicit "now".
    pub fn process_single_message_at(
        &self,
        subject_id: &str,
        text: &str,
        sender: Option<&str>,
        occurred_at: Option<NaiveDateTime>,
        now: NaiveDateTime,
    ) -> Option<ActivityRecord> {
        let text = text.trim();
        if text.is_empty() {
            return None;
        }

        let pasted = text
            .lines()
            .next()
            .and_then(|first| parse_header(first, self.date_order))
            .and_then(|_| tokenize(text, self.date_order).next());

        let message = match pasted {
            Some(msg) => RawMessage {
                occurred_at: occurred_at.unwrap_or(msg.occurred_at),
                sender: sender.map_or(msg.sender, str::to_string),
                ..msg
            },
            None => RawMessage {
                line: 1,
                occurred_at: occurred_at.unwrap_or_else(|| entry_time(text, now)),
                sender: sender.unwrap_or_default().to_string(),
                text: text.to_string(),
            },
        };

        match self.analyze(&message, subject_id, Source::Manual) {
            Ok(normalized) => Some(normalized.record),
            Err(_) => {
                debug!(subject_id, "manual entry not recognised");
                None
            }
        }
    }
}

impl Default for Pipeline<'static> {
    fn default() -> Self {
        Self::standard()
    }
}
