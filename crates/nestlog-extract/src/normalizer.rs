//! Turns a classified message into a structured [`ActivityRecord`].
//!
//! Each category has one quantity slot, filled from the extracted quantities
//! in a fixed preference order:
//!
//! | category    | slot        | kinds, most preferred first            |
//! |-------------|-------------|----------------------------------------|
//! | feeding     | amount      | volume, then duration (breast: reverse) |
//! | sleep       | duration    | duration                               |
//! | health      | temperature | temperature                            |
//! | measurement | value       | weight or length, whichever comes first |
//! | diaper      | none        |                                        |
//! | milestone   | none        |                                        |
//!
//! The bound quantity's text is cut out of the note.

use std::sync::LazyLock;

use chrono::{NaiveDateTime, NaiveTime};
use nestlog_core::{
    ActivityDetail, ActivityRecord, Category, CategoryMatch, ExtractedQuantity, QuantityKind,
    RawMessage, Source, WarningReason,
};
use regex::Regex;

use crate::rules::word_tokens;

use QuantityKind::{Duration, Length, Temperature, Volume, Weight};

const VOLUME_FIRST: &[&[QuantityKind]] = &[&[Volume], &[Duration]];
const DURATION_FIRST: &[&[QuantityKind]] = &[&[Duration], &[Volume]];
const DURATION_ONLY: &[&[QuantityKind]] = &[&[Duration]];
const TEMPERATURE_ONLY: &[&[QuantityKind]] = &[&[Temperature]];
const WEIGHT_OR_LENGTH: &[&[QuantityKind]] = &[&[Weight, Length]];

/// Words that add an automatic tag.
const AUTO_TAGS: &[(&str, &[&str])] = &[
    ("concern", &["worried", "worry", "concern", "concerned", "concerning", "problem", "issue"]),
    ("first", &["first"]),
    ("positive", &["happy", "great", "good", "excellent", "amazing", "content"]),
    ("urgent", &["urgent", "emergency", "asap", "immediately"]),
];

static HASHTAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"#(\w+)").expect("valid hashtag pattern"));

static TWELVE_HOUR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(\d{1,2})(?::([0-5]\d))?\s*([ap])\.?m\b").expect("valid 12h pattern")
});

static TWENTY_FOUR_HOUR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b([01]?\d|2[0-3]):([0-5]\d)\b").expect("valid 24h pattern")
});

/// A finished record plus the slot-binding warning, if any.
#[derive(Debug, Clone, PartialEq)]
pub struct Normalized {
    pub record: ActivityRecord,
    pub warning: Option<WarningReason>,
}

/// Build a record from a classified message. `None` for uncategorized
/// matches.
///
/// `occurred_at` is taken from the message as-is; callers resolve manual
/// entry times before calling.
pub fn normalize(
    message: &RawMessage,
    matched: &CategoryMatch,
    quantities: &[ExtractedQuantity],
    subject_id: &str,
    source: Source,
) -> Option<Normalized> {
    let subtype = matched.subtype.clone();
    let (detail, bound, warning) = match matched.category {
        Category::Uncategorized => return None,
        Category::Feeding => {
            let subtype = subtype.unwrap_or_else(|| {
                let has_volume = quantities.iter().any(|q| q.kind == Volume);
                let inferred = if has_volume { "bottle" } else { "breast" };
                inferred.to_string()
            });
            let prefs = if subtype == "breast" {
                DURATION_FIRST
            } else {
                VOLUME_FIRST
            };
            let (amount, warning) = bind(quantities, prefs);
            let bound = amount.clone();
            (ActivityDetail::Feeding { subtype, amount }, bound, warning)
        }
        Category::Sleep => {
            let (duration, warning) = bind(quantities, DURATION_ONLY);
            let bound = duration.clone();
            let subtype = subtype.unwrap_or_else(|| Category::Sleep.default_subtype().into());
            (ActivityDetail::Sleep { subtype, duration }, bound, warning)
        }
        Category::Health => {
            let (temperature, warning) = bind(quantities, TEMPERATURE_ONLY);
            let bound = temperature.clone();
            let subtype = subtype.unwrap_or_else(|| {
                let fallback = if bound.is_some() {
                    "temperature"
                } else {
                    Category::Health.default_subtype()
                };
                fallback.to_string()
            });
            (ActivityDetail::Health { subtype, temperature }, bound, warning)
        }
        Category::Measurement => {
            let (value, warning) = bind(quantities, WEIGHT_OR_LENGTH);
            let bound = value.clone();
            let subtype = subtype.unwrap_or_else(|| match value.as_ref().map(|q| q.kind) {
                Some(Weight) => "weight".into(),
                Some(Length) => "length".into(),
                _ => Category::Measurement.default_subtype().into(),
            });
            (ActivityDetail::Measurement { subtype, value }, bound, warning)
        }
        Category::Diaper => {
            let subtype = subtype.unwrap_or_else(|| Category::Diaper.default_subtype().into());
            (ActivityDetail::Diaper { subtype }, None, None)
        }
        Category::Milestone => {
            let subtype = subtype.unwrap_or_else(|| Category::Milestone.default_subtype().into());
            (ActivityDetail::Milestone { subtype }, None, None)
        }
    };

    let record = ActivityRecord {
        subject_id: subject_id.to_string(),
        occurred_at: message.occurred_at,
        sender: message.sender.clone(),
        detail,
        note: note_without(&message.text, bound.as_ref()),
        tags: extract_tags(&message.text),
        source,
    };
    Some(Normalized { record, warning })
}

/// First quantity of the first kind group that has any. Warns when the chosen
/// kind has more than one candidate.
fn bind(
    quantities: &[ExtractedQuantity],
    prefs: &[&[QuantityKind]],
) -> (Option<ExtractedQuantity>, Option<WarningReason>) {
    for group in prefs {
        let Some(first) = quantities.iter().find(|q| group.contains(&q.kind)) else {
            continue;
        };
        let candidates = quantities.iter().filter(|q| q.kind == first.kind).count();
        let warning = (candidates > 1).then_some(WarningReason::AmbiguousQuantity {
            kind: first.kind,
            candidates,
        });
        return (Some(first.clone()), warning);
    }
    (None, None)
}

/// The message text minus the bound quantity, with whitespace collapsed.
fn note_without(text: &str, bound: Option<&ExtractedQuantity>) -> String {
    let cut = match bound {
        Some(q) if text.get(q.start..q.end) == Some(q.raw_span.as_str()) => {
            format!("{} {}", &text[..q.start], &text[q.end..])
        }
        _ => text.to_string(),
    };

    let mut note = String::with_capacity(cut.len());
    for word in cut.split_whitespace() {
        let glued = word.starts_with([',', '.', ';', ':', '!', '?']);
        if !note.is_empty() && !glued {
            note.push(' ');
        }
        note.push_str(word);
    }
    note.trim_matches(|c: char| matches!(c, ',' | ';' | ':' | '-') || c.is_whitespace())
        .to_string()
}

/// Hashtags plus automatic tags, lowercased, sorted and deduplicated.
pub fn extract_tags(text: &str) -> Vec<String> {
    let mut tags: Vec<String> = HASHTAG
        .captures_iter(text)
        .filter_map(|c| c.get(1))
        .map(|m| m.as_str().to_lowercase())
        .collect();

    let tokens = word_tokens(text);
    for (tag, words) in AUTO_TAGS {
        if tokens.iter().any(|t| words.contains(&t.as_str())) {
            tags.push((*tag).to_string());
        }
    }
    tags.sort();
    tags.dedup();
    tags
}

/// A clock time written in the text: `1:18 pm`, `2pm`, `13:30`.
/// Twelve-hour forms take precedence.
pub fn time_in_text(text: &str) -> Option<NaiveTime> {
    let twelve = TWELVE_HOUR.captures(text).and_then(|caps| {
        let hour: u32 = caps.get(1)?.as_str().parse().ok()?;
        let minute: u32 = caps.get(2).map_or(Some(0), |m| m.as_str().parse().ok())?;
        if !(1..=12).contains(&hour) {
            return None;
        }
        let pm = caps.get(3)?.as_str().eq_ignore_ascii_case("p");
        let hour = match (hour, pm) {
            (12, false) => 0,
            (12, true) => 12,
            (h, true) => h + 12,
            (h, false) => h,
        };
        NaiveTime::from_hms_opt(hour, minute, 0)
    });
    twelve.or_else(|| {
        let caps = TWENTY_FOUR_HOUR.captures(text)?;
        let hour: u32 = caps.get(1)?.as_str().parse().ok()?;
        let minute: u32 = caps.get(2)?.as_str().parse().ok()?;
        NaiveTime::from_hms_opt(hour, minute, 0)
    })
}

/// When a manual entry happened: the time written in the text on the
/// reference date, moved back a day if that would be in the future;
/// otherwise the reference itself.
pub fn entry_time(text: &str, reference: NaiveDateTime) -> NaiveDateTime {
    let Some(time) = time_in_text(text) else {
        return reference;
    };
    let same_day = reference.date().and_time(time);
    if same_day <= reference {
        return same_day;
    }
    reference
        .date()
        .pred_opt()
        .map_or(same_day, |d| d.and_time(time))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::classify;
    use crate::quantity::QuantityExtractor;
    use chrono::NaiveDate;
    use nestlog_core::Unit;

    fn at(h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 9, 21)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    fn run(text: &str) -> Normalized {
        let message = RawMessage {
            line: 1,
            occurred_at: at(15, 32),
            sender: "Mom".into(),
            text: text.into(),
        };
        let matched = classify(text);
        let quantities = QuantityExtractor::standard().extract(text);
        normalize(&message, &matched, &quantities, "baby-1", Source::Imported)
            .expect("categorized")
    }

    #[test]
    fn bottle_feed_binds_volume() {
        let n = run("Baby fed 150ml formula");
        let r = &n.record;
        assert_eq!(r.category(), Category::Feeding);
        assert_eq!(r.subtype(), "bottle");
        let q = r.quantity().unwrap();
        assert_eq!(q.unit, Unit::Milliliters);
        assert_eq!(q.value, 150.0);
        assert_eq!(r.note, "Baby fed formula");
        assert_eq!(r.occurred_at, at(15, 32));
        assert_eq!(r.sender, "Mom");
        assert_eq!(r.subject_id, "baby-1");
        assert_eq!(r.source, Source::Imported);
        assert!(n.warning.is_none());
    }

    #[test]
    fn diaper_has_no_quantity() {
        let n = run("Changed wet diaper");
        assert_eq!(n.record.subtype(), "wet");
        assert!(n.record.quantity().is_none());
        assert_eq!(n.record.note, "Changed wet diaper");
    }

    #[test]
    fn sleep_binds_duration() {
        let n = run("Napped for 2 hours");
        let q = n.record.quantity().unwrap();
        assert_eq!(q.kind, Duration);
        assert_eq!(q.value, 120.0);
        assert_eq!(n.record.note, "Napped for");
    }

    #[test]
    fn temperature_note_keeps_punctuation_tidy() {
        let n = run("Temperature 98.6F, all normal");
        let q = n.record.quantity().unwrap();
        assert_eq!(q.unit, Unit::Fahrenheit);
        assert_eq!(q.value, 98.6);
        assert_eq!(n.record.note, "Temperature, all normal");
    }

    #[test]
    fn feeding_without_subtype_keyword_uses_quantity() {
        assert_eq!(run("fed 4oz").record.subtype(), "bottle");
        let n = run("fed for 20 min");
        assert_eq!(n.record.subtype(), "breast");
        assert_eq!(n.record.quantity().unwrap().value, 20.0);
    }

    #[test]
    fn breast_feed_prefers_duration() {
        let n = run("breastfed 15 min, about 60ml");
        assert_eq!(n.record.subtype(), "breast");
        assert_eq!(n.record.quantity().unwrap().kind, Duration);
    }

    #[test]
    fn measurement_subtype_from_quantity_kind() {
        let n = run("measured 62 cm");
        assert_eq!(n.record.category(), Category::Measurement);
        assert_eq!(n.record.subtype(), "length");
        assert_eq!(n.record.quantity().unwrap().unit, Unit::Centimeters);
    }

    #[test]
    fn prose_after_a_number_is_not_a_length() {
        let n = run("Measured at 3 in the afternoon, 62 cm long");
        assert_eq!(n.record.category(), Category::Measurement);
        let q = n.record.quantity().unwrap();
        assert_eq!(q.unit, Unit::Centimeters);
        assert_eq!(q.value, 62.0);
        assert_eq!(n.warning, None);
    }

    #[test]
    fn two_volumes_warn_and_keep_the_first() {
        let n = run("bottle 60ml then another 30ml");
        assert_eq!(n.record.quantity().unwrap().value, 60.0);
        assert_eq!(
            n.warning,
            Some(WarningReason::AmbiguousQuantity {
                kind: Volume,
                candidates: 2
            })
        );
    }

    #[test]
    fn uncategorized_is_not_normalized() {
        let message = RawMessage {
            line: 1,
            occurred_at: at(9, 0),
            sender: "Dad".into(),
            text: "lol".into(),
        };
        let none = normalize(
            &message,
            &CategoryMatch::uncategorized(),
            &[],
            "b",
            Source::Imported,
        );
        assert!(none.is_none());
    }

    #[test]
    fn tags_from_hashtags_and_keywords() {
        assert_eq!(
            extract_tags("First smile today! #Happy #happy so good"),
            vec!["first", "happy", "positive"]
        );
        assert_eq!(extract_tags("worried, urgent call"), vec!["concern", "urgent"]);
        assert!(extract_tags("changed diaper").is_empty());
        assert_eq!(
            run("Rolled over for the first time #milestone").record.tags,
            vec!["first", "milestone"]
        );
    }

    #[test]
    fn clock_times_in_text() {
        let t = |h, m| NaiveTime::from_hms_opt(h, m, 0);
        assert_eq!(time_in_text("70 ml feed - 1:18 pm - Mummy"), t(13, 18));
        assert_eq!(time_in_text("bottle at 2pm"), t(14, 0));
        assert_eq!(time_in_text("woke 12am"), t(0, 0));
        assert_eq!(time_in_text("nap 13:30"), t(13, 30));
        assert_eq!(time_in_text("fed 120ml"), None);
        assert_eq!(time_in_text("at 25:00"), None);
    }

    #[test]
    fn entry_time_rolls_back_future_times() {
        let reference = at(10, 0);
        assert_eq!(entry_time("fed at 9:15", reference), at(9, 15));
        assert_eq!(
            entry_time("fed at 11pm", reference),
            NaiveDate::from_ymd_opt(2025, 9, 20)
                .unwrap()
                .and_hms_opt(23, 0, 0)
                .unwrap()
        );
        assert_eq!(entry_time("fed 4oz", reference), reference);
    }
}
