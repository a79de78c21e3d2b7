//! Canonical activity records handed to storage.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::category::Category;
use crate::quantity::ExtractedQuantity;

/// Where a record came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Source {
    /// Parsed out of an exported chat transcript.
    Imported,
    /// Entered directly as free text.
    Manual,
}

impl Source {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Imported => "imported",
            Self::Manual => "manual",
        }
    }
}

/// Category-specific record data.
///
/// Each variant only carries the quantity slot its category can use, so a
/// diaper record cannot hold a temperature and a milestone cannot hold a
/// volume.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "category", rename_all = "snake_case")]
pub enum ActivityDetail {
    /// Subtypes: bottle, breast, solid, pumped. Amount is a volume or duration.
    Feeding {
        subtype: String,
        amount: Option<ExtractedQuantity>,
    },
    /// Subtypes: wet, dirty, change.
    Diaper { subtype: String },
    /// Subtypes: nap, night, wake.
    Sleep {
        subtype: String,
        duration: Option<ExtractedQuantity>,
    },
    /// Subtypes: temperature, symptom, medication, vaccination, doctor_visit.
    Health {
        subtype: String,
        temperature: Option<ExtractedQuantity>,
    },
    /// Subtypes: weight, length, head_circumference, growth.
    Measurement {
        subtype: String,
        value: Option<ExtractedQuantity>,
    },
    /// Subtypes: motor, social, verbal, tooth, general.
    Milestone { subtype: String },
}

impl ActivityDetail {
    pub fn category(&self) -> Category {
        match self {
            Self::Feeding { .. } => Category::Feeding,
            Self::Diaper { .. } => Category::Diaper,
            Self::Sleep { .. } => Category::Sleep,
            Self::Health { .. } => Category::Health,
            Self::Measurement { .. } => Category::Measurement,
            Self::Milestone { .. } => Category::Milestone,
        }
    }

    pub fn subtype(&self) -> &str {
        match self {
            Self::Feeding { subtype, .. }
            | Self::Diaper { subtype }
            | Self::Sleep { subtype, .. }
            | Self::Health { subtype, .. }
            | Self::Measurement { subtype, .. }
            | Self::Milestone { subtype } => subtype,
        }
    }

    pub fn quantity(&self) -> Option<&ExtractedQuantity> {
        match self {
            Self::Feeding { amount, .. } => amount.as_ref(),
            Self::Sleep { duration, .. } => duration.as_ref(),
            Self::Health { temperature, .. } => temperature.as_ref(),
            Self::Measurement { value, .. } => value.as_ref(),
            Self::Diaper { .. } | Self::Milestone { .. } => None,
        }
    }
}

/// A finished, categorized activity ready for storage.
///
/// Built once by the normalizer and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityRecord {
    /// Opaque subject reference supplied by the caller.
    pub subject_id: String,
    pub occurred_at: NaiveDateTime,
    pub sender: String,
    #[serde(flatten)]
    pub detail: ActivityDetail,
    /// Message text with the consumed quantity removed.
    pub note: String,
    /// Hashtags and automatic tags, sorted and unique.
    #[serde(default)]
    pub tags: Vec<String>,
    pub source: Source,
}

impl ActivityRecord {
    pub fn category(&self) -> Category {
        self.detail.category()
    }

    pub fn subtype(&self) -> &str {
        self.detail.subtype()
    }

    pub fn quantity(&self) -> Option<&ExtractedQuantity> {
        self.detail.quantity()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quantity::{QuantityKind, Unit};
    use chrono::NaiveDate;

    fn at(h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 9, 21)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    fn record(detail: ActivityDetail) -> ActivityRecord {
        ActivityRecord {
            subject_id: "baby-1".into(),
            occurred_at: at(14, 20),
            sender: "Mom".into(),
            detail,
            note: "fed".into(),
            tags: vec![],
            source: Source::Imported,
        }
    }

    #[test]
    fn accessors_follow_the_variant() {
        let volume = ExtractedQuantity {
            kind: QuantityKind::Volume,
            value: 150.0,
            unit: Unit::Milliliters,
            raw_span: "150ml".into(),
            start: 9,
            end: 14,
        };
        let r = record(ActivityDetail::Feeding {
            subtype: "bottle".into(),
            amount: Some(volume.clone()),
        });
        assert_eq!(r.category(), Category::Feeding);
        assert_eq!(r.subtype(), "bottle");
        assert_eq!(r.quantity(), Some(&volume));

        let d = record(ActivityDetail::Diaper {
            subtype: "wet".into(),
        });
        assert_eq!(d.category(), Category::Diaper);
        assert!(d.quantity().is_none());
    }

    #[test]
    fn serializes_flat_with_category_tag() {
        let r = record(ActivityDetail::Sleep {
            subtype: "nap".into(),
            duration: None,
        });
        let json = serde_json::to_value(&r).unwrap();
        assert_eq!(json["category"], "sleep");
        assert_eq!(json["subtype"], "nap");
        assert_eq!(json["source"], "imported");
        assert!(json["duration"].is_null());

        let back: ActivityRecord = serde_json::from_value(json).unwrap();
        assert_eq!(back, r);
    }
}
