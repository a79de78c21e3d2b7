//! Activity categories and classifier output.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Top-level activity classification.
///
/// The set is closed: every category the pipeline can produce is known at
/// compile time. `Uncategorized` is a classifier outcome only and never
/// appears on a stored record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Feeding,
    Diaper,
    Sleep,
    Health,
    Measurement,
    Milestone,
    Uncategorized,
}

impl Category {
    /// Categories that can be emitted as records, in tie-break priority order
    /// (highest first).
    pub const BY_PRIORITY: [Category; 6] = [
        Self::Health,
        Self::Measurement,
        Self::Feeding,
        Self::Diaper,
        Self::Sleep,
        Self::Milestone,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Feeding => "feeding",
            Self::Diaper => "diaper",
            Self::Sleep => "sleep",
            Self::Health => "health",
            Self::Measurement => "measurement",
            Self::Milestone => "milestone",
            Self::Uncategorized => "uncategorized",
        }
    }

    /// Tie-break rank: lower wins.
    pub fn priority(&self) -> usize {
        Self::BY_PRIORITY
            .iter()
            .position(|c| c == self)
            .unwrap_or(Self::BY_PRIORITY.len())
    }

    /// Subtype used when no matched keyword carries one.
    pub fn default_subtype(&self) -> &'static str {
        match self {
            Self::Feeding => "breast",
            Self::Diaper => "change",
            Self::Sleep => "nap",
            Self::Health => "symptom",
            Self::Measurement => "growth",
            Self::Milestone => "general",
            Self::Uncategorized => "",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "feeding" => Ok(Self::Feeding),
            "diaper" => Ok(Self::Diaper),
            "sleep" => Ok(Self::Sleep),
            "health" => Ok(Self::Health),
            "measurement" => Ok(Self::Measurement),
            "milestone" => Ok(Self::Milestone),
            "uncategorized" => Ok(Self::Uncategorized),
            other => Err(format!("unknown category: {other}")),
        }
    }
}

/// Best category for one message, as chosen by the classifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryMatch {
    pub category: Category,
    /// Subtype carried by the strongest matched keyword, if any keyword had one.
    pub subtype: Option<String>,
    /// Sum of the weights of all non-negated matched rules.
    pub score: u32,
    /// Triggering phrases in order of first appearance in the text.
    pub matched_keywords: Vec<String>,
}

impl CategoryMatch {
    /// The empty result: no rule matched.
    pub fn uncategorized() -> Self {
        Self {
            category: Category::Uncategorized,
            subtype: None,
            score: 0,
            matched_keywords: Vec::new(),
        }
    }

    pub fn is_uncategorized(&self) -> bool {
        self.category == Category::Uncategorized
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn priority_order_is_fixed() {
        assert!(Category::Health.priority() < Category::Measurement.priority());
        assert!(Category::Measurement.priority() < Category::Feeding.priority());
        assert!(Category::Feeding.priority() < Category::Diaper.priority());
        assert!(Category::Diaper.priority() < Category::Sleep.priority());
        assert!(Category::Sleep.priority() < Category::Milestone.priority());
        assert_eq!(Category::Uncategorized.priority(), 6);
    }

    #[test]
    fn parse_round_trips_display() {
        for c in Category::BY_PRIORITY {
            assert_eq!(c.to_string().parse::<Category>().unwrap(), c);
        }
        assert_eq!(" Feeding ".parse::<Category>().unwrap(), Category::Feeding);
        assert!("vaccine".parse::<Category>().is_err());
    }

    #[test]
    fn serde_uses_snake_case() {
        let json = serde_json::to_string(&Category::Measurement).unwrap();
        assert_eq!(json, "\"measurement\"");
    }

    #[test]
    fn uncategorized_has_zero_score() {
        let m = CategoryMatch::uncategorized();
        assert!(m.is_uncategorized());
        assert_eq!(m.score, 0);
        assert!(m.matched_keywords.is_empty());
    }
}
