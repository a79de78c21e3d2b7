//! Measurements extracted from message text.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Millilitres per US fluid ounce.
pub const ML_PER_FL_OZ: f64 = 29.5735;
/// Kilograms per pound.
pub const KG_PER_LB: f64 = 0.453592;
/// Kilograms per avoirdupois ounce (compound `7 lb 4 oz` weights only).
pub const KG_PER_OZ: f64 = 0.0283495;
/// Centimetres per inch.
pub const CM_PER_INCH: f64 = 2.54;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuantityKind {
    Volume,
    Duration,
    Temperature,
    Weight,
    Length,
}

impl QuantityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Volume => "volume",
            Self::Duration => "duration",
            Self::Temperature => "temperature",
            Self::Weight => "weight",
            Self::Length => "length",
        }
    }
}

impl fmt::Display for QuantityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Canonical unit of a quantity.
///
/// Every kind has exactly one canonical unit except temperature, which keeps
/// the scale it was written in. Celsius and Fahrenheit are never converted
/// into each other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Unit {
    #[serde(rename = "ml")]
    Milliliters,
    #[serde(rename = "minutes")]
    Minutes,
    #[serde(rename = "F")]
    Fahrenheit,
    #[serde(rename = "C")]
    Celsius,
    #[serde(rename = "kg")]
    Kilograms,
    #[serde(rename = "cm")]
    Centimeters,
}

impl Unit {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Milliliters => "ml",
            Self::Minutes => "minutes",
            Self::Fahrenheit => "F",
            Self::Celsius => "C",
            Self::Kilograms => "kg",
            Self::Centimeters => "cm",
        }
    }

    pub fn kind(&self) -> QuantityKind {
        match self {
            Self::Milliliters => QuantityKind::Volume,
            Self::Minutes => QuantityKind::Duration,
            Self::Fahrenheit | Self::Celsius => QuantityKind::Temperature,
            Self::Kilograms => QuantityKind::Weight,
            Self::Centimeters => QuantityKind::Length,
        }
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One detected measurement, already converted to its canonical unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractedQuantity {
    pub kind: QuantityKind,
    pub value: f64,
    pub unit: Unit,
    /// The exact text that was matched, e.g. `"8oz"` for a 236.588 ml volume.
    pub raw_span: String,
    /// Byte offset of `raw_span` in the message text.
    pub start: usize,
    /// Byte offset one past the end of `raw_span`.
    pub end: usize,
}

impl ExtractedQuantity {
    /// Whether two quantities share any byte of the source text.
    pub fn overlaps(&self, other: &ExtractedQuantity) -> bool {
        self.start < other.end && other.start < self.end
    }
}

impl fmt::Display for ExtractedQuantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Trim trailing zeros so 120.0 prints as "120" and 98.60 as "98.6".
        let mut value = format!("{:.3}", self.value);
        while value.ends_with('0') {
            value.pop();
        }
        if value.ends_with('.') {
            value.pop();
        }
        write!(f, "{value} {}", self.unit)
    }
}
