//! Numeric quantity detection with unit normalization.
//!
//! Every unit pattern runs over the text. Candidates are then resolved
//! left to right: at each position the longest span wins, and ties go to the
//! pattern listed first, so `7 lb 4 oz` is one weight rather than a weight and
//! a volume, and `1h30m` is one duration.

use std::sync::LazyLock;

use nestlog_core::quantity::{CM_PER_INCH, KG_PER_LB, KG_PER_OZ, ML_PER_FL_OZ};
use nestlog_core::{ExtractedQuantity, Unit};
use regex::Regex;

const NUM: &str = r"(\d+(?:\.\d+)?)";

/// How captured numbers become a canonical value.
#[derive(Debug, Clone, Copy)]
enum Conversion {
    /// One number times a factor.
    Scale(f64),
    /// Two numbers, each with its own factor, summed.
    Compound(f64, f64),
}

#[derive(Debug)]
struct UnitPattern {
    regex: Regex,
    unit: Unit,
    conversion: Conversion,
}

/// Compiled unit patterns.
#[derive(Debug)]
pub struct QuantityExtractor {
    patterns: Vec<UnitPattern>,
}

static STANDARD: LazyLock<QuantityExtractor> = LazyLock::new(QuantityExtractor::build);

impl QuantityExtractor {
    /// The built-in pattern table, compiled on first use.
    pub fn standard() -> &'static QuantityExtractor {
        &STANDARD
    }

    fn build() -> Self {
        use Conversion::{Compound, Scale};

        // One-letter units only count when glued to the number: `2h`, `24in`.
        let hours = r"(?:\s*(?:hours?|hrs?)|h)";
        let minutes = r"(?:\s*(?:minutes?|mins?)|m)";
        let pounds = r"(?:pounds?|lbs?)";
        let ounces = r"(?:ounces?|oz)";
        let degrees = r"\s*(?:°\s*|degrees?\s*)";

        let table: Vec<(String, Unit, Conversion)> = vec![
            (
                format!(r"\b{NUM}{hours}\s*(?:and\s+)?{NUM}{minutes}\b"),
                Unit::Minutes,
                Compound(60.0, 1.0),
            ),
            (
                format!(r"\b{NUM}\s*{pounds}\s*(?:and\s+)?{NUM}\s*{ounces}\b"),
                Unit::Kilograms,
                Compound(KG_PER_LB, KG_PER_OZ),
            ),
            (
                format!(r"\b{NUM}\s*(?:millilit(?:er|re)s?|mls?|cc)\b"),
                Unit::Milliliters,
                Scale(1.0),
            ),
            (
                format!(r"\b{NUM}\s*(?:fl\.?\s*)?{ounces}\b"),
                Unit::Milliliters,
                Scale(ML_PER_FL_OZ),
            ),
            (format!(r"\b{NUM}{hours}\b"), Unit::Minutes, Scale(60.0)),
            (format!(r"\b{NUM}{minutes}\b"), Unit::Minutes, Scale(1.0)),
            (
                format!(r"\b{NUM}(?:{degrees}?fahrenheit|{degrees}f|f)\b"),
                Unit::Fahrenheit,
                Scale(1.0),
            ),
            (
                format!(r"\b{NUM}(?:{degrees}?(?:celsius|centigrade)|{degrees}c|c)\b"),
                Unit::Celsius,
                Scale(1.0),
            ),
            (
                format!(r"\b{NUM}\s*(?:kilograms?|kilos?|kgs?)\b"),
                Unit::Kilograms,
                Scale(1.0),
            ),
            (format!(r"\b{NUM}\s*{pounds}\b"), Unit::Kilograms, Scale(KG_PER_LB)),
            (
                format!(r"\b{NUM}(?:\s*(?:grams?|gms?)|g)\b"),
                Unit::Kilograms,
                Scale(0.001),
            ),
            (
                format!(r"\b{NUM}\s*(?:centimet(?:er|re)s?|cms?)\b"),
                Unit::Centimeters,
                Scale(1.0),
            ),
            (
                format!(r"\b{NUM}(?:\s*(?:inches|inch)|in)\b"),
                Unit::Centimeters,
                Scale(CM_PER_INCH),
            ),
        ];

        let patterns = table
            .into_iter()
            .map(|(pattern, unit, conversion)| UnitPattern {
                regex: Regex::new(&format!("(?i){pattern}")).expect("valid quantity pattern"),
                unit,
                conversion,
            })
            .collect();
        Self { patterns }
    }

    /// All non-overlapping quantities in `text`, in order of appearance.
    pub fn extract(&self, text: &str) -> Vec<ExtractedQuantity> {
        // (pattern index, quantity)
        let mut candidates: Vec<(usize, ExtractedQuantity)> = Vec::new();
        for (index, pattern) in self.patterns.iter().enumerate() {
            for caps in pattern.regex.captures_iter(text) {
                let Some(whole) = caps.get(0) else { continue };
                let number = |i: usize| caps.get(i).and_then(|m| m.as_str().parse::<f64>().ok());
                let value = match pattern.conversion {
                    Conversion::Scale(factor) => number(1).map(|v| v * factor),
                    Conversion::Compound(first, second) => {
                        number(1).zip(number(2)).map(|(a, b)| a * first + b * second)
                    }
                };
                let Some(value) = value else { continue };
                candidates.push((
                    index,
                    ExtractedQuantity {
                        kind: pattern.unit.kind(),
                        value,
                        unit: pattern.unit,
                        raw_span: whole.as_str().to_string(),
                        start: whole.start(),
                        end: whole.end(),
                    },
                ));
            }
        }

        candidates.sort_by(|(ia, a), (ib, b)| {
            a.start
                .cmp(&b.start)
                .then((b.end - b.start).cmp(&(a.end - a.start)))
                .then(ia.cmp(ib))
        });

        let mut accepted: Vec<ExtractedQuantity> = Vec::new();
        for (_, q) in candidates {
            if accepted.last().is_none_or(|prev| !prev.overlaps(&q)) {
                accepted.push(q);
            }
        }
        accepted
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nestlog_core::QuantityKind;

    fn extract(text: &str) -> Vec<ExtractedQuantity> {
        QuantityExtractor::standard().extract(text)
    }

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-6
    }

    #[test]
    fn millilitres_without_space() {
        let q = extract("Baby fed 150ml formula");
        assert_eq!(q.len(), 1);
        assert_eq!(q[0].kind, QuantityKind::Volume);
        assert_eq!(q[0].unit, Unit::Milliliters);
        assert!(close(q[0].value, 150.0));
        assert_eq!(q[0].raw_span, "150ml");
        assert_eq!(&"Baby fed 150ml formula"[q[0].start..q[0].end], "150ml");
    }

    #[test]
    fn ounces_convert_to_millilitres() {
        let q = extract("8oz bottle");
        assert_eq!(q.len(), 1);
        assert_eq!(q[0].unit, Unit::Milliliters);
        assert!(close(q[0].value, 236.588));
        assert_eq!(q[0].raw_span, "8oz");

        let q = extract("took 4 fl oz");
        assert!(close(q[0].value, 118.294));
    }

    #[test]
    fn hours_convert_to_minutes() {
        let q = extract("Napped for 2 hours");
        assert_eq!(q.len(), 1);
        assert_eq!(q[0].kind, QuantityKind::Duration);
        assert!(close(q[0].value, 120.0));
        assert_eq!(q[0].raw_span, "2 hours");

        assert!(close(extract("1.5 hrs")[0].value, 90.0));
        assert!(close(extract("45 mins")[0].value, 45.0));
    }

    #[test]
    fn compound_duration_is_one_quantity() {
        let q = extract("slept 1h30m straight");
        assert_eq!(q.len(), 1);
        assert!(close(q[0].value, 90.0));
        assert_eq!(q[0].raw_span, "1h30m");

        let q = extract("nap 2 hours and 15 minutes");
        assert_eq!(q.len(), 1);
        assert!(close(q[0].value, 135.0));
    }

    #[test]
    fn temperature_keeps_its_scale() {
        let q = extract("Temperature 98.6F, all normal");
        assert_eq!(q.len(), 1);
        assert_eq!(q[0].unit, Unit::Fahrenheit);
        assert!(close(q[0].value, 98.6));
        assert_eq!(q[0].raw_span, "98.6F");

        let q = extract("temp 37.5°C");
        assert_eq!(q[0].unit, Unit::Celsius);
        assert!(close(q[0].value, 37.5));

        let q = extract("fever 101 degrees F");
        assert_eq!(q[0].unit, Unit::Fahrenheit);
    }

    #[test]
    fn weights_convert_to_kilograms() {
        assert!(close(extract("weighs 5.2 kg")[0].value, 5.2));
        assert!(close(extract("weighed 3400g")[0].value, 3.4));
        assert!(close(extract("11 lbs")[0].value, 11.0 * KG_PER_LB));

        let q = extract("weighed 7 lb 4 oz today");
        assert_eq!(q.len(), 1);
        assert_eq!(q[0].unit, Unit::Kilograms);
        assert!(close(q[0].value, 7.0 * KG_PER_LB + 4.0 * KG_PER_OZ));
        assert_eq!(q[0].raw_span, "7 lb 4 oz");
    }

    #[test]
    fn lengths_convert_to_centimetres() {
        assert!(close(extract("length 60 cm")[0].value, 60.0));
        let q = extract("24 inches long");
        assert_eq!(q[0].unit, Unit::Centimeters);
        assert!(close(q[0].value, 60.96));
    }

    #[test]
    fn several_quantities_in_text_order() {
        let q = extract("2 hours later had 120 ml then 4oz");
        let units: Vec<Unit> = q.iter().map(|q| q.unit).collect();
        assert_eq!(
            units,
            vec![Unit::Minutes, Unit::Milliliters, Unit::Milliliters]
        );
        assert!(q.windows(2).all(|w| w[0].end <= w[1].start));
    }

    #[test]
    fn no_false_positives_on_plain_numbers_and_times() {
        assert!(extract("lol that's so funny").is_empty());
        assert!(extract("at 1:18 pm").is_empty());
        assert!(extract("2pm feed").is_empty());
        assert!(extract("3 months old").is_empty());
        assert!(extract("5 mg ibuprofen").is_empty());
        assert!(extract("").is_empty());
    }

    #[test]
    fn one_letter_units_must_touch_the_number() {
        let q = extract("Measured at 3 in the afternoon, 62 cm long");
        assert_eq!(q.len(), 1);
        assert_eq!(q[0].raw_span, "62 cm");

        assert!(extract("plan c, or 2 g of sugar? 4 h left").is_empty());
        assert!(close(extract("24in")[0].value, 60.96));
        assert!(close(extract("slept 2h")[0].value, 120.0));
    }

    #[test]
    fn units_are_case_insensitive() {
        let q = extract("120ML");
        assert_eq!(q[0].unit, Unit::Milliliters);
        assert_eq!(q[0].raw_span, "120ML");
    }
}
