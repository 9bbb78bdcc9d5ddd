//! Verdict record returned by every classification.
//!
//! Confidence has a single representation: a fraction in `[0.0, 1.0]`.
//! Deterministic matches carry `1.0`, failures `0.0`, and model answers such
//! as `"85%"` are mapped to `0.85`. `Display` renders the percentage form.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Closed set of verdict categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Label {
    /// Confirmed or model-judged fraudulent message.
    Smishing,
    /// Model flagged the message but stopped short of calling it fraud.
    Suspicious,
    /// Model judged the message legitimate.
    Benign,
    /// No verdict could be reached (external failure or unparseable answer).
    Undetermined,
}

impl Label {
    pub fn as_str(&self) -> &'static str {
        match self {
            Label::Smishing     => "smishing",
            Label::Suspicious   => "suspicious",
            Label::Benign       => "benign",
            Label::Undetermined => "undetermined",
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, Label::Undetermined)
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Confidence as a fraction in `[0.0, 1.0]`.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Confidence(f64);

impl Confidence {
    pub const CERTAIN: Confidence = Confidence(1.0);
    pub const NONE: Confidence = Confidence(0.0);

    /// Build from a fraction, clamped to `[0.0, 1.0]`. NaN maps to zero.
    pub fn from_fraction(value: f64) -> Self {
        if value.is_nan() {
            return Self::NONE;
        }
        Confidence(value.clamp(0.0, 1.0))
    }

    /// Build from a percentage (`85.0` → `0.85`), clamped.
    pub fn from_percent(value: f64) -> Self {
        Self::from_fraction(value / 100.0)
    }

    pub fn value(&self) -> f64 {
        self.0
    }

    pub fn as_percent(&self) -> f64 {
        self.0 * 100.0
    }
}

impl Default for Confidence {
    fn default() -> Self {
        Self::NONE
    }
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let pct = self.as_percent();
        if (pct - pct.round()).abs() < 1e-9 {
            write!(f, "{}%", pct.round() as u32)
        } else {
            write!(f, "{:.1}%", pct)
        }
    }
}

/// Final output of a classification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Verdict {
    pub label: Label,
    pub confidence: Confidence,
    pub reason: String,
}

impl Verdict {
    pub fn new(label: Label, confidence: Confidence, reason: impl Into<String>) -> Self {
        Self { label, confidence, reason: reason.into() }
    }

    /// Deterministic match against a known-item list.
    pub fn known_match(reason: impl Into<String>) -> Self {
        Self::new(Label::Smishing, Confidence::CERTAIN, reason)
    }

    /// Verdict for a request that could not be decided.
    pub fn failure(reason: impl Into<String>) -> Self {
        Self::new(Label::Undetermined, Confidence::NONE, reason)
    }

    pub fn is_failure(&self) -> bool {
        self.label.is_failure()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_percent_maps_to_fraction() {
        let c = Confidence::from_percent(85.0);
        assert!((c.value() - 0.85).abs() < 1e-9);
        assert_eq!(c.to_string(), "85%");
    }

    #[test]
    fn test_fractional_percent_display() {
        let c = Confidence::from_percent(72.5);
        assert!((c.value() - 0.725).abs() < 1e-9);
        assert_eq!(c.to_string(), "72.5%");
    }

    #[test]
    fn test_confidence_is_clamped() {
        assert_eq!(Confidence::from_percent(140.0), Confidence::CERTAIN);
        assert_eq!(Confidence::from_fraction(-0.3), Confidence::NONE);
        assert_eq!(Confidence::from_fraction(f64::NAN), Confidence::NONE);
    }

    #[test]
    fn test_known_match_is_certain_smishing() {
        let v = Verdict::known_match("matched known fraudulent URL");
        assert_eq!(v.label, Label::Smishing);
        assert_eq!(v.confidence, Confidence::CERTAIN);
        assert!(!v.is_failure());
    }

    #[test]
    fn test_verdict_serializes_confidence_as_number() {
        let v = Verdict::failure("boom");
        let json = serde_json::to_value(&v).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"label": "undetermined", "confidence": 0.0, "reason": "boom"})
        );
    }
}
