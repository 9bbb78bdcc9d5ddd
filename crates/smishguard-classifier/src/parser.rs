//! Best-effort parsing of the reasoning service's free-text answer.
//!
//! The deployed prompt asks the model for three numbered sections:
//!
//! ```text
//! 1. Final verdict: <label>
//! 2. Rationale: <reason, may span lines>
//! 3. Risk level: <NN>%
//! ```
//!
//! Korean markers (`최종 판단`, `판단 근거`, `위험도`) are accepted as well.
//! Every missing piece falls back to a fixed default; parsing never fails.

use std::fmt;
use std::sync::OnceLock;

use regex::Regex;
use smishguard_common::{Confidence, Label, Verdict};
use tracing::{debug, warn};

pub const FALLBACK_REASON: &str = "no rationale found in model response";

/// Version of the three-section answer template agreed with the prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemplateVersion {
    V1,
}

impl TemplateVersion {
    pub const CURRENT: TemplateVersion = TemplateVersion::V1;
}

impl fmt::Display for TemplateVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TemplateVersion::V1 => f.write_str("v1 (verdict / rationale / risk level)"),
        }
    }
}

fn label_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?is)1\.[ \t]*(?:최종[ \t]*판단|final[ \t]+verdict)[ \t]*[:：]?[ \t]*(.*?)(?:\n\s*[23]\.|\z)")
            .expect("label pattern is valid")
    })
}

fn reason_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?is)2\.[ \t]*(?:판단[ \t]*근거|rationale)[ \t]*[:：]?[ \t]*(.*?)(?:\n\s*3\.|\z)")
            .expect("reason pattern is valid")
    })
}

fn confidence_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)3\.[ \t]*(?:위험도|risk[ \t]+level)[ \t]*[:：]?[^\n%]*?(\d+(?:\.\d+)?)[ \t]*%")
            .expect("confidence pattern is valid")
    })
}

fn pattern(cell: &'static OnceLock<Regex>, re: &str) -> &'static Regex {
    cell.get_or_init(|| Regex::new(re).expect("verdict pattern is valid"))
}

/// "not smishing", "스미싱이 아닙니다" and the like.
fn negated_fraud() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    pattern(
        &RE,
        r"\bnot\s+(?:a\s+|an\s+)?(?:smishing|phishing|fraud|scam|suspicious)\b|(?:스미싱|사기|의심)\s*(?:이\s*)?아(?:님|닙니다|니)",
    )
}

/// "not benign", "abnormal", "비정상", "정상 아님".
fn negated_benign() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    pattern(
        &RE,
        r"\bnot\s+(?:a\s+|an\s+)?(?:benign|legitimate|normal|safe)\b|\b(?:abnormal|illegitimate)\b|비정상|정상\s*(?:이\s*)?아(?:님|닙니다|니)",
    )
}

fn benign() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    pattern(&RE, r"\b(?:benign|legitimate|normal|safe)\b|(?:^|[^비])정상")
}

const SUSPICIOUS_TERMS: &[&str] = &["의심", "주의", "suspicious", "suspected"];
const SMISHING_TERMS: &[&str] = &["스미싱", "사기", "smishing", "phishing", "fraud", "scam"];

/// Map the model's verdict wording onto the closed label set.
///
/// Order: negated fraud words, suspicion words, fraud words, negated
/// benign words (`Suspicious`), benign words.
pub fn label_from_text(text: &str) -> Label {
    let lower = text.to_lowercase();
    let has = |terms: &[&str]| terms.iter().any(|t| lower.contains(t));

    if negated_fraud().is_match(&lower) {
        Label::Benign
    } else if has(SUSPICIOUS_TERMS) {
        Label::Suspicious
    } else if has(SMISHING_TERMS) {
        Label::Smishing
    } else if negated_benign().is_match(&lower) {
        Label::Suspicious
    } else if benign().is_match(&lower) {
        Label::Benign
    } else {
        Label::Undetermined
    }
}

fn capture<'t>(re: &Regex, text: &'t str) -> Option<&'t str> {
    re.captures(text)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim())
        .filter(|s| !s.is_empty())
}

/// Parse a raw model answer into a `Verdict`.
///
/// - verdict section absent → `Label::Undetermined`
/// - rationale absent → `FALLBACK_REASON`
/// - risk level absent → `0%`
/// - none of the three present → full failure record
pub fn parse_response(raw: &str) -> Verdict {
    let label_text = capture(label_regex(), raw);
    let reason = capture(reason_regex(), raw);
    let confidence = confidence_regex()
        .captures(raw)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse::<f64>().ok())
        .map(Confidence::from_percent);

    if label_text.is_none() && reason.is_none() && confidence.is_none() {
        warn!(
            template = %TemplateVersion::CURRENT,
            chars = raw.chars().count(),
            "model response does not follow the answer template"
        );
        return Verdict::failure(format!(
            "model response does not follow the {} answer template",
            TemplateVersion::CURRENT
        ));
    }

    let missing: Vec<&str> = [
        ("verdict", label_text.is_none()),
        ("rationale", reason.is_none()),
        ("risk level", confidence.is_none()),
    ]
    .into_iter()
    .filter_map(|(name, absent)| absent.then_some(name))
    .collect();
    if !missing.is_empty() {
        debug!(?missing, "model response is missing template sections");
    }

    let label = match label_text {
        Some(text) => {
            let label = label_from_text(text);
            if label == Label::Undetermined {
                warn!(verdict = text, "unrecognised verdict wording");
            }
            label
        }
        None => Label::Undetermined,
    };

    Verdict::new(
        label,
        confidence.unwrap_or(Confidence::NONE),
        reason.unwrap_or(FALLBACK_REASON),
    )
}
