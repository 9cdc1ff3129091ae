//! Field Extractor: runs a field's ordered rules over normalized text.
//!
//! Single and list fields stop at the first plausible capture. Collected
//! fields (examination, investigations, assessment, plan) keep every capture
//! across all their rules, de-duplicated by containment.

use std::sync::LazyLock;

use regex::Regex;

use super::patterns::{ExtractionRule, PatternLibrary, RuleKind, RuleScope};
use super::sanitize::{clean_capture, sentence_windows};
use super::types::{Cardinality, ExtractedField, FieldId, VitalKind, VitalSignValue};
use super::values::{normalize_field, FieldValue};

static LIST_SEPARATOR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\s*(?:,|;|\band\b)\s*").expect("Invalid list separator regex")
});

static PULSE_RIVALS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:blood\s+pressure|bp|cuff)\b").expect("Invalid pulse rival regex")
});

static BLOOD_PRESSURE_RIVALS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:pulse|heart\s+rate)\b").expect("Invalid blood pressure rival regex")
});

const STOPWORDS: &[&str] = &["the", "and", "or", "with", "for", "a", "an"];

const NAME_REJECTS: &[&str] = &[
    "dr", "doctor", "not", "sorry", "just", "fine", "good", "okay", "ok", "here", "so", "well",
    "the", "yes", "no",
];

const DOCTOR_NAME_REJECTS: &[&str] = &[
    "i'm", "i'll", "i", "okay", "ok", "thanks", "thank", "hello", "hi", "good", "yes", "no",
    "so", "well", "the",
];

const MEDICATION_REJECTS: &[&str] = &["about", "around", "take", "takes", "taking", "every", "like"];

/// Cleaned captures from the winning rule(s).
#[derive(Debug, Clone, PartialEq)]
pub struct RawCapture {
    /// Index of the first rule that produced a capture.
    pub rule_index: usize,
    pub kind: RuleKind,
    pub captures: Vec<String>,
}

/// Extract a field from normalized text using the built-in library.
pub fn extract(field: FieldId, text: &str) -> ExtractedField {
    extract_with(PatternLibrary::built_in(), field, text)
}

/// Extract a field using a caller-supplied library.
pub fn extract_with(library: &PatternLibrary, field: FieldId, text: &str) -> ExtractedField {
    resolve(library, field, text).0
}

/// Extract a vital sign, keeping whether it resolved to a reading or narration.
pub fn extract_vital(field: FieldId, text: &str) -> VitalSignValue {
    extract_vital_with(PatternLibrary::built_in(), field, text)
}

pub fn extract_vital_with(library: &PatternLibrary, field: FieldId, text: &str) -> VitalSignValue {
    let (extracted, value) = resolve(library, field, text);
    let kind = match value {
        Some(FieldValue::Vital(reading)) => reading.kind(),
        _ => VitalKind::Descriptive,
    };
    VitalSignValue { field: extracted, kind }
}

fn resolve(library: &PatternLibrary, field: FieldId, text: &str) -> (ExtractedField, Option<FieldValue>) {
    let Some(raw) = find_captures(library, field, text) else {
        tracing::debug!(field = %field, "No rule matched");
        return (ExtractedField::not_found(field), None);
    };

    let Some(value) = normalize_field(field, &raw.captures, text) else {
        tracing::debug!(field = %field, rule = raw.rule_index, "Capture normalized to nothing");
        return (ExtractedField::not_found(field), None);
    };

    let extracted = ExtractedField {
        field,
        raw_capture: raw.captures.join(field.joiner()),
        normalized_value: value.render(field),
        found: true,
        items: value.items(),
        rule_index: Some(raw.rule_index),
    };
    (extracted, Some(value))
}

/// Run a field's rules in order and return its captures, or `None` on a miss.
///
/// Each call iterates fresh `captures_iter` cursors, so repeated calls on the
/// same library never see stale match positions.
pub fn find_captures(library: &PatternLibrary, field: FieldId, text: &str) -> Option<RawCapture> {
    let collect = field.cardinality() == Cardinality::Collect;
    let mut result: Option<RawCapture> = None;

    for (index, rule) in library.rules(field).iter().enumerate() {
        for capture in rule_captures(rule, text) {
            match result.as_mut() {
                Some(found) => merge_distinct(&mut found.captures, capture),
                None => {
                    result = Some(RawCapture {
                        rule_index: index,
                        kind: rule.kind,
                        captures: vec![capture],
                    });
                }
            }
            if !collect {
                return result;
            }
        }
    }

    result
}

/// Plausible, cleaned captures of one rule in match order.
fn rule_captures(rule: &ExtractionRule, text: &str) -> Vec<String> {
    let windows = match rule.scope {
        RuleScope::Text => vec![text],
        RuleScope::Sentences(n) => sentence_windows(text, n),
    };

    let rivals = match rule.kind {
        RuleKind::DescriptiveFallback => rival_anchors(rule.field),
        _ => None,
    };

    windows
        .into_iter()
        .flat_map(|window| rule.pattern.captures_iter(window))
        .filter(|caps| !rivals.is_some_and(|r| r.is_match(&caps[0])))
        .filter_map(|caps| caps.get(rule.capture).map(|m| clean_capture(m.as_str())))
        .filter(|capture| is_plausible(rule.field, capture))
        .collect()
}

/// Anchors of the neighbouring vital. A descriptive match that runs into one
/// of them is narrating that vital, not this one.
fn rival_anchors(field: FieldId) -> Option<&'static Regex> {
    match field {
        FieldId::Pulse => Some(&PULSE_RIVALS),
        FieldId::BloodPressure => Some(&BLOOD_PRESSURE_RIVALS),
        _ => None,
    }
}

/// Add `item` unless an existing entry already contains it. A longer item
/// replaces the shorter entries it contains.
fn merge_distinct(items: &mut Vec<String>, item: String) {
    let lower = item.to_lowercase();
    if items.iter().any(|existing| existing.to_lowercase().contains(&lower)) {
        return;
    }
    items.retain(|existing| !lower.contains(&existing.to_lowercase()));
    items.push(item);
}

fn first_word(text: &str) -> String {
    text.split_whitespace()
        .next()
        .unwrap_or_default()
        .trim_end_matches([',', '.'])
        .to_lowercase()
}

fn is_plausible(field: FieldId, capture: &str) -> bool {
    if capture.is_empty() {
        return false;
    }

    match field {
        FieldId::Age => capture.parse::<u32>().is_ok_and(|age| age <= 120),
        FieldId::Gender => true,
        FieldId::PatientName => !NAME_REJECTS.contains(&first_word(capture).as_str()),
        FieldId::DoctorName => {
            let name = capture.strip_prefix("Dr.").unwrap_or(capture).trim();
            !name.is_empty() && !DOCTOR_NAME_REJECTS.contains(&first_word(name).as_str())
        }
        FieldId::PastMedicalHistory => {
            capture.chars().count() >= 3 && !capture.to_lowercase().contains("present illness")
        }
        FieldId::Allergies => {
            matches!(capture.to_lowercase().as_str(), "no" | "nope" | "none")
                || capture.chars().count() >= 3
        }
        FieldId::Medications => {
            capture.chars().count() >= 3
                && !MEDICATION_REJECTS.contains(&first_word(capture).as_str())
        }
        f if f.is_vital() => true,
        FieldId::ConsultationDate | FieldId::ConsultationTime => true,
        _ => capture.chars().count() >= 3,
    }
}

/// Split a clause into list items on `,`, `;` and the word "and".
/// Fragments under 3 characters, bare stopwords and duplicates are dropped;
/// a leading article is removed from each item.
pub fn split_list_items(clause: &str) -> Vec<String> {
    let mut items: Vec<String> = Vec::new();

    for fragment in LIST_SEPARATOR.split(clause) {
        let mut item = clean_capture(fragment);
        for article in ["a ", "an ", "the "] {
            if item.len() > article.len()
                && item.is_char_boundary(article.len())
                && item[..article.len()].eq_ignore_ascii_case(article)
            {
                item = item[article.len()..].trim_start().to_string();
                break;
            }
        }

        let lower = item.to_lowercase();
        if item.chars().count() < 3 || STOPWORDS.contains(&lower.as_str()) {
            continue;
        }
        if items.iter().any(|existing| existing.to_lowercase() == lower) {
            continue;
        }
        items.push(item);
    }

    items
}
