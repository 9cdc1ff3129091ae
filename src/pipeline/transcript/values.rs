//! Field-specific post-processing of raw captures.
//!
//! Every function here is total: malformed input falls through to the
//! cleaned capture rather than failing.

use std::fmt;
use std::sync::LazyLock;

use chrono::{NaiveDate, NaiveTime};
use regex::Regex;

use super::extractor::split_list_items;
use super::sanitize::{clean_capture, sentence_case};
use super::types::{FieldId, VitalKind, NKDA, NO_CURRENT_MEDICATIONS};

static LEADING_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*(\d+(?:\.\d+)?)").expect("Invalid leading number regex"));

static BP_READING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s*(\d{2,3})\s*(?:/|over)\s*(\d{2,3})\b").expect("Invalid blood pressure regex")
});

static NKDA_CLAUSE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\bnkda\b|\bno\s+allergies\b|\bno\s+known\b[^.!?]*\ballerg|\ballerg[^.!?]*\bno\s+known\b",
    )
    .expect("Invalid NKDA regex")
});

static ORDINAL_SUFFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(\d)(?:st|nd|rd|th)\b").expect("Invalid ordinal regex"));

const EQUIPMENT_MARKERS: &[&str] = &["malfunction", "clear reading", "try again"];
const AFEBRILE_MARKERS: &[&str] = &["normal", "afebrile", "no fever"];
const RECHECK_MARKERS: &[&str] = &["check", "needed", "later"];

// ═══════════════════════════════════════════════════════════
// Types
// ═══════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VitalUnit {
    Fahrenheit,
    Celsius,
    BeatsPerMinute,
    MillimetresOfMercury,
    BreathsPerMinute,
    MilligramsPerDecilitre,
}

impl VitalUnit {
    pub fn suffix(self) -> &'static str {
        match self {
            VitalUnit::Fahrenheit => "°F",
            VitalUnit::Celsius => "°C",
            VitalUnit::BeatsPerMinute => " bpm",
            VitalUnit::MillimetresOfMercury => " mmHg",
            VitalUnit::BreathsPerMinute => "/min",
            VitalUnit::MilligramsPerDecilitre => " mg/dL",
        }
    }
}

/// A vital sign after normalization: an in-range reading, or narration kept verbatim.
#[derive(Debug, Clone, PartialEq)]
pub enum VitalReading {
    Numeric { value: String, unit: VitalUnit },
    Descriptive(String),
}

impl VitalReading {
    pub fn kind(&self) -> VitalKind {
        match self {
            VitalReading::Numeric { .. } => VitalKind::NumericWithUnit,
            VitalReading::Descriptive(_) => VitalKind::Descriptive,
        }
    }
}

impl fmt::Display for VitalReading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VitalReading::Numeric { value, unit } => write!(f, "{value}{}", unit.suffix()),
            VitalReading::Descriptive(text) => f.write_str(text),
        }
    }
}

/// Normalized value of any field.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Vital(VitalReading),
    Text(String),
    List(Vec<String>),
}

impl FieldValue {
    /// Flattened string for the note.
    pub fn render(&self, field: FieldId) -> String {
        match self {
            FieldValue::Vital(reading) => reading.to_string(),
            FieldValue::Text(text) => text.clone(),
            FieldValue::List(items) => items.join(field.joiner()),
        }
    }

    pub fn items(&self) -> Vec<String> {
        match self {
            FieldValue::List(items) => items.clone(),
            _ => Vec::new(),
        }
    }

    fn is_empty(&self) -> bool {
        match self {
            FieldValue::Vital(reading) => reading.to_string().is_empty(),
            FieldValue::Text(text) => text.is_empty(),
            FieldValue::List(items) => items.is_empty(),
        }
    }
}

// ═══════════════════════════════════════════════════════════
// Dispatch
// ═══════════════════════════════════════════════════════════

/// Normalize the captures for a field. `None` when nothing usable survives.
pub fn normalize_field(field: FieldId, captures: &[String], full_text: &str) -> Option<FieldValue> {
    let first = captures.first()?;

    let value = match field {
        FieldId::Temperature => FieldValue::Vital(normalize_temperature(first)),
        FieldId::Pulse => FieldValue::Vital(normalize_pulse(first)),
        FieldId::BloodPressure => FieldValue::Vital(normalize_blood_pressure(first)),
        FieldId::RespiratoryRate => FieldValue::Vital(normalize_respiratory_rate(first)),
        FieldId::Glucose => FieldValue::Vital(normalize_glucose(first)),
        FieldId::Gender => FieldValue::Text(normalize_gender(first)),
        FieldId::PatientName | FieldId::Age => FieldValue::Text(clean_capture(first)),
        FieldId::DoctorName => FieldValue::Text(normalize_doctor_name(first)),
        FieldId::ConsultationDate => FieldValue::Text(normalize_date(first)),
        FieldId::ConsultationTime => FieldValue::Text(normalize_time(first)),
        FieldId::Allergies => normalize_allergies(first, full_text),
        FieldId::Medications => FieldValue::List(normalize_medications(first)),
        FieldId::PastMedicalHistory => FieldValue::List(normalize_history(first)),
        FieldId::ChiefComplaint | FieldId::HistoryOfPresentIllness | FieldId::ReviewOfSystems => {
            FieldValue::Text(sentence_case(&clean_capture(first)))
        }
        FieldId::PhysicalExamination
        | FieldId::Investigations
        | FieldId::Assessment
        | FieldId::Plan => FieldValue::List(
            captures
                .iter()
                .map(|c| sentence_case(&clean_capture(c)))
                .filter(|c| !c.is_empty())
                .collect(),
        ),
    };

    (!value.is_empty()).then_some(value)
}

// ═══════════════════════════════════════════════════════════
// Vital signs
// ═══════════════════════════════════════════════════════════

/// Leading decimal and its text, e.g. `"98.6 degrees"` → `("98.6", 98.6)`.
fn leading_number(text: &str) -> Option<(&str, f64)> {
    let m = LEADING_NUMBER.captures(text)?.get(1)?;
    let value = m.as_str().parse::<f64>().ok()?;
    Some((m.as_str(), value))
}

fn leading_integer(text: &str) -> Option<u32> {
    let digits: String = text.trim_start().chars().take_while(char::is_ascii_digit).collect();
    digits.parse().ok()
}

fn mentions_any(text: &str, markers: &[&str]) -> bool {
    let lower = text.to_lowercase();
    markers.iter().any(|m| lower.contains(m))
}

fn equipment_or_passthrough(cleaned: String) -> VitalReading {
    if mentions_any(&cleaned, EQUIPMENT_MARKERS) {
        VitalReading::Descriptive(format!("Equipment issue - {cleaned}"))
    } else {
        VitalReading::Descriptive(cleaned)
    }
}

/// 90–110 reads as Fahrenheit, 30–45 as Celsius, anything else defaults to
/// Fahrenheit but is tagged descriptive.
pub fn normalize_temperature(raw: &str) -> VitalReading {
    let cleaned = clean_capture(raw);

    if let Some((text, value)) = leading_number(&cleaned) {
        if (90.0..=110.0).contains(&value) {
            return VitalReading::Numeric { value: text.to_string(), unit: VitalUnit::Fahrenheit };
        }
        if (30.0..=45.0).contains(&value) {
            return VitalReading::Numeric { value: text.to_string(), unit: VitalUnit::Celsius };
        }
        return VitalReading::Descriptive(format!("{text}{}", VitalUnit::Fahrenheit.suffix()));
    }

    if mentions_any(&cleaned, AFEBRILE_MARKERS) {
        return VitalReading::Descriptive("Normal (afebrile)".to_string());
    }
    VitalReading::Descriptive(cleaned)
}

pub fn normalize_pulse(raw: &str) -> VitalReading {
    let cleaned = clean_capture(raw);
    match leading_integer(&cleaned) {
        Some(n) if (30..=200).contains(&n) => VitalReading::Numeric {
            value: n.to_string(),
            unit: VitalUnit::BeatsPerMinute,
        },
        _ => equipment_or_passthrough(cleaned),
    }
}

/// Accepts `120/80` or `120 over 80`, always rendered in slash form.
pub fn normalize_blood_pressure(raw: &str) -> VitalReading {
    let cleaned = clean_capture(raw);
    match BP_READING.captures(&cleaned) {
        Some(caps) => VitalReading::Numeric {
            value: format!("{}/{}", &caps[1], &caps[2]),
            unit: VitalUnit::MillimetresOfMercury,
        },
        None => equipment_or_passthrough(cleaned),
    }
}

pub fn normalize_respiratory_rate(raw: &str) -> VitalReading {
    let cleaned = clean_capture(raw);
    if let Some(n) = leading_integer(&cleaned).filter(|n| (5..=50).contains(n)) {
        return VitalReading::Numeric { value: n.to_string(), unit: VitalUnit::BreathsPerMinute };
    }

    let lower = cleaned.to_lowercase();
    if lower.contains("normal") {
        VitalReading::Descriptive("Breathing normally".to_string())
    } else if lower.contains("count") || lower.contains("exact") {
        VitalReading::Descriptive(format!("Rate not counted - {cleaned}"))
    } else {
        VitalReading::Descriptive(cleaned)
    }
}

pub fn normalize_glucose(raw: &str) -> VitalReading {
    let cleaned = clean_capture(raw);
    if let Some((text, value)) = leading_number(&cleaned) {
        if (20.0..=800.0).contains(&value) {
            return VitalReading::Numeric {
                value: text.to_string(),
                unit: VitalUnit::MilligramsPerDecilitre,
            };
        }
    }

    if mentions_any(&cleaned, RECHECK_MARKERS) {
        VitalReading::Descriptive(format!("To be checked - {cleaned}"))
    } else {
        VitalReading::Descriptive(cleaned)
    }
}

// ═══════════════════════════════════════════════════════════
// Identity & provider
// ═══════════════════════════════════════════════════════════

/// Coarse by intent: anything starting with `m` is Male, `f` is Female.
pub fn normalize_gender(raw: &str) -> String {
    let cleaned = clean_capture(raw);
    let lower = cleaned.to_lowercase();
    match lower.as_str() {
        "boy" | "gentleman" => "Male".to_string(),
        "woman" | "girl" | "lady" => "Female".to_string(),
        s if s.starts_with('m') => "Male".to_string(),
        s if s.starts_with('f') => "Female".to_string(),
        _ => sentence_case(&cleaned),
    }
}

pub fn normalize_doctor_name(raw: &str) -> String {
    let cleaned = clean_capture(raw);
    let name = cleaned
        .strip_prefix("Dr.")
        .or_else(|| cleaned.strip_prefix("Dr "))
        .unwrap_or(&cleaned)
        .trim();
    format!("Dr. {name}")
}

/// ISO `YYYY-MM-DD` when the capture parses as a calendar date.
pub fn normalize_date(raw: &str) -> String {
    const FORMATS: &[&str] = &[
        "%Y-%m-%d", "%m/%d/%y", "%m/%d/%Y", "%m-%d-%y", "%m-%d-%Y", "%B %d %Y", "%b %d %Y",
    ];

    let cleaned = clean_capture(raw);
    let simplified = ORDINAL_SUFFIX.replace_all(&cleaned, "$1").replace([',', '.'], "");

    FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(&simplified, fmt).ok())
        .map(|date| date.format("%Y-%m-%d").to_string())
        .unwrap_or(cleaned)
}

/// `HH:MM AM/PM` when the capture parses as a clock time.
pub fn normalize_time(raw: &str) -> String {
    let cleaned = clean_capture(raw);
    let mut compact: String = cleaned
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '.')
        .collect::<String>()
        .to_uppercase();

    if !compact.contains(':') && (compact.ends_with("AM") || compact.ends_with("PM")) {
        let split = compact.len() - 2;
        compact.insert_str(split, ":00");
    }

    ["%I:%M%p", "%H:%M"]
        .iter()
        .find_map(|fmt| NaiveTime::parse_from_str(&compact, fmt).ok())
        .map(|time| time.format("%I:%M %p").to_string())
        .unwrap_or(cleaned)
}

// ═══════════════════════════════════════════════════════════
// Lists
// ═══════════════════════════════════════════════════════════

/// NKDA wins over any other capture, whether it is in the capture or in the
/// clause that mentions allergies.
pub fn normalize_allergies(raw: &str, full_text: &str) -> FieldValue {
    let cleaned = clean_capture(raw);
    let lower = cleaned.to_lowercase();

    if matches!(lower.as_str(), "no" | "nope" | "none")
        || lower.contains("no known")
        || NKDA_CLAUSE.is_match(&cleaned)
        || NKDA_CLAUSE.is_match(full_text)
    {
        return FieldValue::Text(NKDA.to_string());
    }

    let items = split_list_items(&cleaned);
    FieldValue::Text(sentence_case(&items.join(FieldId::Allergies.joiner())))
}

pub fn normalize_medications(raw: &str) -> Vec<String> {
    let cleaned = clean_capture(raw);
    let lower = cleaned.to_lowercase();
    if matches!(lower.as_str(), "no" | "none" | "nothing" | "nil")
        || ["no ", "not ", "none ", "nothing "].iter().any(|p| lower.starts_with(p))
    {
        return vec![NO_CURRENT_MEDICATIONS.to_string()];
    }
    split_list_items(&cleaned)
        .iter()
        .map(|item| sentence_case(strip_possessive(item)))
        .collect()
}

fn strip_possessive(item: &str) -> &str {
    for word in ["my ", "his ", "her ", "their ", "your "] {
        if item.len() > word.len()
            && item.is_char_boundary(word.len())
            && item[..word.len()].eq_ignore_ascii_case(word)
        {
            return item[word.len()..].trim_start();
        }
    }
    item
}

/// Negative history statements are kept whole; anything else is split.
fn normalize_history(raw: &str) -> Vec<String> {
    let cleaned = clean_capture(raw);
    if cleaned.to_lowercase().starts_with("no ") {
        return vec![sentence_case(&cleaned)];
    }
    split_list_items(&cleaned).iter().map(|item| sentence_case(item)).collect()
}
