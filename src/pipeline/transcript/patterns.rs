//! Ordered, per-field extraction rules.
//!
//! Each field owns a list of rules tried in table order; the first rule that
//! yields a plausible capture wins. Within a field, labelled rules come first,
//! then narrative clauses, then descriptive fallbacks that keep qualitative
//! narration (equipment trouble, "breathing normally") when no reading exists.
//! `PatternLibrary::compile` rejects a table that breaks that ordering.
//!
//! Regexes are compiled once and shared read-only. Matching never mutates
//! them: every extraction call builds its own `captures_iter` cursor.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;

use super::types::FieldId;
use super::TranscriptError;

/// What kind of phrasing a rule recognises. Order matters for validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum RuleKind {
    /// `label: value` / `label is value`.
    DirectLabel,
    /// A clause describing the field without a label.
    Narrative,
    /// Qualitative narration used only when nothing better matched.
    DescriptiveFallback,
}

/// Text a rule is evaluated against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleScope {
    /// The whole normalized transcript.
    Text,
    /// Windows of up to N consecutive sentences, earliest window first.
    Sentences(usize),
}

/// Declarative form of a rule, as written in a table.
#[derive(Debug, Clone, Copy)]
pub struct RuleSpec {
    pub field: FieldId,
    pub kind: RuleKind,
    pub scope: RuleScope,
    pub pattern: &'static str,
    pub capture: usize,
}

/// A compiled rule.
#[derive(Debug, Clone)]
pub struct ExtractionRule {
    pub field: FieldId,
    pub kind: RuleKind,
    pub scope: RuleScope,
    pub pattern: Regex,
    pub capture: usize,
}

/// Compiled rule lists keyed by field.
#[derive(Debug, Clone, Default)]
pub struct PatternLibrary {
    rules: HashMap<FieldId, Vec<ExtractionRule>>,
}

impl PatternLibrary {
    /// Compile a rule table, preserving per-field order.
    pub fn compile(specs: &[RuleSpec]) -> Result<Self, TranscriptError> {
        let mut rules: HashMap<FieldId, Vec<ExtractionRule>> = HashMap::new();

        for spec in specs {
            let list = rules.entry(spec.field).or_default();
            let index = list.len();

            if let Some(prev) = list.last() {
                if prev.kind == RuleKind::DescriptiveFallback
                    && spec.kind != RuleKind::DescriptiveFallback
                {
                    return Err(TranscriptError::RuleOrder { field: spec.field });
                }
            }

            let pattern = Regex::new(spec.pattern).map_err(|source| {
                TranscriptError::PatternCompilation {
                    field: spec.field,
                    index,
                    source,
                }
            })?;

            if spec.capture >= pattern.captures_len() {
                return Err(TranscriptError::CaptureIndex {
                    field: spec.field,
                    index,
                    capture: spec.capture,
                });
            }

            list.push(ExtractionRule {
                field: spec.field,
                kind: spec.kind,
                scope: spec.scope,
                pattern,
                capture: spec.capture,
            });
        }

        tracing::debug!(
            fields = rules.len(),
            rules = specs.len(),
            "Compiled extraction pattern library"
        );

        Ok(Self { rules })
    }

    /// The shared built-in library.
    pub fn built_in() -> &'static PatternLibrary {
        &BUILT_IN
    }

    /// Rules for a field in priority order. Empty if the field has none.
    pub fn rules(&self, field: FieldId) -> &[ExtractionRule] {
        self.rules.get(&field).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn rule_count(&self) -> usize {
        self.rules.values().map(Vec::len).sum()
    }
}

static BUILT_IN: LazyLock<PatternLibrary> = LazyLock::new(|| {
    PatternLibrary::compile(BUILT_IN_RULES).expect("Invalid built-in extraction pattern table")
});

const fn label(field: FieldId, pattern: &'static str) -> RuleSpec {
    RuleSpec { field, kind: RuleKind::DirectLabel, scope: RuleScope::Text, pattern, capture: 1 }
}

const fn narrative(field: FieldId, pattern: &'static str) -> RuleSpec {
    RuleSpec { field, kind: RuleKind::Narrative, scope: RuleScope::Text, pattern, capture: 1 }
}

const fn fallback(field: FieldId, pattern: &'static str) -> RuleSpec {
    RuleSpec {
        field,
        kind: RuleKind::DescriptiveFallback,
        scope: RuleScope::Text,
        pattern,
        capture: 1,
    }
}

const fn fallback_within(field: FieldId, sentences: usize, pattern: &'static str) -> RuleSpec {
    RuleSpec {
        field,
        kind: RuleKind::DescriptiveFallback,
        scope: RuleScope::Sentences(sentences),
        pattern,
        capture: 1,
    }
}

use FieldId::*;

/// The built-in rule table.
pub static BUILT_IN_RULES: &[RuleSpec] = &[
    // ── Identity ────────────────────────────────────────────
    label(
        PatientName,
        r"(?i:patient(?:'s)?\s+name|name\s+of\s+(?:the\s+)?patient)\s*(?::|is)?\s*([A-Z][a-zA-Z'-]+(?:\s+[A-Z][a-zA-Z'-]+){0,2})",
    ),
    narrative(
        PatientName,
        r"(?i:my\s+name\s+is|my\s+name's|name\s+is|call\s+me)\s+(?:(?i:mr|mrs|ms|miss)\.?\s+)?([A-Z][a-zA-Z'-]+(?:\s+[A-Z][a-zA-Z'-]+){0,2})",
    ),
    narrative(
        PatientName,
        r"(?i:\bi\s+am|\bi'm|\bthis\s+is)\s+([A-Z][a-zA-Z'-]+\s+[A-Z][a-zA-Z'-]+)",
    ),
    narrative(
        PatientName,
        r"\b(?i:mr|mrs|ms|miss)\.?\s+([A-Z][a-zA-Z'-]+(?:\s+[A-Z][a-zA-Z'-]+)?)",
    ),
    label(Age, r"(?i)\bage\s*(?::|=|is)\s*(\d{1,3})\b"),
    narrative(Age, r"(?i)\b(\d{1,3})\s*-?\s*(?:years?|yrs?)\s*-?\s*old\b"),
    narrative(Age, r"(?i)\b(?:i\s+am|i'm|aged)\s+(\d{1,3})\b"),
    narrative(Age, r"(?i)\b(\d{1,3})\s*(?:y/o|yo\b|y\.o\.)"),
    label(
        Gender,
        r"(?i)\b(?:gender|sex)\s*(?::|is)?\s*(male|female|man|woman|m|f)\b",
    ),
    narrative(
        Gender,
        r"(?i)\b\d{1,3}\s*-?\s*(?:years?|yrs?)\s*-?\s*old\s+(male|female|man|woman|boy|girl|gentleman|lady)\b",
    ),
    narrative(
        Gender,
        r"(?i)\b(?:i'm\s+a|i\s+am\s+a)\s+(man|woman|boy|girl|gentleman|lady|male|female)\b",
    ),
    narrative(Gender, r"(?i)\b(male|female|gentleman|lady)\b"),
    // ── Vital signs ─────────────────────────────────────────
    label(
        Temperature,
        r"(?i)\btemp(?:erature)?\s*(?:is|was|of|at|:|=|reads|reading(?:\s+is)?)?\s*(?:about|around|approximately)?\s*(\d{2,3}(?:\.\d+)?)",
    ),
    narrative(
        Temperature,
        r"(?i)\b(?:febrile|fever)\s+(?:at|of|to|is|was)?\s*(\d{2,3}(?:\.\d+)?)",
    ),
    narrative(
        Temperature,
        r"(?i)\b(\d{2,3}(?:\.\d+)?)\s*(?:°\s*[fc]\b|degrees?\s+(?:f\b|fahrenheit|c\b|celsius|centigrade))",
    ),
    fallback(
        Temperature,
        r"(?i)\b(?:temp(?:erature)?|fever)\b[^.!?]*?\b(normal|afebrile|no\s+fever)\b",
    ),
    fallback(Temperature, r"(?i)\b(afebrile)\b"),
    fallback(
        Temperature,
        r"(?i)\btemp(?:erature)?\s+(?:is|was|seems|feels|looks)\s+([^.!?,;]{3,60})",
    ),
    label(
        Pulse,
        r"(?i)\b(?:pulse(?:\s+rate)?|heart\s+rate|hr)\b\s*(?:is|was|of|at|:|=|reads)?\s*(?:about|around|approximately)?\s*(\d{2,3})\b",
    ),
    narrative(
        Pulse,
        r"(?i)\b(\d{2,3})\s*(?:bpm|beats\s+(?:per|a|/)\s*min(?:ute)?)\b",
    ),
    fallback(
        Pulse,
        r"(?i)([^.!?]*\b(?:pulse|heart\s+rate)\b[^.!?]*\b(?:clear\s+reading|malfunction\w*|try\s+again)\b[^.!?]*)",
    ),
    fallback_within(
        Pulse,
        3,
        r"(?i)\b(?:pulse|heart\s+rate)\b.*?([^.!?]*\b(?:clear\s+reading|malfunction\w*|try\s+again)\b[^.!?]*)",
    ),
    fallback(
        Pulse,
        r"(?i)\b(?:pulse|heart\s+rate)\s+(?:is|was|seems|feels)\s+([^.!?,;]{3,60})",
    ),
    label(
        BloodPressure,
        r"(?i)\b(?:blood\s+pressure|bp)\b\s*(?:is|was|of|at|:|=|reads|reading(?:\s+is)?)?\s*(?:about|around|approximately)?\s*(\d{2,3}\s*(?:/|over)\s*\d{2,3})\b",
    ),
    narrative(BloodPressure, r"(?i)\b(\d{2,3}\s*/\s*\d{2,3})\s*mm\s*hg\b"),
    narrative(BloodPressure, r"(?i)\b(\d{2,3}\s+over\s+\d{2,3})\b"),
    fallback(
        BloodPressure,
        r"(?i)([^.!?]*\b(?:blood\s+pressure|bp|cuff)\b[^.!?]*\b(?:clear\s+reading|malfunction\w*|try\s+again)\b[^.!?]*)",
    ),
    fallback_within(
        BloodPressure,
        3,
        r"(?i)\b(?:blood\s+pressure|bp|cuff)\b.*?([^.!?]*\b(?:clear\s+reading|malfunction\w*|try\s+again)\b[^.!?]*)",
    ),
    fallback(
        BloodPressure,
        r"(?i)\b(?:blood\s+pressure|bp)\s+(?:is|was|seems|looks)\s+([^.!?,;]{3,60})",
    ),
    label(
        RespiratoryRate,
        r"(?i)\b(?:respiratory\s+rate|respiration\s+rate|respirations?|resp\s+rate|rr|breathing\s+rate)\b\s*(?:is|was|of|at|:|=)?\s*(?:about|around|approximately)?\s*(\d{1,2})\b",
    ),
    narrative(
        RespiratoryRate,
        r"(?i)\b(\d{1,2})\s*(?:breaths\s+(?:per|a|/)\s*min(?:ute)?|breaths/min)",
    ),
    fallback(
        RespiratoryRate,
        r"(?i)\b(?:respiratory\s+rate|breathing|respirations?)\b([^.!?]*\b(?:normal(?:ly)?|count(?:ed)?|exact(?:ly)?)\b[^.!?]*)",
    ),
    fallback(
        RespiratoryRate,
        r"(?i)\brespiratory\s+rate\s+(?:is|was|seems)\s+([^.!?,;]{3,60})",
    ),
    label(
        Glucose,
        r"(?i)\b(?:blood\s+(?:glucose|sugar)|glucose|sugar|bg|bgl)(?:\s+level)?\b\s*(?:is|was|of|at|:|=|reads|reading(?:\s+is)?)?\s*(?:about|around|approximately)?\s*(\d{2,3}(?:\.\d+)?)\b",
    ),
    narrative(
        Glucose,
        r"(?i)\b(?:glucose|sugar)\b[^.!?]*?\b(\d{2,3}(?:\.\d+)?)\s*mg\s*/\s*dl\b",
    ),
    fallback(
        Glucose,
        r"(?i)([^.!?]*\b(?:glucose|blood\s+sugar|sugar\s+level)\b[^.!?]*\b(?:check|checked|checking|needed|later)\b[^.!?]*)",
    ),
    fallback(
        Glucose,
        r"(?i)([^.!?]*\b(?:check|checked|checking|needed|later)\b[^.!?]*\b(?:glucose|blood\s+sugar|sugar\s+level)\b[^.!?]*)",
    ),
    // ── Narrative sections ──────────────────────────────────
    label(
        ChiefComplaint,
        r"(?i)\b(?:chief\s+complaint|cc|reason\s+for\s+(?:the\s+)?visit)\s*(?::|is|was)\s*([^.!?]{3,150})",
    ),
    narrative(
        ChiefComplaint,
        r"(?i)\b(?:presents?|presenting|came\s+in|coming\s+in|here\s+today)\s+(?:today\s+)?(?:with|for|because\s+of)\s+([^.!?]{3,150})",
    ),
    narrative(
        ChiefComplaint,
        r"(?i)\b(?:i've\s+been\s+having|i\s+have\s+been\s+having|i've\s+been\s+experiencing|i\s+have\s+been\s+experiencing|i've\s+been\s+feeling|i'm\s+having|i\s+am\s+having|i've\s+had|i\s+have\s+had|complaining\s+of|complains\s+of|suffering\s+from)\s+([^.!?]{3,150})",
    ),
    narrative(
        ChiefComplaint,
        r"(?i)\bwhat\s+brings\s+you\s+in[^.!?]*[.!?]\s*([^.!?]{3,150})",
    ),
    narrative(
        ChiefComplaint,
        r"(?i)\b(?:i\s+have|i've\s+got|i\s+got)\s+(?:a|an|some|this)\s+([^.!?]{3,150})",
    ),
    label(
        HistoryOfPresentIllness,
        r"(?i)\b(?:history\s+of\s+(?:the\s+)?present\s+illness|hpi)\s*:\s*([^.!?]{3,300})",
    ),
    narrative(
        HistoryOfPresentIllness,
        r"(?i)\b((?:it|this|these|they|the\s+\w+|symptoms?|pain)\s+(?:all\s+)?(?:started|began|begun|came\s+on)\b[^.!?]{0,200})",
    ),
    narrative(
        HistoryOfPresentIllness,
        r"(?i)\b((?:for\s+the\s+(?:past|last)|over\s+the\s+(?:past|last)|since)\s+(?:\w+\s+){0,3}(?:days?|weeks?|months?|years?|morning|night|yesterday)\b[^.!?]{0,200})",
    ),
    narrative(
        HistoryOfPresentIllness,
        r"(?i)([^.!?]*\b(?:days?|weeks?|months?)\s+ago\b[^.!?]*)",
    ),
    label(
        PastMedicalHistory,
        r"(?i)\b(no\s+(?:significant\s+)?(?:past\s+)?medical\s+(?:history|problems|conditions))\b",
    ),
    label(
        PastMedicalHistory,
        r"(?i)\b(?:past\s+medical\s+history|medical\s+history|pmh)\s*(?::|is|includes?|of|significant\s+for)\s*([^.!?]{3,200})",
    ),
    narrative(
        PastMedicalHistory,
        r"(?i)\b(?:history\s+of|diagnosed\s+with)\s+([^.!?]{3,200})",
    ),
    narrative(
        PastMedicalHistory,
        r"(?i)\b(?:i\s+have|i've\s+got|i\s+also\s+have)\s+((?:high\s+blood\s+pressure|hypertension|type\s+[12]\s+diabetes|diabetes|asthma|copd|heart\s+disease|high\s+cholesterol|arthritis|depression|anxiety|hypothyroidism|kidney\s+disease|migraines?)[^.!?]{0,150})",
    ),
    // ── Medications & allergies ─────────────────────────────
    label(
        Medications,
        r"(?i)\b(no\s+(?:current\s+)?medications?|not\s+(?:currently\s+)?(?:taking|on)\s+any\s+(?:medications?|medicines?|meds|drugs))\b",
    ),
    label(
        Medications,
        r"(?i)\b(?:current\s+)?medications?\s*(?::|include|includes|are|list)\s*([^.!?]{3,200})",
    ),
    narrative(
        Medications,
        r"(?i)\b(?:i(?:'m|\s+am)\s+(?:currently\s+|also\s+)?(?:taking|on)|i(?:'ve|\s+have)\s+been\s+taking|i\s+(?:usually\s+|also\s+)?take|currently\s+taking|patient\s+(?:is\s+)?taking)\s+([^.!?]{3,200})",
    ),
    narrative(
        Medications,
        r"(?i)\b([a-z][a-z-]{2,}\s+\d+(?:\.\d+)?\s*(?:mg|mcg|g|ml|units?|iu)\b)",
    ),
    label(
        Allergies,
        r"(?i)\b(nkda|no\s+known\s+(?:drug\s+)?allergies|no\s+allergies)\b",
    ),
    label(
        Allergies,
        r"(?i)\ballerg(?:y|ies)\s*(?::|to|include|includes|are)\s*([^.!?]{2,150})",
    ),
    narrative(
        Allergies,
        r"(?i)\b(?:i'm|i\s+am|patient\s+is|she\s+is|he\s+is)\s+allergic\s+to\s+([^.!?]{2,150})",
    ),
    narrative(Allergies, r"(?i)\ballergic\s+to\s+([^.!?]{2,150})"),
    narrative(
        Allergies,
        r"(?i)\ballergies\b[^.!?]*\?\s*(?:(?:patient|pt)\s*:\s*)?(no|nope|none)\b",
    ),
    // ── Review of systems & examination ────────────────────
    label(
        ReviewOfSystems,
        r"(?i)\b(?:review\s+of\s+systems\s*(?::|is|was|shows|reveals|positive\s+for|negative\s+for)?|ros\s*:)\s*([^.!?]{3,250})",
    ),
    narrative(
        ReviewOfSystems,
        r"(?i)\b((?:no|denies|denied|negative\s+for)\s+(?:any\s+)?(?:fevers?|chills|nausea|vomiting|chest\s+pain|shortness\s+of\s+breath|cough(?:ing)?|headaches?|dizziness|weight\s+loss|diarrh(?:o)?ea|constipation|palpitations|abdominal\s+pain|night\s+sweats|rash(?:es)?)\b[^.!?]*)",
    ),
    label(
        PhysicalExamination,
        r"(?i)\b(?:physical\s+exam(?:ination)?|on\s+exam(?:ination)?|exam(?:ination)?\s+findings?)\s*(?::|,|shows|showed|reveals|revealed)\s*([^.!?]{3,250})",
    ),
    narrative(
        PhysicalExamination,
        r"(?i)\b((?:your|the|her|his)\s+(?:lungs?|heart|abdomen|belly|throat|ears?|eyes|chest|skin|lymph\s+nodes|neck|reflexes)\s+(?:sound|sounds|is|are|look|looks|appears?|seems?|feels?)\s+[^.!?]{2,150})",
    ),
    label(
        Investigations,
        r"(?i)\b(?:investigations?|tests?\s+ordered|labs?\s+ordered|workup)\s*:\s*([^.!?]{3,200})",
    ),
    narrative(
        Investigations,
        r"(?i)\b(?:order(?:ing)?|get|getting|run|running|do|doing|check|send\s+(?:you\s+)?for|schedule)\s+(?:you\s+)?(?:for\s+)?(?:a\s+|an\s+|some\s+)?((?:complete\s+)?(?:blood\s+(?:work|tests?|count)|cbc|x-?rays?|chest\s+x-?ray|ct\s+scan|cat\s+scan|mri|ultrasound|ecg|ekg|electrocardiogram|urinalysis|urine\s+(?:test|sample)|lipid\s+panel|metabolic\s+panel|thyroid\s+(?:panel|function\s+tests?)|hba1c|a1c|strep\s+test|covid\s+test)\b[^.!?,;]*)",
    ),
    narrative(
        Investigations,
        r"(?i)\b((?:blood\s+tests?|x-?rays?|mri|ct\s+scan|ultrasound|ecg|ekg)\s+(?:showed|shows|came\s+back|results?)\b[^.!?]*)",
    ),
    // ── Assessment & plan ──────────────────────────────────
    label(
        Assessment,
        r"(?i)\b(?:assessment|impression|diagnosis|dx)\s*(?::|is|was)\s*([^.!?]{3,200})",
    ),
    narrative(
        Assessment,
        r"(?i)\b(?:i\s+think|i\s+believe|i\s+suspect|it\s+(?:looks|sounds|seems)\s+like|this\s+(?:looks|sounds|seems)\s+like|most\s+likely|consistent\s+with|suggestive\s+of)\s+(?:you\s+(?:have|might\s+have|may\s+have)\s+|it's\s+|it\s+is\s+|this\s+is\s+|you're\s+dealing\s+with\s+)?([^.!?]{3,150})",
    ),
    label(
        Plan,
        r"(?i)\b(?:plan|treatment\s+plan)\s*(?::|is|will\s+be)\s*([^.!?]{3,200})",
    ),
    narrative(
        Plan,
        r"(?i)\b(?:i'm\s+going\s+to|i\s+am\s+going\s+to|i'll|i\s+will|we'll|we\s+will|let's|i'd\s+like\s+to|i\s+want\s+to)\s+((?:prescribe|start|give|refer|schedule|increase|decrease|continue|recommend|have\s+you|put\s+you\s+on|send\s+you)\b[^.!?]{2,200})",
    ),
    narrative(
        Plan,
        r"(?i)\b((?:follow\s+up|come\s+back|return|see\s+you\s+(?:again|back))\s+(?:in|after|if|within|next)\b[^.!?]{2,150})",
    ),
    narrative(
        Plan,
        r"(?i)\b(?:you\s+should|make\s+sure\s+(?:you|to)|be\s+sure\s+to|try\s+to)\s+([^.!?]{3,150})",
    ),
    // ── Provider ────────────────────────────────────────────
    label(
        DoctorName,
        r"(?i:doctor(?:'s)?\s+name|provider|physician|attending)\s*(?::|is)\s*((?:Dr\.?\s+)?[A-Z][a-zA-Z'-]+(?:\s+[A-Z][a-zA-Z'-]+)?)",
    ),
    narrative(
        DoctorName,
        r"\b(?:Dr\.?|(?i:doctor))\s+([A-Z][a-zA-Z'-]+(?:\s+[A-Z][a-zA-Z'-]+)?)",
    ),
    label(
        ConsultationDate,
        r"(?i)\b(?:date(?:\s+of\s+(?:visit|consultation))?|today\s+is|today's\s+date\s+is)\s*(?::|is)?\s*([a-z]+\.?\s+\d{1,2}(?:st|nd|rd|th)?,?\s+\d{4}|\d{1,2}[/-]\d{1,2}[/-]\d{2,4}|\d{4}-\d{2}-\d{2})",
    ),
    narrative(ConsultationDate, r"\b(\d{4}-\d{2}-\d{2})\b"),
    narrative(ConsultationDate, r"\b(\d{1,2}/\d{1,2}/\d{2,4})\b"),
    narrative(
        ConsultationDate,
        r"(?i)\b((?:jan|feb|mar|apr|may|jun|jul|aug|sep|sept|oct|nov|dec)[a-z]*\.?\s+\d{1,2}(?:st|nd|rd|th)?,?\s+\d{4})\b",
    ),
    label(
        ConsultationTime,
        r"(?i)\btime\s*(?::|is)\s*(\d{1,2}:\d{2}\s*(?:[ap]m\b|[ap]\.m\.)?)",
    ),
    narrative(
        ConsultationTime,
        r"(?i)\b(?:appointment|visit|consultation|seen|it's\s+now|it\s+is\s+now)\b[^.!?\d]{0,30}(\d{1,2}:\d{2}\s*(?:[ap]m\b|[ap]\.m\.)?|\d{1,2}\s*(?:[ap]m\b|[ap]\.m\.))",
    ),
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn built_in_table_compiles() {
        let library = PatternLibrary::compile(BUILT_IN_RULES).unwrap();
        assert_eq!(library.rule_count(), BUILT_IN_RULES.len());
    }

    #[test]
    fn every_field_has_rules() {
        let library = PatternLibrary::built_in();
        for field in FieldId::ALL {
            assert!(!library.rules(field).is_empty(), "no rules for {field}");
        }
    }

    #[test]
    fn fallbacks_follow_labelled_rules() {
        let library = PatternLibrary::built_in();
        for field in FieldId::ALL {
            let kinds: Vec<RuleKind> = library.rules(field).iter().map(|r| r.kind).collect();
            let first_fallback = kinds.iter().position(|k| *k == RuleKind::DescriptiveFallback);
            if let Some(pos) = first_fallback {
                assert!(
                    kinds[pos..].iter().all(|k| *k == RuleKind::DescriptiveFallback),
                    "{field} has a labelled rule after a fallback"
                );
            }
        }
    }

    #[test]
    fn rule_order_violation_rejected() {
        let specs = [
            fallback(FieldId::Pulse, r"(?i)pulse\s+(\w+)"),
            label(FieldId::Pulse, r"(?i)pulse\s+(\d+)"),
        ];
        let err = PatternLibrary::compile(&specs).unwrap_err();
        assert!(matches!(err, TranscriptError::RuleOrder { field: FieldId::Pulse }));
    }

    #[test]
    fn bad_regex_reports_field_and_index() {
        let specs = [label(FieldId::Age, r"(\d+)"), label(FieldId::Age, r"(unclosed")];
        let err = PatternLibrary::compile(&specs).unwrap_err();
        match err {
            TranscriptError::PatternCompilation { field, index, .. } => {
                assert_eq!(field, FieldId::Age);
                assert_eq!(index, 1);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn capture_index_out_of_range_rejected() {
        let spec = RuleSpec { capture: 2, ..label(FieldId::Age, r"age (\d+)") };
        let err = PatternLibrary::compile(&[spec]).unwrap_err();
        assert!(matches!(err, TranscriptError::CaptureIndex { capture: 2, .. }));
    }

    #[test]
    fn rule_order_preserved_per_field() {
        let library = PatternLibrary::built_in();
        let temp = library.rules(FieldId::Temperature);
        assert_eq!(temp[0].kind, RuleKind::DirectLabel);
        assert_eq!(temp.last().map(|r| r.kind), Some(RuleKind::DescriptiveFallback));
    }

    #[test]
    fn unknown_field_in_custom_library_has_no_rules() {
        let library = PatternLibrary::compile(&[label(FieldId::Age, r"age (\d+)")]).unwrap();
        assert!(library.rules(FieldId::Pulse).is_empty());
    }
}
