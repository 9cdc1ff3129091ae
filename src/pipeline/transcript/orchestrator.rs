use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::confidence::{calculate_overall_confidence, confidence_band, needs_review, ConfidenceBand};
use super::extractor::{extract_vital_with, extract_with};
use super::patterns::PatternLibrary;
use super::sanitize::normalize_transcript;
use super::types::{
    ExtractedField, FieldId, PatientInfo, ProviderInfo, StructuredClinicalNote, VitalSignValue,
    VitalSigns,
};
use super::TranscriptError;

// ═══════════════════════════════════════════════════════════
// Options
// ═══════════════════════════════════════════════════════════

/// Caller-supplied defaults and limits.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ParserOptions {
    /// Fills the provider date and time when the transcript names neither.
    pub consultation_time: Option<NaiveDateTime>,
    /// Fills the doctor name when the transcript names none.
    pub default_doctor_name: Option<String>,
    /// Longer transcripts are truncated to this many characters.
    pub max_transcript_chars: Option<usize>,
}

impl ParserOptions {
    pub fn validate(&self) -> Result<(), TranscriptError> {
        if self.max_transcript_chars == Some(0) {
            return Err(TranscriptError::InvalidOption(
                "max_transcript_chars must be greater than zero".into(),
            ));
        }
        if self
            .default_doctor_name
            .as_deref()
            .is_some_and(|name| name.trim().is_empty())
        {
            return Err(TranscriptError::InvalidOption(
                "default_doctor_name must not be blank".into(),
            ));
        }
        Ok(())
    }
}

// ═══════════════════════════════════════════════════════════
// Report
// ═══════════════════════════════════════════════════════════

/// Note plus the per-field detail a review screen needs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractionReport {
    pub note: StructuredClinicalNote,
    /// Every non-vital field in extraction order.
    pub fields: Vec<ExtractedField>,
    pub vitals: Vec<VitalSignValue>,
    pub confidence: u8,
}

impl ExtractionReport {
    /// Fields still holding their sentinel ("needs manual entry").
    pub fn missing_fields(&self) -> Vec<FieldId> {
        FieldId::ALL
            .into_iter()
            .filter(|field| self.note.is_sentinel(*field))
            .collect()
    }

    pub fn needs_review(&self) -> bool {
        needs_review(self.confidence)
    }

    pub fn band(&self) -> ConfidenceBand {
        confidence_band(self.confidence)
    }

    /// Extraction detail for one field, vital or not.
    pub fn field(&self, field: FieldId) -> Option<&ExtractedField> {
        self.fields
            .iter()
            .chain(self.vitals.iter().map(|v| &v.field))
            .find(|f| f.field == field)
    }
}

// ═══════════════════════════════════════════════════════════
// Parser
// ═══════════════════════════════════════════════════════════

/// Orchestrates transcript extraction:
/// normalize → extract each field → normalize values → assemble note
pub struct TranscriptParser {
    library: &'static PatternLibrary,
    options: ParserOptions,
}

impl Default for TranscriptParser {
    fn default() -> Self {
        Self {
            library: PatternLibrary::built_in(),
            options: ParserOptions::default(),
        }
    }
}

impl TranscriptParser {
    pub fn new(options: ParserOptions) -> Result<Self, TranscriptError> {
        options.validate()?;
        Ok(Self {
            library: PatternLibrary::built_in(),
            options,
        })
    }

    /// Use a custom rule library instead of the built-in table.
    pub fn with_library(
        library: &'static PatternLibrary,
        options: ParserOptions,
    ) -> Result<Self, TranscriptError> {
        options.validate()?;
        Ok(Self { library, options })
    }

    pub fn options(&self) -> &ParserOptions {
        &self.options
    }

    /// Parse a transcript into a note. Total: any input yields a complete note.
    pub fn parse(&self, transcript: &str) -> StructuredClinicalNote {
        self.parse_with_report(transcript).note
    }

    /// Parse and keep per-field extraction detail and the confidence score.
    pub fn parse_with_report(&self, transcript: &str) -> ExtractionReport {
        let span = tracing::info_span!("parse_transcript", chars = transcript.chars().count());
        let _enter = span.enter();

        let text = normalize_transcript(self.truncate(transcript));

        let mut fields = Vec::with_capacity(FieldId::ALL.len() - FieldId::VITALS.len());
        let mut vitals = Vec::with_capacity(FieldId::VITALS.len());
        for field in FieldId::ALL {
            if field.is_vital() {
                vitals.push(extract_vital_with(self.library, field, &text));
            } else {
                fields.push(extract_with(self.library, field, &text));
            }
        }

        let found = fields.iter().filter(|f| f.found).count()
            + vitals.iter().filter(|v| v.field.found).count();
        let defaulted = self.apply_defaults(&mut fields);

        let note = assemble_note(&fields, &vitals);
        let confidence = calculate_overall_confidence(&note);

        tracing::info!(
            found,
            defaulted,
            attempted = FieldId::ALL.len(),
            confidence,
            "Transcript extraction complete"
        );

        ExtractionReport {
            note,
            fields,
            vitals,
            confidence,
        }
    }

    fn truncate<'a>(&self, transcript: &'a str) -> &'a str {
        let Some(max) = self.options.max_transcript_chars else {
            return transcript;
        };
        match transcript.char_indices().nth(max) {
            Some((cut, _)) => {
                tracing::warn!(
                    max_chars = max,
                    "Transcript exceeds maximum length, truncating"
                );
                &transcript[..cut]
            }
            None => transcript,
        }
    }

    /// Fill provider fields from options when the transcript left them empty.
    /// A defaulted field is `found` with no raw capture and no rule index.
    /// Returns how many fields were filled.
    fn apply_defaults(&self, fields: &mut [ExtractedField]) -> usize {
        let mut filled = 0;
        for extracted in fields.iter_mut().filter(|f| !f.found) {
            let default = match extracted.field {
                FieldId::DoctorName => self
                    .options
                    .default_doctor_name
                    .as_deref()
                    .map(|name| name.trim().to_string()),
                FieldId::ConsultationDate => self
                    .options
                    .consultation_time
                    .map(|t| t.format("%Y-%m-%d").to_string()),
                FieldId::ConsultationTime => self
                    .options
                    .consultation_time
                    .map(|t| t.format("%I:%M %p").to_string()),
                _ => None,
            };
            if let Some(value) = default {
                tracing::debug!(field = %extracted.field, "Applied default from parser options");
                extracted.normalized_value = value;
                extracted.found = true;
                extracted.raw_capture.clear();
                extracted.rule_index = None;
                filled += 1;
            }
        }
        filled
    }
}

/// Parse with the built-in library and default options.
pub fn parse_transcript(transcript: &str) -> StructuredClinicalNote {
    TranscriptParser::default().parse(transcript)
}

fn assemble_note(fields: &[ExtractedField], vitals: &[VitalSignValue]) -> StructuredClinicalNote {
    let value = |field: FieldId| -> String {
        fields
            .iter()
            .chain(vitals.iter().map(|v| &v.field))
            .find(|f| f.field == field)
            .map(|f| f.normalized_value.clone())
            .unwrap_or_else(|| field.sentinel().to_string())
    };

    let medications = fields
        .iter()
        .find(|f| f.field == FieldId::Medications && f.found)
        .map(|f| {
            if f.items.is_empty() {
                vec![f.normalized_value.clone()]
            } else {
                f.items.clone()
            }
        })
        .unwrap_or_else(|| vec![FieldId::Medications.sentinel().to_string()]);

    StructuredClinicalNote {
        patient_info: PatientInfo {
            name: value(FieldId::PatientName),
            age: value(FieldId::Age),
            gender: value(FieldId::Gender),
        },
        vital_signs: VitalSigns {
            temperature: value(FieldId::Temperature),
            pulse: value(FieldId::Pulse),
            blood_pressure: value(FieldId::BloodPressure),
            respiratory_rate: value(FieldId::RespiratoryRate),
            glucose: value(FieldId::Glucose),
        },
        chief_complaint: value(FieldId::ChiefComplaint),
        history_of_present_illness: value(FieldId::HistoryOfPresentIllness),
        past_medical_history: value(FieldId::PastMedicalHistory),
        medications,
        allergies: value(FieldId::Allergies),
        review_of_systems: value(FieldId::ReviewOfSystems),
        physical_examination: value(FieldId::PhysicalExamination),
        investigations: value(FieldId::Investigations),
        assessment: value(FieldId::Assessment),
        plan: value(FieldId::Plan),
        provider_info: ProviderInfo {
            doctor_name: value(FieldId::DoctorName),
            date: value(FieldId::ConsultationDate),
            time: value(FieldId::ConsultationTime),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::transcript::samples::{EQUIPMENT_MALFUNCTION, ROUTINE_VISIT};
    use crate::pipeline::transcript::types::{
        VitalKind, NKDA, NOT_EXTRACTED, NOT_MENTIONED, NO_CURRENT_MEDICATIONS, TO_BE_EXTRACTED,
    };
    use chrono::NaiveDate;

    fn consultation_time() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 15)
            .unwrap()
            .and_hms_opt(14, 30, 0)
            .unwrap()
    }

    // =================================================================
    // TOTALITY
    // =================================================================

    #[test]
    fn empty_transcript_yields_all_sentinels() {
        let note = parse_transcript("");
        assert_eq!(note, StructuredClinicalNote::default());
        assert_eq!(calculate_overall_confidence(&note), 0);
    }

    #[test]
    fn arbitrary_input_never_panics() {
        let inputs = [
            "   \n\t ",
            "The weather is lovely today.",
            "....!!!???",
            "Temperature is",
            "pulse 9999999999999999999999",
            "Dr. ",
            "αβγ 温度 🌡️ 98.6",
            "allergies? allergies? allergies?",
        ];
        for input in inputs {
            let note = parse_transcript(input);
            for field in FieldId::ALL {
                assert!(!note.value(field).is_empty(), "{field} empty for {input:?}");
            }
        }
    }

    // =================================================================
    // SCENARIOS
    // =================================================================

    #[test]
    fn numeric_vitals_scenario() {
        let note = parse_transcript(
            "Temperature is 98.6 degrees Fahrenheit, pulse rate 80 beats per minute, blood pressure 120/80 mmHg, respiratory rate 18 per minute, glucose 95 mg/dL",
        );
        assert_eq!(note.vital_signs.temperature, "98.6°F");
        assert_eq!(note.vital_signs.pulse, "80 bpm");
        assert_eq!(note.vital_signs.blood_pressure, "120/80 mmHg");
        assert_eq!(note.vital_signs.respiratory_rate, "18/min");
        assert_eq!(note.vital_signs.glucose, "95 mg/dL");
    }

    #[test]
    fn equipment_malfunction_scenario() {
        let report = TranscriptParser::default().parse_with_report(EQUIPMENT_MALFUNCTION);
        let note = &report.note;

        assert_eq!(note.patient_info.name, "James Bond");
        assert_eq!(note.patient_info.age, "33");
        assert_eq!(note.patient_info.gender, "Male");

        assert!(note.vital_signs.pulse.starts_with("Equipment issue - "));
        assert!(note.vital_signs.pulse.contains("clear reading"));
        assert_eq!(
            note.vital_signs.blood_pressure,
            "Equipment issue - the cuff seems to be malfunctioning, we'll need to get another one"
        );
        assert_eq!(note.vital_signs.temperature, "Normal (afebrile)");
        assert_eq!(note.vital_signs.respiratory_rate, "Breathing normally");
        assert_eq!(
            note.vital_signs.glucose,
            "To be checked - We'll check your blood sugar later"
        );
        assert!(report
            .vitals
            .iter()
            .all(|v| v.kind == VitalKind::Descriptive));

        assert_eq!(note.allergies, NKDA);
        assert_eq!(note.medications, vec!["Ibuprofen 400 mg as needed", "Multivitamin"]);
        assert_eq!(note.provider_info.doctor_name, "Dr. Smith");
        assert_eq!(report.confidence, 100);
    }

    #[test]
    fn routine_visit_scenario() {
        let note = parse_transcript(ROUTINE_VISIT);

        assert_eq!(note.patient_info.name, "Sarah Johnson");
        assert_eq!(note.patient_info.age, "45");
        assert_eq!(note.patient_info.gender, "Female");
        assert_eq!(note.vital_signs.temperature, "100.4°F");
        assert_eq!(note.vital_signs.pulse, "88 bpm");
        assert_eq!(note.vital_signs.blood_pressure, "130/85 mmHg");
        assert_eq!(note.vital_signs.respiratory_rate, "16/min");
        assert_eq!(note.vital_signs.glucose, "102 mg/dL");
        assert_eq!(note.chief_complaint, "A sore throat and a mild fever");
        assert!(note.history_of_present_illness.starts_with("It started three days ago"));
        assert_eq!(note.past_medical_history, "High blood pressure");
        assert_eq!(note.medications, vec!["Lisinopril 10 mg daily"]);
        assert_eq!(note.allergies, "Penicillin");
        assert_eq!(note.review_of_systems, "No cough, no shortness of breath");
        assert_eq!(note.physical_examination, "Your throat is red with swollen tonsils");
        assert_eq!(note.investigations, "Strep test");
        assert_eq!(note.assessment, "Strep throat");
        assert_eq!(
            note.plan,
            "Prescribe azithromycin for five days; Follow up in one week if you're not feeling better"
        );
        assert_eq!(note.provider_info.doctor_name, "Dr. Patel");
        assert_eq!(note.provider_info.date, "2024-03-15");
        assert_eq!(note.provider_info.time, NOT_MENTIONED);
        assert_eq!(calculate_overall_confidence(&note), 100);
    }

    #[test]
    fn gender_and_age_scenario() {
        let note = parse_transcript("I'm 33 years old... and yes, male.");
        assert_eq!(note.patient_info.age, "33");
        assert_eq!(note.patient_info.gender, "Male");
    }

    #[test]
    fn numeric_temperature_beats_descriptive_phrase() {
        let note = parse_transcript("You feel afebrile to me. Temperature is 98.6 on the thermometer.");
        assert_eq!(note.vital_signs.temperature, "98.6°F");
    }

    #[test]
    fn nkda_overrides_other_allergy_text() {
        let note = parse_transcript("Allergies: penicillin? Actually no, NKDA.");
        assert_eq!(note.allergies, NKDA);
    }

    #[test]
    fn negative_medication_statement() {
        let note = parse_transcript("Patient: I'm not taking any medications.");
        assert_eq!(note.medications, vec!["No current medications"]);
    }

    #[test]
    fn medications_label_none_is_negative() {
        let note = parse_transcript("Medications: none.");
        assert_eq!(note.medications, vec![NO_CURRENT_MEDICATIONS]);
    }

    #[test]
    fn cuff_failure_leaves_pulse_unmentioned() {
        let note = parse_transcript(
            "Let me feel your pulse. Now your blood pressure... the cuff seems to be malfunctioning.",
        );
        assert_eq!(note.vital_signs.pulse, NOT_MENTIONED);
        assert_eq!(
            note.vital_signs.blood_pressure,
            "Equipment issue - the cuff seems to be malfunctioning"
        );
    }

    #[test]
    fn childhood_age_and_dosing_time_ignored() {
        let note = parse_transcript(
            "I've had asthma since age 12. I'm 33 years old. I take my metformin at 8 am every day.",
        );
        assert_eq!(note.patient_info.age, "33");
        assert_eq!(note.provider_info.time, NOT_MENTIONED);
        assert_eq!(note.medications, vec!["Metformin at 8 am every day"]);
    }

    #[test]
    fn unmatched_medications_keep_placeholder_list() {
        let note = parse_transcript("Hello there.");
        assert_eq!(note.medications, vec![TO_BE_EXTRACTED]);
    }

    // =================================================================
    // OPTIONS & REPORT
    // =================================================================

    #[test]
    fn options_fill_missing_provider_info() {
        let parser = TranscriptParser::new(ParserOptions {
            consultation_time: Some(consultation_time()),
            default_doctor_name: Some("Dr. Rivera".into()),
            max_transcript_chars: None,
        })
        .unwrap();

        let note = parser.parse("Patient: My name is Ana Lopez.");
        assert_eq!(note.provider_info.doctor_name, "Dr. Rivera");
        assert_eq!(note.provider_info.date, "2024-03-15");
        assert_eq!(note.provider_info.time, "02:30 PM");
    }

    #[test]
    fn defaulted_fields_agree_between_report_and_note() {
        let parser = TranscriptParser::new(ParserOptions {
            consultation_time: Some(consultation_time()),
            default_doctor_name: Some("Dr. Rivera".into()),
            max_transcript_chars: None,
        })
        .unwrap();

        let report = parser.parse_with_report("Patient: My name is Ana Lopez.");
        for field in [FieldId::DoctorName, FieldId::ConsultationDate, FieldId::ConsultationTime] {
            let extracted = report.field(field).unwrap();
            assert!(extracted.found, "{field} should be marked found");
            assert!(extracted.raw_capture.is_empty());
            assert_eq!(extracted.rule_index, None);
            assert_eq!(extracted.normalized_value, report.note.value(field));
            assert!(!report.missing_fields().contains(&field));
        }
    }

    #[test]
    fn transcript_values_beat_option_defaults() {
        let parser = TranscriptParser::new(ParserOptions {
            default_doctor_name: Some("Dr. Rivera".into()),
            ..Default::default()
        })
        .unwrap();
        let note = parser.parse(EQUIPMENT_MALFUNCTION);
        assert_eq!(note.provider_info.doctor_name, "Dr. Smith");
    }

    #[test]
    fn zero_length_limit_rejected() {
        let result = TranscriptParser::new(ParserOptions {
            max_transcript_chars: Some(0),
            ..Default::default()
        });
        assert!(matches!(result, Err(TranscriptError::InvalidOption(_))));
    }

    #[test]
    fn blank_default_doctor_rejected() {
        let options = ParserOptions {
            default_doctor_name: Some("  ".into()),
            ..Default::default()
        };
        assert!(options.validate().is_err());
    }

    #[test]
    fn long_transcript_truncated() {
        let parser = TranscriptParser::new(ParserOptions {
            max_transcript_chars: Some(30),
            ..Default::default()
        })
        .unwrap();
        let note = parser.parse("My name is James Bond. Temperature is 98.6 degrees.");
        assert_eq!(note.patient_info.name, "James Bond");
        assert_eq!(note.vital_signs.temperature, NOT_MENTIONED);
    }

    #[test]
    fn truncation_respects_char_boundaries() {
        let parser = TranscriptParser::new(ParserOptions {
            max_transcript_chars: Some(3),
            ..Default::default()
        })
        .unwrap();
        let note = parser.parse("温度温度温度");
        assert_eq!(note.patient_info.name, NOT_EXTRACTED);
    }

    #[test]
    fn report_lists_missing_fields() {
        let report = TranscriptParser::default().parse_with_report("Pulse is 72.");
        let missing = report.missing_fields();
        assert!(!missing.contains(&FieldId::Pulse));
        assert!(missing.contains(&FieldId::PatientName));
        assert_eq!(missing.len(), FieldId::ALL.len() - 1);
        assert_eq!(report.confidence, 10);
        assert!(report.needs_review());
        assert_eq!(report.band(), ConfidenceBand::VeryLow);

        let pulse = report.field(FieldId::Pulse).unwrap();
        assert_eq!(pulse.raw_capture, "72");
        assert_eq!(pulse.rule_index, Some(0));
    }

    #[test]
    fn report_separates_vitals() {
        let report = TranscriptParser::default().parse_with_report(ROUTINE_VISIT);
        assert_eq!(report.vitals.len(), FieldId::VITALS.len());
        assert_eq!(report.fields.len(), FieldId::ALL.len() - FieldId::VITALS.len());
        assert!(report
            .vitals
            .iter()
            .all(|v| v.kind == VitalKind::NumericWithUnit));
        assert!(!report.needs_review());
        assert_eq!(report.band(), ConfidenceBand::High);
    }

    #[test]
    fn note_serializes_with_camel_case_keys() {
        let json = parse_transcript(ROUTINE_VISIT).to_json().unwrap();
        assert!(json.contains("\"chiefComplaint\": \"A sore throat and a mild fever\""));
        assert!(json.contains("\"bloodPressure\": \"130/85 mmHg\""));
    }

    #[test]
    fn options_deserialize_with_defaults() {
        let options: ParserOptions =
            serde_json::from_str(r#"{"maxTranscriptChars": 5000}"#).unwrap();
        assert_eq!(options.max_transcript_chars, Some(5000));
        assert_eq!(options.default_doctor_name, None);
    }

    #[test]
    fn options_serialize_camel_case() {
        let json = serde_json::to_string(&ParserOptions {
            default_doctor_name: Some("Dr. Rivera".into()),
            ..Default::default()
        })
        .unwrap();
        assert!(json.contains("\"defaultDoctorName\":\"Dr. Rivera\""));
        assert!(json.contains("\"consultationTime\":null"));
    }
}
