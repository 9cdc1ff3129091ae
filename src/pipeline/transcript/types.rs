use std::fmt;

use serde::{Deserialize, Serialize};

use super::TranscriptError;

// ═══════════════════════════════════════════════════════════
// Sentinels
// ═══════════════════════════════════════════════════════════

pub const NOT_EXTRACTED: &str = "Not extracted";
pub const NOT_MENTIONED: &str = "Not mentioned";
pub const TO_BE_EXTRACTED: &str = "[To be extracted from transcript]";
pub const TO_BE_DETERMINED: &str = "To be determined";
pub const NO_PHYSICAL_EXAM: &str = "No physical examination was performed during this consultation.";
pub const ASSESSMENT_PENDING: &str = "[To be determined based on transcript analysis]";

/// Fixed allergy literal; wins over any other allergy capture.
pub const NKDA: &str = "No known drug allergies (NKDA)";
pub const NO_CURRENT_MEDICATIONS: &str = "No current medications";

// ═══════════════════════════════════════════════════════════
// Fields
// ═══════════════════════════════════════════════════════════

/// One named unit of clinical information the engine tries to extract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FieldId {
    #[serde(rename = "name")]
    PatientName,
    Age,
    Gender,
    Temperature,
    Pulse,
    BloodPressure,
    RespiratoryRate,
    Glucose,
    ChiefComplaint,
    HistoryOfPresentIllness,
    PastMedicalHistory,
    Medications,
    Allergies,
    ReviewOfSystems,
    PhysicalExamination,
    Investigations,
    Assessment,
    Plan,
    DoctorName,
    #[serde(rename = "date")]
    ConsultationDate,
    #[serde(rename = "time")]
    ConsultationTime,
}

/// How many captures a field keeps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cardinality {
    /// First capture of the first matching rule.
    Single,
    /// First capture of the first matching rule, split into list items.
    List,
    /// Every capture of every rule, in rule order, de-duplicated.
    Collect,
}

impl FieldId {
    /// Extraction order used by the orchestrator.
    pub const ALL: [FieldId; 21] = [
        FieldId::PatientName,
        FieldId::Age,
        FieldId::Gender,
        FieldId::Temperature,
        FieldId::Pulse,
        FieldId::BloodPressure,
        FieldId::RespiratoryRate,
        FieldId::Glucose,
        FieldId::ChiefComplaint,
        FieldId::HistoryOfPresentIllness,
        FieldId::PastMedicalHistory,
        FieldId::Medications,
        FieldId::Allergies,
        FieldId::ReviewOfSystems,
        FieldId::PhysicalExamination,
        FieldId::Investigations,
        FieldId::Assessment,
        FieldId::Plan,
        FieldId::DoctorName,
        FieldId::ConsultationDate,
        FieldId::ConsultationTime,
    ];

    pub const VITALS: [FieldId; 5] = [
        FieldId::Temperature,
        FieldId::Pulse,
        FieldId::BloodPressure,
        FieldId::RespiratoryRate,
        FieldId::Glucose,
    ];

    /// Output key, matching the serialized note.
    pub fn as_str(self) -> &'static str {
        match self {
            FieldId::PatientName => "name",
            FieldId::Age => "age",
            FieldId::Gender => "gender",
            FieldId::Temperature => "temperature",
            FieldId::Pulse => "pulse",
            FieldId::BloodPressure => "bloodPressure",
            FieldId::RespiratoryRate => "respiratoryRate",
            FieldId::Glucose => "glucose",
            FieldId::ChiefComplaint => "chiefComplaint",
            FieldId::HistoryOfPresentIllness => "historyOfPresentIllness",
            FieldId::PastMedicalHistory => "pastMedicalHistory",
            FieldId::Medications => "medications",
            FieldId::Allergies => "allergies",
            FieldId::ReviewOfSystems => "reviewOfSystems",
            FieldId::PhysicalExamination => "physicalExamination",
            FieldId::Investigations => "investigations",
            FieldId::Assessment => "assessment",
            FieldId::Plan => "plan",
            FieldId::DoctorName => "doctorName",
            FieldId::ConsultationDate => "date",
            FieldId::ConsultationTime => "time",
        }
    }

    /// Placeholder written into the note when nothing was extracted.
    pub fn sentinel(self) -> &'static str {
        match self {
            FieldId::PatientName | FieldId::Age | FieldId::Gender | FieldId::DoctorName => {
                NOT_EXTRACTED
            }
            FieldId::ChiefComplaint
            | FieldId::HistoryOfPresentIllness
            | FieldId::Medications => TO_BE_EXTRACTED,
            FieldId::PhysicalExamination => NO_PHYSICAL_EXAM,
            FieldId::Assessment => ASSESSMENT_PENDING,
            FieldId::Plan => TO_BE_DETERMINED,
            FieldId::Temperature
            | FieldId::Pulse
            | FieldId::BloodPressure
            | FieldId::RespiratoryRate
            | FieldId::Glucose
            | FieldId::PastMedicalHistory
            | FieldId::Allergies
            | FieldId::ReviewOfSystems
            | FieldId::Investigations
            | FieldId::ConsultationDate
            | FieldId::ConsultationTime => NOT_MENTIONED,
        }
    }

    pub fn cardinality(self) -> Cardinality {
        match self {
            FieldId::PastMedicalHistory | FieldId::Medications | FieldId::Allergies => {
                Cardinality::List
            }
            FieldId::PhysicalExamination
            | FieldId::Investigations
            | FieldId::Assessment
            | FieldId::Plan => Cardinality::Collect,
            _ => Cardinality::Single,
        }
    }

    /// Separator used to flatten multi-valued fields into the note string.
    pub fn joiner(self) -> &'static str {
        match self {
            FieldId::PhysicalExamination => ". ",
            FieldId::Allergies | FieldId::Medications => ", ",
            _ => "; ",
        }
    }

    pub fn is_vital(self) -> bool {
        Self::VITALS.contains(&self)
    }
}

impl fmt::Display for FieldId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ═══════════════════════════════════════════════════════════
// Extraction results
// ═══════════════════════════════════════════════════════════

/// Outcome of extracting one field. Never absent: a miss carries the sentinel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractedField {
    pub field: FieldId,
    pub raw_capture: String,
    pub normalized_value: String,
    pub found: bool,
    /// Individual items for list and collected fields.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub items: Vec<String>,
    /// Index of the winning rule in the field's rule list. `None` on a found
    /// field means the value came from parser options, not the transcript.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rule_index: Option<usize>,
}

impl ExtractedField {
    pub fn not_found(field: FieldId) -> Self {
        Self {
            field,
            raw_capture: String::new(),
            normalized_value: field.sentinel().to_string(),
            found: false,
            items: Vec::new(),
            rule_index: None,
        }
    }
}

/// Whether a vital sign resolved to a reading or to narration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum VitalKind {
    NumericWithUnit,
    Descriptive,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VitalSignValue {
    #[serde(flatten)]
    pub field: ExtractedField,
    pub kind: VitalKind,
}

// ═══════════════════════════════════════════════════════════
// Structured note
// ═══════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatientInfo {
    pub name: String,
    pub age: String,
    pub gender: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VitalSigns {
    pub temperature: String,
    pub pulse: String,
    pub blood_pressure: String,
    pub respiratory_rate: String,
    pub glucose: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderInfo {
    pub doctor_name: String,
    pub date: String,
    pub time: String,
}

/// Structured clinical note for one transcript. Every key is always present.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StructuredClinicalNote {
    pub patient_info: PatientInfo,
    pub vital_signs: VitalSigns,
    pub chief_complaint: String,
    pub history_of_present_illness: String,
    pub past_medical_history: String,
    pub medications: Vec<String>,
    pub allergies: String,
    pub review_of_systems: String,
    pub physical_examination: String,
    pub investigations: String,
    pub assessment: String,
    pub plan: String,
    pub provider_info: ProviderInfo,
}

impl Default for StructuredClinicalNote {
    fn default() -> Self {
        let s = |f: FieldId| f.sentinel().to_string();
        Self {
            patient_info: PatientInfo {
                name: s(FieldId::PatientName),
                age: s(FieldId::Age),
                gender: s(FieldId::Gender),
            },
            vital_signs: VitalSigns {
                temperature: s(FieldId::Temperature),
                pulse: s(FieldId::Pulse),
                blood_pressure: s(FieldId::BloodPressure),
                respiratory_rate: s(FieldId::RespiratoryRate),
                glucose: s(FieldId::Glucose),
            },
            chief_complaint: s(FieldId::ChiefComplaint),
            history_of_present_illness: s(FieldId::HistoryOfPresentIllness),
            past_medical_history: s(FieldId::PastMedicalHistory),
            medications: vec![s(FieldId::Medications)],
            allergies: s(FieldId::Allergies),
            review_of_systems: s(FieldId::ReviewOfSystems),
            physical_examination: s(FieldId::PhysicalExamination),
            investigations: s(FieldId::Investigations),
            assessment: s(FieldId::Assessment),
            plan: s(FieldId::Plan),
            provider_info: ProviderInfo {
                doctor_name: s(FieldId::DoctorName),
                date: s(FieldId::ConsultationDate),
                time: s(FieldId::ConsultationTime),
            },
        }
    }
}

impl StructuredClinicalNote {
    /// Flattened value of a field as it appears in the note.
    /// Medications are joined with `", "`.
    pub fn value(&self, field: FieldId) -> String {
        match field {
            FieldId::PatientName => self.patient_info.name.clone(),
            FieldId::Age => self.patient_info.age.clone(),
            FieldId::Gender => self.patient_info.gender.clone(),
            FieldId::Temperature => self.vital_signs.temperature.clone(),
            FieldId::Pulse => self.vital_signs.pulse.clone(),
            FieldId::BloodPressure => self.vital_signs.blood_pressure.clone(),
            FieldId::RespiratoryRate => self.vital_signs.respiratory_rate.clone(),
            FieldId::Glucose => self.vital_signs.glucose.clone(),
            FieldId::ChiefComplaint => self.chief_complaint.clone(),
            FieldId::HistoryOfPresentIllness => self.history_of_present_illness.clone(),
            FieldId::PastMedicalHistory => self.past_medical_history.clone(),
            FieldId::Medications => self.medications.join(FieldId::Medications.joiner()),
            FieldId::Allergies => self.allergies.clone(),
            FieldId::ReviewOfSystems => self.review_of_systems.clone(),
            FieldId::PhysicalExamination => self.physical_examination.clone(),
            FieldId::Investigations => self.investigations.clone(),
            FieldId::Assessment => self.assessment.clone(),
            FieldId::Plan => self.plan.clone(),
            FieldId::DoctorName => self.provider_info.doctor_name.clone(),
            FieldId::ConsultationDate => self.provider_info.date.clone(),
            FieldId::ConsultationTime => self.provider_info.time.clone(),
        }
    }

    /// True when the field still holds its sentinel.
    pub fn is_sentinel(&self, field: FieldId) -> bool {
        self.value(field) == field.sentinel()
    }

    pub fn to_json(&self) -> Result<String, TranscriptError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
