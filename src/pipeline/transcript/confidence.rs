use serde::{Deserialize, Serialize};

use super::types::{FieldId, StructuredClinicalNote};

/// Completeness bands for the overall extraction score.
pub mod confidence_thresholds {
    /// Below this: most of the note needs manual entry
    pub const LOW: u8 = 40;

    /// Below this: several key fields are missing
    pub const MODERATE: u8 = 70;

    /// At or above this: the key fields are all populated
    pub const HIGH: u8 = 90;
}

/// Fields the overall score is computed over.
/// Deliberately a subset of the note, not every field.
pub const CANONICAL_FIELDS: [FieldId; 10] = [
    FieldId::PatientName,
    FieldId::Age,
    FieldId::Gender,
    FieldId::Temperature,
    FieldId::Pulse,
    FieldId::BloodPressure,
    FieldId::ChiefComplaint,
    FieldId::HistoryOfPresentIllness,
    FieldId::Assessment,
    FieldId::Plan,
];

/// Percentage (0–100, rounded) of canonical fields that hold something other
/// than their sentinel.
pub fn calculate_overall_confidence(note: &StructuredClinicalNote) -> u8 {
    let extracted = CANONICAL_FIELDS
        .iter()
        .filter(|field| !note.is_sentinel(**field))
        .count();

    let ratio = extracted as f64 / CANONICAL_FIELDS.len() as f64;
    (ratio * 100.0).round().clamp(0.0, 100.0) as u8
}

/// Coarse completeness band for a confidence score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfidenceBand {
    VeryLow,
    Low,
    Moderate,
    High,
}

pub fn confidence_band(confidence: u8) -> ConfidenceBand {
    if confidence < confidence_thresholds::LOW {
        ConfidenceBand::VeryLow
    } else if confidence < confidence_thresholds::MODERATE {
        ConfidenceBand::Low
    } else if confidence < confidence_thresholds::HIGH {
        ConfidenceBand::Moderate
    } else {
        ConfidenceBand::High
    }
}

/// True when the score falls below the moderate band.
pub fn needs_review(confidence: u8) -> bool {
    matches!(
        confidence_band(confidence),
        ConfidenceBand::VeryLow | ConfidenceBand::Low
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn populated_note() -> StructuredClinicalNote {
        let mut note = StructuredClinicalNote::default();
        note.patient_info.name = "Sarah Johnson".into();
        note.patient_info.age = "45".into();
        note.patient_info.gender = "Female".into();
        note.vital_signs.temperature = "100.4°F".into();
        note.vital_signs.pulse = "88 bpm".into();
        note.vital_signs.blood_pressure = "130/85 mmHg".into();
        note.chief_complaint = "Sore throat".into();
        note.history_of_present_illness = "Started three days ago".into();
        note.assessment = "Strep throat".into();
        note.plan = "Prescribe azithromycin".into();
        note
    }

    #[test]
    fn all_sentinels_scores_zero() {
        assert_eq!(calculate_overall_confidence(&StructuredClinicalNote::default()), 0);
    }

    #[test]
    fn all_canonical_fields_scores_hundred() {
        assert_eq!(calculate_overall_confidence(&populated_note()), 100);
    }

    #[test]
    fn non_canonical_fields_do_not_count() {
        let mut note = StructuredClinicalNote::default();
        note.allergies = "Penicillin".into();
        note.vital_signs.glucose = "95 mg/dL".into();
        note.provider_info.doctor_name = "Dr. Patel".into();
        assert_eq!(calculate_overall_confidence(&note), 0);
    }

    #[test]
    fn partial_note_rounds_to_nearest() {
        let mut note = populated_note();
        note.plan = FieldId::Plan.sentinel().into();
        note.assessment = FieldId::Assessment.sentinel().into();
        note.vital_signs.pulse = FieldId::Pulse.sentinel().into();
        assert_eq!(calculate_overall_confidence(&note), 70);
    }

    #[test]
    fn score_grows_by_ten_per_field() {
        let full = populated_note();
        let mut note = StructuredClinicalNote::default();
        let setters: [fn(&mut StructuredClinicalNote, &StructuredClinicalNote); 10] = [
            |n, f| n.patient_info.name = f.patient_info.name.clone(),
            |n, f| n.patient_info.age = f.patient_info.age.clone(),
            |n, f| n.patient_info.gender = f.patient_info.gender.clone(),
            |n, f| n.vital_signs.temperature = f.vital_signs.temperature.clone(),
            |n, f| n.vital_signs.pulse = f.vital_signs.pulse.clone(),
            |n, f| n.vital_signs.blood_pressure = f.vital_signs.blood_pressure.clone(),
            |n, f| n.chief_complaint = f.chief_complaint.clone(),
            |n, f| n.history_of_present_illness = f.history_of_present_illness.clone(),
            |n, f| n.assessment = f.assessment.clone(),
            |n, f| n.plan = f.plan.clone(),
        ];
        for (i, set) in setters.iter().enumerate() {
            set(&mut note, &full);
            assert_eq!(calculate_overall_confidence(&note) as usize, (i + 1) * 10);
        }
    }

    #[test]
    fn thresholds_are_ordered() {
        assert!(confidence_thresholds::LOW < confidence_thresholds::MODERATE);
        assert!(confidence_thresholds::MODERATE < confidence_thresholds::HIGH);
    }

    #[test]
    fn bands_follow_thresholds() {
        assert_eq!(confidence_band(0), ConfidenceBand::VeryLow);
        assert_eq!(confidence_band(confidence_thresholds::LOW - 1), ConfidenceBand::VeryLow);
        assert_eq!(confidence_band(confidence_thresholds::LOW), ConfidenceBand::Low);
        assert_eq!(confidence_band(confidence_thresholds::MODERATE), ConfidenceBand::Moderate);
        assert_eq!(confidence_band(confidence_thresholds::HIGH - 1), ConfidenceBand::Moderate);
        assert_eq!(confidence_band(confidence_thresholds::HIGH), ConfidenceBand::High);
        assert_eq!(confidence_band(100), ConfidenceBand::High);
    }

    #[test]
    fn review_threshold() {
        assert!(needs_review(0));
        assert!(needs_review(confidence_thresholds::MODERATE - 1));
        assert!(!needs_review(100));
    }
}
