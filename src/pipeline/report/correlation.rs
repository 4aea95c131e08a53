//! Cross-modality notes for the holistic assessment section.
//!
//! Rules are additive: every rule that fires contributes a note. When none
//! fires, a single neutral note depends on how many modalities were screened.

use crate::models::{Finding, ImageType, RiskLevel};
use crate::pipeline::classify::{chest, skin};

const MULTI_SYSTEM_NOTE: &str =
    "Multi-system screening completed. No concerning cross-modality patterns identified at this time.";
const SINGLE_MODALITY_NOTE: &str =
    "Single modality screening. Consider additional modalities for comprehensive assessment.";
const CARDIOVASCULAR_NOTE: &str = "Concurrent cardiomegaly and diabetic retinopathy suggest significant cardiovascular risk. Comprehensive metabolic and cardiac workup recommended.";

fn is_elevated(risk: RiskLevel) -> bool {
    matches!(risk, RiskLevel::Moderate | RiskLevel::High)
}

pub fn cross_modality_notes(findings: &[Finding]) -> Vec<String> {
    let mut notes = Vec::new();

    let elevated_fundus: Vec<&Finding> = findings
        .iter()
        .filter(|f| f.image_type == ImageType::Fundus && is_elevated(f.risk_level()))
        .collect();

    for f in &elevated_fundus {
        notes.push(format!(
            "Retinopathy finding ({}) suggests possible inadequate glycemic control. Recommend HbA1c testing and endocrinology consultation.",
            f.classification()
        ));
    }

    for f in findings
        .iter()
        .filter(|f| f.image_type == ImageType::SkinLesion && skin::is_malignant(f.classification()))
    {
        notes.push(format!(
            "Suspicious skin lesion ({}) identified. If melanoma confirmed, staging workup including chest imaging recommended.",
            f.classification()
        ));
    }

    let has_cardiomegaly = findings
        .iter()
        .any(|f| f.image_type == ImageType::ChestXray && f.classification() == chest::CARDIOMEGALY);
    if has_cardiomegaly && !elevated_fundus.is_empty() {
        notes.push(CARDIOVASCULAR_NOTE.to_string());
    }

    if notes.is_empty() {
        let modalities = findings
            .iter()
            .map(|f| f.image_type)
            .filter(|t| *t != ImageType::Unknown)
            .fold(Vec::new(), |mut seen, t| {
                if !seen.contains(&t) {
                    seen.push(t);
                }
                seen
            });
        let note = if modalities.len() > 1 {
            MULTI_SYSTEM_NOTE
        } else {
            SINGLE_MODALITY_NOTE
        };
        notes.push(note.to_string());
    }

    notes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ClassifierOutput, PendingFinding};
    use chrono::Utc;

    fn finding(image_type: ImageType, classification: &str, risk: RiskLevel) -> Finding {
        let mut result = ClassifierOutput::unidentified();
        result.classification = classification.to_string();
        result.risk_level = risk;
        PendingFinding::new(image_type, None, result).into_finding(0, Utc::now())
    }

    #[test]
    fn elevated_retinopathy_adds_glycemic_note() {
        let notes = cross_modality_notes(&[finding(ImageType::Fundus, "Moderate", RiskLevel::Moderate)]);
        assert_eq!(notes.len(), 1);
        assert!(notes[0].starts_with("Retinopathy finding (Moderate)"));
    }

    #[test]
    fn mild_retinopathy_adds_nothing() {
        let notes = cross_modality_notes(&[finding(ImageType::Fundus, "Mild", RiskLevel::Low)]);
        assert_eq!(notes, vec![SINGLE_MODALITY_NOTE.to_string()]);
    }

    #[test]
    fn malignant_skin_adds_staging_note() {
        let notes = cross_modality_notes(&[
            finding(ImageType::SkinLesion, "melanoma", RiskLevel::High),
            finding(ImageType::SkinLesion, "melanocytic nevi", RiskLevel::Low),
        ]);
        assert_eq!(notes.len(), 1);
        assert!(notes[0].contains("(melanoma)"));
    }

    #[test]
    fn rules_are_additive() {
        let notes = cross_modality_notes(&[
            finding(ImageType::ChestXray, "cardiomegaly", RiskLevel::Moderate),
            finding(ImageType::Fundus, "Severe", RiskLevel::High),
            finding(ImageType::SkinLesion, "basal cell carcinoma", RiskLevel::High),
        ]);
        assert_eq!(notes.len(), 3);
        assert_eq!(notes[2], CARDIOVASCULAR_NOTE);
    }

    #[test]
    fn cardiomegaly_without_retinopathy_is_neutral() {
        let notes = cross_modality_notes(&[
            finding(ImageType::ChestXray, "cardiomegaly", RiskLevel::Moderate),
            finding(ImageType::Fundus, "No_DR", RiskLevel::Low),
        ]);
        assert_eq!(notes, vec![MULTI_SYSTEM_NOTE.to_string()]);
    }

    #[test]
    fn repeated_modality_counts_once() {
        let notes = cross_modality_notes(&[
            finding(ImageType::ChestXray, "normal", RiskLevel::Low),
            finding(ImageType::ChestXray, "normal", RiskLevel::Low),
        ]);
        assert_eq!(notes, vec![SINGLE_MODALITY_NOTE.to_string()]);
    }
}
