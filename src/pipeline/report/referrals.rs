use crate::models::{Finding, ImageType, RiskLevel};

const NO_REFERRALS: &str = "  No urgent referrals indicated. Routine follow-up recommended.";

fn urgent_specialty(image_type: ImageType) -> &'static str {
    match image_type {
        ImageType::SkinLesion => "Dermatology",
        ImageType::ChestXray => "Pulmonology/Radiology",
        ImageType::Fundus => "Ophthalmology",
        ImageType::Unknown => "Specialist",
    }
}

fn routine_specialty(image_type: ImageType) -> &'static str {
    match image_type {
        ImageType::SkinLesion => "Dermatology",
        ImageType::ChestXray => "Cardiology/Pulmonology",
        ImageType::Fundus => "Ophthalmology",
        ImageType::Unknown => "Specialist",
    }
}

/// Numbered referral lines: high-risk findings first, then moderate, each in session order.
pub fn referral_lines(findings: &[Finding]) -> Vec<String> {
    let urgent = findings
        .iter()
        .filter(|f| f.risk_level() == RiskLevel::High)
        .map(|f| {
            format!(
                "[URGENT] {}: {} — Immediate referral",
                urgent_specialty(f.image_type),
                f.classification()
            )
        });
    let routine = findings
        .iter()
        .filter(|f| f.risk_level() == RiskLevel::Moderate)
        .map(|f| {
            format!(
                "[ROUTINE] {}: {} — Follow-up within 2-4 weeks",
                routine_specialty(f.image_type),
                f.classification()
            )
        });

    urgent
        .chain(routine)
        .enumerate()
        .map(|(i, line)| format!("  {}. {line}", i + 1))
        .collect()
}

pub fn render_referrals(findings: &[Finding]) -> String {
    let lines = referral_lines(findings);
    if lines.is_empty() {
        NO_REFERRALS.to_string()
    } else {
        lines.join("\n")
    }
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
    fn high_before_moderate_low_omitted() {
        // A=high, B=low, C=moderate, D=high → [A, D, C]
        let findings = vec![
            finding(ImageType::SkinLesion, "A", RiskLevel::High),
            finding(ImageType::SkinLesion, "B", RiskLevel::Low),
            finding(ImageType::ChestXray, "C", RiskLevel::Moderate),
            finding(ImageType::Fundus, "D", RiskLevel::High),
        ];
        let lines = referral_lines(&findings);
        assert_eq!(
            lines,
            vec![
                "  1. [URGENT] Dermatology: A — Immediate referral",
                "  2. [URGENT] Ophthalmology: D — Immediate referral",
                "  3. [ROUTINE] Cardiology/Pulmonology: C — Follow-up within 2-4 weeks",
            ]
        );
    }

    #[test]
    fn specialty_differs_by_urgency_for_chest() {
        let urgent = referral_lines(&[finding(ImageType::ChestXray, "pneumonia", RiskLevel::High)]);
        assert!(urgent[0].contains("Pulmonology/Radiology"));
    }

    #[test]
    fn all_low_gives_single_line() {
        let findings = vec![finding(ImageType::Fundus, "No_DR", RiskLevel::Low)];
        assert_eq!(render_referrals(&findings), NO_REFERRALS);
    }
}
