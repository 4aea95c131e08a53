//! Diabetic retinopathy grading vocabulary (APTOS / EyePACS scale).

use super::labels::LabelRules;
use super::table::ModalityTable;
use crate::models::{ImageType, RiskLevel};

const VARIANTS: &[(&str, &str)] = &[
    ("no dr", "No DR"),
    ("no_dr", "No DR"),
    ("0", "No DR"),
    ("no diabetic retinopathy", "No DR"),
    ("healthy", "No DR"),
    ("normal", "No DR"),
    ("no retinopathy", "No DR"),
    ("mild", "Mild"),
    ("1", "Mild"),
    ("mild npdr", "Mild"),
    ("mild non-proliferative", "Mild"),
    ("moderate", "Moderate"),
    ("2", "Moderate"),
    ("moderate npdr", "Moderate"),
    ("moderate non-proliferative", "Moderate"),
    ("severe", "Severe"),
    ("3", "Severe"),
    ("severe npdr", "Severe"),
    ("severe non-proliferative", "Severe"),
    ("proliferative", "Proliferative"),
    ("4", "Proliferative"),
    ("pdr", "Proliferative"),
    ("proliferative dr", "Proliferative"),
    ("proliferative_dr", "Proliferative"),
];

pub static TABLE: ModalityTable = ModalityTable {
    image_type: ImageType::Fundus,
    model_dir: "fundus-vit",
    rules: LabelRules {
        classes: &["No DR", "Mild", "Moderate", "Severe", "Proliferative"],
        exact: VARIANTS,
        canonical_containment: false,
        contains: VARIANTS,
        numeric_index: true,
    },
    risk: &[
        ("No DR", RiskLevel::Low),
        ("Mild", RiskLevel::Low),
        ("Moderate", RiskLevel::Moderate),
        ("Severe", RiskLevel::High),
        ("Proliferative", RiskLevel::High),
    ],
    recommendations: &[
        ("No DR", "No diabetic retinopathy detected. Continue annual dilated eye exam. Maintain HbA1c < 7% and blood pressure < 130/80."),
        ("Mild", "Mild nonproliferative DR (microaneurysms only). Re-screen in 9-12 months. Optimize glycemic control — every 1% HbA1c reduction cuts DR risk by 35%."),
        ("Moderate", "Moderate NPDR detected (microaneurysms + hemorrhages/exudates). Refer to ophthalmologist within 3-6 months. Tighten glucose (HbA1c < 7%) and BP (< 130/80) control urgently."),
        ("Severe", "Severe NPDR detected (extensive hemorrhages, venous beading, IRMA). URGENT ophthalmology referral within 2-4 weeks — 50% risk of progression to PDR within 1 year."),
        ("Proliferative", "URGENT: Proliferative DR detected (neovascularization). Immediate ophthalmology referral for anti-VEGF injection or panretinal photocoagulation. Risk of vitreous hemorrhage and retinal detachment."),
    ],
    default_recommendation: "Refer to ophthalmologist for comprehensive dilated eye examination.",
    error_recommendation: "Classification failed. Please re-upload or refer to ophthalmologist.",
    mock_weights: &[0.35, 0.2, 0.2, 0.15, 0.1],
    mock_confidence: (0.6, 0.93),
    graded: true,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_grades() {
        assert_eq!(TABLE.rules.normalize("0"), "No DR");
        assert_eq!(TABLE.rules.normalize("4"), "Proliferative");
    }

    #[test]
    fn descriptive_grades() {
        assert_eq!(TABLE.rules.normalize("Moderate NPDR"), "Moderate");
        assert_eq!(TABLE.rules.normalize("Proliferative_DR"), "Proliferative");
        assert_eq!(TABLE.rules.normalize("No_DR"), "No DR");
    }

    #[test]
    fn grade_index() {
        assert_eq!(TABLE.grade_of("No DR"), Some(0));
        assert_eq!(TABLE.grade_of("Proliferative"), Some(4));
    }

    #[test]
    fn risk_tiers() {
        assert_eq!(TABLE.risk_for("Mild"), RiskLevel::Low);
        assert_eq!(TABLE.risk_for("Moderate"), RiskLevel::Moderate);
        assert_eq!(TABLE.risk_for("Severe"), RiskLevel::High);
    }
}
