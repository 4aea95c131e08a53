//! Dermoscopic skin lesion vocabulary (HAM10000).

use super::labels::LabelRules;
use super::table::ModalityTable;
use crate::models::{ImageType, RiskLevel};

pub const MELANOMA: &str = "melanoma";
pub const BASAL_CELL_CARCINOMA: &str = "basal cell carcinoma";

pub static TABLE: ModalityTable = ModalityTable {
    image_type: ImageType::SkinLesion,
    model_dir: "skin-vit",
    rules: LabelRules {
        classes: &[
            "melanocytic nevi",
            MELANOMA,
            "benign keratosis",
            BASAL_CELL_CARCINOMA,
            "actinic keratoses",
            "vascular lesions",
            "dermatofibroma",
        ],
        // HAM10000 dataset abbreviations
        exact: &[
            ("nv", "melanocytic nevi"),
            ("mel", MELANOMA),
            ("bkl", "benign keratosis"),
            ("bcc", BASAL_CELL_CARCINOMA),
            ("akiec", "actinic keratoses"),
            ("vasc", "vascular lesions"),
            ("df", "dermatofibroma"),
        ],
        canonical_containment: true,
        contains: &[
            ("nevus", "melanocytic nevi"),
            ("nevi", "melanocytic nevi"),
            ("mole", "melanocytic nevi"),
            ("melanocytic", "melanocytic nevi"),
            ("melanoma", MELANOMA),
            ("keratosis", "benign keratosis"),
            ("seborrheic", "benign keratosis"),
            ("bkl", "benign keratosis"),
            ("basal", BASAL_CELL_CARCINOMA),
            ("bcc", BASAL_CELL_CARCINOMA),
            ("carcinoma", BASAL_CELL_CARCINOMA),
            ("actinic", "actinic keratoses"),
            ("keratoses", "actinic keratoses"),
            ("solar", "actinic keratoses"),
            ("vascular", "vascular lesions"),
            ("angioma", "vascular lesions"),
            ("hemangioma", "vascular lesions"),
            ("dermatofibroma", "dermatofibroma"),
            ("fibroma", "dermatofibroma"),
        ],
        numeric_index: false,
    },
    risk: &[
        (MELANOMA, RiskLevel::High),
        (BASAL_CELL_CARCINOMA, RiskLevel::High),
        ("actinic keratoses", RiskLevel::Moderate),
        ("melanocytic nevi", RiskLevel::Low),
        ("benign keratosis", RiskLevel::Low),
        ("vascular lesions", RiskLevel::Low),
        ("dermatofibroma", RiskLevel::Low),
    ],
    recommendations: &[
        (MELANOMA, "URGENT: Refer to dermatologist immediately for biopsy. Document ABCDE characteristics (Asymmetry, Border irregularity, Color variation, Diameter >6mm, Evolution)."),
        (BASAL_CELL_CARCINOMA, "Refer to dermatologist for excision evaluation within 2 weeks. Most common skin cancer — high cure rate with early treatment."),
        ("actinic keratoses", "Pre-cancerous lesion. Schedule dermatology follow-up. Consider cryotherapy or topical 5-FU treatment. Sun protection critical."),
        ("melanocytic nevi", "Benign mole. No immediate action required. Advise routine skin self-examination (monthly) and annual professional screening."),
        ("benign keratosis", "Benign finding (seborrheic keratosis). No treatment needed unless cosmetically concerning. Monitor for changes."),
        ("vascular lesions", "Generally benign vascular finding. Refer if symptomatic, bleeding, or cosmetically concerning."),
        ("dermatofibroma", "Benign fibrous nodule. No treatment needed unless symptomatic. Reassure patient."),
    ],
    default_recommendation: "Consult dermatologist for further evaluation.",
    error_recommendation: "Classification failed. Please re-upload or consult dermatologist.",
    mock_weights: &[0.35, 0.12, 0.18, 0.1, 0.1, 0.08, 0.07],
    mock_confidence: (0.6, 0.95),
    graded: false,
};

/// Classes treated as malignant for cross-modality staging notes.
pub fn is_malignant(classification: &str) -> bool {
    classification == MELANOMA || classification == BASAL_CELL_CARCINOMA
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ham_abbreviations() {
        assert_eq!(TABLE.rules.normalize("mel"), "melanoma");
        assert_eq!(TABLE.rules.normalize("AKIEC"), "actinic keratoses");
        assert_eq!(TABLE.rules.normalize("df"), "dermatofibroma");
    }

    #[test]
    fn descriptive_labels() {
        assert_eq!(TABLE.rules.normalize("Melanocytic_Nevi"), "melanocytic nevi");
        assert_eq!(TABLE.rules.normalize("Basal Cell Carcinoma"), "basal cell carcinoma");
        assert_eq!(TABLE.rules.normalize("seborrheic keratosis"), "benign keratosis");
        assert_eq!(TABLE.rules.normalize("cherry angioma"), "vascular lesions");
    }

    #[test]
    fn risk_tiers() {
        assert_eq!(TABLE.risk_for("melanoma"), RiskLevel::High);
        assert_eq!(TABLE.risk_for("actinic keratoses"), RiskLevel::Moderate);
        assert_eq!(TABLE.risk_for("dermatofibroma"), RiskLevel::Low);
    }

    #[test]
    fn malignant_classes() {
        assert!(is_malignant("melanoma"));
        assert!(is_malignant("basal cell carcinoma"));
        assert!(!is_malignant("actinic keratoses"));
    }
}
