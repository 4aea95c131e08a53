//! Chest radiograph vocabulary (CheXpert / ChestX-ray14 label variants).

use super::labels::LabelRules;
use super::table::ModalityTable;
use crate::models::{ImageType, RiskLevel};

pub const CARDIOMEGALY: &str = "cardiomegaly";

// Exact and substring matching share one alias list.
const VARIANTS: &[(&str, &str)] = &[
    ("normal", "normal"),
    ("no finding", "normal"),
    ("no findings", "normal"),
    ("healthy", "normal"),
    ("cardiomegaly", CARDIOMEGALY),
    ("enlarged heart", CARDIOMEGALY),
    ("cardiac enlargement", CARDIOMEGALY),
    ("pneumonia", "pneumonia"),
    ("lung opacity", "pneumonia"),
    ("consolidation", "pneumonia"),
    ("infiltrate", "pneumonia"),
    ("pleural effusion", "pleural effusion"),
    ("effusion", "pleural effusion"),
    ("pleural_effusion", "pleural effusion"),
    ("atelectasis", "atelectasis"),
    ("collapse", "atelectasis"),
    ("lung collapse", "atelectasis"),
    ("pneumothorax", "pneumothorax"),
    ("tuberculosis", "tuberculosis"),
    ("tb", "tuberculosis"),
    ("pulmonary tuberculosis", "tuberculosis"),
    ("edema", "pleural effusion"),
    ("mass", "pneumonia"),
    // incidental or chronic findings
    ("nodule", "normal"),
    ("emphysema", "normal"),
    ("fibrosis", "normal"),
    ("hernia", "normal"),
];

pub static TABLE: ModalityTable = ModalityTable {
    image_type: ImageType::ChestXray,
    model_dir: "chest-vit",
    rules: LabelRules {
        classes: &[
            "normal",
            CARDIOMEGALY,
            "pneumonia",
            "pleural effusion",
            "atelectasis",
            "pneumothorax",
            "tuberculosis",
        ],
        exact: VARIANTS,
        canonical_containment: false,
        contains: VARIANTS,
        numeric_index: false,
    },
    risk: &[
        ("normal", RiskLevel::Low),
        (CARDIOMEGALY, RiskLevel::Moderate),
        ("pneumonia", RiskLevel::High),
        ("pleural effusion", RiskLevel::Moderate),
        ("atelectasis", RiskLevel::Moderate),
        ("pneumothorax", RiskLevel::High),
        ("tuberculosis", RiskLevel::High),
    ],
    recommendations: &[
        ("normal", "No acute cardiopulmonary findings. Routine follow-up as clinically indicated."),
        (CARDIOMEGALY, "Enlarged cardiac silhouette (CTR > 0.5). Recommend echocardiogram, BNP levels, and cardiology referral. Evaluate for heart failure."),
        ("pneumonia", "Consolidation/opacity pattern consistent with pneumonia. Start empiric antibiotics per guidelines. Consider sputum culture and CRP/procalcitonin."),
        ("pleural effusion", "Fluid collection in pleural space. Consider thoracentesis if large or symptomatic. Evaluate for CHF, infection, malignancy."),
        ("atelectasis", "Lung collapse pattern noted. Encourage incentive spirometry and deep breathing exercises. Rule out endobronchial obstruction if persistent."),
        ("pneumothorax", "URGENT: Air in pleural space detected. Assess for tension pneumothorax (tracheal deviation, hypotension). May require emergent chest tube decompression."),
        ("tuberculosis", "Radiographic pattern suggestive of TB (upper lobe infiltrates/cavitation). ISOLATE patient immediately. Obtain sputum AFB x3, start TB workup per CDC guidelines."),
    ],
    default_recommendation: "Consult radiologist for further evaluation.",
    error_recommendation: "Classification failed. Please re-upload or consult radiologist.",
    mock_weights: &[0.3, 0.15, 0.2, 0.12, 0.1, 0.05, 0.08],
    mock_confidence: (0.65, 0.94),
    graded: false,
};
