use super::labels::LabelRules;
use crate::models::{ImageType, RiskLevel};

/// Static vocabulary and clinical tables for one modality.
#[derive(Debug)]
pub struct ModalityTable {
    pub image_type: ImageType,
    /// Sub-directory of the models root holding the ONNX classifier.
    pub model_dir: &'static str,
    pub rules: LabelRules,
    pub risk: &'static [(&'static str, RiskLevel)],
    pub recommendations: &'static [(&'static str, &'static str)],
    /// Advice for a class outside the vocabulary.
    pub default_recommendation: &'static str,
    /// Advice carried by the error sentinel.
    pub error_recommendation: &'static str,
    /// Mock-mode sampling weights, aligned with `rules.classes`.
    pub mock_weights: &'static [f32],
    /// Mock-mode confidence range.
    pub mock_confidence: (f32, f32),
    /// Whether the class index is a severity grade (fundus).
    pub graded: bool,
}

impl ModalityTable {
    pub fn classes(&self) -> &'static [&'static str] {
        self.rules.classes
    }

    /// Risk tier of a canonical class. Classes outside the vocabulary are moderate.
    pub fn risk_for(&self, classification: &str) -> RiskLevel {
        self.risk
            .iter()
            .find(|(c, _)| *c == classification)
            .map(|(_, r)| *r)
            .unwrap_or(RiskLevel::Moderate)
    }

    pub fn recommendation_for(&self, classification: &str) -> &'static str {
        self.recommendations
            .iter()
            .find(|(c, _)| *c == classification)
            .map(|(_, r)| *r)
            .unwrap_or(self.default_recommendation)
    }

    /// Severity grade of a canonical class, for graded modalities.
    pub fn grade_of(&self, classification: &str) -> Option<u8> {
        if !self.graded {
            return None;
        }
        self.rules.index_of(classification).map(|i| i as u8)
    }
}

#[cfg(test)]
mod tests {
    use super::super::{chest, fundus, skin};
    use super::*;

    fn tables() -> [&'static ModalityTable; 3] {
        [&skin::TABLE, &chest::TABLE, &fundus::TABLE]
    }

    #[test]
    fn every_class_has_risk_and_recommendation() {
        for table in tables() {
            for class in table.classes() {
                assert!(
                    table.risk.iter().any(|(c, _)| c == class),
                    "{class} missing risk"
                );
                assert_ne!(
                    table.recommendation_for(class),
                    table.default_recommendation,
                    "{class} missing recommendation"
                );
            }
            assert_eq!(table.mock_weights.len(), table.classes().len());
        }
    }

    #[test]
    fn aliases_point_into_vocabulary() {
        for table in tables() {
            for (_, canonical) in table.rules.exact.iter().chain(table.rules.contains) {
                assert!(
                    table.classes().contains(canonical),
                    "{canonical} not canonical for {}",
                    table.image_type
                );
            }
        }
    }

    #[test]
    fn unknown_class_is_moderate_with_default_advice() {
        assert_eq!(skin::TABLE.risk_for("class_9"), RiskLevel::Moderate);
        assert_eq!(
            skin::TABLE.recommendation_for("class_9"),
            skin::TABLE.default_recommendation
        );
    }

    #[test]
    fn only_fundus_is_graded() {
        assert_eq!(fundus::TABLE.grade_of("Severe"), Some(3));
        assert_eq!(fundus::TABLE.grade_of("whatever"), None);
        assert_eq!(chest::TABLE.grade_of("pneumonia"), None);
    }
}
