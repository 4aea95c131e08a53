use std::collections::BTreeMap;
use std::path::Path;

use image::DynamicImage;

use super::mock::MockClassifier;
use super::table::ModalityTable;
use super::ClassifierError;
use crate::models::{ClassifierOutput, ImageType, RiskLevel, ERROR_CLASSIFICATION};
use crate::pipeline::lifecycle::{ManagedResource, ResourceReport};

/// Image classification backend: raw model labels paired with probabilities.
pub trait ImageClassifier: Send + Sync {
    fn predict(&self, image: &DynamicImage) -> Result<Vec<(String, f32)>, ClassifierError>;
}

type SharedBackend = Box<dyn ImageClassifier>;

/// One modality's classifier: a backend plus the modality's clinical tables.
///
/// `classify` is total. Backend failures become the error sentinel.
pub struct ModalityClassifier {
    table: &'static ModalityTable,
    backend: ManagedResource<SharedBackend>,
    mock: Option<MockClassifier>,
}

impl ModalityClassifier {
    pub fn new(table: &'static ModalityTable, backend: ManagedResource<SharedBackend>) -> Self {
        Self {
            table,
            backend,
            mock: None,
        }
    }

    /// Weighted-random demo classifier.
    pub fn mock(table: &'static ModalityTable) -> Self {
        Self {
            table,
            backend: ManagedResource::mock(resource_name(table.image_type)),
            mock: Some(MockClassifier::new(table)),
        }
    }

    /// ONNX classifier under `models_dir/<table.model_dir>`, loaded on first use.
    pub fn from_models_dir(table: &'static ModalityTable, models_dir: &Path) -> Self {
        let dir = models_dir.join(table.model_dir);
        Self::new(
            table,
            ManagedResource::lazy(resource_name(table.image_type), move || {
                load_backend(&dir).map_err(|e| e.to_string())
            }),
        )
    }

    pub fn image_type(&self) -> ImageType {
        self.table.image_type
    }

    pub fn status(&self) -> ResourceReport {
        self.backend.report()
    }

    pub fn warm_up(&self) {
        if self.mock.is_none() {
            let _ = self.backend.get();
        }
    }

    pub fn classify(&self, image: &DynamicImage) -> ClassifierOutput {
        let predictions = match &self.mock {
            Some(mock) => mock.predict(image),
            None => self
                .backend
                .get()
                .map_err(|e| ClassifierError::Unavailable(e.to_string()))
                .and_then(|backend| backend.predict(image)),
        };

        match predictions.and_then(|p| self.aggregate(&p)) {
            Ok(output) => output,
            Err(e) => {
                tracing::error!(
                    image_type = %self.table.image_type,
                    error = %e,
                    "Classification failed"
                );
                self.error_sentinel(&e)
            }
        }
    }

    /// Fold raw predictions into canonical classes and attach the clinical tables.
    pub fn aggregate(&self, predictions: &[(String, f32)]) -> Result<ClassifierOutput, ClassifierError> {
        // Canonical label → summed probability, in first-appearance order.
        let mut canonical: Vec<(String, f32)> = Vec::new();
        for (raw, p) in predictions {
            let label = self.table.rules.normalize(raw);
            match canonical.iter_mut().find(|(l, _)| *l == label) {
                Some(entry) => entry.1 += p,
                None => canonical.push((label, *p)),
            }
        }

        let (best, confidence) = canonical
            .iter()
            .fold(None::<&(String, f32)>, |best, entry| match best {
                Some(b) if b.1 >= entry.1 => Some(b),
                _ => Some(entry),
            })
            .cloned()
            .ok_or(ClassifierError::EmptyOutput)?;

        let (grade, severity_score) = if self.table.graded {
            let severity = canonical
                .iter()
                .filter_map(|(label, p)| self.table.rules.index_of(label).map(|i| i as f32 * p))
                .sum::<f32>();
            (self.table.grade_of(&best), Some(severity))
        } else {
            (None, None)
        };

        Ok(ClassifierOutput {
            risk_level: self.table.risk_for(&best),
            recommendation: self.table.recommendation_for(&best).to_string(),
            classification: best,
            confidence,
            all_scores: canonical.into_iter().collect(),
            grade,
            severity_score,
            error: None,
        })
    }

    fn error_sentinel(&self, error: &ClassifierError) -> ClassifierOutput {
        ClassifierOutput {
            classification: ERROR_CLASSIFICATION.to_string(),
            confidence: 0.0,
            risk_level: RiskLevel::Moderate,
            recommendation: self.table.error_recommendation.to_string(),
            all_scores: BTreeMap::new(),
            grade: None,
            severity_score: None,
            error: Some(error.to_string()),
        }
    }
}

fn resource_name(image_type: ImageType) -> &'static str {
    match image_type {
        ImageType::SkinLesion => "skin_classifier",
        ImageType::ChestXray => "chest_classifier",
        ImageType::Fundus => "fundus_classifier",
        ImageType::Unknown => "unknown_classifier",
    }
}

#[cfg(feature = "onnx-models")]
fn load_backend(dir: &Path) -> Result<SharedBackend, ClassifierError> {
    Ok(Box::new(super::vit::VitClassifier::load(dir)?))
}

#[cfg(not(feature = "onnx-models"))]
fn load_backend(dir: &Path) -> Result<SharedBackend, ClassifierError> {
    Err(ClassifierError::ModelInit(format!(
        "built without the onnx-models feature, {} not used",
        dir.display()
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ResourceStatus;
    use crate::pipeline::classify::{chest, fundus, skin};

    struct FixedBackend(Vec<(&'static str, f32)>);

    impl ImageClassifier for FixedBackend {
        fn predict(&self, _image: &DynamicImage) -> Result<Vec<(String, f32)>, ClassifierError> {
            Ok(self.0.iter().map(|(l, p)| (l.to_string(), *p)).collect())
        }
    }

    struct FailingBackend;

    impl ImageClassifier for FailingBackend {
        fn predict(&self, _image: &DynamicImage) -> Result<Vec<(String, f32)>, ClassifierError> {
            Err(ClassifierError::Inference("tensor shape mismatch".into()))
        }
    }

    fn classifier(table: &'static ModalityTable, backend: impl ImageClassifier + 'static) -> ModalityClassifier {
        ModalityClassifier::new(
            table,
            ManagedResource::ready("test", Box::new(backend) as SharedBackend),
        )
    }

    fn image() -> DynamicImage {
        DynamicImage::new_rgb8(4, 4)
    }

    #[test]
    fn aliases_aggregate_into_one_class() {
        let c = classifier(
            &chest::TABLE,
            FixedBackend(vec![
                ("No Finding", 0.30),
                ("Consolidation", 0.25),
                ("Lung Opacity", 0.20),
                ("Effusion", 0.25),
            ]),
        );
        let out = c.classify(&image());
        assert_eq!(out.classification, "pneumonia");
        assert!((out.confidence - 0.45).abs() < 1e-6);
        assert_eq!(out.risk_level, RiskLevel::High);
        assert_eq!(out.all_scores.len(), 3);
        assert!(out.grade.is_none());
    }

    #[test]
    fn risk_and_recommendation_depend_only_on_class() {
        let a = classifier(&skin::TABLE, FixedBackend(vec![("mel", 0.9), ("nv", 0.1)])).classify(&image());
        let b = classifier(&skin::TABLE, FixedBackend(vec![("melanoma", 0.51), ("nv", 0.49)])).classify(&image());
        assert_eq!(a.classification, b.classification);
        assert_ne!(a.confidence, b.confidence);
        assert_eq!(a.risk_level, b.risk_level);
        assert_eq!(a.recommendation, b.recommendation);
    }

    #[test]
    fn fundus_grade_and_severity() {
        let c = classifier(
            &fundus::TABLE,
            FixedBackend(vec![("0", 0.1), ("1", 0.1), ("2", 0.6), ("3", 0.1), ("4", 0.1)]),
        );
        let out = c.classify(&image());
        assert_eq!(out.classification, "Moderate");
        assert_eq!(out.grade, Some(2));
        // 0*0.1 + 1*0.1 + 2*0.6 + 3*0.1 + 4*0.1 = 2.0
        assert!((out.severity_score.unwrap() - 2.0).abs() < 1e-5);
    }

    #[test]
    fn backend_failure_yields_error_sentinel() {
        let out = classifier(&skin::TABLE, FailingBackend).classify(&image());
        assert!(out.is_error());
        assert_eq!(out.confidence, 0.0);
        assert_eq!(out.risk_level, RiskLevel::Moderate);
        assert_eq!(out.recommendation, skin::TABLE.error_recommendation);
        assert!(out.error.unwrap().contains("tensor shape mismatch"));
    }

    #[test]
    fn empty_predictions_yield_error_sentinel() {
        let out = classifier(&chest::TABLE, FixedBackend(vec![])).classify(&image());
        assert!(out.is_error());
    }

    #[test]
    fn unloadable_backend_yields_error_sentinel() {
        let c = ModalityClassifier::new(
            &fundus::TABLE,
            ManagedResource::lazy("fundus_classifier", || Err("model.onnx missing".to_string())),
        );
        let out = c.classify(&image());
        assert!(out.is_error());
        assert_eq!(c.status().status, ResourceStatus::Failed);
    }

    #[test]
    fn mock_classifier_reports_mock_and_stays_in_vocabulary() {
        let c = ModalityClassifier::mock(&fundus::TABLE);
        assert_eq!(c.status().status, ResourceStatus::Mock);
        for _ in 0..20 {
            let out = c.classify(&image());
            assert!(fundus::TABLE.classes().contains(&out.classification.as_str()));
            assert!(out.confidence >= 0.6 && out.confidence <= 0.93);
            assert_eq!(out.risk_level, fundus::TABLE.risk_for(&out.classification));
            assert!(out.grade.is_some());
        }
    }
}
