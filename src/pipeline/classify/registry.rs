use std::path::Path;

use super::classifier::ModalityClassifier;
use super::{chest, fundus, skin};
use crate::models::ImageType;
use crate::pipeline::lifecycle::ResourceReport;

/// The three modality classifiers, looked up by routed image type.
pub struct ClassifierRegistry {
    skin: ModalityClassifier,
    chest: ModalityClassifier,
    fundus: ModalityClassifier,
}

impl ClassifierRegistry {
    pub fn new(skin: ModalityClassifier, chest: ModalityClassifier, fundus: ModalityClassifier) -> Self {
        Self { skin, chest, fundus }
    }

    pub fn mock() -> Self {
        Self::new(
            ModalityClassifier::mock(&skin::TABLE),
            ModalityClassifier::mock(&chest::TABLE),
            ModalityClassifier::mock(&fundus::TABLE),
        )
    }

    pub fn from_models_dir(models_dir: &Path) -> Self {
        Self::new(
            ModalityClassifier::from_models_dir(&skin::TABLE, models_dir),
            ModalityClassifier::from_models_dir(&chest::TABLE, models_dir),
            ModalityClassifier::from_models_dir(&fundus::TABLE, models_dir),
        )
    }

    /// Classifier for a routed modality. `Unknown` has none.
    pub fn get(&self, image_type: ImageType) -> Option<&ModalityClassifier> {
        match image_type {
            ImageType::SkinLesion => Some(&self.skin),
            ImageType::ChestXray => Some(&self.chest),
            ImageType::Fundus => Some(&self.fundus),
            ImageType::Unknown => None,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &ModalityClassifier> {
        [&self.skin, &self.chest, &self.fundus].into_iter()
    }

    pub fn warm_up(&self) {
        for classifier in self.iter() {
            classifier.warm_up();
        }
    }

    pub fn statuses(&self) -> Vec<ResourceReport> {
        self.iter().map(ModalityClassifier::status).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ResourceStatus;

    #[test]
    fn lookup_by_modality() {
        let registry = ClassifierRegistry::mock();
        for ty in ImageType::MODALITIES {
            assert_eq!(registry.get(ty).unwrap().image_type(), ty);
        }
        assert!(registry.get(ImageType::Unknown).is_none());
    }

    #[test]
    fn statuses_cover_all_three() {
        let statuses = ClassifierRegistry::mock().statuses();
        assert_eq!(statuses.len(), 3);
        assert!(statuses.iter().all(|s| s.status == ResourceStatus::Mock));
        assert_eq!(statuses[0].name, "skin_classifier");
    }

    #[test]
    fn real_backends_start_not_loaded() {
        let dir = tempfile::tempdir().unwrap();
        let registry = ClassifierRegistry::from_models_dir(dir.path());
        assert!(registry
            .statuses()
            .iter()
            .all(|s| s.status == ResourceStatus::NotLoaded));
    }
}
