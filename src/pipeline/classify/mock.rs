use image::DynamicImage;
use rand::distributions::{Distribution, WeightedIndex};
use rand::Rng;

use super::classifier::ImageClassifier;
use super::table::ModalityTable;
use super::ClassifierError;

/// Background score range for the classes not drawn.
const BACKGROUND_SCORE: (f32, f32) = (0.01, 0.1);

/// Demo backend: draws a class by the table's weights with a plausible confidence.
pub struct MockClassifier {
    table: &'static ModalityTable,
}

impl MockClassifier {
    pub fn new(table: &'static ModalityTable) -> Self {
        Self { table }
    }

    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<Vec<(String, f32)>, ClassifierError> {
        let classes = self.table.classes();
        let weights = WeightedIndex::new(self.table.mock_weights)
            .map_err(|e| ClassifierError::Inference(format!("mock weights: {e}")))?;
        let chosen = weights.sample(rng);
        let (lo, hi) = self.table.mock_confidence;

        Ok(classes
            .iter()
            .enumerate()
            .map(|(i, class)| {
                let score = if i == chosen {
                    rng.gen_range(lo..hi)
                } else {
                    rng.gen_range(BACKGROUND_SCORE.0..BACKGROUND_SCORE.1)
                };
                (class.to_string(), score)
            })
            .collect())
    }
}

impl ImageClassifier for MockClassifier {
    fn predict(&self, _image: &DynamicImage) -> Result<Vec<(String, f32)>, ClassifierError> {
        self.sample(&mut rand::thread_rng())
    }
}
