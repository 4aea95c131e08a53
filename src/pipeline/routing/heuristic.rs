//! Filename-based modality guess used when zero-shot scoring is unavailable.

use std::collections::BTreeMap;

use rand::seq::SliceRandom;
use rand::Rng;

use crate::models::{FallbackReason, ImageType, RouteDecision, RouteFallback, RouteHeuristic};

/// Checked in order; the first modality with a matching keyword wins.
const FILENAME_KEYWORDS: [(ImageType, &[&str]); 3] = [
    (
        ImageType::SkinLesion,
        &["skin", "derm", "lesion", "mole", "nevus", "melanoma"],
    ),
    (
        ImageType::ChestXray,
        &["xray", "chest", "cxr", "lung", "pneumonia", "tb"],
    ),
    (
        ImageType::Fundus,
        &["fundus", "retina", "eye", "dr", "retinopathy"],
    ),
];

const KEYWORD_CONFIDENCE: f32 = 0.75;
const RANDOM_CONFIDENCE: f32 = 0.4;

/// Modality whose keyword appears in the lower-cased file name.
pub fn modality_from_filename(filename: &str) -> Option<ImageType> {
    let name = filename.to_lowercase();
    FILENAME_KEYWORDS
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|k| name.contains(k)))
        .map(|(ty, _)| *ty)
}

/// Decision built from the filename, or a uniform random modality.
///
/// The chosen modality always carries the top score and clears `reject`;
/// the remaining mass is split evenly so the scores sum to 1.
pub fn fallback_route<R: Rng + ?Sized>(
    filename: &str,
    reason: FallbackReason,
    reject: f32,
    rng: &mut R,
) -> RouteDecision {
    let (image_type, confidence, heuristic) = match modality_from_filename(filename) {
        Some(ty) => (ty, KEYWORD_CONFIDENCE, RouteHeuristic::FilenameKeyword),
        None => {
            let ty = ImageType::MODALITIES
                .choose(rng)
                .copied()
                .unwrap_or(ImageType::SkinLesion);
            (ty, RANDOM_CONFIDENCE, RouteHeuristic::RandomChoice)
        }
    };
    let confidence = confidence.max(reject);

    let rest = (1.0 - confidence) / (ImageType::MODALITIES.len() - 1) as f32;
    let scores: BTreeMap<ImageType, f32> = ImageType::MODALITIES
        .into_iter()
        .map(|ty| (ty, if ty == image_type { confidence } else { rest }))
        .collect();

    RouteDecision {
        image_type,
        confidence,
        scores,
        ensembled: false,
        fallback: Some(RouteFallback { reason, heuristic }),
    }
}
