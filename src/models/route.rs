use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::{FallbackReason, ImageType, RouteHeuristic};

/// Present only when the filename/random heuristic produced the decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteFallback {
    pub reason: FallbackReason,
    pub heuristic: RouteHeuristic,
}

/// The router's verdict for one image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteDecision {
    #[serde(rename = "type")]
    pub image_type: ImageType,
    pub confidence: f32,
    /// Probability per routable modality.
    pub scores: BTreeMap<ImageType, f32>,
    pub ensembled: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fallback: Option<RouteFallback>,
}

/// Arg-max over a modality score map, first modality wins on ties.
pub fn top_of(scores: &BTreeMap<ImageType, f32>) -> Option<(ImageType, f32)> {
    scores.iter().fold(None, |best, (&ty, &score)| match best {
        Some((_, best_score)) if best_score >= score => best,
        _ => Some((ty, score)),
    })
}
