use std::collections::BTreeMap;
use std::path::Path;

use image::DynamicImage;

use super::heuristic::fallback_route;
use super::prompts::{ensemble_prompts, primary_prompts};
use super::scorer::ImageTextScorer;
use super::RoutingError;
use crate::config::RouterThresholds;
use crate::models::{top_of, FallbackReason, ImageType, RouteDecision};
use crate::pipeline::lifecycle::{ManagedResource, ResourceReport};

/// Sub-directory of the models root holding the CLIP encoders.
pub const CLIP_DIR: &str = "clip-vit-b-32";

type SharedScorer = Box<dyn ImageTextScorer>;

/// Zero-shot modality router with ensemble re-scoring and an `unknown` band.
pub struct ModalityRouter {
    scorer: ManagedResource<SharedScorer>,
    thresholds: RouterThresholds,
}

impl ModalityRouter {
    pub fn new(scorer: ManagedResource<SharedScorer>, thresholds: RouterThresholds) -> Self {
        Self { scorer, thresholds }
    }

    /// Router without a scorer: every decision comes from the filename heuristic.
    pub fn mock(thresholds: RouterThresholds) -> Self {
        Self::new(ManagedResource::mock("router"), thresholds)
    }

    /// Router backed by the CLIP encoders under `models_dir`, loaded on first use.
    pub fn from_models_dir(models_dir: &Path, thresholds: RouterThresholds) -> Self {
        let dir = models_dir.join(CLIP_DIR);
        Self::new(
            ManagedResource::lazy("router", move || load_scorer(&dir).map_err(|e| e.to_string())),
            thresholds,
        )
    }

    pub fn warm_up(&self) {
        let _ = self.scorer.get();
    }

    pub fn status(&self) -> ResourceReport {
        self.scorer.report()
    }

    /// Decide the modality of `image`. Never fails: scorer problems yield a
    /// heuristic decision marked with its fallback reason.
    pub fn route(&self, image: &DynamicImage, filename: &str) -> RouteDecision {
        let scorer = match self.scorer.get() {
            Ok(scorer) => scorer,
            Err(e) => {
                tracing::debug!(reason = %e, "No zero-shot scorer, routing by filename");
                return fallback_route(
                    filename,
                    FallbackReason::ScorerUnavailable,
                    self.thresholds.reject,
                    &mut rand::thread_rng(),
                );
            }
        };

        match self.score(&**scorer, image) {
            Ok(decision) => {
                tracing::debug!(
                    image_type = %decision.image_type,
                    confidence = decision.confidence,
                    ensembled = decision.ensembled,
                    "Image routed"
                );
                decision
            }
            Err(e) => {
                tracing::warn!(error = %e, "Zero-shot routing failed, using filename heuristic");
                fallback_route(
                    filename,
                    FallbackReason::ScoringFailed,
                    self.thresholds.reject,
                    &mut rand::thread_rng(),
                )
            }
        }
    }

    /// Primary pass, optional ensemble pass, then the reject gate.
    pub fn score(
        &self,
        scorer: &dyn ImageTextScorer,
        image: &DynamicImage,
    ) -> Result<RouteDecision, RoutingError> {
        let prompts = primary_prompts();
        let probs = scorer.score(image, &prompts)?;
        check_count(prompts.len(), probs.len())?;

        let mut scores: BTreeMap<ImageType, f32> =
            ImageType::MODALITIES.into_iter().zip(probs).collect();
        let (_, provisional) = top_of(&scores).ok_or(RoutingError::ScoreCount {
            expected: prompts.len(),
            got: 0,
        })?;

        let ensembled =
            provisional >= self.thresholds.reject && provisional < self.thresholds.ensemble;
        if ensembled {
            scores = ensemble_scores(scorer, image)?;
        }

        let (best, confidence) = top_of(&scores).ok_or(RoutingError::ScoreCount {
            expected: prompts.len(),
            got: 0,
        })?;
        let image_type = if confidence < self.thresholds.reject {
            ImageType::Unknown
        } else {
            best
        };

        Ok(RouteDecision {
            image_type,
            confidence,
            scores,
            ensembled,
            fallback: None,
        })
    }
}

/// Soft-max over every paraphrase, averaged per modality and renormalized to 1.
fn ensemble_scores(
    scorer: &dyn ImageTextScorer,
    image: &DynamicImage,
) -> Result<BTreeMap<ImageType, f32>, RoutingError> {
    let tagged = ensemble_prompts();
    let prompts: Vec<&str> = tagged.iter().map(|(_, p)| *p).collect();
    let probs = scorer.score(image, &prompts)?;
    check_count(prompts.len(), probs.len())?;

    let mut sums: BTreeMap<ImageType, (f32, usize)> = BTreeMap::new();
    for ((ty, _), p) in tagged.iter().zip(probs) {
        let entry = sums.entry(*ty).or_insert((0.0, 0));
        entry.0 += p;
        entry.1 += 1;
    }

    let mut scores: BTreeMap<ImageType, f32> = sums
        .into_iter()
        .map(|(ty, (sum, n))| (ty, sum / n as f32))
        .collect();
    let total: f32 = scores.values().sum();
    if total > 0.0 {
        for v in scores.values_mut() {
            *v /= total;
        }
    }
    Ok(scores)
}

fn check_count(expected: usize, got: usize) -> Result<(), RoutingError> {
    if expected == got {
        Ok(())
    } else {
        Err(RoutingError::ScoreCount { expected, got })
    }
}

#[cfg(feature = "onnx-models")]
fn load_scorer(dir: &Path) -> Result<SharedScorer, RoutingError> {
    Ok(Box::new(super::clip::ClipScorer::load(dir)?))
}

#[cfg(not(feature = "onnx-models"))]
fn load_scorer(dir: &Path) -> Result<SharedScorer, RoutingError> {
    Err(RoutingError::ModelInit(format!(
        "built without the onnx-models feature, {} not used",
        dir.display()
    )))
}
