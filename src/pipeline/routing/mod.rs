pub mod heuristic;
pub mod prompts;
pub mod router;
pub mod scorer;

#[cfg(feature = "onnx-models")]
pub mod clip;

pub use router::ModalityRouter;
pub use scorer::ImageTextScorer;

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum RoutingError {
    #[error("Router model not found: {0}")]
    ModelNotFound(PathBuf),

    #[error("Router model initialization: {0}")]
    ModelInit(String),

    #[error("Tokenization error: {0}")]
    Tokenization(String),

    #[error("Image preprocessing failed: {0}")]
    Preprocess(String),

    #[error("Scoring failed: {0}")]
    Inference(String),

    #[error("Scorer returned {got} scores for {expected} prompts")]
    ScoreCount { expected: usize, got: usize },
}
