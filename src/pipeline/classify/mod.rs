pub mod chest;
pub mod classifier;
pub mod fundus;
pub mod labels;
pub mod mock;
pub mod registry;
pub mod skin;
pub mod table;

#[cfg(feature = "onnx-models")]
pub mod vit;

pub use classifier::{ImageClassifier, ModalityClassifier};
pub use registry::ClassifierRegistry;
pub use table::ModalityTable;

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClassifierError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Classifier model not found: {0}")]
    ModelNotFound(PathBuf),

    #[error("Classifier model initialization: {0}")]
    ModelInit(String),

    #[error("Classifier unavailable: {0}")]
    Unavailable(String),

    #[error("Image preprocessing failed: {0}")]
    Preprocess(String),

    #[error("Inference failed: {0}")]
    Inference(String),

    #[error("Model returned no scores")]
    EmptyOutput,
}
