//! Session report synthesis: generative output with a deterministic template fallback.

pub mod correlation;
pub mod generation;
pub mod prompt;
pub mod referrals;
pub mod synthesizer;
pub mod template;

pub use generation::{
    ChatCompletionClient, GenerationError, GenerationRequest, MockTextGenerator, TextGenerator,
};
pub use synthesizer::{Report, ReportSynthesizer};
pub use template::{session_triage, DISCLAIMER};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("Session {0} has no findings to report")]
    EmptySession(String),

    #[error("Generation failed: {0}")]
    Generation(#[from] GenerationError),

    #[error("Generated report is missing the {0} section")]
    MissingSection(&'static str),
}
