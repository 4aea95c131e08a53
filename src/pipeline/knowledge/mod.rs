pub mod chunker;
pub mod corpus;

pub use chunker::{split_sections, MIN_CHUNK_CHARS};
pub use corpus::{load_corpus, KnowledgeChunk};

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Knowledge directory not found: {0}")]
    CorpusNotFound(PathBuf),

    #[error("Embedding model not found: {0}")]
    ModelNotFound(PathBuf),

    #[error("Embedding model initialization: {0}")]
    ModelInit(String),

    #[error("Tokenization error: {0}")]
    Tokenization(String),

    #[error("Embedding generation failed: {0}")]
    Embedding(String),
}
