pub mod embedder;
pub mod engine;
pub mod keyword;
pub mod semantic;

pub use embedder::{EmbeddingModel, HashingEmbedder, EMBEDDING_DIM};
pub use engine::{RetrievalEngine, DEFAULT_TOP_K};
pub use keyword::KeywordRetriever;
pub use semantic::SemanticIndex;

use crate::pipeline::knowledge::StorageError;

/// One retrieval strategy over the guideline corpus.
pub trait Retriever: Send + Sync {
    fn name(&self) -> &'static str;
    /// At most `k` chunk texts, best first.
    fn search(&self, query: &str, k: usize) -> Result<Vec<String>, StorageError>;
}
