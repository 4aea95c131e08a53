use std::path::Path;
use std::sync::Arc;

use serde::Serialize;

use super::embedder::EmbeddingModel;
use super::keyword::KeywordRetriever;
use super::semantic::SemanticIndex;
use super::Retriever;
use crate::models::ResourceStatus;
use crate::pipeline::knowledge::{load_corpus, KnowledgeChunk, StorageError};
use crate::pipeline::lifecycle::ManagedResource;

/// Chunks returned per query unless the caller asks otherwise.
pub const DEFAULT_TOP_K: usize = 3;

/// Sub-directory of the models root holding the sentence embedder.
pub const EMBEDDER_DIR: &str = "all-MiniLM-L6-v2";

/// Health snapshot of the retrieval engine.
#[derive(Debug, Clone, Serialize)]
pub struct RetrievalStatus {
    pub status: ResourceStatus,
    pub chunks: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

/// Guideline retrieval: semantic search when an embedder is available,
/// keyword overlap otherwise. Callers only ever see chunk texts.
pub struct RetrievalEngine {
    chunks: Arc<Vec<KnowledgeChunk>>,
    keyword: KeywordRetriever,
    semantic: ManagedResource<SemanticIndex>,
}

impl RetrievalEngine {
    pub fn new(chunks: Arc<Vec<KnowledgeChunk>>, semantic: ManagedResource<SemanticIndex>) -> Self {
        Self {
            keyword: KeywordRetriever::new(Arc::clone(&chunks)),
            chunks,
            semantic,
        }
    }

    /// Keyword retrieval only (mock mode).
    pub fn keyword_only(chunks: Vec<KnowledgeChunk>) -> Self {
        Self::new(Arc::new(chunks), ManagedResource::mock("retrieval"))
    }

    /// Semantic retrieval with an embedder built on first query.
    pub fn with_embedder<F>(chunks: Vec<KnowledgeChunk>, make_embedder: F) -> Self
    where
        F: Fn() -> Result<Box<dyn EmbeddingModel>, StorageError> + Send + Sync + 'static,
    {
        let chunks = Arc::new(chunks);
        let index_chunks = Arc::clone(&chunks);
        let semantic = ManagedResource::lazy("retrieval", move || {
            let embedder = make_embedder().map_err(|e| e.to_string())?;
            SemanticIndex::build(embedder, Arc::clone(&index_chunks)).map_err(|e| e.to_string())
        });
        Self::new(chunks, semantic)
    }

    /// Load the corpus under `knowledge_dir` and pick the backend.
    ///
    /// A missing or unreadable corpus is logged and treated as empty.
    pub fn from_dir(knowledge_dir: &Path, models_dir: &Path, mock_mode: bool) -> Self {
        let chunks = load_corpus(knowledge_dir).unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Knowledge corpus unavailable, retrieval will return nothing");
            Vec::new()
        });
        if mock_mode {
            return Self::keyword_only(chunks);
        }
        let embedder_dir = models_dir.join(EMBEDDER_DIR);
        Self::with_embedder(chunks, move || load_embedder(&embedder_dir))
    }

    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }

    /// Build the semantic index now rather than on the first query.
    pub fn warm_up(&self) {
        if !self.chunks.is_empty() {
            let _ = self.semantic.get();
        }
    }

    /// Up to `k` guideline chunks relevant to `query`. Never fails.
    pub fn retrieve(&self, query: &str, k: usize) -> Vec<String> {
        if self.chunks.is_empty() || k == 0 {
            return Vec::new();
        }

        if let Ok(index) = self.semantic.get() {
            match index.search(query, k) {
                Ok(hits) if !hits.is_empty() => {
                    tracing::debug!(retriever = index.name(), hits = hits.len(), "Guidelines retrieved");
                    return hits;
                }
                Ok(_) => {
                    tracing::debug!("No semantic hit above floor, using keyword overlap");
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Query embedding failed, using keyword overlap");
                }
            }
        }

        self.keyword.rank(query, k)
    }

    pub fn status(&self) -> RetrievalStatus {
        let report = self.semantic.report();
        RetrievalStatus {
            status: report.status,
            chunks: self.chunks.len(),
            detail: report.detail,
        }
    }
}

#[cfg(feature = "onnx-models")]
fn load_embedder(dir: &Path) -> Result<Box<dyn EmbeddingModel>, StorageError> {
    Ok(Box::new(super::embedder::MiniLmEmbedder::load(dir)?))
}

#[cfg(not(feature = "onnx-models"))]
fn load_embedder(dir: &Path) -> Result<Box<dyn EmbeddingModel>, StorageError> {
    Err(StorageError::ModelInit(format!(
        "built without the onnx-models feature, {} not used",
        dir.display()
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::retrieval::embedder::HashingEmbedder;
    use std::path::PathBuf;

    fn hashing() -> Result<Box<dyn EmbeddingModel>, StorageError> {
        Ok(Box::new(HashingEmbedder::new()))
    }

    fn failing() -> Result<Box<dyn EmbeddingModel>, StorageError> {
        Ok(Box::new(FailingEmbedder))
    }

    fn chunks(texts: &[&str]) -> Vec<KnowledgeChunk> {
        texts
            .iter()
            .map(|t| KnowledgeChunk {
                text: t.to_string(),
                source: "guide.md".into(),
            })
            .collect()
    }

    fn sample() -> Vec<KnowledgeChunk> {
        chunks(&[
            "## Melanoma\nUrgent dermatology referral, staging workup.",
            "## Pneumonia\nChest radiograph consolidation, antibiotics.",
            "## Retinopathy\nFundus grading and glycemic control.",
            "## Cardiomegaly\nCardiothoracic ratio above half.",
        ])
    }

    struct FailingEmbedder;

    impl EmbeddingModel for FailingEmbedder {
        fn embed(&self, _text: &str) -> Result<Vec<f32>, StorageError> {
            Err(StorageError::Embedding("runtime gone".into()))
        }
        fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, StorageError> {
            Ok(texts.iter().map(|_| vec![1.0, 0.0]).collect())
        }
        fn dimension(&self) -> usize {
            2
        }
    }

    #[test]
    fn keyword_only_reports_mock() {
        let engine = RetrievalEngine::keyword_only(sample());
        let status = engine.status();
        assert_eq!(status.status, ResourceStatus::Mock);
        assert_eq!(status.chunks, 4);
        let hits = engine.retrieve("chest_xray pneumonia", 3);
        assert!(hits[0].starts_with("## Pneumonia"));
    }

    #[test]
    fn semantic_path_used_when_embedder_loads() {
        let engine = RetrievalEngine::with_embedder(sample(), hashing);
        assert_eq!(engine.status().status, ResourceStatus::NotLoaded);
        let hits = engine.retrieve("fundus retinopathy grading", 3);
        assert!(hits[0].starts_with("## Retinopathy"));
        assert_eq!(engine.status().status, ResourceStatus::Loaded);
    }

    #[test]
    fn embedder_load_failure_falls_back_to_keyword() {
        let engine = RetrievalEngine::with_embedder(sample(), || {
            Err(StorageError::ModelNotFound(PathBuf::from("/nowhere/model.onnx")))
        });
        let hits = engine.retrieve("melanoma", 3);
        assert_eq!(hits.len(), 1);
        assert!(hits[0].starts_with("## Melanoma"));
        assert_eq!(engine.status().status, ResourceStatus::Failed);
        assert!(engine.status().detail.is_some());
    }

    #[test]
    fn query_embedding_failure_falls_back_to_keyword() {
        let engine = RetrievalEngine::with_embedder(sample(), failing);
        let hits = engine.retrieve("cardiomegaly", 3);
        assert!(hits[0].starts_with("## Cardiomegaly"));
    }

    #[test]
    fn no_semantic_hit_falls_back_to_first_k() {
        let engine = RetrievalEngine::with_embedder(sample(), hashing);
        let hits = engine.retrieve("of an", 2);
        assert_eq!(hits.len(), 2);
        assert!(hits[0].starts_with("## Melanoma"));
    }

    #[test]
    fn empty_corpus_returns_empty() {
        let engine = RetrievalEngine::with_embedder(Vec::new(), hashing);
        assert!(engine.retrieve("melanoma", 3).is_empty());
        // Index never built for an empty corpus.
        assert_eq!(engine.status().status, ResourceStatus::NotLoaded);
    }

    #[test]
    fn from_dir_missing_corpus_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let engine = RetrievalEngine::from_dir(&dir.path().join("missing"), dir.path(), true);
        assert_eq!(engine.chunk_count(), 0);
        assert!(engine.retrieve("anything", 3).is_empty());
    }

    #[test]
    fn from_dir_loads_markdown() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("skin.md"),
            "# Skin lesions\nDermoscopy guided triage of pigmented lesions.\n## Melanoma\nUrgent excision and staging workup.",
        )
        .unwrap();
        let engine = RetrievalEngine::from_dir(dir.path(), dir.path(), true);
        assert_eq!(engine.chunk_count(), 2);
        assert!(engine.retrieve("melanoma", 1)[0].starts_with("## Melanoma"));
    }

    #[test]
    fn never_exceeds_k() {
        let engine = RetrievalEngine::keyword_only(sample());
        assert!(engine.retrieve("chest fundus melanoma cardiomegaly", 2).len() <= 2);
        assert!(engine.retrieve("melanoma", 0).is_empty());
    }

    #[test]
    fn bundled_corpus_answers_guideline_queries() {
        let dir = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("knowledge");
        let engine = RetrievalEngine::from_dir(&dir, &dir, true);
        assert!(engine.chunk_count() > 10);

        let hits = engine.retrieve("skin_lesion melanoma", DEFAULT_TOP_K);
        assert_eq!(hits.len(), DEFAULT_TOP_K);
        assert!(hits[0].starts_with("## Melanoma"));

        let hits = engine.retrieve("chest_xray cardiomegaly", DEFAULT_TOP_K);
        assert!(hits[0].starts_with("## Cardiomegaly"));
    }
}
