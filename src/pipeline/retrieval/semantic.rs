use std::sync::Arc;
use std::time::Instant;

use super::embedder::{l2_normalize, EmbeddingModel};
use super::Retriever;
use crate::pipeline::knowledge::{KnowledgeChunk, StorageError};

/// Hits at or below this inner product are discarded.
pub const MIN_SEMANTIC_SCORE: f32 = 0.1;

/// Chunk embeddings computed once, searched by normalized inner product.
pub struct SemanticIndex {
    chunks: Arc<Vec<KnowledgeChunk>>,
    embeddings: Vec<Vec<f32>>,
    embedder: Box<dyn EmbeddingModel>,
}

impl SemanticIndex {
    /// Embed every chunk up front.
    pub fn build(
        embedder: Box<dyn EmbeddingModel>,
        chunks: Arc<Vec<KnowledgeChunk>>,
    ) -> Result<Self, StorageError> {
        let start = Instant::now();
        let texts: Vec<&str> = chunks.iter().map(|c| c.text.as_str()).collect();
        let mut embeddings = embedder.embed_batch(&texts)?;
        for vec in &mut embeddings {
            l2_normalize(vec);
        }
        tracing::info!(
            chunks = embeddings.len(),
            dimension = embedder.dimension(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Semantic index built"
        );
        Ok(Self {
            chunks,
            embeddings,
            embedder,
        })
    }

    pub fn len(&self) -> usize {
        self.embeddings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.embeddings.is_empty()
    }

    /// Scored hits above the floor, best first, at most k.
    pub fn scored(&self, query: &str, k: usize) -> Result<Vec<(f32, &KnowledgeChunk)>, StorageError> {
        let mut query_vec = self.embedder.embed(query)?;
        l2_normalize(&mut query_vec);

        let mut scored: Vec<(f32, &KnowledgeChunk)> = self
            .embeddings
            .iter()
            .zip(self.chunks.iter())
            .map(|(emb, chunk)| (dot(emb, &query_vec), chunk))
            .filter(|(score, _)| *score > MIN_SEMANTIC_SCORE)
            .collect();
        scored.sort_by(|a, b| b.0.total_cmp(&a.0));
        scored.truncate(k);
        Ok(scored)
    }
}

impl Retriever for SemanticIndex {
    fn name(&self) -> &'static str {
        "semantic"
    }

    fn search(&self, query: &str, k: usize) -> Result<Vec<String>, StorageError> {
        Ok(self
            .scored(query, k)?
            .into_iter()
            .map(|(_, chunk)| chunk.text.clone())
            .collect())
    }
}

fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}
