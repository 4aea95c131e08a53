use std::collections::HashSet;
use std::sync::Arc;

use super::Retriever;
use crate::pipeline::knowledge::{KnowledgeChunk, StorageError};

/// Query tokens this short or shorter never count.
const MIN_TOKEN_CHARS: usize = 3;

/// Token-overlap retrieval. No model, never fails.
pub struct KeywordRetriever {
    chunks: Arc<Vec<KnowledgeChunk>>,
    lowered: Vec<String>,
}

impl KeywordRetriever {
    pub fn new(chunks: Arc<Vec<KnowledgeChunk>>) -> Self {
        let lowered = chunks.iter().map(|c| c.text.to_lowercase()).collect();
        Self { chunks, lowered }
    }

    /// Top-k chunks by number of query tokens they contain.
    /// With no match at all, the first k chunks of the corpus.
    pub fn rank(&self, query: &str, k: usize) -> Vec<String> {
        let query = query.to_lowercase();
        let tokens: HashSet<&str> = query
            .split_whitespace()
            .filter(|t| t.chars().count() >= MIN_TOKEN_CHARS)
            .collect();

        let mut scored: Vec<(usize, usize)> = self
            .lowered
            .iter()
            .enumerate()
            .map(|(i, text)| (tokens.iter().filter(|t| text.contains(**t)).count(), i))
            .filter(|(score, _)| *score > 0)
            .collect();
        // Stable: equal scores keep corpus order.
        scored.sort_by(|a, b| b.0.cmp(&a.0));

        if scored.is_empty() {
            return self.chunks.iter().take(k).map(|c| c.text.clone()).collect();
        }
        scored
            .into_iter()
            .take(k)
            .map(|(_, i)| self.chunks[i].text.clone())
            .collect()
    }
}

impl Retriever for KeywordRetriever {
    fn name(&self) -> &'static str {
        "keyword"
    }

    fn search(&self, query: &str, k: usize) -> Result<Vec<String>, StorageError> {
        Ok(self.rank(query, k))
    }
}
