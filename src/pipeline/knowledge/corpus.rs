use std::path::Path;

use serde::Serialize;

use super::{split_sections, StorageError};

/// One header-delimited section of a guideline document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KnowledgeChunk {
    pub text: String,
    /// File name of the document the chunk came from.
    pub source: String,
}

/// Load every `*.md` document under `dir`, in file-name order, as chunks.
pub fn load_corpus(dir: &Path) -> Result<Vec<KnowledgeChunk>, StorageError> {
    if !dir.is_dir() {
        return Err(StorageError::CorpusNotFound(dir.to_path_buf()));
    }

    let mut paths = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == "md") {
            paths.push(path);
        }
    }
    paths.sort();

    let mut chunks = Vec::new();
    for path in &paths {
        let content = std::fs::read_to_string(path)?;
        let source = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let before = chunks.len();
        chunks.extend(split_sections(&content).into_iter().map(|text| KnowledgeChunk {
            text,
            source: source.clone(),
        }));
        tracing::debug!(source = %source, chunks = chunks.len() - before, "Guideline document loaded");
    }

    tracing::info!(
        documents = paths.len(),
        chunks = chunks.len(),
        dir = %dir.display(),
        "Knowledge corpus loaded"
    );
    Ok(chunks)
}
