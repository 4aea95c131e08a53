use crate::pipeline::knowledge::StorageError;

/// Standard embedding dimension for all-MiniLM-L6-v2
pub const EMBEDDING_DIM: usize = 384;

/// Sentence embedding model abstraction
pub trait EmbeddingModel: Send + Sync {
    fn embed(&self, text: &str) -> Result<Vec<f32>, StorageError>;
    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, StorageError>;
    fn dimension(&self) -> usize;
}

/// In-place L2 normalization. Zero vectors are left as is.
pub fn l2_normalize(vec: &mut [f32]) {
    let norm: f32 = vec.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        for val in vec.iter_mut() {
            *val /= norm;
        }
    }
}

// ═══════════════════════════════════════════════════════════
// ONNX embedder (`onnx-models` feature)
// ═══════════════════════════════════════════════════════════

#[cfg(feature = "onnx-models")]
mod minilm {
    use std::path::{Path, PathBuf};
    use std::sync::Mutex;

    use ndarray::Array2;
    use ort::session::Session;
    use ort::value::TensorRef;
    use tokenizers::Tokenizer;

    use super::{l2_normalize, EmbeddingModel, StorageError, EMBEDDING_DIM};

    /// all-MiniLM-L6-v2 on ONNX Runtime: `model.onnx` + `tokenizer.json`.
    pub struct MiniLmEmbedder {
        // `Session::run` takes `&mut self`.
        session: Mutex<Session>,
        tokenizer: Tokenizer,
    }

    fn require(path: PathBuf) -> Result<PathBuf, StorageError> {
        if path.is_file() {
            Ok(path)
        } else {
            Err(StorageError::ModelNotFound(path))
        }
    }

    fn init_err(e: impl std::fmt::Display) -> StorageError {
        StorageError::ModelInit(e.to_string())
    }

    fn embed_err(e: impl std::fmt::Display) -> StorageError {
        StorageError::Embedding(e.to_string())
    }

    /// One `[1, seq_len]` i64 input row.
    fn row(values: &[u32]) -> Result<Array2<i64>, StorageError> {
        Array2::from_shape_vec((1, values.len()), values.iter().map(|&v| i64::from(v)).collect())
            .map_err(embed_err)
    }

    /// Average the token embeddings the attention mask keeps.
    fn mean_pool(hidden: &[f32], mask: &[u32]) -> Vec<f32> {
        let mut pooled = vec![0.0f32; EMBEDDING_DIM];
        let mut kept = 0.0f32;
        for (token, _) in hidden
            .chunks_exact(EMBEDDING_DIM)
            .zip(mask)
            .filter(|(_, m)| **m > 0)
        {
            kept += 1.0;
            for (acc, value) in pooled.iter_mut().zip(token) {
                *acc += value;
            }
        }
        if kept > 0.0 {
            pooled.iter_mut().for_each(|v| *v /= kept);
        }
        pooled
    }

    impl MiniLmEmbedder {
        pub fn load(model_dir: &Path) -> Result<Self, StorageError> {
            let model = require(model_dir.join("model.onnx"))?;
            let tokenizer = require(model_dir.join("tokenizer.json"))?;

            let session = Session::builder()
                .map_err(init_err)?
                .with_intra_threads(2)
                .map_err(init_err)?
                .commit_from_file(&model)
                .map_err(init_err)?;
            let tokenizer = Tokenizer::from_file(&tokenizer).map_err(init_err)?;

            tracing::info!(dir = %model_dir.display(), "Sentence embedder loaded");
            Ok(Self {
                session: Mutex::new(session),
                tokenizer,
            })
        }

        fn infer(&self, text: &str) -> Result<Vec<f32>, StorageError> {
            let encoding = self
                .tokenizer
                .encode(text, true)
                .map_err(|e| StorageError::Tokenization(e.to_string()))?;

            let ids = row(encoding.get_ids())?;
            let mask = row(encoding.get_attention_mask())?;
            let types = row(encoding.get_type_ids())?;

            let mut session = self
                .session
                .lock()
                .map_err(|_| StorageError::Embedding("embedder session lock poisoned".into()))?;
            let outputs = session
                .run(ort::inputs![
                    TensorRef::from_array_view(&ids).map_err(embed_err)?,
                    TensorRef::from_array_view(&mask).map_err(embed_err)?,
                    TensorRef::from_array_view(&types).map_err(embed_err)?
                ])
                .map_err(embed_err)?;

            let (shape, hidden) = outputs[0].try_extract_tensor::<f32>().map_err(embed_err)?;
            if shape.len() != 3 || shape[2] as usize != EMBEDDING_DIM {
                return Err(StorageError::Embedding(format!(
                    "expected [1, n, {EMBEDDING_DIM}] hidden states, got {shape:?}"
                )));
            }

            let mut pooled = mean_pool(hidden, encoding.get_attention_mask());
            l2_normalize(&mut pooled);
            Ok(pooled)
        }
    }

    impl EmbeddingModel for MiniLmEmbedder {
        fn embed(&self, text: &str) -> Result<Vec<f32>, StorageError> {
            self.infer(text)
        }

        fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, StorageError> {
            texts.iter().map(|t| self.infer(t)).collect()
        }

        fn dimension(&self) -> usize {
            EMBEDDING_DIM
        }
    }

}

#[cfg(feature = "onnx-models")]
pub use minilm::MiniLmEmbedder;

// ═══════════════════════════════════════════════════════════
// Hashing embedder
// ═══════════════════════════════════════════════════════════

/// Bag-of-words feature-hashing embedder.
///
/// No model files. Texts sharing words get a positive inner product, which
/// is enough to exercise the semantic path deterministically.
pub struct HashingEmbedder {
    dimension: usize,
}

impl HashingEmbedder {
    pub fn new() -> Self {
        Self {
            dimension: EMBEDDING_DIM,
        }
    }
}

impl Default for HashingEmbedder {
    fn default() -> Self {
        Self::new()
    }
}

impl EmbeddingModel for HashingEmbedder {
    fn embed(&self, text: &str) -> Result<Vec<f32>, StorageError> {
        Ok(hashed_vector(text, self.dimension))
    }

    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, StorageError> {
        Ok(texts
            .iter()
            .map(|t| hashed_vector(t, self.dimension))
            .collect())
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}

fn hashed_vector(text: &str, dim: usize) -> Vec<f32> {
    let mut vec = vec![0.0f32; dim];
    for word in text
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| w.chars().count() > 2)
    {
        let bucket = (fnv1a(&word.to_lowercase()) % dim as u64) as usize;
        vec[bucket] += 1.0;
    }
    l2_normalize(&mut vec);
    vec
}

fn fnv1a(word: &str) -> u64 {
    word.bytes().fold(0xcbf2_9ce4_8422_2325, |hash, byte| {
        (hash ^ byte as u64).wrapping_mul(0x0100_0000_01b3)
    })
}
