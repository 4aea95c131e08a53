//! CLIP ViT-B/32 zero-shot scorer on ONNX Runtime.
//!
//! Model directory layout:
//! - `visual.onnx`: `[1, 3, 224, 224]` pixels → `[1, D]` image embedding
//! - `textual.onnx`: `[1, 77]` token ids → `[1, D]` text embedding
//! - `tokenizer.json`: HuggingFace CLIP tokenizer

use std::collections::HashMap;
use std::path::Path;
use std::sync::Mutex;

use image::DynamicImage;
use ort::session::Session;
use ort::value::TensorRef;

use super::scorer::{cosine, scaled_softmax, ImageTextScorer};
use super::RoutingError;
use crate::pipeline::vision::{chw_tensor, CLIP_NORM};

/// CLIP text context length.
const CONTEXT_LENGTH: usize = 77;

pub struct ClipScorer {
    visual: Mutex<Session>,
    textual: Mutex<Session>,
    tokenizer: tokenizers::Tokenizer,
    /// Prompt embeddings never change; computed once per prompt.
    text_cache: Mutex<HashMap<String, Vec<f32>>>,
}

fn open_session(path: &Path) -> Result<Session, RoutingError> {
    if !path.exists() {
        return Err(RoutingError::ModelNotFound(path.to_path_buf()));
    }
    Session::builder()
        .map_err(|e: ort::Error| RoutingError::ModelInit(e.to_string()))?
        .with_intra_threads(2)
        .map_err(|e: ort::Error| RoutingError::ModelInit(e.to_string()))?
        .commit_from_file(path)
        .map_err(|e: ort::Error| RoutingError::ModelInit(format!("ONNX load failed: {e}")))
}

fn first_output(session: &mut Session, input: TensorRef<'_, f32>) -> Result<Vec<f32>, RoutingError> {
    let outputs = session
        .run(ort::inputs![input])
        .map_err(|e| RoutingError::Inference(format!("ONNX inference failed: {e}")))?;
    let (_, data) = outputs[0]
        .try_extract_tensor::<f32>()
        .map_err(|e| RoutingError::Inference(format!("Output extraction: {e}")))?;
    Ok(data.to_vec())
}

impl ClipScorer {
    pub fn load(model_dir: &Path) -> Result<Self, RoutingError> {
        let visual = open_session(&model_dir.join("visual.onnx"))?;
        let textual = open_session(&model_dir.join("textual.onnx"))?;

        let tokenizer_path = model_dir.join("tokenizer.json");
        if !tokenizer_path.exists() {
            return Err(RoutingError::ModelNotFound(tokenizer_path));
        }
        let tokenizer = tokenizers::Tokenizer::from_file(&tokenizer_path)
            .map_err(|e| RoutingError::ModelInit(format!("Tokenizer load failed: {e}")))?;

        tracing::info!(dir = %model_dir.display(), "CLIP scorer loaded");

        Ok(Self {
            visual: Mutex::new(visual),
            textual: Mutex::new(textual),
            tokenizer,
            text_cache: Mutex::new(HashMap::new()),
        })
    }

    fn embed_image(&self, image: &DynamicImage) -> Result<Vec<f32>, RoutingError> {
        let size = CLIP_NORM.size as usize;
        let pixels = ndarray::Array4::from_shape_vec((1, 3, size, size), chw_tensor(image, &CLIP_NORM))
            .map_err(|e| RoutingError::Preprocess(e.to_string()))?;
        let tensor = TensorRef::from_array_view(&pixels)
            .map_err(|e| RoutingError::Preprocess(e.to_string()))?;

        let mut session = self
            .visual
            .lock()
            .map_err(|_| RoutingError::Inference("Visual session lock poisoned".to_string()))?;
        first_output(&mut session, tensor)
    }

    fn embed_text(&self, prompt: &str) -> Result<Vec<f32>, RoutingError> {
        if let Some(hit) = self
            .text_cache
            .lock()
            .map_err(|_| RoutingError::Inference("Text cache lock poisoned".to_string()))?
            .get(prompt)
        {
            return Ok(hit.clone());
        }

        let encoding = self
            .tokenizer
            .encode(prompt, true)
            .map_err(|e| RoutingError::Tokenization(e.to_string()))?;
        let mut ids: Vec<i64> = encoding.get_ids().iter().map(|&id| id as i64).collect();
        ids.truncate(CONTEXT_LENGTH);
        ids.resize(CONTEXT_LENGTH, 0);

        let ids = ndarray::Array2::from_shape_vec((1, CONTEXT_LENGTH), ids)
            .map_err(|e| RoutingError::Tokenization(e.to_string()))?;
        let tensor = TensorRef::from_array_view(&ids)
            .map_err(|e| RoutingError::Tokenization(e.to_string()))?;

        let embedding = {
            let mut session = self
                .textual
                .lock()
                .map_err(|_| RoutingError::Inference("Text session lock poisoned".to_string()))?;
            let outputs = session
                .run(ort::inputs![tensor])
                .map_err(|e| RoutingError::Inference(format!("ONNX inference failed: {e}")))?;
            let (_, data) = outputs[0]
                .try_extract_tensor::<f32>()
                .map_err(|e| RoutingError::Inference(format!("Output extraction: {e}")))?;
            data.to_vec()
        };

        if let Ok(mut cache) = self.text_cache.lock() {
            cache.insert(prompt.to_string(), embedding.clone());
        }
        Ok(embedding)
    }
}

impl ImageTextScorer for ClipScorer {
    fn score(&self, image: &DynamicImage, prompts: &[&str]) -> Result<Vec<f32>, RoutingError> {
        let image_embedding = self.embed_image(image)?;
        let similarities = prompts
            .iter()
            .map(|p| Ok(cosine(&image_embedding, &self.embed_text(p)?)))
            .collect::<Result<Vec<f32>, RoutingError>>()?;
        Ok(scaled_softmax(&similarities))
    }
}
