//! Fine-tuned ViT image classifiers exported to ONNX.
//!
//! Model directory layout (HuggingFace export):
//! - `model.onnx`: `[1, 3, H, W]` pixels → `[1, num_labels]` logits
//! - `config.json`: `id2label` mapping
//! - `preprocessor_config.json` (optional): `image_mean`, `image_std`, `size`

use std::path::Path;
use std::sync::Mutex;

use image::DynamicImage;
use ort::session::Session;
use ort::value::TensorRef;
use serde_json::Value;

use super::classifier::ImageClassifier;
use super::ClassifierError;
use crate::pipeline::vision::{chw_tensor, PixelNorm, IMAGENET_NORM};

pub struct VitClassifier {
    session: Mutex<Session>,
    labels: Vec<String>,
    norm: PixelNorm,
}

impl VitClassifier {
    pub fn load(model_dir: &Path) -> Result<Self, ClassifierError> {
        let model_path = model_dir.join("model.onnx");
        let config_path = model_dir.join("config.json");
        if !model_path.exists() {
            return Err(ClassifierError::ModelNotFound(model_path));
        }
        if !config_path.exists() {
            return Err(ClassifierError::ModelNotFound(config_path));
        }

        let config: Value = serde_json::from_str(&std::fs::read_to_string(&config_path)?)
            .map_err(|e| ClassifierError::ModelInit(format!("config.json: {e}")))?;
        let labels = parse_id2label(&config)?;

        let preprocessor_path = model_dir.join("preprocessor_config.json");
        let norm = if preprocessor_path.exists() {
            let value: Value = serde_json::from_str(&std::fs::read_to_string(&preprocessor_path)?)
                .map_err(|e| ClassifierError::ModelInit(format!("preprocessor_config.json: {e}")))?;
            parse_pixel_norm(&value)
        } else {
            IMAGENET_NORM
        };

        let session = Session::builder()
            .map_err(|e: ort::Error| ClassifierError::ModelInit(e.to_string()))?
            .with_intra_threads(2)
            .map_err(|e: ort::Error| ClassifierError::ModelInit(e.to_string()))?
            .commit_from_file(&model_path)
            .map_err(|e: ort::Error| ClassifierError::ModelInit(format!("ONNX load failed: {e}")))?;

        tracing::info!(
            dir = %model_dir.display(),
            labels = labels.len(),
            input = norm.size,
            "ViT classifier loaded"
        );

        Ok(Self {
            session: Mutex::new(session),
            labels,
            norm,
        })
    }
}

impl ImageClassifier for VitClassifier {
    fn predict(&self, image: &DynamicImage) -> Result<Vec<(String, f32)>, ClassifierError> {
        let size = self.norm.size as usize;
        let pixels = ndarray::Array4::from_shape_vec((1, 3, size, size), chw_tensor(image, &self.norm))
            .map_err(|e| ClassifierError::Preprocess(e.to_string()))?;
        let tensor = TensorRef::from_array_view(&pixels)
            .map_err(|e| ClassifierError::Preprocess(e.to_string()))?;

        let mut session = self
            .session
            .lock()
            .map_err(|_| ClassifierError::Inference("Session lock poisoned".to_string()))?;
        let outputs = session
            .run(ort::inputs![tensor])
            .map_err(|e| ClassifierError::Inference(format!("ONNX inference failed: {e}")))?;
        let (_, logits) = outputs[0]
            .try_extract_tensor::<f32>()
            .map_err(|e| ClassifierError::Inference(format!("Output extraction: {e}")))?;

        let probs = softmax(logits);
        Ok(probs
            .into_iter()
            .enumerate()
            .map(|(i, p)| {
                let label = self
                    .labels
                    .get(i)
                    .cloned()
                    .unwrap_or_else(|| format!("class_{i}"));
                (label, p)
            })
            .collect())
    }
}

fn softmax(logits: &[f32]) -> Vec<f32> {
    let max = logits.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let exps: Vec<f32> = logits.iter().map(|l| (l - max).exp()).collect();
    let sum: f32 = exps.iter().sum();
    exps.into_iter().map(|e| e / sum).collect()
}

/// `{"id2label": {"0": "nv", "1": "mel"}}` → labels ordered by id.
fn parse_id2label(config: &Value) -> Result<Vec<String>, ClassifierError> {
    let map = config
        .get("id2label")
        .and_then(Value::as_object)
        .ok_or_else(|| ClassifierError::ModelInit("config.json has no id2label".to_string()))?;

    let mut pairs: Vec<(usize, String)> = map
        .iter()
        .filter_map(|(id, label)| Some((id.parse().ok()?, label.as_str()?.to_string())))
        .collect();
    pairs.sort_by_key(|(id, _)| *id);
    Ok(pairs.into_iter().map(|(_, label)| label).collect())
}

fn parse_pixel_norm(value: &Value) -> PixelNorm {
    let triple = |key: &str, default: [f32; 3]| -> [f32; 3] {
        value
            .get(key)
            .and_then(Value::as_array)
            .filter(|a| a.len() == 3)
            .and_then(|a| {
                let v: Option<Vec<f32>> = a.iter().map(|x| x.as_f64().map(|f| f as f32)).collect();
                v.map(|v| [v[0], v[1], v[2]])
            })
            .unwrap_or(default)
    };
    let size = match value.get("size") {
        Some(Value::Number(n)) => n.as_u64(),
        Some(Value::Object(o)) => o
            .get("height")
            .or_else(|| o.get("shortest_edge"))
            .and_then(Value::as_u64),
        _ => None,
    }
    .map(|s| s as u32)
    .unwrap_or(IMAGENET_NORM.size);

    PixelNorm {
        size,
        mean: triple("image_mean", IMAGENET_NORM.mean),
        std: triple("image_std", IMAGENET_NORM.std),
    }
}
