use image::DynamicImage;

use super::RoutingError;

/// CLIP logit scale applied to cosine similarities before the softmax.
pub const LOGIT_SCALE: f32 = 100.0;

/// Zero-shot image/text scorer in a shared embedding space.
pub trait ImageTextScorer: Send + Sync {
    /// Probability of each prompt describing `image`, soft-maxed across `prompts`.
    /// The result has exactly one entry per prompt.
    fn score(&self, image: &DynamicImage, prompts: &[&str]) -> Result<Vec<f32>, RoutingError>;
}

/// Softmax over `LOGIT_SCALE * similarity`.
pub fn scaled_softmax(similarities: &[f32]) -> Vec<f32> {
    let logits: Vec<f32> = similarities.iter().map(|s| s * LOGIT_SCALE).collect();
    let max = logits.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let exps: Vec<f32> = logits.iter().map(|l| (l - max).exp()).collect();
    let sum: f32 = exps.iter().sum();
    if sum > 0.0 && sum.is_finite() {
        exps.into_iter().map(|e| e / sum).collect()
    } else {
        vec![0.0; similarities.len()]
    }
}

/// Cosine similarity of two vectors. Zero when either is a zero vector.
pub fn cosine(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let na: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let nb: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if na > 0.0 && nb > 0.0 {
        dot / (na * nb)
    } else {
        0.0
    }
}
