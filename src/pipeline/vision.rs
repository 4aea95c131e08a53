//! Pixel preprocessing shared by the ONNX vision encoders.
//!
//! Shortest side resized to the model input, center-cropped square, scaled
//! to [0,1], then normalized per channel. Output layout is CHW, ready to be
//! reshaped to `[1, 3, size, size]`.

use image::imageops::{self, FilterType};
use image::DynamicImage;

/// Input geometry and channel statistics of a vision encoder.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PixelNorm {
    pub size: u32,
    pub mean: [f32; 3],
    pub std: [f32; 3],
}

/// OpenAI CLIP ViT-B/32 image preprocessing.
pub const CLIP_NORM: PixelNorm = PixelNorm {
    size: 224,
    mean: [0.481_454_66, 0.457_827_5, 0.408_210_73],
    std: [0.268_629_54, 0.261_302_6, 0.275_777_1],
};

/// ImageNet statistics used by the ViT classifiers.
pub const IMAGENET_NORM: PixelNorm = PixelNorm {
    size: 224,
    mean: [0.485, 0.456, 0.406],
    std: [0.229, 0.224, 0.225],
};

/// Normalized CHW float tensor data for `image`.
pub fn chw_tensor(image: &DynamicImage, norm: &PixelNorm) -> Vec<f32> {
    let rgb = image.to_rgb8();
    let (w, h) = rgb.dimensions();
    let size = norm.size;

    let scale = size as f32 / w.min(h).max(1) as f32;
    let new_w = ((w as f32 * scale).round() as u32).max(size);
    let new_h = ((h as f32 * scale).round() as u32).max(size);
    let resized = imageops::resize(&rgb, new_w, new_h, FilterType::Triangle);

    let x = (new_w - size) / 2;
    let y = (new_h - size) / 2;
    let cropped = imageops::crop_imm(&resized, x, y, size, size).to_image();

    let plane = (size * size) as usize;
    let mut data = vec![0.0f32; 3 * plane];
    for (px, py, pixel) in cropped.enumerate_pixels() {
        let offset = (py * size + px) as usize;
        for c in 0..3 {
            let value = pixel[c] as f32 / 255.0;
            data[c * plane + offset] = (value - norm.mean[c]) / norm.std[c];
        }
    }
    data
}
