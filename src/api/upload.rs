//! Multipart image upload: size and MIME checks, then decode.
//!
//! Size and MIME are checked on the async side. Decoding is CPU work and runs
//! inside the blocking pipeline closure.

use axum::body::Bytes;
use axum::extract::Multipart;
use axum::http::StatusCode;
use image::{DynamicImage, ImageFormat};

use crate::api::error::ApiError;
use crate::config::MAX_IMAGE_BYTES;

const FILE_FIELD: &str = "file";
const OCTET_STREAM: &str = "application/octet-stream";

/// An accepted but not yet decoded upload.
#[derive(Debug)]
pub struct ImageUpload {
    pub filename: String,
    pub bytes: Bytes,
}

impl ImageUpload {
    pub fn decode(&self) -> Result<DynamicImage, ApiError> {
        image::load_from_memory(&self.bytes).map_err(|e| ApiError::InvalidImage(e.to_string()))
    }
}

/// Pull the `file` field out of a multipart body and validate it.
pub async fn read_image(mut multipart: Multipart) -> Result<ImageUpload, ApiError> {
    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => return Err(ApiError::BadRequest("Missing multipart field 'file'".into())),
            Err(e) => return Err(multipart_error(e)),
        };
        if field.name() != Some(FILE_FIELD) {
            continue;
        }

        let filename = field.file_name().unwrap_or("").to_string();
        let declared = field.content_type().map(str::to_string);
        let bytes = field.bytes().await.map_err(multipart_error)?;

        if bytes.len() > MAX_IMAGE_BYTES {
            return Err(ApiError::PayloadTooLarge(bytes.len()));
        }
        let mime = resolve_mime(declared.as_deref(), &filename, &bytes);
        if !mime.starts_with("image/") {
            return Err(ApiError::UnsupportedMediaType(mime));
        }

        tracing::debug!(filename = %filename, mime = %mime, size = bytes.len(), "Image upload received");
        return Ok(ImageUpload { filename, bytes });
    }
}

fn multipart_error(e: axum::extract::multipart::MultipartError) -> ApiError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::PayloadTooLarge(MAX_IMAGE_BYTES + 1)
    } else {
        ApiError::BadRequest(e.body_text())
    }
}

/// Declared content type first, then the file extension, then magic bytes.
pub fn resolve_mime(declared: Option<&str>, filename: &str, bytes: &[u8]) -> String {
    if let Some(declared) = declared.filter(|m| !m.is_empty() && *m != OCTET_STREAM) {
        return declared.to_ascii_lowercase();
    }
    if let Some(guess) = mime_guess::from_path(filename).first() {
        return guess.essence_str().to_string();
    }
    let sniffed = match image::guess_format(bytes) {
        Ok(ImageFormat::Png) => "image/png",
        Ok(ImageFormat::Jpeg) => "image/jpeg",
        Ok(ImageFormat::Tiff) => "image/tiff",
        Ok(ImageFormat::Gif) => "image/gif",
        Ok(ImageFormat::Bmp) => "image/bmp",
        Ok(ImageFormat::WebP) => "image/webp",
        _ => OCTET_STREAM,
    };
    sniffed.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::GenericImageView;

    fn png_bytes() -> Vec<u8> {
        let mut out = Vec::new();
        DynamicImage::new_rgb8(4, 4)
            .write_to(&mut out, image::ImageOutputFormat::Png)
            .unwrap();
        out
    }

    #[test]
    fn declared_type_wins() {
        assert_eq!(resolve_mime(Some("image/PNG"), "x.txt", b""), "image/png");
        assert_eq!(resolve_mime(Some("text/plain"), "x.png", b""), "text/plain");
    }

    #[test]
    fn octet_stream_falls_back_to_extension() {
        assert_eq!(resolve_mime(Some(OCTET_STREAM), "scan.jpg", b""), "image/jpeg");
        assert_eq!(resolve_mime(None, "notes.pdf", b""), "application/pdf");
    }

    #[test]
    fn magic_bytes_last_resort() {
        assert_eq!(resolve_mime(None, "blob", &png_bytes()), "image/png");
        assert_eq!(resolve_mime(None, "blob", b"hello"), OCTET_STREAM);
    }

    #[test]
    fn decode_valid_and_corrupt() {
        let upload = ImageUpload {
            filename: "a.png".into(),
            bytes: Bytes::from(png_bytes()),
        };
        assert_eq!(upload.decode().unwrap().width(), 4);

        let corrupt = ImageUpload {
            filename: "a.png".into(),
            bytes: Bytes::from_static(b"\x89PNG\r\n\x1a\nnot really"),
        };
        assert!(matches!(corrupt.decode(), Err(ApiError::InvalidImage(_))));
    }
}
