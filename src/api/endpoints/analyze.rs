//! `POST /api/analyze`: one image, no session.

use axum::extract::multipart::MultipartRejection;
use axum::extract::{Multipart, State};
use axum::Json;

use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::api::upload::read_image;
use crate::pipeline::processor::{Analysis, ScreeningProcessor};

pub async fn analyze(
    State(ctx): State<ApiContext>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<Analysis>, ApiError> {
    let upload = read_image(multipart?).await?;

    let analysis = ctx
        .blocking(move |core| -> Result<Analysis, ApiError> {
            let image = upload.decode()?;
            Ok(ScreeningProcessor::new(core).analyze(&image, &upload.filename))
        })
        .await??;

    Ok(Json(analysis))
}
