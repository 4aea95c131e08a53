//! Screening session endpoints.

use axum::extract::multipart::MultipartRejection;
use axum::extract::{Multipart, Path, State};
use axum::Json;

use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::api::upload::read_image;
use crate::models::Session;
use crate::pipeline::processor::{ScreeningProcessor, SessionAnalysis};
use crate::pipeline::report::Report;

/// `POST /api/session/start`
pub async fn start(State(ctx): State<ApiContext>) -> Result<Json<Session>, ApiError> {
    Ok(Json(ctx.core.sessions.create()?))
}

/// `GET /api/session/:id`
pub async fn detail(
    State(ctx): State<ApiContext>,
    Path(id): Path<String>,
) -> Result<Json<Session>, ApiError> {
    Ok(Json(ctx.core.sessions.get(&id)?))
}

/// `POST /api/session/:id/analyze`
pub async fn analyze(
    State(ctx): State<ApiContext>,
    Path(id): Path<String>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<SessionAnalysis>, ApiError> {
    // Unknown session is a 404 before the upload is read.
    ctx.core.sessions.get(&id)?;
    let upload = read_image(multipart?).await?;

    let outcome = ctx
        .blocking(move |core| -> Result<SessionAnalysis, ApiError> {
            let image = upload.decode()?;
            Ok(ScreeningProcessor::new(core).analyze_for_session(&id, &image, &upload.filename)?)
        })
        .await??;

    Ok(Json(outcome))
}

/// `POST /api/session/:id/report`
pub async fn report(
    State(ctx): State<ApiContext>,
    Path(id): Path<String>,
) -> Result<Json<Report>, ApiError> {
    let report = ctx
        .blocking(move |core| ScreeningProcessor::new(core).report(&id))
        .await??;
    Ok(Json(report))
}
