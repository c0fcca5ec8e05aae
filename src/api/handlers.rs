//! Request handlers for the comparison service

use axum::{
    extract::{multipart::MultipartRejection, Multipart, State},
    response::Html,
    Json,
};
use std::sync::Arc;
use std::time::Instant;
use uuid::Uuid;

use crate::{
    error::{AppError, Result},
    AppState,
};

use super::responses::{CompareResponse, HealthResponse};
use super::uploads::{upload_suffix, TransientUpload};

/// Multipart field carrying the first image
pub const FIRST_FIELD: &str = "image1";
/// Multipart field carrying the second image
pub const SECOND_FIELD: &str = "image2";

const MISSING_IMAGES: &str = "Both images are required";

const INDEX_HTML: &str = include_str!("../../static/index.html");

/// Upload form
pub async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

/// Health check endpoint
pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let provider = state.comparer.provider();
    Json(HealthResponse {
        status: "ok".to_string(),
        version: crate::built_info::PKG_VERSION.to_string(),
        model: provider.name().to_string(),
        dimension: provider.dimension(),
        started_at: state.started_at,
    })
}

/// Compare the two uploaded images and report their similarity percentage
pub async fn compare_images(
    State(state): State<Arc<AppState>>,
    multipart: std::result::Result<Multipart, MultipartRejection>,
) -> Result<Json<CompareResponse>> {
    // A body that is not multipart carries no files at all
    let mut multipart = multipart.map_err(|rejection| {
        log::debug!("not a multipart upload: {}", rejection.body_text());
        AppError::MissingInput(MISSING_IMAGES.to_string())
    })?;
    let request_id = Uuid::new_v4();
    let started = Instant::now();
    let config = &state.config;
    let mut uploads: [Option<TransientUpload>; 2] = [None, None];

    while let Some(field) = multipart.next_field().await? {
        let slot = match field.name() {
            Some(FIRST_FIELD) => 0,
            Some(SECOND_FIELD) => 1,
            _ => continue,
        };
        // Plain form values are not uploads
        if field.file_name().is_none() {
            continue;
        }

        let file_name = field.file_name().map(str::to_owned);
        let content_type = field.content_type().map(str::to_owned);
        let data = field.bytes().await?;

        // Browsers send an empty part for a file input left blank
        if data.is_empty() {
            continue;
        }

        let suffix = upload_suffix(
            file_name.as_deref(),
            content_type.as_deref(),
            &config.allowed_extensions,
        )?;
        uploads[slot] = Some(TransientUpload::persist(&config.upload_dir, suffix, data).await?);
    }

    let [Some(first), Some(second)] = uploads else {
        return Err(AppError::MissingInput(MISSING_IMAGES.to_string()));
    };

    let result = state
        .comparer
        .compare_files(first.path(), second.path())
        .await;
    first.remove();
    second.remove();
    let score = result.map_err(|e| {
        log::warn!("[{}] comparison failed after {:?}", request_id, started.elapsed());
        e
    })?;

    log::info!(
        "[{}] similarity {:.2}% in {:?}",
        request_id,
        score.percent(),
        started.elapsed()
    );

    Ok(Json(CompareResponse {
        similarity: score.percent(),
    }))
}
