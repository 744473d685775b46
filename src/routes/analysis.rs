use axum::extract::{Multipart, Path, State};
use axum::http::StatusCode;
use axum::Json;
use garde::Validate;
use uuid::Uuid;

use crate::app_state::AppState;
use crate::db::queries;
use crate::models::analysis::AnalysisStatus;
use crate::models::api::{AnalysisStatusResponse, SubmitRequest, SubmitResponse};
use crate::services::queue::QueuedAnalysis;

/// Accepted upload extensions.
const ALLOWED_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "webp"];

/// POST /api/v1/analysis — Upload a product photo for analysis.
///
/// Returns 202 Accepted with the analysis id; the pipeline runs from the
/// queue worker. Poll GET /api/v1/analysis/{id} for the terminal state.
pub async fn submit_analysis(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<SubmitResponse>), StatusCode> {
    let mut image_data: Option<Vec<u8>> = None;
    let mut context: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|_| StatusCode::BAD_REQUEST)?
    {
        match field.name() {
            Some("image") => {
                if let Some((_, ext)) = field.file_name().and_then(|f| f.rsplit_once('.')) {
                    if !ALLOWED_EXTENSIONS.contains(&ext.to_lowercase().as_str()) {
                        return Err(StatusCode::UNSUPPORTED_MEDIA_TYPE);
                    }
                }
                let data = field.bytes().await.map_err(|_| StatusCode::BAD_REQUEST)?;
                image_data = Some(data.to_vec());
            }
            Some("context") => {
                let text = field.text().await.map_err(|_| StatusCode::BAD_REQUEST)?;
                if !text.is_empty() {
                    context = Some(text);
                }
            }
            _ => {}
        }
    }

    let image_data = image_data.ok_or(StatusCode::BAD_REQUEST)?;

    // Content sniffing; rejects anything that is not a decodable image
    let format = image::guess_format(&image_data).map_err(|_| StatusCode::UNSUPPORTED_MEDIA_TYPE)?;

    let request = SubmitRequest { context };
    request.validate().map_err(|_| StatusCode::BAD_REQUEST)?;

    // Encrypt and store the photo before anything is persisted about it
    let encrypted = state
        .encryption
        .encrypt(&image_data)
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    let image_key = format!("uploads/{}.enc", Uuid::new_v4());
    state
        .storage
        .upload(&image_key, &encrypted, "application/octet-stream")
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "photo upload failed");
            StatusCode::BAD_GATEWAY
        })?;

    tracing::debug!(image_key = %image_key, format = ?format, "photo stored");

    // Create the pending record before enqueueing: "accepted" is decoupled
    // from "processed", and the caller polls for the terminal state.
    let analysis = queries::create_analysis(&state.db, &image_key, request.context.as_deref())
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "failed to create analysis record");
            StatusCode::INTERNAL_SERVER_ERROR
        })?;

    let queued = QueuedAnalysis {
        analysis_id: analysis.id,
        image_key,
        context: analysis.context.clone(),
    };
    state.queue.enqueue(&queued).await.map_err(|e| {
        tracing::error!(analysis_id = %analysis.id, error = %e, "failed to enqueue analysis");
        StatusCode::INTERNAL_SERVER_ERROR
    })?;

    metrics::counter!("analysis_jobs_total").increment(1);

    tracing::info!(analysis_id = %analysis.id, "analysis submitted");

    Ok((
        StatusCode::ACCEPTED,
        Json(SubmitResponse {
            analysis_id: analysis.id,
            status: analysis.status.as_str().to_string(),
            message: "Product photo submitted for analysis".to_string(),
        }),
    ))
}

/// GET /api/v1/analysis/{analysis_id} — Check analysis status.
///
/// A pure read. Module results are returned only once the analysis
/// completed.
pub async fn get_analysis_status(
    State(state): State<AppState>,
    Path(analysis_id): Path<Uuid>,
) -> Result<Json<AnalysisStatusResponse>, StatusCode> {
    let analysis = queries::get_analysis(&state.db, analysis_id)
        .await
        .map_err(|e| {
            tracing::error!(analysis_id = %analysis_id, error = %e, "failed to load analysis");
            StatusCode::INTERNAL_SERVER_ERROR
        })?
        .ok_or(StatusCode::NOT_FOUND)?;

    let results = if analysis.status == AnalysisStatus::Completed {
        Some(
            queries::get_module_results(&state.db, analysis_id)
                .await
                .map_err(|e| {
                    tracing::error!(analysis_id = %analysis_id, error = %e, "failed to load module results");
                    StatusCode::INTERNAL_SERVER_ERROR
                })?,
        )
    } else {
        None
    };

    Ok(Json(AnalysisStatusResponse {
        analysis_id: analysis.id,
        status: analysis.status.as_str().to_string(),
        error: analysis.error,
        vision_result: analysis.vision_result,
        results,
    }))
}
