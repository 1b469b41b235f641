//! Mesh generation endpoints: create, poll, convert.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};

use meshrelay_core::{ImagePayload, JobStatus};

use crate::app::{dto, errors, services::AppServices};

pub fn router() -> Router {
    Router::new()
        .route("/", post(create_mesh))
        .route("/:id/status", get(get_status))
        .route("/:id/convert", post(convert_mesh))
}

/// POST /meshes
///
/// Validate the submitted image, create a primary-tier generation job, and
/// hand back the client-visible task id for polling.
pub async fn create_mesh(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<dto::CreateMeshRequest>,
) -> axum::response::Response {
    let Some(image) = body.image else {
        return errors::json_error(
            StatusCode::BAD_REQUEST,
            "invalid_image",
            "Missing or invalid image",
        );
    };

    let image = match ImagePayload::from_data_url(image, services.max_image_bytes) {
        Ok(image) => image,
        Err(e) => return errors::image_error_to_response(e),
    };

    match services
        .orchestrator
        .create_job(image, body.options.quality)
        .await
    {
        Ok(created) => (StatusCode::ACCEPTED, Json(created)).into_response(),
        Err(e) => {
            tracing::warn!(error = %e, "job creation failed");
            errors::provider_error_to_response(e)
        }
    }
}

/// GET /meshes/:id/status
pub async fn get_status(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    if id.trim().is_empty() {
        return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "Missing or invalid id");
    }

    match services.orchestrator.get_status(&id).await {
        Ok(report) => (StatusCode::OK, Json(report)).into_response(),
        Err(e) => errors::status_error_to_response(e),
    }
}

/// POST /meshes/:id/convert
///
/// Start a format-conversion job (USDZ by default) for a completed mesh.
/// Returns a new task id the caller polls like any other job.
pub async fn convert_mesh(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    Json(body): Json<dto::ConvertRequest>,
) -> axum::response::Response {
    let format = body.format.unwrap_or_else(|| "usdz".to_string());

    match services.orchestrator.convert_job(&id, &format).await {
        Ok(conversion_id) => (
            StatusCode::ACCEPTED,
            Json(serde_json::json!({
                "taskId": conversion_id,
                "status": JobStatus::Queued,
                "message": format!("{} conversion started", format.to_uppercase()),
            })),
        )
            .into_response(),
        Err(e) => {
            tracing::warn!(error = %e, id, "conversion request failed");
            errors::provider_error_to_response(e)
        }
    }
}
