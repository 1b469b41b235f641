//! Consistent JSON error responses.

use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use meshrelay_core::ImageError;
use meshrelay_orchestrator::StatusError;
use meshrelay_provider::ProviderError;

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}

/// Validation failures are surfaced immediately with an actionable message.
pub fn image_error_to_response(err: ImageError) -> axum::response::Response {
    let code = match err {
        ImageError::Invalid => "invalid_image",
        ImageError::TooLarge { .. } => "image_too_large",
    };
    json_error(StatusCode::BAD_REQUEST, code, err.to_string())
}

/// Upstream failures at job-creation time are hard failures; quota exhaustion
/// gets its own status so callers can branch on it.
pub fn provider_error_to_response(err: ProviderError) -> axum::response::Response {
    match err {
        ProviderError::Rejected { quota: true, .. } => json_error(
            StatusCode::PAYMENT_REQUIRED,
            "quota_exceeded",
            "Quota/credits exceeded",
        ),
        ProviderError::Rejected { detail, .. } => {
            json_error(StatusCode::BAD_GATEWAY, "provider_rejected", detail)
        }
        ProviderError::Upload(detail) => json_error(StatusCode::BAD_GATEWAY, "upload_failed", detail),
        ProviderError::NotFound => json_error(
            StatusCode::NOT_FOUND,
            "not_found",
            "Unknown task id (expired or never existed)",
        ),
        ProviderError::Provider(detail) => {
            json_error(StatusCode::BAD_GATEWAY, "provider_error", detail)
        }
    }
}

pub fn status_error_to_response(err: StatusError) -> axum::response::Response {
    match err {
        StatusError::NotFound => json_error(
            StatusCode::NOT_FOUND,
            "not_found",
            "Unknown job id (expired or never existed)",
        ),
        StatusError::Provider(e) => provider_error_to_response(e),
    }
}
