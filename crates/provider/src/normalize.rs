//! Mapping from raw provider responses to the canonical status shape.
//!
//! The provider's status vocabulary, progress scale, and result location all
//! vary across tiers and model versions. Everything schema-dependent is kept
//! in this module: a fixed status table, one progress rule, and an explicit
//! ordered list of result-extraction probes per tier (first present wins).

use serde_json::Value;

use meshrelay_core::{AssetInfo, JobStatus, NormalizedStatus, ProviderTier};

/// Provider vocabulary → canonical vocabulary. Unknown strings map to
/// `Running` so an unrecognized in-flight state keeps the caller polling.
fn map_status(raw: &str) -> JobStatus {
    match raw.to_ascii_lowercase().as_str() {
        "queued" => JobStatus::Queued,
        "running" => JobStatus::Running,
        "success" => JobStatus::Succeeded,
        "failed" => JobStatus::Failed,
        "timeout" => JobStatus::Timeout,
        _ => JobStatus::Running,
    }
}

/// Clamp a provider-supplied progress value onto `[0, 1]`.
///
/// The provider reports progress as either 0–1 or 0–100 depending on tier and
/// model version; values above 1 are taken to be percentages.
fn normalize_progress(raw: Option<f64>, status: JobStatus) -> f32 {
    let raw = raw.unwrap_or(if status == JobStatus::Succeeded {
        100.0
    } else {
        0.0
    });
    let scaled = if raw > 1.0 { raw / 100.0 } else { raw };
    scaled.clamp(0.0, 1.0) as f32
}

/// Human-readable status line for the polling client.
pub fn status_message(status: JobStatus, progress: f32) -> String {
    match status {
        JobStatus::Queued => "Job in queue...".to_string(),
        JobStatus::Running => format!("Generating mesh... {}%", (progress * 100.0).round()),
        JobStatus::Succeeded => "Mesh generation complete".to_string(),
        JobStatus::Failed => "Generation failed".to_string(),
        JobStatus::Timeout => "Job timed out".to_string(),
    }
}

/// Known locations of the result model URL, in priority order.
///
/// The primary tier has shipped several response shapes over time; the
/// secondary tier reports the textured (pbr) output first. Keep these lists
/// separate so a shape change on one tier never touches the other.
const PRIMARY_RESULT_PATHS: &[&[&str]] = &[
    &["data", "result", "pbr_model", "url"],
    &["data", "output", "pbr_model"],
    &["data", "result", "model"],
    &["data", "output", "model"],
    &["data", "model"],
    &["output", "model"],
];

const SECONDARY_RESULT_PATHS: &[&[&str]] = &[
    &["data", "output", "pbr_model"],
    &["data", "result", "pbr_model", "url"],
    &["data", "result", "pbr_model", "glb"],
    &["data", "result", "model"],
    &["data", "output", "model"],
];

/// Alternate-format output (USDZ export), present when the provider produced
/// more than one format. Same tier/version caveats as the model paths.
const SECONDARY_FORMAT_PATHS: &[&[&str]] = &[
    &["data", "result", "pbr_model", "usdz"],
    &["data", "output", "usdz_model"],
    &["data", "output", "usdz"],
];

const TASK_ID_PATHS: &[&[&str]] = &[&["data", "task_id"], &["task_id"]];

fn probe<'a>(body: &'a Value, path: &[&str]) -> Option<&'a str> {
    let mut current = body;
    for key in path {
        current = current.get(key)?;
    }
    current.as_str()
}

fn first_present<'a>(body: &'a Value, paths: &[&[&str]]) -> Option<&'a str> {
    paths.iter().find_map(|path| probe(body, path))
}

/// Map a raw provider status body onto [`NormalizedStatus`].
///
/// `fallback_task_id` is used when the body carries no task id of its own
/// (some tiers omit it on status reads).
pub fn normalize_response(
    tier: ProviderTier,
    body: &Value,
    fallback_task_id: &str,
) -> NormalizedStatus {
    let raw_status = first_present(body, &[&["data", "status"], &["status"]]).unwrap_or("running");
    let status = map_status(raw_status);

    let raw_progress = body
        .pointer("/data/progress")
        .or_else(|| body.get("progress"))
        .and_then(Value::as_f64);
    let progress = normalize_progress(raw_progress, status);

    let asset = if status == JobStatus::Succeeded {
        let paths = match tier {
            ProviderTier::Primary => PRIMARY_RESULT_PATHS,
            ProviderTier::Secondary => SECONDARY_RESULT_PATHS,
        };
        match first_present(body, paths) {
            Some(url) => Some(AssetInfo {
                url: url.to_string(),
                format: "glb".to_string(),
                size_bytes: 0,
                secondary_format_url: first_present(body, SECONDARY_FORMAT_PATHS)
                    .map(str::to_string),
            }),
            None => {
                tracing::warn!(?tier, "succeeded response carried no model url");
                None
            }
        }
    } else {
        None
    };

    let error = first_present(body, &[&["data", "error"], &["error"]]).map(str::to_string);

    NormalizedStatus {
        task_id: first_present(body, TASK_ID_PATHS)
            .unwrap_or(fallback_task_id)
            .to_string(),
        status,
        progress,
        message: status_message(status, progress),
        asset,
        error,
    }
}

/// Pull the task id out of a submission/conversion response.
pub fn extract_task_id(body: &Value) -> Option<String> {
    first_present(body, TASK_ID_PATHS).map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn status_table_is_case_insensitive_and_defaults_to_running() {
        assert_eq!(map_status("queued"), JobStatus::Queued);
        assert_eq!(map_status("QUEUED"), JobStatus::Queued);
        assert_eq!(map_status("Success"), JobStatus::Succeeded);
        assert_eq!(map_status("failed"), JobStatus::Failed);
        assert_eq!(map_status("timeout"), JobStatus::Timeout);
        assert_eq!(map_status("banana"), JobStatus::Running);
    }

    #[test]
    fn progress_handles_both_scales() {
        let cases = [
            (0.0, 0.0),
            (50.0, 0.5),
            (100.0, 1.0),
            (1.0, 1.0),
            (0.5, 0.5),
        ];
        for (raw, expected) in cases {
            assert_eq!(
                normalize_progress(Some(raw), JobStatus::Running),
                expected,
                "raw={raw}"
            );
        }
    }

    #[test]
    fn missing_progress_defaults_by_status() {
        assert_eq!(normalize_progress(None, JobStatus::Queued), 0.0);
        assert_eq!(normalize_progress(None, JobStatus::Succeeded), 1.0);
    }

    #[test]
    fn progress_is_clamped() {
        assert_eq!(normalize_progress(Some(250.0), JobStatus::Running), 1.0);
        assert_eq!(normalize_progress(Some(-3.0), JobStatus::Running), 0.0);
    }

    #[test]
    fn first_present_extraction_wins_over_later_paths() {
        let body = json!({
            "data": {
                "status": "success",
                "task_id": "t-1",
                "result": { "pbr_model": { "url": "https://cdn/pbr.glb" } },
                "output": { "model": "https://cdn/other.glb" },
            }
        });
        let normalized = normalize_response(ProviderTier::Primary, &body, "t-1");
        assert_eq!(normalized.asset.unwrap().url, "https://cdn/pbr.glb");
    }

    #[test]
    fn legacy_flat_shape_still_extracts() {
        let body = json!({
            "task_id": "t-2",
            "status": "success",
            "output": { "model": "https://cdn/legacy.glb" },
        });
        let normalized = normalize_response(ProviderTier::Primary, &body, "t-2");
        assert_eq!(normalized.task_id, "t-2");
        assert_eq!(normalized.asset.unwrap().url, "https://cdn/legacy.glb");
    }

    #[test]
    fn secondary_tier_prefers_pbr_output() {
        let body = json!({
            "data": {
                "status": "success",
                "task_id": "t-3",
                "output": { "pbr_model": "https://cdn/pbr.glb", "model": "https://cdn/base.glb" },
            }
        });
        let normalized = normalize_response(ProviderTier::Secondary, &body, "t-3");
        assert_eq!(normalized.asset.unwrap().url, "https://cdn/pbr.glb");
    }

    #[test]
    fn secondary_format_url_is_surfaced_when_present() {
        let body = json!({
            "data": {
                "status": "success",
                "task_id": "t-9",
                "result": { "pbr_model": { "url": "https://cdn/m.glb", "usdz": "https://cdn/m.usdz" } },
            }
        });
        let asset = normalize_response(ProviderTier::Primary, &body, "t-9")
            .asset
            .unwrap();
        assert_eq!(asset.url, "https://cdn/m.glb");
        assert_eq!(asset.secondary_format_url.as_deref(), Some("https://cdn/m.usdz"));
    }

    #[test]
    fn succeeded_without_a_model_url_has_no_asset() {
        let body = json!({ "data": { "status": "success", "task_id": "t-4" } });
        let normalized = normalize_response(ProviderTier::Primary, &body, "t-4");
        assert_eq!(normalized.status, JobStatus::Succeeded);
        assert!(normalized.asset.is_none());
        assert_eq!(normalized.progress, 1.0);
    }

    #[test]
    fn queued_response_carries_message_and_fallback_task_id() {
        let body = json!({ "data": { "status": "queued", "progress": 0 } });
        let normalized = normalize_response(ProviderTier::Primary, &body, "t-5");
        assert_eq!(normalized.task_id, "t-5");
        assert_eq!(normalized.status, JobStatus::Queued);
        assert_eq!(normalized.message, "Job in queue...");
        assert!(normalized.error.is_none());
    }

    #[test]
    fn running_message_includes_rounded_percentage() {
        let body = json!({ "data": { "status": "running", "progress": 42 } });
        let normalized = normalize_response(ProviderTier::Primary, &body, "t-6");
        assert_eq!(normalized.message, "Generating mesh... 42%");
    }

    #[test]
    fn provider_error_strings_are_surfaced() {
        let body = json!({ "data": { "status": "failed", "error": "bad input" } });
        let normalized = normalize_response(ProviderTier::Primary, &body, "t-7");
        assert_eq!(normalized.status, JobStatus::Failed);
        assert_eq!(normalized.error.as_deref(), Some("bad input"));
    }

    #[test]
    fn submission_task_id_probes_nested_then_flat() {
        assert_eq!(
            extract_task_id(&json!({ "data": { "task_id": "nested" }, "task_id": "flat" })),
            Some("nested".to_string())
        );
        assert_eq!(
            extract_task_id(&json!({ "task_id": "flat" })),
            Some("flat".to_string())
        );
        assert_eq!(extract_task_id(&json!({})), None);
    }
}
