//! Summary creation handler.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use serde::Deserialize;
use tracing::{info, warn};

use vsum_models::{extract_youtube_id, Language, SummaryBody};

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// Body of `POST /summary`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryRequest {
    /// Bare id or any accepted YouTube URL form.
    pub video_id: Option<String>,
    #[serde(alias = "lang")]
    pub language: Option<String>,
}

/// Resolve an optional language code, defaulting to English.
pub(crate) fn parse_language(code: Option<&str>) -> ApiResult<Language> {
    match code {
        None => Ok(Language::En),
        Some(code) => code
            .parse()
            .map_err(|e: vsum_models::LanguageError| ApiError::bad_request(e.to_string())),
    }
}

/// Resolve a required video id field to its normalised 11-char form.
pub(crate) fn parse_video_id(raw: Option<&str>) -> ApiResult<String> {
    let raw = raw
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| ApiError::bad_request("videoId is required"))?;
    extract_youtube_id(raw).map_err(|e| ApiError::bad_request(e.to_string()))
}

/// Summarize a video, or report the running job when one is in flight.
pub async fn create_summary(
    State(state): State<AppState>,
    body: Result<Json<SummaryRequest>, JsonRejection>,
) -> ApiResult<Json<SummaryBody>> {
    let Json(request) = body.map_err(|e| ApiError::bad_request(e.body_text()))?;

    let video_id = parse_video_id(request.video_id.as_deref())?;
    let lang = parse_language(request.language.as_deref())?;

    let run = state.orchestrator.run(&video_id, lang);
    let output = match tokio::time::timeout(state.config.pipeline_timeout, run).await {
        Ok(result) => result?,
        Err(_) => {
            warn!(video_id = %video_id, lang = %lang, "Summary exceeded pipeline budget");
            return Err(ApiError::Timeout);
        }
    };

    info!(
        video_id = %video_id,
        lang = %lang,
        cached = output.cached,
        "Summary served"
    );
    Ok(Json(output.summary))
}
