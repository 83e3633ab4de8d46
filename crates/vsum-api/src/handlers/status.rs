//! Job status polling handler.

use axum::extract::{Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use vsum_models::{JobMetadata, JobState, LifecycleStatus, VideoKey};

use crate::error::{ApiError, ApiResult};
use crate::handlers::summary::{parse_language, parse_video_id};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct StatusQuery {
    #[serde(rename = "videoId")]
    pub video_id: Option<String>,
    pub lang: Option<String>,
}

/// Progress of a live job.
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub status: LifecycleStatus,
    pub metadata: JobMetadata,
}

impl From<JobState> for StatusResponse {
    fn from(state: JobState) -> Self {
        Self {
            status: state.status,
            metadata: state.metadata,
        }
    }
}

/// Poll a job; 404 once it has expired or was never admitted.
pub async fn get_status(
    State(state): State<AppState>,
    Query(query): Query<StatusQuery>,
) -> ApiResult<Json<StatusResponse>> {
    let video_id = parse_video_id(query.video_id.as_deref())?;
    let lang = parse_language(query.lang.as_deref())?;
    let key = VideoKey::new(video_id, lang);

    state
        .coordinator
        .get(&key)
        .map(|job| Json(job.into()))
        .ok_or_else(|| ApiError::not_found(format!("no job for {}", key)))
}
