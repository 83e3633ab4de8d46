//! Article read handlers.

use axum::extract::{Path, Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use vsum_models::utils::is_valid_youtube_id;
use vsum_models::ArticleRecord;

use crate::error::{ApiError, ApiResult};
use crate::handlers::summary::parse_language;
use crate::state::AppState;

const DEFAULT_LIMIT: usize = 20;
const MAX_LIMIT: usize = 100;

#[derive(Debug, Deserialize)]
pub struct ListArticlesQuery {
    pub lang: Option<String>,
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct ArticlesResponse {
    pub articles: Vec<ArticleRecord>,
    pub count: usize,
}

/// Most recently updated articles, newest first.
///
/// With `lang`, only records whose summary in that language is completed.
pub async fn list_articles(
    State(state): State<AppState>,
    Query(query): Query<ListArticlesQuery>,
) -> ApiResult<Json<ArticlesResponse>> {
    let limit = query.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);
    let lang = match query.lang.as_deref() {
        Some(code) => Some(parse_language(Some(code))?),
        None => None,
    };

    let mut articles = state.store.list_recent(limit).await?;
    if let Some(lang) = lang {
        articles.retain(|record| record.is_completed(lang));
    }

    Ok(Json(ArticlesResponse {
        count: articles.len(),
        articles,
    }))
}

/// The durable record of one video.
pub async fn get_article(
    State(state): State<AppState>,
    Path(video_id): Path<String>,
) -> ApiResult<Json<ArticleRecord>> {
    if !is_valid_youtube_id(&video_id) {
        return Err(ApiError::bad_request("Invalid video ID format"));
    }

    state
        .store
        .get(&video_id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found(format!("article {} not found", video_id)))
}
