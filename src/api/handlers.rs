use axum::Json;
use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

use super::error::{AppError, AppResult};
use super::state::AppState;
use crate::aggregator::HealthReport;
use crate::model::{ForumThreadSummary, ItemResponse, PatchNoteEntry};

/// GET / - liveness
pub async fn index() -> &'static str {
    "SkyBlock API is running."
}

#[derive(Debug, Deserialize)]
pub struct ItemQuery {
    pub identifier: Option<String>,
}

/// GET /api/item?identifier=
pub async fn get_item(
    State(state): State<Arc<AppState>>,
    query: Result<Query<ItemQuery>, QueryRejection>,
) -> AppResult<Json<ItemResponse>> {
    let Query(query) = query?;
    let identifier = query
        .identifier
        .filter(|s| !s.is_empty())
        .ok_or_else(|| AppError::BadRequest("Missing 'identifier' query parameter".into()))?;

    let item = state.items.get_item(&identifier).await?;
    Ok(Json(item))
}

#[derive(Debug, Deserialize)]
pub struct PatchNotesQuery {
    pub limit: Option<usize>,
    #[serde(default)]
    pub details: bool,
}

#[derive(Debug, Serialize)]
pub struct PatchNotesResponse {
    pub source: String,
    pub count: usize,
    pub patches: Vec<PatchNoteEntry>,
}

/// GET /api/patchnotes?limit=&details=
pub async fn get_patchnotes(
    State(state): State<Arc<AppState>>,
    query: Result<Query<PatchNotesQuery>, QueryRejection>,
) -> AppResult<Json<PatchNotesResponse>> {
    let Query(query) = query?;
    let scrape = &state.config.scrape;
    let limit = query.limit.unwrap_or(scrape.default_limit).clamp(1, scrape.max_limit.max(1));
    let source = state.config.patchnotes_url.clone();

    let patches = state.scraper.scrape(&source, limit, query.details).await?;
    info!("Serving {} patch notes", patches.len());
    Ok(Json(PatchNotesResponse {
        source,
        count: patches.len(),
        patches,
    }))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThreadSearchQuery {
    #[serde(default)]
    pub term: String,
    pub limit: Option<usize>,
    pub max_pages: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct ThreadSearchResponse {
    pub source: String,
    pub term: String,
    pub count: usize,
    pub threads: Vec<ForumThreadSummary>,
}

/// GET /api/patchnotes/search?term=&limit=&maxPages=
pub async fn search_patchnotes(
    State(state): State<Arc<AppState>>,
    query: Result<Query<ThreadSearchQuery>, QueryRejection>,
) -> AppResult<Json<ThreadSearchResponse>> {
    let Query(query) = query?;
    let scrape = &state.config.scrape;
    let limit = query.limit.unwrap_or(scrape.default_limit).clamp(1, scrape.max_limit.max(1));
    let max_pages = query.max_pages.unwrap_or(scrape.max_pages);

    let threads = state.scraper.search_threads(&query.term, limit, max_pages).await?;
    Ok(Json(ThreadSearchResponse {
        source: state.config.forum_url.clone(),
        term: query.term,
        count: threads.len(),
        threads,
    }))
}

/// GET /api/health
pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthReport> {
    Json(state.health.report().await)
}
