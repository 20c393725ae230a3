use axum::{extract::State, response::Json};
use serde::Serialize;
use serde_json::{json, Value};
use std::sync::Arc;

use crate::database::PostSummary;
use crate::error::AppError;
use crate::server::AppState;

#[derive(Debug, Serialize)]
pub struct PostsResponse {
    pub posts: Vec<PostSummary>,
    pub total: i64,
}

/// GET /api/health
pub async fn health(State(state): State<Arc<AppState>>) -> Result<Json<Value>, AppError> {
    // A cheap query proves the store is reachable, not just the process.
    let post_count = state.db.count_posts()?;
    Ok(Json(json!({ "status": "ok", "posts": post_count })))
}

/// GET /api/posts
///
/// Review-UI index: every post with its segment/override counts and whether
/// a job is parked awaiting review.
pub async fn list_posts(
    State(state): State<Arc<AppState>>,
) -> Result<Json<PostsResponse>, AppError> {
    let posts = state.db.list_posts()?;
    let total = posts.len() as i64;
    Ok(Json(PostsResponse { posts, total }))
}
