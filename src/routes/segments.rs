use axum::{
    extract::{Path, State},
    response::Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;

use crate::database::{OverrideRange, Post};
use crate::error::AppError;
use crate::segments::SegmentManager;
use crate::server::AppState;

#[derive(Debug, Deserialize)]
pub struct SegmentPayload {
    pub segments: Option<Vec<OverrideRange>>,
}

fn lookup_post(state: &AppState, guid: &str) -> Result<Post, AppError> {
    state
        .db
        .get_post_by_guid(guid)?
        .ok_or_else(AppError::post_not_found)
}

fn segment_manager(state: &AppState) -> SegmentManager {
    SegmentManager::new(state.db.clone(), state.removal_cache.clone())
}

/// Pull the `segments` list out of the request body, treating an absent or
/// non-JSON body the same as a body without the field.
fn require_segments(payload: Option<Json<SegmentPayload>>) -> Result<Vec<OverrideRange>, AppError> {
    payload
        .and_then(|Json(p)| p.segments)
        .ok_or_else(|| AppError::Validation("Missing segments field".to_string()))
}

/// GET /api/posts/:post_guid/identified-segments
///
/// All identified ad segments for a post, with merged ranges and the full
/// transcript for review context.
pub async fn get_identified_segments(
    Path(post_guid): Path<String>,
    State(state): State<Arc<AppState>>,
) -> Result<Json<Value>, AppError> {
    let post = lookup_post(&state, &post_guid)?;
    let result = segment_manager(&state).identified_segments(&post)?;
    Ok(Json(serde_json::to_value(result)?))
}

/// POST /api/posts/:post_guid/approve-segments
///
/// Store the reviewer's approved removal set, then resume the post's
/// processing job if one is parked awaiting review.
pub async fn approve_segments(
    Path(post_guid): Path<String>,
    State(state): State<Arc<AppState>>,
    payload: Option<Json<SegmentPayload>>,
) -> Result<Json<Value>, AppError> {
    let post = lookup_post(&state, &post_guid)?;
    let segments = require_segments(payload)?;

    let approved: Vec<OverrideRange> = segments
        .iter()
        .filter(|s| s.is_approved())
        .cloned()
        .collect();
    segment_manager(&state).apply_overrides(&post, &approved)?;

    if let Some(pending_job) = state.db.find_pending_review_job(&post_guid)? {
        state.db.mark_segments_approved(pending_job.id)?;

        // The overrides above stay committed even if this fails; the 500
        // tells the caller to retry resumption, not the approval.
        let result = state
            .jobs
            .start_post_processing(&post_guid, "interactive")
            .await
            .map_err(|e| {
                log::error!("Failed to resume processing for {post_guid}: {e}");
                e
            })?;
        return Ok(Json(serde_json::to_value(result)?));
    }

    Ok(Json(json!({
        "message": "Segments approved",
        "approved_count": approved.len(),
    })))
}

/// POST /api/posts/:post_guid/override-segments
///
/// Replace the post's overrides with the submitted list as-is. No resume
/// hook; this is the manual-correction path.
pub async fn override_segments(
    Path(post_guid): Path<String>,
    State(state): State<Arc<AppState>>,
    payload: Option<Json<SegmentPayload>>,
) -> Result<Json<Value>, AppError> {
    let post = lookup_post(&state, &post_guid)?;
    let segments = require_segments(payload)?;

    segment_manager(&state).apply_overrides(&post, &segments)?;

    Ok(Json(json!({
        "message": "Segments overridden successfully",
        "segment_count": segments.len(),
    })))
}

/// GET /api/posts/:post_guid/removal-ranges
///
/// The authoritative removal set for the audio-edit stage: user overrides
/// when present, merged identifications otherwise.
pub async fn get_removal_ranges(
    Path(post_guid): Path<String>,
    State(state): State<Arc<AppState>>,
) -> Result<Json<Value>, AppError> {
    let post = lookup_post(&state, &post_guid)?;
    let ranges = segment_manager(&state).removal_ranges(&post)?;
    Ok(Json(json!({ "removal_ranges": ranges })))
}
