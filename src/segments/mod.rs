//! Segment reconciliation: which time ranges actually get cut from an
//! episode.
//!
//! Two sources can answer that question. The classification stage attaches
//! ad identifications to transcript segments, and a human reviewer can
//! submit override ranges. Overrides are authoritative: when any approved
//! override exists for a post it replaces the machine output wholesale,
//! never merged with it. With no overrides, the ad identifications are
//! merged into contiguous ranges and used as-is.

pub mod merge;
pub mod view;

use std::sync::Arc;

use crate::cache::{CacheKey, TtlCache};
use crate::database::{Database, OverrideRange, Post};
use crate::error::AppError;

use merge::{merge_contiguous, TimedSegment, DEFAULT_GAP_TOLERANCE_SECS};
use view::{IdentifiedSegments, RemovalRange};

pub struct SegmentManager {
    db: Arc<Database>,
    gap_tolerance: f64,
    removal_cache: Arc<TtlCache<Vec<RemovalRange>>>,
}

impl SegmentManager {
    pub fn new(db: Arc<Database>, removal_cache: Arc<TtlCache<Vec<RemovalRange>>>) -> Self {
        Self {
            db,
            gap_tolerance: DEFAULT_GAP_TOLERANCE_SECS,
            removal_cache,
        }
    }

    #[allow(dead_code)]
    pub fn with_gap_tolerance(mut self, gap_tolerance: f64) -> Self {
        self.gap_tolerance = gap_tolerance;
        self
    }

    /// The full review payload for a post: ad candidates, their merged
    /// ranges, and the complete labeled transcript for context.
    pub fn identified_segments(&self, post: &Post) -> Result<IdentifiedSegments, AppError> {
        let ad_segments = self.db.get_ad_segments(post.id)?;
        let merged_ranges = merge_contiguous(&timed(&ad_segments), self.gap_tolerance);
        let transcript = self.db.get_labeled_transcript(post.id)?;

        Ok(IdentifiedSegments {
            segments: ad_segments.iter().map(view::ad_segment_view).collect(),
            merged_ranges,
            transcript: transcript
                .iter()
                .map(view::transcript_segment_view)
                .collect(),
        })
    }

    /// Replace the post's overrides with the submitted list. Every range is
    /// validated before any mutation; unapproved ranges are dropped by the
    /// store. Returns the number of overrides written.
    pub fn apply_overrides(
        &self,
        post: &Post,
        overrides: &[OverrideRange],
    ) -> Result<usize, AppError> {
        for range in overrides {
            validate_range(range)?;
        }

        let inserted = self.db.replace_overrides(post.id, overrides)?;
        self.removal_cache
            .invalidate(&CacheKey::removal_ranges(post.id));

        log::info!(
            "Applied {} segment overrides for post {} ({} written)",
            overrides.len(),
            post.guid,
            inserted
        );
        Ok(inserted)
    }

    /// The ranges to cut from this episode's audio. User-approved overrides
    /// win outright and come back verbatim in stored order; otherwise the
    /// ad identifications are merged and used as the fallback.
    pub fn removal_ranges(&self, post: &Post) -> Result<Vec<RemovalRange>, AppError> {
        let key = CacheKey::removal_ranges(post.id);
        if let Some(ranges) = self.removal_cache.get(&key) {
            return Ok(ranges);
        }

        let overrides = self.db.get_approved_overrides(post.id)?;

        let ranges: Vec<RemovalRange> = if !overrides.is_empty() {
            log::info!(
                "Using {} user-approved segments for post {}",
                overrides.len(),
                post.guid
            );
            overrides
                .iter()
                .map(|o| view::removal_range(o.start_time, o.end_time))
                .collect()
        } else {
            log::info!(
                "No overrides found, using ad identifications for post {}",
                post.guid
            );
            let ad_segments = self.db.get_ad_segments(post.id)?;
            merge_contiguous(&timed(&ad_segments), self.gap_tolerance)
                .iter()
                .map(|r| view::removal_range(r.start_time, r.end_time))
                .collect()
        };

        self.removal_cache.insert(key, ranges.clone());
        Ok(ranges)
    }
}

fn timed(segments: &[crate::database::AdSegment]) -> Vec<TimedSegment> {
    segments
        .iter()
        .map(|s| TimedSegment {
            id: s.id,
            start_time: s.start_time,
            end_time: s.end_time,
        })
        .collect()
}

fn validate_range(range: &OverrideRange) -> Result<(), AppError> {
    if !range.start_time.is_finite() || !range.end_time.is_finite() {
        return Err(AppError::Validation(
            "Segment times must be finite numbers".to_string(),
        ));
    }
    if range.start_time < 0.0 {
        return Err(AppError::Validation(
            "Segment start_time must not be negative".to_string(),
        ));
    }
    if range.end_time < range.start_time {
        return Err(AppError::Validation(format!(
            "Segment end_time {} precedes start_time {}",
            range.end_time, range.start_time
        )));
    }
    Ok(())
}
