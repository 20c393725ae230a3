//! Wire shapes for the review and removal endpoints.
//!
//! Internal row structs never cross the HTTP boundary directly; these
//! structs pin the response contract so the store layout can change without
//! breaking callers.

use serde::Serialize;

use crate::database::{AdSegment, LabeledSegment};
use crate::segments::merge::MergedRange;

/// One ad-labeled segment as shown in the review UI.
#[derive(Debug, Clone, Serialize)]
pub struct AdSegmentView {
    pub id: i64,
    pub start_time: f64,
    pub end_time: f64,
    pub text: String,
    pub label: String,
    pub confidence: f64,
    pub sequence_num: i32,
}

/// One transcript segment with whatever label it carries.
#[derive(Debug, Clone, Serialize)]
pub struct TranscriptSegmentView {
    pub id: i64,
    pub sequence_num: i32,
    pub start_time: f64,
    pub end_time: f64,
    pub text: String,
    pub label: String,
    pub confidence: f64,
}

/// The identified-segments triple: ad candidates, their merged ranges, and
/// the full transcript for context.
#[derive(Debug, Clone, Serialize)]
pub struct IdentifiedSegments {
    pub segments: Vec<AdSegmentView>,
    pub merged_ranges: Vec<MergedRange>,
    pub transcript: Vec<TranscriptSegmentView>,
}

/// A start/end pair handed to the audio-edit stage. Provenance ids are
/// dropped at this boundary.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RemovalRange {
    pub start_time: f64,
    pub end_time: f64,
}

pub fn ad_segment_view(segment: &AdSegment) -> AdSegmentView {
    AdSegmentView {
        id: segment.id,
        start_time: segment.start_time,
        end_time: segment.end_time,
        text: segment.text.clone(),
        label: "ad".to_string(),
        confidence: segment.confidence,
        sequence_num: segment.sequence_num,
    }
}

pub fn transcript_segment_view(segment: &LabeledSegment) -> TranscriptSegmentView {
    TranscriptSegmentView {
        id: segment.id,
        sequence_num: segment.sequence_num,
        start_time: segment.start_time,
        end_time: segment.end_time,
        text: segment.text.clone(),
        label: segment.label.clone(),
        confidence: segment.confidence,
    }
}

pub fn removal_range(start_time: f64, end_time: f64) -> RemovalRange {
    RemovalRange {
        start_time,
        end_time,
    }
}
