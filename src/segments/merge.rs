//! Interval merging for ad-segment removal ranges.
//!
//! Classifiers label transcript segments one at a time, so a single ad read
//! usually arrives as a run of short segments separated by sub-second gaps.
//! Merging collapses each run into one removal range the audio-edit stage
//! can cut in a single pass.

use serde::Serialize;

/// Maximum gap between two ad segments for them to be cut as one range.
pub const DEFAULT_GAP_TOLERANCE_SECS: f64 = 5.0;

/// Minimal merger input: a segment id and its bounds in seconds.
#[derive(Debug, Clone, PartialEq)]
pub struct TimedSegment {
    pub id: i64,
    pub start_time: f64,
    pub end_time: f64,
}

/// A contiguous removal range covering one or more source segments.
/// `segment_ids` preserves provenance back to the transcript.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MergedRange {
    pub start_time: f64,
    pub end_time: f64,
    pub segment_ids: Vec<i64>,
}

/// Merge segments whose gaps are within `gap_tolerance` seconds (inclusive:
/// a gap exactly equal to the tolerance merges). Input order does not
/// matter; output ranges are sorted ascending by start time, mutually
/// non-overlapping, and together carry every input id exactly once.
///
/// Inverted segments (`end_time < start_time`) are a caller contract
/// violation and are not detected here; the write path validates ranges
/// before they reach the store.
pub fn merge_contiguous(segments: &[TimedSegment], gap_tolerance: f64) -> Vec<MergedRange> {
    if segments.is_empty() {
        return Vec::new();
    }

    let mut sorted: Vec<&TimedSegment> = segments.iter().collect();
    sorted.sort_by(|a, b| a.start_time.total_cmp(&b.start_time));

    let mut merged_ranges = Vec::new();
    let mut current = MergedRange {
        start_time: sorted[0].start_time,
        end_time: sorted[0].end_time,
        segment_ids: vec![sorted[0].id],
    };

    for segment in &sorted[1..] {
        let gap = segment.start_time - current.end_time;

        if gap <= gap_tolerance {
            // max() keeps the range well-formed even when a later-starting
            // segment ends earlier than the one before it.
            current.end_time = current.end_time.max(segment.end_time);
            current.segment_ids.push(segment.id);
        } else {
            merged_ranges.push(current);
            current = MergedRange {
                start_time: segment.start_time,
                end_time: segment.end_time,
                segment_ids: vec![segment.id],
            };
        }
    }

    merged_ranges.push(current);
    merged_ranges
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seg(id: i64, start: f64, end: f64) -> TimedSegment {
        TimedSegment {
            id,
            start_time: start,
            end_time: end,
        }
    }

    #[test]
    fn test_merge_contiguous_basic() {
        let segments = vec![seg(1, 10.0, 20.0), seg(2, 20.0, 30.0), seg(3, 100.0, 110.0)];

        let merged = merge_contiguous(&segments, DEFAULT_GAP_TOLERANCE_SECS);

        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0].start_time, 10.0);
        assert_eq!(merged[0].end_time, 30.0);
        assert_eq!(merged[0].segment_ids, vec![1, 2]);
        assert_eq!(merged[1].start_time, 100.0);
        assert_eq!(merged[1].end_time, 110.0);
        assert_eq!(merged[1].segment_ids, vec![3]);
    }

    #[test]
    fn test_merge_with_small_gap() {
        // 3 second gap, within the 5 second tolerance
        let segments = vec![seg(1, 10.0, 20.0), seg(2, 23.0, 30.0)];

        let merged = merge_contiguous(&segments, 5.0);

        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].start_time, 10.0);
        assert_eq!(merged[0].end_time, 30.0);
        assert_eq!(merged[0].segment_ids, vec![1, 2]);
    }

    #[test]
    fn test_no_merge_with_large_gap() {
        // 10 second gap, beyond the 5 second tolerance
        let segments = vec![seg(1, 10.0, 20.0), seg(2, 30.0, 40.0)];

        let merged = merge_contiguous(&segments, 5.0);

        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0].segment_ids, vec![1]);
        assert_eq!(merged[1].segment_ids, vec![2]);
    }

    #[test]
    fn test_gap_exactly_at_tolerance_merges() {
        let segments = vec![seg(1, 10.0, 20.0), seg(2, 25.0, 30.0)];

        let merged = merge_contiguous(&segments, 5.0);

        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].end_time, 30.0);
    }

    #[test]
    fn test_empty_segments() {
        let merged = merge_contiguous(&[], DEFAULT_GAP_TOLERANCE_SECS);
        assert!(merged.is_empty());
    }

    #[test]
    fn test_single_segment() {
        let merged = merge_contiguous(&[seg(1, 10.0, 20.0)], DEFAULT_GAP_TOLERANCE_SECS);

        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].start_time, 10.0);
        assert_eq!(merged[0].end_time, 20.0);
        assert_eq!(merged[0].segment_ids, vec![1]);
    }

    #[test]
    fn test_unordered_segments() {
        let segments = vec![seg(3, 100.0, 110.0), seg(1, 10.0, 20.0), seg(2, 20.0, 30.0)];

        let merged = merge_contiguous(&segments, DEFAULT_GAP_TOLERANCE_SECS);

        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0].start_time, 10.0);
        assert_eq!(merged[0].end_time, 30.0);
        assert_eq!(merged[0].segment_ids, vec![1, 2]);
    }

    #[test]
    fn test_order_independent() {
        let forward = vec![
            seg(1, 10.0, 20.0),
            seg(2, 23.0, 30.0),
            seg(3, 50.0, 55.0),
            seg(4, 56.0, 60.0),
            seg(5, 100.0, 110.0),
        ];
        let mut reversed = forward.clone();
        reversed.reverse();
        let mut rotated = forward.clone();
        rotated.rotate_left(2);

        let expected = merge_contiguous(&forward, 5.0);
        assert_eq!(merge_contiguous(&reversed, 5.0), expected);
        assert_eq!(merge_contiguous(&rotated, 5.0), expected);
    }

    #[test]
    fn test_every_id_appears_exactly_once() {
        let segments = vec![
            seg(1, 0.0, 4.0),
            seg(2, 5.0, 9.0),
            seg(3, 30.0, 35.0),
            seg(4, 41.0, 45.0),
            seg(5, 90.0, 95.0),
        ];

        let merged = merge_contiguous(&segments, 5.0);

        let mut ids: Vec<i64> = merged.iter().flat_map(|r| r.segment_ids.clone()).collect();
        ids.sort_unstable();
        assert_eq!(ids, vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_output_sorted_with_gaps_beyond_tolerance() {
        let segments = vec![
            seg(4, 200.0, 210.0),
            seg(1, 0.0, 10.0),
            seg(3, 100.0, 110.0),
            seg(2, 12.0, 20.0),
        ];

        let merged = merge_contiguous(&segments, 5.0);

        for pair in merged.windows(2) {
            assert!(pair[0].start_time < pair[1].start_time);
            // Anything closer would have merged.
            assert!(pair[1].start_time - pair[0].end_time > 5.0);
        }
    }

    #[test]
    fn test_contained_segment_keeps_outer_end() {
        // Second segment starts later but ends earlier; the range must not
        // shrink back to 25.0.
        let segments = vec![seg(1, 10.0, 30.0), seg(2, 12.0, 25.0), seg(3, 32.0, 40.0)];

        let merged = merge_contiguous(&segments, 5.0);

        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].start_time, 10.0);
        assert_eq!(merged[0].end_time, 40.0);
        assert_eq!(merged[0].segment_ids, vec![1, 2, 3]);
    }

    #[test]
    fn test_overlapping_segments_merge() {
        let segments = vec![seg(1, 10.0, 22.0), seg(2, 20.0, 30.0)];

        let merged = merge_contiguous(&segments, 0.0);

        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].start_time, 10.0);
        assert_eq!(merged[0].end_time, 30.0);
    }
}
