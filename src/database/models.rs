use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Pending,
    Processing,
    PendingReview,
    Completed,
    Failed,
}

impl Default for JobStatus {
    fn default() -> Self {
        Self::Pending
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Processing => write!(f, "processing"),
            Self::PendingReview => write!(f, "pending_review"),
            Self::Completed => write!(f, "completed"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

impl From<String> for JobStatus {
    fn from(s: String) -> Self {
        match s.as_str() {
            "pending" => Self::Pending,
            "processing" => Self::Processing,
            "pending_review" => Self::PendingReview,
            "completed" => Self::Completed,
            "failed" => Self::Failed,
            _ => Self::Pending,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    pub id: i64,
    pub guid: String,
    pub title: String,
    pub audio_url: Option<String>,
    pub duration: Option<f64>,
    pub published_date: Option<String>,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptSegment {
    pub id: i64,
    pub post_id: i64,
    pub sequence_num: i32,
    pub start_time: f64,
    pub end_time: f64,
    pub text: String,
}

/// Segment payload the transcription stage hands to
/// `Database::replace_transcript_segments`. Sequence numbers are assigned
/// from slice order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewTranscriptSegment {
    pub start_time: f64,
    pub end_time: f64,
    pub text: String,
}

#[allow(dead_code)]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Identification {
    pub id: i64,
    pub transcript_segment_id: i64,
    pub label: String,
    pub confidence: f64,
    pub model_used: Option<String>,
    pub created_at: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SegmentOverride {
    pub id: i64,
    pub post_id: i64,
    pub start_time: f64,
    pub end_time: f64,
    pub user_approved: bool,
    pub created_at: Option<String>,
}

/// One range submitted through the review endpoints. `approved` defaults to
/// true when omitted; unapproved ranges are dropped at the store boundary,
/// never persisted as rejections.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OverrideRange {
    pub start_time: f64,
    pub end_time: f64,
    pub approved: Option<bool>,
}

impl OverrideRange {
    pub fn is_approved(&self) -> bool {
        self.approved.unwrap_or(true)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessingJob {
    pub id: i64,
    pub post_guid: String,
    pub status: JobStatus,
    pub current_step: i32,
    pub total_steps: i32,
    pub segments_approved: bool,
    pub error_message: Option<String>,
    pub created_at: String,
    pub started_at: Option<String>,
    pub completed_at: Option<String>,
}

/// An ad-labeled transcript segment joined with its identification, the
/// merger's input.
#[derive(Debug, Clone, Serialize)]
pub struct AdSegment {
    pub id: i64,
    pub sequence_num: i32,
    pub start_time: f64,
    pub end_time: f64,
    pub text: String,
    pub confidence: f64,
}

/// A transcript segment annotated with whatever label it carries, for the
/// full-transcript review view.
#[derive(Debug, Clone, Serialize)]
pub struct LabeledSegment {
    pub id: i64,
    pub sequence_num: i32,
    pub start_time: f64,
    pub end_time: f64,
    pub text: String,
    pub label: String,
    pub confidence: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct PostSummary {
    pub id: i64,
    pub guid: String,
    pub title: String,
    pub duration: Option<f64>,
    pub published_date: Option<String>,
    pub segment_count: i64,
    pub override_count: i64,
    pub pending_review: bool,
}
