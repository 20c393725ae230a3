//! Processor resumption hook.
//!
//! Scheduling and worker orchestration live in the processor service, not
//! here. This module only carries the trigger: when a reviewer approves
//! segments for a post whose job is parked in `pending_review`, the approve
//! handler asks the processor to pick the post back up.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::AppError;

const DEFAULT_PROCESSOR_URL: &str = "http://localhost:8801";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Client for the processor service's job API.
pub struct JobsManager {
    client: reqwest::Client,
    base_url: String,
}

#[derive(Debug, Serialize)]
struct StartProcessingRequest<'a> {
    post_guid: &'a str,
    priority: &'a str,
}

/// The processor's reply to a start request, passed through to the caller
/// of the approve endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResumeResult {
    pub job_id: Option<i64>,
    pub status: String,
    #[serde(default)]
    pub message: Option<String>,
}

impl JobsManager {
    pub fn new(base_url: Option<&str>) -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(REQUEST_TIMEOUT)
                .build()
                .unwrap_or_default(),
            base_url: base_url.unwrap_or(DEFAULT_PROCESSOR_URL).to_string(),
        }
    }

    /// Ask the processor to (re)start processing for a post. `priority` is
    /// `"interactive"` on the review path so the resumed job jumps the
    /// batch queue.
    pub async fn start_post_processing(
        &self,
        post_guid: &str,
        priority: &str,
    ) -> Result<ResumeResult, AppError> {
        let url = format!("{}/jobs/start", self.base_url);

        let response = self
            .client
            .post(&url)
            .json(&StartProcessingRequest {
                post_guid,
                priority,
            })
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(AppError::Resume(format!(
                "Processor returned {} for post {}",
                response.status(),
                post_guid
            )));
        }

        let result: ResumeResult = response
            .json()
            .await
            .map_err(|e| AppError::Resume(format!("Invalid processor response: {e}")))?;

        log::info!(
            "Resumed processing for post {} (status: {})",
            post_guid,
            result.status
        );
        Ok(result)
    }
}
