use crate::common::{FootageJob, MediaUpload};
use crate::error::WorkflowError;
use crate::gateway::SearchGateway;

pub const STARTED: &str = "Uploading video and extracting frames...";

pub fn validate(video: &MediaUpload) -> Result<(), WorkflowError> {
    if video.is_empty() {
        return Err(WorkflowError::validation("Choose a video first"));
    }
    Ok(())
}

pub async fn run(gateway: &dyn SearchGateway, video: MediaUpload) -> Result<FootageJob, WorkflowError> {
    gateway.ingest_footage(video).await
}

pub fn success_message(job: &FootageJob) -> String {
    format!(
        "Video processed. Frames stored in database (Job ID: {})",
        job.job_id
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_video_is_rejected_locally() {
        assert!(validate(&MediaUpload::new("cam.mp4", Vec::new())).unwrap_err().is_validation());
    }

    #[test]
    fn test_success_message_names_job() {
        assert_eq!(
            success_message(&FootageJob::new("a1b2")),
            "Video processed. Frames stored in database (Job ID: a1b2)"
        );
    }
}
