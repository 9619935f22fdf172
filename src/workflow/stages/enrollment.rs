use crate::common::{MediaUpload, ReferenceRecord};
use crate::error::WorkflowError;
use crate::gateway::SearchGateway;

pub const STARTED: &str = "Processing reference image and generating embeddings...";
pub const SUCCEEDED: &str = "Reference embeddings generated successfully";

/// Rejects a missing reference image before any network call.
pub fn validate(image: &MediaUpload) -> Result<(), WorkflowError> {
    if image.is_empty() {
        return Err(WorkflowError::validation("Choose a reference image first"));
    }
    Ok(())
}

/// Enrolls a reference image. An accepted upload that yields no identity is a service error.
pub async fn run(
    gateway: &dyn SearchGateway,
    image: MediaUpload,
) -> Result<Vec<ReferenceRecord>, WorkflowError> {
    let records = gateway.enroll_reference(image).await?;
    if records.is_empty() {
        return Err(WorkflowError::service(
            "No face detected in the reference image",
        ));
    }
    Ok(records)
}
