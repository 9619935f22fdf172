use crate::common::{ReferenceRecord, SearchScope};
use crate::error::WorkflowError;
use crate::gateway::{SearchGateway, SearchOutcome, SearchRequest};

/// Builds the outgoing search from the enrolled references and the active scope.
///
/// The first enrolled record is the reference identity. A blank single-job
/// scope collapses to the whole corpus here so it is never sent as a filter.
pub fn prepare(
    references: &[ReferenceRecord],
    scope: &SearchScope,
    top_k: usize,
) -> Result<SearchRequest, WorkflowError> {
    let reference = references
        .first()
        .ok_or_else(|| WorkflowError::validation("Upload a reference image first"))?;
    if top_k == 0 {
        return Err(WorkflowError::validation(
            "Number of matches to return must be at least 1",
        ));
    }
    let scope = match scope.job_filter() {
        Some(job_id) => SearchScope::SingleJob(job_id.to_string()),
        None => SearchScope::AllFootage,
    };
    Ok(SearchRequest {
        reference_id: reference.person_id.clone(),
        scope,
        top_k,
    })
}

pub async fn run(
    gateway: &dyn SearchGateway,
    request: &SearchRequest,
) -> Result<SearchOutcome, WorkflowError> {
    gateway.search(request).await
}

pub fn started_message(request: &SearchRequest) -> String {
    format!(
        "Searching through {} using reference embeddings...",
        request.scope
    )
}

pub fn success_message(outcome: &SearchOutcome) -> String {
    format!(
        "Search complete. Found {} top matches{}",
        outcome.total_count,
        if outcome.searched_all {
            " across all videos"
        } else {
            ""
        }
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reference(id: &str) -> ReferenceRecord {
        ReferenceRecord {
            person_id: id.to_string(),
            gender: "Female".to_string(),
            age: Some(29),
            embedding_color: None,
            crop_path: None,
        }
    }

    #[test]
    fn test_requires_a_reference() {
        let err = prepare(&[], &SearchScope::AllFootage, 20).unwrap_err();
        assert_eq!(err, WorkflowError::validation("Upload a reference image first"));
    }

    #[test]
    fn test_uses_first_reference() {
        let refs = vec![reference("p1"), reference("p2")];
        let request = prepare(&refs, &SearchScope::AllFootage, 20).unwrap();
        assert_eq!(request.reference_id, "p1");
        assert_eq!(request.top_k, 20);
    }

    #[test]
    fn test_blank_job_collapses_to_all_footage() {
        let refs = vec![reference("p1")];
        for blank in ["", "   "] {
            let request = prepare(&refs, &SearchScope::SingleJob(blank.to_string()), 5).unwrap();
            assert_eq!(request.scope, SearchScope::AllFootage);
            assert_eq!(request.job_filter(), None);
        }
    }

    #[test]
    fn test_single_job_is_kept() {
        let refs = vec![reference("p1")];
        let request = prepare(&refs, &SearchScope::SingleJob(" job-4 ".to_string()), 5).unwrap();
        assert_eq!(request.scope, SearchScope::SingleJob("job-4".to_string()));
    }

    #[test]
    fn test_zero_top_k_is_rejected() {
        let refs = vec![reference("p1")];
        assert!(prepare(&refs, &SearchScope::AllFootage, 0).unwrap_err().is_validation());
    }

    #[test]
    fn test_messages() {
        let request = SearchRequest {
            reference_id: "p1".to_string(),
            scope: SearchScope::AllFootage,
            top_k: 20,
        };
        assert_eq!(
            started_message(&request),
            "Searching through all videos in database using reference embeddings..."
        );
        let outcome = SearchOutcome {
            matches: Vec::new(),
            total_count: 3,
            searched_all: true,
        };
        assert_eq!(
            success_message(&outcome),
            "Search complete. Found 3 top matches across all videos"
        );
    }
}
