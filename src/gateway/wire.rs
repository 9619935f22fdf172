//! Request and response bodies as the service speaks them.

use serde::{Deserialize, Serialize};

use crate::common::{FootageJob, MatchRecord, ReferenceRecord};
use crate::error::WorkflowError;

use super::{SearchOutcome, SearchRequest};

#[derive(Debug, Deserialize)]
pub(crate) struct EnrollResponse {
    #[serde(default)]
    pub results: Vec<WireReference>,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct WireReference {
    #[serde(default)]
    pub person_id: Option<String>,
    #[serde(default, rename = "_id")]
    pub storage_id: Option<String>,
    #[serde(default)]
    pub gender: Option<String>,
    #[serde(default)]
    pub age: Option<u32>,
    #[serde(default)]
    pub color: Option<Vec<f32>>,
    #[serde(default)]
    pub crop_path: Option<String>,
}

impl WireReference {
    /// Records without any usable identifier are dropped.
    pub fn into_record(self) -> Option<ReferenceRecord> {
        let person_id = self
            .person_id
            .filter(|id| !id.trim().is_empty())
            .or(self.storage_id.filter(|id| !id.trim().is_empty()))?;
        Some(ReferenceRecord {
            person_id,
            gender: self.gender.unwrap_or_default(),
            age: self.age,
            embedding_color: self.color,
            crop_path: self.crop_path,
        })
    }
}

impl EnrollResponse {
    pub fn into_records(self) -> Result<Vec<ReferenceRecord>, WorkflowError> {
        if let Some(message) = self.error {
            return Err(WorkflowError::service(message));
        }
        Ok(self
            .results
            .into_iter()
            .filter_map(WireReference::into_record)
            .collect())
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct IngestResponse {
    #[serde(default)]
    pub job_id: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

impl IngestResponse {
    pub fn into_job(self) -> Result<FootageJob, WorkflowError> {
        if let Some(message) = self.error {
            return Err(WorkflowError::service(message));
        }
        match self.job_id.filter(|id| !id.trim().is_empty()) {
            Some(job_id) => Ok(FootageJob::new(job_id)),
            None => Err(WorkflowError::service(
                "Video upload response did not include a job id",
            )),
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct CompareBody<'a> {
    pub reference_id: &'a str,
    pub top_k: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub job_id: Option<&'a str>,
}

impl<'a> From<&'a SearchRequest> for CompareBody<'a> {
    fn from(request: &'a SearchRequest) -> Self {
        Self {
            reference_id: &request.reference_id,
            top_k: request.top_k,
            job_id: request.job_filter(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct CompareResponse {
    #[serde(default)]
    pub matches: Vec<MatchRecord>,
    #[serde(default)]
    pub matches_count: Option<usize>,
    #[serde(default)]
    pub searched_all_videos: Option<bool>,
    #[serde(default)]
    pub error: Option<String>,
}

impl CompareResponse {
    pub fn into_outcome(self, request: &SearchRequest) -> Result<SearchOutcome, WorkflowError> {
        if let Some(message) = self.error {
            return Err(WorkflowError::service(message));
        }
        let total_count = self.matches_count.unwrap_or(self.matches.len());
        let searched_all = self
            .searched_all_videos
            .unwrap_or_else(|| request.job_filter().is_none());
        Ok(SearchOutcome {
            matches: self.matches,
            total_count,
            searched_all,
        })
    }
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    detail: Option<serde_json::Value>,
    #[serde(default)]
    error: Option<String>,
}

/// Extracts the user-facing message from a rejected response body.
pub(crate) fn rejection_message(operation: &str, body: &str) -> String {
    if let Ok(parsed) = serde_json::from_str::<ErrorBody>(body) {
        match parsed.detail {
            Some(serde_json::Value::String(detail)) => return detail,
            Some(serde_json::Value::Null) | None => {}
            Some(other) => return format!("Failed to {}: {}", operation, other),
        }
        if let Some(error) = parsed.error {
            return error;
        }
    }
    let body = body.trim();
    if body.is_empty() {
        format!("Failed to {}", operation)
    } else {
        format!("Failed to {}: {}", operation, body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::SearchScope;
    use serde_json::json;

    fn request(scope: SearchScope) -> SearchRequest {
        SearchRequest {
            reference_id: "p1".to_string(),
            scope,
            top_k: 20,
        }
    }

    #[test]
    fn test_compare_body_omits_job_for_all_footage() {
        let all = request(SearchScope::AllFootage);
        let body = serde_json::to_value(CompareBody::from(&all)).unwrap();
        assert_eq!(body, json!({ "reference_id": "p1", "top_k": 20 }));

        let blank = request(SearchScope::SingleJob("   ".to_string()));
        let body = serde_json::to_value(CompareBody::from(&blank)).unwrap();
        assert_eq!(body, json!({ "reference_id": "p1", "top_k": 20 }));
    }

    #[test]
    fn test_compare_body_includes_single_job() {
        let single = request(SearchScope::SingleJob("job-3".to_string()));
        let body = serde_json::to_value(CompareBody::from(&single)).unwrap();
        assert_eq!(
            body,
            json!({ "reference_id": "p1", "top_k": 20, "job_id": "job-3" })
        );
    }

    #[test]
    fn test_enroll_error_field_is_a_service_error() {
        let response: EnrollResponse =
            serde_json::from_value(json!({ "error": "No person detected in the uploaded image." }))
                .unwrap();
        assert_eq!(
            response.into_records(),
            Err(WorkflowError::service("No person detected in the uploaded image."))
        );
    }

    #[test]
    fn test_enroll_falls_back_to_storage_id() {
        let response: EnrollResponse = serde_json::from_value(json!({
            "message": "Reference(s) added successfully.",
            "results": [
                { "_id": "665f", "gender": "Female", "age": 31, "color": [12, 40, 200] },
                { "gender": "Male", "age": 40 }
            ]
        }))
        .unwrap();
        let records = response.into_records().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].person_id, "665f");
        assert_eq!(records[0].embedding_color, Some(vec![12.0, 40.0, 200.0]));
    }

    #[test]
    fn test_compare_defaults_counts_from_matches() {
        let response: CompareResponse = serde_json::from_value(json!({
            "matches": [{ "job_id": "j", "frame_number": 3, "final_score": 0.9 }]
        }))
        .unwrap();
        let outcome = response
            .into_outcome(&request(SearchScope::SingleJob("j".to_string())))
            .unwrap();
        assert_eq!(outcome.total_count, 1);
        assert!(!outcome.searched_all);
    }

    #[test]
    fn test_ingest_without_job_id_is_rejected() {
        let response: IngestResponse =
            serde_json::from_value(json!({ "error": "Pipeline failed: bad codec" })).unwrap();
        assert_eq!(
            response.into_job(),
            Err(WorkflowError::service("Pipeline failed: bad codec"))
        );

        let response: IngestResponse = serde_json::from_value(json!({ "message": "ok" })).unwrap();
        assert!(response.into_job().is_err());
    }

    #[test]
    fn test_rejection_message() {
        assert_eq!(
            rejection_message("compare", r#"{"detail": "Reference not found"}"#),
            "Reference not found"
        );
        assert_eq!(
            rejection_message("compare", "Internal Server Error"),
            "Failed to compare: Internal Server Error"
        );
        assert_eq!(rejection_message("upload video", ""), "Failed to upload video");
        assert_eq!(
            rejection_message("compare", r#"{"detail": [{"msg": "field required"}]}"#),
            r#"Failed to compare: [{"msg":"field required"}]"#
        );
    }
}
