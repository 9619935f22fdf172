use serde::{Deserialize, Serialize};

/// A binary upload (reference image or footage) with the file name the service should record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaUpload {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl MediaUpload {
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            bytes,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// One enrolled identity returned by the reference enrollment call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferenceRecord {
    pub person_id: String,
    pub gender: String,
    pub age: Option<u32>,
    pub embedding_color: Option<Vec<f32>>,
    pub crop_path: Option<String>,
}

/// An ingested video, known to the service by an opaque job id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FootageJob {
    pub job_id: String,
}

impl FootageJob {
    pub fn new(job_id: impl Into<String>) -> Self {
        Self {
            job_id: job_id.into(),
        }
    }
}

/// Metadata the service reports for an ingested video.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FootageInfo {
    pub job_id: String,
    #[serde(default)]
    pub filename: Option<String>,
    pub fps: f64,
    #[serde(default)]
    pub frame_count: u64,
    #[serde(default)]
    pub duration_seconds: f64,
    #[serde(default)]
    pub resolution: Option<String>,
}

/// One ranked candidate from a search. Ordering is owned by the service.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MatchRecord {
    #[serde(default)]
    pub reference_id: String,
    #[serde(default)]
    pub person_id: String,
    #[serde(default)]
    pub video_name: String,
    #[serde(default)]
    pub job_id: String,
    #[serde(default)]
    pub frame_number: u64,
    #[serde(default)]
    pub timestamp: String,
    #[serde(default)]
    pub face_similarity: f64,
    #[serde(default)]
    pub meta_similarity: f64,
    #[serde(default)]
    pub final_score: f64,
    #[serde(default)]
    pub video_crop: String,
    #[serde(default)]
    pub vid_age: Option<u32>,
    #[serde(default)]
    pub vid_gender: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_match_record_tolerates_missing_auxiliary_fields() {
        let record: MatchRecord = serde_json::from_value(serde_json::json!({
            "reference_id": "p1",
            "person_id": "v-17",
            "job_id": "job-1",
            "frame_number": 120,
            "final_score": 0.91,
            "face_similarity": 0.88,
            "video_crop": "/out/frame_120.jpg",
            "vid_age": null,
            "detected_at": "2025-10-25T19:54:55"
        }))
        .unwrap();

        assert_eq!(record.frame_number, 120);
        assert_eq!(record.vid_age, None);
        assert_eq!(record.vid_gender, None);
        assert_eq!(record.timestamp, "");
        assert_eq!(record.meta_similarity, 0.0);
    }
}
