use url::Url;

use crate::error::AppError;

/// URL layout of the remote service, rooted at a configurable base.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceEndpoints {
    base: Url,
}

impl ServiceEndpoints {
    pub fn parse(base_url: &str) -> Result<Self, AppError> {
        let base = Url::parse(base_url.trim()).map_err(|e| {
            AppError::Config(config::ConfigError::Message(format!(
                "invalid service base url '{}': {}",
                base_url, e
            )))
        })?;
        if base.cannot_be_a_base() || !matches!(base.scheme(), "http" | "https") {
            return Err(AppError::Config(config::ConfigError::Message(format!(
                "service base url '{}' must be an http(s) url",
                base_url
            ))));
        }
        Ok(Self { base })
    }

    pub fn base(&self) -> &Url {
        &self.base
    }

    pub fn enroll_reference(&self) -> Url {
        self.at(&["reference", "add"])
    }

    pub fn ingest_footage(&self) -> Url {
        self.at(&["video", "upload"])
    }

    /// The compare route is mounted with a trailing slash.
    pub fn compare(&self) -> Url {
        self.at(&["compare", ""])
    }

    pub fn match_asset(&self, asset_name: &str) -> Url {
        self.at(&["outputs", "search", asset_name])
    }

    pub fn footage_info(&self, job_id: &str) -> Url {
        self.at(&["videos", "info", job_id])
    }

    pub fn video_stream(&self, job_id: &str) -> Url {
        self.at(&["videos", "stream", job_id])
    }

    /// Stream URL with a media fragment seeking to whole seconds.
    pub fn video_stream_at(&self, job_id: &str, start_seconds: u64) -> Url {
        let mut url = self.video_stream(job_id);
        url.set_fragment(Some(&format!("t={}", start_seconds)));
        url
    }

    pub fn thumbnail(&self, job_id: &str, frame_number: u64) -> Url {
        let mut url = self.at(&["videos", "thumbnail", job_id]);
        url.query_pairs_mut()
            .append_pair("frame_number", &frame_number.to_string());
        url
    }

    fn at(&self, segments: &[&str]) -> Url {
        let mut url = self.base.clone();
        // parse() rejects cannot-be-a-base urls, so this always succeeds
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_routes_from_root_base() {
        let endpoints = ServiceEndpoints::parse("http://127.0.0.1:8000").unwrap();
        assert_eq!(
            endpoints.enroll_reference().as_str(),
            "http://127.0.0.1:8000/reference/add"
        );
        assert_eq!(
            endpoints.ingest_footage().as_str(),
            "http://127.0.0.1:8000/video/upload"
        );
        assert_eq!(endpoints.compare().as_str(), "http://127.0.0.1:8000/compare/");
    }

    #[test]
    fn test_routes_keep_base_path() {
        let endpoints = ServiceEndpoints::parse("https://search.example/api/").unwrap();
        assert_eq!(
            endpoints.match_asset("frame_12.jpg").as_str(),
            "https://search.example/api/outputs/search/frame_12.jpg"
        );
        assert_eq!(
            endpoints.footage_info("job-1").as_str(),
            "https://search.example/api/videos/info/job-1"
        );
    }

    #[test]
    fn test_asset_names_are_escaped() {
        let endpoints = ServiceEndpoints::parse("http://localhost:8000").unwrap();
        assert_eq!(
            endpoints.match_asset("frame 1.jpg").as_str(),
            "http://localhost:8000/outputs/search/frame%201.jpg"
        );
    }

    #[test]
    fn test_stream_and_thumbnail() {
        let endpoints = ServiceEndpoints::parse("http://localhost:8000").unwrap();
        assert_eq!(
            endpoints.video_stream_at("job-9", 4).as_str(),
            "http://localhost:8000/videos/stream/job-9#t=4"
        );
        assert_eq!(
            endpoints.thumbnail("job-9", 120).as_str(),
            "http://localhost:8000/videos/thumbnail/job-9?frame_number=120"
        );
    }

    #[test]
    fn test_rejects_non_http_base() {
        assert!(ServiceEndpoints::parse("mailto:someone@example.com").is_err());
        assert!(ServiceEndpoints::parse("not a url").is_err());
        assert!(ServiceEndpoints::parse("ftp://example.com").is_err());
    }
}
