pub mod endpoints;
pub mod http;
pub mod transport;
pub(crate) mod wire;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::common::{FootageInfo, FootageJob, MatchRecord, MediaUpload, ReferenceRecord, SearchScope};
use crate::error::WorkflowError;

pub use endpoints::ServiceEndpoints;
pub use http::HttpGateway;
pub use transport::HttpTransport;

/// A similarity search as sent to the service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchRequest {
    pub reference_id: String,
    pub scope: SearchScope,
    pub top_k: usize,
}

impl SearchRequest {
    /// The job id to include in the outgoing request. `None` means the whole corpus.
    pub fn job_filter(&self) -> Option<&str> {
        self.scope.job_filter()
    }
}

/// The ranked result set of one search, in service order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchOutcome {
    pub matches: Vec<MatchRecord>,
    pub total_count: usize,
    pub searched_all: bool,
}

/// The sole interface to the remote inference service.
///
/// Every operation is a single request/response exchange. Implementations do
/// not retry and never see workflow state.
#[async_trait]
pub trait SearchGateway: Send + Sync {
    async fn enroll_reference(&self, image: MediaUpload) -> Result<Vec<ReferenceRecord>, WorkflowError>;

    async fn ingest_footage(&self, video: MediaUpload) -> Result<FootageJob, WorkflowError>;

    async fn search(&self, request: &SearchRequest) -> Result<SearchOutcome, WorkflowError>;

    async fn fetch_match_asset(&self, asset_name: &str) -> Result<Vec<u8>, WorkflowError>;

    async fn footage_info(&self, job_id: &str) -> Result<FootageInfo, WorkflowError>;
}
