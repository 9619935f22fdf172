use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde::de::DeserializeOwned;
use tower::ServiceExt;
use tracing::{debug, instrument, warn};

use super::transport::{BoxedTransport, HttpTransport, transport_error};
use super::wire::{CompareBody, CompareResponse, EnrollResponse, IngestResponse, rejection_message};
use super::{SearchGateway, SearchOutcome, SearchRequest, ServiceEndpoints};
use crate::common::{FootageInfo, FootageJob, MediaUpload, ReferenceRecord};
use crate::config::ServiceSettings;
use crate::error::{AppError, WorkflowError};

/// `SearchGateway` over the service's HTTP API.
pub struct HttpGateway {
    client: reqwest::Client,
    endpoints: ServiceEndpoints,
    transport: BoxedTransport,
}

impl HttpGateway {
    pub fn new(settings: &ServiceSettings) -> Result<Self, AppError> {
        let endpoints = ServiceEndpoints::parse(&settings.base_url)?;
        let client = reqwest::Client::new();
        let transport = HttpTransport::new(client.clone()).layered(settings.request_timeout());
        Ok(Self {
            client,
            endpoints,
            transport,
        })
    }

    pub fn endpoints(&self) -> &ServiceEndpoints {
        &self.endpoints
    }

    async fn execute(&self, request: reqwest::RequestBuilder) -> Result<reqwest::Response, WorkflowError> {
        let request = request
            .build()
            .map_err(|e| WorkflowError::transport(e.to_string()))?;
        debug!("{} {}", request.method(), request.url());
        self.transport
            .clone()
            .oneshot(request)
            .await
            .map_err(transport_error)
    }

    /// Reads a response body, turning non-success statuses into service errors.
    async fn read_body(response: reqwest::Response, operation: &str) -> Result<String, WorkflowError> {
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| WorkflowError::transport(e.to_string()))?;
        if !status.is_success() {
            warn!("Service rejected {} with status {}", operation, status);
            return Err(WorkflowError::service(rejection_message(operation, &body)));
        }
        Ok(body)
    }

    async fn read_json<T: DeserializeOwned>(
        response: reqwest::Response,
        operation: &str,
    ) -> Result<T, WorkflowError> {
        let body = Self::read_body(response, operation).await?;
        serde_json::from_str(&body).map_err(|e| {
            WorkflowError::service(format!("Unexpected response to {}: {}", operation, e))
        })
    }

    fn upload_form(field: &'static str, upload: MediaUpload) -> Form {
        Form::new().part(field, Part::bytes(upload.bytes).file_name(upload.file_name))
    }
}

#[async_trait]
impl SearchGateway for HttpGateway {
    #[instrument(skip(self, image), fields(file_name = %image.file_name, bytes = image.bytes.len()))]
    async fn enroll_reference(&self, image: MediaUpload) -> Result<Vec<ReferenceRecord>, WorkflowError> {
        let request = self
            .client
            .post(self.endpoints.enroll_reference())
            .multipart(Self::upload_form("file", image));
        let response = self.execute(request).await?;
        Self::read_json::<EnrollResponse>(response, "upload reference")
            .await?
            .into_records()
    }

    #[instrument(skip(self, video), fields(file_name = %video.file_name, bytes = video.bytes.len()))]
    async fn ingest_footage(&self, video: MediaUpload) -> Result<FootageJob, WorkflowError> {
        let request = self
            .client
            .post(self.endpoints.ingest_footage())
            .multipart(Self::upload_form("video", video));
        let response = self.execute(request).await?;
        Self::read_json::<IngestResponse>(response, "upload video")
            .await?
            .into_job()
    }

    #[instrument(skip(self, request), fields(reference_id = %request.reference_id, scope = %request.scope, top_k = request.top_k))]
    async fn search(&self, request: &SearchRequest) -> Result<SearchOutcome, WorkflowError> {
        let http_request = self
            .client
            .post(self.endpoints.compare())
            .json(&CompareBody::from(request));
        let response = self.execute(http_request).await?;
        Self::read_json::<CompareResponse>(response, "compare")
            .await?
            .into_outcome(request)
    }

    #[instrument(skip(self))]
    async fn fetch_match_asset(&self, asset_name: &str) -> Result<Vec<u8>, WorkflowError> {
        let request = self.client.get(self.endpoints.match_asset(asset_name));
        let response = self.execute(request).await?;
        let status = response.status();
        if !status.is_success() {
            return Err(WorkflowError::service(format!(
                "Frame {} not available ({})",
                asset_name, status
            )));
        }
        let bytes = response
            .bytes()
            .await
            .map_err(|e| WorkflowError::transport(e.to_string()))?;
        Ok(bytes.to_vec())
    }

    #[instrument(skip(self))]
    async fn footage_info(&self, job_id: &str) -> Result<FootageInfo, WorkflowError> {
        let request = self.client.get(self.endpoints.footage_info(job_id));
        let response = self.execute(request).await?;
        Self::read_json::<FootageInfo>(response, "get video info").await
    }
}
