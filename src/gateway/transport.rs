use std::task::{Context, Poll};
use std::time::Duration;

use futures::future::BoxFuture;
use tower::timeout::TimeoutLayer;
use tower::util::BoxCloneSyncService;
use tower::{BoxError, Service, ServiceBuilder};

use crate::error::WorkflowError;

pub type BoxedTransport = BoxCloneSyncService<reqwest::Request, reqwest::Response, BoxError>;

/// Executes prepared HTTP requests against the service.
#[derive(Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }

    /// Boxes the transport, wrapped in a timeout when one is configured.
    pub fn layered(self, timeout: Option<Duration>) -> BoxedTransport {
        let service = ServiceBuilder::new()
            .option_layer(timeout.map(TimeoutLayer::new))
            .service(self);
        BoxCloneSyncService::new(service)
    }
}

impl Service<reqwest::Request> for HttpTransport {
    type Response = reqwest::Response;
    type Error = BoxError;
    type Future = BoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, request: reqwest::Request) -> Self::Future {
        let client = self.client.clone();
        Box::pin(async move { client.execute(request).await.map_err(BoxError::from) })
    }
}

/// Maps any failure to obtain a response into a transport error.
pub fn transport_error(err: BoxError) -> WorkflowError {
    if err.is::<tower::timeout::error::Elapsed>() {
        WorkflowError::transport("request timed out")
    } else {
        WorkflowError::transport(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_elapsed_maps_to_timeout_message() {
        let err: BoxError = Box::new(tower::timeout::error::Elapsed::new());
        assert_eq!(
            transport_error(err),
            WorkflowError::transport("request timed out")
        );
    }

    #[test]
    fn test_other_errors_keep_their_text() {
        let err: BoxError = "connection refused".into();
        assert_eq!(
            transport_error(err),
            WorkflowError::transport("connection refused")
        );
    }
}
