use std::sync::Arc;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::config::Settings;
use crate::error::AppError;
use crate::gateway::{HttpGateway, SearchGateway, ServiceEndpoints};
use crate::presentation::ResultPresenter;
use crate::workflow::{WorkflowHandle, WorkflowOrchestrator};

/// Owns the orchestrator task for one workflow session.
pub struct Coordinator {
    orchestrator_task: JoinHandle<()>,
    cancel_token: CancellationToken,
    presenter: ResultPresenter,
}

impl Coordinator {
    fn new(settings: &Settings, gateway: Arc<dyn SearchGateway>, endpoints: ServiceEndpoints) -> (Self, WorkflowHandle) {
        let cancel_token = CancellationToken::new();
        let (orchestrator, handle) = WorkflowOrchestrator::new(gateway, settings);
        let orchestrator_task = tokio::spawn(orchestrator.run(cancel_token.clone()));
        let coordinator = Self {
            orchestrator_task,
            cancel_token,
            presenter: ResultPresenter::new(endpoints, &settings.presentation),
        };
        (coordinator, handle)
    }

    pub fn presenter(&self) -> &ResultPresenter {
        &self.presenter
    }

    pub fn stop(&self) {
        self.cancel_token.cancel();
    }

    /// Stops the orchestrator and waits for its task to exit.
    pub async fn shutdown(mut self) -> Result<(), AppError> {
        self.stop();
        (&mut self.orchestrator_task)
            .await
            .map_err(|e| AppError::Orchestrator(format!("workflow task failed: {}", e)))
    }
}

impl Drop for Coordinator {
    fn drop(&mut self) {
        self.stop();
    }
}

pub struct CoordinatorBuilder {
    settings: Settings,
    gateway: Option<Arc<dyn SearchGateway>>,
}

impl CoordinatorBuilder {
    pub fn new(settings: Settings) -> Self {
        Self {
            settings,
            gateway: None,
        }
    }

    // Points the HTTP gateway at another service, this will override the configured base url.
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.settings.service.base_url = base_url.into();
        self
    }

    // Sets the default number of matches per search, this will override the configured value.
    pub fn top_k(mut self, top_k: usize) -> Self {
        self.settings.search.top_k = top_k;
        self
    }

    // Uses the given gateway instead of one built from the service settings.
    pub fn gateway(mut self, gateway: Arc<dyn SearchGateway>) -> Self {
        self.gateway = Some(gateway);
        self
    }

    /// Spawns the orchestrator; must be called inside a tokio runtime.
    pub fn build(self) -> Result<(Coordinator, WorkflowHandle), AppError> {
        if self.settings.search.top_k == 0 {
            return Err(AppError::Config(config::ConfigError::Message(
                "search.top_k must be at least 1".to_string(),
            )));
        }
        let endpoints = ServiceEndpoints::parse(&self.settings.service.base_url)?;
        let gateway = match self.gateway {
            Some(gateway) => gateway,
            None => Arc::new(HttpGateway::new(&self.settings.service)?),
        };
        Ok(Coordinator::new(&self.settings, gateway, endpoints))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::SearchScope;
    use crate::workflow::{Dispatch, WorkflowStep};

    #[tokio::test]
    async fn test_coordinator() {
        let (coordinator, handle) = CoordinatorBuilder::new(Settings::default())
            .base_url("http://127.0.0.1:9")
            .top_k(5)
            .build()
            .expect("Failed to build coordinator");

        let dispatch = handle.select_scope(SearchScope::AllFootage).await.unwrap();
        assert!(matches!(dispatch, Dispatch::Applied));
        assert_eq!(handle.snapshot().step(), WorkflowStep::Idle);

        coordinator.shutdown().await.unwrap();
        assert!(handle.search().await.is_err());
    }

    #[tokio::test]
    async fn test_invalid_settings_are_rejected() {
        let result = CoordinatorBuilder::new(Settings::default()).top_k(0).build();
        assert!(matches!(result, Err(AppError::Config(_))));

        let result = CoordinatorBuilder::new(Settings::default())
            .base_url("not a url")
            .build();
        assert!(matches!(result, Err(AppError::Config(_))));
    }
}
