use thiserror::Error;

// Main Application Error Type

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration Error: {0}")]
    Config(#[from] config::ConfigError),
    #[error("Workflow Error: {0}")]
    Workflow(#[from] WorkflowError),
    #[error("Orchestrator Error: {0}")]
    Orchestrator(String),
    #[error("IO Error: {0}")]
    Io(#[from] std::io::Error),
}

/// Failure of a single workflow action.
///
/// `Service` carries the remote service's message unchanged; its `Display`
/// output is exactly that message so it can be shown to the user as-is.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum WorkflowError {
    #[error("{0}")]
    Validation(String),
    #[error("Unable to reach the search service: {0}")]
    Transport(String),
    #[error("{message}")]
    Service { message: String },
}

impl WorkflowError {
    pub fn validation(message: impl Into<String>) -> Self {
        WorkflowError::Validation(message.into())
    }

    pub fn transport(message: impl Into<String>) -> Self {
        WorkflowError::Transport(message.into())
    }

    pub fn service(message: impl Into<String>) -> Self {
        WorkflowError::Service {
            message: message.into(),
        }
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, WorkflowError::Validation(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_service_error_displays_message_verbatim() {
        let err = WorkflowError::service("No person detected in the uploaded image.");
        assert_eq!(err.to_string(), "No person detected in the uploaded image.");
    }

    #[test]
    fn test_transport_error_mentions_service() {
        let err = WorkflowError::transport("connection refused");
        assert_eq!(
            err.to_string(),
            "Unable to reach the search service: connection refused"
        );
    }

    #[test]
    fn test_workflow_error_converts_into_app_error() {
        let err: AppError = WorkflowError::validation("Choose a video first").into();
        assert!(matches!(err, AppError::Workflow(WorkflowError::Validation(_))));
    }
}
