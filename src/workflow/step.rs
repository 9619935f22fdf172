use serde::{Deserialize, Serialize};

/// Workflow progress. Ordered so the step can be kept as a high-water mark.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub enum WorkflowStep {
    #[default]
    Idle = 1,
    ReferenceReady = 2,
    ScopeReady = 3,
    ResultsReady = 4,
}

impl WorkflowStep {
    pub fn number(&self) -> u8 {
        *self as u8
    }

    pub fn label(&self) -> &'static str {
        match self {
            WorkflowStep::Idle => "Upload Reference",
            WorkflowStep::ReferenceReady => "Process CCTV",
            WorkflowStep::ScopeReady => "Search Database",
            WorkflowStep::ResultsReady => "View Matches",
        }
    }

    pub fn all() -> [WorkflowStep; 4] {
        [
            WorkflowStep::Idle,
            WorkflowStep::ReferenceReady,
            WorkflowStep::ScopeReady,
            WorkflowStep::ResultsReady,
        ]
    }

    /// Whether this step is shown as reached when the workflow is at `current`.
    pub fn is_reached(&self, current: WorkflowStep) -> bool {
        current >= *self
    }
}
