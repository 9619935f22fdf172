//! The four-step search workflow: enroll, scope, search, present.

pub mod orchestrator;
pub mod stages;
pub mod state;
pub mod step;

pub use orchestrator::{Dispatch, Ticket, WorkflowHandle, WorkflowOrchestrator};
pub use state::{BusyFlags, FailureSet, Stage, WorkflowState};
pub use step::WorkflowStep;
