//! The three network-backed stages. Each is a stateless function from the
//! relevant slice of workflow state plus user input to a result; applying the
//! result is up to the orchestrator.

pub mod comparison;
pub mod enrollment;
pub mod footage;
