pub mod common;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod gateway;
pub mod presentation;
pub mod workflow;

pub use crate::common::{FootageInfo, FootageJob, MatchRecord, MediaUpload, ReferenceRecord, SearchScope};
pub use crate::config::Settings;
pub use crate::coordinator::{Coordinator, CoordinatorBuilder};
pub use crate::error::{AppError, WorkflowError};
pub use crate::gateway::{HttpGateway, SearchGateway, SearchOutcome, SearchRequest, ServiceEndpoints};
pub use crate::presentation::{CardView, MatchCard, PlaybackToggles, ResultPresenter};
pub use crate::workflow::{Dispatch, WorkflowHandle, WorkflowState, WorkflowStep};
