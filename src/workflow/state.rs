use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;
use tracing::{debug, warn};

use super::stages::{comparison, enrollment, footage};
use super::step::WorkflowStep;
use crate::common::{FootageInfo, FootageJob, MatchRecord, ReferenceRecord, SearchScope};
use crate::error::WorkflowError;
use crate::gateway::{SearchOutcome, SearchRequest};

/// The network-backed stages, each with its own re-entrancy guard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Stage {
    Enrollment,
    Ingestion,
    Comparison,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Enrollment => "enrollment",
            Stage::Ingestion => "ingestion",
            Stage::Comparison => "comparison",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BusyFlags {
    pub enrolling: bool,
    pub ingesting: bool,
    pub searching: bool,
}

impl BusyFlags {
    pub fn is_busy(&self, stage: Stage) -> bool {
        match stage {
            Stage::Enrollment => self.enrolling,
            Stage::Ingestion => self.ingesting,
            Stage::Comparison => self.searching,
        }
    }

    pub fn any(&self) -> bool {
        self.enrolling || self.ingesting || self.searching
    }

    fn set(&mut self, stage: Stage, busy: bool) {
        match stage {
            Stage::Enrollment => self.enrolling = busy,
            Stage::Ingestion => self.ingesting = busy,
            Stage::Comparison => self.searching = busy,
        }
    }
}

/// Positions in the current match list whose image could not be loaded.
///
/// Keys are positions, which is sound because the match list is never
/// reordered or filtered locally. The set belongs to one result generation;
/// reports carrying an older generation are dropped.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FailureSet {
    generation: u64,
    indices: BTreeSet<usize>,
}

impl FailureSet {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn contains(&self, index: usize) -> bool {
        self.indices.contains(&index)
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        self.indices.iter().copied()
    }

    fn reset(&mut self, generation: u64) {
        self.generation = generation;
        self.indices.clear();
    }

    fn record(&mut self, generation: u64, index: usize) -> bool {
        generation == self.generation && self.indices.insert(index)
    }
}

/// Everything the search workflow knows for one session.
///
/// Only the orchestrator mutates it; everyone else reads snapshots.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct WorkflowState {
    step: WorkflowStep,
    status_message: String,
    busy: BusyFlags,
    scope: SearchScope,
    references: Vec<ReferenceRecord>,
    footage: Option<FootageJob>,
    matches: Vec<MatchRecord>,
    failures: FailureSet,
    result_generation: u64,
    frame_rates: BTreeMap<String, f64>,
}

impl WorkflowState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn step(&self) -> WorkflowStep {
        self.step
    }

    pub fn status_message(&self) -> &str {
        &self.status_message
    }

    pub fn busy(&self) -> BusyFlags {
        self.busy
    }

    pub fn scope(&self) -> &SearchScope {
        &self.scope
    }

    pub fn references(&self) -> &[ReferenceRecord] {
        &self.references
    }

    pub fn footage(&self) -> Option<&FootageJob> {
        self.footage.as_ref()
    }

    pub fn matches(&self) -> &[MatchRecord] {
        &self.matches
    }

    pub fn failures(&self) -> &FailureSet {
        &self.failures
    }

    /// Incremented by every search that replaces the match list.
    pub fn result_generation(&self) -> u64 {
        self.result_generation
    }

    /// Frame rate reported by the service for a job, when it is usable.
    pub fn frame_rate(&self, job_id: &str) -> Option<f64> {
        self.frame_rates.get(job_id).copied()
    }

    /// Marks `stage` busy and sets the progress narrative. Returns `false` if
    /// the stage already has a call outstanding.
    pub(crate) fn try_begin(&mut self, stage: Stage, status: impl Into<String>) -> bool {
        if self.busy.is_busy(stage) {
            debug!("Ignoring re-entrant {} request", stage.as_str());
            return false;
        }
        self.busy.set(stage, true);
        self.status_message = status.into();
        true
    }

    pub(crate) fn reject(&mut self, err: &WorkflowError) {
        self.status_message = err.to_string();
    }

    pub(crate) fn apply_enrollment(&mut self, outcome: Result<Vec<ReferenceRecord>, WorkflowError>) {
        self.busy.set(Stage::Enrollment, false);
        match outcome {
            Ok(records) => {
                self.references = records;
                self.clear_results();
                self.advance_to(WorkflowStep::ReferenceReady);
                self.status_message = enrollment::SUCCEEDED.to_string();
            }
            Err(err) => self.reject(&err),
        }
    }

    pub(crate) fn apply_ingestion(&mut self, outcome: Result<FootageJob, WorkflowError>) {
        self.busy.set(Stage::Ingestion, false);
        match outcome {
            Ok(job) => {
                self.status_message = footage::success_message(&job);
                self.scope = SearchScope::SingleJob(job.job_id.clone());
                self.footage = Some(job);
                self.advance_to(WorkflowStep::ScopeReady);
            }
            Err(err) => self.reject(&err),
        }
    }

    /// Explicit scope choice. Needs no network call; completes the scope step
    /// once a reference is enrolled.
    pub(crate) fn select_scope(&mut self, scope: SearchScope) {
        if let Some(job_id) = scope.job_filter() {
            self.footage = Some(FootageJob::new(job_id));
        }
        self.status_message = format!("Search scope set to {}", scope);
        self.scope = scope;
        if self.step >= WorkflowStep::ReferenceReady {
            self.advance_to(WorkflowStep::ScopeReady);
        }
    }

    pub(crate) fn prepare_search(&self, top_k: usize) -> Result<SearchRequest, WorkflowError> {
        comparison::prepare(&self.references, &self.scope, top_k)
    }

    /// Applies a finished search. A failure keeps the previous results intact.
    pub(crate) fn apply_search(
        &mut self,
        request: &SearchRequest,
        outcome: Result<SearchOutcome, WorkflowError>,
    ) {
        self.busy.set(Stage::Comparison, false);
        match outcome {
            Ok(_) if !self.is_current_reference(&request.reference_id) => {
                debug!(
                    "Dropping results for superseded reference {}",
                    request.reference_id
                );
                self.status_message =
                    "Reference changed while searching; run the search again".to_string();
            }
            Ok(outcome) => {
                self.status_message = comparison::success_message(&outcome);
                self.matches = outcome.matches;
                self.result_generation += 1;
                self.failures.reset(self.result_generation);
                self.advance_to(WorkflowStep::ResultsReady);
            }
            Err(err) => self.reject(&err),
        }
    }

    /// Records that the image for `index` failed to load. Additive only.
    pub(crate) fn record_image_failure(&mut self, generation: u64, index: usize) -> bool {
        if index >= self.matches.len() {
            return false;
        }
        self.failures.record(generation, index)
    }

    pub(crate) fn apply_footage_info(&mut self, job_id: &str, outcome: Result<FootageInfo, WorkflowError>) {
        match outcome {
            Ok(info) if info.fps.is_finite() && info.fps > 1.0 => {
                self.frame_rates.insert(job_id.to_string(), info.fps);
            }
            Ok(info) => debug!("Ignoring unusable frame rate {} for job {}", info.fps, job_id),
            // The caller gets the error through its ticket; a late failure must
            // not replace a newer status.
            Err(err) => warn!("Could not load video info for {}: {}", job_id, err),
        }
    }

    fn is_current_reference(&self, reference_id: &str) -> bool {
        self.references
            .first()
            .is_some_and(|reference| reference.person_id == reference_id)
    }

    fn clear_results(&mut self) {
        self.matches.clear();
        self.result_generation += 1;
        self.failures.reset(self.result_generation);
    }

    fn advance_to(&mut self, step: WorkflowStep) {
        self.step = self.step.max(step);
    }
}
