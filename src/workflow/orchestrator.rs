use std::sync::Arc;

use tokio::sync::{mpsc, oneshot, watch};
use tokio_stream::wrappers::WatchStream;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::stages::{comparison, enrollment, footage};
use super::state::{Stage, WorkflowState};
use crate::common::{FootageInfo, FootageJob, MediaUpload, ReferenceRecord, SearchScope};
use crate::config::Settings;
use crate::error::{AppError, WorkflowError};
use crate::gateway::{SearchGateway, SearchOutcome, SearchRequest};
use crate::presentation::asset_name;

/// How the orchestrator handled a user action.
#[derive(Debug)]
pub enum Dispatch {
    /// A gateway call is in flight; the ticket resolves once its outcome is applied.
    Started(Ticket),
    /// Applied immediately, no network call needed.
    Applied,
    /// The same stage already has a call outstanding.
    Ignored,
    /// Refused locally before any network call.
    Rejected(WorkflowError),
}

impl Dispatch {
    pub fn is_ignored(&self) -> bool {
        matches!(self, Dispatch::Ignored)
    }

    /// Waits for a started call to be applied. Rejections surface as errors.
    pub async fn settle(self) -> Result<(), AppError> {
        match self {
            Dispatch::Started(ticket) => ticket.finished().await,
            Dispatch::Applied | Dispatch::Ignored => Ok(()),
            Dispatch::Rejected(err) => Err(err.into()),
        }
    }
}

#[derive(Debug)]
pub struct Ticket {
    done_rx: oneshot::Receiver<Result<(), WorkflowError>>,
}

impl Ticket {
    pub async fn finished(self) -> Result<(), AppError> {
        self.done_rx
            .await
            .map_err(|_| AppError::Orchestrator("workflow task stopped before the call finished".to_string()))?
            .map_err(AppError::from)
    }
}

type Done = oneshot::Sender<Result<(), WorkflowError>>;

pub(crate) enum WorkflowCommand {
    Enroll {
        image: MediaUpload,
        responder: oneshot::Sender<Dispatch>,
    },
    Ingest {
        video: MediaUpload,
        responder: oneshot::Sender<Dispatch>,
    },
    SelectScope {
        scope: SearchScope,
        responder: oneshot::Sender<Dispatch>,
    },
    Search {
        top_k: Option<usize>,
        responder: oneshot::Sender<Dispatch>,
    },
    ReportImageFailure {
        generation: u64,
        index: usize,
    },
    FetchAsset {
        generation: u64,
        index: usize,
        responder: oneshot::Sender<Result<Vec<u8>, WorkflowError>>,
    },
    LoadFootageInfo {
        job_id: String,
        responder: oneshot::Sender<Dispatch>,
    },
}

enum Completion {
    Enrolled {
        outcome: Result<Vec<ReferenceRecord>, WorkflowError>,
        done: Done,
    },
    Ingested {
        outcome: Result<FootageJob, WorkflowError>,
        done: Done,
    },
    Searched {
        request: SearchRequest,
        outcome: Result<SearchOutcome, WorkflowError>,
        done: Done,
    },
    AssetFetched {
        generation: u64,
        index: usize,
        outcome: Result<Vec<u8>, WorkflowError>,
        responder: oneshot::Sender<Result<Vec<u8>, WorkflowError>>,
    },
    FootageInfoLoaded {
        job_id: String,
        outcome: Result<FootageInfo, WorkflowError>,
        done: Done,
    },
}

/// Owns the session's `WorkflowState` and is its only writer.
struct Session {
    id: Uuid,
    gateway: Arc<dyn SearchGateway>,
    state: WorkflowState,
    default_top_k: usize,
    fallback_asset_name: String,
    state_tx: watch::Sender<WorkflowState>,
    completion_tx: mpsc::UnboundedSender<Completion>,
}

/// Actor that sequences the workflow's stages one action at a time.
pub struct WorkflowOrchestrator {
    session: Session,
    command_rx: mpsc::Receiver<WorkflowCommand>,
    completion_rx: mpsc::UnboundedReceiver<Completion>,
}

impl WorkflowOrchestrator {
    pub fn new(gateway: Arc<dyn SearchGateway>, settings: &Settings) -> (Self, WorkflowHandle) {
        let (command_tx, command_rx) = mpsc::channel(settings.orchestrator.command_buffer.max(1));
        let (completion_tx, completion_rx) = mpsc::unbounded_channel();
        let state = WorkflowState::new();
        let (state_tx, state_rx) = watch::channel(state.clone());
        let session = Session {
            id: Uuid::new_v4(),
            gateway,
            state,
            default_top_k: settings.search.top_k,
            fallback_asset_name: settings.presentation.fallback_asset_name.clone(),
            state_tx,
            completion_tx,
        };
        (
            Self {
                session,
                command_rx,
                completion_rx,
            },
            WorkflowHandle {
                command_tx,
                state_rx,
            },
        )
    }

    /// Runs until every handle is dropped or `cancel_token` fires.
    pub async fn run(self, cancel_token: CancellationToken) {
        let WorkflowOrchestrator {
            mut session,
            mut command_rx,
            mut completion_rx,
        } = self;
        info!(session = %session.id, "Search workflow started");
        loop {
            tokio::select! {
                biased;
                _ = cancel_token.cancelled() => {
                    debug!(session = %session.id, "Search workflow cancelled");
                    break;
                }
                Some(completion) = completion_rx.recv() => {
                    session.handle_completion(completion);
                }
                command = command_rx.recv() => match command {
                    Some(command) => session.handle_command(command),
                    None => {
                        debug!(session = %session.id, "All workflow handles dropped");
                        break;
                    }
                },
            }
        }
        info!(session = %session.id, "Search workflow stopped");
    }
}

impl Session {
    fn handle_command(&mut self, command: WorkflowCommand) {
        match command {
            WorkflowCommand::Enroll { image, responder } => {
                let _ = responder.send(self.start_enrollment(image));
            }
            WorkflowCommand::Ingest { video, responder } => {
                let _ = responder.send(self.start_ingestion(video));
            }
            WorkflowCommand::SelectScope { scope, responder } => {
                debug!(session = %self.id, "Selecting scope {}", scope);
                self.state.select_scope(scope);
                self.publish();
                let _ = responder.send(Dispatch::Applied);
            }
            WorkflowCommand::Search { top_k, responder } => {
                let _ = responder.send(self.start_search(top_k.unwrap_or(self.default_top_k)));
            }
            WorkflowCommand::ReportImageFailure { generation, index } => {
                self.record_image_failure(generation, index);
            }
            WorkflowCommand::FetchAsset {
                generation,
                index,
                responder,
            } => self.start_asset_fetch(generation, index, responder),
            WorkflowCommand::LoadFootageInfo { job_id, responder } => {
                let _ = responder.send(self.start_footage_info(job_id));
            }
        }
    }

    fn handle_completion(&mut self, completion: Completion) {
        match completion {
            Completion::Enrolled { outcome, done } => {
                match &outcome {
                    Ok(records) => info!(session = %self.id, "Enrolled {} reference record(s)", records.len()),
                    Err(e) => warn!(session = %self.id, "Enrollment failed: {}", e),
                }
                let result = outcome.as_ref().map(|_| ()).map_err(Clone::clone);
                self.state.apply_enrollment(outcome);
                self.publish();
                let _ = done.send(result);
            }
            Completion::Ingested { outcome, done } => {
                match &outcome {
                    Ok(job) => info!(session = %self.id, "Footage ingested as job {}", job.job_id),
                    Err(e) => warn!(session = %self.id, "Ingestion failed: {}", e),
                }
                let result = outcome.as_ref().map(|_| ()).map_err(Clone::clone);
                self.state.apply_ingestion(outcome);
                self.publish();
                let _ = done.send(result);
            }
            Completion::Searched {
                request,
                outcome,
                done,
            } => {
                match &outcome {
                    Ok(found) => info!(
                        session = %self.id,
                        "Search returned {} match(es), total {}",
                        found.matches.len(),
                        found.total_count
                    ),
                    Err(e) => warn!(session = %self.id, "Search failed: {}", e),
                }
                let result = outcome.as_ref().map(|_| ()).map_err(Clone::clone);
                self.state.apply_search(&request, outcome);
                self.publish();
                let _ = done.send(result);
            }
            Completion::AssetFetched {
                generation,
                index,
                outcome,
                responder,
            } => {
                if let Err(e) = &outcome {
                    debug!(session = %self.id, "Frame {} failed to load: {}", index, e);
                    self.record_image_failure(generation, index);
                }
                let _ = responder.send(outcome);
            }
            Completion::FootageInfoLoaded {
                job_id,
                outcome,
                done,
            } => {
                let result = outcome.as_ref().map(|_| ()).map_err(Clone::clone);
                self.state.apply_footage_info(&job_id, outcome);
                self.publish();
                let _ = done.send(result);
            }
        }
    }

    fn start_enrollment(&mut self, image: MediaUpload) -> Dispatch {
        if let Err(err) = enrollment::validate(&image) {
            return self.reject(err);
        }
        if !self.state.try_begin(Stage::Enrollment, enrollment::STARTED) {
            return Dispatch::Ignored;
        }
        self.publish();

        let (done, ticket) = ticket();
        let gateway = Arc::clone(&self.gateway);
        let completion_tx = self.completion_tx.clone();
        tokio::spawn(async move {
            let outcome = enrollment::run(gateway.as_ref(), image).await;
            let _ = completion_tx.send(Completion::Enrolled { outcome, done });
        });
        Dispatch::Started(ticket)
    }

    fn start_ingestion(&mut self, video: MediaUpload) -> Dispatch {
        if let Err(err) = footage::validate(&video) {
            return self.reject(err);
        }
        if !self.state.try_begin(Stage::Ingestion, footage::STARTED) {
            return Dispatch::Ignored;
        }
        self.publish();

        let (done, ticket) = ticket();
        let gateway = Arc::clone(&self.gateway);
        let completion_tx = self.completion_tx.clone();
        tokio::spawn(async move {
            let outcome = footage::run(gateway.as_ref(), video).await;
            let _ = completion_tx.send(Completion::Ingested { outcome, done });
        });
        Dispatch::Started(ticket)
    }

    fn start_search(&mut self, top_k: usize) -> Dispatch {
        let request = match self.state.prepare_search(top_k) {
            Ok(request) => request,
            Err(err) => return self.reject(err),
        };
        if !self
            .state
            .try_begin(Stage::Comparison, comparison::started_message(&request))
        {
            return Dispatch::Ignored;
        }
        self.publish();

        let (done, ticket) = ticket();
        let gateway = Arc::clone(&self.gateway);
        let completion_tx = self.completion_tx.clone();
        tokio::spawn(async move {
            let outcome = comparison::run(gateway.as_ref(), &request).await;
            let _ = completion_tx.send(Completion::Searched {
                request,
                outcome,
                done,
            });
        });
        Dispatch::Started(ticket)
    }

    fn start_asset_fetch(
        &mut self,
        generation: u64,
        index: usize,
        responder: oneshot::Sender<Result<Vec<u8>, WorkflowError>>,
    ) {
        if generation != self.state.result_generation() {
            let _ = responder.send(Err(WorkflowError::validation(
                "These results have been replaced by a newer search",
            )));
            return;
        }
        let Some(record) = self.state.matches().get(index) else {
            let _ = responder.send(Err(WorkflowError::validation(format!(
                "Match {} is not part of the current results",
                index + 1
            ))));
            return;
        };
        let asset = asset_name(&record.video_crop, &self.fallback_asset_name).to_string();
        if self.state.failures().contains(index) {
            let _ = responder.send(Err(WorkflowError::service(format!(
                "Frame {} not available",
                asset
            ))));
            return;
        }

        let gateway = Arc::clone(&self.gateway);
        let completion_tx = self.completion_tx.clone();
        tokio::spawn(async move {
            let outcome = gateway.fetch_match_asset(&asset).await;
            let _ = completion_tx.send(Completion::AssetFetched {
                generation,
                index,
                outcome,
                responder,
            });
        });
    }

    fn start_footage_info(&mut self, job_id: String) -> Dispatch {
        let job_id = job_id.trim().to_string();
        if job_id.is_empty() {
            return self.reject(WorkflowError::validation("Enter a video job id first"));
        }
        let (done, ticket) = ticket();
        let gateway = Arc::clone(&self.gateway);
        let completion_tx = self.completion_tx.clone();
        tokio::spawn(async move {
            let outcome = gateway.footage_info(&job_id).await;
            let _ = completion_tx.send(Completion::FootageInfoLoaded {
                job_id,
                outcome,
                done,
            });
        });
        Dispatch::Started(ticket)
    }

    fn record_image_failure(&mut self, generation: u64, index: usize) {
        if self.state.record_image_failure(generation, index) {
            debug!(session = %self.id, "Marked frame {} unavailable", index);
            self.publish();
        }
    }

    fn reject(&mut self, err: WorkflowError) -> Dispatch {
        debug!(session = %self.id, "Rejected locally: {}", err);
        self.state.reject(&err);
        self.publish();
        Dispatch::Rejected(err)
    }

    fn publish(&self) {
        self.state_tx.send_replace(self.state.clone());
    }
}

fn ticket() -> (Done, Ticket) {
    let (done_tx, done_rx) = oneshot::channel();
    (done_tx, Ticket { done_rx })
}

/// Cloneable front door to a running `WorkflowOrchestrator`.
#[derive(Clone)]
pub struct WorkflowHandle {
    command_tx: mpsc::Sender<WorkflowCommand>,
    state_rx: watch::Receiver<WorkflowState>,
}

impl WorkflowHandle {
    pub async fn enroll(&self, image: MediaUpload) -> Result<Dispatch, AppError> {
        self.request(|responder| WorkflowCommand::Enroll { image, responder })
            .await
    }

    pub async fn ingest(&self, video: MediaUpload) -> Result<Dispatch, AppError> {
        self.request(|responder| WorkflowCommand::Ingest { video, responder })
            .await
    }

    pub async fn select_scope(&self, scope: SearchScope) -> Result<Dispatch, AppError> {
        self.request(|responder| WorkflowCommand::SelectScope { scope, responder })
            .await
    }

    /// Searches with the configured `top_k`.
    pub async fn search(&self) -> Result<Dispatch, AppError> {
        self.request(|responder| WorkflowCommand::Search {
            top_k: None,
            responder,
        })
        .await
    }

    pub async fn search_top(&self, top_k: usize) -> Result<Dispatch, AppError> {
        self.request(|responder| WorkflowCommand::Search {
            top_k: Some(top_k),
            responder,
        })
        .await
    }

    /// Reports that the image for `index` of result generation `generation` failed to load.
    pub async fn report_image_failure(&self, generation: u64, index: usize) -> Result<(), AppError> {
        self.send(WorkflowCommand::ReportImageFailure { generation, index })
            .await
    }

    /// Downloads the frame image for a match. Frames already marked
    /// unavailable are refused without a network call.
    pub async fn fetch_match_asset(&self, generation: u64, index: usize) -> Result<Vec<u8>, AppError> {
        let (responder, response_rx) = oneshot::channel();
        self.send(WorkflowCommand::FetchAsset {
            generation,
            index,
            responder,
        })
        .await?;
        let bytes = response_rx.await.map_err(|_| closed())??;
        Ok(bytes)
    }

    pub async fn load_footage_info(&self, job_id: impl Into<String>) -> Result<Dispatch, AppError> {
        let job_id = job_id.into();
        self.request(|responder| WorkflowCommand::LoadFootageInfo { job_id, responder })
            .await
    }

    /// The latest published state.
    pub fn snapshot(&self) -> WorkflowState {
        self.state_rx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<WorkflowState> {
        self.state_rx.clone()
    }

    pub fn updates(&self) -> WatchStream<WorkflowState> {
        WatchStream::new(self.state_rx.clone())
    }

    async fn request(
        &self,
        command: impl FnOnce(oneshot::Sender<Dispatch>) -> WorkflowCommand,
    ) -> Result<Dispatch, AppError> {
        let (responder, response_rx) = oneshot::channel();
        self.send(command(responder)).await?;
        response_rx.await.map_err(|_| closed())
    }

    async fn send(&self, command: WorkflowCommand) -> Result<(), AppError> {
        self.command_tx.send(command).await.map_err(|_| closed())
    }
}

fn closed() -> AppError {
    AppError::Orchestrator("workflow task is not running".to_string())
}
