use serde::Serialize;

use super::confidence::{ConfidenceBand, format_percent};
use super::playback::{PlaybackToggles, seek_offset};
use super::asset_name;
use crate::common::MatchRecord;
use crate::config::PresentationSettings;
use crate::gateway::ServiceEndpoints;
use crate::workflow::WorkflowState;

/// A score shown as a percentage with its confidence band.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreBadge {
    pub score: f64,
    pub percent: String,
    pub band: ConfidenceBand,
}

impl ScoreBadge {
    fn new(score: f64, band: ConfidenceBand) -> Self {
        Self {
            score,
            percent: format_percent(score),
            band,
        }
    }
}

/// What the media slot of a card shows.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum CardView {
    Frame { asset_name: String, image_url: String },
    /// The frame failed to load earlier; it is not fetched again.
    Unavailable { asset_name: String },
    Playback { stream_url: String, start_seconds: u64 },
}

impl CardView {
    pub fn is_unavailable(&self) -> bool {
        matches!(self, CardView::Unavailable { .. })
    }
}

/// One match, ready to render.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchCard {
    pub index: usize,
    pub rank: usize,
    pub title: String,
    pub job_id: String,
    pub timestamp: String,
    pub frame_number: u64,
    pub face: ScoreBadge,
    pub combined: ScoreBadge,
    pub gender: String,
    pub age: String,
    pub thumbnail_url: String,
    pub view: CardView,
}

/// Derives match cards from workflow snapshots.
#[derive(Debug, Clone)]
pub struct ResultPresenter {
    endpoints: ServiceEndpoints,
    assumed_frame_rate: f64,
    fallback_asset_name: String,
}

impl ResultPresenter {
    pub fn new(endpoints: ServiceEndpoints, settings: &PresentationSettings) -> Self {
        Self {
            endpoints,
            assumed_frame_rate: settings.assumed_frame_rate,
            fallback_asset_name: settings.fallback_asset_name.clone(),
        }
    }

    /// Cards for the current match list, in service order.
    pub fn present(&self, state: &WorkflowState, playback: &PlaybackToggles) -> Vec<MatchCard> {
        let generation = state.result_generation();
        state
            .matches()
            .iter()
            .enumerate()
            .map(|(index, record)| {
                let view = if playback.is_playing(generation, index) {
                    let start_seconds = seek_offset(
                        record.frame_number,
                        state.frame_rate(&record.job_id),
                        self.assumed_frame_rate,
                    );
                    CardView::Playback {
                        stream_url: self
                            .endpoints
                            .video_stream_at(&record.job_id, start_seconds)
                            .to_string(),
                        start_seconds,
                    }
                } else if state.failures().contains(index) {
                    CardView::Unavailable {
                        asset_name: self.asset_name(record).to_string(),
                    }
                } else {
                    let asset_name = self.asset_name(record);
                    CardView::Frame {
                        asset_name: asset_name.to_string(),
                        image_url: self.endpoints.match_asset(asset_name).to_string(),
                    }
                };
                self.card(index, record, view)
            })
            .collect()
    }

    fn asset_name<'a>(&'a self, record: &'a MatchRecord) -> &'a str {
        asset_name(&record.video_crop, &self.fallback_asset_name)
    }

    fn card(&self, index: usize, record: &MatchRecord, view: CardView) -> MatchCard {
        let title = if record.video_name.trim().is_empty() {
            record.job_id.clone()
        } else {
            record.video_name.clone()
        };
        MatchCard {
            index,
            rank: index + 1,
            title,
            job_id: record.job_id.clone(),
            timestamp: record.timestamp.clone(),
            frame_number: record.frame_number,
            face: ScoreBadge::new(
                record.face_similarity,
                ConfidenceBand::for_face_similarity(record.face_similarity),
            ),
            combined: ScoreBadge::new(
                record.final_score,
                ConfidenceBand::for_final_score(record.final_score),
            ),
            gender: record
                .vid_gender
                .as_deref()
                .filter(|gender| !gender.trim().is_empty())
                .unwrap_or("N/A")
                .to_string(),
            age: record
                .vid_age
                .map(|age| age.to_string())
                .unwrap_or_else(|| "N/A".to_string()),
            thumbnail_url: self
                .endpoints
                .thumbnail(&record.job_id, record.frame_number)
                .to_string(),
            view,
        }
    }
}
