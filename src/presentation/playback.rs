use serde::Serialize;

/// Which result card, if any, is showing inline video instead of its frame.
///
/// One card plays at a time. The toggle remembers the result generation it was
/// set in so it never carries over to a later search's cards.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PlaybackToggles {
    playing: Option<(u64, usize)>,
}

impl PlaybackToggles {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts playback for `index`, or stops it if that card is already playing.
    pub fn toggle(&mut self, generation: u64, index: usize) {
        self.playing = match self.playing {
            Some(current) if current == (generation, index) => None,
            _ => Some((generation, index)),
        };
    }

    pub fn stop(&mut self) {
        self.playing = None;
    }

    pub fn is_playing(&self, generation: u64, index: usize) -> bool {
        self.playing == Some((generation, index))
    }
}

/// Whole seconds into the video at which `frame_number` appears.
///
/// Unusable rates (non-finite or not above 1) fall back to `assumed_rate`.
pub fn seek_offset(frame_number: u64, frame_rate: Option<f64>, assumed_rate: f64) -> u64 {
    let rate = frame_rate
        .filter(|rate| rate.is_finite() && *rate > 1.0)
        .unwrap_or(assumed_rate);
    if !rate.is_finite() || rate <= 0.0 {
        return 0;
    }
    (frame_number as f64 / rate).floor() as u64
}
