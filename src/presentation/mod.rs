//! Render-ready view of the current match list.
//!
//! Nothing here mutates workflow state. Cards are derived from a
//! `WorkflowState` snapshot on every read.

pub mod card;
pub mod confidence;
pub mod playback;

pub use card::{CardView, MatchCard, ResultPresenter};
pub use confidence::{ConfidenceBand, format_percent};
pub use playback::{PlaybackToggles, seek_offset};

/// Frame rate used to turn a frame number into a seek offset when the
/// service has not reported the video's real rate.
pub const ASSUMED_FRAME_RATE: f64 = 30.0;

/// Asset name used when a match carries no usable crop path.
pub const FALLBACK_ASSET_NAME: &str = "unknown.jpg";

/// The addressable asset name of a crop path: its rightmost non-blank
/// segment, splitting on both `/` and `\`, kept byte for byte.
///
/// `.` and `..` name directories, not files, and resolve to `fallback`.
pub fn asset_name<'a>(video_crop: &'a str, fallback: &'a str) -> &'a str {
    match video_crop
        .rsplit(['/', '\\'])
        .find(|segment| !segment.trim().is_empty())
    {
        Some("." | "..") | None => fallback,
        Some(segment) => segment,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_asset_name_from_windows_path() {
        assert_eq!(
            asset_name("C:\\out\\frame_12.jpg", FALLBACK_ASSET_NAME),
            "frame_12.jpg"
        );
    }

    #[test]
    fn test_asset_name_from_unix_path() {
        assert_eq!(
            asset_name("/out/frame_12.jpg", FALLBACK_ASSET_NAME),
            "frame_12.jpg"
        );
        assert_eq!(asset_name("frame_12.jpg", FALLBACK_ASSET_NAME), "frame_12.jpg");
    }

    #[test]
    fn test_asset_name_falls_back() {
        assert_eq!(asset_name("", FALLBACK_ASSET_NAME), "unknown.jpg");
        assert_eq!(asset_name("/", FALLBACK_ASSET_NAME), "unknown.jpg");
        assert_eq!(asset_name(" \\ / ", FALLBACK_ASSET_NAME), "unknown.jpg");
    }

    #[test]
    fn test_asset_name_keeps_surrounding_spaces() {
        assert_eq!(
            asset_name("/out/ frame 1.jpg ", FALLBACK_ASSET_NAME),
            " frame 1.jpg "
        );
    }

    #[test]
    fn test_dot_segments_fall_back() {
        assert_eq!(asset_name("/out/..", FALLBACK_ASSET_NAME), "unknown.jpg");
        assert_eq!(asset_name("C:\\out\\.", FALLBACK_ASSET_NAME), "unknown.jpg");
        assert_eq!(asset_name("../", FALLBACK_ASSET_NAME), "unknown.jpg");
    }

    #[test]
    fn test_asset_name_skips_trailing_separators() {
        assert_eq!(
            asset_name("out/search\\frame_3.jpg/", FALLBACK_ASSET_NAME),
            "frame_3.jpg"
        );
    }
}
