use std::path::Path;
use std::time::Duration;

use config::{Config, Environment, File};
use serde::Deserialize;

use crate::error::AppError;

const ENV_PREFIX: &str = "PERSON_SEARCH";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub service: ServiceSettings,
    pub search: SearchSettings,
    pub presentation: PresentationSettings,
    pub orchestrator: OrchestratorSettings,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServiceSettings {
    pub base_url: String,
    pub request_timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SearchSettings {
    pub top_k: usize,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PresentationSettings {
    pub assumed_frame_rate: f64,
    pub fallback_asset_name: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OrchestratorSettings {
    pub command_buffer: usize,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8000".to_string(),
            request_timeout_secs: None,
        }
    }
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self { top_k: 20 }
    }
}

impl Default for PresentationSettings {
    fn default() -> Self {
        Self {
            assumed_frame_rate: crate::presentation::ASSUMED_FRAME_RATE,
            fallback_asset_name: crate::presentation::FALLBACK_ASSET_NAME.to_string(),
        }
    }
}

impl Default for OrchestratorSettings {
    fn default() -> Self {
        Self { command_buffer: 32 }
    }
}

impl ServiceSettings {
    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
    }
}

impl Settings {
    /// Loads settings from an optional file, then `PERSON_SEARCH__*` environment variables.
    pub fn load(path: Option<&Path>) -> Result<Self, AppError> {
        let mut builder = Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(File::from(path).required(true));
        }
        let settings = builder
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize::<Settings>()?;
        Ok(settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.service.base_url, "http://127.0.0.1:8000");
        assert_eq!(settings.search.top_k, 20);
        assert_eq!(settings.presentation.assumed_frame_rate, 30.0);
        assert_eq!(settings.presentation.fallback_asset_name, "unknown.jpg");
        assert!(settings.service.request_timeout().is_none());
    }

    #[test]
    fn test_zero_timeout_means_none() {
        let service = ServiceSettings {
            request_timeout_secs: Some(0),
            ..ServiceSettings::default()
        };
        assert!(service.request_timeout().is_none());
    }

    #[test]
    fn test_load_from_file_keeps_unset_defaults() {
        let path = std::env::temp_dir().join(format!("person-search-{}.toml", uuid::Uuid::new_v4()));
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "[service]\nbase_url = \"http://search.local:9000\"\nrequest_timeout_secs = 15\n\n[search]\ntop_k = 5").unwrap();
        drop(file);

        let settings = Settings::load(Some(path.as_path())).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(settings.service.base_url, "http://search.local:9000");
        assert_eq!(settings.service.request_timeout(), Some(Duration::from_secs(15)));
        assert_eq!(settings.search.top_k, 5);
        assert_eq!(settings.presentation.assumed_frame_rate, 30.0);
    }
}
