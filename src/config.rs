//! Runtime configuration from environment variables (a `.env` file is
//! loaded first by `main`).

use crate::catalog::NormalizeOptions;
use std::path::PathBuf;

pub const DEFAULT_DATA_LOCATION: &str = "static/data.json";
pub const DEFAULT_STATE_DIR: &str = ".guesswho";
pub const DEFAULT_PORT: u16 = 8080;

#[derive(Debug, Clone)]
pub struct AppConfig {
    /// URL or file path of the data document
    pub data_location: String,
    /// Directory holding the persisted session blobs
    pub state_dir: PathBuf,
    pub port: u16,
    pub normalize: NormalizeOptions,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_location: DEFAULT_DATA_LOCATION.to_string(),
            state_dir: PathBuf::from(DEFAULT_STATE_DIR),
            port: DEFAULT_PORT,
            normalize: NormalizeOptions::default(),
        }
    }
}

/// Trimmed value of an env var, None if unset or blank
fn env_value(name: &str) -> Option<String> {
    std::env::var(name).ok().and_then(|value| {
        let trimmed = value.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_string())
    })
}

impl AppConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let port = match env_value("GUESSWHO_PORT") {
            Some(raw) => raw.parse().unwrap_or_else(|_| {
                tracing::warn!("Invalid GUESSWHO_PORT '{}', using {}", raw, DEFAULT_PORT);
                DEFAULT_PORT
            }),
            None => DEFAULT_PORT,
        };

        Self {
            data_location: env_value("GUESSWHO_DATA").unwrap_or(defaults.data_location),
            state_dir: env_value("GUESSWHO_STATE_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.state_dir),
            port,
            normalize: NormalizeOptions {
                comfort_question_id: env_value("GUESSWHO_COMFORT_QUESTION")
                    .unwrap_or(defaults.normalize.comfort_question_id),
                comfort_photo_slot: env_value("GUESSWHO_COMFORT_SLOT")
                    .unwrap_or(defaults.normalize.comfort_photo_slot),
            },
        }
    }
}
