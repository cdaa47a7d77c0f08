//! Environment-based configuration.

use std::path::PathBuf;

use chrono::Duration;
use glimmind_core::types::{DEFAULT_THRESHOLD, FALLBACK_THRESHOLD};
use glimmind_core::DEFAULT_FEEDBACK_PAUSE_MS;

/// Runtime configuration for the CLI.
#[derive(Debug, Clone)]
pub struct Config {
    /// Directory holding one JSON document per list.
    pub data_dir: PathBuf,
    /// Owner id stamped on new lists and used to filter listings.
    pub owner_id: String,
    /// Threshold given to new lists.
    pub default_threshold: f64,
    /// Pause between an accepted typed answer and the advance.
    pub feedback_pause: Duration,
}

impl Config {
    /// Read `GLIMMIND_*` variables. Call `dotenvy::dotenv()` first to
    /// pick up a `.env` file.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let data_dir = lookup("GLIMMIND_DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(default_data_dir);

        let owner_id = lookup("GLIMMIND_OWNER")
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| "local".to_string());

        let default_threshold = match lookup("GLIMMIND_THRESHOLD") {
            Some(raw) => match raw.trim().parse::<f64>() {
                Ok(t) if (0.0..=1.0).contains(&t) => t,
                _ => {
                    tracing::warn!(value = %raw, fallback = FALLBACK_THRESHOLD, "invalid GLIMMIND_THRESHOLD");
                    FALLBACK_THRESHOLD
                }
            },
            None => DEFAULT_THRESHOLD,
        };

        let pause_ms = match lookup("GLIMMIND_FEEDBACK_PAUSE_MS") {
            Some(raw) => raw.trim().parse::<i64>().unwrap_or_else(|_| {
                tracing::warn!(value = %raw, "invalid GLIMMIND_FEEDBACK_PAUSE_MS");
                DEFAULT_FEEDBACK_PAUSE_MS
            }),
            None => DEFAULT_FEEDBACK_PAUSE_MS,
        };

        Self {
            data_dir,
            owner_id,
            default_threshold,
            feedback_pause: Duration::milliseconds(pause_ms.max(0)),
        }
    }
}

fn default_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("glimmind").join("lists"))
        .unwrap_or_else(|| PathBuf::from("./glimmind-data"))
}
