use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

const DEFAULT_API_URL: &str = "http://127.0.0.1:8000";

/// Top-level application configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Base URL of the consultation backend.
    pub api_url: String,
    /// Upper bound for every backend call.
    pub request_timeout_secs: u64,
    /// Send a finished transcript straight away instead of leaving it in the input.
    pub auto_send_dictation: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.into(),
            request_timeout_secs: 60,
            auto_send_dictation: false,
        }
    }
}

impl Config {
    /// Directory: ~/.config/consult-desk/
    fn dir() -> PathBuf {
        let mut p = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
        p.push("consult-desk");
        p
    }

    fn path() -> PathBuf {
        Self::dir().join("config.json")
    }

    /// Load from disk. A missing file is written out with defaults so it can be edited.
    pub fn load() -> Self {
        let path = Self::path();
        if !path.exists() {
            let config = Self::default();
            if let Err(e) = config.save_to(&path) {
                log::warn!("Failed to write default config: {e}");
            }
            return config;
        }
        Self::load_from(&path)
    }

    /// Load from `path`, returning defaults if the file is missing or invalid.
    pub fn load_from(path: &Path) -> Self {
        match fs::read_to_string(path) {
            Ok(data) => serde_json::from_str(&data).unwrap_or_else(|e| {
                log::warn!("Ignoring invalid config {}: {e}", path.display());
                Self::default()
            }),
            Err(_) => Self::default(),
        }
    }

    /// Persist to `path`, creating parent directories.
    pub fn save_to(&self, path: &Path) -> Result<(), Box<dyn std::error::Error>> {
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)?;
        }
        let data = serde_json::to_string_pretty(self)?;
        fs::write(path, data)?;
        Ok(())
    }

    /// Backend base URL without a trailing slash.
    pub fn base_url(&self) -> &str {
        self.api_url.trim_end_matches('/')
    }
}
