//! User configuration stored as `config.json` in the boardline config directory.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::AppResult;
use crate::fields::ViewMode;

pub const DEFAULT_API_URL: &str = "http://localhost:8000";
pub const API_URL_ENV: &str = "BOARDLINE_API_URL";
pub const CONFIG_FILE: &str = "config.json";
/// Widest day column the printed timeline accepts.
pub const MAX_DAY_WIDTH: u32 = 40;

fn default_api_url() -> String {
    DEFAULT_API_URL.into()
}

fn default_day_width() -> u32 {
    4
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_api_url")]
    pub api_url: String,
    #[serde(default)]
    pub view_mode: ViewMode,
    /// Terminal cells per day in the printed timeline.
    #[serde(default = "default_day_width")]
    pub day_width: u32,
    #[serde(default)]
    pub debug_logging: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            view_mode: ViewMode::default(),
            day_width: default_day_width(),
            debug_logging: false,
        }
    }
}

impl Config {
    /// Load from `dir`, falling back to defaults when the file is missing or broken.
    pub fn load(dir: &Path) -> Self {
        let path = dir.join(CONFIG_FILE);
        if !path.exists() {
            return Config::default();
        }
        match fs::read_to_string(&path) {
            Ok(buf) => match serde_json::from_str(&buf) {
                Ok(cfg) => cfg,
                Err(e) => {
                    log::warn!("error parsing {}, using defaults: {}", path.display(), e);
                    Config::default()
                }
            },
            Err(e) => {
                log::warn!("error reading {}, using defaults: {}", path.display(), e);
                Config::default()
            }
        }
    }

    pub fn save(&self, dir: &Path) -> AppResult<()> {
        fs::create_dir_all(dir)?;
        let data = serde_json::to_string_pretty(self)?;
        fs::write(dir.join(CONFIG_FILE), data)?;
        Ok(())
    }

    /// Apply the environment and command-line overrides, in that order.
    pub fn with_overrides(mut self, env_url: Option<String>, cli_url: Option<String>) -> Self {
        if let Some(url) = env_url.filter(|u| !u.trim().is_empty()) {
            self.api_url = url;
        }
        if let Some(url) = cli_url {
            self.api_url = url;
        }
        self.api_url = self.api_url.trim_end_matches('/').to_string();
        self
    }
}

/// Directory holding config, session and log files.
pub fn config_dir(override_dir: Option<&Path>) -> PathBuf {
    match override_dir {
        Some(dir) => dir.to_path_buf(),
        None => dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("boardline"),
    }
}
