use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::editor::labels::{default_palette, LabelSwatch};
use crate::suggest::SuggestionDelays;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ConfigPathError {
    MissingHomeDirectory,
}

const APP_DIR: &str = "labelforge";
const APP_CONFIG_FILE: &str = "config.json";

/// Application-level settings from `config.json`; every field is optional.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub active_user: String,
    pub labels: Vec<LabelSwatch>,
    pub surface_width: u32,
    pub surface_height: u32,
    pub suggestion_queue_ms: u64,
    pub suggestion_run_ms: u64,
    pub output_path: PathBuf,
    pub demo_task: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            active_user: "Alex Kim".to_string(),
            labels: default_palette(),
            surface_width: 640,
            surface_height: 480,
            suggestion_queue_ms: 1000,
            suggestion_run_ms: 2000,
            output_path: PathBuf::from("labelforge-canvas.png"),
            demo_task: "t2".to_string(),
        }
    }
}

impl AppConfig {
    pub fn suggestion_delays(&self) -> SuggestionDelays {
        SuggestionDelays {
            queued: Duration::from_millis(self.suggestion_queue_ms),
            running: Duration::from_millis(self.suggestion_run_ms),
        }
    }
}

pub fn load_app_config() -> AppConfig {
    let (xdg_config_home, home) = config_env_dirs();
    load_app_config_with(xdg_config_home.as_deref(), home.as_deref())
}

fn load_app_config_with(xdg_config_home: Option<&Path>, home: Option<&Path>) -> AppConfig {
    let path = match app_config_path(APP_DIR, APP_CONFIG_FILE, xdg_config_home, home) {
        Ok(p) => p,
        Err(_) => return AppConfig::default(),
    };
    if !path.exists() {
        return AppConfig::default();
    }
    match std::fs::read_to_string(&path) {
        Ok(contents) => serde_json::from_str(&contents).unwrap_or_else(|err| {
            tracing::warn!(?err, ?path, "failed to parse config.json; using defaults");
            AppConfig::default()
        }),
        Err(err) => {
            tracing::warn!(?err, ?path, "failed to read config.json; using defaults");
            AppConfig::default()
        }
    }
}

pub(crate) fn config_env_dirs() -> (Option<PathBuf>, Option<PathBuf>) {
    (
        std::env::var_os("XDG_CONFIG_HOME").map(PathBuf::from),
        std::env::var_os("HOME").map(PathBuf::from),
    )
}

pub(crate) fn app_config_path(
    app_dir: &str,
    file_name: &str,
    xdg_config_home: Option<&Path>,
    home: Option<&Path>,
) -> Result<PathBuf, ConfigPathError> {
    let mut path = config_root(xdg_config_home, home)?;
    path.push(app_dir);
    path.push(file_name);
    Ok(path)
}

fn config_root(
    xdg_config_home: Option<&Path>,
    home: Option<&Path>,
) -> Result<PathBuf, ConfigPathError> {
    if let Some(xdg) = xdg_config_home.filter(|path| !path.as_os_str().is_empty()) {
        return Ok(xdg.to_path_buf());
    }

    let home = home.ok_or(ConfigPathError::MissingHomeDirectory)?;
    Ok(home.join(".config"))
}
