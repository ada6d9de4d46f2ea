use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use log::info;
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::models::UserId;
use crate::playback::PlaybackConfig;

pub const DEFAULT_API_BASE_URL: &str = "http://192.168.8.101:8000/";
pub const DEFAULT_MEDIA_BASE_URL: &str = "http://192.168.8.101:8000";

/// Configuration loading errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Could not determine config directory")]
    MissingDirectory,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub api_base_url: String,
    pub media_base_url: String,
    pub username: Option<String>,
    pub user_id: Option<UserId>,
    /// Access token, base64 encoded at rest
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    pub playback: PlaybackConfig,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            media_base_url: DEFAULT_MEDIA_BASE_URL.to_string(),
            username: None,
            user_id: None,
            token: None,
            playback: PlaybackConfig::default(),
        }
    }
}

impl ClientConfig {
    pub fn set_token(&mut self, token: &str) {
        self.token = Some(BASE64.encode(token));
    }

    pub fn get_token(&self) -> Option<String> {
        self.token.as_ref().and_then(|encoded| {
            let bytes = BASE64.decode(encoded).ok()?;
            String::from_utf8(bytes).ok()
        })
    }

    /// Environment wins over the file for anything set.
    pub fn apply_env(&mut self) {
        if let Ok(url) = env::var("STATUSREEL_API_URL") {
            self.api_base_url = url;
        }
        if let Ok(url) = env::var("STATUSREEL_MEDIA_URL") {
            self.media_base_url = url;
        }
        if let Ok(token) = env::var("STATUSREEL_TOKEN") {
            self.set_token(&token);
        }
        if let Some(id) = env::var("STATUSREEL_USER_ID").ok().and_then(|v| v.trim().parse().ok()) {
            self.user_id = Some(id);
        }
    }
}

static CONFIG_PATH_OVERRIDE: OnceCell<PathBuf> = OnceCell::new();

pub fn set_config_path_override(path: PathBuf) {
    let _ = CONFIG_PATH_OVERRIDE.set(path);
}

pub fn get_config_dir() -> Result<PathBuf, ConfigError> {
    let config_dir = dirs::config_dir()
        .ok_or(ConfigError::MissingDirectory)?
        .join("statusreel");

    if !config_dir.exists() {
        fs::create_dir_all(&config_dir)?;
    }

    Ok(config_dir)
}

pub fn get_config_path() -> Result<PathBuf, ConfigError> {
    if let Some(path) = CONFIG_PATH_OVERRIDE.get() {
        return Ok(path.clone());
    }
    Ok(get_config_dir()?.join("config.json"))
}

pub fn save_config_to(config: &ClientConfig, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let file = File::create(path)?;
    serde_json::to_writer_pretty(file, config)?;
    info!("Configuration saved to {}", path.display());
    Ok(())
}

/// Missing file means defaults.
pub fn load_config_from(path: &Path) -> Result<ClientConfig, ConfigError> {
    if !path.exists() {
        return Ok(ClientConfig::default());
    }
    let contents = fs::read_to_string(path)?;
    let config: ClientConfig = serde_json::from_str(&contents)?;
    info!("Loaded configuration from {}", path.display());
    Ok(config)
}

pub fn save_config(config: &ClientConfig) -> Result<(), ConfigError> {
    save_config_to(config, &get_config_path()?)
}

/// File (or defaults) with environment overrides applied.
pub fn load_config() -> Result<ClientConfig, ConfigError> {
    let mut config = load_config_from(&get_config_path()?)?;
    config.apply_env();
    Ok(config)
}
