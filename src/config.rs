use anyhow::{anyhow, Result};
use log::info;
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::Read;
use std::path::{Path, PathBuf};

use crate::models::UserId;

/// Environment variable consulted when no user id is configured.
pub const USER_ID_ENV: &str = "CHATSYNC_USER_ID";

fn default_channel_capacity() -> usize {
    100
}

fn default_log_level() -> String {
    "info".to_string()
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ClientConfig {
    pub user_id: UserId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_file: Option<PathBuf>,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl ClientConfig {
    pub fn new(user_id: UserId) -> Self {
        ClientConfig {
            user_id,
            username: None,
            channel_capacity: default_channel_capacity(),
            log_file: None,
            log_level: default_log_level(),
        }
    }
}

static CONFIG_PATH_OVERRIDE: OnceCell<PathBuf> = OnceCell::new();

/// Use `path` instead of the per-user config file. Only the first call wins.
pub fn set_config_path_override(path: PathBuf) {
    let _ = CONFIG_PATH_OVERRIDE.set(path);
}

pub fn get_config_dir() -> Result<PathBuf> {
    let config_dir = dirs::config_dir()
        .ok_or_else(|| anyhow!("Could not determine config directory"))?
        .join("chatsync");

    if !config_dir.exists() {
        fs::create_dir_all(&config_dir)?;
    }

    Ok(config_dir)
}

fn get_config_path() -> Result<PathBuf> {
    if let Some(path) = CONFIG_PATH_OVERRIDE.get() {
        return Ok(path.clone());
    }
    Ok(get_config_dir()?.join("config.json"))
}

pub fn load_config() -> Result<Option<ClientConfig>> {
    load_config_from(&get_config_path()?)
}

pub fn save_config(config: &ClientConfig) -> Result<()> {
    save_config_to(&get_config_path()?, config)
}

pub fn load_config_from(path: &Path) -> Result<Option<ClientConfig>> {
    if !path.exists() {
        return Ok(None);
    }

    let mut file = File::open(path)?;
    let mut contents = String::new();
    file.read_to_string(&mut contents)?;

    let config: ClientConfig = serde_json::from_str(&contents)
        .map_err(|e| anyhow!("Invalid config {}: {}", path.display(), e))?;
    info!("Loaded config for user {} from {}", config.user_id, path.display());

    Ok(Some(config))
}

pub fn save_config_to(path: &Path, config: &ClientConfig) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent)?;
        }
    }
    let file = File::create(path)?;
    serde_json::to_writer_pretty(file, config)?;

    info!("Config saved for user {}", config.user_id);
    Ok(())
}

/// User id from the environment, if set and numeric.
pub fn user_id_from_env() -> Option<UserId> {
    std::env::var(USER_ID_ENV).ok()?.trim().parse().ok()
}
