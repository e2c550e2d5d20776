//! Configuration loading. Accounts live under the `wps` node of a shared
//! token file so this tool can coexist with other automations using the same
//! file. A missing or unparsable file is fatal; a file without accounts is
//! merely an empty run.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use crate::notify::BarkConfig;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found at {}", .0.display())]
    Missing(PathBuf),
    #[error("config file unreadable: {0}")]
    Io(String),
    #[error("config parse failed: {0}")]
    Parse(String),
}

/// One account record. `user_id` and `cookies` are required for a sign-in to
/// be attempted; the runner turns their absence into a per-account failure
/// without touching the network.
#[derive(Debug, Clone, Deserialize)]
pub struct AccountConfig {
    pub account_name: Option<String>,
    pub user_id: Option<u64>,
    #[serde(default)]
    pub cookies: String,
    pub user_agent: Option<String>,
    /// Platform code sent in the encrypted payload. Defaults to 64, the
    /// value the desktop web client reports.
    pub platform: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct WpsSection {
    #[serde(default)]
    accounts: Vec<AccountConfig>,
}

#[derive(Debug, Deserialize)]
struct RawConfig {
    wps: Option<WpsSection>,
    bark: Option<BarkConfig>,
}

/// Runtime view of the config file.
#[derive(Debug)]
pub struct RuntimeConfig {
    pub accounts: Vec<AccountConfig>,
    pub bark: Option<BarkConfig>,
}

/// Loads and parses the JSON config. Account order in the file is the order
/// accounts are processed and reported in.
pub fn load_config(path: impl AsRef<Path>) -> Result<RuntimeConfig, ConfigError> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(ConfigError::Missing(path.to_path_buf()));
    }
    let raw_json = fs::read_to_string(path).map_err(|e| ConfigError::Io(format!("{e}")))?;
    let raw: RawConfig =
        serde_json::from_str(&raw_json).map_err(|e| ConfigError::Parse(format!("{e}")))?;

    Ok(RuntimeConfig {
        accounts: raw.wps.map(|w| w.accounts).unwrap_or_default(),
        bark: raw.bark,
    })
}
