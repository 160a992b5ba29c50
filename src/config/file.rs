//! TOML configuration file loading
//!
//! Supports `~/.config/omni/messenger-bridge/config.toml` as a persistent config
//! source. All fields are optional; the file is a partial overlay on top of
//! defaults. Secrets are never read from the file.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::Result;

/// Top-level TOML configuration file schema
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BridgeConfigFile {
    /// Server/runtime configuration
    #[serde(default)]
    pub server: ServerFileConfig,

    /// Completion API configuration
    #[serde(default)]
    pub llm: LlmFileConfig,

    /// Messenger Send API configuration
    #[serde(default)]
    pub messenger: MessengerFileConfig,

    /// Assistant persona
    #[serde(default)]
    pub persona: PersonaFileConfig,
}

/// Server/runtime configuration
#[derive(Debug, Default, Deserialize)]
pub struct ServerFileConfig {
    /// HTTP port
    pub port: Option<u16>,

    /// Path to the `SQLite` database file
    pub database_path: Option<PathBuf>,
}

/// Completion API configuration
#[derive(Debug, Default, Deserialize)]
pub struct LlmFileConfig {
    /// Model identifier (e.g. "gpt-3.5-turbo")
    pub model: Option<String>,

    /// `OpenAI`-compatible base URL
    pub base_url: Option<String>,

    /// Past turns sent with each request
    pub history_window: Option<usize>,
}

/// Messenger configuration
#[derive(Debug, Default, Deserialize)]
pub struct MessengerFileConfig {
    /// Graph API base URL (e.g. `https://graph.facebook.com/v12.0`)
    pub graph_api_url: Option<String>,
}

/// Persona configuration
#[derive(Debug, Default, Deserialize)]
pub struct PersonaFileConfig {
    pub name: Option<String>,
    pub system_prompt: Option<String>,
}

/// Parse a config file
///
/// # Errors
///
/// Returns error if the file cannot be read or is not valid TOML
pub fn read_config_file(path: &Path) -> Result<BridgeConfigFile> {
    let content = std::fs::read_to_string(path)?;
    let config = toml::from_str(&content)?;
    tracing::info!(path = %path.display(), "loaded config file");
    Ok(config)
}

/// Load the TOML config file from the standard path
///
/// Returns `BridgeConfigFile::default()` if the file doesn't exist or can't be parsed.
#[must_use]
pub fn load_config_file() -> BridgeConfigFile {
    let Some(path) = config_file_path() else {
        return BridgeConfigFile::default();
    };

    if !path.exists() {
        return BridgeConfigFile::default();
    }

    read_config_file(&path).unwrap_or_else(|e| {
        tracing::warn!(
            path = %path.display(),
            error = %e,
            "failed to load config file, using defaults"
        );
        BridgeConfigFile::default()
    })
}

/// Return the config file path: `~/.config/omni/messenger-bridge/config.toml`
#[must_use]
pub fn config_file_path() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|d| {
        d.config_dir()
            .join("omni")
            .join("messenger-bridge")
            .join("config.toml")
    })
}
