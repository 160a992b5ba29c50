//! Configuration management for the messenger bridge
//!
//! Values are layered: built-in defaults, then the optional TOML file, then
//! environment variables. Secrets come from the environment only.

pub mod file;

use std::path::{Path, PathBuf};

use secrecy::SecretString;

use self::file::BridgeConfigFile;
use crate::channels::DEFAULT_GRAPH_API_URL;
use crate::completion::{DEFAULT_BASE_URL, DEFAULT_HISTORY_WINDOW, DEFAULT_MODEL};
use crate::persona::Persona;
use crate::{Error, Result};

/// Default HTTP port
pub const DEFAULT_PORT: u16 = 5001;

/// Default database file, relative to the working directory
pub const DEFAULT_DATABASE_PATH: &str = "chat_history.db";

/// Messenger bridge configuration
///
/// Built once at startup and handed to each component.
#[derive(Debug)]
pub struct Config {
    /// HTTP port to listen on
    pub port: u16,

    /// Path to the `SQLite` database file
    pub database_path: PathBuf,

    /// Completion API key (`OPENAI_API_KEY`)
    pub openai_api_key: SecretString,

    /// Page access token for the Send API (`FB_ACCESS_TOKEN`)
    pub page_access_token: SecretString,

    /// Shared secret for webhook verification (`VERIFY_TOKEN`)
    pub verify_token: SecretString,

    /// Completion API configuration
    pub llm: LlmConfig,

    /// Graph API base URL
    pub graph_api_url: String,

    /// Assistant persona
    pub persona: Persona,
}

/// Completion API configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LlmConfig {
    /// Model identifier
    pub model: String,

    /// `OpenAI`-compatible base URL
    pub base_url: String,

    /// Past turns sent with each request
    pub history_window: usize,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            history_window: DEFAULT_HISTORY_WINDOW,
        }
    }
}

impl Config {
    /// Load configuration from the config file and process environment
    ///
    /// An explicit `config_path` must exist and parse; the default location
    /// is optional.
    ///
    /// # Errors
    ///
    /// Returns error if a required secret is missing, a value is malformed, or
    /// the explicit config file cannot be loaded
    pub fn load(config_path: Option<&Path>) -> Result<Self> {
        Self::from_sources(load_file(config_path)?, |key| std::env::var(key).ok())
    }

    /// Build configuration from a parsed file and an environment lookup
    ///
    /// # Errors
    ///
    /// Returns error if a required secret is missing or a value is malformed
    pub fn from_sources(
        file: BridgeConfigFile,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self> {
        let lookup = |key: &str| non_blank(env(key));

        let openai_api_key = required_secret(&lookup, "OPENAI_API_KEY")?;
        let page_access_token = required_secret(&lookup, "FB_ACCESS_TOKEN")?;
        let verify_token = required_secret(&lookup, "VERIFY_TOKEN")?;

        let port = match lookup("BRIDGE_PORT").or_else(|| lookup("PORT")) {
            Some(raw) => parse_value("BRIDGE_PORT", &raw)?,
            None => file.server.port.unwrap_or(DEFAULT_PORT),
        };

        let database_path = resolve_database_path(file.server.database_path, &env);

        let history_window = match lookup("BRIDGE_HISTORY_WINDOW") {
            Some(raw) => parse_value("BRIDGE_HISTORY_WINDOW", &raw)?,
            None => file.llm.history_window.unwrap_or(DEFAULT_HISTORY_WINDOW),
        };

        let llm = LlmConfig {
            model: lookup("BRIDGE_LLM_MODEL")
                .or(file.llm.model)
                .unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            base_url: lookup("OPENAI_BASE_URL")
                .or(file.llm.base_url)
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            history_window,
        };

        let graph_api_url = lookup("BRIDGE_GRAPH_API_URL")
            .or(file.messenger.graph_api_url)
            .unwrap_or_else(|| DEFAULT_GRAPH_API_URL.to_string());

        let mut persona = Persona::default();
        if let Some(name) = file.persona.name {
            persona.name = name;
        }
        let persona = persona
            .with_system_prompt(file.persona.system_prompt)
            .with_system_prompt(lookup("BRIDGE_PERSONA_PROMPT"));

        Ok(Self {
            port,
            database_path,
            openai_api_key,
            page_access_token,
            verify_token,
            llm,
            graph_api_url,
            persona,
        })
    }

    /// Override the port (e.g. from the command line)
    #[must_use]
    pub fn with_port(mut self, port: Option<u16>) -> Self {
        if let Some(port) = port {
            self.port = port;
        }
        self
    }
}

/// Resolve only the database path, without requiring any secret
///
/// # Errors
///
/// Returns error if the explicit config file cannot be loaded
pub fn load_database_path(config_path: Option<&Path>) -> Result<PathBuf> {
    let file = load_file(config_path)?;
    Ok(resolve_database_path(file.server.database_path, |key| {
        std::env::var(key).ok()
    }))
}

/// An explicit path must exist and parse; the default location is optional
fn load_file(config_path: Option<&Path>) -> Result<BridgeConfigFile> {
    match config_path {
        Some(path) => file::read_config_file(path),
        None => Ok(file::load_config_file()),
    }
}

/// `BRIDGE_DB_PATH`, then the file's `database_path`, then the default
fn resolve_database_path(
    from_file: Option<PathBuf>,
    env: impl Fn(&str) -> Option<String>,
) -> PathBuf {
    non_blank(env("BRIDGE_DB_PATH"))
        .map(PathBuf::from)
        .or(from_file)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_DATABASE_PATH))
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn required_secret(lookup: impl Fn(&str) -> Option<String>, key: &str) -> Result<SecretString> {
    lookup(key)
        .map(SecretString::from)
        .ok_or_else(|| Error::Config(format!("{key} is not set")))
}

fn parse_value<T: std::str::FromStr>(key: &str, raw: &str) -> Result<T> {
    raw.trim()
        .parse()
        .map_err(|_| Error::Config(format!("invalid value for {key}: {raw}")))
}
