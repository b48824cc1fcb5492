//! Application configuration for SourceChat.
//!
//! User config lives at `~/.sourcechat/sourcechat.toml`.
//! CLI flags (and their env vars) override config file values, which
//! override defaults.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{ClientError, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "sourcechat.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".sourcechat";

/// Default credential database file name, inside the config directory.
const CREDENTIALS_DB_NAME: &str = "credentials.db";

/// Endpoints that never carry a bearer token.
pub const DEFAULT_PUBLIC_PATHS: &[&str] = &[
    "/api/v1/auth/login",
    "/api/v1/auth/send-otp",
    "/api/v1/auth/verify-otp",
    "/api/v1/auth/google",
    "/api/v1/auth/refresh",
];

// ---------------------------------------------------------------------------
// Config structs (matching sourcechat.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Backend API settings.
    #[serde(default)]
    pub api: ApiConfig,

    /// Local credential storage.
    #[serde(default)]
    pub storage: StorageConfig,
}

/// `[api]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URL of the backend, e.g. `https://api.sourcechat.app`.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Whole-request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// TCP/TLS connect timeout in seconds.
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,

    /// Paths sent without an `Authorization` header.
    #[serde(default = "default_public_paths")]
    pub public_paths: Vec<String>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
            connect_timeout_secs: default_connect_timeout_secs(),
            public_paths: default_public_paths(),
        }
    }
}

fn default_base_url() -> String {
    "https://api.sourcechat.app".into()
}
fn default_timeout_secs() -> u64 {
    30
}
fn default_connect_timeout_secs() -> u64 {
    10
}
fn default_public_paths() -> Vec<String> {
    DEFAULT_PUBLIC_PATHS.iter().map(|p| (*p).to_string()).collect()
}

/// `[storage]` section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Path to the credential database. Defaults to
    /// `~/.sourcechat/credentials.db`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credentials_db: Option<String>,
}

// ---------------------------------------------------------------------------
// Client config (runtime, validated)
// ---------------------------------------------------------------------------

/// Runtime HTTP client configuration: validated form of [`ApiConfig`].
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Parsed base URL; always http or https.
    pub base_url: Url,
    /// Whole-request timeout.
    pub timeout: Duration,
    /// Connect timeout.
    pub connect_timeout: Duration,
    /// Paths sent without a bearer token.
    pub public_paths: Vec<String>,
}

impl ClientConfig {
    /// Build a client config for `base_url` with default timeouts and
    /// the default public allowlist.
    pub fn new(base_url: &str) -> Result<Self> {
        let api = ApiConfig {
            base_url: base_url.to_string(),
            ..ApiConfig::default()
        };
        Self::try_from(&api)
    }
}

impl TryFrom<&ApiConfig> for ClientConfig {
    type Error = ClientError;

    fn try_from(api: &ApiConfig) -> Result<Self> {
        let base_url = Url::parse(&api.base_url).map_err(|e| {
            ClientError::config(format!("invalid api.base_url '{}': {e}", api.base_url))
        })?;

        if !matches!(base_url.scheme(), "http" | "https") {
            return Err(ClientError::config(format!(
                "api.base_url must be http or https, got '{}'",
                base_url.scheme()
            )));
        }

        if api.timeout_secs == 0 {
            return Err(ClientError::config("api.timeout_secs must be greater than 0"));
        }

        Ok(Self {
            base_url,
            timeout: Duration::from_secs(api.timeout_secs),
            connect_timeout: Duration::from_secs(api.connect_timeout_secs.max(1)),
            public_paths: api.public_paths.clone(),
        })
    }
}

impl TryFrom<&AppConfig> for ClientConfig {
    type Error = ClientError;

    fn try_from(config: &AppConfig) -> Result<Self> {
        Self::try_from(&config.api)
    }
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.sourcechat/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| ClientError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.sourcechat/sourcechat.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Resolve where the credential database lives.
pub fn credentials_db_path(config: &AppConfig) -> Result<PathBuf> {
    match &config.storage.credentials_db {
        Some(path) => Ok(PathBuf::from(path)),
        None => Ok(config_dir()?.join(CREDENTIALS_DB_NAME)),
    }
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| ClientError::io(path, e))?;

    toml::from_str(&content)
        .map_err(|e| ClientError::config(format!("failed to parse {}: {e}", path.display())))
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| ClientError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| ClientError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| ClientError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}
