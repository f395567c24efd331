//! Client settings, layered from lowest to highest precedence: built-in
//! defaults, the JSON file, `DEVCONNECT_*` environment variables, then
//! command-line flags.

use std::fs;
use std::io::ErrorKind;
use std::path::Path;
use std::time::Duration;

use reqwest::Url;
use serde::{Deserialize, Serialize};

pub const DEFAULT_CONFIG_PATH: &str = "config/client.json";

pub const API_URL_ENV: &str = "DEVCONNECT_API_URL";
pub const SOCKET_URL_ENV: &str = "DEVCONNECT_SOCKET_URL";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to write config: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to encode config: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Base URL of the DevConnect REST API.
    pub api_base_url: String,
    /// Origin of the realtime server. `http(s)` and `ws(s)` are both accepted.
    pub socket_url: String,
    pub request_timeout_secs: u64,
    /// Delay before the realtime connection is re-established after a drop.
    pub reconnect_delay_ms: u64,
    /// Oldest messages beyond this many are dropped from a conversation.
    /// Zero disables the cap.
    pub max_messages_per_conversation: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:7777".to_string(),
            socket_url: "http://localhost:7777".to_string(),
            request_timeout_secs: 15,
            reconnect_delay_ms: 2_000,
            max_messages_per_conversation: 500,
        }
    }
}

/// Endpoint overrides coming from the environment or the command line.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigOverrides {
    pub api_url: Option<String>,
    pub socket_url: Option<String>,
}

impl ConfigOverrides {
    /// Reads the `DEVCONNECT_*` variables through `lookup`. Blank values
    /// count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let non_empty = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        Self {
            api_url: non_empty(API_URL_ENV),
            socket_url: non_empty(SOCKET_URL_ENV),
        }
    }

    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }
}

impl AppConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn reconnect_delay(&self) -> Duration {
        Duration::from_millis(self.reconnect_delay_ms)
    }

    pub fn apply(&mut self, overrides: ConfigOverrides) {
        if let Some(url) = overrides.api_url {
            self.api_base_url = url;
        }
        if let Some(url) = overrides.socket_url {
            self.socket_url = url;
        }
    }

    /// Checks the endpoints and limits, trimming the trailing slash off the
    /// API base so paths can be appended as-is.
    pub fn validated(mut self) -> Result<Self, ConfigError> {
        let api = parse_url("api_base_url", &self.api_base_url, &["http", "https"])?;
        self.api_base_url = api.as_str().trim_end_matches('/').to_string();

        parse_url("socket_url", &self.socket_url, &["http", "https", "ws", "wss"])?;

        if self.request_timeout_secs == 0 {
            return Err(ConfigError::Invalid {
                field: "request_timeout_secs",
                reason: "must be at least one second".to_string(),
            });
        }
        Ok(self)
    }
}

fn parse_url(field: &'static str, raw: &str, schemes: &[&str]) -> Result<Url, ConfigError> {
    let url = Url::parse(raw.trim()).map_err(|err| ConfigError::Invalid {
        field,
        reason: format!("`{raw}` is not a URL ({err})"),
    })?;
    if !schemes.contains(&url.scheme()) {
        return Err(ConfigError::Invalid {
            field,
            reason: format!("scheme `{}` is not one of {}", url.scheme(), schemes.join(", ")),
        });
    }
    Ok(url)
}

/// Builds the effective configuration: the file at `path`, then `env`, then
/// `cli`.
pub fn resolve(
    path: &str,
    env: ConfigOverrides,
    cli: ConfigOverrides,
) -> Result<AppConfig, ConfigError> {
    let mut config = load_config(path);
    config.apply(env);
    config.apply(cli);
    config.validated()
}

/// Reads the config file. A missing file is normal on first start; an
/// unreadable or malformed one is reported and replaced by defaults.
pub fn load_config(path: &str) -> AppConfig {
    let path = Path::new(path);
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(err) if err.kind() == ErrorKind::NotFound => {
            log::info!("No config file at {}; using defaults", path.display());
            return AppConfig::default();
        }
        Err(err) => {
            log::warn!("Cannot read config file {}: {err}", path.display());
            return AppConfig::default();
        }
    };

    serde_json::from_str(&content).unwrap_or_else(|err| {
        log::warn!("Ignoring malformed config file {}: {err}", path.display());
        AppConfig::default()
    })
}

/// Writes `config` next to `path` first and renames it into place, so a
/// crash never leaves a truncated file behind.
pub fn save_config(path: &str, config: &AppConfig) -> Result<(), ConfigError> {
    let path = Path::new(path);
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let staging = path.with_extension("json.tmp");
    fs::write(&staging, serde_json::to_string_pretty(config)?)?;
    fs::rename(&staging, path)?;
    Ok(())
}
