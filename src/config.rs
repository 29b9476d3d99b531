use std::fs;
use std::path::PathBuf;

use percent_encoding::{utf8_percent_encode, NON_ALPHANUMERIC};
use serde::Deserialize;
use url::Url;

use crate::error::ConfigError;

pub const CONFIG_ENV: &str = "LIVEPATCH_CONFIG";

const DEFAULT_ENDPOINT: &str = "ws://127.0.0.1:8080/__ws/{session}";
const SESSION_PLACEHOLDER: &str = "{session}";

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ClientConfig {
    /// Connection endpoint; `{session}` is replaced by the session identifier.
    pub endpoint: String,
    /// Attribute holding each element's comma-joined event types.
    pub ledger_attribute: String,
    /// Attribute holding each element's stable identifier.
    pub id_attribute: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            ledger_attribute: "data-events".to_string(),
            id_attribute: "data-id".to_string(),
        }
    }
}

impl ClientConfig {
    /// Load from a YAML file. A missing path or file yields the defaults.
    pub fn load(config_path: Option<PathBuf>) -> Result<Self, ConfigError> {
        match config_path {
            Some(path) if path.exists() => {
                let contents = fs::read_to_string(path)?;
                Ok(serde_yaml::from_str(&contents)?)
            }
            _ => Ok(Self::default()),
        }
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        Self::load(std::env::var(CONFIG_ENV).ok().map(PathBuf::from))
    }

    /// Websocket URL for `session_id`.
    pub fn endpoint_for(&self, session_id: &str) -> Result<Url, ConfigError> {
        let encoded = utf8_percent_encode(session_id, NON_ALPHANUMERIC).to_string();
        let templated = self.endpoint.contains(SESSION_PLACEHOLDER);
        let mut url = Url::parse(&self.endpoint.replace(SESSION_PLACEHOLDER, &encoded))?;
        if !templated {
            url.query_pairs_mut().append_pair("session", session_id);
        }

        let scheme = match url.scheme() {
            "ws" | "http" => "ws",
            "wss" | "https" => "wss",
            other => return Err(ConfigError::UnsupportedScheme(other.to_string())),
        };
        if url.scheme() != scheme && url.set_scheme(scheme).is_err() {
            return Err(ConfigError::UnsupportedScheme(url.scheme().to_string()));
        }
        Ok(url)
    }
}
