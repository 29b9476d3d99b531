use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum LedgerError {
    #[error("event type is empty")]
    Empty,
    #[error("event type '{0}' contains a comma or whitespace and cannot be stored in a ledger")]
    Unrepresentable(String),
}

/// Failure applying one patch to one matched element.
#[derive(Debug, Error)]
pub enum PatchError {
    #[error("failed to decode patch: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("invalid selector '{0}'")]
    InvalidSelector(String),
    #[error("child index {index} out of range for '{selector}' ({len} child nodes)")]
    ChildIndexOutOfRange {
        selector: String,
        index: usize,
        len: usize,
    },
    #[error("html fragment for '{0}' produced no nodes")]
    EmptyFragment(String),
    #[error("element matched by '{0}' has no parent")]
    Parentless(String),
    #[error("ledger error: {0}")]
    Ledger(#[from] LedgerError),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("failed to parse endpoint URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
    #[error("unsupported endpoint scheme '{0}'")]
    UnsupportedScheme(String),
}

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("websocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),
}
