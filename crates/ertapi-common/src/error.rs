use thiserror::Error;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid URL {url:?}: {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("Network capabilities capped: host not in allowlist for URL {0}")]
    Forbidden(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Expected a JSON object from {url}, got {found}")]
    UnexpectedJson { url: String, found: &'static str },

    #[error("Configuration error: {0}")]
    Config(#[from] ertapi_config::ConfigError),

    #[error("Transport error: {0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, TransportError>;
