use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    ReadFile(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("validation error: {0}")]
    Validation(String),
}

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP request failed for {url}: {source}")]
    Http { url: String, source: reqwest::Error },
    #[error("content API returned {status} for {url}")]
    Status { url: String, status: reqwest::StatusCode },
    #[error("failed to parse response from {url}: {message}")]
    Parse { url: String, message: String },
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("storage backend failed: {0}")]
    Backend(#[from] sqlx::Error),
    #[error("stored value under '{key}' is not valid: {source}")]
    Decode { key: String, source: serde_json::Error },
    #[error("failed to encode value for '{key}': {source}")]
    Encode { key: String, source: serde_json::Error },
}

#[derive(Debug, Error)]
pub enum EditError {
    #[error("missing required field: {0}")]
    MissingField(&'static str),
    #[error(transparent)]
    Store(#[from] StoreError),
}
