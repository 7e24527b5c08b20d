use std::path::PathBuf;

use thiserror::Error;

/// Failures talking to the flight price backend. `Display` is what the
/// status bar shows.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    #[error("{0}")]
    Network(String),
    #[error("server responded with status {0}")]
    Status(u16),
    #[error("could not read server response: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        match err.status() {
            Some(status) => Self::Status(status.as_u16()),
            None => Self::Network(err.to_string()),
        }
    }
}

impl From<simd_json::Error> for ApiError {
    fn from(err: simd_json::Error) -> Self {
        Self::Decode(err.to_string())
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_network_message_is_passed_through() {
        assert_eq!(ApiError::Network("network error".into()).to_string(), "network error");
        assert_eq!(ApiError::Status(502).to_string(), "server responded with status 502");
    }
}
