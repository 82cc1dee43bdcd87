//! Error types for the update engine

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using the update engine's error type
pub type Result<T> = std::result::Result<T, UpdateError>;

/// Failures surfaced while resolving, downloading or installing a release
#[derive(Error, Debug)]
pub enum UpdateError {
    /// Could not construct the HTTP client
    #[error("Failed to create HTTP client: {0}")]
    HttpClient(#[source] reqwest::Error),

    /// Transport failure reaching the API or an asset URL
    #[error("Request to {url} failed: {source}")]
    Network {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// Non-2xx response from the release API
    #[error("GitHub API returned {status} for {url}: {body}")]
    Api {
        url: String,
        status: u16,
        body: String,
    },

    /// Response body was not the expected JSON shape
    #[error("Failed to decode response from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },

    /// Filesystem failure in the install directory or state file
    #[error("I/O error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Persisted state could not be read or written
    #[error("State store error: {message}")]
    State { message: String },

    /// No release asset matches the host platform
    #[error("No distribution of Expert is available for your platform: {expected}")]
    UnsupportedPlatform { expected: String },

    /// Installed artifact belongs to another platform and no replacement could be fetched
    #[error("The installed Expert build targets {installed}, but this machine is {current}")]
    PlatformMismatch { installed: String, current: String },
}

impl UpdateError {
    /// Create an I/O error bound to a path
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Create a state store error
    pub fn state(message: impl Into<String>) -> Self {
        Self::State {
            message: message.into(),
        }
    }

    /// Whether the failure happened while talking to the release API
    pub fn is_remote(&self) -> bool {
        matches!(
            self,
            Self::Network { .. } | Self::Api { .. } | Self::Decode { .. }
        )
    }
}
