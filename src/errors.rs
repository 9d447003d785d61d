use std::path::{Path, PathBuf};

use crate::response::ApiError;

/// All error types that can occur while discovering or registering with a bridge.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A default application is already configured for this installation.
    #[error("default application already registered")]
    AlreadyRegistered,

    /// Discovery finished without seeing a single bridge.
    #[error("no bridge found")]
    NoBridgeFound,

    /// No default application has been registered yet.
    #[error("no default application configured")]
    NotConfigured,

    /// The bridge referenced by the default application could not be located.
    #[error("unable to find bridge: {0}")]
    BridgeNotFound(String),

    /// The bridge rejected a request (e.g. the link button was not pressed).
    #[error("bridge rejected request: {0}")]
    Api(ApiError),

    /// The bridge answered with an envelope carrying neither success nor error.
    #[error("unexpected bridge response: {0}")]
    UnexpectedResponse(String),

    /// A UDP socket operation failed during discovery.
    #[error("socket {action} error: {err:?}")]
    Socket { action: String, err: std::io::Error },

    /// An HTTP request to a bridge or the discovery directory failed.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// Reading or writing the config directory failed.
    #[error("storage {action} error on {}: {err:?}", .path.display())]
    Storage {
        action: String,
        path: PathBuf,
        err: std::io::Error,
    },

    /// Failed to serialize data to JSON.
    #[error("failed to dump json: {0:?}")]
    JsonDump(serde_json::Error),

    /// Failed to deserialize JSON data.
    #[error("failed to load json: {0:?}")]
    JsonLoad(serde_json::Error),

    /// Failed to parse a [`crate::Percent`] from a string.
    #[error("invalid percent string: {0}")]
    InvalidPercent(String),
}

impl Error {
    /// Create a new socket error
    pub fn socket(action: &str, err: std::io::Error) -> Self {
        Error::Socket {
            action: action.to_string(),
            err,
        }
    }

    /// Create a new storage error
    pub fn storage(action: &str, path: &Path, err: std::io::Error) -> Self {
        Error::Storage {
            action: action.to_string(),
            path: path.to_path_buf(),
            err,
        }
    }

    /// Network failure while talking to a bridge or the directory service.
    pub fn is_transport(&self) -> bool {
        matches!(self, Error::Socket { .. } | Error::Http(_))
    }

    /// Failure of the local config directory.
    pub fn is_storage(&self) -> bool {
        matches!(self, Error::Storage { .. })
    }
}

/// Hacky implementation of PartialEq for testing
#[cfg(test)]
impl PartialEq for Error {
    fn eq(&self, other: &Self) -> bool {
        self.to_string() == other.to_string()
    }
}
