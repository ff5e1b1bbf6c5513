//! Client error type

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// Non-success response; `message` is the server's own text
    #[error("{message}")]
    Api { status: u16, message: String },

    #[error("Not logged in (run `taskdeck login` first)")]
    NotLoggedIn,

    #[error("Could not resolve the home directory; pass --session or set TASKDECK_SESSION")]
    NoHomeDir,

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Session file {path}: {source}")]
    Session {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid session file {path}: {source}")]
    SessionFormat {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl ClientError {
    /// HTTP status of an API error
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}

pub type ClientResult<T> = Result<T, ClientError>;
