//! Persisted login session
//!
//! Stored as JSON at `$TASKDECK_SESSION`, or `~/.taskdeck/session.json`.

use directories::BaseDirs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{ClientError, ClientResult};

const SESSION_DIR: &str = ".taskdeck";
const SESSION_FILE: &str = "session.json";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub token: String,
    pub email: String,
}

/// Default session path under the user's home directory
pub fn default_path() -> ClientResult<PathBuf> {
    let base_dirs = BaseDirs::new();
    path_in_home(base_dirs.as_ref().map(BaseDirs::home_dir))
}

fn path_in_home(home: Option<&Path>) -> ClientResult<PathBuf> {
    let home = home.ok_or(ClientError::NoHomeDir)?;
    Ok(home.join(SESSION_DIR).join(SESSION_FILE))
}

impl Session {
    /// Loads the session, `None` when nobody is logged in
    pub fn load(path: &Path) -> ClientResult<Option<Self>> {
        let raw = match std::fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(ClientError::Session {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };

        serde_json::from_str(&raw)
            .map(Some)
            .map_err(|source| ClientError::SessionFormat {
                path: path.to_path_buf(),
                source,
            })
    }

    pub fn save(&self, path: &Path) -> ClientResult<()> {
        let io_err = |source| ClientError::Session {
            path: path.to_path_buf(),
            source,
        };

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(io_err)?;
        }

        let raw = serde_json::to_string_pretty(self).map_err(|source| ClientError::SessionFormat {
            path: path.to_path_buf(),
            source,
        })?;

        std::fs::write(path, raw).map_err(io_err)
    }

    /// Removes the session file; succeeds when there was none
    pub fn clear(path: &Path) -> ClientResult<()> {
        match std::fs::remove_file(path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(ClientError::Session {
                path: path.to_path_buf(),
                source,
            }),
        }
    }
}
