//! The logged-in session: bearer token plus who it belongs to.
//!
//! A session is an explicit value handed to the API client. It is persisted as
//! `session.json` next to the config so a login survives between runs, and
//! removed on logout or when the server rejects the token.

use std::fs::{self, File};
use std::io::Write;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};

pub const SESSION_FILE: &str = "session.json";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub access_token: String,
    #[serde(default)]
    pub email: Option<String>,
}

impl Session {
    pub fn new(access_token: impl Into<String>, email: Option<String>) -> Self {
        Self { access_token: access_token.into(), email }
    }

    /// Value for the `Authorization` header.
    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.access_token)
    }

    /// Load the stored session, if any. A corrupt file counts as no session.
    pub fn load(dir: &Path) -> Option<Self> {
        let path = dir.join(SESSION_FILE);
        let buf = fs::read_to_string(&path).ok()?;
        match serde_json::from_str::<Session>(&buf) {
            Ok(s) if !s.access_token.is_empty() => Some(s),
            Ok(_) => None,
            Err(e) => {
                log::warn!("discarding unreadable session file {}: {}", path.display(), e);
                None
            }
        }
    }

    /// Load the stored session or fail with [`AppError::Unauthorized`].
    pub fn require(dir: &Path) -> AppResult<Self> {
        Self::load(dir).ok_or_else(|| AppError::Unauthorized("no stored session, run `bl login`".into()))
    }

    /// Persist via temp file + rename so a crash never leaves half a token.
    pub fn save(&self, dir: &Path) -> AppResult<()> {
        fs::create_dir_all(dir)?;
        let path = dir.join(SESSION_FILE);
        let tmp = path.with_extension("json.tmp");
        let mut f = File::create(&tmp)?;
        f.write_all(serde_json::to_string_pretty(self)?.as_bytes())?;
        f.flush()?;
        fs::rename(tmp, path)?;
        Ok(())
    }

    /// Remove the stored session. Clearing an absent session is not an error.
    pub fn clear(dir: &Path) -> AppResult<()> {
        match fs::remove_file(dir.join(SESSION_FILE)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    /// Remove the stored session when `err` means the server no longer
    /// accepts it. Returns whether the session was dropped.
    pub fn clear_if_rejected(dir: &Path, err: &AppError) -> AppResult<bool> {
        if !err.is_auth() {
            return Ok(false);
        }
        Self::clear(dir)?;
        log::info!("session cleared after authentication failure");
        Ok(true)
    }
}
