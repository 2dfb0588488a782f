use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde_json::{Map, Value};
use tracing::{debug, info, trace};

use crate::domain::{AppError, Route};

/// Storage key holding the bearer token.
pub const TOKEN_KEY: &str = "authToken";

/// Authentication context shared by the login screen and the session guard.
///
/// A session starts anonymous, becomes authenticated once a token is stored
/// and is cleared again on logout.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Session {
    token: Option<String>,
}

impl Session {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn with_token(token: impl Into<String>) -> Self {
        let mut session = Self::anonymous();
        session.sign_in(token);
        session
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    /// Presence only. The token is never validated client side.
    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    pub fn sign_in(&mut self, token: impl Into<String>) {
        let token = token.into();
        // An empty token counts as no token at all.
        self.token = if token.is_empty() { None } else { Some(token) };
    }

    pub fn sign_out(&mut self) {
        self.token = None;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardDecision {
    Allow,
    Redirect(Route),
}

/// Gate for the dashboard: without a token the user is sent to the login route.
pub fn guard(session: &Session) -> GuardDecision {
    if session.is_authenticated() {
        GuardDecision::Allow
    } else {
        trace!("No {TOKEN_KEY} present, redirecting to {}", Route::Login.path());
        GuardDecision::Redirect(Route::Login)
    }
}

/// Client local key/value storage backed by a json object file.
///
/// Only the `authToken` key is read or written, other keys are preserved.
#[derive(Debug, Clone)]
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> Result<Session, AppError> {
        let entries = self.read_entries()?;
        let session = match entries.get(TOKEN_KEY) {
            Some(Value::String(token)) => Session::with_token(token.as_str()),
            _ => Session::anonymous(),
        };
        debug!(
            "Loaded session from {:?}, authenticated: {}",
            self.path,
            session.is_authenticated()
        );
        Ok(session)
    }

    pub fn save(&self, session: &Session) -> Result<(), AppError> {
        let mut entries = self.read_entries()?;
        match session.token() {
            Some(token) => {
                entries.insert(TOKEN_KEY.to_string(), Value::String(token.to_string()));
            }
            None => {
                entries.remove(TOKEN_KEY);
            }
        }
        self.write_entries(&entries)?;
        info!("Stored session in {:?}", self.path);
        Ok(())
    }

    pub fn clear(&self) -> Result<(), AppError> {
        self.save(&Session::anonymous())
    }

    fn read_entries(&self) -> Result<Map<String, Value>, AppError> {
        match fs::read_to_string(&self.path) {
            Ok(content) if content.trim().is_empty() => Ok(Map::new()),
            Ok(content) => Ok(serde_json::from_str(&content)?),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(Map::new()),
            Err(e) => Err(AppError::Io(e)),
        }
    }

    fn write_entries(&self, entries: &Map<String, Value>) -> Result<(), AppError> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, serde_json::to_string_pretty(entries)?)?;
        Ok(())
    }
}

#[cfg(test)]
pub(crate) fn scratch_path(name: &str) -> PathBuf {
    std::env::temp_dir()
        .join(format!("catalog-admin-{}", std::process::id()))
        .join(name)
}
