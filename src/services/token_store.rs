// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Persisted credential state: the access token and the cached user record.
//!
//! Both fields live in one snapshot that is written as a unit, so a reader
//! never sees a token without its user or a user without its token after a
//! `clear()`.

use crate::models::UserRecord;
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

/// Everything the client persists between runs.
///
/// Field names match the two storage keys used by the web client.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PersistedSession {
    pub access_token: Option<String>,
    pub user_data: Option<UserRecord>,
}

impl PersistedSession {
    pub fn is_empty(&self) -> bool {
        self.access_token.is_none() && self.user_data.is_none()
    }
}

/// Where snapshots are kept.
pub trait StorageBackend: Send + Sync {
    /// Read the stored snapshot (empty if nothing is stored).
    fn load(&self) -> Result<PersistedSession, StoreError>;

    /// Replace the stored snapshot in one step.
    fn save(&self, snapshot: &PersistedSession) -> Result<(), StoreError>;
}

/// Storage errors
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Corrupted session file: {0}")]
    Corrupted(String),
}

// ─────────────────────────────────────────────────────────────────────────────
// Backends
// ─────────────────────────────────────────────────────────────────────────────

/// In-process storage, for tests and throwaway sessions.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    snapshot: Mutex<PersistedSession>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_snapshot(snapshot: PersistedSession) -> Self {
        Self {
            snapshot: Mutex::new(snapshot),
        }
    }
}

impl StorageBackend for MemoryStorage {
    fn load(&self) -> Result<PersistedSession, StoreError> {
        Ok(self
            .snapshot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone())
    }

    fn save(&self, snapshot: &PersistedSession) -> Result<(), StoreError> {
        *self.snapshot.lock().unwrap_or_else(PoisonError::into_inner) = snapshot.clone();
        Ok(())
    }
}

/// JSON file storage: `{"access_token": ..., "user_data": ...}`.
///
/// Writes go to a sibling temp file and are renamed into place.
#[derive(Debug, Clone)]
pub struct FileStorage {
    path: PathBuf,
}

impl FileStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: std::io::Error) -> StoreError {
        StoreError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

impl StorageBackend for FileStorage {
    fn load(&self) -> Result<PersistedSession, StoreError> {
        let raw = match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(PersistedSession::default())
            }
            Err(e) => return Err(self.io_error(e)),
        };

        // An unreadable file is treated as no session; the next save replaces it.
        let value: serde_json::Value = match serde_json::from_str(&raw) {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    path = %self.path.display(),
                    "Discarding corrupted session file"
                );
                return Ok(PersistedSession::default());
            }
        };

        let access_token = value
            .get("access_token")
            .and_then(|v| v.as_str())
            .map(str::to_string);

        // A user record that no longer parses is dropped; the token survives.
        let user_data = match value.get("user_data") {
            None | Some(serde_json::Value::Null) => None,
            Some(raw_user) => match serde_json::from_value::<UserRecord>(raw_user.clone()) {
                Ok(user) => Some(user),
                Err(e) => {
                    tracing::warn!(error = %e, "Discarding corrupted cached user data");
                    None
                }
            },
        };

        Ok(PersistedSession {
            access_token,
            user_data,
        })
    }

    fn save(&self, snapshot: &PersistedSession) -> Result<(), StoreError> {
        if snapshot.is_empty() {
            return match std::fs::remove_file(&self.path) {
                Ok(()) => Ok(()),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
                Err(e) => Err(self.io_error(e)),
            };
        }

        let body = serde_json::to_vec_pretty(snapshot)
            .map_err(|e| StoreError::Corrupted(e.to_string()))?;

        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);

        write_private(&tmp, &body).map_err(|e| self.io_error(e))?;
        std::fs::rename(&tmp, &self.path).map_err(|e| self.io_error(e))
    }
}

/// Write `body` to a fresh file only the owner can read.
fn write_private(path: &Path, body: &[u8]) -> std::io::Result<()> {
    match std::fs::remove_file(path) {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => return Err(e),
    }

    let mut options = std::fs::OpenOptions::new();
    options.write(true).create_new(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }

    let mut file = options.open(path)?;
    file.write_all(body)?;
    file.sync_all()
}

// ─────────────────────────────────────────────────────────────────────────────
// TokenStore
// ─────────────────────────────────────────────────────────────────────────────

/// Shared credential store.
///
/// Holds an in-memory copy of the snapshot behind a mutex. Every mutation
/// writes the backend first and only then swaps the in-memory copy, so a
/// failed write leaves the previous state in place.
pub struct TokenStore {
    backend: Box<dyn StorageBackend>,
    state: Mutex<PersistedSession>,
}

impl TokenStore {
    /// Open a store, loading whatever the backend currently holds.
    ///
    /// A user record without a token is never loaded.
    pub fn open(backend: impl StorageBackend + 'static) -> Result<Self, StoreError> {
        let mut snapshot = backend.load()?;
        if snapshot.access_token.is_none() && snapshot.user_data.is_some() {
            tracing::warn!("Cached user data without a token, dropping it");
            snapshot = PersistedSession::default();
            backend.save(&snapshot)?;
        }

        Ok(Self {
            backend: Box::new(backend),
            state: Mutex::new(snapshot),
        })
    }

    /// Empty in-memory store.
    pub fn in_memory() -> Self {
        Self {
            backend: Box::new(MemoryStorage::new()),
            state: Mutex::new(PersistedSession::default()),
        }
    }

    /// Current access token, if any.
    pub fn get(&self) -> Option<String> {
        self.lock().access_token.clone()
    }

    /// Cached user record, if any.
    pub fn user(&self) -> Option<UserRecord> {
        self.lock().user_data.clone()
    }

    /// Token and user read under one lock.
    pub fn snapshot(&self) -> PersistedSession {
        self.lock().clone()
    }

    /// Store a token together with its user record.
    ///
    /// `None` for the user removes any previously cached record.
    pub fn set(&self, token: &str, user: Option<&UserRecord>) -> Result<(), StoreError> {
        let next = PersistedSession {
            access_token: Some(token.to_string()),
            user_data: user.cloned(),
        };
        self.replace(next)
    }

    /// Refresh the cached user, but only while `token` is still the stored one.
    ///
    /// Returns false (and writes nothing) if the session was cleared or
    /// replaced since `token` was read.
    pub fn update_user_if_current(
        &self,
        token: &str,
        user: &UserRecord,
    ) -> Result<bool, StoreError> {
        let mut state = self.lock();
        if state.access_token.as_deref() != Some(token) {
            return Ok(false);
        }

        let next = PersistedSession {
            access_token: Some(token.to_string()),
            user_data: Some(user.clone()),
        };
        self.backend.save(&next)?;
        *state = next;
        Ok(true)
    }

    /// Remove token and user together.
    pub fn clear(&self) -> Result<(), StoreError> {
        self.replace(PersistedSession::default())
    }

    fn replace(&self, next: PersistedSession) -> Result<(), StoreError> {
        let mut state = self.lock();
        self.backend.save(&next)?;
        *state = next;
        Ok(())
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, PersistedSession> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for TokenStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.lock();
        f.debug_struct("TokenStore")
            .field("has_token", &state.access_token.is_some())
            .field("has_user", &state.user_data.is_some())
            .finish()
    }
}
