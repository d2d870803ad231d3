//! Session token store.
//!
//! Owns the one opaque secret the client persists: the backend session
//! token. Constructed once at bootstrap and handed to the HTTP layer and
//! the auth use cases; nothing else reads or writes the token file.

use std::{
    fs,
    io::ErrorKind,
    path::{Path, PathBuf},
    sync::{Arc, RwLock},
};

use crate::infra::{error::AppError, storage_layout::StorageLayout};

#[derive(Debug, Clone)]
pub struct SessionStore {
    inner: Arc<Inner>,
}

#[derive(Debug)]
struct Inner {
    path: PathBuf,
    token: RwLock<Option<String>>,
}

impl SessionStore {
    /// Opens the store at the standard layout location, loading any token
    /// persisted by a previous run.
    pub fn open(layout: &StorageLayout) -> Result<Self, AppError> {
        layout.ensure_dirs()?;
        Self::from_path(layout.session_token_file())
    }

    pub fn from_path(path: PathBuf) -> Result<Self, AppError> {
        let token = match fs::read_to_string(&path) {
            Ok(raw) => {
                let trimmed = raw.trim();
                (!trimmed.is_empty()).then(|| trimmed.to_owned())
            }
            Err(source) if source.kind() == ErrorKind::NotFound => None,
            Err(source) => return Err(AppError::SessionRead { path, source }),
        };

        Ok(Self {
            inner: Arc::new(Inner {
                path,
                token: RwLock::new(token),
            }),
        })
    }

    pub fn token(&self) -> Option<String> {
        self.inner
            .token
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.token().is_some()
    }

    pub fn set(&self, token: &str) -> Result<(), AppError> {
        fs::write(&self.inner.path, token).map_err(|source| AppError::SessionWrite {
            path: self.inner.path.clone(),
            source,
        })?;

        *self
            .inner
            .token
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(token.to_owned());
        Ok(())
    }

    /// Removes the token from memory and disk. Idempotent.
    pub fn clear(&self) -> Result<(), AppError> {
        match fs::remove_file(&self.inner.path) {
            Ok(()) => {}
            Err(source) if source.kind() == ErrorKind::NotFound => {}
            Err(source) => {
                return Err(AppError::SessionWrite {
                    path: self.inner.path.clone(),
                    source,
                })
            }
        }

        *self
            .inner
            .token
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = None;
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.inner.path
    }
}
