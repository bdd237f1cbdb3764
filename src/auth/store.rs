//! Durable storage for persisted credentials.
//!
//! This module provides the [`TokenStore`] type for loading and saving a
//! [`Credential`] as a JSON file. Writes are atomic: the credential is
//! written to a sibling temporary file, synced, and renamed over the target,
//! so a concurrent reader never observes a partially written file.

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::auth::Credential;

/// Errors produced by [`TokenStore`] operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// No persisted credential exists at the configured path.
    #[error("No credential file found at '{path}'.")]
    NotFound {
        /// The path that was checked.
        path: String,
    },

    /// The persisted credential could not be parsed.
    #[error("Failed to parse credential file '{path}': {source}")]
    Decode {
        /// The path of the malformed file.
        path: String,
        /// The underlying parse error.
        #[source]
        source: serde_json::Error,
    },

    /// An I/O failure while reading or writing the credential file.
    #[error("I/O error for credential file '{path}': {source}")]
    Io {
        /// The path being read or written.
        path: String,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}

/// File-backed storage for a single [`Credential`].
///
/// The store owns a path and persists one JSON-encoded credential there.
/// On Unix, the file is created with owner-only permissions (`0o600`) since
/// it holds live tokens.
///
/// # Example
///
/// ```rust,ignore
/// use quickbooks_api::auth::TokenStore;
///
/// let store = TokenStore::new("/home/app/.quickbooks/token.json");
/// let credential = store.load()?;
/// // ... refresh ...
/// store.save(&credential)?;
/// ```
#[derive(Clone, Debug)]
pub struct TokenStore {
    path: PathBuf,
}

impl TokenStore {
    /// Creates a store backed by the given path.
    ///
    /// The path's parent directory is created lazily on the first save.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Returns the path this store reads and writes.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads the persisted credential.
    ///
    /// # Errors
    ///
    /// - [`StoreError::NotFound`] if no file exists at the path
    /// - [`StoreError::Decode`] if the file contents are not a valid credential
    /// - [`StoreError::Io`] for any other read failure
    pub fn load(&self) -> Result<Credential, StoreError> {
        if !self.path.exists() {
            return Err(StoreError::NotFound {
                path: self.path.display().to_string(),
            });
        }

        let bytes = fs::read(&self.path).map_err(|source| StoreError::Io {
            path: self.path.display().to_string(),
            source,
        })?;

        serde_json::from_slice(&bytes).map_err(|source| StoreError::Decode {
            path: self.path.display().to_string(),
            source,
        })
    }

    /// Saves the credential atomically.
    ///
    /// The credential is serialized to a sibling `.tmp` file, synced to disk,
    /// and renamed over the target path. A concurrent [`load`](Self::load)
    /// sees either the previous or the new credential, never a partial write.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Io`] if the directory cannot be created, the
    /// temporary file cannot be written, or the rename fails.
    pub fn save(&self, credential: &Credential) -> Result<(), StoreError> {
        self.ensure_parent_exists()?;

        let serialized = serde_json::to_vec_pretty(credential).map_err(|source| {
            StoreError::Decode {
                path: self.path.display().to_string(),
                source,
            }
        })?;

        let mut tmp_path = self.path.clone();
        tmp_path.set_extension("tmp");

        {
            let mut file = Self::create_private(&tmp_path)?;

            file.write_all(&serialized)
                .and_then(|()| file.sync_all())
                .map_err(|source| StoreError::Io {
                    path: tmp_path.display().to_string(),
                    source,
                })?;
        }

        fs::rename(&tmp_path, &self.path).map_err(|source| StoreError::Io {
            path: self.path.display().to_string(),
            source,
        })
    }

    fn ensure_parent_exists(&self) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|source| StoreError::Io {
                path: parent.display().to_string(),
                source,
            })?;
        }
        Ok(())
    }

    #[cfg(unix)]
    fn create_private(path: &Path) -> Result<File, StoreError> {
        use std::os::unix::fs::OpenOptionsExt;

        fs::OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .mode(0o600)
            .open(path)
            .map_err(|source| StoreError::Io {
                path: path.display().to_string(),
                source,
            })
    }

    #[cfg(not(unix))]
    fn create_private(path: &Path) -> Result<File, StoreError> {
        File::create(path).map_err(|source| StoreError::Io {
            path: path.display().to_string(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::AuthScopes;
    use chrono::{Duration, Utc};
    use std::env;
    use std::process;
    use std::sync::atomic::{AtomicU32, Ordering};

    static COUNTER: AtomicU32 = AtomicU32::new(0);

    fn temp_path() -> PathBuf {
        let unique = format!(
            "quickbooks_token_store_{}_{}.json",
            process::id(),
            COUNTER.fetch_add(1, Ordering::Relaxed),
        );
        env::temp_dir().join(unique)
    }

    fn build_credential() -> Credential {
        Credential::new(
            "access-token".to_string(),
            "refresh-token".to_string(),
            Utc::now() + Duration::hours(1),
            AuthScopes::accounting(),
        )
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let path = temp_path();
        let store = TokenStore::new(&path);
        let credential = build_credential();

        store.save(&credential).unwrap();
        let loaded = store.load().unwrap();

        assert_eq!(loaded, credential);

        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_load_missing_file_is_not_found() {
        let store = TokenStore::new(temp_path());
        assert!(matches!(store.load(), Err(StoreError::NotFound { .. })));
    }

    #[test]
    fn test_load_malformed_file_is_decode_error() {
        let path = temp_path();
        fs::write(&path, b"{ not json").unwrap();

        let store = TokenStore::new(&path);
        assert!(matches!(store.load(), Err(StoreError::Decode { .. })));

        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_save_leaves_no_temp_file() {
        let path = temp_path();
        let store = TokenStore::new(&path);

        store.save(&build_credential()).unwrap();

        let mut tmp_path = path.clone();
        tmp_path.set_extension("tmp");
        assert!(!tmp_path.exists());

        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_save_overwrites_previous_credential() {
        let path = temp_path();
        let store = TokenStore::new(&path);

        let first = build_credential();
        store.save(&first).unwrap();

        let mut second = build_credential();
        second.access_token = "rotated".to_string();
        store.save(&second).unwrap();

        let loaded = store.load().unwrap();
        assert_eq!(loaded.access_token, "rotated");

        fs::remove_file(&path).unwrap();
    }

    #[cfg(unix)]
    #[test]
    fn test_saved_file_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let path = temp_path();
        let store = TokenStore::new(&path);
        store.save(&build_credential()).unwrap();

        let mode = fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);

        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_save_creates_parent_directory() {
        let dir = env::temp_dir().join(format!(
            "quickbooks_store_dir_{}_{}",
            process::id(),
            COUNTER.fetch_add(1, Ordering::Relaxed)
        ));
        let path = dir.join("nested").join("token.json");
        let store = TokenStore::new(&path);

        store.save(&build_credential()).unwrap();
        assert!(path.exists());

        fs::remove_dir_all(&dir).unwrap();
    }
}
