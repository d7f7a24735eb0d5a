//! Persisted local key-value storage.
//!
//! A small string-to-string store, either kept in memory or mirrored to a
//! JSON file. Every mutation rewrites the file through a temporary file and a
//! rename, so a crash mid-write leaves the previous contents intact.
//!
//! Values are plain strings; [`LocalStorage::get_json`] and
//! [`LocalStorage::set_json`] layer typed JSON on top.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Serialize, de::DeserializeOwned};
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, instrument};

/// Storage keys used by the app.
pub mod keys {
    /// Bearer token sent with every authenticated request.
    pub const ACCESS_TOKEN: &str = "accessToken";

    /// Refresh token returned by OTP verification.
    pub const REFRESH_TOKEN: &str = "refreshToken";

    /// JSON-encoded profile of the logged-in user.
    pub const USER: &str = "user";

    /// `"true"` once OTP verification succeeded.
    pub const IS_LOGGED_IN: &str = "isLoggedIn";

    /// Selected UI language code.
    pub const LANGUAGE: &str = "language";

    /// JSON boolean: whether spoken guidance is enabled.
    pub const AUDIO_ENABLED: &str = "audioEnabled";

    /// `"true"` once language onboarding is complete.
    pub const ONBOARDING_DONE: &str = "onboardingDone";

    /// JSON array of the last known order history.
    pub const ORDERS_CACHE: &str = "ordersCache";
}

/// Errors that can occur when reading or writing local storage.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Reading or writing the backing file failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A value could not be encoded or decoded as JSON.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The backing file exists but is not a JSON object of strings.
    #[error("Corrupt storage file {path}: {reason}")]
    Corrupt {
        /// Path of the backing file.
        path: PathBuf,
        /// Parser message.
        reason: String,
    },
}

/// Persisted key-value storage.
///
/// Cheaply cloneable; clones share the same entries.
#[derive(Clone)]
pub struct LocalStorage {
    inner: Arc<LocalStorageInner>,
}

struct LocalStorageInner {
    path: Option<PathBuf>,
    entries: Mutex<BTreeMap<String, String>>,
}

impl std::fmt::Debug for LocalStorage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalStorage")
            .field("path", &self.inner.path)
            .finish_non_exhaustive()
    }
}

impl LocalStorage {
    /// Create an empty storage that lives only in memory.
    #[must_use]
    pub fn in_memory() -> Self {
        Self::from_parts(None, BTreeMap::new())
    }

    /// Open storage backed by `path`, or in memory when `path` is `None`.
    ///
    /// A missing file is treated as empty storage; it is created on the first
    /// write.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not a JSON object of
    /// string values.
    #[instrument]
    pub async fn open(path: Option<&Path>) -> Result<Self, StorageError> {
        let Some(path) = path else {
            return Ok(Self::in_memory());
        };

        let entries = match tokio::fs::read(path).await {
            Ok(bytes) if bytes.iter().all(u8::is_ascii_whitespace) => BTreeMap::new(),
            Ok(bytes) => serde_json::from_slice::<BTreeMap<String, String>>(&bytes).map_err(
                |e| StorageError::Corrupt {
                    path: path.to_path_buf(),
                    reason: e.to_string(),
                },
            )?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(e.into()),
        };

        debug!(entries = entries.len(), "Local storage loaded");
        Ok(Self::from_parts(Some(path.to_path_buf()), entries))
    }

    fn from_parts(path: Option<PathBuf>, entries: BTreeMap<String, String>) -> Self {
        Self {
            inner: Arc::new(LocalStorageInner {
                path,
                entries: Mutex::new(entries),
            }),
        }
    }

    /// Path of the backing file, if any.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.inner.path.as_deref()
    }

    /// Get a value.
    pub async fn get(&self, key: &str) -> Option<String> {
        self.inner.entries.lock().await.get(key).cloned()
    }

    /// Set a value.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing file cannot be written.
    pub async fn set(&self, key: &str, value: impl Into<String>) -> Result<(), StorageError> {
        let (key, value) = (key.to_string(), value.into());
        self.update(move |entries| {
            entries.insert(key, value);
            true
        })
        .await
    }

    /// Set several values with a single write.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing file cannot be written.
    pub async fn multi_set(&self, pairs: &[(&str, String)]) -> Result<(), StorageError> {
        self.update(|entries| {
            for (key, value) in pairs {
                entries.insert((*key).to_string(), value.clone());
            }
            true
        })
        .await
    }

    /// Remove a value. Removing a missing key is not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing file cannot be written.
    pub async fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.multi_remove(&[key]).await
    }

    /// Remove several values with a single write.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing file cannot be written.
    pub async fn multi_remove(&self, keys: &[&str]) -> Result<(), StorageError> {
        self.update(|entries| {
            let before = entries.len();
            for key in keys {
                entries.remove(*key);
            }
            entries.len() != before
        })
        .await
    }

    /// Get a JSON-encoded value.
    ///
    /// # Errors
    ///
    /// Returns an error if the stored value is not valid JSON for `T`.
    pub async fn get_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, StorageError> {
        match self.get(key).await {
            Some(raw) if !raw.trim().is_empty() => Ok(Some(serde_json::from_str(&raw)?)),
            _ => Ok(None),
        }
    }

    /// Store a value as JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if encoding fails or the backing file cannot be written.
    pub async fn set_json<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<(), StorageError> {
        let encoded = serde_json::to_string(value)?;
        self.set(key, encoded).await
    }

    /// Apply `change` to a copy of the entries and keep the copy only once
    /// it has been written. `change` returns whether anything changed.
    async fn update(
        &self,
        change: impl FnOnce(&mut BTreeMap<String, String>) -> bool,
    ) -> Result<(), StorageError> {
        let mut entries = self.inner.entries.lock().await;
        let mut next = entries.clone();
        if !change(&mut next) {
            return Ok(());
        }
        self.persist(&next).await?;
        *entries = next;
        Ok(())
    }

    /// Write the entries to the backing file, if there is one.
    async fn persist(&self, entries: &BTreeMap<String, String>) -> Result<(), StorageError> {
        let Some(path) = &self.inner.path else {
            return Ok(());
        };

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent).await?;
        }

        let encoded = serde_json::to_vec_pretty(entries)?;
        let tmp = path.with_extension("tmp");
        tokio::fs::write(&tmp, encoded).await?;
        tokio::fs::rename(&tmp, path).await?;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_in_memory_set_get_remove() {
        let storage = LocalStorage::in_memory();
        assert_eq!(storage.get(keys::LANGUAGE).await, None);

        storage.set(keys::LANGUAGE, "hi").await.unwrap();
        assert_eq!(storage.get(keys::LANGUAGE).await.as_deref(), Some("hi"));

        storage.remove(keys::LANGUAGE).await.unwrap();
        assert_eq!(storage.get(keys::LANGUAGE).await, None);

        // Removing again is fine
        storage.remove(keys::LANGUAGE).await.unwrap();
    }

    #[tokio::test]
    async fn test_clones_share_entries() {
        let storage = LocalStorage::in_memory();
        let other = storage.clone();
        storage.set(keys::IS_LOGGED_IN, "true").await.unwrap();
        assert_eq!(other.get(keys::IS_LOGGED_IN).await.as_deref(), Some("true"));
    }

    #[tokio::test]
    async fn test_json_helpers() {
        let storage = LocalStorage::in_memory();
        storage.set_json(keys::AUDIO_ENABLED, &true).await.unwrap();
        assert_eq!(storage.get(keys::AUDIO_ENABLED).await.as_deref(), Some("true"));
        assert_eq!(
            storage.get_json::<bool>(keys::AUDIO_ENABLED).await.unwrap(),
            Some(true)
        );

        storage.set(keys::AUDIO_ENABLED, "").await.unwrap();
        assert_eq!(storage.get_json::<bool>(keys::AUDIO_ENABLED).await.unwrap(), None);

        storage.set(keys::AUDIO_ENABLED, "{oops").await.unwrap();
        assert!(storage.get_json::<bool>(keys::AUDIO_ENABLED).await.is_err());
    }

    #[tokio::test]
    async fn test_file_storage_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("storage.json");

        let storage = LocalStorage::open(Some(&path)).await.unwrap();
        storage
            .multi_set(&[
                (keys::ACCESS_TOKEN, "abc".to_string()),
                (keys::IS_LOGGED_IN, "true".to_string()),
            ])
            .await
            .unwrap();
        drop(storage);

        let reopened = LocalStorage::open(Some(&path)).await.unwrap();
        assert_eq!(reopened.get(keys::ACCESS_TOKEN).await.as_deref(), Some("abc"));
        assert_eq!(reopened.get(keys::IS_LOGGED_IN).await.as_deref(), Some("true"));
        assert_eq!(reopened.path(), Some(path.as_path()));

        reopened
            .multi_remove(&[keys::ACCESS_TOKEN, keys::IS_LOGGED_IN])
            .await
            .unwrap();
        let again = LocalStorage::open(Some(&path)).await.unwrap();
        assert_eq!(again.get(keys::ACCESS_TOKEN).await, None);
    }

    #[tokio::test]
    async fn test_failed_write_leaves_entries_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("storage.json");
        let storage = LocalStorage::open(Some(&path)).await.unwrap();
        storage.set(keys::LANGUAGE, "hi").await.unwrap();

        // A directory where the temp file goes makes every write fail
        std::fs::create_dir(path.with_extension("tmp")).unwrap();

        assert!(storage.set(keys::LANGUAGE, "ta").await.is_err());
        assert!(
            storage
                .multi_set(&[(keys::AUDIO_ENABLED, "true".to_string())])
                .await
                .is_err()
        );
        assert!(storage.remove(keys::LANGUAGE).await.is_err());

        assert_eq!(storage.get(keys::LANGUAGE).await.as_deref(), Some("hi"));
        assert_eq!(storage.get(keys::AUDIO_ENABLED).await, None);
        let on_disk = LocalStorage::open(Some(&path)).await.unwrap();
        assert_eq!(on_disk.get(keys::LANGUAGE).await.as_deref(), Some("hi"));
    }

    #[tokio::test]
    async fn test_open_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalStorage::open(Some(&dir.path().join("absent.json")))
            .await
            .unwrap();
        assert_eq!(storage.get(keys::USER).await, None);
    }

    #[tokio::test]
    async fn test_open_corrupt_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("storage.json");
        tokio::fs::write(&path, b"[1, 2, 3]").await.unwrap();

        let err = LocalStorage::open(Some(&path)).await.unwrap_err();
        assert!(matches!(err, StorageError::Corrupt { .. }));
    }

    #[tokio::test]
    async fn test_open_none_is_in_memory() {
        let storage = LocalStorage::open(None).await.unwrap();
        assert!(storage.path().is_none());
        storage.set(keys::LANGUAGE, "en").await.unwrap();
    }
}
