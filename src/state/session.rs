//! Session storage
//!
//! This module keeps the authentication session: bearer token, refresh
//! token, token expiry and the serialized current user. Values live in an
//! in-memory key/value map that is optionally mirrored to a JSON file.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use chrono::{DateTime, TimeZone, Utc};
use tracing::{debug, error, warn};

use crate::config::AuthConfig;
use crate::models::User;
use crate::utils::errors::{Result, TontinError};

/// String key/value storage with optional file persistence
#[derive(Debug, Clone)]
pub struct KeyValueStorage {
    entries: Arc<RwLock<HashMap<String, String>>>,
    path: Option<PathBuf>,
}

impl KeyValueStorage {
    /// Storage that lives only as long as the process
    pub fn in_memory() -> Self {
        Self {
            entries: Arc::new(RwLock::new(HashMap::new())),
            path: None,
        }
    }

    /// Open file-backed storage, loading existing entries if the file exists
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        let entries = match tokio::fs::read_to_string(&path).await {
            Ok(data) => match serde_json::from_str::<HashMap<String, String>>(&data) {
                Ok(entries) => {
                    debug!(path = %path.display(), entries = entries.len(), "Session file loaded");
                    entries
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Session file is corrupted, starting empty");
                    HashMap::new()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "No session file yet");
                HashMap::new()
            }
            Err(e) => return Err(e.into()),
        };

        Ok(Self {
            entries: Arc::new(RwLock::new(entries)),
            path: Some(path),
        })
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.read_entries().get(key).cloned()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.read_entries().contains_key(key)
    }

    pub async fn set(&self, key: &str, value: impl Into<String>) -> Result<()> {
        self.write_entries().insert(key.to_string(), value.into());
        self.persist().await
    }

    /// Set several entries with a single write to disk
    pub async fn set_many(&self, values: Vec<(String, String)>) -> Result<()> {
        {
            let mut entries = self.write_entries();
            for (key, value) in values {
                entries.insert(key, value);
            }
        }
        self.persist().await
    }

    pub async fn remove(&self, keys: &[&str]) -> Result<()> {
        let removed = {
            let mut entries = self.write_entries();
            keys.iter().filter(|key| entries.remove(**key).is_some()).count()
        };
        debug!(removed = removed, "Removed session entries");
        self.persist().await
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    fn read_entries(&self) -> std::sync::RwLockReadGuard<'_, HashMap<String, String>> {
        self.entries.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write_entries(&self) -> std::sync::RwLockWriteGuard<'_, HashMap<String, String>> {
        self.entries.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Write a snapshot of the entries to the backing file
    async fn persist(&self) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };

        let snapshot = serde_json::to_string_pretty(&*self.read_entries())?;

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }

        let tmp = path.with_extension("tmp");
        if let Err(e) = tokio::fs::write(&tmp, snapshot).await {
            error!(path = %tmp.display(), error = %e, "Failed to write session file");
            return Err(e.into());
        }
        tokio::fs::rename(&tmp, path).await?;
        Ok(())
    }
}

/// Storage key names for the session entries
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionKeys {
    pub token: String,
    pub refresh_token: String,
    pub token_expiry: String,
    pub user: String,
}

impl From<&AuthConfig> for SessionKeys {
    fn from(config: &AuthConfig) -> Self {
        Self {
            token: config.token_key.clone(),
            refresh_token: config.refresh_token_key.clone(),
            token_expiry: config.token_expiry_key.clone(),
            user: config.user_key.clone(),
        }
    }
}

/// Typed access to the persisted authentication session
#[derive(Debug, Clone)]
pub struct SessionStore {
    storage: KeyValueStorage,
    keys: SessionKeys,
    token_prefix: String,
}

impl SessionStore {
    pub fn new(storage: KeyValueStorage, config: &AuthConfig) -> Self {
        Self {
            storage,
            keys: SessionKeys::from(config),
            token_prefix: config.token_prefix.clone(),
        }
    }

    /// Open the session configured in `config`, in memory when no path is set
    pub async fn from_config(config: &AuthConfig) -> Result<Self> {
        let storage = match config.storage_path.as_deref() {
            Some(path) => KeyValueStorage::open(path).await?,
            None => KeyValueStorage::in_memory(),
        };
        Ok(Self::new(storage, config))
    }

    pub fn keys(&self) -> &SessionKeys {
        &self.keys
    }

    pub fn storage(&self) -> &KeyValueStorage {
        &self.storage
    }

    pub fn token(&self) -> Option<String> {
        self.storage.get(&self.keys.token).filter(|t| !t.is_empty())
    }

    pub fn refresh_token(&self) -> Option<String> {
        self.storage.get(&self.keys.refresh_token).filter(|t| !t.is_empty())
    }

    /// Expiry instant, stored as milliseconds since the epoch
    pub fn token_expiry(&self) -> Option<DateTime<Utc>> {
        self.storage
            .get(&self.keys.token_expiry)
            .and_then(|raw| raw.parse::<i64>().ok())
            .and_then(|millis| Utc.timestamp_millis_opt(millis).single())
    }

    pub fn user(&self) -> Option<User> {
        let raw = self.storage.get(&self.keys.user)?;
        match serde_json::from_str(&raw) {
            Ok(user) => Some(user),
            Err(e) => {
                warn!(error = %e, "Stored user could not be parsed");
                None
            }
        }
    }

    /// Value for the `Authorization` header
    pub fn authorization_header(&self) -> Option<String> {
        self.token().map(|token| format!("{} {}", self.token_prefix, token))
    }

    /// A token is present and not known to be expired
    pub fn is_authenticated(&self, now: DateTime<Utc>) -> bool {
        if self.token().is_none() {
            return false;
        }
        match self.token_expiry() {
            Some(expiry) => expiry > now,
            None => true,
        }
    }

    /// Persist a freshly issued token pair
    pub async fn store_tokens(
        &self,
        token: &str,
        refresh_token: Option<&str>,
        expires_at: DateTime<Utc>,
    ) -> Result<()> {
        let mut values = vec![
            (self.keys.token.clone(), token.to_string()),
            (self.keys.token_expiry.clone(), expires_at.timestamp_millis().to_string()),
        ];
        if let Some(refresh) = refresh_token {
            values.push((self.keys.refresh_token.clone(), refresh.to_string()));
        }
        self.storage.set_many(values).await?;
        debug!(expires_at = %expires_at, "Session tokens stored");
        Ok(())
    }

    pub async fn store_user(&self, user: &User) -> Result<()> {
        let serialized = serde_json::to_string(user).map_err(TontinError::Serialization)?;
        self.storage.set(&self.keys.user, serialized).await
    }

    /// Remove token, refresh token, expiry and user
    pub async fn clear(&self) -> Result<()> {
        self.storage
            .remove(&[
                self.keys.token.as_str(),
                self.keys.refresh_token.as_str(),
                self.keys.token_expiry.as_str(),
                self.keys.user.as_str(),
            ])
            .await
    }
}
