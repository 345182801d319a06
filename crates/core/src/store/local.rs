//! Favorites set and onboarding flag.
//!
//! Two families of accessors are offered. The plain ones (`favorites`,
//! `add_favorite`, ...) never fail: backend faults are logged and replaced by
//! an empty set or `false`, which is what the screens want. The `try_*`
//! variants return the underlying [`StoreError`] so callers can tell an empty
//! store from an unreadable one.

use std::sync::Arc;

use tracing::warn;

use super::{backend::FileBackend, KeyValueBackend, StoreError};
use crate::config::AppConfig;
use crate::models::GameId;

const FAVORITES_KEY: &str = "favorites";
const ONBOARDED_KEY: &str = "hasOnboarded";
const TRUE_LITERAL: &str = "true";

/// Namespaced accessors over a [`KeyValueBackend`].
#[derive(Clone)]
pub struct LocalStore {
    backend: Arc<dyn KeyValueBackend>,
    favorites_key: String,
    onboarded_key: String,
}

impl LocalStore {
    /// Store over `backend` with keys prefixed by `namespace`.
    pub fn new(backend: Arc<dyn KeyValueBackend>, namespace: &str) -> Self {
        Self {
            backend,
            favorites_key: format!("{namespace}:{FAVORITES_KEY}"),
            onboarded_key: format!("{namespace}:{ONBOARDED_KEY}"),
        }
    }

    /// File-backed store at the configured data directory.
    pub fn open(config: &AppConfig) -> Self {
        Self::new(
            Arc::new(FileBackend::new(config.storage_path())),
            &config.storage_namespace,
        )
    }

    /// Key holding the favorites array.
    pub fn favorites_key(&self) -> &str {
        &self.favorites_key
    }

    /// Key holding the onboarding flag.
    pub fn onboarded_key(&self) -> &str {
        &self.onboarded_key
    }

    /// Stored favorites, or an error if they cannot be read or decoded.
    pub fn try_favorites(&self) -> Result<Vec<GameId>, StoreError> {
        let Some(raw) = self.backend.get_item(&self.favorites_key)? else {
            return Ok(Vec::new());
        };
        if raw.trim().is_empty() {
            return Ok(Vec::new());
        }
        serde_json::from_str(&raw).map_err(|source| StoreError::Decode {
            key: self.favorites_key.clone(),
            source,
        })
    }

    /// Stored favorites; empty when unset or unreadable.
    pub fn favorites(&self) -> Vec<GameId> {
        self.try_favorites().unwrap_or_else(|err| {
            warn!(error = %err, "failed to read favorites");
            Vec::new()
        })
    }

    /// Adds `id` unless present and returns the updated set.
    pub fn try_add_favorite(&self, id: GameId) -> Result<Vec<GameId>, StoreError> {
        let mut favorites = self.try_favorites()?;
        if insert_unique(&mut favorites, id) {
            self.write_favorites(&favorites)?;
        }
        Ok(favorites)
    }

    /// Adds `id` unless present and returns the updated set.
    ///
    /// An unreadable stored value counts as empty and is overwritten. Returns
    /// an empty set if the write fails.
    pub fn add_favorite(&self, id: GameId) -> Vec<GameId> {
        let mut favorites = self.favorites();
        if insert_unique(&mut favorites, id) {
            if let Err(err) = self.write_favorites(&favorites) {
                warn!(game_id = id, error = %err, "failed to add favorite");
                return Vec::new();
            }
        }
        favorites
    }

    /// Removes every occurrence of `id` and returns the updated set.
    pub fn try_remove_favorite(&self, id: GameId) -> Result<Vec<GameId>, StoreError> {
        let mut favorites = self.try_favorites()?;
        favorites.retain(|existing| *existing != id);
        self.write_favorites(&favorites)?;
        Ok(favorites)
    }

    /// Removes every occurrence of `id` and returns the updated set.
    ///
    /// Returns an empty set if the write fails.
    pub fn remove_favorite(&self, id: GameId) -> Vec<GameId> {
        let mut favorites = self.favorites();
        favorites.retain(|existing| *existing != id);
        if let Err(err) = self.write_favorites(&favorites) {
            warn!(game_id = id, error = %err, "failed to remove favorite");
            return Vec::new();
        }
        favorites
    }

    /// Whether `id` is a favorite.
    pub fn try_is_favorite(&self, id: GameId) -> Result<bool, StoreError> {
        Ok(self.try_favorites()?.contains(&id))
    }

    /// Whether `id` is a favorite; `false` if storage is unreadable.
    pub fn is_favorite(&self, id: GameId) -> bool {
        self.favorites().contains(&id)
    }

    /// Drops the whole favorites set.
    pub fn try_clear_favorites(&self) -> Result<(), StoreError> {
        self.backend.remove_item(&self.favorites_key)
    }

    /// Drops the whole favorites set; failures are only logged.
    pub fn clear_favorites(&self) {
        if let Err(err) = self.try_clear_favorites() {
            warn!(error = %err, "failed to clear favorites");
        }
    }

    fn write_favorites(&self, favorites: &[GameId]) -> Result<(), StoreError> {
        let encoded = serde_json::to_string(favorites).map_err(StoreError::Encode)?;
        self.backend.set_item(&self.favorites_key, &encoded)
    }

    /// Whether onboarding was completed.
    pub fn try_has_onboarded(&self) -> Result<bool, StoreError> {
        Ok(self.backend.get_item(&self.onboarded_key)?.as_deref() == Some(TRUE_LITERAL))
    }

    /// Whether onboarding was completed; `false` if storage is unreadable.
    pub fn has_onboarded(&self) -> bool {
        self.try_has_onboarded().unwrap_or_else(|err| {
            warn!(error = %err, "failed to read onboarding flag");
            false
        })
    }

    /// Marks onboarding as completed.
    pub fn try_set_has_onboarded(&self) -> Result<(), StoreError> {
        self.backend.set_item(&self.onboarded_key, TRUE_LITERAL)
    }

    /// Marks onboarding as completed; failures are only logged.
    pub fn set_has_onboarded(&self) {
        if let Err(err) = self.try_set_has_onboarded() {
            warn!(error = %err, "failed to record onboarding");
        }
    }
}

fn insert_unique(favorites: &mut Vec<GameId>, id: GameId) -> bool {
    if favorites.contains(&id) {
        return false;
    }
    favorites.push(id);
    true
}
