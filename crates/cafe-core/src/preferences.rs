//! Durable key-value preferences.
//!
//! Preferences live in a single JSON object per namespace
//! (`<config_dir>/<namespace>.json`). Every write persists the whole map
//! through a temp file and a rename, so a crash never leaves a half-written
//! file behind.

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const KEY_CITY: &str = "city";
pub const KEY_NOTIFICATIONS: &str = "notifications_enabled";
pub const KEY_DARK_THEME: &str = "dark_theme_enabled";

#[derive(Debug, Error)]
pub enum PreferenceError {
    #[error("Failed to access preferences at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Preferences file is malformed: {0}")]
    Malformed(#[from] serde_json::Error),
}

pub type PreferenceResult<T> = Result<T, PreferenceError>;

/// Typed view over the stored preferences.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserPreferences {
    /// Last chosen or resolved city, English canonical form
    pub city: Option<String>,
    pub notifications_enabled: bool,
    pub dark_theme_enabled: bool,
}

/// File-backed preference store for one namespace.
pub struct PreferenceStore {
    path: Option<PathBuf>,
    values: RwLock<BTreeMap<String, Value>>,
}

impl PreferenceStore {
    /// Open the store at `path`, starting empty if the file doesn't exist yet.
    pub fn open<P: AsRef<Path>>(path: P) -> PreferenceResult<Self> {
        let path = path.as_ref().to_path_buf();

        let values = match fs::read_to_string(&path) {
            Ok(contents) if contents.trim().is_empty() => BTreeMap::new(),
            Ok(contents) => serde_json::from_str(&contents)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(source) => return Err(PreferenceError::Io { path, source }),
        };

        tracing::debug!("Opened preferences at {} ({} keys)", path.display(), values.len());

        Ok(Self {
            path: Some(path),
            values: RwLock::new(values),
        })
    }

    /// A store that never touches the disk.
    pub fn in_memory() -> Self {
        Self {
            path: None,
            values: RwLock::new(BTreeMap::new()),
        }
    }

    pub fn get_string(&self, key: &str) -> Option<String> {
        self.values
            .read()
            .get(key)
            .and_then(Value::as_str)
            .map(str::to_string)
    }

    pub fn get_bool(&self, key: &str, default: bool) -> bool {
        self.values
            .read()
            .get(key)
            .and_then(Value::as_bool)
            .unwrap_or(default)
    }

    pub fn set_string(&self, key: &str, value: &str) -> PreferenceResult<()> {
        self.set(key, Value::String(value.to_string()))
    }

    pub fn set_bool(&self, key: &str, value: bool) -> PreferenceResult<()> {
        self.set(key, Value::Bool(value))
    }

    pub fn remove(&self, key: &str) -> PreferenceResult<()> {
        let mut values = self.values.write();
        if !values.contains_key(key) {
            return Ok(());
        }
        let mut next = values.clone();
        next.remove(key);
        self.persist(&next)?;
        *values = next;
        Ok(())
    }

    /// Memory only changes once the new map is on disk.
    fn set(&self, key: &str, value: Value) -> PreferenceResult<()> {
        let mut values = self.values.write();
        let mut next = values.clone();
        next.insert(key.to_string(), value);
        self.persist(&next)?;
        *values = next;
        Ok(())
    }

    fn persist(&self, values: &BTreeMap<String, Value>) -> PreferenceResult<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };

        let io_err = |source| PreferenceError::Io {
            path: path.clone(),
            source,
        };

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(io_err)?;
        }

        let json = serde_json::to_string_pretty(values)?;
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, json).map_err(io_err)?;
        fs::rename(&tmp, path).map_err(io_err)?;

        Ok(())
    }

    /// Read all known keys at once. An empty stored city counts as unset.
    pub fn user_preferences(&self) -> UserPreferences {
        UserPreferences {
            city: self.city(),
            notifications_enabled: self.get_bool(KEY_NOTIFICATIONS, false),
            dark_theme_enabled: self.get_bool(KEY_DARK_THEME, false),
        }
    }

    pub fn city(&self) -> Option<String> {
        self.get_string(KEY_CITY)
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
    }

    /// Persist the selected city. Blank input clears it.
    pub fn set_city(&self, city: &str) -> PreferenceResult<()> {
        let city = city.trim();
        if city.is_empty() {
            tracing::info!("Clearing saved city");
            return self.remove(KEY_CITY);
        }
        tracing::info!("Saving city: {}", city);
        self.set_string(KEY_CITY, city)
    }

    pub fn set_notifications_enabled(&self, enabled: bool) -> PreferenceResult<()> {
        self.set_bool(KEY_NOTIFICATIONS, enabled)
    }

    pub fn set_dark_theme_enabled(&self, enabled: bool) -> PreferenceResult<()> {
        self.set_bool(KEY_DARK_THEME, enabled)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]
    use super::*;

    #[test]
    fn test_defaults_when_empty() {
        let store = PreferenceStore::in_memory();
        assert_eq!(store.user_preferences(), UserPreferences::default());
    }

    #[test]
    fn test_blank_city_is_unset() {
        let store = PreferenceStore::in_memory();
        store.set_string(KEY_CITY, "   ").unwrap();
        assert_eq!(store.city(), None);
    }

    #[test]
    fn test_set_city_blank_clears() {
        let store = PreferenceStore::in_memory();
        store.set_city("Kazan").unwrap();
        assert_eq!(store.city().as_deref(), Some("Kazan"));

        store.set_city("").unwrap();
        assert_eq!(store.city(), None);
    }

    #[test]
    fn test_wrong_type_falls_back_to_default() {
        let store = PreferenceStore::in_memory();
        store.set_string(KEY_DARK_THEME, "yes").unwrap();
        assert!(!store.get_bool(KEY_DARK_THEME, false));
    }

    #[test]
    fn test_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");

        {
            let store = PreferenceStore::open(&path).unwrap();
            store.set_city("Murmansk").unwrap();
            store.set_notifications_enabled(true).unwrap();
            store.set_dark_theme_enabled(true).unwrap();
        }

        let reopened = PreferenceStore::open(&path).unwrap();
        assert_eq!(
            reopened.user_preferences(),
            UserPreferences {
                city: Some("Murmansk".to_string()),
                notifications_enabled: true,
                dark_theme_enabled: true,
            }
        );
        assert!(!dir.path().join("settings.json.tmp").exists());
    }

    #[test]
    fn test_failed_write_leaves_memory_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        let store = PreferenceStore::open(&path).unwrap();
        store.set_city("Kazan").unwrap();

        // A directory where the temp file goes makes every write fail
        fs::create_dir(dir.path().join("settings.json.tmp")).unwrap();

        assert!(matches!(store.set_city("Tver"), Err(PreferenceError::Io { .. })));
        assert_eq!(store.city().as_deref(), Some("Kazan"));

        assert!(store.set_city("").is_err());
        assert_eq!(store.city().as_deref(), Some("Kazan"));

        assert!(store.set_dark_theme_enabled(true).is_err());
        assert!(!store.user_preferences().dark_theme_enabled);

        let on_disk = PreferenceStore::open(&path).unwrap();
        assert_eq!(on_disk.user_preferences(), store.user_preferences());
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, "{not json").unwrap();

        let result = PreferenceStore::open(&path);
        assert!(matches!(result, Err(PreferenceError::Malformed(_))));
    }
}
