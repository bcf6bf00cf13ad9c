use anyhow::{Context, Result};
use log::warn;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
    sync::{RwLock, RwLockReadGuard, RwLockWriteGuard},
    time::Duration,
};

use crate::api::DEFAULT_REQUEST_TIMEOUT;
use crate::background::tasks::{NOTIFICATION_INTERVAL, STEP_SYNC_INTERVAL};
use crate::sensing::DEFAULT_SENSOR_CHANNEL_CAPACITY;

pub const API_URL_ENV: &str = "STRIDEKEEP_API_URL";
pub const DATA_DIR_ENV: &str = "STRIDEKEEP_DATA_DIR";
pub const REQUEST_TIMEOUT_ENV: &str = "STRIDEKEEP_REQUEST_TIMEOUT_SECS";

pub const DEFAULT_API_BASE_URL: &str = "http://localhost:5000/api";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    pub api_base_url: String,
    pub request_timeout_secs: u64,
    pub step_sync_interval_secs: u64,
    pub notification_interval_secs: u64,
    pub sensor_channel_capacity: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.into(),
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT.as_secs(),
            step_sync_interval_secs: STEP_SYNC_INTERVAL.as_secs(),
            notification_interval_secs: NOTIFICATION_INTERVAL.as_secs(),
            sensor_channel_capacity: DEFAULT_SENSOR_CHANNEL_CAPACITY,
        }
    }
}

impl Settings {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }

    pub fn step_sync_interval(&self) -> Duration {
        Duration::from_secs(self.step_sync_interval_secs.max(1))
    }

    pub fn notification_interval(&self) -> Duration {
        Duration::from_secs(self.notification_interval_secs.max(1))
    }

    /// Apply environment overrides. `lookup` is `std::env::var` outside tests.
    pub fn with_overrides<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(API_URL_ENV).filter(|url| !url.trim().is_empty()) {
            self.api_base_url = url.trim().to_string();
        }
        if let Some(raw) = lookup(REQUEST_TIMEOUT_ENV) {
            match raw.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => self.request_timeout_secs = secs,
                _ => warn!("Ignoring {REQUEST_TIMEOUT_ENV}={raw:?}: expected whole seconds > 0"),
            }
        }
        self
    }

    pub fn with_env_overrides(self) -> Self {
        self.with_overrides(|name| std::env::var(name).ok())
    }
}

/// `settings.json` in the data directory. Written with defaults on first
/// start; a malformed file falls back to defaults and is left untouched.
pub struct SettingsStore {
    path: PathBuf,
    data: RwLock<Settings>,
}

impl SettingsStore {
    pub fn new(path: PathBuf) -> Result<Self> {
        let store = if path.exists() {
            let data = Self::load(&path)?;
            Self {
                path,
                data: RwLock::new(data),
            }
        } else {
            let store = Self {
                path,
                data: RwLock::new(Settings::default()),
            };
            store.persist(&Settings::default())?;
            store
        };

        Ok(store)
    }

    fn load(path: &Path) -> Result<Settings> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings from {}", path.display()))?;
        Ok(serde_json::from_str(&contents).unwrap_or_else(|err| {
            warn!("Malformed settings at {}, using defaults: {err}", path.display());
            Settings::default()
        }))
    }

    fn read(&self) -> RwLockReadGuard<'_, Settings> {
        self.data.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, Settings> {
        self.data.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Stored settings with environment overrides applied.
    pub fn settings(&self) -> Settings {
        self.read().clone().with_env_overrides()
    }

    /// Stored settings exactly as persisted.
    pub fn stored(&self) -> Settings {
        self.read().clone()
    }

    pub fn update<F>(&self, change: F) -> Result<Settings>
    where
        F: FnOnce(&mut Settings),
    {
        let mut guard = self.write();
        let mut next = guard.clone();
        change(&mut next);
        self.persist(&next)?;
        *guard = next.clone();
        Ok(next)
    }

    pub fn reload(&self) -> Result<()> {
        let data = Self::load(&self.path)?;
        *self.write() = data;
        Ok(())
    }

    fn persist(&self, data: &Settings) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let serialized = serde_json::to_string_pretty(data)?;
        fs::write(&self.path, serialized)
            .with_context(|| format!("Failed to write settings to {}", self.path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn first_start_writes_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("settings.json");
        let store = SettingsStore::new(path.clone()).unwrap();

        assert!(path.exists());
        assert_eq!(store.stored(), Settings::default());
        assert_eq!(store.stored().request_timeout(), Duration::from_secs(10));
        assert_eq!(store.stored().step_sync_interval(), Duration::from_secs(3600));
        assert_eq!(store.stored().notification_interval(), Duration::from_secs(300));
    }

    #[test]
    fn updates_survive_reopen() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("settings.json");
        let store = SettingsStore::new(path.clone()).unwrap();
        store
            .update(|settings| settings.api_base_url = "https://steps.example/api".into())
            .unwrap();

        let reopened = SettingsStore::new(path).unwrap();
        assert_eq!(reopened.stored().api_base_url, "https://steps.example/api");
    }

    #[test]
    fn partial_file_fills_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, r#"{ "requestTimeoutSecs": 3 }"#).unwrap();

        let settings = SettingsStore::new(path).unwrap().stored();
        assert_eq!(settings.request_timeout_secs, 3);
        assert_eq!(settings.api_base_url, DEFAULT_API_BASE_URL);
    }

    #[test]
    fn malformed_file_falls_back_to_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, "not json").unwrap();

        let store = SettingsStore::new(path.clone()).unwrap();
        assert_eq!(store.stored(), Settings::default());
        assert_eq!(fs::read_to_string(path).unwrap(), "not json");
    }

    #[test]
    fn reload_picks_up_external_edits() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("settings.json");
        let store = SettingsStore::new(path.clone()).unwrap();
        fs::write(&path, r#"{ "notificationIntervalSecs": 60 }"#).unwrap();

        store.reload().unwrap();
        assert_eq!(store.stored().notification_interval_secs, 60);
    }

    #[test]
    fn environment_overrides_win() {
        let settings = Settings::default().with_overrides(|name| match name {
            API_URL_ENV => Some("http://10.0.0.2:5000/api".into()),
            REQUEST_TIMEOUT_ENV => Some("25".into()),
            _ => None,
        });
        assert_eq!(settings.api_base_url, "http://10.0.0.2:5000/api");
        assert_eq!(settings.request_timeout_secs, 25);

        let settings = Settings::default().with_overrides(|name| {
            (name == REQUEST_TIMEOUT_ENV).then(|| "soon".to_string())
        });
        assert_eq!(settings.request_timeout_secs, 10);
    }
}
