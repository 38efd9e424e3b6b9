//! Persistent application settings.
//!
//! Settings are stored as JSON in the app data directory and survive restarts.

use std::path::Path;

use serde::{Deserialize, Serialize};

/// Application settings persisted to disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Base URL of the sync API (e.g. "https://example.com/api/budget").
    /// `None` disables sync: mutations accumulate in the local queue.
    #[serde(default)]
    pub api_base: Option<String>,
    /// Per-request timeout for sync calls.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    /// How often `watch` probes the API for connectivity.
    #[serde(default = "default_probe_interval_secs")]
    pub probe_interval_secs: u64,
    /// Legacy entry list imported once on first load, relative to the data dir.
    #[serde(default = "default_legacy_entries_file")]
    pub legacy_entries_file: String,
}

fn default_request_timeout_secs() -> u64 {
    10
}
fn default_probe_interval_secs() -> u64 {
    30
}
fn default_legacy_entries_file() -> String {
    "budgeto_entries.json".into()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_base: None,
            request_timeout_secs: default_request_timeout_secs(),
            probe_interval_secs: default_probe_interval_secs(),
            legacy_entries_file: default_legacy_entries_file(),
        }
    }
}

impl Settings {
    /// Load settings from a JSON file. Returns defaults if file doesn't exist.
    pub fn load(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(content) => serde_json::from_str(&content).unwrap_or_else(|e| {
                tracing::warn!("Failed to parse settings file: {}, using defaults", e);
                Self::default()
            }),
            Err(_) => {
                tracing::info!("No settings file found, using defaults");
                Self::default()
            }
        }
    }

    /// Save settings to a JSON file.
    pub fn save(&self, path: &Path) -> crate::error::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        tracing::info!("Settings saved to {}", path.display());
        Ok(())
    }

    /// The configured API base without a trailing slash, if sync is enabled.
    pub fn api_base(&self) -> Option<&str> {
        self.api_base
            .as_deref()
            .map(|base| base.trim().trim_end_matches('/'))
            .filter(|base| !base.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert!(settings.api_base.is_none());
        assert_eq!(settings.request_timeout_secs, 10);
        assert_eq!(settings.legacy_entries_file, "budgeto_entries.json");
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("settings.json");
        let settings = Settings {
            api_base: Some("http://localhost:8080/api/budget".to_string()),
            ..Default::default()
        };
        settings.save(&path).unwrap();

        let loaded = Settings::load(&path);
        assert_eq!(loaded, settings);
    }

    #[test]
    fn test_load_missing_file() {
        let settings = Settings::load(Path::new("/nonexistent/settings.json"));
        assert!(settings.api_base.is_none());
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, r#"{"api_base":"http://x/"}"#).unwrap();

        let loaded = Settings::load(&path);
        assert_eq!(loaded.api_base(), Some("http://x"));
        assert_eq!(loaded.probe_interval_secs, 30);
    }

    #[test]
    fn test_blank_api_base_disables_sync() {
        let settings = Settings {
            api_base: Some("  ".into()),
            ..Default::default()
        };
        assert!(settings.api_base().is_none());
    }

    #[test]
    fn test_unparseable_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, "{\"api_base\": [not json").unwrap();

        assert_eq!(Settings::load(&path), Settings::default());
    }
}
