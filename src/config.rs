//! Client settings persisted as TOML in the user's config directory.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::interactive::constants::MAX_NAVIGATION_HISTORY;

const APP_DIR: &str = "archive-search";
const CONFIG_FILE: &str = "config.toml";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ClientSettings {
    /// Base URL of the archive server; `api/search/` is appended
    pub server_url: String,
    /// API token sent as `Authorization: token:<token>`
    pub token: Option<String>,
    /// URLs kept for :back / :forward
    pub history_limit: usize,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            server_url: "http://localhost:8000/".to_string(),
            token: None,
            history_limit: MAX_NAVIGATION_HISTORY,
        }
    }
}

impl ClientSettings {
    /// Command line and environment values win over the file.
    pub fn with_overrides(mut self, server_url: Option<String>, token: Option<String>) -> Self {
        if let Some(server_url) = server_url {
            self.server_url = server_url;
        }
        if token.is_some() {
            self.token = token;
        }
        self
    }
}

pub struct SettingsManager {
    config_path: PathBuf,
}

impl SettingsManager {
    pub fn new() -> Result<Self> {
        let config_dir = Self::config_dir()?;
        Ok(Self {
            config_path: config_dir.join(CONFIG_FILE),
        })
    }

    pub fn with_path(path: PathBuf) -> Self {
        Self { config_path: path }
    }

    pub fn path(&self) -> &Path {
        &self.config_path
    }

    /// Loads settings, writing the defaults on first use.
    pub fn load(&self) -> Result<ClientSettings> {
        if !self.config_path.exists() {
            let settings = ClientSettings::default();
            if let Err(e) = self.save(&settings) {
                warn!(path = %self.config_path.display(), error = %e, "could not write default settings");
            }
            return Ok(settings);
        }

        let contents = fs::read_to_string(&self.config_path).with_context(|| {
            format!("Failed to read settings file {}", self.config_path.display())
        })?;
        let settings = toml::from_str(&contents).with_context(|| {
            format!("Failed to parse settings file {}", self.config_path.display())
        })?;
        debug!(path = %self.config_path.display(), "loaded settings");
        Ok(settings)
    }

    pub fn save(&self, settings: &ClientSettings) -> Result<()> {
        if let Some(parent) = self.config_path.parent() {
            fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        let toml_string =
            toml::to_string_pretty(settings).context("Failed to serialize settings")?;
        fs::write(&self.config_path, toml_string).context("Failed to write settings file")?;
        Ok(())
    }

    pub fn reset(&self) -> Result<ClientSettings> {
        let settings = ClientSettings::default();
        self.save(&settings)?;
        Ok(settings)
    }

    pub fn update<F>(&self, updater: F) -> Result<ClientSettings>
    where
        F: FnOnce(&mut ClientSettings),
    {
        let mut settings = self.load()?;
        updater(&mut settings);
        self.save(&settings)?;
        Ok(settings)
    }

    fn config_dir() -> Result<PathBuf> {
        if let Some(config_dir) = dirs::config_dir() {
            return Ok(config_dir.join(APP_DIR));
        }
        dirs::home_dir()
            .map(|home| home.join(".config").join(APP_DIR))
            .context("Could not determine a config directory")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::{NamedTempFile, tempdir};

    #[test]
    fn test_default_settings() {
        let settings = ClientSettings::default();
        assert_eq!(settings.server_url, "http://localhost:8000/");
        assert_eq!(settings.token, None);
        assert_eq!(settings.history_limit, 50);
    }

    #[test]
    fn test_missing_file_writes_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join(CONFIG_FILE);
        let manager = SettingsManager::with_path(path.clone());

        assert_eq!(manager.load().unwrap(), ClientSettings::default());
        assert!(path.exists());
    }

    #[test]
    fn test_empty_file_gives_defaults() {
        let temp_file = NamedTempFile::new().unwrap();
        let manager = SettingsManager::with_path(temp_file.path().to_path_buf());

        assert_eq!(manager.load().unwrap(), ClientSettings::default());
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let temp_file = NamedTempFile::new().unwrap();
        fs::write(temp_file.path(), "token = \"abc\"\n").unwrap();
        let manager = SettingsManager::with_path(temp_file.path().to_path_buf());

        let settings = manager.load().unwrap();
        assert_eq!(settings.token.as_deref(), Some("abc"));
        assert_eq!(settings.server_url, "http://localhost:8000/");
    }

    #[test]
    fn test_save_load() {
        let temp_file = NamedTempFile::new().unwrap();
        let manager = SettingsManager::with_path(temp_file.path().to_path_buf());

        let modified = ClientSettings {
            server_url: "https://archive.example.org/".to_string(),
            history_limit: 10,
            ..Default::default()
        };
        manager.save(&modified).unwrap();

        assert_eq!(manager.load().unwrap(), modified);
    }

    #[test]
    fn test_update_and_reset() {
        let temp_file = NamedTempFile::new().unwrap();
        let manager = SettingsManager::with_path(temp_file.path().to_path_buf());

        let updated = manager
            .update(|s| s.token = Some("secret".to_string()))
            .unwrap();
        assert_eq!(updated.token.as_deref(), Some("secret"));
        assert_eq!(manager.load().unwrap().token.as_deref(), Some("secret"));

        assert_eq!(manager.reset().unwrap(), ClientSettings::default());
        assert_eq!(manager.load().unwrap(), ClientSettings::default());
    }

    #[test]
    fn test_invalid_file_is_an_error() {
        let temp_file = NamedTempFile::new().unwrap();
        fs::write(temp_file.path(), "history_limit = \"lots\"").unwrap();
        let manager = SettingsManager::with_path(temp_file.path().to_path_buf());

        let err = manager.load().unwrap_err();
        assert!(err.to_string().contains("Failed to parse settings file"));
    }

    #[test]
    fn test_overrides() {
        let settings = ClientSettings {
            token: Some("file".to_string()),
            ..Default::default()
        }
        .with_overrides(Some("http://other:9000".to_string()), None);

        assert_eq!(settings.server_url, "http://other:9000");
        assert_eq!(settings.token.as_deref(), Some("file"));
    }
}
