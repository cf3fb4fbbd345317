use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Environment variable pointing at an alternative settings file
pub const CONFIG_PATH_ENV: &str = "IM_MENU_CONFIG";

/// Environment variable overriding the directory holding the menu documents
pub const CONFIG_DIR_ENV: &str = "IM_MENU_CONFIG_DIR";

/// Where the menu documents and their companion files live
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    /// Directory holding every file below
    pub config_dir: PathBuf,
    /// Edited copy of the menu document, written on every save
    pub override_file: String,
    /// Shipped menu document, read when no override exists
    pub default_file: String,
    pub weblinks_file: String,
    /// Optional service-builder list feeding the function registry
    pub services_file: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            config_dir: PathBuf::from("CONFIGURATIONS"),
            override_file: "IM-menus.override.json".to_string(),
            default_file: "IM-menus.default.json".to_string(),
            weblinks_file: "weblinks.yaml".to_string(),
            services_file: "services.yaml".to_string(),
        }
    }
}

impl Settings {
    /// Loads settings from the provided path; a missing file gives the defaults
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        if !path.as_ref().exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read settings file: {:?}", path.as_ref()))?;
        if content.trim().is_empty() {
            return Ok(Self::default());
        }

        serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse settings file: {:?}", path.as_ref()))
    }

    /// Loads the settings at [`get_settings_path`] and applies environment overrides
    pub fn load_default() -> Result<Self> {
        let settings = Self::load(get_settings_path()?)?;
        Ok(settings.with_config_dir_override(std::env::var(CONFIG_DIR_ENV).ok()))
    }

    /// Replaces `config_dir` when an override is given
    pub fn with_config_dir_override(mut self, dir: Option<String>) -> Self {
        if let Some(dir) = dir.filter(|d| !d.trim().is_empty()) {
            self.config_dir = PathBuf::from(dir);
        }
        self
    }

    /// Save the settings to the specified path
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = serde_yaml::to_string(&self)?;

        if let Some(parent) = path.as_ref().parent() {
            fs::create_dir_all(parent)?;
        }

        fs::write(&path, content)
            .with_context(|| format!("Failed to write settings to {:?}", path.as_ref()))?;

        Ok(())
    }

    /// Writes a default settings file if none exists
    pub fn create_default<P: AsRef<Path>>(path: P) -> Result<()> {
        if path.as_ref().exists() {
            return Ok(());
        }
        Self::default().save(path)
    }

    pub fn override_path(&self) -> PathBuf {
        self.config_dir.join(&self.override_file)
    }

    pub fn default_path(&self) -> PathBuf {
        self.config_dir.join(&self.default_file)
    }

    pub fn weblinks_path(&self) -> PathBuf {
        self.config_dir.join(&self.weblinks_file)
    }

    /// Path of the services list, if one is configured
    pub fn services_path(&self) -> Option<PathBuf> {
        if self.services_file.trim().is_empty() {
            None
        } else {
            Some(self.config_dir.join(&self.services_file))
        }
    }

    /// Document candidates in load order: the override first, then the default
    pub fn document_candidates(&self) -> Vec<PathBuf> {
        vec![self.override_path(), self.default_path()]
    }
}

/// Gets the path to the settings file
pub fn get_settings_path() -> Result<PathBuf> {
    if let Ok(path) = std::env::var(CONFIG_PATH_ENV) {
        return Ok(PathBuf::from(path));
    }

    let config_dir = dirs::config_dir().context("Failed to determine config directory")?;

    Ok(config_dir.join("im-menu").join("config.yaml"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempdir().unwrap();
        let settings = Settings::load(dir.path().join("config.yaml")).unwrap();
        assert_eq!(settings, Settings::default());
        assert_eq!(
            settings.override_path(),
            PathBuf::from("CONFIGURATIONS").join("IM-menus.override.json")
        );
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        fs::write(&path, "config_dir: /srv/im\nservices_file: ''\n").unwrap();

        let settings = Settings::load(&path).unwrap();
        assert_eq!(settings.config_dir, PathBuf::from("/srv/im"));
        assert_eq!(settings.weblinks_path(), PathBuf::from("/srv/im/weblinks.yaml"));
        assert_eq!(settings.services_path(), None);
    }

    #[test]
    fn test_invalid_file_is_an_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        fs::write(&path, "config_dir: [unclosed").unwrap();
        assert!(Settings::load(&path).is_err());
    }

    #[test]
    fn test_create_default_then_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("config.yaml");
        Settings::create_default(&path).unwrap();
        assert!(path.exists());
        assert_eq!(Settings::load(&path).unwrap(), Settings::default());
    }

    #[test]
    fn test_config_dir_override() {
        let settings = Settings::default().with_config_dir_override(Some("/tmp/menus".into()));
        assert_eq!(settings.config_dir, PathBuf::from("/tmp/menus"));

        let untouched = Settings::default().with_config_dir_override(Some("  ".into()));
        assert_eq!(untouched.config_dir, PathBuf::from("CONFIGURATIONS"));
    }

    #[test]
    fn test_document_candidates_order() {
        let settings = Settings::default();
        let candidates = settings.document_candidates();
        assert_eq!(candidates[0], settings.override_path());
        assert_eq!(candidates[1], settings.default_path());
    }
}
