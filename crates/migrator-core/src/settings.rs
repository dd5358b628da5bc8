//! Application settings
//!
//! Non-sensitive preferences in a plain JSON file next to the vault.
//! Readable without the master password.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::error::Result;
use crate::migration::CollisionStrategy;
use crate::storage::{create_private_dir, write_private_file};

/// Settings file name
pub const SETTINGS_FILE: &str = "settings.json";

/// Current settings format version
pub const SETTINGS_VERSION: u32 = 1;

/// Application settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    /// Settings file version
    pub version: u32,
    /// Strategy used when an import does not name one
    pub default_collision_strategy: CollisionStrategy,
    /// Where exports are written when no path is given
    pub export_dir: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            version: SETTINGS_VERSION,
            default_collision_strategy: CollisionStrategy::Stop,
            export_dir: None,
        }
    }
}

impl Settings {
    /// Resolve an export file name against `export_dir`
    ///
    /// Absolute paths, and any path when no export dir is set, are returned
    /// unchanged.
    pub fn export_path(&self, file: impl AsRef<Path>) -> PathBuf {
        let file = file.as_ref();
        match &self.export_dir {
            Some(dir) if file.is_relative() => dir.join(file),
            _ => file.to_path_buf(),
        }
    }
}

/// Settings manager
pub struct SettingsManager {
    settings_file: PathBuf,
    settings: Settings,
}

impl SettingsManager {
    /// Load settings from `storage_dir`, falling back to defaults
    pub fn new(storage_dir: &Path) -> Self {
        let settings_file = storage_dir.join(SETTINGS_FILE);
        let settings = match Self::load_from_file(&settings_file) {
            Ok(settings) => settings,
            Err(e) => {
                warn!("Ignoring unreadable settings file {:?}: {}", settings_file, e);
                Settings::default()
            }
        };

        Self {
            settings_file,
            settings,
        }
    }

    fn load_from_file(path: &Path) -> Result<Settings> {
        if !path.exists() {
            debug!("No settings file found, using defaults");
            return Ok(Settings::default());
        }

        let contents = std::fs::read_to_string(path)?;
        let settings: Settings = serde_json::from_str(&contents)?;
        debug!("Loaded settings from {:?}", path);
        Ok(settings)
    }

    /// Save settings to file
    pub async fn save(&self) -> Result<()> {
        let contents = serde_json::to_vec_pretty(&self.settings)?;

        if let Some(dir) = self.settings_file.parent() {
            create_private_dir(dir).await?;
        }
        write_private_file(&self.settings_file, &contents).await?;

        debug!("Saved settings to {:?}", self.settings_file);
        Ok(())
    }

    pub fn get(&self) -> &Settings {
        &self.settings
    }

    pub fn get_mut(&mut self) -> &mut Settings {
        &mut self.settings
    }

    /// Replace settings and save
    pub async fn update(&mut self, settings: Settings) -> Result<()> {
        self.settings = settings;
        self.save().await
    }

    /// Set the default collision strategy and save
    pub async fn set_default_collision_strategy(
        &mut self,
        strategy: CollisionStrategy,
    ) -> Result<()> {
        self.settings.default_collision_strategy = strategy;
        self.save().await
    }

    /// Directory for exports, if configured
    pub fn export_dir(&self) -> Option<&Path> {
        self.settings.export_dir.as_deref()
    }

    /// Reset settings to defaults and delete the settings file
    pub async fn reset(&mut self) -> Result<()> {
        self.settings = Settings::default();

        if self.settings_file.exists() {
            tokio::fs::remove_file(&self.settings_file).await?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_settings_default() {
        let temp_dir = TempDir::new().unwrap();
        let manager = SettingsManager::new(temp_dir.path());

        let settings = manager.get();
        assert_eq!(settings.version, SETTINGS_VERSION);
        assert_eq!(settings.default_collision_strategy, CollisionStrategy::Stop);
        assert!(manager.export_dir().is_none());
    }

    #[tokio::test]
    async fn test_settings_persistence() {
        let temp_dir = TempDir::new().unwrap();

        {
            let mut manager = SettingsManager::new(temp_dir.path());
            manager.get_mut().export_dir = Some(PathBuf::from("/var/exports"));
            manager
                .set_default_collision_strategy(CollisionStrategy::Skip)
                .await
                .unwrap();
        }

        let manager = SettingsManager::new(temp_dir.path());
        assert_eq!(manager.get().default_collision_strategy, CollisionStrategy::Skip);
        assert_eq!(manager.export_dir(), Some(Path::new("/var/exports")));
    }

    #[tokio::test]
    async fn test_file_format_is_camel_case() {
        let temp_dir = TempDir::new().unwrap();
        let mut manager = SettingsManager::new(temp_dir.path());
        manager
            .update(Settings {
                default_collision_strategy: CollisionStrategy::Overwrite,
                ..Settings::default()
            })
            .await
            .unwrap();

        let raw = std::fs::read_to_string(temp_dir.path().join(SETTINGS_FILE)).unwrap();
        let json: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(json["defaultCollisionStrategy"], "overwrite");
        assert_eq!(json["version"], 1);
    }

    #[tokio::test]
    async fn test_partial_and_corrupt_files() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join(SETTINGS_FILE);

        std::fs::write(&path, r#"{"defaultCollisionStrategy": "skip"}"#).unwrap();
        let manager = SettingsManager::new(temp_dir.path());
        assert_eq!(manager.get().default_collision_strategy, CollisionStrategy::Skip);
        assert_eq!(manager.get().version, SETTINGS_VERSION);

        std::fs::write(&path, "not json").unwrap();
        let manager = SettingsManager::new(temp_dir.path());
        assert_eq!(manager.get(), &Settings::default());
    }

    #[test]
    fn test_export_path() {
        let mut settings = Settings::default();
        assert_eq!(settings.export_path("out.csv"), PathBuf::from("out.csv"));

        settings.export_dir = Some(PathBuf::from("/var/exports"));
        assert_eq!(
            settings.export_path("out.csv"),
            PathBuf::from("/var/exports/out.csv")
        );
        assert_eq!(
            settings.export_path("/tmp/out.csv"),
            PathBuf::from("/tmp/out.csv")
        );
    }

    #[tokio::test]
    async fn test_reset() {
        let temp_dir = TempDir::new().unwrap();
        let mut manager = SettingsManager::new(temp_dir.path());
        manager
            .set_default_collision_strategy(CollisionStrategy::Overwrite)
            .await
            .unwrap();

        manager.reset().await.unwrap();
        assert_eq!(manager.get(), &Settings::default());
        assert!(!temp_dir.path().join(SETTINGS_FILE).exists());
    }
}
