use anyhow::{Context, Result};
use dirs::config_dir;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use trailpack_core::aggregator::ViewMode;
use trailpack_core::models::UNCATEGORIZED;
use trailpack_core::units::UnitSystem;

const APP_NAME: &str = "trailpack";
const SETTINGS_FILE: &str = "settings.json";

const DEFAULT_CATEGORIES: &[&str] = &[
    "Clothing",
    "Cooking",
    "Electronics",
    "First Aid",
    "Food",
    "Hygiene",
    "Navigation",
    "Pack",
    "Shelter",
    "Sleep",
    "Tools",
    "Water",
    UNCATEGORIZED,
];

/// User preferences, passed explicitly to whatever needs them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Unit system for display and weight entry.
    pub unit_system: UnitSystem,
    /// Categories offered when cataloging gear.
    pub categories: Vec<String>,
    /// Show only unverified rows in `hike show` by default.
    pub pending_only: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            unit_system: UnitSystem::Metric,
            categories: DEFAULT_CATEGORIES.iter().map(|c| c.to_string()).collect(),
            pending_only: false,
        }
    }
}

impl Settings {
    /// Load settings from the user's config directory.
    /// Returns defaults if the file doesn't exist or fails to parse.
    pub fn load() -> Self {
        match settings_path().and_then(|path| Self::load_from(&path)) {
            Ok(settings) => settings,
            Err(e) => {
                tracing::warn!("Failed to load settings, using defaults: {:#}", e);
                Self::default()
            }
        }
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path).context("Failed to read settings file")?;
        let settings = serde_json::from_str(&content).context("Failed to parse settings file")?;
        Ok(settings)
    }

    /// Save to the user's config directory.
    pub fn save(&self) -> Result<()> {
        self.save_to(&settings_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        let content = serde_json::to_string_pretty(self).context("Failed to serialize settings")?;
        fs::write(path, content).context("Failed to write settings file")?;
        Ok(())
    }

    pub fn view_mode(&self) -> ViewMode {
        ViewMode::from_pending_only(self.pending_only)
    }

    pub fn is_known_category(&self, category: &str) -> bool {
        self.categories.iter().any(|c| c == category)
    }
}

pub fn settings_path() -> Result<PathBuf> {
    let mut path =
        config_dir().ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;
    path.push(APP_NAME);
    path.push(SETTINGS_FILE);
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings::load_from(&dir.path().join("settings.json")).unwrap();
        assert_eq!(settings, Settings::default());
        assert!(settings.is_known_category(UNCATEGORIZED));
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("settings.json");
        let settings = Settings {
            unit_system: UnitSystem::Imperial,
            categories: vec!["Packraft".to_string()],
            pending_only: true,
        };

        settings.save_to(&path).unwrap();
        let loaded = Settings::load_from(&path).unwrap();

        assert_eq!(loaded, settings);
        assert_eq!(loaded.view_mode(), ViewMode::PendingOnly);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, r#"{ "unit_system": "imperial" }"#).unwrap();

        let loaded = Settings::load_from(&path).unwrap();
        assert_eq!(loaded.unit_system, UnitSystem::Imperial);
        assert_eq!(loaded.categories, Settings::default().categories);
    }

    #[test]
    fn test_invalid_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, "not json").unwrap();
        assert!(Settings::load_from(&path).is_err());
    }
}
