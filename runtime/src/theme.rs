//! Persisted theme preference.

use anyhow::Context;
use anyhow::Result;
use serde::Deserialize;
use serde::Serialize;
use std::fs;
use std::path::PathBuf;

/// Theme used until the user picks one.
pub const DEFAULT_THEME: &str = "dark";

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
struct Preferences {
    #[serde(default)]
    theme: Option<String>,
}

/// File-backed store for the selected theme name. The preference file is
/// a single JSON object with the fixed key `theme`, surviving across
/// sessions.
#[derive(Debug, Clone)]
pub struct ThemeStore {
    path: PathBuf,
}

impl ThemeStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The selected theme name, or [`DEFAULT_THEME`] when never set.
    pub fn theme(&self) -> Result<String> {
        Ok(self
            .read()?
            .theme
            .unwrap_or_else(|| DEFAULT_THEME.to_string()))
    }

    pub fn set_theme(&self, name: &str) -> Result<()> {
        let mut prefs = self.read()?;
        prefs.theme = Some(name.to_string());
        self.write(&prefs)
    }

    fn read(&self) -> Result<Preferences> {
        match fs::read(&self.path) {
            Ok(data) => serde_json::from_slice(&data).context("parse theme preferences"),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Preferences::default()),
            Err(err) => Err(err).context("read theme preferences"),
        }
    }

    fn write(&self, prefs: &Preferences) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).context("create preferences dir")?;
        }
        let data = serde_json::to_vec_pretty(prefs).context("serialize theme preferences")?;
        fs::write(&self.path, data).context("write theme preferences")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    #[test]
    fn missing_file_yields_the_default_theme() {
        let dir = tempdir().unwrap();
        let store = ThemeStore::new(dir.path().join("preferences.json"));
        assert_eq!(store.theme().unwrap(), DEFAULT_THEME);
    }

    #[test]
    fn theme_survives_across_store_instances() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("state").join("preferences.json");
        ThemeStore::new(&path).set_theme("light").unwrap();
        assert_eq!(ThemeStore::new(&path).theme().unwrap(), "light");
    }

    #[test]
    fn preference_file_uses_the_fixed_theme_key() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("preferences.json");
        ThemeStore::new(&path).set_theme("hacker").unwrap();
        let raw: serde_json::Value =
            serde_json::from_slice(&std::fs::read(&path).unwrap()).unwrap();
        assert_eq!(raw["theme"], "hacker");
    }

    #[test]
    fn corrupt_preferences_surface_an_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("preferences.json");
        std::fs::write(&path, b"{not json").unwrap();
        assert!(ThemeStore::new(&path).theme().is_err());
    }
}
