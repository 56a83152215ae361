//! Persistence for user preferences.

use flora_core::Language;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PersistedPreferences {
    pub dark_mode: bool,
    /// Last language chosen for AI translation.
    pub ai_language: Language,
}

#[derive(Debug, thiserror::Error)]
pub enum PersistenceError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

pub fn load(path: &Path) -> Result<Option<PersistedPreferences>, PersistenceError> {
    if !path.exists() {
        return Ok(None);
    }
    let contents = std::fs::read_to_string(path)?;
    let preferences = serde_json::from_str::<PersistedPreferences>(&contents)?;
    Ok(Some(preferences))
}

pub fn save(path: &Path, preferences: &PersistedPreferences) -> Result<(), PersistenceError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let contents = serde_json::to_string_pretty(preferences)?;
    std::fs::write(path, contents)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_loads_none() {
        let dir = tempfile::tempdir().expect("tempdir");
        assert!(load(&dir.path().join("prefs.json")).expect("load").is_none());
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("nested/prefs.json");
        let prefs = PersistedPreferences {
            dark_mode: true,
            ai_language: Language::Malayalam,
        };
        save(&path, &prefs).expect("save");
        assert_eq!(load(&path).expect("load"), Some(prefs));
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("prefs.json");
        std::fs::write(&path, r#"{"darkMode": true}"#).expect("write");
        let prefs = load(&path).expect("load").expect("present");
        assert!(prefs.dark_mode);
        assert_eq!(prefs.ai_language, Language::BASE);
    }

    #[test]
    fn test_corrupt_file_is_an_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("prefs.json");
        std::fs::write(&path, "not json").expect("write");
        assert!(matches!(load(&path), Err(PersistenceError::Serde(_))));
    }
}
