use crate::errors::EditorError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_CONFIG_NAME: &str = "cpacs-tree.config.json";

/// Editor configuration file format
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditorConfig {
    /// Document path mirrored by the tree
    #[serde(default = "default_root_path")]
    pub root_path: String,

    /// Maximum number of undo steps kept (0 = unlimited)
    #[serde(default = "default_undo_limit")]
    pub undo_limit: usize,

    /// Snapshot pairs larger than this are logged as a warning
    #[serde(default = "default_snapshot_warn_bytes")]
    pub snapshot_warn_bytes: usize,

    #[serde(default)]
    pub filter: FilterConfig,
}

fn default_root_path() -> String {
    "/cpacs/vehicles".to_string()
}

fn default_undo_limit() -> usize {
    100
}

fn default_snapshot_warn_bytes() -> usize {
    8 * 1024 * 1024
}

fn default_true() -> bool {
    true
}

/// Initial state of the filter projection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterConfig {
    /// Element types shown outside expert mode; empty means the built-in list
    #[serde(default)]
    pub allowed_types: Vec<String>,

    /// Search also matches `uID` values
    #[serde(default = "default_true")]
    pub match_on_uid: bool,

    #[serde(default)]
    pub expert: bool,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            allowed_types: vec![],
            match_on_uid: true,
            expert: false,
        }
    }
}

impl EditorConfig {
    /// Load config from a directory
    pub fn load(dir: &Path) -> Result<Self, EditorError> {
        let config_path = Self::path_in(dir);

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let config: EditorConfig = serde_json::from_str(&content)?;
            tracing::debug!(path = %config_path.display(), "loaded editor config");
            Ok(config)
        } else {
            // Return default config if none exists
            Ok(EditorConfig::default())
        }
    }

    pub fn path_in(dir: &Path) -> PathBuf {
        dir.join(DEFAULT_CONFIG_NAME)
    }
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            root_path: default_root_path(),
            undo_limit: default_undo_limit(),
            snapshot_warn_bytes: default_snapshot_warn_bytes(),
            filter: FilterConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_config() {
        let json = r#"{
            "rootPath": "/cpacs/vehicles/aircraft",
            "undoLimit": 5,
            "filter": { "allowedTypes": ["wing", "section"], "expert": true }
        }"#;

        let config: EditorConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.root_path, "/cpacs/vehicles/aircraft");
        assert_eq!(config.undo_limit, 5);
        assert_eq!(config.snapshot_warn_bytes, 8 * 1024 * 1024);
        assert_eq!(config.filter.allowed_types, vec!["wing", "section"]);
        assert!(config.filter.match_on_uid);
        assert!(config.filter.expert);
    }

    #[test]
    fn test_default_config() {
        let config = EditorConfig::default();
        assert_eq!(config.root_path, "/cpacs/vehicles");
        assert_eq!(config.undo_limit, 100);
        assert!(config.filter.allowed_types.is_empty());
        assert!(!config.filter.expert);
    }

    #[test]
    fn test_load_missing_and_present() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(EditorConfig::load(dir.path()).unwrap(), EditorConfig::default());

        std::fs::write(EditorConfig::path_in(dir.path()), r#"{ "undoLimit": 0 }"#).unwrap();
        let config = EditorConfig::load(dir.path()).unwrap();
        assert_eq!(config.undo_limit, 0);
        assert_eq!(config.root_path, "/cpacs/vehicles");

        std::fs::write(EditorConfig::path_in(dir.path()), "{ not json").unwrap();
        assert!(matches!(EditorConfig::load(dir.path()), Err(EditorError::Json(_))));
    }
}
