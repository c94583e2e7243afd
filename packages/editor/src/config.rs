use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::errors::{EditorError, EditorResult};

/// Editor session configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditorConfig {
    /// Undo batches kept before the oldest is dropped (0 = unlimited)
    #[serde(default = "default_history_limit")]
    pub history_limit: usize,

    /// Fixed part of the per-node normalization budget; rule and child
    /// counts are added on top
    #[serde(default = "default_normalize_iteration_base")]
    pub normalize_iteration_base: usize,

    /// Move an unset selection to the start of the document after a change
    #[serde(default = "default_true")]
    pub select_start_when_unset: bool,

    /// Coalesce adjacent typing/deleting into one undo batch
    #[serde(default = "default_true")]
    pub merge_typing: bool,
}

fn default_history_limit() -> usize {
    100
}

fn default_normalize_iteration_base() -> usize {
    100
}

fn default_true() -> bool {
    true
}

impl EditorConfig {
    /// Parse config from JSON; missing fields take their defaults
    pub fn from_json(json: &str) -> EditorResult<Self> {
        serde_json::from_str(json).map_err(|e| EditorError::Config(e.to_string()))
    }

    /// Load config from a JSON file
    pub fn load(path: impl AsRef<Path>) -> EditorResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| EditorError::Config(format!("{}: {}", path.display(), e)))?;
        Self::from_json(&content)
    }
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            history_limit: default_history_limit(),
            normalize_iteration_base: default_normalize_iteration_base(),
            select_start_when_unset: true,
            merge_typing: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_config() {
        let json = r#"{
            "historyLimit": 20,
            "normalizeIterationBase": 10,
            "mergeTyping": false
        }"#;

        let config = EditorConfig::from_json(json).unwrap();
        assert_eq!(config.history_limit, 20);
        assert_eq!(config.normalize_iteration_base, 10);
        assert!(config.select_start_when_unset);
        assert!(!config.merge_typing);
    }

    #[test]
    fn test_default_config() {
        let config = EditorConfig::default();
        assert_eq!(config.history_limit, 100);
        assert_eq!(config.normalize_iteration_base, 100);
        assert!(config.select_start_when_unset);
        assert!(config.merge_typing);
        assert_eq!(EditorConfig::from_json("{}").unwrap(), config);
    }

    #[test]
    fn test_bad_config_is_reported() {
        let err = EditorConfig::from_json(r#"{ "historyLimit": "lots" }"#).unwrap_err();
        assert!(matches!(err, EditorError::Config(_)));
    }
}
