// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

//! Gateway configuration, loaded from YAML.
//!
//! Every field has a default, so an empty document is a valid configuration.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// MIME type of regular documents created through the tree gateway.
pub const DEFAULT_FILE_MIME_TYPE: &str = "application/octet-stream";

/// MIME type providers use to mark a document as a directory.
pub const DIRECTORY_MIME_TYPE: &str = "vnd.android.document/directory";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GatewayConfig {
    pub tree: TreeConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TreeConfig {
    pub file_mime_type: String,
    pub directory_mime_type: String,
    /// Derive a child's name from its document id when the provider
    /// returns none. When off, such a child is a read failure.
    pub derive_missing_names: bool,
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            file_mime_type: DEFAULT_FILE_MIME_TYPE.to_string(),
            directory_mime_type: DIRECTORY_MIME_TYPE.to_string(),
            derive_missing_names: true,
        }
    }
}

impl GatewayConfig {
    pub fn from_yaml(content: &str) -> Result<Self> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: Self = serde_yaml_ng::from_str(content)
            .map_err(|e| Error::config(format!("invalid gateway configuration: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::config(format!("failed to read config file {}: {e}", path.display()))
        })?;
        Self::from_yaml(&content)
    }

    /// The configuration as YAML, every default spelled out.
    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml_ng::to_string(self)
            .map_err(|e| Error::config(format!("cannot serialize configuration: {e}")))
    }

    fn validate(&self) -> Result<()> {
        if self.tree.file_mime_type.is_empty() {
            return Err(Error::config("tree.file_mime_type cannot be empty"));
        }
        if self.tree.directory_mime_type.is_empty() {
            return Err(Error::config("tree.directory_mime_type cannot be empty"));
        }
        if self.tree.file_mime_type == self.tree.directory_mime_type {
            return Err(Error::config(
                "tree.file_mime_type must differ from tree.directory_mime_type",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_document_is_default() {
        assert_eq!(GatewayConfig::from_yaml("").unwrap(), GatewayConfig::default());
        assert!(GatewayConfig::default().tree.derive_missing_names);
    }

    #[test]
    fn test_partial_override() {
        let config = GatewayConfig::from_yaml("tree:\n  derive_missing_names: false\n").unwrap();
        assert!(!config.tree.derive_missing_names);
        assert_eq!(config.tree.file_mime_type, DEFAULT_FILE_MIME_TYPE);
    }

    #[test]
    fn test_rejects_unknown_and_invalid() {
        assert!(matches!(
            GatewayConfig::from_yaml("walk:\n  depth: 3\n"),
            Err(Error::Config(_))
        ));
        assert!(matches!(
            GatewayConfig::from_yaml("tree:\n  file_mime_type: \"\"\n"),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn test_yaml_round_trip() {
        let config = GatewayConfig::default();
        let yaml = config.to_yaml().unwrap();
        assert!(yaml.contains("derive_missing_names: true"));
        assert_eq!(GatewayConfig::from_yaml(&yaml).unwrap(), config);
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gate.yaml");
        std::fs::write(&path, "tree:\n  file_mime_type: text/plain\n").unwrap();
        let config = GatewayConfig::load(&path).unwrap();
        assert_eq!(config.tree.file_mime_type, "text/plain");

        assert!(matches!(
            GatewayConfig::load(dir.path().join("missing.yaml")),
            Err(Error::Config(_))
        ));
    }
}
