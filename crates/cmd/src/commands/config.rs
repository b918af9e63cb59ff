// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

use std::io::Write;
use std::path::PathBuf;

use anyhow::Result;

use crate::common::load_config;

/// Print the effective configuration.
pub fn config_command(config: Option<PathBuf>, out: &mut impl Write) -> Result<()> {
    let config = load_config(config)?;
    write!(out, "{}", config.to_yaml()?)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_prints_overrides() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gate.yaml");
        std::fs::write(&path, "tree:\n  file_mime_type: text/plain\n").unwrap();

        let mut out = Vec::new();
        config_command(Some(path), &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("file_mime_type: text/plain"));
        assert!(text.contains("derive_missing_names: true"));
    }
}
