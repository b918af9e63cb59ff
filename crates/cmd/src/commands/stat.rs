// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

use std::io::Write;

use anyhow::{Context, Result};
use diagnostics::debug;
use gatefs::{Gateway, LocalGateway};

use crate::common::{format_lookup, local_path};

pub async fn stat_command(path: &str, out: &mut impl Write) -> Result<()> {
    let path = local_path(path)?;
    let path_str = path.display_path();
    debug!("Looking up {path}", path: path_str);

    let lookup = LocalGateway::new()
        .lookup(&path)
        .await
        .with_context(|| format!("Cannot stat {path_str}"))?;
    writeln!(out, "{}", format_lookup(&lookup))?;
    if let Some(ownership) = lookup.ownership() {
        writeln!(out, "owner {}:{}", ownership.uid, ownership.gid)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_stat_file() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("notes.txt");
        std::fs::write(&file, b"twelve bytes").unwrap();

        let mut out = Vec::new();
        stat_command(&file.display().to_string(), &mut out).await.unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("- "));
        assert!(text.contains("12 B"));
        assert!(text.contains("notes.txt"));
    }

    #[tokio::test]
    async fn test_stat_missing() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing");
        let mut out = Vec::new();
        assert!(stat_command(&missing.display().to_string(), &mut out).await.is_err());
        assert!(out.is_empty());
    }
}
