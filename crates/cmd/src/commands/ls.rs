// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

use std::io::Write;

use anyhow::{Context, Result};
use gatefs::{Gateway, LocalGateway};

use crate::common::{format_lookup, local_path};

/// Direct children, sorted by name. A file lists as itself.
pub async fn ls_command(path: &str, out: &mut impl Write) -> Result<()> {
    let path = local_path(path)?;
    let gateway = LocalGateway::new();

    let lookup = gateway
        .lookup(&path)
        .await
        .with_context(|| format!("Cannot list {path}"))?;
    if !lookup.is_directory() {
        writeln!(out, "{}", format_lookup(&lookup))?;
        return Ok(());
    }

    let mut children = gateway
        .lookup_files(&path)
        .await
        .with_context(|| format!("Cannot list {path}"))?;
    children.sort_by(|a, b| a.name().cmp(&b.name()));
    for child in &children {
        writeln!(out, "{}", format_lookup(child))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_ls_sorted() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("b.txt"), b"b").unwrap();
        std::fs::create_dir(dir.path().join("a")).unwrap();

        let mut out = Vec::new();
        ls_command(&dir.path().display().to_string(), &mut out).await.unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("d "));
        assert!(lines[0].ends_with("/a"));
        assert!(lines[1].ends_with("/b.txt"));
    }
}
