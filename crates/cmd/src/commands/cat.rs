// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

use std::io::Write;

use anyhow::{Context, Result};
use gatefs::{Gateway, LocalGateway};
use tokio::io::AsyncReadExt;

use crate::common::local_path;

const CHUNK_SIZE: usize = 64 * 1024;

/// Copy a file to `out` chunk by chunk.
pub async fn cat_command(path: &str, out: &mut impl Write) -> Result<()> {
    let path = local_path(path)?;
    let mut stream = LocalGateway::new()
        .read(&path)
        .await
        .with_context(|| format!("Cannot read {path}"))?;

    let mut buffer = vec![0u8; CHUNK_SIZE];
    loop {
        let n = stream
            .read(&mut buffer)
            .await
            .with_context(|| format!("Read of {path} failed"))?;
        if n == 0 {
            break;
        }
        out.write_all(&buffer[..n])?;
    }
    out.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_cat_large_file() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("big.bin");
        let content: Vec<u8> = (0..200_000u32).map(|i| (i % 251) as u8).collect();
        std::fs::write(&file, &content).unwrap();

        let mut out = Vec::new();
        cat_command(&file.display().to_string(), &mut out).await.unwrap();
        assert_eq!(out, content);
    }

    #[tokio::test]
    async fn test_cat_directory_fails() {
        let dir = tempfile::tempdir().unwrap();
        let mut out = Vec::new();
        assert!(cat_command(&dir.path().display().to_string(), &mut out).await.is_err());
    }
}
