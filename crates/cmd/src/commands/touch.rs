// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

use anyhow::{Context, Result};
use chrono::Utc;
use diagnostics::debug;
use gatefs::{Gateway, LocalGateway};

use crate::common::local_path;

/// Create an empty file, or bump the modification time of an existing one.
pub async fn touch_command(path: &str) -> Result<()> {
    let path = local_path(path)?;
    let path_str = path.display_path();
    let gateway = LocalGateway::new();

    let created = gateway
        .create_file(&path)
        .await
        .with_context(|| format!("Cannot create {path_str}"))?;
    if !created {
        debug!("Updating modification time of {path}", path: path_str);
        _ = gateway
            .set_modified_at(&path, Utc::now())
            .await
            .with_context(|| format!("Cannot update {path_str}"))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, SystemTime};

    #[tokio::test]
    async fn test_touch_creates_then_updates() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("new/file.txt");
        touch_command(&file.display().to_string()).await.unwrap();
        assert!(file.is_file());

        let old = SystemTime::now() - Duration::from_secs(3600);
        std::fs::File::options()
            .write(true)
            .open(&file)
            .unwrap()
            .set_modified(old)
            .unwrap();

        touch_command(&file.display().to_string()).await.unwrap();
        let modified = std::fs::metadata(&file).unwrap().modified().unwrap();
        assert!(modified > old + Duration::from_secs(60));
    }
}
