// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

use std::io::Write;

use anyhow::{Context, Result};
use diagnostics::info;
use gatefs::{Gateway, LocalGateway};

use crate::common::local_path;

pub async fn mkdir_command(path: &str, out: &mut impl Write) -> Result<()> {
    let path = local_path(path)?;
    let path_str = path.display_path();

    let created = LocalGateway::new()
        .create_dir(&path)
        .await
        .with_context(|| format!("Cannot create directory {path_str}"))?;
    if created {
        info!("Directory created: {path}", path: path_str);
    } else {
        writeln!(out, "{path_str} already exists")?;
    }
    Ok(())
}
