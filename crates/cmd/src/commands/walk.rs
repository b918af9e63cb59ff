// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

use std::io::Write;

use anyhow::{Context, Result};
use futures::StreamExt;
use gatefs::{LocalGateway, Lookup, walk_filtered};

use crate::common::{format_lookup, local_path};

/// Recursive listing. Subtrees whose name is in `prune` are skipped.
pub async fn walk_command(path: &str, prune: &[String], out: &mut impl Write) -> Result<()> {
    let root = local_path(path)?;
    let gateway = LocalGateway::new();

    let filter = |lookup: &Lookup| {
        lookup
            .name()
            .is_none_or(|name| !prune.iter().any(|p| p == name))
    };
    let mut stream = Box::pin(walk_filtered(&gateway, &root, filter));
    while let Some(item) = stream.next().await {
        let lookup = item.with_context(|| format!("Walk of {root} failed"))?;
        writeln!(out, "{}", format_lookup(&lookup))?;
    }
    Ok(())
}
