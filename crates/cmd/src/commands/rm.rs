// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

use anyhow::{Context, Result};
use gatefs::{LocalGateway, Lookup, delete_all_filtered};

use crate::common::local_path;

/// Recursive removal. Entries named in `keep` survive, along with the
/// directories that hold them.
pub async fn rm_command(path: &str, keep: &[String]) -> Result<()> {
    let path = local_path(path)?;
    let filter = |lookup: &Lookup| {
        lookup
            .name()
            .is_none_or(|name| !keep.iter().any(|k| k == name))
    };
    delete_all_filtered(&LocalGateway::new(), &path, filter)
        .await
        .with_context(|| format!("Cannot remove {path}"))
}
