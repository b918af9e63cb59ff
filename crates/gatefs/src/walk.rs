// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

//! Lazy depth-first traversal over any gateway.

use crate::error::Result;
use crate::gateway::Gateway;
use crate::lookup::Lookup;
use crate::path::GatePath;
use diagnostics::debug;
use futures::Stream;

/// Every descendant of `root`, depth first. See [`walk_filtered`].
pub fn walk<'a, G>(gateway: &'a G, root: &GatePath) -> impl Stream<Item = Result<Lookup>> + Send + 'a
where
    G: Gateway + ?Sized,
{
    walk_filtered(gateway, root, |_: &Lookup| true)
}

/// Descendants of `root` accepted by `filter`, depth first.
///
/// A node the filter rejects is not produced and its subtree is never
/// listed. The root itself is not produced; a root that is not a directory
/// has no descendants. Symlinks are reported, never followed. Nothing is
/// read until the stream is polled, and the gateway's keep-alive lease is
/// held until the stream is dropped. Sibling order is whatever the backend
/// lists.
pub fn walk_filtered<'a, G, F>(
    gateway: &'a G,
    root: &GatePath,
    filter: F,
) -> impl Stream<Item = Result<Lookup>> + Send + 'a
where
    G: Gateway + ?Sized,
    F: Fn(&Lookup) -> bool + Send + Sync + 'a,
{
    let root = root.clone();
    async_stream::try_stream! {
        let _keep_alive = gateway.keep_alive(&root).await?;

        let start = gateway.lookup(&root).await?;
        let mut pending = if start.is_directory() {
            gateway.lookup_files(&root).await?
        } else {
            Vec::new()
        };
        let mut produced = 0usize;

        while let Some(lookup) = pending.pop() {
            if !filter(&lookup) {
                let path_str = lookup.path().display_path();
                debug!("Pruned {path}", path: path_str);
                continue;
            }
            let descend = lookup.is_directory().then(|| lookup.path().clone());
            produced += 1;
            yield lookup;

            if let Some(dir) = descend {
                pending.extend(gateway.lookup_files(&dir).await?);
            }
        }

        let root_str = root.display_path();
        debug!("Walked {root}: {count} entries", root: root_str, count: produced);
    }
}
