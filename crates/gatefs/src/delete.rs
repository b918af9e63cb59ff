// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

//! Post-order recursive deletion over any gateway.

use crate::error::{Error, Result};
use crate::gateway::Gateway;
use crate::lookup::Lookup;
use crate::path::GatePath;
use diagnostics::{debug, info};
use std::future::Future;
use std::io;
use std::pin::Pin;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Outcome {
    /// Gone, whether we removed it or it was already absent.
    Gone,
    /// The node, or something beneath it, was kept by the filter.
    Retained,
}

/// Delete `path` and everything beneath it.
pub async fn delete_all<G>(gateway: &G, path: &GatePath) -> Result<()>
where
    G: Gateway + ?Sized,
{
    delete_all_filtered(gateway, path, |_: &Lookup| true).await
}

/// Delete `path` and everything beneath it that `filter` accepts.
///
/// Children go first. The filter is asked about each node after its
/// children were handled; a rejected node is left in place, and so is any
/// directory still holding a retained entry. Unlike [`crate::walk`], the
/// filter never stops the descent.
///
/// A node that cannot be looked up or listed is checked for existence: if
/// it is gone, its subtree counts as deleted, otherwise the failure aborts
/// the deletion. Deletions already applied stay applied.
pub async fn delete_all_filtered<G, F>(gateway: &G, path: &GatePath, filter: F) -> Result<()>
where
    G: Gateway + ?Sized,
    F: Fn(&Lookup) -> bool + Send + Sync,
{
    let _keep_alive = gateway.keep_alive(path).await?;
    let outcome = delete_node(gateway, path, &filter).await?;

    let path_str = path.display_path();
    match outcome {
        Outcome::Gone => info!("Deleted {path}", path: path_str),
        Outcome::Retained => info!("Deleted below {path}, retained entries remain", path: path_str),
    }
    Ok(())
}

fn delete_node<'a, G, F>(
    gateway: &'a G,
    path: &'a GatePath,
    filter: &'a F,
) -> Pin<Box<dyn Future<Output = Result<Outcome>> + Send + 'a>>
where
    G: Gateway + ?Sized,
    F: Fn(&Lookup) -> bool + Send + Sync,
{
    Box::pin(async move {
        let lookup = match gateway.lookup(path).await {
            Ok(lookup) => lookup,
            Err(e) if e.is_read_failure() => return vanished(gateway, path, e).await,
            Err(e) => return Err(e),
        };

        let mut retained = 0usize;
        if lookup.is_directory() {
            let children = match gateway.list_files(path).await {
                Ok(children) => children,
                Err(e) if e.is_read_failure() => return vanished(gateway, path, e).await,
                Err(e) => return Err(e),
            };
            for child in &children {
                if delete_node(gateway, child, filter).await? == Outcome::Retained {
                    retained += 1;
                }
            }
        }

        let path_str = path.display_path();
        if !filter(&lookup) {
            debug!("Filter keeps {path}", path: path_str);
            return Ok(Outcome::Retained);
        }
        if retained > 0 {
            debug!(
                "Keeping {path}, it still holds {count} retained entries",
                path: path_str,
                count: retained
            );
            return Ok(Outcome::Retained);
        }

        if gateway.delete(path).await? || !gateway.exists(path).await? {
            Ok(Outcome::Gone)
        } else {
            Err(Error::write(
                path,
                io::Error::other("delete reported no change but the node is still there"),
            ))
        }
    })
}

/// Decide what a read failure on `path` means for the deletion.
async fn vanished<G>(gateway: &G, path: &GatePath, failure: Error) -> Result<Outcome>
where
    G: Gateway + ?Sized,
{
    match gateway.exists(path).await {
        Ok(false) => {
            let path_str = path.display_path();
            debug!("{path} disappeared, counting it as deleted", path: path_str);
            Ok(Outcome::Gone)
        }
        _ => Err(failure),
    }
}
