// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

use super::{local_fixture, relative_names, tree_fixture};
use crate::gateway::Gateway;
use crate::local::LocalGateway;
use crate::lookup::Lookup;
use crate::path::GatePath;
use crate::walk::{walk, walk_filtered};
use futures::{StreamExt, TryStreamExt};

const ALL: &[&str] = &["a", "a/b", "a/b/deep.txt", "a/drop.txt", "a/keep.txt", "c.txt"];

async fn collect<G: Gateway + ?Sized>(gateway: &G, root: &GatePath) -> Vec<Lookup> {
    walk(gateway, root).try_collect().await.unwrap()
}

/// Every produced node comes after the node it was listed from.
fn assert_depth_first(root: &GatePath, lookups: &[Lookup]) {
    for (index, lookup) in lookups.iter().enumerate() {
        let parent = lookup.path().parent().unwrap();
        if &parent == root {
            continue;
        }
        let parent_index = lookups
            .iter()
            .position(|l| l.path() == &parent)
            .expect("parent produced");
        assert!(parent_index < index);
    }
}

#[tokio::test]
async fn test_walk_local_produces_every_descendant() {
    let (_dir, root) = local_fixture();
    let gateway = LocalGateway::new();

    let lookups = collect(&gateway, &root).await;
    assert_eq!(relative_names(&root, lookups.iter().map(Lookup::path)), ALL);
    assert_depth_first(&root, &lookups);
}

#[tokio::test]
async fn test_walk_tree_produces_every_descendant() {
    let (_provider, gateway, root) = tree_fixture();

    let lookups = collect(&gateway, &root).await;
    assert_eq!(relative_names(&root, lookups.iter().map(Lookup::path)), ALL);
    assert_depth_first(&root, &lookups);
}

#[tokio::test]
async fn test_rejected_node_prunes_its_subtree() {
    let (_dir, root) = local_fixture();
    let gateway = LocalGateway::new();

    let lookups: Vec<Lookup> = walk_filtered(&gateway, &root, |l: &Lookup| l.name() != Some("b"))
        .try_collect()
        .await
        .unwrap();
    assert_eq!(
        relative_names(&root, lookups.iter().map(Lookup::path)),
        vec!["a", "a/drop.txt", "a/keep.txt", "c.txt"]
    );
}

#[tokio::test]
async fn test_walk_of_a_file_is_empty() {
    let (_dir, root) = local_fixture();
    let gateway = LocalGateway::new();
    assert!(collect(&gateway, &root.child("c.txt")).await.is_empty());
}

#[tokio::test]
async fn test_walk_of_missing_root_fails() {
    let (_dir, root) = local_fixture();
    let gateway = LocalGateway::new();
    let mut stream = Box::pin(walk(&gateway, &root.child("nope")));
    let first = stream.next().await.unwrap();
    assert!(first.unwrap_err().is_read_failure());
}

#[tokio::test]
async fn test_walk_is_restartable_from_scratch() {
    let (_provider, gateway, root) = tree_fixture();
    let first = collect(&gateway, &root).await;
    gateway.create_file(&root.child("late.txt")).await.unwrap();
    let second = collect(&gateway, &root).await;
    assert_eq!(second.len(), first.len() + 1);
}

#[tokio::test]
async fn test_walk_holds_the_provider_until_dropped() {
    let (_provider, gateway, root) = tree_fixture();
    assert!(!gateway.provider().is_open());

    let mut stream = Box::pin(walk(&gateway, &root));
    // Nothing happens before the first poll.
    assert!(!gateway.provider().is_open());

    let first = stream.next().await.unwrap().unwrap();
    assert!(first.path().is_descendant_of(&root));
    assert_eq!(gateway.provider().lease_count(), 1);
    assert_eq!(gateway.provider().generation(), 1);

    drop(stream);
    assert!(!gateway.provider().is_open());
}

#[cfg(unix)]
#[tokio::test]
async fn test_walk_does_not_follow_symlinks() {
    let (_dir, root) = local_fixture();
    let gateway = LocalGateway::new();
    assert!(
        gateway
            .create_symlink(&root.child("link"), &root.child("a"))
            .await
            .unwrap()
    );

    let lookups = collect(&gateway, &root).await;
    let link = lookups
        .iter()
        .find(|l| l.name() == Some("link"))
        .unwrap();
    assert!(link.is_symlink());
    assert!(
        !lookups
            .iter()
            .any(|l| l.path().is_descendant_of(&root.child("link")))
    );
}

#[cfg(unix)]
#[tokio::test]
async fn test_walk_fails_on_undecodable_name() {
    use std::ffi::OsStr;
    use std::os::unix::ffi::OsStrExt;

    let (dir, root) = local_fixture();
    std::fs::write(dir.path().join("a").join(OsStr::from_bytes(b"bad\xffname")), b"x").unwrap();
    let gateway = LocalGateway::new();

    let items: Vec<_> = walk(&gateway, &root).collect().await;
    let failure = items
        .iter()
        .find_map(|item| item.as_ref().err())
        .expect("walk reports the undecodable entry");
    assert!(failure.is_read_failure());
    assert_eq!(failure.path(), Some(&root.child("a")));
    // Nothing is produced under a path that does not exist on disk.
    for lookup in items.iter().filter_map(|item| item.as_ref().ok()) {
        assert!(lookup.path().as_local().unwrap().to_path_buf().exists());
    }
}
