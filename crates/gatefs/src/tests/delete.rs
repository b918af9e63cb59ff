// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

use super::{local_fixture, tree_fixture};
use crate::delete::{delete_all, delete_all_filtered};
use crate::error::{Error, Result};
use crate::gateway::Gateway;
use crate::local::LocalGateway;
use crate::lookup::{Lookup, Ownership, Permissions};
use crate::path::{BackendTag, GatePath};
use crate::stream::{ReadStream, WriteStream};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::io;

fn not_keep(lookup: &Lookup) -> bool {
    lookup.name() != Some("keep.txt")
}

#[tokio::test]
async fn test_delete_all_local() {
    let (dir, root) = local_fixture();
    delete_all(&LocalGateway::new(), &root.child("a")).await.unwrap();
    assert!(!dir.path().join("a").exists());
    assert!(dir.path().join("c.txt").exists());
}

#[tokio::test]
async fn test_delete_all_missing_path_succeeds() {
    let (_dir, root) = local_fixture();
    delete_all(&LocalGateway::new(), &root.child("never/was"))
        .await
        .unwrap();

    let (_provider, gateway, root) = tree_fixture();
    delete_all(&gateway, &root.child("never/was")).await.unwrap();
}

#[tokio::test]
async fn test_filter_keeps_file_and_its_directory_local() {
    let (dir, root) = local_fixture();
    delete_all_filtered(&LocalGateway::new(), &root.child("a"), not_keep)
        .await
        .unwrap();

    assert!(dir.path().join("a/keep.txt").exists());
    assert!(!dir.path().join("a/drop.txt").exists());
    assert!(!dir.path().join("a/b").exists());
    // Still holds keep.txt.
    assert!(dir.path().join("a").is_dir());
}

#[tokio::test]
async fn test_filter_keeps_file_and_its_directory_tree() {
    let (provider, gateway, root) = tree_fixture();
    delete_all_filtered(&gateway, &root.child("a"), not_keep)
        .await
        .unwrap();

    assert!(provider.contains("primary:work/a/keep.txt"));
    assert!(!provider.contains("primary:work/a/drop.txt"));
    assert!(!provider.contains("primary:work/a/b"));
    assert!(provider.contains("primary:work/a"));
    assert!(provider.contains("primary:work/c.txt"));
}

#[tokio::test]
async fn test_rejected_directory_still_has_children_processed() {
    let (dir, root) = local_fixture();
    let a = root.child("a");
    delete_all_filtered(&LocalGateway::new(), &a, |l: &Lookup| l.path() != &a)
        .await
        .unwrap();

    assert!(dir.path().join("a").is_dir());
    assert_eq!(std::fs::read_dir(dir.path().join("a")).unwrap().count(), 0);
}

#[tokio::test]
async fn test_delete_all_tree_root_contents() {
    let (provider, gateway, root) = tree_fixture();
    delete_all(&gateway, &root.child("a")).await.unwrap();
    delete_all(&gateway, &root.child("c.txt")).await.unwrap();
    assert!(!provider.contains("primary:work/a"));
    assert!(!provider.contains("primary:work/c.txt"));
    assert!(gateway.list_files(&root).await.unwrap().is_empty());
    assert!(!gateway.provider().is_open());
}

/// Local gateway that misbehaves on chosen paths.
struct Faulty {
    inner: LocalGateway,
    /// Listing this directory removes it from disk first, as a concurrent
    /// cleaner would.
    vanish_on_list: Option<GatePath>,
    /// Looking this path up fails although it exists.
    deny_lookup: Option<GatePath>,
}

#[async_trait]
impl Gateway for Faulty {
    fn backend_tag(&self) -> BackendTag {
        BackendTag::Local
    }

    async fn exists(&self, path: &GatePath) -> Result<bool> {
        self.inner.exists(path).await
    }

    async fn lookup(&self, path: &GatePath) -> Result<Lookup> {
        if self.deny_lookup.as_ref() == Some(path) {
            return Err(Error::read(
                path,
                io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
            ));
        }
        self.inner.lookup(path).await
    }

    async fn list_files(&self, path: &GatePath) -> Result<Vec<GatePath>> {
        if self.vanish_on_list.as_ref() == Some(path) {
            let host = path.as_local().unwrap().to_path_buf();
            std::fs::remove_dir_all(host).unwrap();
        }
        self.inner.list_files(path).await
    }

    async fn lookup_files(&self, path: &GatePath) -> Result<Vec<Lookup>> {
        self.inner.lookup_files(path).await
    }

    async fn create_file(&self, path: &GatePath) -> Result<bool> {
        self.inner.create_file(path).await
    }

    async fn create_dir(&self, path: &GatePath) -> Result<bool> {
        self.inner.create_dir(path).await
    }

    async fn delete(&self, path: &GatePath) -> Result<bool> {
        self.inner.delete(path).await
    }

    async fn read(&self, path: &GatePath) -> Result<ReadStream> {
        self.inner.read(path).await
    }

    async fn write(&self, path: &GatePath) -> Result<WriteStream> {
        self.inner.write(path).await
    }

    async fn set_modified_at(&self, path: &GatePath, modified_at: DateTime<Utc>) -> Result<bool> {
        self.inner.set_modified_at(path, modified_at).await
    }

    async fn set_permissions(&self, path: &GatePath, permissions: Permissions) -> Result<bool> {
        self.inner.set_permissions(path, permissions).await
    }

    async fn set_ownership(&self, path: &GatePath, ownership: Ownership) -> Result<bool> {
        self.inner.set_ownership(path, ownership).await
    }

    async fn can_read(&self, path: &GatePath) -> Result<bool> {
        self.inner.can_read(path).await
    }

    async fn can_write(&self, path: &GatePath) -> Result<bool> {
        self.inner.can_write(path).await
    }

    async fn create_symlink(&self, link: &GatePath, target: &GatePath) -> Result<bool> {
        self.inner.create_symlink(link, target).await
    }
}

#[tokio::test]
async fn test_subtree_that_vanished_counts_as_deleted() {
    let (dir, root) = local_fixture();
    let gateway = Faulty {
        inner: LocalGateway::new(),
        vanish_on_list: Some(root.child("a/b")),
        deny_lookup: None,
    };

    delete_all(&gateway, &root.child("a")).await.unwrap();
    assert!(!dir.path().join("a").exists());
}

#[tokio::test]
async fn test_read_failure_on_present_node_aborts() {
    let (dir, root) = local_fixture();
    let gateway = Faulty {
        inner: LocalGateway::new(),
        vanish_on_list: None,
        deny_lookup: Some(root.child("a/b")),
    };

    let err = delete_all(&gateway, &root.child("a")).await.unwrap_err();
    assert!(err.is_read_failure());
    assert_eq!(err.path(), Some(&root.child("a/b")));
    assert!(dir.path().join("a/b/deep.txt").exists());
    assert!(dir.path().join("a").is_dir());
}

#[cfg(unix)]
#[tokio::test]
async fn test_delete_all_stops_at_undecodable_name() {
    use std::ffi::OsStr;
    use std::os::unix::ffi::OsStrExt;

    let (dir, root) = local_fixture();
    let stuck = dir.path().join("a").join(OsStr::from_bytes(b"bad\xffname"));
    std::fs::write(&stuck, b"x").unwrap();

    let err = delete_all(&LocalGateway::new(), &root.child("a"))
        .await
        .unwrap_err();
    assert!(err.is_read_failure());
    assert_eq!(err.path(), Some(&root.child("a")));
    assert!(stuck.exists());
    assert!(dir.path().join("a").exists());
}
