// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

//! Traversal and routing tests that run against both backends.

mod delete;
mod walk;

use crate::config::TreeConfig;
use crate::grants::Grant;
use crate::path::{GatePath, TreeRoot};
use crate::tree::{MemoryDocumentProvider, TreeGateway};
use std::sync::Arc;
use tempfile::TempDir;

const AUTHORITY: &str = "com.android.externalstorage.documents";

/// Files created by both fixtures, relative to the fixture root.
const FIXTURE_FILES: &[&str] = &["a/keep.txt", "a/drop.txt", "a/b/deep.txt", "c.txt"];

/// A temp directory laid out as [`FIXTURE_FILES`].
fn local_fixture() -> (TempDir, GatePath) {
    let dir = TempDir::new().expect("create temp dir");
    for file in FIXTURE_FILES {
        let host = dir.path().join(file);
        std::fs::create_dir_all(host.parent().unwrap()).unwrap();
        std::fs::write(&host, file.as_bytes()).unwrap();
    }
    let root = GatePath::local(dir.path()).unwrap();
    (dir, root)
}

/// A granted `primary:work` tree laid out as [`FIXTURE_FILES`].
fn tree_fixture() -> (MemoryDocumentProvider, TreeGateway, GatePath) {
    let provider = MemoryDocumentProvider::new(AUTHORITY);
    _ = provider.add_volume("primary");
    for file in FIXTURE_FILES {
        provider
            .insert_path(&format!("primary:work/{file}"), Some(file.as_bytes()))
            .unwrap();
    }
    let root = TreeRoot::new(AUTHORITY, "primary:work").unwrap();
    let gateway = TreeGateway::with_provider(
        Arc::new(provider.clone()),
        Arc::new(vec![Grant::read_write(root.clone())]),
        TreeConfig::default(),
    );
    (provider, gateway, GatePath::tree::<&str>(root, &[]))
}

/// Relative, '/'-joined names of `paths` below `root`, sorted.
fn relative_names<'a, I>(root: &GatePath, paths: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a GatePath>,
{
    let mut names: Vec<String> = paths
        .into_iter()
        .map(|p| root.crumbs_to(p).unwrap().join("/"))
        .collect();
    names.sort();
    names
}
