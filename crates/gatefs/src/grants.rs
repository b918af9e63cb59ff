// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

//! Persisted tree grants and the resolver that picks one for a path.

use crate::error::{Error, Result};
use crate::path::{GatePath, TreePath, TreeRoot};
use diagnostics::debug;
use std::sync::{Arc, RwLock};

/// A durable authorization for a tree root and everything beneath it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grant {
    pub root: TreeRoot,
    pub read: bool,
    pub write: bool,
}

impl Grant {
    #[must_use]
    pub fn read_write(root: TreeRoot) -> Self {
        Self {
            root,
            read: true,
            write: true,
        }
    }

    #[must_use]
    pub fn read_only(root: TreeRoot) -> Self {
        Self {
            root,
            read: true,
            write: false,
        }
    }

    fn root_path(&self) -> GatePath {
        GatePath::tree::<&str>(self.root.clone(), &[])
    }
}

/// Read access to the platform's persisted grants.
///
/// The set is owned elsewhere; this layer never adds or revokes grants.
pub trait GrantStore: Send + Sync {
    fn persisted_grants(&self) -> Vec<Grant>;
}

impl GrantStore for Vec<Grant> {
    fn persisted_grants(&self) -> Vec<Grant> {
        self.clone()
    }
}

/// A grant set that another component keeps up to date.
#[derive(Clone, Default)]
pub struct SharedGrants(Arc<RwLock<Vec<Grant>>>);

impl SharedGrants {
    #[must_use]
    pub fn new(grants: Vec<Grant>) -> Self {
        Self(Arc::new(RwLock::new(grants)))
    }

    /// Replace the whole set, e.g. after the platform reported a change.
    pub fn replace(&self, grants: Vec<Grant>) {
        match self.0.write() {
            Ok(mut guard) => *guard = grants,
            Err(poisoned) => *poisoned.into_inner() = grants,
        }
    }
}

impl GrantStore for SharedGrants {
    fn persisted_grants(&self) -> Vec<Grant> {
        match self.0.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

/// The grant chosen for a path and the way down from its root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GrantMatch {
    pub grant: Grant,
    pub missing_segments: Vec<String>,
}

/// Pick the most specific grant covering `target`.
///
/// Candidates are grants whose root segments prefix the target's; the one
/// with the most segments wins. Fails with [`Error::MissingGrant`] when
/// nothing covers the target.
pub fn resolve(target: &TreePath, grants: &[Grant]) -> Result<GrantMatch> {
    let target_path = GatePath::Tree(target.clone());

    let best = grants
        .iter()
        .filter(|grant| grant.root.authority() == target.root().authority())
        .map(|grant| (grant, grant.root_path()))
        .filter(|(_, root)| target_path.starts_with(root))
        .max_by_key(|(_, root)| root.segments().len());

    let Some((grant, root)) = best else {
        let path_str = target_path.display_path();
        debug!("No grant covers {path}", path: path_str);
        return Err(Error::missing_grant(&target_path));
    };

    let missing_segments = target_path.remove_prefix(&root, 0)?;
    let grant_str = grant.root.to_string();
    let missing = missing_segments.len();
    debug!(
        "Resolved grant {grant} with {missing} missing segments",
        grant: grant_str,
        missing: missing
    );
    Ok(GrantMatch {
        grant: grant.clone(),
        missing_segments,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const AUTHORITY: &str = "com.android.externalstorage.documents";

    fn root(tree_id: &str) -> TreeRoot {
        TreeRoot::new(AUTHORITY, tree_id).unwrap()
    }

    #[test]
    fn test_missing_segments_below_grant() {
        let grants = vec![Grant::read_write(root("primary:Foo"))];
        let target = TreePath::new(root("primary:"), &["Foo", "Bar", "baz.txt"]);

        let matched = resolve(&target, &grants).unwrap();
        assert_eq!(matched.grant.root, root("primary:Foo"));
        assert_eq!(matched.missing_segments, ["Bar", "baz.txt"]);
    }

    #[test]
    fn test_most_specific_grant_wins() {
        let grants = vec![
            Grant::read_only(root("primary:")),
            Grant::read_write(root("primary:Foo/Bar")),
            Grant::read_write(root("primary:Foo")),
        ];
        let target = TreePath::new(root("primary:Foo"), &["Bar", "baz.txt"]);

        let matched = resolve(&target, &grants).unwrap();
        assert_eq!(matched.grant.root, root("primary:Foo/Bar"));
        assert_eq!(matched.missing_segments, ["baz.txt"]);
    }

    #[test]
    fn test_grant_on_target_itself() {
        let grants = vec![Grant::read_write(root("primary:Foo"))];
        let target = TreePath::new::<&str>(root("primary:Foo"), &[]);
        let matched = resolve(&target, &grants).unwrap();
        assert!(matched.missing_segments.is_empty());
    }

    #[test]
    fn test_no_covering_grant() {
        let grants = vec![
            Grant::read_write(root("primary:Foo")),
            Grant::read_write(root("ABCD-1234:Foo")),
        ];
        let target = TreePath::new(root("primary:"), &["Food", "x"]);
        assert!(matches!(
            resolve(&target, &grants),
            Err(Error::MissingGrant { .. })
        ));
        assert!(matches!(resolve(&target, &[]), Err(Error::MissingGrant { .. })));
    }

    #[test]
    fn test_shared_grants_follow_updates() {
        let shared = SharedGrants::default();
        assert!(shared.persisted_grants().is_empty());
        shared.replace(vec![Grant::read_only(root("primary:Music"))]);
        assert_eq!(shared.persisted_grants().len(), 1);
    }
}
