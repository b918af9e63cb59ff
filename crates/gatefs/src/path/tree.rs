// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

use super::split_segments;
use crate::error::{Error, Result};
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, percent_decode_str, utf8_percent_encode};
use serde::{Deserialize, Serialize};
use url::Url;

/// Characters left readable inside encoded document identifiers.
pub(crate) const DOCUMENT_ID: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

pub(crate) fn encode_id(id: &str) -> String {
    utf8_percent_encode(id, DOCUMENT_ID).to_string()
}

/// Split a tree document identifier (`volume:relative/path`) into segments.
fn id_segments(tree_id: &str) -> Vec<String> {
    match tree_id.split_once(':') {
        Some((volume, rest)) => {
            let mut segments = vec![volume.to_string()];
            segments.extend(split_segments(rest));
            segments
        }
        None => split_segments(tree_id),
    }
}

/// The externally granted root of a document tree.
///
/// Addressed as `content://<authority>/tree/<encoded tree id>`. The tree id
/// follows the external storage convention `volume:relative/path`, which
/// is what gives a root its segments: `primary:Foo/Bar` is
/// `["primary", "Foo", "Bar"]`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TreeRoot {
    uri: Url,
    tree_id: String,
    segments: Vec<String>,
}

impl TreeRoot {
    pub fn new(authority: &str, tree_id: &str) -> Result<Self> {
        let raw = format!("content://{}/tree/{}", authority, encode_id(tree_id));
        let uri = Url::parse(&raw)
            .map_err(|e| Error::precondition(format!("invalid tree uri {}: {}", raw, e)))?;
        Ok(Self {
            uri,
            tree_id: tree_id.to_string(),
            segments: id_segments(tree_id),
        })
    }

    /// Parse a tree uri as handed out by the platform.
    pub fn parse(uri: &str) -> Result<Self> {
        let parsed = Url::parse(uri)
            .map_err(|e| Error::precondition(format!("invalid tree uri {}: {}", uri, e)))?;
        let authority = parsed
            .host_str()
            .ok_or_else(|| Error::precondition(format!("tree uri without authority: {}", uri)))?
            .to_string();
        let parts: Vec<&str> = parsed
            .path_segments()
            .map(|s| s.collect())
            .unwrap_or_default();
        let encoded_id = match parts.as_slice() {
            ["tree", id] => *id,
            _ => {
                return Err(Error::precondition(format!(
                    "not a tree uri (expected /tree/<id>): {}",
                    uri
                )));
            }
        };
        let tree_id = percent_decode_str(encoded_id)
            .decode_utf8()
            .map_err(|e| Error::precondition(format!("undecodable tree id in {}: {}", uri, e)))?;
        Self::new(&authority, &tree_id)
    }

    /// The root whose tree id spells out `segments`.
    pub fn from_segments<S: AsRef<str>>(authority: &str, segments: &[S]) -> Result<Self> {
        let (volume, rest) = segments
            .split_first()
            .ok_or_else(|| Error::precondition("tree root needs at least a volume segment"))?;
        let rest: Vec<&str> = rest.iter().map(AsRef::as_ref).collect();
        Self::new(authority, &format!("{}:{}", volume.as_ref(), rest.join("/")))
    }

    #[must_use]
    pub fn uri(&self) -> &Url {
        &self.uri
    }

    #[must_use]
    pub fn authority(&self) -> &str {
        self.uri.host_str().unwrap_or_default()
    }

    #[must_use]
    pub fn tree_id(&self) -> &str {
        &self.tree_id
    }

    #[must_use]
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// The root one level up, `None` for a bare volume.
    fn parent_root(&self) -> Option<TreeRoot> {
        if self.segments.len() < 2 {
            return None;
        }
        Self::from_segments(self.authority(), &self.segments[..self.segments.len() - 1]).ok()
    }
}

impl TryFrom<String> for TreeRoot {
    type Error = Error;

    fn try_from(uri: String) -> Result<Self> {
        TreeRoot::parse(&uri)
    }
}

impl From<TreeRoot> for String {
    fn from(root: TreeRoot) -> Self {
        root.uri.to_string()
    }
}

impl std::fmt::Display for TreeRoot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.uri)
    }
}

#[derive(Serialize, Deserialize)]
struct TreePathRepr {
    root: TreeRoot,
    crumbs: Vec<String>,
}

/// A document-tree location: the root it was built from plus crumbs.
///
/// Its segments are the root's segments followed by the crumbs. The root
/// is only a starting point; which persisted grant actually serves the
/// path is decided at resolution time.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "TreePathRepr", into = "TreePathRepr")]
pub struct TreePath {
    root: TreeRoot,
    crumbs: Vec<String>,
    segments: Vec<String>,
}

impl TreePath {
    pub fn new<S: AsRef<str>>(root: TreeRoot, crumbs: &[S]) -> Self {
        let crumbs: Vec<String> = crumbs
            .iter()
            .flat_map(|c| split_segments(c.as_ref()))
            .collect();
        let mut segments = root.segments.clone();
        segments.extend(crumbs.iter().cloned());
        Self {
            root,
            crumbs,
            segments,
        }
    }

    #[must_use]
    pub fn root(&self) -> &TreeRoot {
        &self.root
    }

    #[must_use]
    pub fn crumbs(&self) -> &[String] {
        &self.crumbs
    }

    #[must_use]
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub(crate) fn child<S: AsRef<str>>(&self, names: &[S]) -> TreePath {
        let mut crumbs = self.crumbs.clone();
        crumbs.extend(names.iter().map(|n| n.as_ref().to_string()));
        TreePath::new(self.root.clone(), &crumbs)
    }

    pub(crate) fn parent(&self) -> Option<TreePath> {
        match self.crumbs.split_last() {
            Some((_, rest)) => Some(TreePath::new(self.root.clone(), rest)),
            None => self
                .root
                .parent_root()
                .map(|root| TreePath::new::<String>(root, &[])),
        }
    }

    pub(crate) fn display_path(&self) -> String {
        if self.crumbs.is_empty() {
            self.root.to_string()
        } else {
            format!("{}/{}", self.root, self.crumbs.join("/"))
        }
    }
}

impl From<TreePathRepr> for TreePath {
    fn from(repr: TreePathRepr) -> Self {
        TreePath::new(repr.root, &repr.crumbs)
    }
}

impl From<TreePath> for TreePathRepr {
    fn from(path: TreePath) -> Self {
        TreePathRepr {
            root: path.root,
            crumbs: path.crumbs,
        }
    }
}
