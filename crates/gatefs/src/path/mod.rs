// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

//! Typed path values and the pure algebra over them.
//!
//! A [`GatePath`] is one of three sealed variants:
//!
//! - [`RawPath`]: an opaque string path with minimal guarantees
//! - [`LocalPath`]: a direct, absolute filesystem path
//! - [`TreePath`]: a document-tree path, a granted tree root plus crumbs
//!
//! Every variant exposes its location as an ordered list of segments.
//! Binary relations only ever compare segments of paths that share a
//! [`BackendTag`]; nothing here performs I/O.

mod tree;

pub use tree::{TreePath, TreeRoot};

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Component, Path, PathBuf};

/// Identifies which storage model a path belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendTag {
    Raw,
    Local,
    Tree,
}

impl BackendTag {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            BackendTag::Raw => "raw",
            BackendTag::Local => "local",
            BackendTag::Tree => "tree",
        }
    }
}

impl std::fmt::Display for BackendTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An opaque string path. Segments are its non-empty `/`-separated parts.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct RawPath {
    path: String,
    segments: Vec<String>,
}

impl RawPath {
    pub fn new<S: Into<String>>(path: S) -> Self {
        let path = path.into();
        let segments = split_segments(&path);
        Self { path, segments }
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.path
    }

    /// Reinterpret this raw path as a direct filesystem path.
    pub fn to_local(&self) -> Result<LocalPath> {
        LocalPath::new(&self.path)
    }
}

impl From<String> for RawPath {
    fn from(path: String) -> Self {
        RawPath::new(path)
    }
}

impl From<RawPath> for String {
    fn from(raw: RawPath) -> Self {
        raw.path
    }
}

/// An absolute, normalized filesystem path.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "PathBuf", into = "PathBuf")]
pub struct LocalPath {
    segments: Vec<String>,
}

impl LocalPath {
    /// Build from an absolute path, folding `.` and `..` lexically.
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.has_root() {
            return Err(Error::precondition(format!(
                "local paths must be absolute: {}",
                path.display()
            )));
        }

        let mut segments: Vec<String> = Vec::new();
        for component in path.components() {
            match component {
                Component::Prefix(_) => {
                    return Err(Error::precondition(format!(
                        "path prefix not supported: {}",
                        path.display()
                    )));
                }
                Component::RootDir | Component::CurDir => {}
                Component::ParentDir => {
                    _ = segments.pop();
                }
                Component::Normal(name) => match name.to_str() {
                    Some(name) => segments.push(name.to_string()),
                    None => {
                        return Err(Error::precondition(format!(
                            "path is not valid UTF-8: {}",
                            path.display()
                        )));
                    }
                },
            }
        }
        Ok(Self { segments })
    }

    /// The filesystem root, `/`.
    #[must_use]
    pub fn root() -> Self {
        Self {
            segments: Vec::new(),
        }
    }

    #[must_use]
    pub fn to_path_buf(&self) -> PathBuf {
        let mut path = PathBuf::from("/");
        for segment in &self.segments {
            path.push(segment);
        }
        path
    }
}

impl TryFrom<PathBuf> for LocalPath {
    type Error = Error;

    fn try_from(path: PathBuf) -> Result<Self> {
        LocalPath::new(path)
    }
}

impl From<LocalPath> for PathBuf {
    fn from(local: LocalPath) -> Self {
        local.to_path_buf()
    }
}

/// A location in one of the supported backends.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GatePath {
    Raw(RawPath),
    Local(LocalPath),
    Tree(TreePath),
}

impl GatePath {
    pub fn raw<S: Into<String>>(path: S) -> Self {
        GatePath::Raw(RawPath::new(path))
    }

    pub fn local<P: AsRef<Path>>(path: P) -> Result<Self> {
        Ok(GatePath::Local(LocalPath::new(path)?))
    }

    /// A tree path addressing `crumbs` below `root`.
    pub fn tree<S: AsRef<str>>(root: TreeRoot, crumbs: &[S]) -> Self {
        GatePath::Tree(TreePath::new(root, crumbs))
    }

    #[must_use]
    pub fn backend_tag(&self) -> BackendTag {
        match self {
            GatePath::Raw(_) => BackendTag::Raw,
            GatePath::Local(_) => BackendTag::Local,
            GatePath::Tree(_) => BackendTag::Tree,
        }
    }

    #[must_use]
    pub fn segments(&self) -> &[String] {
        match self {
            GatePath::Raw(p) => &p.segments,
            GatePath::Local(p) => &p.segments,
            GatePath::Tree(p) => p.segments(),
        }
    }

    /// The last segment, if any.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.segments().last().map(String::as_str)
    }

    /// Human readable form for logs and messages.
    #[must_use]
    pub fn display_path(&self) -> String {
        match self {
            GatePath::Raw(p) => p.path.clone(),
            GatePath::Local(p) => p.to_path_buf().display().to_string(),
            GatePath::Tree(p) => p.display_path(),
        }
    }

    #[must_use]
    pub fn as_local(&self) -> Option<&LocalPath> {
        match self {
            GatePath::Local(p) => Some(p),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_tree(&self) -> Option<&TreePath> {
        match self {
            GatePath::Tree(p) => Some(p),
            _ => None,
        }
    }

    /// Descend by `name`; a `/` inside `name` descends several levels.
    #[must_use]
    pub fn child(&self, name: &str) -> GatePath {
        let extra = split_segments(name);
        self.child_segments(&extra)
    }

    /// Descend by each of `names`, in order.
    #[must_use]
    pub fn child_segments<S: AsRef<str>>(&self, names: &[S]) -> GatePath {
        match self {
            GatePath::Raw(p) => {
                let mut path = p.path.trim_end_matches('/').to_string();
                for name in names {
                    path.push('/');
                    path.push_str(name.as_ref());
                }
                GatePath::raw(path)
            }
            GatePath::Local(p) => {
                let mut segments = p.segments.clone();
                segments.extend(names.iter().map(|n| n.as_ref().to_string()));
                GatePath::Local(LocalPath { segments })
            }
            GatePath::Tree(p) => GatePath::Tree(p.child(names)),
        }
    }

    /// The containing location, or `None` at a backend root.
    #[must_use]
    pub fn parent(&self) -> Option<GatePath> {
        match self {
            GatePath::Raw(p) => {
                let (_, leaf) = p.segments.split_last()?;
                let trimmed = p.path.trim_end_matches('/');
                let cut = trimmed.len() - leaf.len();
                let parent = trimmed[..cut].trim_end_matches('/');
                if parent.is_empty() && trimmed.starts_with('/') {
                    Some(GatePath::raw("/"))
                } else {
                    Some(GatePath::raw(parent))
                }
            }
            GatePath::Local(p) => {
                let (_, rest) = p.segments.split_last()?;
                Some(GatePath::Local(LocalPath {
                    segments: rest.to_vec(),
                }))
            }
            GatePath::Tree(p) => p.parent().map(GatePath::Tree),
        }
    }

    // Path algebra

    fn same_backend(&self, other: &GatePath) -> bool {
        self.backend_tag() == other.backend_tag()
    }

    fn require_same_backend(&self, other: &GatePath) -> Result<()> {
        if self.same_backend(other) {
            Ok(())
        } else {
            Err(Error::tag_mismatch(self.backend_tag(), other.backend_tag()))
        }
    }

    /// True iff `self` is a strict prefix of `other`. Never reflexive.
    #[must_use]
    pub fn is_ancestor_of(&self, other: &GatePath) -> bool {
        self.same_backend(other)
            && self.segments().len() < other.segments().len()
            && other.segments().starts_with(self.segments())
    }

    /// True iff `other` is exactly one segment below `self`.
    #[must_use]
    pub fn is_parent_of(&self, other: &GatePath) -> bool {
        self.is_ancestor_of(other) && other.segments().len() == self.segments().len() + 1
    }

    #[must_use]
    pub fn is_descendant_of(&self, other: &GatePath) -> bool {
        other.is_ancestor_of(self)
    }

    #[must_use]
    pub fn is_child_of(&self, other: &GatePath) -> bool {
        other.is_parent_of(self)
    }

    /// True iff `prefix` is a prefix of `self`, including `self` itself.
    #[must_use]
    pub fn starts_with(&self, prefix: &GatePath) -> bool {
        self.same_backend(prefix) && self.segments().starts_with(prefix.segments())
    }

    /// Backend-aware structural equality.
    #[must_use]
    pub fn matches(&self, other: &GatePath) -> bool {
        self.same_backend(other) && self.segments() == other.segments()
    }

    /// True iff `target` occurs as a contiguous run inside the segments.
    #[must_use]
    pub fn contains_segments<S: AsRef<str>>(&self, target: &[S]) -> bool {
        if target.is_empty() {
            return true;
        }
        self.segments().windows(target.len()).any(|window| {
            window
                .iter()
                .zip(target)
                .all(|(have, want)| have.as_str() == want.as_ref())
        })
    }

    /// The segments by which `descendant` extends `self`.
    pub fn crumbs_to(&self, descendant: &GatePath) -> Result<Vec<String>> {
        self.require_same_backend(descendant)?;
        if !self.is_ancestor_of(descendant) {
            return Err(Error::precondition(format!(
                "{} is not an ancestor of {}",
                self, descendant
            )));
        }
        Ok(descendant.segments()[self.segments().len()..].to_vec())
    }

    /// Drop `prefix`'s segment count minus `overlap` leading segments.
    ///
    /// With `overlap == 0` this is the crumbs from `prefix` to `self`,
    /// `self` included when both are equal.
    pub fn remove_prefix(&self, prefix: &GatePath, overlap: usize) -> Result<Vec<String>> {
        self.require_same_backend(prefix)?;
        if !self.starts_with(prefix) {
            return Err(Error::precondition(format!(
                "{} does not start with {}",
                self, prefix
            )));
        }
        let prefix_len = prefix.segments().len();
        if overlap > prefix_len {
            return Err(Error::precondition(format!(
                "overlap {} exceeds prefix length {}",
                overlap, prefix_len
            )));
        }
        Ok(self.segments()[prefix_len - overlap..].to_vec())
    }
}

impl std::fmt::Display for GatePath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_path())
    }
}

impl From<LocalPath> for GatePath {
    fn from(path: LocalPath) -> Self {
        GatePath::Local(path)
    }
}

impl From<TreePath> for GatePath {
    fn from(path: TreePath) -> Self {
        GatePath::Tree(path)
    }
}

impl From<RawPath> for GatePath {
    fn from(path: RawPath) -> Self {
        GatePath::Raw(path)
    }
}

pub(crate) fn split_segments(path: &str) -> Vec<String> {
    path.split('/')
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
