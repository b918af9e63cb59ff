// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

use crate::path::GatePath;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// What kind of node a lookup found.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileType {
    File,
    Directory,
    Symlink,
}

impl FileType {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            FileType::File => "file",
            FileType::Directory => "directory",
            FileType::Symlink => "symlink",
        }
    }
}

impl std::fmt::Display for FileType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Numeric owner of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Ownership {
    pub uid: u32,
    pub gid: u32,
}

/// Mode bits of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Permissions {
    pub mode: u32,
}

impl Permissions {
    #[must_use]
    pub fn new(mode: u32) -> Self {
        Self { mode }
    }
}

/// Point-in-time snapshot of a node, as resolved by a gateway.
///
/// Never revalidated; callers should expect it to go stale.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Lookup {
    path: GatePath,
    file_type: FileType,
    size: u64,
    modified_at: DateTime<Utc>,
    ownership: Option<Ownership>,
    permissions: Option<Permissions>,
    symlink_target: Option<GatePath>,
}

impl Lookup {
    pub(crate) fn new(
        path: GatePath,
        file_type: FileType,
        size: u64,
        modified_at: DateTime<Utc>,
    ) -> Self {
        Self {
            path,
            file_type,
            size,
            modified_at,
            ownership: None,
            permissions: None,
            symlink_target: None,
        }
    }

    pub(crate) fn with_ownership(mut self, ownership: Option<Ownership>) -> Self {
        self.ownership = ownership;
        self
    }

    pub(crate) fn with_permissions(mut self, permissions: Option<Permissions>) -> Self {
        self.permissions = permissions;
        self
    }

    pub(crate) fn with_symlink_target(mut self, target: Option<GatePath>) -> Self {
        self.symlink_target = target;
        self
    }

    #[must_use]
    pub fn path(&self) -> &GatePath {
        &self.path
    }

    #[must_use]
    pub fn into_path(self) -> GatePath {
        self.path
    }

    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.path.name()
    }

    #[must_use]
    pub fn file_type(&self) -> FileType {
        self.file_type
    }

    #[must_use]
    pub fn is_file(&self) -> bool {
        self.file_type == FileType::File
    }

    #[must_use]
    pub fn is_directory(&self) -> bool {
        self.file_type == FileType::Directory
    }

    #[must_use]
    pub fn is_symlink(&self) -> bool {
        self.file_type == FileType::Symlink
    }

    #[must_use]
    pub fn size(&self) -> u64 {
        self.size
    }

    #[must_use]
    pub fn modified_at(&self) -> DateTime<Utc> {
        self.modified_at
    }

    #[must_use]
    pub fn ownership(&self) -> Option<Ownership> {
        self.ownership
    }

    #[must_use]
    pub fn permissions(&self) -> Option<Permissions> {
        self.permissions
    }

    #[must_use]
    pub fn symlink_target(&self) -> Option<&GatePath> {
        self.symlink_target.as_ref()
    }
}

impl std::fmt::Display for Lookup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} {} {}B {}",
            self.file_type,
            self.path,
            self.size,
            self.modified_at.to_rfc3339()
        )
    }
}
