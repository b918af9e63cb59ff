// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

//! The storage gateway contract shared by every backend.

use crate::error::{Error, Result};
use crate::lookup::{Lookup, Ownership, Permissions};
use crate::path::{BackendTag, GatePath};
use crate::shared::KeepAlive;
use crate::stream::{ReadStream, WriteStream};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;

/// Uniform filesystem semantics over one backend.
///
/// Every operation may block on I/O and runs on the tokio runtime. There is
/// no locking across calls: two callers mutating the same location race at
/// the caller level. Each call hands back a result or a typed failure and
/// never retries on its own.
#[async_trait]
pub trait Gateway: Send + Sync {
    /// The only tag this gateway accepts; other paths fail with
    /// [`Error::Precondition`].
    fn backend_tag(&self) -> BackendTag;

    /// `Ok(false)` for a missing node; errors only when resolution fails.
    async fn exists(&self, path: &GatePath) -> Result<bool>;

    async fn lookup(&self, path: &GatePath) -> Result<Lookup>;

    /// Direct children of a readable directory.
    async fn list_files(&self, path: &GatePath) -> Result<Vec<GatePath>>;

    /// Like [`Gateway::list_files`], with a lookup per child.
    async fn lookup_files(&self, path: &GatePath) -> Result<Vec<Lookup>>;

    /// `Ok(false)` if a file is already there; a directory there is a
    /// write failure.
    async fn create_file(&self, path: &GatePath) -> Result<bool>;

    /// `Ok(false)` if a directory is already there; a file there is a
    /// write failure.
    async fn create_dir(&self, path: &GatePath) -> Result<bool>;

    /// Remove exactly this node. Never recurses; `Ok(false)` when absent.
    async fn delete(&self, path: &GatePath) -> Result<bool>;

    async fn read(&self, path: &GatePath) -> Result<ReadStream>;

    /// Open for writing, creating or truncating the file.
    async fn write(&self, path: &GatePath) -> Result<WriteStream>;

    async fn set_modified_at(&self, path: &GatePath, modified_at: DateTime<Utc>) -> Result<bool>;

    async fn set_permissions(&self, path: &GatePath, permissions: Permissions) -> Result<bool>;

    async fn set_ownership(&self, path: &GatePath, ownership: Ownership) -> Result<bool>;

    /// Missing access degrades to `Ok(false)`.
    async fn can_read(&self, path: &GatePath) -> Result<bool>;

    /// Missing access degrades to `Ok(false)`.
    async fn can_write(&self, path: &GatePath) -> Result<bool>;

    async fn create_symlink(&self, link: &GatePath, target: &GatePath) -> Result<bool>;

    /// Hold the backend connection open for a multi-call operation rooted
    /// at `path`. An unreachable backend is a read failure on `path`.
    async fn keep_alive(&self, _path: &GatePath) -> Result<KeepAlive> {
        Ok(KeepAlive::none())
    }
}

pub(crate) fn require_backend(expected: BackendTag, path: &GatePath) -> Result<()> {
    if path.backend_tag() == expected {
        Ok(())
    } else {
        Err(Error::wrong_backend(expected, path))
    }
}

/// Routes each call to the gateway registered for the path's backend tag.
#[derive(Clone, Default)]
pub struct GatewaySwitch {
    local: Option<Arc<dyn Gateway>>,
    tree: Option<Arc<dyn Gateway>>,
}

impl GatewaySwitch {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_local(mut self, gateway: Arc<dyn Gateway>) -> Self {
        self.local = Some(gateway);
        self
    }

    #[must_use]
    pub fn with_tree(mut self, gateway: Arc<dyn Gateway>) -> Self {
        self.tree = Some(gateway);
        self
    }

    /// The gateway serving `path`.
    pub fn gateway_for(&self, path: &GatePath) -> Result<&dyn Gateway> {
        let gateway = match path.backend_tag() {
            BackendTag::Local => self.local.as_deref(),
            BackendTag::Tree => self.tree.as_deref(),
            BackendTag::Raw => None,
        };
        gateway.ok_or_else(|| {
            Error::precondition(format!(
                "no gateway registered for {} path {}",
                path.backend_tag(),
                path
            ))
        })
    }

    pub async fn exists(&self, path: &GatePath) -> Result<bool> {
        self.gateway_for(path)?.exists(path).await
    }

    pub async fn lookup(&self, path: &GatePath) -> Result<Lookup> {
        self.gateway_for(path)?.lookup(path).await
    }

    pub async fn list_files(&self, path: &GatePath) -> Result<Vec<GatePath>> {
        self.gateway_for(path)?.list_files(path).await
    }

    pub async fn lookup_files(&self, path: &GatePath) -> Result<Vec<Lookup>> {
        self.gateway_for(path)?.lookup_files(path).await
    }

    pub async fn create_file(&self, path: &GatePath) -> Result<bool> {
        self.gateway_for(path)?.create_file(path).await
    }

    pub async fn create_dir(&self, path: &GatePath) -> Result<bool> {
        self.gateway_for(path)?.create_dir(path).await
    }

    pub async fn delete(&self, path: &GatePath) -> Result<bool> {
        self.gateway_for(path)?.delete(path).await
    }

    pub async fn read(&self, path: &GatePath) -> Result<ReadStream> {
        self.gateway_for(path)?.read(path).await
    }

    pub async fn write(&self, path: &GatePath) -> Result<WriteStream> {
        self.gateway_for(path)?.write(path).await
    }

    pub async fn can_read(&self, path: &GatePath) -> Result<bool> {
        self.gateway_for(path)?.can_read(path).await
    }

    pub async fn can_write(&self, path: &GatePath) -> Result<bool> {
        self.gateway_for(path)?.can_write(path).await
    }

    pub async fn set_modified_at(
        &self,
        path: &GatePath,
        modified_at: DateTime<Utc>,
    ) -> Result<bool> {
        self.gateway_for(path)?
            .set_modified_at(path, modified_at)
            .await
    }

    pub async fn set_permissions(&self, path: &GatePath, permissions: Permissions) -> Result<bool> {
        self.gateway_for(path)?
            .set_permissions(path, permissions)
            .await
    }

    pub async fn set_ownership(&self, path: &GatePath, ownership: Ownership) -> Result<bool> {
        self.gateway_for(path)?.set_ownership(path, ownership).await
    }

    /// Both paths must be served by the same backend.
    pub async fn create_symlink(&self, link: &GatePath, target: &GatePath) -> Result<bool> {
        if link.backend_tag() != target.backend_tag() {
            return Err(Error::tag_mismatch(link.backend_tag(), target.backend_tag()));
        }
        self.gateway_for(link)?.create_symlink(link, target).await
    }

    pub async fn keep_alive(&self, path: &GatePath) -> Result<KeepAlive> {
        self.gateway_for(path)?.keep_alive(path).await
    }
}
