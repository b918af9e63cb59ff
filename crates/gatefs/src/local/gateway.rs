// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

use crate::error::{Error, Result};
use crate::gateway::{Gateway, require_backend};
use crate::lookup::{FileType, Lookup, Ownership, Permissions};
use crate::path::{BackendTag, GatePath, LocalPath};
use crate::shared::KeepAlive;
use crate::stream::{ReadStream, WriteStream};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diagnostics::debug;
use std::io;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

/// Gateway over directly addressable host paths.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalGateway;

impl LocalGateway {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    fn host_path(path: &GatePath) -> Result<PathBuf> {
        require_backend(BackendTag::Local, path)?;
        match path.as_local() {
            Some(local) => Ok(local.to_path_buf()),
            None => Err(Error::wrong_backend(BackendTag::Local, path)),
        }
    }

    /// `None` when nothing exists at `host`.
    async fn stat(path: &GatePath, host: &Path) -> Result<Option<std::fs::Metadata>> {
        match tokio::fs::symlink_metadata(host).await {
            Ok(metadata) => Ok(Some(metadata)),
            Err(e) if is_absent(&e) => Ok(None),
            Err(e) => Err(Error::read(path, e)),
        }
    }

    async fn build_lookup(
        path: &GatePath,
        host: &Path,
        metadata: &std::fs::Metadata,
    ) -> Result<Lookup> {
        let file_type = if metadata.file_type().is_symlink() {
            FileType::Symlink
        } else if metadata.is_dir() {
            FileType::Directory
        } else {
            FileType::File
        };

        let modified_at: DateTime<Utc> = metadata.modified().unwrap_or(UNIX_EPOCH).into();

        let symlink_target = if file_type == FileType::Symlink {
            let target = tokio::fs::read_link(host)
                .await
                .map_err(|e| Error::read(path, e))?;
            let absolute = match host.parent() {
                Some(parent) if target.is_relative() => parent.join(&target),
                _ => target,
            };
            LocalPath::new(absolute).ok().map(GatePath::Local)
        } else {
            None
        };

        Ok(
            Lookup::new(path.clone(), file_type, metadata.len(), modified_at)
                .with_ownership(ownership_of(metadata))
                .with_permissions(permissions_of(metadata))
                .with_symlink_target(symlink_target),
        )
    }
}

fn is_absent(e: &io::Error) -> bool {
    matches!(
        e.kind(),
        io::ErrorKind::NotFound | io::ErrorKind::NotADirectory
    )
}

#[cfg(unix)]
fn ownership_of(metadata: &std::fs::Metadata) -> Option<Ownership> {
    use std::os::unix::fs::MetadataExt;
    Some(Ownership {
        uid: metadata.uid(),
        gid: metadata.gid(),
    })
}

#[cfg(not(unix))]
fn ownership_of(_metadata: &std::fs::Metadata) -> Option<Ownership> {
    None
}

#[cfg(unix)]
fn permissions_of(metadata: &std::fs::Metadata) -> Option<Permissions> {
    use std::os::unix::fs::PermissionsExt;
    Some(Permissions::new(metadata.permissions().mode() & 0o7777))
}

#[cfg(not(unix))]
fn permissions_of(_metadata: &std::fs::Metadata) -> Option<Permissions> {
    None
}

impl LocalGateway {
    /// Look up each listed child, skipping any removed since the listing.
    pub(super) async fn lookup_children(&self, children: Vec<GatePath>) -> Result<Vec<Lookup>> {
        let mut lookups = Vec::with_capacity(children.len());
        for child in children {
            match self.lookup(&child).await {
                Ok(lookup) => lookups.push(lookup),
                Err(Error::ReadFailure { source, .. }) if is_absent(&source) => {
                    let path_str = child.display_path();
                    debug!("{path} vanished after listing", path: path_str);
                }
                Err(e) => return Err(e),
            }
        }
        Ok(lookups)
    }
}

/// Run a std call on the blocking pool.
async fn blocking<T, F>(f: F) -> io::Result<T>
where
    F: FnOnce() -> io::Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(io::Error::other)?
}

#[async_trait]
impl Gateway for LocalGateway {
    fn backend_tag(&self) -> BackendTag {
        BackendTag::Local
    }

    async fn exists(&self, path: &GatePath) -> Result<bool> {
        let host = Self::host_path(path)?;
        Ok(Self::stat(path, &host).await?.is_some())
    }

    async fn lookup(&self, path: &GatePath) -> Result<Lookup> {
        let host = Self::host_path(path)?;
        let metadata = tokio::fs::symlink_metadata(&host)
            .await
            .map_err(|e| Error::read(path, e))?;
        Self::build_lookup(path, &host, &metadata).await
    }

    async fn list_files(&self, path: &GatePath) -> Result<Vec<GatePath>> {
        let host = Self::host_path(path)?;
        let mut entries = tokio::fs::read_dir(&host)
            .await
            .map_err(|e| Error::read(path, e))?;

        let mut children = Vec::new();
        while let Some(entry) = entries.next_entry().await.map_err(|e| Error::read(path, e))? {
            // Segments are UTF-8; a lossy name would address another file.
            let name = entry.file_name().into_string().map_err(|raw| {
                Error::read(
                    path,
                    io::Error::new(
                        io::ErrorKind::InvalidData,
                        format!("entry name is not valid UTF-8: {}", raw.to_string_lossy()),
                    ),
                )
            })?;
            children.push(path.child_segments(&[name]));
        }
        Ok(children)
    }

    async fn lookup_files(&self, path: &GatePath) -> Result<Vec<Lookup>> {
        let children = self.list_files(path).await?;
        self.lookup_children(children).await
    }

    async fn create_file(&self, path: &GatePath) -> Result<bool> {
        let host = Self::host_path(path)?;
        match Self::stat(path, &host).await? {
            Some(metadata) if metadata.is_file() => return Ok(false),
            Some(_) => return Err(Error::conflict(path, "exists, but is not a file")),
            None => {}
        }

        if let Some(parent) = host.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| Error::write(path, e))?;
        }
        _ = tokio::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&host)
            .await
            .map_err(|e| Error::write(path, e))?;

        let path_str = path.display_path();
        debug!("Created file {path}", path: path_str);
        Ok(true)
    }

    async fn create_dir(&self, path: &GatePath) -> Result<bool> {
        let host = Self::host_path(path)?;
        match Self::stat(path, &host).await? {
            Some(metadata) if metadata.is_dir() => return Ok(false),
            Some(_) => return Err(Error::conflict(path, "exists, but is not a directory")),
            None => {}
        }

        tokio::fs::create_dir_all(&host)
            .await
            .map_err(|e| Error::write(path, e))?;

        let path_str = path.display_path();
        debug!("Created directory {path}", path: path_str);
        Ok(true)
    }

    async fn delete(&self, path: &GatePath) -> Result<bool> {
        let host = Self::host_path(path)?;
        let Some(metadata) = Self::stat(path, &host).await? else {
            return Ok(false);
        };

        let removed = if metadata.is_dir() {
            tokio::fs::remove_dir(&host).await
        } else {
            tokio::fs::remove_file(&host).await
        };
        match removed {
            Ok(()) => {
                let path_str = path.display_path();
                debug!("Deleted {path}", path: path_str);
                Ok(true)
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(Error::write(path, e)),
        }
    }

    async fn read(&self, path: &GatePath) -> Result<ReadStream> {
        let host = Self::host_path(path)?;
        let file = tokio::fs::File::open(&host)
            .await
            .map_err(|e| Error::read(path, e))?;
        Ok(ReadStream::new(Box::pin(file), KeepAlive::none()))
    }

    async fn write(&self, path: &GatePath) -> Result<WriteStream> {
        let host = Self::host_path(path)?;
        let file = tokio::fs::File::create(&host)
            .await
            .map_err(|e| Error::write(path, e))?;
        Ok(WriteStream::new(Box::pin(file), KeepAlive::none()))
    }

    async fn set_modified_at(&self, path: &GatePath, modified_at: DateTime<Utc>) -> Result<bool> {
        let host = Self::host_path(path)?;
        let when: SystemTime = modified_at.into();
        blocking(move || std::fs::File::open(&host)?.set_modified(when))
            .await
            .map_err(|e| Error::write(path, e))?;
        Ok(true)
    }

    #[cfg(unix)]
    async fn set_permissions(&self, path: &GatePath, permissions: Permissions) -> Result<bool> {
        use std::os::unix::fs::PermissionsExt;
        let host = Self::host_path(path)?;
        tokio::fs::set_permissions(&host, std::fs::Permissions::from_mode(permissions.mode))
            .await
            .map_err(|e| Error::write(path, e))?;
        Ok(true)
    }

    #[cfg(not(unix))]
    async fn set_permissions(&self, path: &GatePath, _permissions: Permissions) -> Result<bool> {
        _ = Self::host_path(path)?;
        Err(Error::write(
            path,
            io::Error::new(io::ErrorKind::Unsupported, "mode bits need a unix host"),
        ))
    }

    #[cfg(unix)]
    async fn set_ownership(&self, path: &GatePath, ownership: Ownership) -> Result<bool> {
        let host = Self::host_path(path)?;
        blocking(move || std::os::unix::fs::chown(&host, Some(ownership.uid), Some(ownership.gid)))
            .await
            .map_err(|e| Error::write(path, e))?;
        Ok(true)
    }

    #[cfg(not(unix))]
    async fn set_ownership(&self, path: &GatePath, _ownership: Ownership) -> Result<bool> {
        _ = Self::host_path(path)?;
        Err(Error::write(
            path,
            io::Error::new(io::ErrorKind::Unsupported, "ownership needs a unix host"),
        ))
    }

    async fn can_read(&self, path: &GatePath) -> Result<bool> {
        let host = Self::host_path(path)?;
        let Ok(metadata) = tokio::fs::metadata(&host).await else {
            return Ok(false);
        };
        let readable = if metadata.is_dir() {
            tokio::fs::read_dir(&host).await.is_ok()
        } else {
            tokio::fs::File::open(&host).await.is_ok()
        };
        Ok(readable)
    }

    async fn can_write(&self, path: &GatePath) -> Result<bool> {
        let host = Self::host_path(path)?;
        let Ok(metadata) = tokio::fs::metadata(&host).await else {
            return Ok(false);
        };
        if metadata.is_dir() {
            return Ok(!metadata.permissions().readonly());
        }
        Ok(tokio::fs::OpenOptions::new()
            .write(true)
            .open(&host)
            .await
            .is_ok())
    }

    #[cfg(unix)]
    async fn create_symlink(&self, link: &GatePath, target: &GatePath) -> Result<bool> {
        let link_host = Self::host_path(link)?;
        let target_host = Self::host_path(target)?;
        if Self::stat(link, &link_host).await?.is_some() {
            return Ok(false);
        }
        tokio::fs::symlink(&target_host, &link_host)
            .await
            .map_err(|e| Error::write(link, e))?;
        Ok(true)
    }

    #[cfg(not(unix))]
    async fn create_symlink(&self, link: &GatePath, _target: &GatePath) -> Result<bool> {
        _ = Self::host_path(link)?;
        Err(Error::unsupported(link, "create_symlink"))
    }
}
