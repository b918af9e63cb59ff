// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

use super::provider::{DocumentInfo, DocumentProvider};
use crate::config::TreeConfig;
use crate::error::{Error, Result};
use crate::gateway::{Gateway, require_backend};
use crate::grants::{GrantMatch, GrantStore, resolve};
use crate::lookup::{FileType, Lookup, Ownership, Permissions};
use crate::path::{BackendTag, GatePath, TreePath, TreeRoot};
use crate::shared::{KeepAlive, Lease, SharedResource};
use crate::stream::{ReadStream, WriteStream};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diagnostics::debug;
use percent_encoding::percent_decode_str;
use std::io;
use std::sync::Arc;

pub type ProviderHandle = Arc<dyn DocumentProvider>;

/// Gateway over URI-addressed document trees reachable through grants.
///
/// Paths are resolved by picking the most specific persisted grant and
/// descending from its root document one display name at a time. The
/// provider connection is a [`SharedResource`]: every operation holds a
/// lease for its duration and streams hold theirs until dropped.
pub struct TreeGateway {
    provider: SharedResource<ProviderHandle>,
    grants: Arc<dyn GrantStore>,
    config: TreeConfig,
}

/// A path resolved to its grant, with the provider lease used to do so.
struct Located {
    provider: Lease<ProviderHandle>,
    target: GatePath,
    matched: GrantMatch,
}

/// Which failure an unreachable provider surfaces as.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Access {
    Read,
    Write,
}

impl Access {
    fn failure(self, path: &GatePath, source: io::Error) -> Error {
        match self {
            Access::Read => Error::read(path, source),
            Access::Write => Error::write(path, source),
        }
    }
}

impl Located {
    fn root(&self) -> &TreeRoot {
        &self.matched.grant.root
    }
}

impl TreeGateway {
    /// `opener` runs whenever the provider connection has to be (re)opened.
    pub fn new<F>(opener: F, grants: Arc<dyn GrantStore>, config: TreeConfig) -> Self
    where
        F: Fn() -> io::Result<ProviderHandle> + Send + Sync + 'static,
    {
        Self {
            provider: SharedResource::new("document-provider", opener),
            grants,
            config,
        }
    }

    /// Serve a provider that is always available.
    pub fn with_provider(
        provider: ProviderHandle,
        grants: Arc<dyn GrantStore>,
        config: TreeConfig,
    ) -> Self {
        Self::new(move || Ok(provider.clone()), grants, config)
    }

    /// The shared provider connection.
    #[must_use]
    pub fn provider(&self) -> &SharedResource<ProviderHandle> {
        &self.provider
    }

    fn lease(&self, path: &GatePath, access: Access) -> Result<Lease<ProviderHandle>> {
        self.provider
            .acquire()
            .map_err(|e| access.failure(path, e))
    }

    fn tree_path(path: &GatePath) -> Result<&TreePath> {
        require_backend(BackendTag::Tree, path)?;
        path.as_tree()
            .ok_or_else(|| Error::wrong_backend(BackendTag::Tree, path))
    }

    fn locate(&self, path: &GatePath, access: Access) -> Result<Located> {
        let tree = Self::tree_path(path)?;
        let matched = resolve(tree, &self.grants.persisted_grants())?;
        Ok(Located {
            provider: self.lease(path, access)?,
            target: path.clone(),
            matched,
        })
    }

    fn is_dir(&self, doc: &DocumentInfo) -> bool {
        doc.mime_type == self.config.directory_mime_type
    }

    /// The name a child is addressed by.
    ///
    /// Falls back to the last segment of the document id when the provider
    /// reports no usable display name.
    fn child_name(&self, parent: &GatePath, doc: &DocumentInfo) -> Result<String> {
        if let Some(name) = doc.display_name.as_deref().filter(|n| !n.is_empty()) {
            return Ok(name.to_string());
        }
        if !self.config.derive_missing_names {
            return Err(Error::read(
                parent,
                io::Error::new(
                    io::ErrorKind::InvalidData,
                    format!("document {} has no display name", doc.document_id),
                ),
            ));
        }
        Ok(name_from_document_id(&doc.document_id))
    }

    async fn named_children(
        &self,
        located: &Located,
        parent_path: &GatePath,
        parent: &DocumentInfo,
    ) -> Result<Vec<(String, DocumentInfo)>> {
        let children = located
            .provider
            .children(located.root(), &parent.document_id)
            .await
            .map_err(|e| Error::read(parent_path, e))?;
        children
            .into_iter()
            .map(|doc| Ok((self.child_name(parent_path, &doc)?, doc)))
            .collect()
    }

    /// Walk from the grant root down to the target. `None` when any
    /// segment on the way is missing.
    async fn find(&self, located: &Located) -> Result<Option<DocumentInfo>> {
        let root = located.root();
        let mut current = match located.provider.tree_document(root).await {
            Ok(doc) => doc,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(Error::read(&located.target, e)),
        };
        let mut current_path = GatePath::tree::<&str>(root.clone(), &[]);

        for segment in &located.matched.missing_segments {
            if !self.is_dir(&current) {
                return Ok(None);
            }
            let next = self
                .named_children(located, &current_path, &current)
                .await?
                .into_iter()
                .find(|(name, _)| name == segment);
            match next {
                Some((_, doc)) => current = doc,
                None => return Ok(None),
            }
            current_path = current_path.child_segments(&[segment]);
        }
        Ok(Some(current))
    }

    async fn find_existing(&self, located: &Located) -> Result<DocumentInfo> {
        self.find(located)
            .await?
            .ok_or_else(|| Error::not_found(&located.target))
    }

    fn to_lookup(&self, path: GatePath, doc: &DocumentInfo) -> Lookup {
        let file_type = if self.is_dir(doc) {
            FileType::Directory
        } else {
            FileType::File
        };
        let modified_at = doc.last_modified.unwrap_or(DateTime::<Utc>::UNIX_EPOCH);
        Lookup::new(path, file_type, doc.size, modified_at)
    }

    /// Create the document at `path`, creating missing parent directories.
    ///
    /// Strict: fails with a write failure if anything named like the final
    /// segment already exists, whatever its type. Parent directories that
    /// already exist are reused; a file in their place is a write failure.
    pub async fn create_document(&self, path: &GatePath, kind: FileType) -> Result<Lookup> {
        let located = self.locate(path, Access::Write)?;
        self.create_located(&located, kind).await
    }

    async fn create_located(&self, located: &Located, kind: FileType) -> Result<Lookup> {
        let path = &located.target;
        let mime_type = match kind {
            FileType::File => self.config.file_mime_type.as_str(),
            FileType::Directory => self.config.directory_mime_type.as_str(),
            FileType::Symlink => return Err(Error::unsupported(path, "create_symlink")),
        };
        if !located.matched.grant.write {
            return Err(Error::write(
                path,
                io::Error::new(io::ErrorKind::PermissionDenied, "grant is read-only"),
            ));
        }

        let root = located.root();
        let Some((leaf, parents)) = located.matched.missing_segments.split_last() else {
            return Err(Error::conflict(path, "the granted root already exists"));
        };

        let mut current = located
            .provider
            .tree_document(root)
            .await
            .map_err(|e| Error::write(path, e))?;
        let mut current_path = GatePath::tree::<&str>(root.clone(), &[]);

        for segment in parents {
            let existing = self
                .named_children(located, &current_path, &current)
                .await?
                .into_iter()
                .find(|(name, _)| name == segment);
            current_path = current_path.child_segments(&[segment]);
            current = match existing {
                Some((_, doc)) if self.is_dir(&doc) => doc,
                Some(_) => {
                    return Err(Error::conflict(
                        &current_path,
                        "a file is in the way of a parent directory",
                    ));
                }
                None => {
                    let doc = located
                        .provider
                        .create_document(
                            root,
                            &current.document_id,
                            &self.config.directory_mime_type,
                            segment,
                        )
                        .await
                        .map_err(|e| Error::write(&current_path, e))?;
                    let path_str = current_path.display_path();
                    debug!("Created parent directory {path}", path: path_str);
                    doc
                }
            };
        }

        let taken = self
            .named_children(located, path, &current)
            .await?
            .into_iter()
            .any(|(name, _)| &name == leaf);
        if taken {
            return Err(Error::conflict(path, "a document with this name exists"));
        }

        let doc = located
            .provider
            .create_document(root, &current.document_id, mime_type, leaf)
            .await
            .map_err(|e| Error::write(path, e))?;

        let path_str = path.display_path();
        let kind_str = kind.as_str();
        debug!("Created {kind} {path}", kind: kind_str, path: path_str);
        Ok(self.to_lookup(path.clone(), &doc))
    }

    /// Idempotent creation shared by `create_file` and `create_dir`.
    async fn ensure(&self, path: &GatePath, kind: FileType) -> Result<bool> {
        let located = self.locate(path, Access::Write)?;
        match self.find(&located).await? {
            Some(doc) if self.is_dir(&doc) == (kind == FileType::Directory) => Ok(false),
            Some(_) => Err(Error::conflict(
                path,
                format!("exists, but is not a {}", kind.as_str()),
            )),
            None => {
                _ = self.create_located(&located, kind).await?;
                Ok(true)
            }
        }
    }
}

/// The last percent-decoded segment of a document id, after the last `/`
/// or `:`.
fn name_from_document_id(document_id: &str) -> String {
    let last = document_id
        .rsplit(['/', ':'])
        .find(|segment| !segment.is_empty())
        .unwrap_or(document_id);
    match percent_decode_str(last).decode_utf8() {
        Ok(decoded) => decoded.into_owned(),
        Err(_) => last.to_string(),
    }
}

#[async_trait]
impl Gateway for TreeGateway {
    fn backend_tag(&self) -> BackendTag {
        BackendTag::Tree
    }

    async fn exists(&self, path: &GatePath) -> Result<bool> {
        let located = self.locate(path, Access::Read)?;
        Ok(self.find(&located).await?.is_some())
    }

    async fn lookup(&self, path: &GatePath) -> Result<Lookup> {
        let located = self.locate(path, Access::Read)?;
        let doc = self.find_existing(&located).await?;
        Ok(self.to_lookup(path.clone(), &doc))
    }

    async fn list_files(&self, path: &GatePath) -> Result<Vec<GatePath>> {
        Ok(self
            .lookup_files(path)
            .await?
            .into_iter()
            .map(Lookup::into_path)
            .collect())
    }

    async fn lookup_files(&self, path: &GatePath) -> Result<Vec<Lookup>> {
        let located = self.locate(path, Access::Read)?;
        let doc = self.find_existing(&located).await?;
        if !self.is_dir(&doc) {
            return Err(Error::read(
                path,
                io::Error::new(io::ErrorKind::NotADirectory, "not a directory"),
            ));
        }
        Ok(self
            .named_children(&located, path, &doc)
            .await?
            .into_iter()
            .map(|(name, child)| self.to_lookup(path.child_segments(&[name]), &child))
            .collect())
    }

    async fn create_file(&self, path: &GatePath) -> Result<bool> {
        self.ensure(path, FileType::File).await
    }

    async fn create_dir(&self, path: &GatePath) -> Result<bool> {
        self.ensure(path, FileType::Directory).await
    }

    async fn delete(&self, path: &GatePath) -> Result<bool> {
        let located = self.locate(path, Access::Write)?;
        let Some(doc) = self.find(&located).await? else {
            return Ok(false);
        };
        // Providers delete directories recursively; this contract never does.
        if self.is_dir(&doc) {
            let has_children = !located
                .provider
                .children(located.root(), &doc.document_id)
                .await
                .map_err(|e| Error::write(path, e))?
                .is_empty();
            if has_children {
                return Err(Error::write(
                    path,
                    io::Error::new(io::ErrorKind::DirectoryNotEmpty, "directory not empty"),
                ));
            }
        }
        located
            .provider
            .delete_document(located.root(), &doc.document_id)
            .await
            .map_err(|e| Error::write(path, e))?;

        let path_str = path.display_path();
        debug!("Deleted {path}", path: path_str);
        Ok(true)
    }

    async fn read(&self, path: &GatePath) -> Result<ReadStream> {
        let located = self.locate(path, Access::Read)?;
        let doc = self.find_existing(&located).await?;
        let inner = located
            .provider
            .open_read(located.root(), &doc.document_id)
            .await
            .map_err(|e| Error::read(path, e))?;
        Ok(ReadStream::new(inner, KeepAlive::holding(located.provider)))
    }

    async fn write(&self, path: &GatePath) -> Result<WriteStream> {
        let located = self.locate(path, Access::Write)?;
        let document_id = match self.find(&located).await? {
            Some(doc) if self.is_dir(&doc) => {
                return Err(Error::write(
                    path,
                    io::Error::new(io::ErrorKind::IsADirectory, "is a directory"),
                ));
            }
            Some(doc) => doc.document_id,
            None => {
                _ = self.create_located(&located, FileType::File).await?;
                self.find_existing(&located).await?.document_id
            }
        };
        let inner = located
            .provider
            .open_write(located.root(), &document_id)
            .await
            .map_err(|e| Error::write(path, e))?;
        Ok(WriteStream::new(inner, KeepAlive::holding(located.provider)))
    }

    async fn set_modified_at(&self, path: &GatePath, modified_at: DateTime<Utc>) -> Result<bool> {
        let located = self.locate(path, Access::Write)?;
        let Some(doc) = self.find(&located).await? else {
            return Err(Error::write(
                path,
                io::Error::new(io::ErrorKind::NotFound, "no such document"),
            ));
        };
        located
            .provider
            .set_last_modified(located.root(), &doc.document_id, modified_at)
            .await
            .map_err(|e| Error::write(path, e))
    }

    async fn set_permissions(&self, path: &GatePath, _permissions: Permissions) -> Result<bool> {
        _ = Self::tree_path(path)?;
        Err(Error::write(
            path,
            io::Error::new(
                io::ErrorKind::Unsupported,
                "document trees carry no mode bits",
            ),
        ))
    }

    async fn set_ownership(&self, path: &GatePath, _ownership: Ownership) -> Result<bool> {
        _ = Self::tree_path(path)?;
        Err(Error::write(
            path,
            io::Error::new(io::ErrorKind::Unsupported, "document trees carry no owner"),
        ))
    }

    async fn can_read(&self, path: &GatePath) -> Result<bool> {
        let located = match self.locate(path, Access::Read) {
            Ok(located) => located,
            Err(Error::MissingGrant { .. }) => return Ok(false),
            Err(e) => return Err(e),
        };
        if !located.matched.grant.read {
            return Ok(false);
        }
        Ok(self.find(&located).await?.is_some())
    }

    async fn can_write(&self, path: &GatePath) -> Result<bool> {
        let located = match self.locate(path, Access::Read) {
            Ok(located) => located,
            Err(Error::MissingGrant { .. }) => return Ok(false),
            Err(e) => return Err(e),
        };
        if !located.matched.grant.write {
            return Ok(false);
        }
        let Some(doc) = self.find(&located).await? else {
            return Ok(false);
        };
        let flags = doc.flags;
        Ok(flags.supports_write
            || flags.supports_delete
            || (self.is_dir(&doc) && flags.dir_supports_create))
    }

    async fn create_symlink(&self, link: &GatePath, _target: &GatePath) -> Result<bool> {
        _ = Self::tree_path(link)?;
        Err(Error::unsupported(link, "create_symlink"))
    }

    async fn keep_alive(&self, path: &GatePath) -> Result<KeepAlive> {
        _ = Self::tree_path(path)?;
        Ok(KeepAlive::holding(self.lease(path, Access::Read)?))
    }
}
