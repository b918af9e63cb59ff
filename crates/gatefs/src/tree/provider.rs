// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

use crate::path::TreeRoot;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::io;
use std::pin::Pin;
use tokio::io::{AsyncRead, AsyncWrite};

/// Capability bits a provider reports per document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DocumentFlags {
    pub supports_write: bool,
    pub supports_delete: bool,
    pub dir_supports_create: bool,
}

impl DocumentFlags {
    #[must_use]
    pub fn all() -> Self {
        Self {
            supports_write: true,
            supports_delete: true,
            dir_supports_create: true,
        }
    }
}

/// One row of a provider query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentInfo {
    /// Opaque to everything but the provider.
    pub document_id: String,
    /// Some providers leave this out; see `TreeConfig::derive_missing_names`.
    pub display_name: Option<String>,
    pub mime_type: String,
    pub size: u64,
    pub last_modified: Option<DateTime<Utc>>,
    pub flags: DocumentFlags,
}

/// The document provider behind a tree root.
///
/// Every call is scoped to the tree root a grant was issued for; a
/// provider refuses documents outside that tree with
/// [`io::ErrorKind::PermissionDenied`]. Directory-ness is carried by the
/// MIME type, as providers report it.
#[async_trait]
pub trait DocumentProvider: Send + Sync {
    /// The document a tree root points at.
    async fn tree_document(&self, root: &TreeRoot) -> io::Result<DocumentInfo>;

    /// `None` when the document does not exist.
    async fn query(&self, root: &TreeRoot, document_id: &str) -> io::Result<Option<DocumentInfo>>;

    async fn children(&self, root: &TreeRoot, document_id: &str) -> io::Result<Vec<DocumentInfo>>;

    /// Create a document under `parent_id`. Providers may rename on a
    /// name clash, so callers check for an existing name first.
    async fn create_document(
        &self,
        root: &TreeRoot,
        parent_id: &str,
        mime_type: &str,
        display_name: &str,
    ) -> io::Result<DocumentInfo>;

    /// Providers remove directories together with their content.
    async fn delete_document(&self, root: &TreeRoot, document_id: &str) -> io::Result<()>;

    async fn open_read(
        &self,
        root: &TreeRoot,
        document_id: &str,
    ) -> io::Result<Pin<Box<dyn AsyncRead + Send>>>;

    /// Opens truncating. Content becomes visible on shutdown.
    async fn open_write(
        &self,
        root: &TreeRoot,
        document_id: &str,
    ) -> io::Result<Pin<Box<dyn AsyncWrite + Send>>>;

    /// `Ok(false)` when the provider ignores timestamp updates.
    async fn set_last_modified(
        &self,
        root: &TreeRoot,
        document_id: &str,
        modified_at: DateTime<Utc>,
    ) -> io::Result<bool>;
}
