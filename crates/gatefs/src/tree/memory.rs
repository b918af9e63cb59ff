// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

use super::provider::{DocumentFlags, DocumentInfo, DocumentProvider};
use crate::config::{DEFAULT_FILE_MIME_TYPE, DIRECTORY_MIME_TYPE};
use crate::path::TreeRoot;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::io;
use std::pin::Pin;
use std::sync::{Arc, Mutex, MutexGuard};
use std::task::{Context, Poll};
use tokio::io::{AsyncRead, AsyncWrite};

/// In-memory document provider for testing and lightweight use.
///
/// Document ids follow the external storage convention: `volume:` for a
/// volume root, `volume:relative/path` below it.
#[derive(Clone)]
pub struct MemoryDocumentProvider {
    authority: String,
    state: Arc<Mutex<State>>,
}

struct State {
    documents: BTreeMap<String, Document>,
    directory_mime_type: String,
}

struct Document {
    parent: Option<String>,
    display_name: String,
    name_hidden: bool,
    mime_type: String,
    directory: bool,
    content: Vec<u8>,
    last_modified: DateTime<Utc>,
    flags: DocumentFlags,
}

impl Document {
    fn is_dir(&self) -> bool {
        self.directory
    }

    fn info(&self, document_id: &str) -> DocumentInfo {
        DocumentInfo {
            document_id: document_id.to_string(),
            display_name: (!self.name_hidden).then(|| self.display_name.clone()),
            mime_type: self.mime_type.clone(),
            size: self.content.len() as u64,
            last_modified: Some(self.last_modified),
            flags: self.flags,
        }
    }
}

/// Whether `document_id` is `ancestor` or lies beneath it.
fn is_within(ancestor: &str, document_id: &str) -> bool {
    if document_id == ancestor {
        return true;
    }
    if ancestor.ends_with(':') {
        document_id.starts_with(ancestor)
    } else {
        document_id
            .strip_prefix(ancestor)
            .is_some_and(|rest| rest.starts_with('/'))
    }
}

fn child_id(parent_id: &str, name: &str) -> String {
    if parent_id.ends_with(':') {
        format!("{parent_id}{name}")
    } else {
        format!("{parent_id}/{name}")
    }
}

fn not_found(document_id: &str) -> io::Error {
    io::Error::new(
        io::ErrorKind::NotFound,
        format!("no document {document_id}"),
    )
}

impl State {
    fn get(&self, document_id: &str) -> io::Result<&Document> {
        self.documents
            .get(document_id)
            .ok_or_else(|| not_found(document_id))
    }

    fn get_mut(&mut self, document_id: &str) -> io::Result<&mut Document> {
        self.documents
            .get_mut(document_id)
            .ok_or_else(|| not_found(document_id))
    }

    fn get_dir(&self, document_id: &str) -> io::Result<&Document> {
        let doc = self.get(document_id)?;
        if doc.is_dir() {
            Ok(doc)
        } else {
            Err(io::Error::new(
                io::ErrorKind::NotADirectory,
                format!("{document_id} is not a directory"),
            ))
        }
    }

    fn insert(&mut self, parent_id: &str, name: &str, mime_type: &str, content: Vec<u8>) -> String {
        let document_id = child_id(parent_id, name);
        let directory = mime_type == self.directory_mime_type;
        _ = self.documents.insert(
            document_id.clone(),
            Document {
                parent: Some(parent_id.to_string()),
                display_name: name.to_string(),
                name_hidden: false,
                mime_type: mime_type.to_string(),
                directory,
                content,
                last_modified: Utc::now(),
                flags: DocumentFlags::all(),
            },
        );
        document_id
    }
}

impl MemoryDocumentProvider {
    #[must_use]
    pub fn new<S: Into<String>>(authority: S) -> Self {
        Self {
            authority: authority.into(),
            state: Arc::new(Mutex::new(State {
                documents: BTreeMap::new(),
                directory_mime_type: DIRECTORY_MIME_TYPE.to_string(),
            })),
        }
    }

    /// Mark directories with `mime_type` instead of the platform default.
    /// Must match the gateway's `TreeConfig::directory_mime_type`.
    #[must_use]
    pub fn with_directory_mime_type<S: Into<String>>(self, mime_type: S) -> Self {
        self.state().directory_mime_type = mime_type.into();
        self
    }

    #[must_use]
    pub fn authority(&self) -> &str {
        &self.authority
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Add a storage volume and return the id of its root document.
    pub fn add_volume(&self, volume: &str) -> String {
        let document_id = format!("{volume}:");
        let mut state = self.state();
        let mime_type = state.directory_mime_type.clone();
        _ = state.documents.insert(
            document_id.clone(),
            Document {
                parent: None,
                display_name: volume.to_string(),
                name_hidden: false,
                mime_type,
                directory: true,
                content: Vec::new(),
                last_modified: Utc::now(),
                flags: DocumentFlags {
                    supports_delete: false,
                    ..DocumentFlags::all()
                },
            },
        );
        document_id
    }

    /// Seed a document by id, creating missing parent directories.
    ///
    /// `None` content makes a directory. The volume must exist.
    pub fn insert_path(&self, document_id: &str, content: Option<&[u8]>) -> io::Result<()> {
        let Some((volume, rest)) = document_id.split_once(':') else {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("{document_id} has no volume"),
            ));
        };
        let mut state = self.state();
        let mut parent_id = format!("{volume}:");
        _ = state.get_dir(&parent_id)?;

        let names: Vec<&str> = rest.split('/').filter(|s| !s.is_empty()).collect();
        let Some((leaf, dirs)) = names.split_last() else {
            return Ok(());
        };
        let directory_mime_type = state.directory_mime_type.clone();
        for name in dirs {
            let id = child_id(&parent_id, name);
            if state.documents.contains_key(&id) {
                _ = state.get_dir(&id)?;
            } else {
                _ = state.insert(&parent_id, name, &directory_mime_type, Vec::new());
            }
            parent_id = id;
        }
        let (mime_type, bytes) = match content {
            Some(bytes) => (DEFAULT_FILE_MIME_TYPE, bytes.to_vec()),
            None => (directory_mime_type.as_str(), Vec::new()),
        };
        _ = state.insert(&parent_id, leaf, mime_type, bytes);
        Ok(())
    }

    /// Stop reporting a display name for a document, as some providers do.
    pub fn hide_display_name(&self, document_id: &str) -> io::Result<()> {
        self.state().get_mut(document_id)?.name_hidden = true;
        Ok(())
    }

    pub fn set_flags(&self, document_id: &str, flags: DocumentFlags) -> io::Result<()> {
        self.state().get_mut(document_id)?.flags = flags;
        Ok(())
    }

    #[must_use]
    pub fn contains(&self, document_id: &str) -> bool {
        self.state().documents.contains_key(document_id)
    }

    pub fn content(&self, document_id: &str) -> io::Result<Vec<u8>> {
        Ok(self.state().get(document_id)?.content.clone())
    }

    /// Refuse anything outside the granted tree.
    fn check_scope(&self, root: &TreeRoot, document_id: &str) -> io::Result<()> {
        if root.authority() == self.authority && is_within(root.tree_id(), document_id) {
            Ok(())
        } else {
            Err(io::Error::new(
                io::ErrorKind::PermissionDenied,
                format!("{document_id} is outside {root}"),
            ))
        }
    }
}

#[async_trait]
impl DocumentProvider for MemoryDocumentProvider {
    async fn tree_document(&self, root: &TreeRoot) -> io::Result<DocumentInfo> {
        self.check_scope(root, root.tree_id())?;
        let state = self.state();
        Ok(state.get(root.tree_id())?.info(root.tree_id()))
    }

    async fn query(&self, root: &TreeRoot, document_id: &str) -> io::Result<Option<DocumentInfo>> {
        self.check_scope(root, document_id)?;
        let state = self.state();
        Ok(state
            .documents
            .get(document_id)
            .map(|doc| doc.info(document_id)))
    }

    async fn children(&self, root: &TreeRoot, document_id: &str) -> io::Result<Vec<DocumentInfo>> {
        self.check_scope(root, document_id)?;
        let state = self.state();
        _ = state.get_dir(document_id)?;
        Ok(state
            .documents
            .iter()
            .filter(|(_, doc)| doc.parent.as_deref() == Some(document_id))
            .map(|(id, doc)| doc.info(id))
            .collect())
    }

    async fn create_document(
        &self,
        root: &TreeRoot,
        parent_id: &str,
        mime_type: &str,
        display_name: &str,
    ) -> io::Result<DocumentInfo> {
        self.check_scope(root, parent_id)?;
        if display_name.is_empty() || display_name.contains('/') {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("invalid display name {display_name:?}"),
            ));
        }
        let mut state = self.state();
        _ = state.get_dir(parent_id)?;

        // Clashing names get a numeric suffix rather than an error.
        let mut name = display_name.to_string();
        let mut counter = 1;
        while state.documents.contains_key(&child_id(parent_id, &name)) {
            name = format!("{display_name} ({counter})");
            counter += 1;
        }

        let document_id = state.insert(parent_id, &name, mime_type, Vec::new());
        Ok(state.get(&document_id)?.info(&document_id))
    }

    async fn delete_document(&self, root: &TreeRoot, document_id: &str) -> io::Result<()> {
        self.check_scope(root, document_id)?;
        let mut state = self.state();
        if !state.get(document_id)?.flags.supports_delete {
            return Err(io::Error::new(
                io::ErrorKind::PermissionDenied,
                format!("{document_id} does not support delete"),
            ));
        }
        state.documents.retain(|id, _| !is_within(document_id, id));
        Ok(())
    }

    async fn open_read(
        &self,
        root: &TreeRoot,
        document_id: &str,
    ) -> io::Result<Pin<Box<dyn AsyncRead + Send>>> {
        self.check_scope(root, document_id)?;
        let state = self.state();
        let doc = state.get(document_id)?;
        if doc.is_dir() {
            return Err(io::Error::new(
                io::ErrorKind::IsADirectory,
                format!("{document_id} is a directory"),
            ));
        }
        Ok(Box::pin(io::Cursor::new(doc.content.clone())))
    }

    async fn open_write(
        &self,
        root: &TreeRoot,
        document_id: &str,
    ) -> io::Result<Pin<Box<dyn AsyncWrite + Send>>> {
        self.check_scope(root, document_id)?;
        let state = self.state();
        let doc = state.get(document_id)?;
        if doc.is_dir() || !doc.flags.supports_write {
            return Err(io::Error::new(
                io::ErrorKind::PermissionDenied,
                format!("{document_id} is not writable"),
            ));
        }
        Ok(Box::pin(MemoryWriter {
            state: self.state.clone(),
            document_id: document_id.to_string(),
            buffer: Vec::new(),
        }))
    }

    async fn set_last_modified(
        &self,
        root: &TreeRoot,
        document_id: &str,
        modified_at: DateTime<Utc>,
    ) -> io::Result<bool> {
        self.check_scope(root, document_id)?;
        self.state().get_mut(document_id)?.last_modified = modified_at;
        Ok(true)
    }
}

/// Buffers writes and replaces the document content on shutdown.
struct MemoryWriter {
    state: Arc<Mutex<State>>,
    document_id: String,
    buffer: Vec<u8>,
}

impl AsyncWrite for MemoryWriter {
    fn poll_write(
        self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        self.get_mut().buffer.extend_from_slice(buf);
        Poll::Ready(Ok(buf.len()))
    }

    fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }

    fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        let this = self.get_mut();
        let mut state = this
            .state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let doc = state.get_mut(&this.document_id)?;
        doc.content = std::mem::take(&mut this.buffer);
        doc.last_modified = Utc::now();
        Poll::Ready(Ok(()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::AsyncWriteExt;

    const AUTHORITY: &str = "com.android.externalstorage.documents";

    fn provider() -> MemoryDocumentProvider {
        let provider = MemoryDocumentProvider::new(AUTHORITY);
        _ = provider.add_volume("primary");
        provider
            .insert_path("primary:Foo/Bar/baz.txt", Some(b"baz"))
            .unwrap();
        provider
    }

    fn root(tree_id: &str) -> TreeRoot {
        TreeRoot::new(AUTHORITY, tree_id).unwrap()
    }

    #[tokio::test]
    async fn test_children_and_query() {
        let provider = provider();
        let root = root("primary:Foo");
        let children = provider.children(&root, "primary:Foo").await.unwrap();
        assert_eq!(children.len(), 1);
        assert_eq!(children[0].document_id, "primary:Foo/Bar");
        assert_eq!(children[0].mime_type, DIRECTORY_MIME_TYPE);

        let file = provider
            .query(&root, "primary:Foo/Bar/baz.txt")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(file.size, 3);
        assert!(provider.query(&root, "primary:Foo/nope").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_scope_is_enforced() {
        let provider = provider();
        let err = provider
            .query(&root("primary:Foo/Bar"), "primary:Foo")
            .await
            .unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::PermissionDenied);

        // "primary:Foobar" is a sibling, not a descendant.
        assert!(!is_within("primary:Foo", "primary:Foobar"));
        assert!(is_within("primary:", "primary:Foobar"));
    }

    #[tokio::test]
    async fn test_create_renames_on_clash() {
        let provider = provider();
        let root = root("primary:");
        let created = provider
            .create_document(&root, "primary:Foo", DIRECTORY_MIME_TYPE, "Bar")
            .await
            .unwrap();
        assert_eq!(created.display_name.as_deref(), Some("Bar (1)"));
    }

    #[tokio::test]
    async fn test_delete_is_recursive() {
        let provider = provider();
        provider
            .delete_document(&root("primary:"), "primary:Foo")
            .await
            .unwrap();
        assert!(!provider.contains("primary:Foo/Bar/baz.txt"));
        assert!(provider.contains("primary:"));
    }

    #[tokio::test]
    async fn test_write_commits_on_shutdown() {
        let provider = provider();
        let root = root("primary:");
        let mut writer = provider
            .open_write(&root, "primary:Foo/Bar/baz.txt")
            .await
            .unwrap();
        writer.write_all(b"replaced").await.unwrap();
        assert_eq!(provider.content("primary:Foo/Bar/baz.txt").unwrap(), b"baz");
        writer.shutdown().await.unwrap();
        assert_eq!(
            provider.content("primary:Foo/Bar/baz.txt").unwrap(),
            b"replaced"
        );
    }
}
