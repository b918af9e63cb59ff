// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

use crate::path::{BackendTag, GatePath};
use std::io;

pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced by path algebra and by every gateway operation.
///
/// "Already in the desired state" is never an error: creation of an
/// existing node and deletion of an absent one return `Ok(false)`.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Lookup, listing, read or existence resolution failed.
    #[error("Read failed for {path}: {source}")]
    ReadFailure {
        path: GatePath,
        #[source]
        source: io::Error,
    },

    /// Create, delete, write or metadata mutation failed.
    #[error("Write failed for {path}: {source}")]
    WriteFailure {
        path: GatePath,
        #[source]
        source: io::Error,
    },

    /// No persisted tree grant covers the path.
    #[error("No persisted permission covers {path}")]
    MissingGrant { path: GatePath },

    /// Caller-level misuse (mixed backend tags, broken ancestry, ...).
    #[error("Precondition failed: {0}")]
    Precondition(String),

    /// The backend's addressing model cannot express the operation.
    #[error("{operation} is not supported for {path}")]
    Unsupported {
        path: GatePath,
        operation: &'static str,
    },

    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    pub fn read(path: &GatePath, source: io::Error) -> Self {
        Error::ReadFailure {
            path: path.clone(),
            source,
        }
    }

    pub fn write(path: &GatePath, source: io::Error) -> Self {
        Error::WriteFailure {
            path: path.clone(),
            source,
        }
    }

    /// A read failure for a node that does not exist.
    pub fn not_found(path: &GatePath) -> Self {
        Self::read(
            path,
            io::Error::new(io::ErrorKind::NotFound, "no such file or directory"),
        )
    }

    /// A write failure for a node whose existing type conflicts with the request.
    pub fn conflict<S: Into<String>>(path: &GatePath, msg: S) -> Self {
        Self::write(path, io::Error::new(io::ErrorKind::AlreadyExists, msg.into()))
    }

    pub fn missing_grant(path: &GatePath) -> Self {
        Error::MissingGrant { path: path.clone() }
    }

    pub fn precondition<S: Into<String>>(msg: S) -> Self {
        Error::Precondition(msg.into())
    }

    pub fn unsupported(path: &GatePath, operation: &'static str) -> Self {
        Error::Unsupported {
            path: path.clone(),
            operation,
        }
    }

    /// Two paths of different backends were combined.
    pub fn tag_mismatch(left: BackendTag, right: BackendTag) -> Self {
        Error::Precondition(format!(
            "backend tags differ: {} vs {}",
            left.as_str(),
            right.as_str()
        ))
    }

    /// A path was handed to a gateway serving another backend.
    pub fn wrong_backend(expected: BackendTag, path: &GatePath) -> Self {
        Error::Precondition(format!(
            "{} gateway cannot serve {} path {}",
            expected.as_str(),
            path.backend_tag().as_str(),
            path
        ))
    }

    pub fn config<S: Into<String>>(msg: S) -> Self {
        Error::Config(msg.into())
    }

    #[must_use]
    pub fn is_read_failure(&self) -> bool {
        matches!(self, Error::ReadFailure { .. })
    }

    #[must_use]
    pub fn is_write_failure(&self) -> bool {
        matches!(self, Error::WriteFailure { .. })
    }

    /// The path this error is about, when it carries one.
    #[must_use]
    pub fn path(&self) -> Option<&GatePath> {
        match self {
            Error::ReadFailure { path, .. }
            | Error::WriteFailure { path, .. }
            | Error::MissingGrant { path }
            | Error::Unsupported { path, .. } => Some(path),
            Error::Precondition(_) | Error::Config(_) => None,
        }
    }
}
