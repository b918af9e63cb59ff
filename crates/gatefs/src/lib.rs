// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

//! gatefs - uniform filesystem semantics over local paths and granted
//! document trees
//!
//! Set GATEFS_LOG to control logging:
//! - GATEFS_LOG=off (default) - silent
//! - GATEFS_LOG=info - deletions and walks
//! - GATEFS_LOG=debug - per-node resolution and lease lifecycle

// Path values and their algebra
pub mod path;

// Point-in-time node metadata
pub mod lookup;

// Error types
pub mod error;

// YAML configuration
pub mod config;

// Persisted grants and the resolver
pub mod grants;

// Reference-counted backend handles
pub mod shared;

// Scoped byte streams
pub mod stream;

// The gateway contract and its backends
pub mod gateway;
pub mod local;
pub mod tree;

// Traversals built on the contract
pub mod delete;
pub mod walk;

#[cfg(test)]
mod tests;

pub use config::{GatewayConfig, TreeConfig};
pub use delete::{delete_all, delete_all_filtered};
pub use error::{Error, Result};
pub use gateway::{Gateway, GatewaySwitch};
pub use grants::{Grant, GrantMatch, GrantStore, SharedGrants, resolve};
pub use local::LocalGateway;
pub use lookup::{FileType, Lookup, Ownership, Permissions};
pub use path::{BackendTag, GatePath, LocalPath, RawPath, TreePath, TreeRoot};
pub use shared::{KeepAlive, Lease, SharedResource};
pub use stream::{ReadStream, WriteStream};
pub use tree::{DocumentProvider, MemoryDocumentProvider, TreeGateway};
pub use walk::{walk, walk_filtered};
