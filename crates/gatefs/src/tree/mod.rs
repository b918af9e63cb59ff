// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

//! Tree -- capability-based document trees behind the gateway contract
//!
//! A [`TreeGateway`] never addresses a document directly. It resolves a
//! [`crate::path::TreePath`] through the persisted grants, then asks a
//! [`DocumentProvider`] for one level at a time. [`MemoryDocumentProvider`]
//! is the in-process provider.

mod gateway;
mod memory;
mod provider;


pub use gateway::{ProviderHandle, TreeGateway};
pub use memory::MemoryDocumentProvider;
pub use provider::{DocumentFlags, DocumentInfo, DocumentProvider};
