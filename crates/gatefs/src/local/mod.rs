// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

//! Local -- the host filesystem behind the gateway contract
//!
//! Every [`crate::path::LocalPath`] maps one-to-one onto a host path, so
//! resolution is trivial. I/O goes through `tokio::fs`; the few calls
//! `tokio::fs` does not offer (timestamps, ownership) run on the blocking
//! pool.

mod gateway;


pub use gateway::LocalGateway;
