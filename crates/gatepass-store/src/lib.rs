// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Identity record persistence.
//!
//! The store is a keyed collection of [`IdentityRecord`]s behind the
//! [`IdentityStore`] trait. The SQLite implementation serializes every
//! statement through a single pooled connection; [`MemoryIdentityStore`]
//! offers the same contract in memory with failure injection for tests.
//!
//! [`IdentityRecord`]: gatepass_core::IdentityRecord

pub mod error;
pub mod identity;
pub mod memory;
pub mod pool;

pub use error::{DbError, Result};
pub use identity::{IdentityRepository, IdentityStore};
pub use memory::MemoryIdentityStore;
pub use pool::{create_pool, run_migrations};
