// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Access reconciliation engine.
//!
//! Keeps three independent sources of truth (channel membership, the
//! identity store and the gateway's client list) eventually consistent:
//!
//! - [`AccessService`] provisions and revokes a single identity.
//! - [`Reconciler`] periodically re-checks every stored identity and revokes
//!   those that lost membership.

pub mod error;
pub mod reconcile;
pub mod service;

#[cfg(test)]
mod testing;

pub use error::{AccessError, Result};
pub use reconcile::{CycleReport, ReconcileSchedule, Reconciler, ReconcilerHandle};
pub use service::{AccessProfile, AccessService, Provisioned};
