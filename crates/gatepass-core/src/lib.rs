// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Core types shared by every gatepass crate.
//!
//! This crate owns the data model (identities, credentials, gateway client
//! entries, connection descriptors) and the two collaborator seams the
//! access engine talks to without knowing who implements them:
//! [`MembershipOracle`] and [`NotificationSink`].

pub mod credential;
pub mod descriptor;
pub mod identity;
pub mod membership;
pub mod notify;
pub mod record;

pub use credential::{Credential, GatewayClient};
pub use descriptor::{ConnectionDescriptor, Endpoint};
pub use identity::{IdentityId, LabelScheme, DEFAULT_REALM};
pub use membership::{Membership, MembershipOracle, OracleError};
pub use notify::{NotificationSink, NotifyError};
pub use record::IdentityRecord;
