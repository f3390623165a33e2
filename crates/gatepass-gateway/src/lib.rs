// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Credential provisioning against an Xray gateway.
//!
//! Two strategies, tried in order by [`GatewayProvisioner`]:
//!
//! 1. [`ControlChannelStrategy`]: live change through `xray api`.
//! 2. [`DeclarativeConfigStrategy`]: edit the JSON config, then restart the
//!    gateway through a [`GatewayProcess`].
//!
//! The access engine only depends on the [`CredentialProvisioner`] trait.

pub mod bootstrap;
pub mod control;
pub mod declarative;
pub mod document;
pub mod error;
pub mod process;
pub mod strategy;

pub use bootstrap::{bootstrap_api, ensure_api_section};
pub use control::ControlChannelStrategy;
pub use declarative::DeclarativeConfigStrategy;
pub use error::{GatewayError, Result, StrategyFailure};
pub use process::{
	CommandOutput, CommandRunner, GatewayProcess, SystemdGatewayProcess, TokioCommandRunner,
};
pub use strategy::{CredentialProvisioner, GatewayProvisioner, ProvisioningStrategy};
