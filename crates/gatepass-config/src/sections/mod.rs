// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Configuration sections.

mod database;
mod endpoint;
mod gateway;
mod logging;
mod reconcile;
mod telegram;

pub use database::{DatabaseConfig, DatabaseConfigLayer};
pub use endpoint::{EndpointConfig, EndpointConfigLayer};
pub use gateway::{GatewayConfig, GatewayConfigLayer};
pub use logging::{LogFormat, LoggingConfig, LoggingConfigLayer};
pub use reconcile::{ReconcileConfig, ReconcileConfigLayer};
pub use telegram::{TelegramConfig, TelegramConfigLayer};
