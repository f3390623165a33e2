// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use gatepass_config::{LogFormat, LoggingConfig};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Installs the global subscriber. `RUST_LOG` wins over the configured level.
pub fn init(config: &LoggingConfig) {
	let filter =
		EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

	let registry = tracing_subscriber::registry().with(filter);
	match config.format {
		LogFormat::Json => registry
			.with(tracing_subscriber::fmt::layer().json().with_current_span(false))
			.init(),
		LogFormat::Text => registry.with(tracing_subscriber::fmt::layer()).init(),
	}
}
