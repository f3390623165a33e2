// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Layered configuration for gatepass.
//!
//! Precedence (highest to lowest):
//! 1. Environment variables (`GATEPASS_*`, secrets also via `*_FILE`)
//! 2. Config file (`/etc/gatepass/gatepass.toml`, or an explicit path)
//! 3. Built-in defaults
//!
//! ```ignore
//! let config = gatepass_config::load_config()?;
//! println!("gating on {}", config.telegram.channel);
//! ```

pub mod env;
pub mod error;
pub mod layer;
pub mod sections;
pub mod sources;

pub use env::{load_secret_env, SecretEnvError};
pub use error::ConfigError;
pub use layer::GatepassConfigLayer;
pub use sections::*;
pub use sources::{ConfigSource, DefaultsSource, EnvSource, Precedence, TomlSource, SYSTEM_CONFIG_PATH};

use std::path::PathBuf;

use tracing::{debug, info};

/// Fully resolved configuration.
#[derive(Debug, Clone)]
pub struct GatepassConfig {
	pub telegram: TelegramConfig,
	pub gateway: GatewayConfig,
	pub endpoint: EndpointConfig,
	pub database: DatabaseConfig,
	pub reconcile: ReconcileConfig,
	pub logging: LoggingConfig,
}

/// Loads defaults, the system config file if present, then the environment.
pub fn load_config() -> Result<GatepassConfig, ConfigError> {
	let sources: Vec<Box<dyn ConfigSource>> = vec![
		Box::new(DefaultsSource),
		Box::new(TomlSource::system()),
		Box::new(EnvSource),
	];
	load_from_sources(sources)
}

/// Like [`load_config`] but reads `config_path` instead of the system file.
/// The file must exist.
pub fn load_config_with_file(config_path: impl Into<PathBuf>) -> Result<GatepassConfig, ConfigError> {
	let sources: Vec<Box<dyn ConfigSource>> = vec![
		Box::new(DefaultsSource),
		Box::new(TomlSource::new(config_path)),
		Box::new(EnvSource),
	];
	load_from_sources(sources)
}

fn load_from_sources(mut sources: Vec<Box<dyn ConfigSource>>) -> Result<GatepassConfig, ConfigError> {
	sources.sort_by_key(|s| s.precedence());

	let mut merged = GatepassConfigLayer::default();
	for source in sources {
		debug!(source = source.name(), "loading configuration source");
		merged.merge(source.load()?);
	}

	finalize(merged)
}

/// Resolves a merged layer, applying defaults and validation.
pub fn finalize(layer: GatepassConfigLayer) -> Result<GatepassConfig, ConfigError> {
	let telegram = layer.telegram.unwrap_or_default().finalize().ok_or_else(|| {
		ConfigError::MissingRequired(
			"telegram.bot_token (GATEPASS_TELEGRAM_BOT_TOKEN or GATEPASS_TELEGRAM_BOT_TOKEN_FILE)"
				.to_string(),
		)
	})?;
	let gateway = layer.gateway.unwrap_or_default().finalize();
	let endpoint = layer.endpoint.unwrap_or_default().finalize();
	let database = layer.database.unwrap_or_default().finalize();
	let reconcile = layer.reconcile.unwrap_or_default().finalize();
	let logging = layer.logging.unwrap_or_default().finalize();

	validate_telegram(&telegram)?;
	validate_reconcile(&reconcile)?;

	info!(
		channel = %telegram.channel,
		inbound_tag = %gateway.inbound_tag,
		api_address = %gateway.api_address,
		config_path = %gateway.config_path.display(),
		endpoint_domain = %endpoint.domain,
		endpoint_port = endpoint.port,
		database = %database.url,
		reconcile_enabled = reconcile.enabled,
		"configuration loaded"
	);

	Ok(GatepassConfig {
		telegram,
		gateway,
		endpoint,
		database,
		reconcile,
		logging,
	})
}

fn validate_telegram(telegram: &TelegramConfig) -> Result<(), ConfigError> {
	if telegram.bot_token.is_empty() {
		return Err(ConfigError::Validation(
			"the Telegram bot token is empty".to_string(),
		));
	}
	if telegram.channel.trim().is_empty() {
		return Err(ConfigError::Validation(
			"telegram.channel must not be empty".to_string(),
		));
	}
	if telegram.max_concurrent_handlers == 0 {
		return Err(ConfigError::Validation(
			"telegram.max_concurrent_handlers must be at least 1".to_string(),
		));
	}
	Ok(())
}

fn validate_reconcile(reconcile: &ReconcileConfig) -> Result<(), ConfigError> {
	if reconcile.unit_secs == 0 {
		return Err(ConfigError::Validation(
			"reconcile.unit_secs must be greater than 0".to_string(),
		));
	}
	if reconcile.min_units == 0 {
		return Err(ConfigError::Validation(
			"reconcile.min_units must be at least 1".to_string(),
		));
	}
	if reconcile.min_units > reconcile.max_units {
		return Err(ConfigError::Validation(format!(
			"reconcile.min_units ({}) exceeds reconcile.max_units ({})",
			reconcile.min_units, reconcile.max_units
		)));
	}
	if reconcile.unit().checked_mul(reconcile.max_units).is_none() {
		return Err(ConfigError::Validation(format!(
			"reconcile.unit_secs ({}) times reconcile.max_units ({}) is too large",
			reconcile.unit_secs, reconcile.max_units
		)));
	}
	Ok(())
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::sources::tests::env_layer;
	use proptest::prelude::*;
	use std::io::Write;

	fn with_token() -> GatepassConfigLayer {
		env_layer(&[("GATEPASS_TELEGRAM_BOT_TOKEN", "1:abc")]).unwrap()
	}

	#[test]
	fn test_defaults() {
		let config = finalize(with_token()).unwrap();
		assert_eq!(config.telegram.channel, "@art_rom");
		assert_eq!(config.gateway.inbound_tag, "vless_tls");
		assert_eq!(config.gateway.flow, "xtls-rprx-vision");
		assert_eq!(config.endpoint.domain, "artr.ignorelist.com");
		assert_eq!(config.endpoint.port, 443);
		assert_eq!(config.database.url, "sqlite:./data/users.db");
		assert_eq!(config.reconcile, ReconcileConfig::default());
		assert_eq!(config.logging.format, LogFormat::Text);
	}

	#[test]
	fn test_missing_token_rejected() {
		let err = finalize(GatepassConfigLayer::default()).unwrap_err();
		assert!(matches!(err, ConfigError::MissingRequired(_)));
		assert!(err.to_string().contains("bot_token"));
	}

	#[test]
	fn test_file_then_env_precedence() {
		let mut file = tempfile::NamedTempFile::new().unwrap();
		write!(
			file,
			r#"
[telegram]
bot_token = "1:from-file"
channel = "@from_file"

[gateway]
inbound_tag = "vless_file"

[reconcile]
unit_secs = 60
"#
		)
		.unwrap();

		let mut merged = DefaultsSource.load().unwrap();
		merged.merge(TomlSource::new(file.path()).load().unwrap());
		merged.merge(env_layer(&[("GATEPASS_GATEWAY_INBOUND_TAG", "vless_env")]).unwrap());
		let config = finalize(merged).unwrap();

		assert_eq!(config.telegram.bot_token.expose(), "1:from-file");
		assert_eq!(config.telegram.channel, "@from_file");
		assert_eq!(config.gateway.inbound_tag, "vless_env");
		assert_eq!(config.reconcile.unit_secs, 60);
		assert_eq!(config.reconcile.max_units, 23);
	}

	#[test]
	fn test_bad_toml_reports_path() {
		let mut file = tempfile::NamedTempFile::new().unwrap();
		write!(file, "[gateway\nflow = 1").unwrap();
		let err = TomlSource::new(file.path()).load().unwrap_err();
		assert!(matches!(err, ConfigError::TomlParse { .. }));
	}

	#[test]
	fn test_misspelled_section_key_reports_path() {
		let mut file = tempfile::NamedTempFile::new().unwrap();
		write!(file, "[gateway]\ninbound_tga = \"vless_typo\"\n").unwrap();
		let err = TomlSource::new(file.path()).load().unwrap_err();
		assert!(matches!(err, ConfigError::TomlParse { .. }));
	}

	#[test]
	fn test_empty_channel_rejected() {
		let mut layer = with_token();
		layer.telegram.as_mut().unwrap().channel = Some("  ".to_string());
		assert!(finalize(layer).is_err());
	}

	#[test]
	fn test_reconcile_validation() {
		let cases = [
			(0, 1, 23),
			(3600, 0, 23),
			(3600, 10, 5),
			(u64::MAX / 2, 1, 23),
		];
		for (unit_secs, min_units, max_units) in cases {
			let reconcile = ReconcileConfig {
				enabled: true,
				unit_secs,
				min_units,
				max_units,
			};
			assert!(
				validate_reconcile(&reconcile).is_err(),
				"{unit_secs}/{min_units}/{max_units} should be rejected"
			);
		}
	}

	proptest! {
		#[test]
		fn prop_ordered_bounds_accepted(unit in 1u64..100_000, min in 1u32..50, extra in 0u32..50) {
			let reconcile = ReconcileConfig {
				enabled: true,
				unit_secs: unit,
				min_units: min,
				max_units: min + extra,
			};
			prop_assert!(validate_reconcile(&reconcile).is_ok());
		}
	}
}
