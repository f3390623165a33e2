// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Configuration sources: built-in defaults, a TOML file and the environment.

use std::path::PathBuf;

use tracing::{debug, trace};

use crate::env::load_secret_with;
use crate::error::ConfigError;
use crate::layer::GatepassConfigLayer;
use crate::sections::{
	DatabaseConfigLayer, EndpointConfigLayer, GatewayConfigLayer, LogFormat, LoggingConfigLayer,
	ReconcileConfigLayer, TelegramConfigLayer,
};

pub const SYSTEM_CONFIG_PATH: &str = "/etc/gatepass/gatepass.toml";

/// Source precedence levels (higher = overrides lower).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Precedence {
	Defaults = 10,
	ConfigFile = 20,
	Environment = 50,
}

pub trait ConfigSource: Send + Sync {
	fn name(&self) -> &'static str;
	fn precedence(&self) -> Precedence;
	fn load(&self) -> Result<GatepassConfigLayer, ConfigError>;
}

pub struct DefaultsSource;

impl ConfigSource for DefaultsSource {
	fn name(&self) -> &'static str {
		"defaults"
	}

	fn precedence(&self) -> Precedence {
		Precedence::Defaults
	}

	fn load(&self) -> Result<GatepassConfigLayer, ConfigError> {
		Ok(GatepassConfigLayer::default())
	}
}

/// TOML file source. A missing file is an empty layer unless the file was
/// named explicitly.
pub struct TomlSource {
	path: PathBuf,
	required: bool,
}

impl TomlSource {
	pub fn new(path: impl Into<PathBuf>) -> Self {
		Self {
			path: path.into(),
			required: true,
		}
	}

	pub fn system() -> Self {
		Self {
			path: PathBuf::from(SYSTEM_CONFIG_PATH),
			required: false,
		}
	}
}

impl ConfigSource for TomlSource {
	fn name(&self) -> &'static str {
		"toml-config"
	}

	fn precedence(&self) -> Precedence {
		Precedence::ConfigFile
	}

	fn load(&self) -> Result<GatepassConfigLayer, ConfigError> {
		if !self.required && !self.path.exists() {
			debug!(path = %self.path.display(), "config file not found, skipping");
			return Ok(GatepassConfigLayer::default());
		}

		debug!(path = %self.path.display(), "loading config file");
		let content = std::fs::read_to_string(&self.path).map_err(|e| ConfigError::FileRead {
			path: self.path.clone(),
			source: e,
		})?;

		let layer: GatepassConfigLayer =
			toml::from_str(&content).map_err(|e| ConfigError::TomlParse {
				path: self.path.clone(),
				source: e,
			})?;

		trace!("parsed config layer from TOML");
		Ok(layer)
	}
}

/// Environment variable source.
///
/// Convention: `GATEPASS_<SECTION>_<FIELD>`, except logging which uses
/// `GATEPASS_LOG_LEVEL` and `GATEPASS_LOG_FORMAT`.
pub struct EnvSource;

impl ConfigSource for EnvSource {
	fn name(&self) -> &'static str {
		"environment"
	}

	fn precedence(&self) -> Precedence {
		Precedence::Environment
	}

	fn load(&self) -> Result<GatepassConfigLayer, ConfigError> {
		debug!("loading environment variables");
		load_from_lookup(&|key: &str| std::env::var(key).ok())
	}
}

type Lookup<'a> = &'a dyn Fn(&str) -> Option<String>;

pub(crate) fn load_from_lookup(lookup: Lookup<'_>) -> Result<GatepassConfigLayer, ConfigError> {
	let vars = Vars(lookup);
	Ok(GatepassConfigLayer {
		telegram: Some(load_telegram(&vars)?),
		gateway: Some(load_gateway(&vars)?),
		endpoint: Some(load_endpoint(&vars)?),
		database: Some(DatabaseConfigLayer {
			url: vars.string("GATEPASS_DATABASE_URL"),
		}),
		reconcile: Some(load_reconcile(&vars)?),
		logging: Some(load_logging(&vars)?),
	})
}

struct Vars<'a>(Lookup<'a>);

impl Vars<'_> {
	fn string(&self, name: &str) -> Option<String> {
		(self.0)(name).filter(|s| !s.is_empty())
	}

	fn bool(&self, name: &str) -> Result<Option<bool>, ConfigError> {
		match self.string(name) {
			Some(v) => match v.to_ascii_lowercase().as_str() {
				"1" | "true" | "yes" | "on" => Ok(Some(true)),
				"0" | "false" | "no" | "off" => Ok(Some(false)),
				_ => Err(invalid(name, format!("invalid boolean value '{v}'"))),
			},
			None => Ok(None),
		}
	}

	fn parse<T: std::str::FromStr>(&self, name: &str) -> Result<Option<T>, ConfigError> {
		match self.string(name) {
			Some(v) => v.trim().parse().map(Some).map_err(|_| {
				invalid(
					name,
					format!("invalid {} value '{v}'", std::any::type_name::<T>()),
				)
			}),
			None => Ok(None),
		}
	}
}

fn invalid(key: &str, message: String) -> ConfigError {
	ConfigError::InvalidValue {
		key: key.to_string(),
		message,
	}
}

fn load_telegram(vars: &Vars<'_>) -> Result<TelegramConfigLayer, ConfigError> {
	let bot_token = load_secret_with("GATEPASS_TELEGRAM_BOT_TOKEN", |key| (vars.0)(key))
		.map_err(|e| ConfigError::Secret(e.to_string()))?;

	Ok(TelegramConfigLayer {
		bot_token,
		channel: vars.string("GATEPASS_TELEGRAM_CHANNEL"),
		api_base_url: vars.string("GATEPASS_TELEGRAM_API_BASE_URL"),
		poll_timeout_secs: vars.parse("GATEPASS_TELEGRAM_POLL_TIMEOUT_SECS")?,
		max_concurrent_handlers: vars.parse("GATEPASS_TELEGRAM_MAX_CONCURRENT_HANDLERS")?,
	})
}

fn load_gateway(vars: &Vars<'_>) -> Result<GatewayConfigLayer, ConfigError> {
	Ok(GatewayConfigLayer {
		api_address: vars.string("GATEPASS_GATEWAY_API_ADDRESS"),
		inbound_tag: vars.string("GATEPASS_GATEWAY_INBOUND_TAG"),
		flow: vars.string("GATEPASS_GATEWAY_FLOW"),
		label_realm: vars.string("GATEPASS_GATEWAY_LABEL_REALM"),
		config_path: vars.string("GATEPASS_GATEWAY_CONFIG_PATH").map(PathBuf::from),
		xray_binary: vars.string("GATEPASS_GATEWAY_XRAY_BINARY"),
		service_name: vars.string("GATEPASS_GATEWAY_SERVICE_NAME"),
		bootstrap_api: vars.bool("GATEPASS_GATEWAY_BOOTSTRAP_API")?,
	})
}

fn load_endpoint(vars: &Vars<'_>) -> Result<EndpointConfigLayer, ConfigError> {
	Ok(EndpointConfigLayer {
		domain: vars.string("GATEPASS_ENDPOINT_DOMAIN"),
		port: vars.parse("GATEPASS_ENDPOINT_PORT")?,
	})
}

fn load_reconcile(vars: &Vars<'_>) -> Result<ReconcileConfigLayer, ConfigError> {
	Ok(ReconcileConfigLayer {
		enabled: vars.bool("GATEPASS_RECONCILE_ENABLED")?,
		unit_secs: vars.parse("GATEPASS_RECONCILE_UNIT_SECS")?,
		min_units: vars.parse("GATEPASS_RECONCILE_MIN_UNITS")?,
		max_units: vars.parse("GATEPASS_RECONCILE_MAX_UNITS")?,
	})
}

fn load_logging(vars: &Vars<'_>) -> Result<LoggingConfigLayer, ConfigError> {
	let format = match vars.string("GATEPASS_LOG_FORMAT") {
		Some(v) => Some(
			v.parse::<LogFormat>()
				.map_err(|message| invalid("GATEPASS_LOG_FORMAT", message))?,
		),
		None => None,
	};

	Ok(LoggingConfigLayer {
		level: vars.string("GATEPASS_LOG_LEVEL"),
		format,
	})
}

#[cfg(test)]
pub(crate) mod tests {
	use super::*;
	use std::collections::HashMap;

	pub(crate) fn env_layer(pairs: &[(&str, &str)]) -> Result<GatepassConfigLayer, ConfigError> {
		let map: HashMap<String, String> = pairs
			.iter()
			.map(|(k, v)| (k.to_string(), v.to_string()))
			.collect();
		load_from_lookup(&move |key: &str| map.get(key).cloned())
	}

	#[test]
	fn test_precedence_ordering() {
		assert!(Precedence::Environment > Precedence::ConfigFile);
		assert!(Precedence::ConfigFile > Precedence::Defaults);
	}

	#[test]
	fn test_defaults_source_returns_empty_layer() {
		let layer = DefaultsSource.load().unwrap();
		assert!(layer.telegram.is_none());
		assert!(layer.gateway.is_none());
	}

	#[test]
	fn test_system_toml_missing_file_returns_empty() {
		let source = TomlSource {
			path: PathBuf::from("/nonexistent/gatepass.toml"),
			required: false,
		};
		assert!(source.load().unwrap().gateway.is_none());
	}

	#[test]
	fn test_explicit_toml_missing_file_is_error() {
		let result = TomlSource::new("/nonexistent/gatepass.toml").load();
		assert!(matches!(result, Err(ConfigError::FileRead { .. })));
	}

	#[test]
	fn test_env_values() {
		let layer = env_layer(&[
			("GATEPASS_TELEGRAM_BOT_TOKEN", "1:abc"),
			("GATEPASS_GATEWAY_INBOUND_TAG", "vless_b"),
			("GATEPASS_GATEWAY_BOOTSTRAP_API", "false"),
			("GATEPASS_ENDPOINT_PORT", "8443"),
			("GATEPASS_RECONCILE_MAX_UNITS", "6"),
			("GATEPASS_LOG_FORMAT", "json"),
		])
		.unwrap();

		assert_eq!(
			layer.telegram.unwrap().bot_token.unwrap().expose(),
			"1:abc"
		);
		let gateway = layer.gateway.unwrap();
		assert_eq!(gateway.inbound_tag.as_deref(), Some("vless_b"));
		assert_eq!(gateway.bootstrap_api, Some(false));
		assert_eq!(layer.endpoint.unwrap().port, Some(8443));
		assert_eq!(layer.reconcile.unwrap().max_units, Some(6));
		assert_eq!(layer.logging.unwrap().format, Some(LogFormat::Json));
	}

	#[test]
	fn test_env_invalid_number() {
		let err = env_layer(&[("GATEPASS_ENDPOINT_PORT", "https")]).unwrap_err();
		match err {
			ConfigError::InvalidValue { key, .. } => assert_eq!(key, "GATEPASS_ENDPOINT_PORT"),
			other => panic!("unexpected error: {other}"),
		}
	}

	#[test]
	fn test_env_invalid_bool() {
		assert!(env_layer(&[("GATEPASS_RECONCILE_ENABLED", "maybe")]).is_err());
	}
}
