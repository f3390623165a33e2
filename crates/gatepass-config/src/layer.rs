// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Partial configuration produced by each source, merged in precedence order.

use serde::Deserialize;

use crate::sections::{
	DatabaseConfigLayer, EndpointConfigLayer, GatewayConfigLayer, LoggingConfigLayer,
	ReconcileConfigLayer, TelegramConfigLayer,
};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GatepassConfigLayer {
	#[serde(default)]
	pub telegram: Option<TelegramConfigLayer>,
	#[serde(default)]
	pub gateway: Option<GatewayConfigLayer>,
	#[serde(default)]
	pub endpoint: Option<EndpointConfigLayer>,
	#[serde(default)]
	pub database: Option<DatabaseConfigLayer>,
	#[serde(default)]
	pub reconcile: Option<ReconcileConfigLayer>,
	#[serde(default)]
	pub logging: Option<LoggingConfigLayer>,
}

macro_rules! merge_section {
	($self:ident, $other:ident, $($field:ident),+) => {
		$(
			if let Some(theirs) = $other.$field {
				$self.$field.get_or_insert_with(Default::default).merge(theirs);
			}
		)+
	};
}

impl GatepassConfigLayer {
	/// Fields set in `other` win over fields set in `self`.
	pub fn merge(&mut self, other: GatepassConfigLayer) {
		merge_section!(self, other, telegram, gateway, endpoint, database, reconcile, logging);
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_merge_nested_sections() {
		let mut base: GatepassConfigLayer = toml::from_str(
			r#"
			[gateway]
			inbound_tag = "vless_a"
			flow = "flow-a"

			[reconcile]
			max_units = 5
			"#,
		)
		.unwrap();
		let overlay: GatepassConfigLayer = toml::from_str(
			r#"
			[gateway]
			flow = "flow-b"

			[database]
			url = "sqlite::memory:"
			"#,
		)
		.unwrap();

		base.merge(overlay);

		let gateway = base.gateway.unwrap().finalize();
		assert_eq!(gateway.inbound_tag, "vless_a");
		assert_eq!(gateway.flow, "flow-b");
		assert_eq!(base.reconcile.unwrap().max_units, Some(5));
		assert_eq!(base.database.unwrap().url.as_deref(), Some("sqlite::memory:"));
	}

	#[test]
	fn test_unknown_section_rejected() {
		let result: Result<GatepassConfigLayer, _> = toml::from_str("[metrics]\nenabled = true\n");
		assert!(result.is_err());
	}

	#[test]
	fn test_unknown_section_key_rejected() {
		let result: Result<GatepassConfigLayer, _> =
			toml::from_str("[gateway]\ninbound_tga = \"vless_typo\"\n");
		let err = result.unwrap_err();
		assert!(err.to_string().contains("inbound_tga"));
	}
}
