// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Enables the gateway's control API in its static configuration.
//!
//! A stock Xray config has no API listener, which leaves the control channel
//! strategy permanently failing. At startup we add the four pieces the
//! listener needs (`api` section, dokodemo-door inbound, routing rule,
//! freedom outbound) if the `api` section is missing. The gateway picks them
//! up on its next restart.

use std::path::Path;

use serde_json::{json, Map, Value};
use tracing::{info, instrument};

use crate::document;
use crate::error::{GatewayError, Result};

const API_TAG: &str = "api";

/// Adds the control API sections to `doc` unless an `api` section already
/// exists. Returns whether the document changed.
pub fn ensure_api_section(doc: &mut Value, api_address: &str) -> Result<bool> {
	let (host, port) = split_address(api_address)?;
	let root = doc
		.as_object_mut()
		.ok_or_else(|| GatewayError::MalformedDocument("config root is not an object".to_string()))?;

	if root.contains_key("api") {
		return Ok(false);
	}

	root.insert(
		"api".to_string(),
		json!({
			"tag": API_TAG,
			"services": ["HandlerService", "StatsService"],
		}),
	);

	array_entry(root, "inbounds")?.push(json!({
		"listen": host,
		"port": port,
		"protocol": "dokodemo-door",
		"settings": {"address": host},
		"tag": API_TAG,
	}));

	let routing = root
		.entry("routing")
		.or_insert_with(|| Value::Object(Map::new()))
		.as_object_mut()
		.ok_or_else(|| GatewayError::MalformedDocument("routing is not an object".to_string()))?;
	array_entry(routing, "rules")?.insert(
		0,
		json!({
			"inboundTag": [API_TAG],
			"outboundTag": API_TAG,
			"type": "field",
		}),
	);

	array_entry(root, "outbounds")?.push(json!({
		"protocol": "freedom",
		"tag": API_TAG,
	}));

	Ok(true)
}

/// Loads the config at `path`, adds the control API if missing and writes
/// it back. Returns whether the file changed.
#[instrument(skip(api_address), fields(path = %path.display()))]
pub async fn bootstrap_api(path: &Path, api_address: &str) -> Result<bool> {
	let mut doc = document::load(path).await?;
	if !ensure_api_section(&mut doc, api_address)? {
		return Ok(false);
	}
	document::save(path, &doc).await?;
	info!(
		path = %path.display(),
		address = api_address,
		"control API added to gateway config; restart the gateway to enable it"
	);
	Ok(true)
}

fn array_entry<'a>(obj: &'a mut Map<String, Value>, key: &str) -> Result<&'a mut Vec<Value>> {
	obj
		.entry(key)
		.or_insert_with(|| Value::Array(Vec::new()))
		.as_array_mut()
		.ok_or_else(|| GatewayError::MalformedDocument(format!("{key} is not an array")))
}

fn split_address(address: &str) -> Result<(&str, u16)> {
	address
		.rsplit_once(':')
		.and_then(|(host, port)| port.parse().ok().map(|port| (host, port)))
		.ok_or_else(|| GatewayError::MalformedDocument(format!("invalid API address {address}")))
}
