// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Read-modify-write helpers for the gateway's JSON configuration.
//!
//! The document is kept as a [`serde_json::Value`] so sections this crate
//! does not understand are written back untouched.

use std::path::Path;

use gatepass_core::GatewayClient;
use serde_json::Value;
use tracing::trace;

use crate::error::{GatewayError, Result};

pub async fn load(path: &Path) -> Result<Value> {
	let content = tokio::fs::read_to_string(path)
		.await
		.map_err(|e| GatewayError::ConfigRead {
			path: path.to_path_buf(),
			source: e,
		})?;

	serde_json::from_str(&content).map_err(|e| GatewayError::ConfigParse {
		path: path.to_path_buf(),
		source: e,
	})
}

/// Writes the document with two-space indentation via a temp file and rename.
pub async fn save(path: &Path, doc: &Value) -> Result<()> {
	let mut content = serde_json::to_string_pretty(doc)
		.map_err(|e| GatewayError::MalformedDocument(e.to_string()))?;
	content.push('\n');

	let tmp = path.with_extension("json.tmp");
	tokio::fs::write(&tmp, content)
		.await
		.map_err(|e| GatewayError::ConfigWrite {
			path: tmp.clone(),
			source: e,
		})?;
	tokio::fs::rename(&tmp, path)
		.await
		.map_err(|e| GatewayError::ConfigWrite {
			path: path.to_path_buf(),
			source: e,
		})?;

	trace!(path = %path.display(), "gateway config written");
	Ok(())
}

/// Client list of the inbound carrying `tag`, created empty if the inbound
/// has none yet.
fn clients_mut<'a>(doc: &'a mut Value, tag: &str) -> Result<&'a mut Vec<Value>> {
	let inbounds = doc
		.get_mut("inbounds")
		.and_then(Value::as_array_mut)
		.ok_or_else(|| GatewayError::MalformedDocument("missing inbounds array".to_string()))?;

	let inbound = inbounds
		.iter_mut()
		.find(|inbound| inbound.get("tag").and_then(Value::as_str) == Some(tag))
		.ok_or_else(|| GatewayError::InboundNotFound(tag.to_string()))?;

	let inbound = inbound
		.as_object_mut()
		.ok_or_else(|| GatewayError::MalformedDocument(format!("inbound {tag} is not an object")))?;
	let settings = inbound
		.entry("settings")
		.or_insert_with(|| Value::Object(Default::default()))
		.as_object_mut()
		.ok_or_else(|| GatewayError::MalformedDocument(format!("inbound {tag} settings is not an object")))?;

	settings
		.entry("clients")
		.or_insert_with(|| Value::Array(Vec::new()))
		.as_array_mut()
		.ok_or_else(|| GatewayError::MalformedDocument(format!("inbound {tag} clients is not an array")))
}

fn has_label(client: &Value, label: &str) -> bool {
	client.get("email").and_then(Value::as_str) == Some(label)
}

/// Appends `client` to the inbound's client list.
///
/// # Errors
/// `DuplicateLabel` if a client with the same label is already present.
pub fn add_client(doc: &mut Value, tag: &str, client: &GatewayClient) -> Result<()> {
	let clients = clients_mut(doc, tag)?;
	if clients.iter().any(|c| has_label(c, &client.label)) {
		return Err(GatewayError::DuplicateLabel(client.label.clone()));
	}
	clients.push(client.to_json());
	Ok(())
}

/// Removes every client carrying `label`. Returns whether anything changed.
pub fn remove_client(doc: &mut Value, tag: &str, label: &str) -> Result<bool> {
	let clients = clients_mut(doc, tag)?;
	let before = clients.len();
	clients.retain(|c| !has_label(c, label));
	Ok(clients.len() != before)
}
