// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! gatepass daemon binary.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

mod app;
mod logging;
mod version;

use app::App;

/// gatepass - Telegram channel membership gate for an Xray VLESS gateway.
#[derive(Parser, Debug)]
#[command(name = "gatepass", about = "Channel-gated VLESS access", version)]
struct Args {
	/// Config file to read instead of /etc/gatepass/gatepass.toml.
	#[arg(long, short = 'c', env = "GATEPASS_CONFIG")]
	config: Option<PathBuf>,

	#[command(subcommand)]
	command: Option<Command>,
}

#[derive(Subcommand, Debug, Default)]
enum Command {
	/// Run the bot and the reconciliation loop (default)
	#[default]
	Serve,
	/// Show version and build information
	Version,
	/// Run one reconciliation cycle now and exit
	Scan,
	/// Print stored identities (without credentials)
	List,
}

#[tokio::main]
async fn main() -> Result<()> {
	let args = Args::parse();
	let command = args.command.unwrap_or_default();

	if let Command::Version = command {
		println!("{}", version::format_version_info());
		return Ok(());
	}

	dotenvy::dotenv().ok();

	let config = match &args.config {
		Some(path) => gatepass_config::load_config_with_file(path),
		None => gatepass_config::load_config(),
	}
	.context("loading configuration")?;

	logging::init(&config.logging);
	tracing::info!(
		version = env!("CARGO_PKG_VERSION"),
		command = ?command,
		database = %config.database.url,
		"starting gatepass"
	);

	let app = App::build(config).await?;
	match command {
		Command::Serve => app.serve(shutdown_signal()).await,
		Command::Scan => app.scan().await,
		Command::List => app.list().await,
		Command::Version => Ok(()),
	}
}

/// Resolves on Ctrl-C or, on Unix, SIGTERM.
async fn shutdown_signal() {
	let ctrl_c = async {
		if let Err(e) = tokio::signal::ctrl_c().await {
			tracing::error!(error = %e, "failed to listen for Ctrl-C");
			std::future::pending::<()>().await;
		}
	};

	#[cfg(unix)]
	let terminate = async {
		match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
			Ok(mut signal) => {
				signal.recv().await;
			}
			Err(e) => {
				tracing::error!(error = %e, "failed to listen for SIGTERM");
				std::future::pending::<()>().await;
			}
		}
	};

	#[cfg(not(unix))]
	let terminate = std::future::pending::<()>();

	tokio::select! {
		_ = ctrl_c => {}
		_ = terminate => {}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_default_command_is_serve() {
		let args = Args::try_parse_from(["gatepass"]).unwrap();
		assert!(args.command.is_none());
		assert!(matches!(args.command.unwrap_or_default(), Command::Serve));
	}

	#[test]
	fn test_config_flag_and_subcommand() {
		let args = Args::try_parse_from(["gatepass", "--config", "/tmp/g.toml", "scan"]).unwrap();
		assert_eq!(args.config, Some(PathBuf::from("/tmp/g.toml")));
		assert!(matches!(args.command, Some(Command::Scan)));
	}

	#[test]
	fn test_cli_definition_is_valid() {
		use clap::CommandFactory;
		Args::command().debug_assert();
	}
}
