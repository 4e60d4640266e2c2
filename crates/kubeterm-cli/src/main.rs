// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

mod chord;
mod console;
mod exec;
mod target_args;

use std::fmt::Write as _;
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Mutex;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use kubeterm_config::{
	chord_prefix_label, config_warnings, load_config_with_cli, CliOverrides, KubetermConfig, LogFormat,
	LoggingConfig,
};
use kubeterm_session::{SessionTarget, VirtualKey};
use tracing::{info, warn};
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::chord::{letter_for, DETACH_LETTER};
use crate::target_args::TargetArgs;

#[derive(Parser, Debug)]
#[command(name = "kubeterm", version, about = "Interactive shells in Kubernetes pods", long_about = None)]
struct Args {
	/// Path to an additional configuration file
	#[arg(long, global = true)]
	config: Option<PathBuf>,

	/// Dashboard base URL (overrides config)
	#[arg(long, env = "KUBETERM_SERVER_URL", global = true)]
	server_url: Option<String>,

	/// Log level (overrides config)
	#[arg(long, global = true)]
	log_level: Option<String>,

	/// Output logs as JSON (overrides config)
	#[arg(long, global = true)]
	json_logs: bool,

	#[command(subcommand)]
	command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
	/// Open an interactive shell in a pod
	Exec {
		#[command(flatten)]
		target: TargetArgs,
	},
	/// Print the exec socket URL for a pod without connecting
	Url {
		#[command(flatten)]
		target: TargetArgs,
	},
	/// List the virtual keyboard keys and their chord letters
	Keys,
	/// Print the effective configuration as TOML (secrets redacted)
	Config,
	/// Show version information
	Version,
}

impl Command {
	fn name(&self) -> &'static str {
		match self {
			Command::Exec { .. } => "exec",
			Command::Url { .. } => "url",
			Command::Keys => "keys",
			Command::Config => "config",
			Command::Version => "version",
		}
	}
}

impl From<&Args> for CliOverrides {
	fn from(args: &Args) -> Self {
		Self {
			server_url: args.server_url.clone(),
			config_file: args.config.clone(),
			log_level: args.log_level.clone(),
			log_format: args.json_logs.then(|| "json".to_string()),
		}
	}
}

/// Exit status for a target that is missing required fields.
const USAGE_ERROR: u8 = 2;

#[tokio::main]
async fn main() -> Result<ExitCode> {
	let args = Args::parse();

	let config = load_config_with_cli(CliOverrides::from(&args))
		.context("failed to load configuration")?;

	// The exec session owns the terminal, so its logs go to a file.
	let log_file = matches!(args.command, Command::Exec { .. }).then(|| config.log_file());
	init_tracing(&config.logging, log_file.as_deref())?;

	for warning in config_warnings(&config) {
		warn!("{warning}");
	}

	info!(
		command = args.command.name(),
		server = %config.server.base_url,
		"starting kubeterm"
	);

	match &args.command {
		Command::Exec { target } => {
			let endpoint = target.endpoint(&config)?;
			let target = target.resolve(&config.session);
			if reject_incomplete(&target) {
				return Ok(ExitCode::from(USAGE_ERROR));
			}
			exec::run(&config, &endpoint, target).await
		}
		Command::Url { target } => {
			let endpoint = target.endpoint(&config)?;
			let target = target.resolve(&config.session);
			if reject_incomplete(&target) {
				return Ok(ExitCode::from(USAGE_ERROR));
			}
			println!("{}", endpoint.exec_url(&target));
			Ok(ExitCode::SUCCESS)
		}
		Command::Keys => {
			print!("{}", format_keys(config.session.chord_prefix));
			Ok(ExitCode::SUCCESS)
		}
		Command::Config => {
			print!("{}", render_config(&config)?);
			Ok(ExitCode::SUCCESS)
		}
		Command::Version => {
			println!("{}", format_version_info());
			Ok(ExitCode::SUCCESS)
		}
	}
}

/// Report a target with missing fields; no connection is attempted.
fn reject_incomplete(target: &SessionTarget) -> bool {
	let Err(err) = target.validate() else {
		return false;
	};
	let missing = target.missing_fields();
	warn!(?missing, "session target incomplete");
	eprintln!("kubeterm: {err}");
	eprintln!("  missing: {}", missing.join(", "));
	eprintln!("  pass --context, --namespace and --pod, or --link with a dashboard URL");
	true
}

fn init_tracing(logging: &LoggingConfig, file: Option<&Path>) -> Result<()> {
	let filter = EnvFilter::try_from_default_env()
		.unwrap_or_else(|_| EnvFilter::new(format!("kubeterm={}", logging.level)));

	let writer = match file {
		Some(path) => {
			if let Some(dir) = path.parent() {
				std::fs::create_dir_all(dir)
					.with_context(|| format!("failed to create log directory {}", dir.display()))?;
			}
			let file = OpenOptions::new()
				.create(true)
				.append(true)
				.open(path)
				.with_context(|| format!("failed to open log file {}", path.display()))?;
			BoxMakeWriter::new(Mutex::new(file))
		}
		None => BoxMakeWriter::new(std::io::stderr),
	};
	let ansi = file.is_none();

	match logging.format {
		LogFormat::Json => {
			tracing_subscriber::registry()
				.with(filter)
				.with(fmt::layer().json().with_writer(writer))
				.init();
		}
		LogFormat::Compact => {
			tracing_subscriber::registry()
				.with(filter)
				.with(fmt::layer().compact().with_ansi(ansi).with_writer(writer))
				.init();
		}
		LogFormat::Pretty => {
			tracing_subscriber::registry()
				.with(filter)
				.with(fmt::layer().with_ansi(ansi).with_writer(writer))
				.init();
		}
	}
	Ok(())
}

fn format_keys(prefix: u8) -> String {
	let prefix = chord_prefix_label(prefix);
	let mut out = format!("Press {prefix} then a letter during `kubeterm exec`.\n\n");
	let _ = writeln!(out, "{:<8} {:<8} BYTES", "KEY", "CHORD");
	for key in VirtualKey::ALL {
		let letter = letter_for(key).map(String::from).unwrap_or_default();
		let bytes = key
			.bytes()
			.iter()
			.map(|b| format!("{b:02x}"))
			.collect::<Vec<_>>()
			.join(" ");
		let _ = writeln!(out, "{:<8} {:<8} {bytes}", key.label(), letter);
	}
	let _ = writeln!(out, "{:<8} {:<8} detach", "", DETACH_LETTER);
	let _ = writeln!(out, "{:<8} {:<8} send {prefix} itself", "", prefix);
	out
}

fn render_config(config: &KubetermConfig) -> Result<String> {
	toml::to_string_pretty(config).context("failed to render configuration")
}

fn format_version_info() -> String {
	format!(
		"kubeterm {}\nPlatform: {}-{}",
		env!("CARGO_PKG_VERSION"),
		std::env::consts::OS,
		std::env::consts::ARCH,
	)
}
