// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Runtime configuration types with resolved defaults.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::path::PathBuf;
use std::time::Duration;

use crate::layer::*;
use crate::paths::PathsConfig;
use crate::secret::SecretString;
use crate::ConfigError;

pub const DEFAULT_BASE_URL: &str = "http://localhost:8080";
pub const DEFAULT_EXEC_PATH: &str = "/api/exec";
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;
/// Ctrl+]
pub const DEFAULT_CHORD_PREFIX: u8 = 0x1d;

/// The final, validated configuration for kubeterm.
#[derive(Debug, Clone, Serialize)]
pub struct KubetermConfig {
	pub server: ServerConfig,
	pub session: SessionConfig,
	pub logging: LoggingConfig,

	/// Resolved XDG paths (not serialized)
	#[serde(skip)]
	pub paths: PathsConfig,
}

#[derive(Debug, Clone, Serialize)]
pub struct ServerConfig {
	pub base_url: String,
	pub exec_path: String,
	pub token: Option<SecretString>,
	pub connect_timeout_secs: u64,
}

impl ServerConfig {
	pub fn connect_timeout(&self) -> Duration {
		Duration::from_secs(self.connect_timeout_secs)
	}
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
	pub default_context: Option<String>,
	pub default_namespace: Option<String>,
	/// Control byte that starts a key chord in `kubeterm exec`.
	#[serde(serialize_with = "serialize_chord", deserialize_with = "deserialize_chord")]
	pub chord_prefix: u8,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
	pub level: LogLevel,
	pub file: Option<PathBuf>,
	pub format: LogFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
	Error,
	Warn,
	#[default]
	Info,
	Debug,
	Trace,
}

impl LogLevel {
	pub fn as_str(&self) -> &'static str {
		match self {
			LogLevel::Error => "error",
			LogLevel::Warn => "warn",
			LogLevel::Info => "info",
			LogLevel::Debug => "debug",
			LogLevel::Trace => "trace",
		}
	}
}

impl std::fmt::Display for LogLevel {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.write_str(self.as_str())
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
	#[default]
	Pretty,
	Json,
	Compact,
}

impl Default for ServerConfig {
	fn default() -> Self {
		Self {
			base_url: DEFAULT_BASE_URL.to_string(),
			exec_path: DEFAULT_EXEC_PATH.to_string(),
			token: None,
			connect_timeout_secs: DEFAULT_CONNECT_TIMEOUT_SECS,
		}
	}
}

impl Default for SessionConfig {
	fn default() -> Self {
		Self {
			default_context: None,
			default_namespace: None,
			chord_prefix: DEFAULT_CHORD_PREFIX,
		}
	}
}

impl Default for LoggingConfig {
	fn default() -> Self {
		Self {
			level: LogLevel::Info,
			file: None,
			format: LogFormat::Pretty,
		}
	}
}

impl KubetermConfig {
	/// Build runtime config from a merged layer, applying defaults.
	pub fn from_layer(layer: ConfigLayer, paths: PathsConfig) -> Result<Self, ConfigError> {
		let server = build_server_config(layer.server);
		let session = build_session_config(layer.session)?;
		let logging = build_logging_config(layer.logging)?;

		Ok(Self {
			server,
			session,
			logging,
			paths,
		})
	}

	/// Where logs go while a session owns the terminal.
	pub fn log_file(&self) -> PathBuf {
		self
			.logging
			.file
			.clone()
			.unwrap_or_else(|| self.paths.log_file())
	}
}

fn build_server_config(layer: Option<ServerLayer>) -> ServerConfig {
	let layer = layer.unwrap_or_default();
	let defaults = ServerConfig::default();
	ServerConfig {
		base_url: layer.base_url.unwrap_or(defaults.base_url),
		exec_path: layer.exec_path.unwrap_or(defaults.exec_path),
		token: layer.token,
		connect_timeout_secs: layer
			.connect_timeout_secs
			.unwrap_or(defaults.connect_timeout_secs),
	}
}

fn build_session_config(layer: Option<SessionLayer>) -> Result<SessionConfig, ConfigError> {
	let layer = layer.unwrap_or_default();
	let chord_prefix = match layer.chord_prefix.as_deref() {
		Some(s) => parse_chord_prefix(s)?,
		None => DEFAULT_CHORD_PREFIX,
	};
	Ok(SessionConfig {
		default_context: non_blank(layer.default_context),
		default_namespace: non_blank(layer.default_namespace),
		chord_prefix,
	})
}

fn non_blank(value: Option<String>) -> Option<String> {
	value.filter(|v| !v.trim().is_empty())
}

fn build_logging_config(layer: Option<LoggingLayer>) -> Result<LoggingConfig, ConfigError> {
	let layer = layer.unwrap_or_default();
	Ok(LoggingConfig {
		level: parse_log_level(layer.level.as_deref())?,
		file: layer.file,
		format: parse_log_format(layer.format.as_deref())?,
	})
}

fn parse_log_level(s: Option<&str>) -> Result<LogLevel, ConfigError> {
	match s.map(str::to_ascii_lowercase).as_deref() {
		Some("error") => Ok(LogLevel::Error),
		Some("warn") => Ok(LogLevel::Warn),
		Some("info") | None => Ok(LogLevel::Info),
		Some("debug") => Ok(LogLevel::Debug),
		Some("trace") => Ok(LogLevel::Trace),
		Some(other) => Err(ConfigError::invalid_value(
			"logging.level",
			format!("unknown level {other:?}; expected error, warn, info, debug or trace"),
		)),
	}
}

fn parse_log_format(s: Option<&str>) -> Result<LogFormat, ConfigError> {
	match s.map(str::to_ascii_lowercase).as_deref() {
		Some("json") => Ok(LogFormat::Json),
		Some("compact") => Ok(LogFormat::Compact),
		Some("pretty") | None => Ok(LogFormat::Pretty),
		Some(other) => Err(ConfigError::invalid_value(
			"logging.format",
			format!("unknown format {other:?}; expected pretty, compact or json"),
		)),
	}
}

/// Parse a control-key chord prefix such as `ctrl-]`, `Ctrl+A` or `^]`.
pub fn parse_chord_prefix(s: &str) -> Result<u8, ConfigError> {
	let lower = s.trim().to_ascii_lowercase();
	let key = lower
		.strip_prefix("ctrl-")
		.or_else(|| lower.strip_prefix("ctrl+"))
		.or_else(|| lower.strip_prefix('^'));

	let invalid = || {
		ConfigError::invalid_value(
			"session.chord_prefix",
			format!("expected a control key like \"ctrl-]\" or \"^a\", got {s:?}"),
		)
	};

	let mut chars = key.ok_or_else(invalid)?.chars();
	match (chars.next(), chars.next()) {
		(Some(c), None) if c.is_ascii_lowercase() || "[\\]^_".contains(c) => {
			Ok((c.to_ascii_uppercase() as u8) & 0x1f)
		}
		_ => Err(invalid()),
	}
}

/// Render a control byte the way [`parse_chord_prefix`] accepts it.
pub fn chord_prefix_label(byte: u8) -> String {
	match byte {
		0x01..=0x1a => format!("ctrl-{}", (byte + b'a' - 1) as char),
		_ => format!("ctrl-{}", (byte | 0x40) as char),
	}
}

fn serialize_chord<S>(byte: &u8, serializer: S) -> Result<S::Ok, S::Error>
where
	S: Serializer,
{
	serializer.serialize_str(&chord_prefix_label(*byte))
}

fn deserialize_chord<'de, D>(deserializer: D) -> Result<u8, D::Error>
where
	D: Deserializer<'de>,
{
	let s = String::deserialize(deserializer)?;
	parse_chord_prefix(&s).map_err(serde::de::Error::custom)
}
