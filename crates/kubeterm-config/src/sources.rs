// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Configuration sources: files, environment, CLI, defaults.

use std::collections::HashMap;
use std::path::PathBuf;

use tracing::{debug, trace};

use crate::layer::ConfigLayer;
use crate::paths::{workspace_config_path, PathsConfig, SYSTEM_CONFIG_FILE};
use crate::secret::{Secret, SecretString};
use crate::ConfigError;

/// Source precedence levels (higher = overrides lower).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Precedence {
	Defaults = 10,
	SystemFile = 20,
	UserFile = 30,
	WorkspaceFile = 40,
	ExplicitFile = 45,
	Environment = 50,
	Cli = 60,
}

/// Trait for configuration sources.
pub trait ConfigSource: Send + Sync {
	/// Name for logging
	fn name(&self) -> &'static str;

	/// Precedence level
	fn precedence(&self) -> Precedence;

	/// Load configuration layer from this source
	fn load(&self) -> Result<ConfigLayer, ConfigError>;
}

/// Built-in defaults source.
pub struct DefaultsSource;

impl ConfigSource for DefaultsSource {
	fn name(&self) -> &'static str {
		"defaults"
	}
	fn precedence(&self) -> Precedence {
		Precedence::Defaults
	}

	fn load(&self) -> Result<ConfigLayer, ConfigError> {
		debug!("loading defaults");
		// Defaults are applied when the runtime config is built.
		Ok(ConfigLayer::default())
	}
}

/// File-based configuration source (TOML).
pub struct FileSource {
	path: PathBuf,
	precedence: Precedence,
	name: &'static str,
	required: bool,
}

impl FileSource {
	/// System config: /etc/kubeterm/config.toml
	pub fn system() -> Self {
		Self::custom(
			PathBuf::from(SYSTEM_CONFIG_FILE),
			Precedence::SystemFile,
			"system-config",
		)
	}

	/// User config: ~/.config/kubeterm/config.toml
	pub fn user(paths: &PathsConfig) -> Self {
		Self::custom(
			paths.user_config_file.clone(),
			Precedence::UserFile,
			"user-config",
		)
	}

	/// Workspace config: .kubeterm/config.toml
	pub fn workspace() -> Result<Self, ConfigError> {
		Ok(Self::custom(
			workspace_config_path()?,
			Precedence::WorkspaceFile,
			"workspace-config",
		))
	}

	/// File named with `--config`. Unlike the discovered files it must exist.
	pub fn explicit(path: PathBuf) -> Self {
		Self {
			required: true,
			..Self::custom(path, Precedence::ExplicitFile, "explicit-config")
		}
	}

	/// Custom file path with specified precedence
	pub fn custom(path: PathBuf, precedence: Precedence, name: &'static str) -> Self {
		Self {
			path,
			precedence,
			name,
			required: false,
		}
	}
}

impl ConfigSource for FileSource {
	fn name(&self) -> &'static str {
		self.name
	}
	fn precedence(&self) -> Precedence {
		self.precedence
	}

	fn load(&self) -> Result<ConfigLayer, ConfigError> {
		if !self.path.exists() {
			if self.required {
				return Err(ConfigError::FileNotFound(self.path.clone()));
			}
			debug!(path = %self.path.display(), source = self.name, "config file not found, skipping");
			return Ok(ConfigLayer::default());
		}

		debug!(path = %self.path.display(), source = self.name, "loading config file");

		let content = match std::fs::read_to_string(&self.path) {
			Ok(content) => content,
			Err(source) if self.required => {
				return Err(ConfigError::Unreadable {
					path: self.path.clone(),
					source,
				});
			}
			Err(e) => return Err(e.into()),
		};
		let layer: ConfigLayer = toml::from_str(&content).map_err(|e| ConfigError::TomlParse {
			path: self.path.clone(),
			source: e,
		})?;

		trace!(source = self.name, "parsed config layer");
		Ok(layer)
	}
}

/// Environment variable source.
///
/// Reads `KUBETERM_*` variables. The token may also be supplied as a file via
/// `KUBETERM_TOKEN_FILE`, which wins over `KUBETERM_TOKEN`.
pub struct EnvSource {
	vars: Option<HashMap<String, String>>,
}

impl EnvSource {
	/// Read from the process environment.
	pub fn new() -> Self {
		Self { vars: None }
	}

	/// Read from a fixed set of variables instead of the process environment.
	pub fn from_vars<I, K, V>(vars: I) -> Self
	where
		I: IntoIterator<Item = (K, V)>,
		K: Into<String>,
		V: Into<String>,
	{
		Self {
			vars: Some(
				vars
					.into_iter()
					.map(|(k, v)| (k.into(), v.into()))
					.collect(),
			),
		}
	}

	fn var(&self, key: &str) -> Option<String> {
		match &self.vars {
			Some(vars) => vars.get(key).cloned(),
			None => std::env::var(key).ok(),
		}
	}

	fn prefixed_vars(&self) -> Vec<(String, String)> {
		let all: Vec<(String, String)> = match &self.vars {
			Some(vars) => vars.iter().map(|(k, v)| (k.clone(), v.clone())).collect(),
			None => std::env::vars().collect(),
		};
		all
			.into_iter()
			.filter(|(k, _)| k.starts_with("KUBETERM_"))
			.collect()
	}

	/// Load a secret from `VAR_FILE` (contents, trailing line ending stripped) or `VAR`.
	fn load_secret(&self, var: &str) -> Result<Option<SecretString>, ConfigError> {
		let file_var = format!("{var}_FILE");

		if let Some(path_str) = self.var(&file_var) {
			if path_str.is_empty() {
				return Err(ConfigError::Env(format!("{file_var} is set but empty")));
			}
			let content = std::fs::read_to_string(&path_str)
				.map_err(|e| ConfigError::Env(format!("{file_var}: cannot read {path_str}: {e}")))?;
			let secret = content.trim_end_matches(['\r', '\n']).to_string();
			return Ok(Some(Secret::new(secret)));
		}

		Ok(self
			.var(var)
			.filter(|v| !v.is_empty())
			.map(Secret::new))
	}
}

impl Default for EnvSource {
	fn default() -> Self {
		Self::new()
	}
}

impl ConfigSource for EnvSource {
	fn name(&self) -> &'static str {
		"environment"
	}
	fn precedence(&self) -> Precedence {
		Precedence::Environment
	}

	fn load(&self) -> Result<ConfigLayer, ConfigError> {
		debug!("loading environment variables");
		let mut layer = ConfigLayer::default();

		if let Some(token) = self.load_secret("KUBETERM_TOKEN")? {
			trace!("loaded API token from environment");
			layer.server_mut().token = Some(token);
		}

		for (key, value) in self.prefixed_vars() {
			let value = value.trim().to_string();
			if value.is_empty() {
				continue;
			}

			trace!(key = %key, "processing env var");

			match key.as_str() {
				"KUBETERM_SERVER_URL" => layer.server_mut().base_url = Some(value),
				"KUBETERM_EXEC_PATH" => layer.server_mut().exec_path = Some(value),
				"KUBETERM_CONNECT_TIMEOUT_SECS" => {
					let secs = value.parse().map_err(|_| {
						ConfigError::invalid_value(
							"KUBETERM_CONNECT_TIMEOUT_SECS",
							format!("expected a whole number of seconds, got {value:?}"),
						)
					})?;
					layer.server_mut().connect_timeout_secs = Some(secs);
				}
				"KUBETERM_CONTEXT" => layer.session_mut().default_context = Some(value),
				"KUBETERM_NAMESPACE" => layer.session_mut().default_namespace = Some(value),
				"KUBETERM_CHORD_PREFIX" => layer.session_mut().chord_prefix = Some(value),
				"KUBETERM_LOG_LEVEL" => layer.logging_mut().level = Some(value),
				"KUBETERM_LOG_FORMAT" => layer.logging_mut().format = Some(value),
				"KUBETERM_LOG_FILE" => layer.logging_mut().file = Some(PathBuf::from(value)),
				_ => {
					// Secrets handled above, or unknown; ignore
				}
			}
		}

		Ok(layer)
	}
}

/// CLI override source.
pub struct CliSource {
	overrides: CliOverrides,
}

/// CLI argument overrides.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
	pub server_url: Option<String>,
	pub config_file: Option<PathBuf>,
	pub log_level: Option<String>,
	pub log_format: Option<String>,
}

impl CliSource {
	pub fn new(overrides: CliOverrides) -> Self {
		Self { overrides }
	}
}

impl ConfigSource for CliSource {
	fn name(&self) -> &'static str {
		"cli"
	}
	fn precedence(&self) -> Precedence {
		Precedence::Cli
	}

	fn load(&self) -> Result<ConfigLayer, ConfigError> {
		debug!("loading CLI overrides");
		let mut layer = ConfigLayer::default();

		if let Some(ref url) = self.overrides.server_url {
			layer.server_mut().base_url = Some(url.clone());
		}

		if let Some(ref level) = self.overrides.log_level {
			layer.logging_mut().level = Some(level.clone());
		}

		if let Some(ref format) = self.overrides.log_format {
			layer.logging_mut().format = Some(format.clone());
		}

		Ok(layer)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::io::Write;

	#[test]
	fn test_precedence_ordering() {
		assert!(Precedence::Cli > Precedence::Environment);
		assert!(Precedence::Environment > Precedence::ExplicitFile);
		assert!(Precedence::ExplicitFile > Precedence::WorkspaceFile);
		assert!(Precedence::WorkspaceFile > Precedence::UserFile);
		assert!(Precedence::UserFile > Precedence::SystemFile);
		assert!(Precedence::SystemFile > Precedence::Defaults);
	}

	#[test]
	fn test_defaults_source_returns_empty_layer() {
		let layer = DefaultsSource.load().unwrap();
		assert!(layer.server.is_none());
		assert!(layer.session.is_none());
		assert!(layer.logging.is_none());
	}

	#[test]
	fn test_file_source_missing_file_returns_empty() {
		let source = FileSource::custom(
			PathBuf::from("/nonexistent/kubeterm.toml"),
			Precedence::UserFile,
			"test",
		);
		assert!(source.load().unwrap().server.is_none());
	}

	#[test]
	fn test_explicit_file_must_exist() {
		let source = FileSource::explicit(PathBuf::from("/nonexistent/kubeterm.toml"));
		assert!(matches!(source.load(), Err(ConfigError::FileNotFound(_))));
	}

	#[test]
	fn test_explicit_file_that_cannot_be_read_is_error() {
		let dir = tempfile::tempdir().unwrap();
		let source = FileSource::explicit(dir.path().to_path_buf());
		match source.load() {
			Err(ConfigError::Unreadable { path, .. }) => assert_eq!(path, dir.path()),
			other => panic!("expected unreadable error, got {other:?}"),
		}
	}

	/// A discovered file that cannot be read is reported as plain I/O, which
	/// the registry skips.
	#[test]
	fn test_discovered_file_that_cannot_be_read_is_io() {
		let dir = tempfile::tempdir().unwrap();
		let source = FileSource::custom(dir.path().to_path_buf(), Precedence::UserFile, "test");
		assert!(matches!(source.load(), Err(ConfigError::Io(_))));
	}

	#[test]
	fn test_file_source_reads_toml() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("config.toml");
		std::fs::write(
			&path,
			"[server]\nbase_url = \"https://dash.example\"\n[session]\ndefault_namespace = \"apps\"\n",
		)
		.unwrap();

		let layer = FileSource::custom(path, Precedence::UserFile, "test")
			.load()
			.unwrap();
		assert_eq!(
			layer.server.unwrap().base_url.as_deref(),
			Some("https://dash.example")
		);
		assert_eq!(
			layer.session.unwrap().default_namespace.as_deref(),
			Some("apps")
		);
	}

	/// Parse errors carry the offending path.
	#[test]
	fn test_file_source_reports_parse_error_with_path() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("config.toml");
		std::fs::write(&path, "[server\nbase_url = ").unwrap();

		match FileSource::custom(path.clone(), Precedence::UserFile, "test").load() {
			Err(ConfigError::TomlParse { path: p, .. }) => assert_eq!(p, path),
			other => panic!("expected parse error, got {other:?}"),
		}
	}

	#[test]
	fn test_env_source_maps_variables() {
		let source = EnvSource::from_vars([
			("KUBETERM_SERVER_URL", "https://dash.example"),
			("KUBETERM_EXEC_PATH", "/k8s/exec"),
			("KUBETERM_CONNECT_TIMEOUT_SECS", "15"),
			("KUBETERM_CONTEXT", "prod"),
			("KUBETERM_NAMESPACE", " default "),
			("KUBETERM_LOG_LEVEL", "debug"),
			("KUBETERM_LOG_FORMAT", "json"),
			("KUBETERM_TOKEN", "kt-secret"),
			("UNRELATED", "ignored"),
		]);
		let layer = source.load().unwrap();

		let server = layer.server.unwrap();
		assert_eq!(server.base_url.as_deref(), Some("https://dash.example"));
		assert_eq!(server.exec_path.as_deref(), Some("/k8s/exec"));
		assert_eq!(server.connect_timeout_secs, Some(15));
		assert_eq!(server.token.unwrap().expose(), "kt-secret");

		let session = layer.session.unwrap();
		assert_eq!(session.default_context.as_deref(), Some("prod"));
		assert_eq!(session.default_namespace.as_deref(), Some("default"));

		let logging = layer.logging.unwrap();
		assert_eq!(logging.level.as_deref(), Some("debug"));
		assert_eq!(logging.format.as_deref(), Some("json"));
	}

	#[test]
	fn test_env_source_skips_blank_values() {
		let source = EnvSource::from_vars([("KUBETERM_CONTEXT", "  "), ("KUBETERM_TOKEN", "")]);
		let layer = source.load().unwrap();
		assert!(layer.session.is_none());
		assert!(layer.server.is_none());
	}

	#[test]
	fn test_env_source_rejects_bad_timeout() {
		let source = EnvSource::from_vars([("KUBETERM_CONNECT_TIMEOUT_SECS", "soon")]);
		assert!(matches!(
			source.load(),
			Err(ConfigError::InvalidValue { .. })
		));
	}

	/// `_FILE` wins over the plain variable and loses its trailing newline.
	#[test]
	fn test_env_source_reads_token_file() {
		let mut file = tempfile::NamedTempFile::new().unwrap();
		writeln!(file, "from-file").unwrap();
		let path = file.path().to_string_lossy().into_owned();

		let source = EnvSource::from_vars([
			("KUBETERM_TOKEN", "from-env".to_string()),
			("KUBETERM_TOKEN_FILE", path),
		]);
		let layer = source.load().unwrap();
		assert_eq!(layer.server.unwrap().token.unwrap().expose(), "from-file");
	}

	/// A token file written on Windows keeps no carriage return.
	#[test]
	fn test_env_source_token_file_strips_crlf() {
		let mut file = tempfile::NamedTempFile::new().unwrap();
		write!(file, "kt-windows\r\n").unwrap();
		let path = file.path().to_string_lossy().into_owned();

		let layer = EnvSource::from_vars([("KUBETERM_TOKEN_FILE", path)])
			.load()
			.unwrap();
		assert_eq!(layer.server.unwrap().token.unwrap().expose(), "kt-windows");
	}

	#[test]
	fn test_env_source_missing_token_file_is_error() {
		let source = EnvSource::from_vars([("KUBETERM_TOKEN_FILE", "/nonexistent/token")]);
		assert!(matches!(source.load(), Err(ConfigError::Env(_))));
	}

	#[test]
	fn test_cli_source_sets_overrides() {
		let source = CliSource::new(CliOverrides {
			server_url: Some("http://localhost:9000".into()),
			log_level: Some("trace".into()),
			log_format: Some("json".into()),
			config_file: None,
		});
		let layer = source.load().unwrap();
		assert_eq!(
			layer.server.unwrap().base_url.as_deref(),
			Some("http://localhost:9000")
		);
		let logging = layer.logging.unwrap();
		assert_eq!(logging.level.as_deref(), Some("trace"));
		assert_eq!(logging.format.as_deref(), Some("json"));
	}
}
