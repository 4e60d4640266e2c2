// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Layered configuration for kubeterm.
//!
//! Configuration is assembled from several sources, lowest precedence first:
//!
//! 1. Built-in defaults
//! 2. System file: `/etc/kubeterm/config.toml`
//! 3. User file: `$XDG_CONFIG_HOME/kubeterm/config.toml`
//! 4. Workspace file: `.kubeterm/config.toml`
//! 5. Explicit file passed with `--config`
//! 6. `KUBETERM_*` environment variables
//! 7. Command line flags
//!
//! Each source produces a [`ConfigLayer`] of optional fields. Layers are merged
//! in order, resolved into a [`KubetermConfig`] with defaults filled in, then
//! validated.

mod error;
mod layer;
mod paths;
mod registry;
mod runtime;
mod secret;
mod sources;
mod validation;

pub use error::ConfigError;
pub use layer::{ConfigLayer, LoggingLayer, ServerLayer, SessionLayer};
pub use paths::{resolve_xdg_paths, workspace_config_path, PathsConfig};
pub use registry::ConfigRegistry;
pub use runtime::{
	chord_prefix_label, parse_chord_prefix, KubetermConfig, LogFormat, LogLevel, LoggingConfig,
	ServerConfig, SessionConfig, DEFAULT_BASE_URL, DEFAULT_CHORD_PREFIX,
	DEFAULT_CONNECT_TIMEOUT_SECS, DEFAULT_EXEC_PATH,
};
pub use secret::{Secret, SecretString, REDACTED};
pub use sources::{
	CliOverrides, CliSource, ConfigSource, DefaultsSource, EnvSource, FileSource, Precedence,
};
pub use validation::{config_warnings, validate_config};

/// Load configuration from defaults, files and the environment.
pub fn load_config() -> Result<KubetermConfig, ConfigError> {
	load_config_with_cli(CliOverrides::default())
}

/// Load configuration with command line overrides applied last.
pub fn load_config_with_cli(overrides: CliOverrides) -> Result<KubetermConfig, ConfigError> {
	let paths = resolve_xdg_paths()?;

	let mut registry = ConfigRegistry::new();
	registry.register(Box::new(DefaultsSource));
	registry.register(Box::new(FileSource::system()));
	registry.register(Box::new(FileSource::user(&paths)));
	registry.register(Box::new(FileSource::workspace()?));
	if let Some(path) = overrides.config_file.clone() {
		registry.register(Box::new(FileSource::explicit(path)));
	}
	registry.register(Box::new(EnvSource::new()));
	registry.register(Box::new(CliSource::new(overrides)));

	registry.load(paths)
}
