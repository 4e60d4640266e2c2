// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Configuration validation rules.

use url::Url;

use crate::runtime::KubetermConfig;
use crate::ConfigError;

const MAX_CONNECT_TIMEOUT_SECS: u64 = 300;

/// Validate the configuration.
///
/// Returns Ok(()) if valid, or ConfigError::InvalidValue naming the field.
pub fn validate_config(config: &KubetermConfig) -> Result<(), ConfigError> {
	validate_server(config)?;
	validate_session(config)?;

	Ok(())
}

/// Problems that do not stop a load but should be reported once logging is up.
pub fn config_warnings(config: &KubetermConfig) -> Vec<String> {
	let mut warnings = Vec::new();

	let server = &config.server;
	if server.token.is_some() {
		if let Ok(url) = Url::parse(&server.base_url) {
			if matches!(url.scheme(), "http" | "ws") {
				warnings.push(format!(
					"API token will be sent over an unencrypted connection to {}",
					server.base_url
				));
			}
		}
	}

	warnings
}

fn validate_server(config: &KubetermConfig) -> Result<(), ConfigError> {
	let server = &config.server;

	let url = Url::parse(&server.base_url).map_err(|e| {
		ConfigError::invalid_value("server.base_url", format!("{:?}: {e}", server.base_url))
	})?;
	match url.scheme() {
		"http" | "https" | "ws" | "wss" => {}
		other => {
			return Err(ConfigError::invalid_value(
				"server.base_url",
				format!("unsupported scheme {other:?}; expected http, https, ws or wss"),
			))
		}
	}

	if server.exec_path.trim().is_empty() {
		return Err(ConfigError::invalid_value(
			"server.exec_path",
			"exec_path cannot be empty",
		));
	}

	if server.connect_timeout_secs == 0 || server.connect_timeout_secs > MAX_CONNECT_TIMEOUT_SECS {
		return Err(ConfigError::invalid_value(
			"server.connect_timeout_secs",
			format!("must be between 1 and {MAX_CONNECT_TIMEOUT_SECS}"),
		));
	}

	Ok(())
}

fn validate_session(config: &KubetermConfig) -> Result<(), ConfigError> {
	// These bytes start or end ordinary input and would make the shell unusable.
	match config.session.chord_prefix {
		0x1b | 0x0d | 0x09 | 0x03 => Err(ConfigError::invalid_value(
			"session.chord_prefix",
			"Esc, Enter, Tab and Ctrl+C cannot be used as the chord prefix",
		)),
		_ => Ok(()),
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::layer::ConfigLayer;
	use crate::paths::PathsConfig;

	fn minimal_config() -> KubetermConfig {
		KubetermConfig::from_layer(ConfigLayer::default(), PathsConfig::default()).unwrap()
	}

	fn invalid_field(result: Result<(), ConfigError>) -> String {
		match result {
			Err(ConfigError::InvalidValue { field, .. }) => field,
			other => panic!("expected invalid value, got {other:?}"),
		}
	}

	#[test]
	fn test_defaults_are_valid() {
		assert!(validate_config(&minimal_config()).is_ok());
	}

	#[test]
	fn test_secure_and_ws_origins_are_valid() {
		for url in [
			"https://dash.example",
			"wss://dash.example/k8s/",
			"ws://127.0.0.1:9000",
		] {
			let mut config = minimal_config();
			config.server.base_url = url.to_string();
			assert!(validate_config(&config).is_ok(), "{url}");
		}
	}

	#[test]
	fn test_unparseable_base_url_rejected() {
		let mut config = minimal_config();
		config.server.base_url = "not a url".into();
		assert_eq!(invalid_field(validate_config(&config)), "server.base_url");
	}

	#[test]
	fn test_ftp_base_url_rejected() {
		let mut config = minimal_config();
		config.server.base_url = "ftp://dash.example".into();
		assert_eq!(invalid_field(validate_config(&config)), "server.base_url");
	}

	#[test]
	fn test_empty_exec_path_rejected() {
		let mut config = minimal_config();
		config.server.exec_path = " ".into();
		assert_eq!(invalid_field(validate_config(&config)), "server.exec_path");
	}

	#[test]
	fn test_timeout_bounds() {
		let mut config = minimal_config();
		config.server.connect_timeout_secs = 0;
		assert_eq!(
			invalid_field(validate_config(&config)),
			"server.connect_timeout_secs"
		);

		config.server.connect_timeout_secs = 301;
		assert!(validate_config(&config).is_err());

		config.server.connect_timeout_secs = 300;
		assert!(validate_config(&config).is_ok());
	}

	#[test]
	fn test_token_over_plain_origin_warns() {
		let mut config = minimal_config();
		config.server.base_url = "http://dash.internal:8080".into();
		config.server.token = Some(crate::Secret::new("kt-secret".to_string()));
		assert!(validate_config(&config).is_ok());

		let warnings = config_warnings(&config);
		assert_eq!(warnings.len(), 1);
		assert!(warnings[0].contains("unencrypted"));
		assert!(!warnings[0].contains("kt-secret"));
	}

	#[test]
	fn test_no_warning_without_token_or_over_tls() {
		let mut config = minimal_config();
		config.server.base_url = "ws://dash.internal".into();
		assert!(config_warnings(&config).is_empty());

		config.server.base_url = "https://dash.example".into();
		config.server.token = Some(crate::Secret::new("kt-secret".to_string()));
		assert!(config_warnings(&config).is_empty());
	}

	/// Esc would swallow every arrow key sequence.
	#[test]
	fn test_escape_chord_prefix_rejected() {
		let mut config = minimal_config();
		config.session.chord_prefix = 0x1b;
		assert_eq!(invalid_field(validate_config(&config)), "session.chord_prefix");
	}
}
