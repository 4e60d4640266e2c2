// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Partial configuration layer for merging from multiple sources.

use serde::Deserialize;
use std::path::PathBuf;

use crate::secret::SecretString;

/// Partial configuration layer - all fields are Option for merging.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConfigLayer {
	#[serde(default)]
	pub server: Option<ServerLayer>,
	#[serde(default)]
	pub session: Option<SessionLayer>,
	#[serde(default)]
	pub logging: Option<LoggingLayer>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ServerLayer {
	#[serde(default)]
	pub base_url: Option<String>,
	#[serde(default)]
	pub exec_path: Option<String>,
	#[serde(default)]
	pub token: Option<SecretString>,
	#[serde(default)]
	pub connect_timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SessionLayer {
	#[serde(default)]
	pub default_context: Option<String>,
	#[serde(default)]
	pub default_namespace: Option<String>,
	#[serde(default)]
	pub chord_prefix: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoggingLayer {
	#[serde(default)]
	pub level: Option<String>,
	#[serde(default)]
	pub file: Option<PathBuf>,
	#[serde(default)]
	pub format: Option<String>,
}

impl ConfigLayer {
	/// Merge another layer on top of this one. Fields set in `other` win.
	pub fn merge(&mut self, other: ConfigLayer) {
		merge_option(&mut self.server, other.server, ServerLayer::merge);
		merge_option(&mut self.session, other.session, SessionLayer::merge);
		merge_option(&mut self.logging, other.logging, LoggingLayer::merge);
	}

	pub(crate) fn server_mut(&mut self) -> &mut ServerLayer {
		self.server.get_or_insert_with(ServerLayer::default)
	}

	pub(crate) fn session_mut(&mut self) -> &mut SessionLayer {
		self.session.get_or_insert_with(SessionLayer::default)
	}

	pub(crate) fn logging_mut(&mut self) -> &mut LoggingLayer {
		self.logging.get_or_insert_with(LoggingLayer::default)
	}
}

fn merge_option<T, F>(target: &mut Option<T>, source: Option<T>, merge_fn: F)
where
	F: FnOnce(&mut T, T),
{
	match (target.as_mut(), source) {
		(Some(t), Some(s)) => merge_fn(t, s),
		(None, Some(s)) => *target = Some(s),
		_ => {}
	}
}

impl ServerLayer {
	fn merge(&mut self, other: ServerLayer) {
		if other.base_url.is_some() {
			self.base_url = other.base_url;
		}
		if other.exec_path.is_some() {
			self.exec_path = other.exec_path;
		}
		if other.token.is_some() {
			self.token = other.token;
		}
		if other.connect_timeout_secs.is_some() {
			self.connect_timeout_secs = other.connect_timeout_secs;
		}
	}
}

impl SessionLayer {
	fn merge(&mut self, other: SessionLayer) {
		if other.default_context.is_some() {
			self.default_context = other.default_context;
		}
		if other.default_namespace.is_some() {
			self.default_namespace = other.default_namespace;
		}
		if other.chord_prefix.is_some() {
			self.chord_prefix = other.chord_prefix;
		}
	}
}

impl LoggingLayer {
	fn merge(&mut self, other: LoggingLayer) {
		if other.level.is_some() {
			self.level = other.level;
		}
		if other.file.is_some() {
			self.file = other.file;
		}
		if other.format.is_some() {
			self.format = other.format;
		}
	}
}
