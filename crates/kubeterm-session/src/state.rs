// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::fmt;

use serde::{Deserialize, Serialize};

/// Lifecycle of the connection owned by a [`crate::TerminalSession`].
///
/// `Disconnected` and `Error` are terminal: a closed remote shell cannot be
/// resumed, so a new session is needed to reconnect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionState {
	#[default]
	Connecting,
	Connected,
	Disconnected,
	Error,
}

impl ConnectionState {
	pub fn is_terminal(self) -> bool {
		matches!(self, Self::Disconnected | Self::Error)
	}

	pub fn on_open(self) -> Self {
		match self {
			Self::Connecting => Self::Connected,
			other => other,
		}
	}

	pub fn on_close(self) -> Self {
		match self {
			Self::Connecting | Self::Connected => Self::Disconnected,
			other => other,
		}
	}

	pub fn on_error(self) -> Self {
		match self {
			Self::Connecting | Self::Connected => Self::Error,
			other => other,
		}
	}

	pub fn status(self) -> StatusIndicator {
		match self {
			Self::Connecting => StatusIndicator::Connecting,
			Self::Connected => StatusIndicator::Connected,
			Self::Disconnected | Self::Error => StatusIndicator::Offline,
		}
	}

	pub fn as_str(self) -> &'static str {
		match self {
			Self::Connecting => "connecting",
			Self::Connected => "connected",
			Self::Disconnected => "disconnected",
			Self::Error => "error",
		}
	}
}

impl fmt::Display for ConnectionState {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// Three-state status shown to users.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusIndicator {
	Connecting,
	Connected,
	Offline,
}

impl fmt::Display for StatusIndicator {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(match self {
			Self::Connecting => "connecting",
			Self::Connected => "connected",
			Self::Offline => "disconnected",
		})
	}
}
