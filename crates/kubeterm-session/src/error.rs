// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use thiserror::Error;

use crate::target::MISSING_PARAMETERS_MESSAGE;

/// Result type alias for session operations.
pub type SessionResult<T> = Result<T, SessionError>;

/// Errors that can occur while preparing or driving a terminal session.
#[derive(Error, Debug)]
pub enum SessionError {
	#[error("{}", MISSING_PARAMETERS_MESSAGE)]
	MissingParameters { missing: Vec<&'static str> },

	#[error("Invalid origin URL {origin}: {source}")]
	InvalidOrigin {
		origin: String,
		#[source]
		source: url::ParseError,
	},

	#[error("Unsupported origin scheme: {scheme}")]
	UnsupportedScheme { scheme: String },

	#[error("Invalid credentials for WebSocket upgrade: {message}")]
	InvalidCredentials { message: String },

	#[error("Connect error: {message}")]
	Connect { message: String },

	#[error("Send error: {message}")]
	Send { message: String },
}

impl SessionError {
	pub fn connect(message: impl Into<String>) -> Self {
		Self::Connect {
			message: message.into(),
		}
	}

	pub fn send(message: impl Into<String>) -> Self {
		Self::Send {
			message: message.into(),
		}
	}
}
