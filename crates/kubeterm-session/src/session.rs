// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! The terminal session adapter.
//!
//! A [`TerminalSession`] owns one [`Connection`] and one [`TerminalSurface`]
//! and relays bytes between them:
//!
//! 1. inbound frames are written to the surface untouched, in receipt order
//! 2. keystrokes captured by the surface go out via [`TerminalSession::send_input`]
//! 3. virtual keyboard presses go out via [`TerminalSession::send_key`]
//!
//! Outbound data is only sent while connected; anything produced in another
//! state is dropped, never queued. Transport failures are reported inside the
//! terminal and through [`TerminalSession::state`], never returned.

use tracing::{debug, info, trace, warn};
use url::Url;

use crate::endpoint::Endpoint;
use crate::keys::VirtualKey;
use crate::state::{ConnectionState, StatusIndicator};
use crate::surface::TerminalSurface;
use crate::target::SessionTarget;
use crate::transport::{Connection, Connector, TransportEvent};

/// Shown when the transport closes.
pub const CLOSED_MESSAGE: &str = "Connection closed.";

/// Shown when the transport fails.
pub const TRANSPORT_ERROR_MESSAGE: &str = "WebSocket error occurred";

const DIM: &str = "\x1b[2m";
const RED: &str = "\x1b[31m";
const GREEN: &str = "\x1b[32m";
const YELLOW: &str = "\x1b[33m";
const RESET: &str = "\x1b[0m";

/// One exec session against a pod, bridging a [`Connection`] to a
/// [`TerminalSurface`].
///
/// The session starts in [`ConnectionState::Connecting`] and moves through
/// the state machine as [`TransportEvent`]s arrive. After [`teardown`] it
/// keeps the connection handle so a handshake that completes late is closed
/// again.
///
/// [`teardown`]: TerminalSession::teardown
pub struct TerminalSession<C: Connection, S: TerminalSurface> {
	target: SessionTarget,
	url: Option<Url>,
	state: ConnectionState,
	message: Option<String>,
	connection: Option<C>,
	surface: Option<S>,
	disposed: bool,
}

impl<C: Connection, S: TerminalSurface> TerminalSession<C, S> {
	/// Prepare a session for `target`.
	///
	/// An incomplete target yields a session already in
	/// [`ConnectionState::Error`] with no URL; opening it does nothing.
	pub fn initialize(target: SessionTarget, endpoint: &Endpoint) -> Self {
		let (url, state, message) = match target.validate() {
			Ok(()) => {
				let url = endpoint.exec_url(&target);
				debug!(target = %target, url = %url, "session initialized");
				(Some(url), ConnectionState::Connecting, None)
			}
			Err(err) => {
				warn!(
					target = %target,
					missing = ?target.missing_fields(),
					"session target incomplete"
				);
				(None, ConnectionState::Error, Some(err.to_string()))
			}
		};

		Self {
			target,
			url,
			state,
			message,
			connection: None,
			surface: None,
			disposed: false,
		}
	}

	/// Fit `surface`, start connecting, and take ownership of both.
	///
	/// Ignored for a session that is already finished, disposed, or open.
	pub fn open<K>(&mut self, connector: &mut K, mut surface: S)
	where
		K: Connector<Connection = C>,
	{
		if self.disposed || self.state.is_terminal() || self.surface.is_some() {
			debug!(state = %self.state, disposed = self.disposed, "open ignored");
			return;
		}
		let Some(url) = self.url.clone() else {
			return;
		};

		surface.fit();
		surface.write(format!("{DIM}Connecting to {}...{RESET}\r\n", self.target.pod()).as_bytes());
		self.surface = Some(surface);

		match connector.connect(&url) {
			Ok(connection) => {
				info!(target = %self.target, "connecting to exec endpoint");
				self.connection = Some(connection);
			}
			Err(err) => self.fail(&err.to_string()),
		}
	}

	pub fn handle_event(&mut self, event: TransportEvent) {
		if self.disposed {
			if event == TransportEvent::Opened {
				debug!(target = %self.target, "connection opened after teardown, closing");
				self.close_connection();
			} else {
				trace!(?event, "event after teardown ignored");
			}
			return;
		}

		match event {
			TransportEvent::Opened => {
				if self.state == ConnectionState::Connecting {
					self.state = self.state.on_open();
					info!(target = %self.target, "exec session connected");
					self.write(format!("{GREEN}Connected.{RESET}\r\n").as_bytes());
				}
			}
			TransportEvent::Binary(data) => self.write_output(&data),
			TransportEvent::Text(text) => self.write_output(text.as_bytes()),
			TransportEvent::Closed => {
				if self.state.is_terminal() {
					return;
				}
				self.state = self.state.on_close();
				self.message = Some(CLOSED_MESSAGE.to_string());
				info!(target = %self.target, "exec session closed");
				self.write(format!("\r\n{YELLOW}{CLOSED_MESSAGE}{RESET}\r\n").as_bytes());
				self.close_connection();
			}
			TransportEvent::Failed(detail) => self.fail(&detail),
		}
	}

	/// Send keystrokes captured by the surface. Returns whether they were sent.
	pub fn send_input(&mut self, data: &[u8]) -> bool {
		if self.disposed || self.state != ConnectionState::Connected || data.is_empty() {
			trace!(state = %self.state, len = data.len(), "input dropped");
			return false;
		}
		let Some(connection) = self.connection.as_mut() else {
			return false;
		};
		match connection.send(data) {
			Ok(()) => true,
			Err(err) => {
				self.fail(&err.to_string());
				false
			}
		}
	}

	/// Send the byte sequence for a virtual keyboard key.
	pub fn send_key(&mut self, key: VirtualKey) -> bool {
		debug!(key = %key, "virtual key");
		self.send_input(key.bytes())
	}

	/// Re-fit the surface after the viewport changed.
	///
	/// The exec stream has no in-band resize message, so nothing is sent.
	pub fn resize(&mut self) {
		if self.disposed {
			return;
		}
		if let Some(surface) = self.surface.as_mut() {
			surface.fit();
		}
	}

	/// Close the connection and dispose the surface. Safe to call repeatedly.
	///
	/// The connection handle is kept so a late [`TransportEvent::Opened`] can
	/// close it again.
	pub fn teardown(&mut self) {
		if self.disposed {
			return;
		}
		self.disposed = true;
		self.close_connection();
		if let Some(mut surface) = self.surface.take() {
			surface.dispose();
		}
		debug!(target = %self.target, state = %self.state, "session torn down");
	}

	pub fn state(&self) -> ConnectionState {
		self.state
	}

	pub fn status(&self) -> StatusIndicator {
		self.state.status()
	}

	/// Human readable reason for the current state, if there is one.
	pub fn message(&self) -> Option<&str> {
		self.message.as_deref()
	}

	pub fn url(&self) -> Option<&Url> {
		self.url.as_ref()
	}

	pub fn target(&self) -> &SessionTarget {
		&self.target
	}

	pub fn is_disposed(&self) -> bool {
		self.disposed
	}

	fn fail(&mut self, detail: &str) {
		if self.state.is_terminal() {
			return;
		}
		self.state = self.state.on_error();
		self.message = Some(format!("{TRANSPORT_ERROR_MESSAGE}: {detail}"));
		warn!(target = %self.target, error = %detail, "exec transport error");
		self.write(format!("\r\n{RED}{TRANSPORT_ERROR_MESSAGE}{RESET}\r\n").as_bytes());
		self.close_connection();
	}

	fn write_output(&mut self, data: &[u8]) {
		if self.state != ConnectionState::Connected {
			trace!(state = %self.state, len = data.len(), "output dropped");
			return;
		}
		self.write(data);
	}

	fn write(&mut self, data: &[u8]) {
		if let Some(surface) = self.surface.as_mut() {
			surface.write(data);
		}
	}

	fn close_connection(&mut self) {
		if let Some(connection) = self.connection.as_mut() {
			connection.close();
		}
	}
}

impl<C: Connection, S: TerminalSurface> Drop for TerminalSession<C, S> {
	fn drop(&mut self) {
		self.teardown();
	}
}
