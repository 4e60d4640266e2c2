// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use bytes::Bytes;
use url::Url;

use crate::error::SessionError;

/// Something that happened on the transport, delivered to
/// [`crate::TerminalSession::handle_event`] in the order it occurred.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
	/// The handshake completed.
	Opened,
	/// A binary frame of raw terminal output.
	Binary(Bytes),
	/// A text frame, written to the terminal as-is.
	Text(String),
	/// The transport closed, locally or remotely.
	Closed,
	/// The transport failed.
	Failed(String),
}

/// Outbound half of a duplex byte transport.
pub trait Connection {
	/// Send raw bytes as one binary frame.
	fn send(&mut self, data: &[u8]) -> Result<(), SessionError>;

	/// Close the transport. Calling it again after it took effect is a no-op.
	///
	/// A transport still handshaking may either close once the handshake
	/// finishes or ignore the call. [`crate::TerminalSession`] repeats the
	/// close when [`TransportEvent::Opened`] arrives after teardown.
	fn close(&mut self);
}

/// Opens connections.
///
/// `connect` starts the attempt and returns immediately; the outcome arrives
/// later as [`TransportEvent::Opened`] or [`TransportEvent::Failed`].
pub trait Connector {
	type Connection: Connection;

	fn connect(&mut self, url: &Url) -> Result<Self::Connection, SessionError>;
}
