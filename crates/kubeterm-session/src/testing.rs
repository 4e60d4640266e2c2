// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! In-memory connector and surface for exercising sessions without a network
//! or a real terminal. Handles are cheap clones over shared logs, so a test can
//! keep one while the session owns another.

use std::sync::{Arc, Mutex};

use url::Url;

use crate::error::SessionError;
use crate::surface::TerminalSurface;
use crate::transport::{Connection, Connector};

#[derive(Debug, Default)]
struct SurfaceLog {
	writes: Vec<Vec<u8>>,
	fits: usize,
	disposals: usize,
}

/// Surface that records everything written to it.
#[derive(Debug, Clone, Default)]
pub struct RecordingSurface {
	log: Arc<Mutex<SurfaceLog>>,
}

impl RecordingSurface {
	pub fn new() -> Self {
		Self::default()
	}

	/// Every write, in order.
	pub fn writes(&self) -> Vec<Vec<u8>> {
		self.log.lock().unwrap().writes.clone()
	}

	/// Number of writes so far; pass to [`RecordingSurface::writes_since`].
	pub fn mark(&self) -> usize {
		self.log.lock().unwrap().writes.len()
	}

	pub fn writes_since(&self, mark: usize) -> Vec<Vec<u8>> {
		self.log.lock().unwrap().writes[mark..].to_vec()
	}

	/// All output concatenated.
	pub fn output(&self) -> Vec<u8> {
		self.log.lock().unwrap().writes.concat()
	}

	pub fn output_lossy(&self) -> String {
		String::from_utf8_lossy(&self.output()).into_owned()
	}

	pub fn fit_count(&self) -> usize {
		self.log.lock().unwrap().fits
	}

	pub fn dispose_count(&self) -> usize {
		self.log.lock().unwrap().disposals
	}
}

impl TerminalSurface for RecordingSurface {
	fn write(&mut self, data: &[u8]) {
		self.log.lock().unwrap().writes.push(data.to_vec());
	}

	fn fit(&mut self) {
		self.log.lock().unwrap().fits += 1;
	}

	fn dispose(&mut self) {
		self.log.lock().unwrap().disposals += 1;
	}
}

#[derive(Debug, Default)]
struct ConnectionLog {
	url: Option<Url>,
	sent: Vec<Vec<u8>>,
	close_calls: usize,
	fail_sends: bool,
	ignore_close_until_open: bool,
	handshake_done: bool,
	closed: bool,
}

/// Connection that records sends and closes.
#[derive(Debug, Clone, Default)]
pub struct MockConnection {
	log: Arc<Mutex<ConnectionLog>>,
}

impl MockConnection {
	pub fn url(&self) -> Option<Url> {
		self.log.lock().unwrap().url.clone()
	}

	pub fn sent(&self) -> Vec<Vec<u8>> {
		self.log.lock().unwrap().sent.clone()
	}

	pub fn close_count(&self) -> usize {
		self.log.lock().unwrap().close_calls
	}

	/// Whether a close call has taken effect.
	pub fn is_closed(&self) -> bool {
		self.log.lock().unwrap().closed
	}

	/// Mark the handshake finished, so later closes take effect.
	pub fn complete_handshake(&self) {
		self.log.lock().unwrap().handshake_done = true;
	}

	/// Make subsequent sends fail as if the transport task had stopped.
	pub fn fail_sends(&self) {
		self.log.lock().unwrap().fail_sends = true;
	}
}

impl Connection for MockConnection {
	fn send(&mut self, data: &[u8]) -> Result<(), SessionError> {
		let mut log = self.log.lock().unwrap();
		if log.fail_sends {
			return Err(SessionError::send("mock transport stopped"));
		}
		log.sent.push(data.to_vec());
		Ok(())
	}

	fn close(&mut self) {
		let mut log = self.log.lock().unwrap();
		log.close_calls += 1;
		if !log.ignore_close_until_open || log.handshake_done {
			log.closed = true;
		}
	}
}

/// Connector handing out [`MockConnection`]s.
#[derive(Debug, Default)]
pub struct MockConnector {
	attempts: usize,
	refuse_with: Option<String>,
	ignore_close_until_open: bool,
	last: Option<MockConnection>,
}

impl MockConnector {
	pub fn new() -> Self {
		Self::default()
	}

	/// A connector whose `connect` fails synchronously.
	pub fn refusing(message: impl Into<String>) -> Self {
		Self {
			refuse_with: Some(message.into()),
			..Self::default()
		}
	}

	/// A connector whose connections ignore `close` until
	/// [`MockConnection::complete_handshake`] is called.
	pub fn deferring_close() -> Self {
		Self {
			ignore_close_until_open: true,
			..Self::default()
		}
	}

	pub fn attempts(&self) -> usize {
		self.attempts
	}

	/// Handle to the most recently created connection.
	pub fn last_connection(&self) -> Option<MockConnection> {
		self.last.clone()
	}
}

impl Connector for MockConnector {
	type Connection = MockConnection;

	fn connect(&mut self, url: &Url) -> Result<MockConnection, SessionError> {
		self.attempts += 1;
		if let Some(message) = &self.refuse_with {
			return Err(SessionError::connect(message.clone()));
		}
		let connection = MockConnection::default();
		{
			let mut log = connection.log.lock().unwrap();
			log.url = Some(url.clone());
			log.ignore_close_until_open = self.ignore_close_until_open;
		}
		self.last = Some(connection.clone());
		Ok(connection)
	}
}
