// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! WebSocket transport over `tokio-tungstenite`.
//!
//! Each connection runs in its own task. The task owns the socket, forwards
//! every inbound frame as a [`TransportEvent`] on the connector's channel, and
//! writes outbound frames queued through [`WsConnection`]. Closing the handle
//! (or dropping it) cancels the task; a handshake that is still in flight at
//! that point is completed and immediately closed rather than left open.

use std::time::Duration;

use bytes::Bytes;
use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio_tungstenite::{
	connect_async,
	tungstenite::{
		client::IntoClientRequest,
		handshake::client::Request,
		http::{header::AUTHORIZATION, HeaderValue},
		Message,
	},
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, warn};
use url::Url;

use crate::error::SessionError;
use crate::transport::{Connection, Connector, TransportEvent};

pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Opens exec sockets and funnels their events into one channel.
pub struct WsConnector {
	events: mpsc::UnboundedSender<TransportEvent>,
	authorization: Option<HeaderValue>,
	connect_timeout: Duration,
}

impl WsConnector {
	/// Create a connector and the receiver its connections report to.
	pub fn new(connect_timeout: Duration) -> (Self, mpsc::UnboundedReceiver<TransportEvent>) {
		let (events, rx) = mpsc::unbounded_channel();
		(
			Self {
				events,
				authorization: None,
				connect_timeout,
			},
			rx,
		)
	}

	/// Send `Authorization: Bearer <token>` on the upgrade request.
	pub fn with_bearer_token(mut self, token: &str) -> Result<Self, SessionError> {
		let mut value = HeaderValue::from_str(&format!("Bearer {token}")).map_err(|_| {
			SessionError::InvalidCredentials {
				message: "token is not a valid header value".to_string(),
			}
		})?;
		value.set_sensitive(true);
		self.authorization = Some(value);
		Ok(self)
	}

	fn request(&self, url: &Url) -> Result<Request, SessionError> {
		let mut request = url
			.as_str()
			.into_client_request()
			.map_err(|e| SessionError::connect(e.to_string()))?;
		if let Some(value) = &self.authorization {
			request.headers_mut().insert(AUTHORIZATION, value.clone());
		}
		Ok(request)
	}
}

impl Connector for WsConnector {
	type Connection = WsConnection;

	fn connect(&mut self, url: &Url) -> Result<WsConnection, SessionError> {
		let runtime = tokio::runtime::Handle::try_current()
			.map_err(|e| SessionError::connect(format!("no async runtime: {e}")))?;
		let request = self.request(url)?;

		let (outbound, outbound_rx) = mpsc::unbounded_channel();
		let cancel = CancellationToken::new();

		debug!(url = %url, "spawning exec socket task");
		runtime.spawn(run_socket(
			request,
			self.connect_timeout,
			outbound_rx,
			cancel.clone(),
			self.events.clone(),
		));

		Ok(WsConnection { outbound, cancel })
	}
}

/// Handle to a socket task.
pub struct WsConnection {
	outbound: mpsc::UnboundedSender<Message>,
	cancel: CancellationToken,
}

impl Connection for WsConnection {
	fn send(&mut self, data: &[u8]) -> Result<(), SessionError> {
		self
			.outbound
			.send(Message::Binary(data.to_vec()))
			.map_err(|_| SessionError::send("socket task has stopped"))
	}

	fn close(&mut self) {
		self.cancel.cancel();
	}
}

impl Drop for WsConnection {
	fn drop(&mut self) {
		self.cancel.cancel();
	}
}

async fn run_socket(
	request: Request,
	connect_timeout: Duration,
	mut outbound: mpsc::UnboundedReceiver<Message>,
	cancel: CancellationToken,
	events: mpsc::UnboundedSender<TransportEvent>,
) {
	let emit = |event: TransportEvent| {
		// The receiver goes away when the owner stops listening; nothing to do then.
		let _ = events.send(event);
	};

	let ws_stream = match tokio::time::timeout(connect_timeout, connect_async(request)).await {
		Ok(Ok((stream, _))) => stream,
		Ok(Err(e)) => {
			if !cancel.is_cancelled() {
				emit(TransportEvent::Failed(e.to_string()));
			}
			return;
		}
		Err(_) => {
			if !cancel.is_cancelled() {
				emit(TransportEvent::Failed(format!(
					"connect timed out after {}s",
					connect_timeout.as_secs()
				)));
			}
			return;
		}
	};

	let (mut write, mut read) = ws_stream.split();

	if cancel.is_cancelled() {
		debug!("session closed during handshake, closing socket");
		let _ = write.send(Message::Close(None)).await;
		return;
	}
	emit(TransportEvent::Opened);

	loop {
		tokio::select! {
			_ = cancel.cancelled() => {
				trace!("closing exec socket");
				let _ = write.send(Message::Close(None)).await;
				emit(TransportEvent::Closed);
				break;
			}
			Some(message) = outbound.recv() => {
				if let Err(e) = write.send(message).await {
					emit(TransportEvent::Failed(e.to_string()));
					break;
				}
			}
			frame = read.next() => match frame {
				Some(Ok(Message::Binary(data))) => emit(TransportEvent::Binary(Bytes::from(data))),
				Some(Ok(Message::Text(text))) => emit(TransportEvent::Text(text)),
				Some(Ok(Message::Ping(payload))) => {
					if let Err(e) = write.send(Message::Pong(payload)).await {
						emit(TransportEvent::Failed(e.to_string()));
						break;
					}
				}
				Some(Ok(Message::Close(frame))) => {
					debug!(?frame, "remote closed exec socket");
					emit(TransportEvent::Closed);
					break;
				}
				Some(Ok(_)) => {}
				Some(Err(e)) => {
					warn!(error = %e, "exec socket error");
					emit(TransportEvent::Failed(e.to_string()));
					break;
				}
				None => {
					emit(TransportEvent::Closed);
					break;
				}
			},
		}
	}
}
