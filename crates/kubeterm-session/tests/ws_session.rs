// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! End-to-end tests against a real WebSocket server on localhost.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures::{SinkExt, StreamExt};
use kubeterm_session::ws::{WsConnection, WsConnector};
use kubeterm_session::{
	ConnectionState, Endpoint, SessionTarget, TerminalSession, TerminalSurface, TransportEvent,
	VirtualKey, DEFAULT_EXEC_PATH,
};
use tokio::net::TcpListener;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio_tungstenite::tungstenite::handshake::server::{ErrorResponse, Request, Response};
use tokio_tungstenite::tungstenite::Message;

#[derive(Clone, Default)]
struct SharedSurface {
	output: Arc<Mutex<Vec<u8>>>,
	fits: Arc<Mutex<usize>>,
}

impl SharedSurface {
	fn text(&self) -> String {
		String::from_utf8_lossy(&self.output.lock().unwrap()).into_owned()
	}
}

impl TerminalSurface for SharedSurface {
	fn write(&mut self, data: &[u8]) {
		self.output.lock().unwrap().extend_from_slice(data);
	}

	fn fit(&mut self) {
		*self.fits.lock().unwrap() += 1;
	}

	fn dispose(&mut self) {}
}

type Session = TerminalSession<WsConnection, SharedSurface>;

fn target() -> SessionTarget {
	SessionTarget::new("prod", "default", "web-1", Some("app".into()))
}

/// Feed transport events into the session until `done` holds.
async fn pump_until(
	session: &mut Session,
	events: &mut UnboundedReceiver<TransportEvent>,
	mut done: impl FnMut(&Session) -> bool,
) {
	tokio::time::timeout(Duration::from_secs(5), async {
		while !done(&*session) {
			match events.recv().await {
				Some(event) => session.handle_event(event),
				None => break,
			}
		}
	})
	.await
	.expect("timed out waiting for session");
}

#[tokio::test]
async fn relays_output_and_keys_until_remote_close() {
	let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
	let addr = listener.local_addr().unwrap();
	let (uri_tx, uri_rx) = std::sync::mpsc::channel::<String>();

	let server = tokio::spawn(async move {
		let (stream, _) = listener.accept().await.unwrap();
		let callback = move |req: &Request, resp: Response| -> Result<Response, ErrorResponse> {
			let _ = uri_tx.send(req.uri().to_string());
			Ok(resp)
		};
		let mut ws = tokio_tungstenite::accept_hdr_async(stream, callback)
			.await
			.unwrap();

		ws.send(Message::Binary(b"\x1b[32mwelcome\x1b[0m\r\n".to_vec()))
			.await
			.unwrap();
		ws.send(Message::Text("$ ".to_string())).await.unwrap();

		let received = match ws.next().await {
			Some(Ok(Message::Binary(data))) => data,
			other => panic!("unexpected frame: {other:?}"),
		};
		ws.send(Message::Binary(received.clone())).await.unwrap();
		ws.close(None).await.unwrap();
		received
	});

	let (mut connector, mut events) = WsConnector::new(Duration::from_secs(5));
	let endpoint = Endpoint::new(&format!("http://{addr}"), DEFAULT_EXEC_PATH).unwrap();
	let surface = SharedSurface::default();
	let mut session = Session::initialize(target(), &endpoint);
	session.open(&mut connector, surface.clone());

	pump_until(&mut session, &mut events, |s| {
		s.state() != ConnectionState::Connecting
	})
	.await;
	assert_eq!(session.state(), ConnectionState::Connected);

	pump_until(&mut session, &mut events, |_| surface.text().contains("$ ")).await;
	assert!(surface.text().contains("\x1b[32mwelcome\x1b[0m\r\n$ "));

	assert!(session.send_key(VirtualKey::CtrlC));
	pump_until(&mut session, &mut events, |s| s.state().is_terminal()).await;

	assert_eq!(session.state(), ConnectionState::Disconnected);
	assert!(surface.text().contains("Connection closed."));
	assert!(surface.text().contains('\x03'));
	assert_eq!(server.await.unwrap(), vec![0x03]);

	let uri = uri_rx.recv().unwrap();
	assert_eq!(
		uri,
		"/api/exec?context=prod&namespace=default&pod=web-1&container=app"
	);
}

#[tokio::test]
async fn teardown_closes_socket() {
	let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
	let addr = listener.local_addr().unwrap();

	let server = tokio::spawn(async move {
		let (stream, _) = listener.accept().await.unwrap();
		let mut ws = tokio_tungstenite::accept_async(stream).await.unwrap();
		tokio::time::timeout(Duration::from_secs(5), ws.next())
			.await
			.expect("client never closed")
	});

	let (mut connector, mut events) = WsConnector::new(Duration::from_secs(5));
	let endpoint = Endpoint::new(&format!("http://{addr}"), DEFAULT_EXEC_PATH).unwrap();
	let mut session = Session::initialize(target(), &endpoint);
	session.open(&mut connector, SharedSurface::default());
	pump_until(&mut session, &mut events, |s| {
		s.state() != ConnectionState::Connecting
	})
	.await;

	session.teardown();
	session.teardown();

	let frame = server.await.unwrap();
	assert!(matches!(frame, Some(Ok(Message::Close(_))) | None));
}

/// Tearing down before the handshake completes must still close the socket
/// once it opens, and the session never reports it as connected.
#[tokio::test]
async fn teardown_during_handshake_closes_socket_once_open() {
	let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
	let addr = listener.local_addr().unwrap();

	let server = tokio::spawn(async move {
		let (stream, _) = listener.accept().await.unwrap();
		tokio::time::sleep(Duration::from_millis(200)).await;
		let mut ws = tokio_tungstenite::accept_async(stream).await.unwrap();
		tokio::time::timeout(Duration::from_secs(5), ws.next())
			.await
			.expect("client never closed")
	});

	let (mut connector, mut events) = WsConnector::new(Duration::from_secs(5));
	let endpoint = Endpoint::new(&format!("http://{addr}"), DEFAULT_EXEC_PATH).unwrap();
	let surface = SharedSurface::default();
	let mut session = Session::initialize(target(), &endpoint);
	session.open(&mut connector, surface.clone());
	session.teardown();

	let frame = server.await.unwrap();
	assert!(matches!(frame, Some(Ok(Message::Close(_))) | None));

	while let Ok(event) = events.try_recv() {
		assert_ne!(event, TransportEvent::Opened);
		session.handle_event(event);
	}
	assert_eq!(session.state(), ConnectionState::Connecting);
	assert!(!surface.text().contains("Connected."));
}

#[tokio::test]
async fn missing_target_never_connects() {
	let (mut connector, mut events) = WsConnector::new(Duration::from_secs(1));
	let endpoint = Endpoint::new("https://dash.example", DEFAULT_EXEC_PATH).unwrap();
	let surface = SharedSurface::default();
	let mut session = Session::initialize(SessionTarget::new("prod", "", "web-1", None), &endpoint);
	session.open(&mut connector, surface.clone());

	assert_eq!(session.state(), ConnectionState::Error);
	assert!(events.try_recv().is_err());
	assert_eq!(*surface.fits.lock().unwrap(), 0);
}
