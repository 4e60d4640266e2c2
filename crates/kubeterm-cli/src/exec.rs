// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! The interactive `exec` loop.
//!
//! Stdin is read on a dedicated thread and relayed through the chord decoder;
//! transport events and window resizes are fed to the session until the
//! remote side closes, the transport fails, or the user detaches.

use std::io::{self, Read};
use std::process::ExitCode;

use anyhow::{Context, Result};
use futures::stream::{self, BoxStream, Stream, StreamExt};
use kubeterm_config::KubetermConfig;
use kubeterm_session::ws::{WsConnection, WsConnector};
use kubeterm_session::{
	Connection, ConnectionState, Endpoint, SessionTarget, TerminalSession, TerminalSurface,
	TransportEvent,
};
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::chord::{ChordAction, ChordDecoder};
use crate::console::{ConsoleSurface, RawModeGuard};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Outcome {
	/// The session reached a terminal state on its own.
	Ended,
	/// The user left with the detach chord.
	Detached,
}

pub async fn run(
	config: &KubetermConfig,
	endpoint: &Endpoint,
	target: SessionTarget,
) -> Result<ExitCode> {
	let (connector, events) = WsConnector::new(config.server.connect_timeout());
	let mut connector = match &config.server.token {
		Some(token) => connector
			.with_bearer_token(token.expose())
			.context("invalid API token")?,
		None => connector,
	};

	let mut session: TerminalSession<WsConnection, ConsoleSurface> =
		TerminalSession::initialize(target, endpoint);
	let chords = ChordDecoder::new(config.session.chord_prefix);
	let input = spawn_stdin_reader()?;
	let resize = resize_events()?;

	let raw_mode = RawModeGuard::enter()?;
	session.open(&mut connector, ConsoleSurface::stdout());

	let outcome = drive(&mut session, events, input, chords, resize).await;

	let state = session.state();
	let message = session.message().map(str::to_string);
	session.teardown();
	drop(raw_mode);

	info!(?outcome, state = %state, "exec session finished");
	match (outcome, message) {
		(Outcome::Detached, _) => eprintln!("\r\nDetached."),
		(Outcome::Ended, Some(message)) if state == ConnectionState::Error => {
			eprintln!("kubeterm: {message}")
		}
		_ => {}
	}
	Ok(ExitCode::from(exit_status(outcome, state)))
}

/// Feed transport events, stdin reads and resize ticks to the session until it
/// ends or the user detaches.
///
/// Every source is owned by the loop and dropped when it returns, which
/// releases the resize signal subscription.
async fn drive<C, S, R>(
	session: &mut TerminalSession<C, S>,
	mut events: mpsc::UnboundedReceiver<TransportEvent>,
	mut input: mpsc::UnboundedReceiver<Vec<u8>>,
	mut chords: ChordDecoder,
	mut resize: R,
) -> Outcome
where
	C: Connection,
	S: TerminalSurface,
	R: Stream<Item = ()> + Unpin,
{
	let mut input_open = true;
	let mut resize_open = true;

	loop {
		if session.state().is_terminal() {
			return Outcome::Ended;
		}
		tokio::select! {
			event = events.recv() => match event {
				Some(event) => session.handle_event(event),
				None => return Outcome::Ended,
			},
			chunk = input.recv(), if input_open => match chunk {
				Some(bytes) => {
					if relay_input(session, &mut chords, &bytes) == Some(Outcome::Detached) {
						return Outcome::Detached;
					}
				}
				None => {
					debug!("stdin closed");
					input_open = false;
				}
			},
			tick = resize.next(), if resize_open => match tick {
				Some(()) => session.resize(),
				None => resize_open = false,
			},
		}
	}
}

/// Feed one stdin read through the chord decoder into the session.
fn relay_input<C, S>(
	session: &mut TerminalSession<C, S>,
	chords: &mut ChordDecoder,
	bytes: &[u8],
) -> Option<Outcome>
where
	C: Connection,
	S: TerminalSurface,
{
	for action in chords.feed(bytes) {
		match action {
			ChordAction::Forward(data) => {
				session.send_input(&data);
			}
			ChordAction::Key(key) => {
				session.send_key(key);
			}
			ChordAction::Detach => return Some(Outcome::Detached),
		}
	}
	None
}

fn exit_status(outcome: Outcome, state: ConnectionState) -> u8 {
	match (outcome, state) {
		(Outcome::Ended, ConnectionState::Error) => 1,
		_ => 0,
	}
}

/// Blocking reads on a plain thread so a pending read never holds up exit.
fn spawn_stdin_reader() -> Result<mpsc::UnboundedReceiver<Vec<u8>>> {
	let (tx, rx) = mpsc::unbounded_channel();
	std::thread::Builder::new()
		.name("kubeterm-stdin".to_string())
		.spawn(move || {
			let mut stdin = io::stdin().lock();
			let mut buf = [0u8; 1024];
			loop {
				match stdin.read(&mut buf) {
					Ok(0) => break,
					Ok(n) => {
						if tx.send(buf[..n].to_vec()).is_err() {
							break;
						}
					}
					Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
					Err(e) => {
						debug!(error = %e, "stdin read failed");
						break;
					}
				}
			}
		})
		.context("spawn stdin reader")?;
	Ok(rx)
}

/// Window size changes, one item per SIGWINCH.
#[cfg(unix)]
fn resize_events() -> Result<BoxStream<'static, ()>> {
	use tokio::signal::unix::{signal, SignalKind};
	let signal = signal(SignalKind::window_change()).context("listen for SIGWINCH")?;
	Ok(stream::unfold(signal, |mut signal| async move {
		signal.recv().await.map(|()| ((), signal))
	})
	.boxed())
}

#[cfg(not(unix))]
fn resize_events() -> Result<BoxStream<'static, ()>> {
	Ok(stream::pending().boxed())
}
