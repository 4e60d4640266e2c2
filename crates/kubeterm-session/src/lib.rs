// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Terminal session adapter for interactive pod shells.
//!
//! This crate provides:
//! - [`SessionTarget`]: the context/namespace/pod/container tuple and its
//!   round trip through URL query parameters
//! - [`Endpoint`]: `ws`/`wss` URL construction from a dashboard origin
//! - [`TerminalSession`]: the event-driven adapter that relays bytes between a
//!   [`Connection`] and a [`TerminalSurface`] and owns the connection state
//! - [`VirtualKey`]: the on-screen keyboard palette
//! - [`ws::WsConnector`]: the production transport over `tokio-tungstenite`

mod endpoint;
mod error;
mod keys;
mod session;
mod state;
mod surface;
mod target;
mod transport;
pub mod ws;

#[cfg(any(test, feature = "test-support"))]
pub mod testing;

pub use endpoint::{Endpoint, DEFAULT_EXEC_PATH};
pub use error::{SessionError, SessionResult};
pub use keys::{UnknownKey, VirtualKey};
pub use session::{TerminalSession, CLOSED_MESSAGE, TRANSPORT_ERROR_MESSAGE};
pub use state::{ConnectionState, StatusIndicator};
pub use surface::TerminalSurface;
pub use target::{SessionTarget, MISSING_PARAMETERS_MESSAGE};
pub use transport::{Connection, Connector, TransportEvent};
