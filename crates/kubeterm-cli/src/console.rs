// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! The local terminal as a [`TerminalSurface`].

use std::io::{self, IsTerminal, Stdout, Write};

use anyhow::{Context, Result};
use crossterm::terminal;
use kubeterm_session::TerminalSurface;
use tracing::{debug, warn};

const RESET_ATTRIBUTES: &[u8] = b"\x1b[0m";

/// Writes session output straight to a byte sink, stdout in production.
pub struct ConsoleSurface<W: Write = Stdout> {
	out: W,
	size: Option<(u16, u16)>,
}

impl ConsoleSurface<Stdout> {
	pub fn stdout() -> Self {
		Self::new(io::stdout())
	}
}

impl<W: Write> ConsoleSurface<W> {
	pub fn new(out: W) -> Self {
		Self { out, size: None }
	}

	#[cfg(test)]
	pub(crate) fn into_inner(self) -> W {
		self.out
	}
}

impl<W: Write> TerminalSurface for ConsoleSurface<W> {
	fn write(&mut self, data: &[u8]) {
		if let Err(e) = self.out.write_all(data).and_then(|()| self.out.flush()) {
			warn!(error = %e, "failed to write to terminal");
		}
	}

	fn fit(&mut self) {
		match terminal::size() {
			Ok(size) => {
				if self.size != Some(size) {
					debug!(cols = size.0, rows = size.1, "terminal fitted");
					self.size = Some(size);
				}
			}
			Err(e) => debug!(error = %e, "terminal size unavailable"),
		}
	}

	fn dispose(&mut self) {
		self.write(RESET_ATTRIBUTES);
	}
}

/// Puts the controlling terminal in raw mode for the guard's lifetime.
///
/// Does nothing when stdin is not a terminal, so input can be piped.
pub struct RawModeGuard {
	enabled: bool,
}

impl RawModeGuard {
	pub fn enter() -> Result<Self> {
		if !io::stdin().is_terminal() {
			debug!("stdin is not a terminal, leaving line mode");
			return Ok(Self { enabled: false });
		}
		terminal::enable_raw_mode().context("enable raw mode")?;
		Ok(Self { enabled: true })
	}
}

impl Drop for RawModeGuard {
	fn drop(&mut self) {
		if self.enabled {
			let _ = terminal::disable_raw_mode();
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn writes_bytes_verbatim() {
		let mut surface = ConsoleSurface::new(Vec::new());
		surface.write(b"\x1b[32mok\x1b[0m\r\n");
		surface.write(&[0xff, 0x00]);
		assert_eq!(surface.into_inner(), b"\x1b[32mok\x1b[0m\r\n\xff\x00".to_vec());
	}

	#[test]
	fn dispose_resets_attributes() {
		let mut surface = ConsoleSurface::new(Vec::new());
		surface.dispose();
		assert_eq!(surface.into_inner(), RESET_ATTRIBUTES.to_vec());
	}

	/// Fitting without a terminal keeps going rather than failing the session.
	#[test]
	fn fit_without_terminal_is_harmless() {
		let mut surface = ConsoleSurface::new(Vec::new());
		surface.fit();
		surface.write(b"x");
		assert_eq!(surface.into_inner(), b"x".to_vec());
	}
}
