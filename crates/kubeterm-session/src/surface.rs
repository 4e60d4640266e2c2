// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

/// The device a session renders into.
///
/// Writes carry the raw terminal stream (including ANSI escape sequences);
/// the surface is responsible for rendering them. Implementations report
/// their own I/O failures, the session never sees them.
pub trait TerminalSurface {
	/// Render raw terminal output.
	fn write(&mut self, data: &[u8]);

	/// Re-measure the surface against its container.
	fn fit(&mut self);

	/// Release the surface. Must tolerate being called more than once.
	fn dispose(&mut self);
}
