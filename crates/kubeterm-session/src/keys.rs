// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Virtual keyboard palette.

use std::fmt;
use std::str::FromStr;

/// A key from the on-screen keyboard, mapped to the exact bytes a terminal
/// would send for it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VirtualKey {
	Escape,
	Tab,
	CtrlC,
	CtrlD,
	CtrlZ,
	ArrowUp,
	ArrowDown,
	ArrowRight,
	ArrowLeft,
	Enter,
}

impl VirtualKey {
	pub const ALL: [VirtualKey; 10] = [
		VirtualKey::Escape,
		VirtualKey::Tab,
		VirtualKey::CtrlC,
		VirtualKey::CtrlD,
		VirtualKey::CtrlZ,
		VirtualKey::ArrowUp,
		VirtualKey::ArrowDown,
		VirtualKey::ArrowRight,
		VirtualKey::ArrowLeft,
		VirtualKey::Enter,
	];

	pub fn bytes(self) -> &'static [u8] {
		match self {
			Self::Escape => b"\x1b",
			Self::Tab => b"\t",
			Self::CtrlC => b"\x03",
			Self::CtrlD => b"\x04",
			Self::CtrlZ => b"\x1a",
			Self::ArrowUp => b"\x1b[A",
			Self::ArrowDown => b"\x1b[B",
			Self::ArrowRight => b"\x1b[C",
			Self::ArrowLeft => b"\x1b[D",
			Self::Enter => b"\r",
		}
	}

	pub fn label(self) -> &'static str {
		match self {
			Self::Escape => "Esc",
			Self::Tab => "Tab",
			Self::CtrlC => "Ctrl+C",
			Self::CtrlD => "Ctrl+D",
			Self::CtrlZ => "Ctrl+Z",
			Self::ArrowUp => "Up",
			Self::ArrowDown => "Down",
			Self::ArrowRight => "Right",
			Self::ArrowLeft => "Left",
			Self::Enter => "Enter",
		}
	}
}

impl fmt::Display for VirtualKey {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.label())
	}
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown virtual key: {0}")]
pub struct UnknownKey(pub String);

impl FromStr for VirtualKey {
	type Err = UnknownKey;

	/// Accepts the palette labels case-insensitively, plus a few common
	/// spellings (`escape`, `ctrl-c`, `^c`, `return`, `arrowup`).
	fn from_str(s: &str) -> Result<Self, Self::Err> {
		let normalised: String = s
			.trim()
			.to_ascii_lowercase()
			.chars()
			.filter(|c| !matches!(c, '+' | '-' | '_' | ' '))
			.collect();

		let key = match normalised.as_str() {
			"esc" | "escape" => Self::Escape,
			"tab" => Self::Tab,
			"ctrlc" | "^c" => Self::CtrlC,
			"ctrld" | "^d" => Self::CtrlD,
			"ctrlz" | "^z" => Self::CtrlZ,
			"up" | "arrowup" => Self::ArrowUp,
			"down" | "arrowdown" => Self::ArrowDown,
			"right" | "arrowright" => Self::ArrowRight,
			"left" | "arrowleft" => Self::ArrowLeft,
			"enter" | "return" => Self::Enter,
			_ => return Err(UnknownKey(s.to_string())),
		};
		Ok(key)
	}
}
