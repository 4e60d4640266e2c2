// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Key-chord overlay for the virtual keyboard.
//!
//! Pressing the prefix byte and then a letter triggers a virtual key without
//! it reaching the remote shell as typed text. `q` detaches, a second prefix
//! sends the prefix byte itself, and any other byte cancels the chord.

use kubeterm_session::VirtualKey;

pub const DETACH_LETTER: char = 'q';

/// Letters that follow the prefix, in palette order.
pub const KEY_BINDINGS: [(char, VirtualKey); 10] = [
	('e', VirtualKey::Escape),
	('t', VirtualKey::Tab),
	('c', VirtualKey::CtrlC),
	('d', VirtualKey::CtrlD),
	('z', VirtualKey::CtrlZ),
	('k', VirtualKey::ArrowUp),
	('j', VirtualKey::ArrowDown),
	('l', VirtualKey::ArrowRight),
	('h', VirtualKey::ArrowLeft),
	('m', VirtualKey::Enter),
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChordAction {
	/// Bytes to pass through to the shell unchanged.
	Forward(Vec<u8>),
	Key(VirtualKey),
	Detach,
}

pub fn letter_for(key: VirtualKey) -> Option<char> {
	KEY_BINDINGS
		.iter()
		.find(|(_, bound)| *bound == key)
		.map(|(letter, _)| *letter)
}

fn key_for(letter: u8) -> Option<VirtualKey> {
	let letter = letter.to_ascii_lowercase() as char;
	KEY_BINDINGS
		.iter()
		.find(|(bound, _)| *bound == letter)
		.map(|(_, key)| *key)
}

/// Splits raw stdin bytes into pass-through input and chord actions.
///
/// A chord may span reads; the pending prefix is kept between calls.
#[derive(Debug)]
pub struct ChordDecoder {
	prefix: u8,
	pending: bool,
}

impl ChordDecoder {
	pub fn new(prefix: u8) -> Self {
		Self {
			prefix,
			pending: false,
		}
	}

	pub fn feed(&mut self, input: &[u8]) -> Vec<ChordAction> {
		let mut actions = Vec::new();
		let mut plain = Vec::new();

		for &byte in input {
			if !self.pending {
				if byte == self.prefix {
					self.pending = true;
				} else {
					plain.push(byte);
				}
				continue;
			}

			self.pending = false;
			if byte == self.prefix {
				plain.push(byte);
				continue;
			}

			let action = if byte.to_ascii_lowercase() == DETACH_LETTER as u8 {
				Some(ChordAction::Detach)
			} else {
				key_for(byte).map(ChordAction::Key)
			};
			if let Some(action) = action {
				flush(&mut plain, &mut actions);
				let detach = action == ChordAction::Detach;
				actions.push(action);
				if detach {
					return actions;
				}
			} else {
				tracing::debug!(byte, "chord cancelled");
			}
		}

		flush(&mut plain, &mut actions);
		actions
	}
}

fn flush(plain: &mut Vec<u8>, actions: &mut Vec<ChordAction>) {
	if !plain.is_empty() {
		actions.push(ChordAction::Forward(std::mem::take(plain)));
	}
}
