// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Exec endpoint URL construction.

use url::Url;

use crate::error::{SessionError, SessionResult};
use crate::target::SessionTarget;

/// Path of the exec WebSocket relative to the dashboard origin.
pub const DEFAULT_EXEC_PATH: &str = "/api/exec";

/// Where exec sockets live for a given dashboard origin.
///
/// The scheme is decided once from the origin: a secure origin (`https`, or an
/// explicit `wss`) yields `wss`, anything served over `http`/`ws` yields `ws`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
	base: Url,
	exec_path: String,
}

impl Endpoint {
	pub fn new(origin: &str, exec_path: &str) -> SessionResult<Self> {
		let origin_url = Url::parse(origin).map_err(|source| SessionError::InvalidOrigin {
			origin: origin.to_string(),
			source,
		})?;
		Self::from_origin(&origin_url, exec_path)
	}

	pub fn from_origin(origin: &Url, exec_path: &str) -> SessionResult<Self> {
		let ws_scheme = match origin.scheme() {
			"https" | "wss" => "wss",
			"http" | "ws" => "ws",
			other => {
				return Err(SessionError::UnsupportedScheme {
					scheme: other.to_string(),
				})
			}
		};

		let mut base = origin.clone();
		base
			.set_scheme(ws_scheme)
			.map_err(|_| SessionError::UnsupportedScheme {
				scheme: origin.scheme().to_string(),
			})?;
		base.set_query(None);
		base.set_fragment(None);

		Ok(Self {
			base,
			exec_path: exec_path.to_string(),
		})
	}

	pub fn is_secure(&self) -> bool {
		self.base.scheme() == "wss"
	}

	/// Build the socket URL for `target`.
	///
	/// The origin's own path is kept as a prefix, so a dashboard mounted under
	/// `/k8s/` resolves to `/k8s/api/exec`.
	pub fn exec_url(&self, target: &SessionTarget) -> Url {
		let prefix = self.base.path().trim_end_matches('/');
		let suffix = self.exec_path.trim_start_matches('/');

		let mut url = self.base.clone();
		url.set_path(&format!("{prefix}/{suffix}"));
		target.apply_to(&mut url);
		url
	}
}
