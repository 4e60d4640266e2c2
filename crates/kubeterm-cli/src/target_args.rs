// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Resolving a session target from flags, a dashboard link, and config.

use anyhow::{Context, Result};
use clap::Args;
use kubeterm_config::{KubetermConfig, SessionConfig};
use kubeterm_session::{Endpoint, SessionTarget};
use url::Url;

#[derive(Args, Debug, Clone, Default)]
pub struct TargetArgs {
	/// Kubernetes context (defaults to session.default_context)
	#[arg(long)]
	pub context: Option<String>,

	/// Namespace (defaults to session.default_namespace)
	#[arg(long, short)]
	pub namespace: Option<String>,

	/// Pod name
	#[arg(long, short)]
	pub pod: Option<String>,

	/// Container name (the server picks one when omitted)
	#[arg(long, short)]
	pub container: Option<String>,

	/// Dashboard link whose query names the pod, e.g.
	/// https://dash.example/exec?context=prod&namespace=default&pod=web-1
	#[arg(long)]
	pub link: Option<Url>,
}

impl TargetArgs {
	/// Flags win over the link, which wins over configured defaults.
	pub fn resolve(&self, defaults: &SessionConfig) -> SessionTarget {
		let linked = self
			.link
			.as_ref()
			.map(SessionTarget::from_query)
			.unwrap_or_default();

		SessionTarget::new(
			pick(&self.context, linked.context(), defaults.default_context.as_deref()),
			pick(
				&self.namespace,
				linked.namespace(),
				defaults.default_namespace.as_deref(),
			),
			pick(&self.pod, linked.pod(), None),
			non_blank(self.container.as_deref())
				.or_else(|| linked.container())
				.map(str::to_string),
		)
	}

	/// Endpoint for the session: the link's origin when one is given,
	/// otherwise the configured server.
	pub fn endpoint(&self, config: &KubetermConfig) -> Result<Endpoint> {
		let exec_path = &config.server.exec_path;
		match &self.link {
			Some(link) => {
				let mut origin = link.clone();
				origin.set_path("/");
				Endpoint::from_origin(&origin, exec_path)
					.with_context(|| format!("invalid dashboard link {link}"))
			}
			None => Endpoint::new(&config.server.base_url, exec_path)
				.with_context(|| format!("invalid server URL {}", config.server.base_url)),
		}
	}
}

fn non_blank(value: Option<&str>) -> Option<&str> {
	value.filter(|v| !v.trim().is_empty())
}

fn pick(flag: &Option<String>, linked: &str, fallback: Option<&str>) -> String {
	non_blank(flag.as_deref())
		.or_else(|| non_blank(Some(linked)))
		.or(fallback)
		.unwrap_or_default()
		.to_string()
}
