// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Session target: which pod (and optionally which container) to open a shell in.

use std::fmt;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{SessionError, SessionResult};

/// Message shown when a target lacks one of the required fields.
pub const MISSING_PARAMETERS_MESSAGE: &str =
	"Missing required parameters: context, namespace, or pod.";

const CONTEXT_KEY: &str = "context";
const NAMESPACE_KEY: &str = "namespace";
const POD_KEY: &str = "pod";
const CONTAINER_KEY: &str = "container";

const TARGET_KEYS: [&str; 4] = [CONTEXT_KEY, NAMESPACE_KEY, POD_KEY, CONTAINER_KEY];

/// Identifies the remote endpoint of an exec session.
///
/// A target is built once from navigation parameters and never mutated. Blank
/// fields are kept as-is so that validation can report them; an empty
/// container is normalised to `None`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SessionTarget {
	context: String,
	namespace: String,
	pod: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	container: Option<String>,
}

impl SessionTarget {
	pub fn new(
		context: impl Into<String>,
		namespace: impl Into<String>,
		pod: impl Into<String>,
		container: Option<String>,
	) -> Self {
		Self {
			context: context.into(),
			namespace: namespace.into(),
			pod: pod.into(),
			container: container.filter(|c| !c.trim().is_empty()),
		}
	}

	/// Read a target from the query parameters of a dashboard or endpoint URL.
	///
	/// The first occurrence of each key wins. Missing keys become empty
	/// fields; call [`SessionTarget::validate`] before connecting.
	pub fn from_query(url: &Url) -> Self {
		let mut context = None;
		let mut namespace = None;
		let mut pod = None;
		let mut container = None;

		for (key, value) in url.query_pairs() {
			let slot = match key.as_ref() {
				CONTEXT_KEY => &mut context,
				NAMESPACE_KEY => &mut namespace,
				POD_KEY => &mut pod,
				CONTAINER_KEY => &mut container,
				_ => continue,
			};
			if slot.is_none() {
				*slot = Some(value.into_owned());
			}
		}

		Self::new(
			context.unwrap_or_default(),
			namespace.unwrap_or_default(),
			pod.unwrap_or_default(),
			container,
		)
	}

	/// Write this target into `url`'s query string.
	///
	/// Target keys come first, in `context`, `namespace`, `pod`, `container`
	/// order, followed by any unrelated parameters already on the URL. Blank
	/// fields are omitted.
	pub fn apply_to(&self, url: &mut Url) {
		let retained: Vec<(String, String)> = url
			.query_pairs()
			.filter(|(key, _)| !TARGET_KEYS.contains(&key.as_ref()))
			.map(|(key, value)| (key.into_owned(), value.into_owned()))
			.collect();

		let mut pairs: Vec<(&str, &str)> = Vec::with_capacity(TARGET_KEYS.len() + retained.len());
		for (key, value) in [
			(CONTEXT_KEY, Some(self.context.as_str())),
			(NAMESPACE_KEY, Some(self.namespace.as_str())),
			(POD_KEY, Some(self.pod.as_str())),
			(CONTAINER_KEY, self.container.as_deref()),
		] {
			if let Some(value) = value.filter(|v| !v.trim().is_empty()) {
				pairs.push((key, value));
			}
		}
		pairs.extend(retained.iter().map(|(k, v)| (k.as_str(), v.as_str())));

		if pairs.is_empty() {
			url.set_query(None);
		} else {
			url.query_pairs_mut().clear().extend_pairs(pairs);
		}
	}

	/// Names of the required fields that are missing or blank.
	pub fn missing_fields(&self) -> Vec<&'static str> {
		[
			(CONTEXT_KEY, &self.context),
			(NAMESPACE_KEY, &self.namespace),
			(POD_KEY, &self.pod),
		]
		.into_iter()
		.filter(|(_, value)| value.trim().is_empty())
		.map(|(key, _)| key)
		.collect()
	}

	pub fn validate(&self) -> SessionResult<()> {
		let missing = self.missing_fields();
		if missing.is_empty() {
			Ok(())
		} else {
			Err(SessionError::MissingParameters { missing })
		}
	}

	pub fn context(&self) -> &str {
		&self.context
	}

	pub fn namespace(&self) -> &str {
		&self.namespace
	}

	pub fn pod(&self) -> &str {
		&self.pod
	}

	pub fn container(&self) -> Option<&str> {
		self.container.as_deref()
	}
}

impl fmt::Display for SessionTarget {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}/{}/{}", self.context, self.namespace, self.pod)?;
		if let Some(container) = &self.container {
			write!(f, ":{container}")?;
		}
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use proptest::prelude::*;

	fn url(s: &str) -> Url {
		Url::parse(s).unwrap()
	}

	#[test]
	fn complete_target_validates() {
		let target = SessionTarget::new("prod", "default", "web-1", Some("app".into()));
		assert!(target.validate().is_ok());
		assert!(target.missing_fields().is_empty());
	}

	#[test]
	fn missing_pod_reports_message() {
		let target = SessionTarget::new("prod", "default", "", None);
		let err = target.validate().unwrap_err();
		assert_eq!(err.to_string(), MISSING_PARAMETERS_MESSAGE);
		assert!(matches!(
			err,
			SessionError::MissingParameters { ref missing } if missing == &vec!["pod"]
		));
	}

	#[test]
	fn whitespace_counts_as_missing() {
		let target = SessionTarget::new("  ", "default", "web-1", None);
		assert_eq!(target.missing_fields(), vec!["context"]);
	}

	#[test]
	fn blank_container_is_none() {
		let target = SessionTarget::new("prod", "default", "web-1", Some("".into()));
		assert_eq!(target.container(), None);
	}

	#[test]
	fn from_query_reads_all_fields() {
		let target = SessionTarget::from_query(&url(
			"https://dash.example/terminal?context=prod&namespace=default&pod=web-1&container=app",
		));
		assert_eq!(target.context(), "prod");
		assert_eq!(target.namespace(), "default");
		assert_eq!(target.pod(), "web-1");
		assert_eq!(target.container(), Some("app"));
	}

	#[test]
	fn from_query_first_occurrence_wins() {
		let target =
			SessionTarget::from_query(&url("https://d.example/?pod=a&pod=b&context=c&namespace=n"));
		assert_eq!(target.pod(), "a");
	}

	#[test]
	fn from_query_without_params_is_invalid() {
		let target = SessionTarget::from_query(&url("https://dash.example/terminal"));
		assert_eq!(
			target.missing_fields(),
			vec!["context", "namespace", "pod"]
		);
	}

	#[test]
	fn apply_to_orders_target_keys_first_and_keeps_others() {
		let mut u = url("https://dash.example/pods?search=web&pod=old");
		SessionTarget::new("prod", "default", "web-1", None).apply_to(&mut u);
		assert_eq!(
			u.query(),
			Some("context=prod&namespace=default&pod=web-1&search=web")
		);
	}

	#[test]
	fn apply_to_empty_target_clears_query() {
		let mut u = url("https://dash.example/pods?pod=old");
		SessionTarget::default().apply_to(&mut u);
		assert_eq!(u.query(), None);
	}

	#[test]
	fn display_includes_container() {
		let target = SessionTarget::new("prod", "default", "web-1", Some("app".into()));
		assert_eq!(target.to_string(), "prod/default/web-1:app");
	}

	proptest! {
		/// Any target with a blank required field is rejected, whatever the
		/// other fields hold.
		#[test]
		fn blank_required_field_always_rejected(
			context in "[a-z0-9-]{1,12}",
			namespace in "[a-z0-9-]{1,12}",
			pod in "[a-z0-9-]{1,12}",
			blank in 0usize..3,
			padding in " {0,3}",
		) {
			let mut fields = [context, namespace, pod];
			fields[blank] = padding;
			let [c, n, p] = fields;
			let target = SessionTarget::new(c, n, p, None);
			prop_assert!(target.validate().is_err());
		}

		/// Writing a target into a URL and reading it back yields the same target.
		#[test]
		fn query_sync_preserves_target(
			context in "[a-zA-Z0-9 &=%/._-]{1,16}",
			namespace in "[a-z0-9-]{1,16}",
			pod in "[a-z0-9.-]{1,16}",
			container in proptest::option::of("[a-z0-9-]{1,8}"),
		) {
			prop_assume!(!context.trim().is_empty());
			let target = SessionTarget::new(context, namespace, pod, container);
			let mut u = url("https://dash.example/terminal");
			target.apply_to(&mut u);
			prop_assert_eq!(SessionTarget::from_query(&u), target);
		}
	}
}
