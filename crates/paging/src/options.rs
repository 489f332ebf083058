use folio_watch::{ExecutionContext, FetchStrategy, TaskClass};
use serde::{Deserialize, Serialize};

use crate::OptionsError;

/// Where a watcher's result callbacks run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ContextKind {
	/// On the thread that delivered the result.
	#[default]
	Inline,
	/// In order, on an interactive worker queue.
	Interactive,
	/// In order, on a background worker queue.
	Background,
}

impl ContextKind {
	/// Builds the execution context for this kind.
	///
	/// Queue kinds spawn a drain task on the worker runtime.
	pub fn into_context(self) -> ExecutionContext {
		match self {
			Self::Inline => ExecutionContext::Inline,
			Self::Interactive => ExecutionContext::queue(TaskClass::Interactive),
			Self::Background => ExecutionContext::queue(TaskClass::Background),
		}
	}
}

/// Tunables of a [`PaginatedWatcher`](crate::PaginatedWatcher).
///
/// ```toml
/// strategy = "cache-then-network"
/// context = "interactive"
/// discard-stale = true
/// max-subsequent = 64
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields, rename_all = "kebab-case")]
pub struct WatcherOptions {
	/// Strategy of the first page when the watcher starts.
	pub strategy: FetchStrategy,
	/// Where result callbacks run.
	pub context: ContextKind,
	/// Drop results of next-page watches opened before the last reset.
	///
	/// The first-page watch survives resets and is never dropped.
	pub discard_stale: bool,
	/// Upper bound on live next-page watches; `fetch_more` declines at the cap.
	pub max_subsequent: Option<usize>,
}

impl Default for WatcherOptions {
	fn default() -> Self {
		Self {
			strategy: FetchStrategy::CacheThenNetwork,
			context: ContextKind::Inline,
			discard_stale: true,
			max_subsequent: None,
		}
	}
}

impl WatcherOptions {
	/// Parses options from TOML. Missing keys take their defaults.
	pub fn from_toml(text: &str) -> Result<Self, OptionsError> {
		Ok(toml::from_str(text)?)
	}
}

#[cfg(test)]
mod tests {
	use pretty_assertions::assert_eq;

	use super::*;

	#[test]
	fn empty_document_is_default() {
		assert_eq!(WatcherOptions::from_toml("").ok(), Some(WatcherOptions::default()));
	}

	#[test]
	fn parses_every_key() {
		let options = WatcherOptions::from_toml(
			r#"
			strategy = "network-only"
			context = "background"
			discard-stale = false
			max-subsequent = 8
			"#,
		)
		.expect("valid options");

		assert_eq!(
			options,
			WatcherOptions {
				strategy: FetchStrategy::NetworkOnly,
				context: ContextKind::Background,
				discard_stale: false,
				max_subsequent: Some(8),
			}
		);
	}

	#[test]
	fn rejects_unknown_keys_and_values() {
		assert!(WatcherOptions::from_toml("retries = 3").is_err());
		assert!(WatcherOptions::from_toml(r#"strategy = "sometimes""#).is_err());
	}
}
