//! Errors from the paginated watcher's own API.
//!
//! Failures of the underlying watches are not wrapped here; they reach the
//! result callback unchanged.

use thiserror::Error;

/// Misuse of the watcher lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PagingError {
	/// `start` was called on a watcher that already started.
	#[error("paginated watcher already started")]
	AlreadyStarted,
	/// A fetch was requested before `start`.
	#[error("paginated watcher not started")]
	NotStarted,
}

/// Errors loading [`WatcherOptions`](crate::WatcherOptions).
#[derive(Debug, Error)]
pub enum OptionsError {
	/// The text is not valid TOML or does not match the options schema.
	#[error("invalid watcher options: {0}")]
	Toml(#[from] toml::de::Error),
}
