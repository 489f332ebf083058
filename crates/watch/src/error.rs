//! Failure taxonomy for watched queries.

use std::error::Error as StdError;
use std::fmt;

use thiserror::Error;

/// Transport-level failure codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransportErrorKind {
	/// The request was cancelled by its owner before it completed.
	Cancelled,
	/// The request did not complete in time.
	TimedOut,
	/// The host name could not be resolved.
	HostNotFound,
	/// The remote end refused or reset the connection.
	ConnectionRefused,
	/// Any other transport failure.
	Other,
}

impl TransportErrorKind {
	/// Stable label for display and log fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::Cancelled => "cancelled",
			Self::TimedOut => "timed out",
			Self::HostNotFound => "host not found",
			Self::ConnectionRefused => "connection refused",
			Self::Other => "transport failure",
		}
	}
}

impl fmt::Display for TransportErrorKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// Error reported by the transport itself.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind}: {message}")]
pub struct TransportError {
	kind: TransportErrorKind,
	message: String,
}

impl TransportError {
	/// Creates a transport error.
	pub fn new(kind: TransportErrorKind, message: impl Into<String>) -> Self {
		Self {
			kind,
			message: message.into(),
		}
	}

	/// The error a transport reports for a request its owner cancelled.
	pub fn cancelled() -> Self {
		Self::new(TransportErrorKind::Cancelled, "operation cancelled")
	}

	/// Returns the failure code.
	pub const fn kind(&self) -> TransportErrorKind {
		self.kind
	}

	/// Returns the human-readable detail.
	pub fn message(&self) -> &str {
		&self.message
	}

	/// Returns true for the transport's own cancellation code.
	pub const fn is_cancelled(&self) -> bool {
		matches!(self.kind, TransportErrorKind::Cancelled)
	}
}

/// Errors delivered by a watch.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum WatchError {
	/// A transport error reported directly.
	#[error(transparent)]
	Transport(#[from] TransportError),
	/// A transport error wrapped by the network layer.
	#[error("network request `{operation}` failed")]
	Network {
		/// What the network layer was doing.
		operation: String,
		/// The underlying transport error.
		#[source]
		source: TransportError,
	},
	/// The server executed the query and reported an error.
	#[error("query execution failed: {0}")]
	Execution(String),
	/// A cache-only fetch found nothing cached.
	#[error("no cached data for query")]
	CacheMiss,
}

impl WatchError {
	/// Wraps a transport error in the network envelope.
	pub fn network(operation: impl Into<String>, source: TransportError) -> Self {
		Self::Network {
			operation: operation.into(),
			source,
		}
	}
}

/// Classifies errors caused by the watcher's own cancellation requests.
pub trait Cancellation {
	/// Returns true if this failure is the transport reporting a cancellation
	/// it was asked to perform.
	fn is_cancellation(&self) -> bool;
}

impl Cancellation for TransportError {
	fn is_cancellation(&self) -> bool {
		self.is_cancelled()
	}
}

impl Cancellation for WatchError {
	fn is_cancellation(&self) -> bool {
		match self {
			// transparent: the inner error is not part of the source chain
			Self::Transport(err) => err.is_cancelled(),
			other => chain_has_cancellation(other),
		}
	}
}

/// Returns true if `err` or any error in its `source()` chain is a cancelled
/// [`TransportError`].
///
/// Only the cancellation code matches; timeouts, resolution and connection
/// failures never do, whatever envelope they arrive in.
pub fn chain_has_cancellation(err: &(dyn StdError + 'static)) -> bool {
	std::iter::successors(Some(err), |&e| e.source())
		.any(|e| e.downcast_ref::<TransportError>().is_some_and(TransportError::is_cancelled))
}
