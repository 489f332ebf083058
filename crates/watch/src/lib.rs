//! Contract of a watched query: one query turned into a live stream of results
//! until cancelled.
//!
//! Paginated consumers sit on top of this crate and only need the pieces
//! exported here:
//!
//! * [`WatchSource`] / [`WatchHandle`]: open a watch, restart it, cancel it.
//! * [`FetchStrategy`]: whether a fetch reads the cache, the network, or both.
//! * [`ExecutionContext`]: where result callbacks run.
//! * [`WatchError`] and [`Cancellation`]: failure taxonomy, including the
//!   classifier that recognizes a transport's own "operation cancelled" report.
//!
//! [`MemorySource`] is an in-process implementation backed by an async
//! [`Fetcher`] and a shared cache.

#![warn(missing_docs)]

mod context;
mod error;
mod memory;
mod source;
mod strategy;

pub use context::{Dispatch, ExecutionContext, Job, SerialQueue};
pub use error::{Cancellation, TransportError, TransportErrorKind, WatchError, chain_has_cancellation};
pub use memory::{Fetcher, MemorySource, MemoryWatchHandle};
pub use source::{ResultHandler, WatchHandle, WatchSource};
pub use strategy::{FetchStrategy, Fetched, ResultSource};

/// Re-export so callers naming a worker-backed context need no extra dependency.
pub use folio_worker::TaskClass;
