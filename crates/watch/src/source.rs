use std::sync::Arc;

use crate::{Cancellation, ExecutionContext, FetchStrategy, Fetched};

/// Callback receiving every result of one watch.
pub type ResultHandler<D, E> = Arc<dyn Fn(Result<Fetched<D>, E>) + Send + Sync + 'static>;

/// Cancellable handle to one open watch.
pub trait WatchHandle: Send + Sync {
	/// Stops the watch. In-flight work may still report a cancellation error.
	fn cancel(&self);

	/// Restarts the watch's fetch with `strategy`, superseding in-flight work.
	fn refetch(&self, strategy: FetchStrategy);
}

/// Something that turns one query into a live result stream.
pub trait WatchSource: Send + Sync + 'static {
	/// Query type accepted by [`watch`](Self::watch).
	type Query: Send + 'static;
	/// Raw data delivered for a query.
	type Data: Send + 'static;
	/// Failure type delivered for a query.
	type Error: Cancellation + Send + 'static;

	/// Opens a watch on `query`.
	///
	/// Every result is passed to `on_result` through `context`, in order, until
	/// the returned handle is cancelled. Results may be delivered before this
	/// method returns.
	fn watch(
		&self,
		query: Self::Query,
		strategy: FetchStrategy,
		context: ExecutionContext,
		on_result: ResultHandler<Self::Data, Self::Error>,
	) -> Box<dyn WatchHandle>;
}
