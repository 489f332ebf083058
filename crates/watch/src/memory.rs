//! In-process watch source backed by an async fetcher and a shared cache.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use async_trait::async_trait;
use folio_worker::{GenerationClock, GenerationToken, TaskClass};
use parking_lot::Mutex;

use crate::{ExecutionContext, FetchStrategy, Fetched, ResultHandler, TransportError, WatchError, WatchHandle, WatchSource};

/// Network side of a [`MemorySource`].
#[async_trait]
pub trait Fetcher<Q, D>: Send + Sync + 'static {
	/// Executes `query` against the network.
	async fn fetch(&self, query: &Q) -> Result<D, TransportError>;
}

/// Watch source keeping results in memory.
///
/// Network results are written to the cache, and every cache write is
/// re-delivered to the other live watches of the same query.
pub struct MemorySource<Q, D> {
	shared: Arc<Shared<Q, D>>,
}

impl<Q, D> Clone for MemorySource<Q, D> {
	fn clone(&self) -> Self {
		Self {
			shared: Arc::clone(&self.shared),
		}
	}
}

struct Shared<Q, D> {
	fetcher: Arc<dyn Fetcher<Q, D>>,
	cache: Mutex<HashMap<Q, D>>,
	watches: Mutex<HashMap<u64, Arc<LiveWatch<Q, D>>>>,
	next_id: AtomicU64,
}

struct LiveWatch<Q, D> {
	id: u64,
	query: Q,
	context: ExecutionContext,
	on_result: ResultHandler<D, WatchError>,
	clock: GenerationClock,
	run: Mutex<Option<GenerationToken>>,
}

impl<Q, D> MemorySource<Q, D>
where
	Q: Eq + Hash + Clone + Send + Sync + 'static,
	D: Clone + Send + Sync + 'static,
{
	/// Creates an empty source fetching through `fetcher`.
	pub fn new(fetcher: impl Fetcher<Q, D>) -> Self {
		Self {
			shared: Arc::new(Shared {
				fetcher: Arc::new(fetcher),
				cache: Mutex::new(HashMap::new()),
				watches: Mutex::new(HashMap::new()),
				next_id: AtomicU64::new(0),
			}),
		}
	}

	/// Writes `data` to the cache and re-delivers it to live watches of `query`.
	pub fn write(&self, query: Q, data: D) {
		self.shared.cache.lock().insert(query.clone(), data.clone());
		self.shared.publish(&query, &data, None);
	}

	/// Returns the cached data for `query`.
	pub fn cached(&self, query: &Q) -> Option<D> {
		self.shared.cache.lock().get(query).cloned()
	}

	/// Number of watches that have not been cancelled.
	pub fn live_watches(&self) -> usize {
		self.shared.watches.lock().len()
	}
}

impl<Q, D> Shared<Q, D>
where
	Q: Eq + Hash + Clone + Send + Sync + 'static,
	D: Clone + Send + Sync + 'static,
{
	fn publish(&self, query: &Q, data: &D, skip: Option<u64>) {
		let targets: Vec<_> = self
			.watches
			.lock()
			.values()
			.filter(|watch| watch.query == *query && Some(watch.id) != skip)
			.cloned()
			.collect();
		for watch in targets {
			watch.deliver(Ok(Fetched::cache(data.clone())));
		}
	}
}

impl<Q, D> LiveWatch<Q, D>
where
	D: Send + 'static,
{
	fn deliver(&self, result: Result<Fetched<D>, WatchError>) {
		let on_result = Arc::clone(&self.on_result);
		self.context.run(Box::new(move || on_result(result)));
	}

	fn begin_run(&self) -> GenerationToken {
		let mut run = self.run.lock();
		if let Some(previous) = run.take() {
			previous.cancel();
		}
		self.clock.advance();
		let token = self.clock.token();
		*run = Some(token.clone());
		token
	}

	fn cancel_run(&self) {
		if let Some(token) = self.run.lock().take() {
			token.cancel();
		}
	}
}

fn start_run<Q, D>(shared: &Arc<Shared<Q, D>>, watch: &Arc<LiveWatch<Q, D>>, strategy: FetchStrategy)
where
	Q: Eq + Hash + Clone + Send + Sync + 'static,
	D: Clone + Send + Sync + 'static,
{
	let token = watch.begin_run();
	let cached = if strategy.reads_cache() {
		shared.cache.lock().get(&watch.query).cloned()
	} else {
		None
	};
	tracing::trace!(watch = watch.id, generation = token.generation(), %strategy, "watch.run.start");

	let fetcher = Arc::clone(&shared.fetcher);
	let shared = Arc::downgrade(shared);
	let watch = Arc::clone(watch);
	folio_worker::spawn(TaskClass::Background, async move {
		if token.is_cancelled() {
			return;
		}

		match cached {
			Some(data) => {
				watch.deliver(Ok(Fetched::cache(data)));
				if matches!(strategy, FetchStrategy::CacheFirst | FetchStrategy::CacheOnly) {
					return;
				}
			}
			None if !strategy.reads_network() => {
				watch.deliver(Err(WatchError::CacheMiss));
				return;
			}
			None => {}
		}

		let result = tokio::select! {
			biased;
			() = token.cancelled() => Err(TransportError::cancelled()),
			result = fetcher.fetch(&watch.query) => result,
		};

		match result {
			Ok(_) if !watch.clock.is_current(token.generation()) => {
				tracing::trace!(watch = watch.id, generation = token.generation(), "watch.run.superseded");
			}
			Ok(data) => {
				if let Some(shared) = shared.upgrade() {
					shared.cache.lock().insert(watch.query.clone(), data.clone());
					shared.publish(&watch.query, &data, Some(watch.id));
				}
				watch.deliver(Ok(Fetched::network(data)));
			}
			Err(err) => {
				tracing::trace!(watch = watch.id, generation = token.generation(), error = %err, "watch.run.failed");
				watch.deliver(Err(WatchError::network("fetch", err)));
			}
		}
	});
}

/// Handle returned by [`MemorySource::watch`](WatchSource::watch).
pub struct MemoryWatchHandle<Q, D> {
	shared: Weak<Shared<Q, D>>,
	watch: Arc<LiveWatch<Q, D>>,
}

impl<Q, D> WatchHandle for MemoryWatchHandle<Q, D>
where
	Q: Eq + Hash + Clone + Send + Sync + 'static,
	D: Clone + Send + Sync + 'static,
{
	fn cancel(&self) {
		self.watch.cancel_run();
		if let Some(shared) = self.shared.upgrade() {
			shared.watches.lock().remove(&self.watch.id);
		}
		tracing::debug!(watch = self.watch.id, "watch.cancel");
	}

	fn refetch(&self, strategy: FetchStrategy) {
		let Some(shared) = self.shared.upgrade() else {
			return;
		};
		shared.watches.lock().insert(self.watch.id, Arc::clone(&self.watch));
		start_run(&shared, &self.watch, strategy);
	}
}

impl<Q, D> WatchSource for MemorySource<Q, D>
where
	Q: Eq + Hash + Clone + Send + Sync + 'static,
	D: Clone + Send + Sync + 'static,
{
	type Query = Q;
	type Data = D;
	type Error = WatchError;

	fn watch(
		&self,
		query: Q,
		strategy: FetchStrategy,
		context: ExecutionContext,
		on_result: ResultHandler<D, WatchError>,
	) -> Box<dyn WatchHandle> {
		let id = self.shared.next_id.fetch_add(1, Ordering::Relaxed);
		let watch = Arc::new(LiveWatch {
			id,
			query,
			context,
			on_result,
			clock: GenerationClock::new(),
			run: Mutex::new(None),
		});
		self.shared.watches.lock().insert(id, Arc::clone(&watch));
		tracing::debug!(watch = id, %strategy, "watch.open");
		start_run(&self.shared, &watch, strategy);
		Box::new(MemoryWatchHandle {
			shared: Arc::downgrade(&self.shared),
			watch,
		})
	}
}
