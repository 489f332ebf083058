//! Lifecycle and merge logic of [`PaginatedWatcher`].

use std::hash::Hash;
use std::sync::{Arc, Weak};

use folio_watch::{Cancellation, ExecutionContext, FetchStrategy, Fetched, ResultHandler, WatchHandle, WatchSource};
use parking_lot::Mutex;

use crate::{Accumulator, Page, PageResponse, PagingError, Transformed, WatcherOptions};

type PageQueryFn<C, Q> = dyn Fn(&Page<C>) -> Option<Q> + Send + Sync;
type TransformFn<D, M, C> = dyn Fn(D) -> Option<Transformed<M, C>> + Send + Sync;
type CombineFn<M, T> = dyn Fn(PageResponse<M>) -> T + Send + Sync;
type SinkFn<T, E> = dyn Fn(Result<T, E>) + Send + Sync;

/// Caller-supplied behaviour of a [`PaginatedWatcher`].
pub struct PagerCallbacks<S: WatchSource, C, M, T> {
	page_query: Arc<PageQueryFn<C, S::Query>>,
	transform: Arc<TransformFn<S::Data, M, C>>,
	combine: Arc<CombineFn<M, T>>,
	on_result: Arc<SinkFn<T, S::Error>>,
}

impl<S: WatchSource, C, M, T> PagerCallbacks<S, C, M, T> {
	/// Bundles the four callbacks.
	///
	/// * `page_query` builds the query for the page after `page`, or declines.
	/// * `transform` extracts a page model and its continuation from raw data.
	/// * `combine` folds the merged view into the emitted value.
	/// * `on_result` receives every emitted value and every genuine failure.
	pub fn new(
		page_query: impl Fn(&Page<C>) -> Option<S::Query> + Send + Sync + 'static,
		transform: impl Fn(S::Data) -> Option<Transformed<M, C>> + Send + Sync + 'static,
		combine: impl Fn(PageResponse<M>) -> T + Send + Sync + 'static,
		on_result: impl Fn(Result<T, S::Error>) + Send + Sync + 'static,
	) -> Self {
		Self {
			page_query: Arc::new(page_query),
			transform: Arc::new(transform),
			combine: Arc::new(combine),
			on_result: Arc::new(on_result),
		}
	}
}

/// Which subscription a delivery came from.
#[derive(Debug, Clone, Copy)]
enum Origin {
	Initial,
	Subsequent { generation: u64 },
}

/// Request made on the first-page watch before `start` got its handle back.
#[derive(Debug, Clone, Copy)]
enum Pending {
	Refetch(FetchStrategy),
	Cancel,
}

struct State<C, M> {
	accumulator: Accumulator<C, M>,
	page: Option<Page<C>>,
	started: bool,
	initial: Option<Arc<dyn WatchHandle>>,
	pending: Option<Pending>,
	subsequent: Vec<Box<dyn WatchHandle>>,
	generation: u64,
}

struct Inner<S: WatchSource, C, M, T> {
	source: S,
	options: WatcherOptions,
	context: ExecutionContext,
	callbacks: PagerCallbacks<S, C, M, T>,
	state: Mutex<State<C, M>>,
}

/// One live, ordered result assembled from independently watched pages.
///
/// The first page is watched from [`start`](Self::start) for the life of the
/// watcher; [`fetch_more`](Self::fetch_more) opens one more watch per page.
/// All watches report into one handler. State is guarded by a single mutex
/// that is released before calling into the source or the result callback, so
/// sources may deliver inline and callbacks may call back into the watcher.
///
/// Dropping the watcher cancels every watch.
pub struct PaginatedWatcher<S: WatchSource, C, M, T> {
	inner: Arc<Inner<S, C, M, T>>,
}

impl<S, C, M, T> PaginatedWatcher<S, C, M, T>
where
	S: WatchSource,
	C: Eq + Hash + Clone + Send + Sync + 'static,
	M: Clone + Send + 'static,
	T: 'static,
{
	/// Creates a watcher delivering on the context named by `options`.
	pub fn new(source: S, options: WatcherOptions, callbacks: PagerCallbacks<S, C, M, T>) -> Self {
		let context = options.context.into_context();
		Self::with_context(source, options, context, callbacks)
	}

	/// Creates a watcher delivering on `context`, ignoring `options.context`.
	pub fn with_context(
		source: S,
		options: WatcherOptions,
		context: ExecutionContext,
		callbacks: PagerCallbacks<S, C, M, T>,
	) -> Self {
		Self {
			inner: Arc::new(Inner {
				source,
				options,
				context,
				callbacks,
				state: Mutex::new(State {
					accumulator: Accumulator::new(),
					page: None,
					started: false,
					initial: None,
					pending: None,
					subsequent: Vec::new(),
					generation: 0,
				}),
			}),
		}
	}

	/// Opens the first-page watch with the configured strategy.
	///
	/// Later restarts go through [`fetch`](Self::fetch).
	pub fn start(&self, query: S::Query) -> Result<(), PagingError> {
		{
			let mut state = self.inner.state.lock();
			if state.started {
				return Err(PagingError::AlreadyStarted);
			}
			state.started = true;
		}

		let strategy = self.inner.options.strategy;
		tracing::debug!(%strategy, "paging.start");
		let handle: Arc<dyn WatchHandle> =
			Arc::from(self.inner.source.watch(query, strategy, self.inner.context.clone(), self.subscriber(Origin::Initial)));
		let pending = {
			let mut state = self.inner.state.lock();
			state.initial = Some(Arc::clone(&handle));
			state.pending.take()
		};

		// requests made by callbacks delivered from inside `watch`
		match pending {
			Some(Pending::Refetch(strategy)) => {
				tracing::debug!(%strategy, "paging.start: applying refetch made during open");
				handle.refetch(strategy);
			}
			Some(Pending::Cancel) => {
				tracing::debug!("paging.start: applying cancel made during open");
				handle.cancel();
			}
			None => {}
		}
		Ok(())
	}

	/// Starts over: forgets every page, cancels next-page watches and
	/// restarts the first-page watch with `strategy`.
	pub fn fetch(&self, strategy: FetchStrategy) -> Result<(), PagingError> {
		let (initial, stale) = {
			let mut state = self.inner.state.lock();
			if !state.started {
				return Err(PagingError::NotStarted);
			}
			state.generation = state.generation.wrapping_add(1);
			state.accumulator.clear();
			state.page = None;
			tracing::debug!(generation = state.generation, subsequent = state.subsequent.len(), %strategy, "paging.fetch");
			if state.initial.is_none() {
				state.pending = Some(Pending::Refetch(strategy));
			}
			(state.initial.clone(), std::mem::take(&mut state.subsequent))
		};

		for handle in stale {
			handle.cancel();
		}
		if let Some(initial) = initial {
			initial.refetch(strategy);
		}
		Ok(())
	}

	/// [`fetch`](Self::fetch) with `strategy`, or from the network when `None`.
	pub fn refetch(&self, strategy: Option<FetchStrategy>) -> Result<(), PagingError> {
		self.fetch(strategy.unwrap_or(FetchStrategy::NetworkOnly))
	}

	/// Opens a watch on the page after the current one.
	///
	/// Returns false without side effects when no page has arrived yet, the
	/// current page is the last, the subsequent-watch cap is reached, or the
	/// page-query builder declines. Calls made before an earlier one resolves
	/// each open their own watch.
	pub fn fetch_more(&self, strategy: FetchStrategy) -> bool {
		let (page, generation) = {
			let state = self.inner.state.lock();
			let Some(page) = state.page.clone() else {
				tracing::debug!("paging.fetch_more: no page yet");
				return false;
			};
			if !page.can_advance() {
				tracing::debug!("paging.fetch_more: on last page");
				return false;
			}
			if self.at_cap(&state) {
				tracing::debug!(subsequent = state.subsequent.len(), "paging.fetch_more: at subsequent cap");
				return false;
			}
			(page, state.generation)
		};

		let Some(query) = (self.inner.callbacks.page_query)(&page) else {
			tracing::debug!("paging.fetch_more: page query declined");
			return false;
		};

		let handle = self.inner.source.watch(
			query,
			strategy,
			self.inner.context.clone(),
			self.subscriber(Origin::Subsequent { generation }),
		);

		let mut state = self.inner.state.lock();
		if state.generation != generation {
			drop(state);
			tracing::debug!(generation, "paging.fetch_more: reset while opening, watch cancelled");
			handle.cancel();
			return false;
		}
		state.subsequent.push(handle);
		tracing::debug!(generation, subsequent = state.subsequent.len(), %strategy, "paging.fetch_more");
		true
	}

	/// Cancels every watch. Pages received so far are kept; a later
	/// [`fetch`](Self::fetch) restarts from the first page.
	pub fn cancel(&self) {
		let (initial, subsequent) = {
			let mut state = self.inner.state.lock();
			if !state.started {
				return;
			}
			state.generation = state.generation.wrapping_add(1);
			tracing::debug!(generation = state.generation, subsequent = state.subsequent.len(), "paging.cancel");
			if state.initial.is_none() {
				state.pending = Some(Pending::Cancel);
			}
			(state.initial.clone(), std::mem::take(&mut state.subsequent))
		};

		if let Some(initial) = initial {
			initial.cancel();
		}
		for handle in subsequent {
			handle.cancel();
		}
	}

	/// Returns true if [`fetch_more`](Self::fetch_more) would get past its
	/// page and cap checks. The page-query builder is not consulted.
	pub fn can_fetch_more(&self) -> bool {
		let state = self.inner.state.lock();
		state.page.as_ref().is_some_and(Page::can_advance) && !self.at_cap(&state)
	}

	/// Continuation state of the most recently received page.
	pub fn current_page(&self) -> Option<Page<C>> {
		self.inner.state.lock().page.clone()
	}

	/// Number of live next-page watches.
	pub fn subsequent_count(&self) -> usize {
		self.inner.state.lock().subsequent.len()
	}

	/// Number of resets and cancellations so far.
	pub fn generation(&self) -> u64 {
		self.inner.state.lock().generation
	}

	/// Returns true once [`start`](Self::start) has been called.
	pub fn is_started(&self) -> bool {
		self.inner.state.lock().started
	}

	fn at_cap(&self, state: &State<C, M>) -> bool {
		self.inner.options.max_subsequent.is_some_and(|max| state.subsequent.len() >= max)
	}

	fn subscriber(&self, origin: Origin) -> ResultHandler<S::Data, S::Error> {
		let inner: Weak<Inner<S, C, M, T>> = Arc::downgrade(&self.inner);
		Arc::new(move |result: Result<Fetched<S::Data>, S::Error>| {
			if let Some(inner) = inner.upgrade() {
				inner.handle(origin, result);
			}
		})
	}
}

impl<S, C, M, T> Inner<S, C, M, T>
where
	S: WatchSource,
	C: Eq + Hash + Clone + Send + Sync + 'static,
	M: Clone + Send + 'static,
	T: 'static,
{
	fn handle(&self, origin: Origin, result: Result<Fetched<S::Data>, S::Error>) {
		let fetched = match result {
			Ok(fetched) => fetched,
			Err(err) if err.is_cancellation() => {
				tracing::trace!(?origin, "paging.handle: cancellation dropped");
				return;
			}
			Err(err) => {
				if self.is_stale(&self.state.lock(), origin) {
					tracing::trace!(?origin, "paging.handle: stale failure dropped");
					return;
				}
				tracing::warn!(?origin, "paging.handle: watch failed");
				(self.callbacks.on_result)(Err(err));
				return;
			}
		};

		let Some(Transformed { model: Some(model), page }) = (self.callbacks.transform)(fetched.data) else {
			tracing::trace!(?origin, "paging.handle: no model");
			return;
		};

		let response = {
			let mut state = self.state.lock();
			if self.is_stale(&state, origin) {
				tracing::trace!(?origin, generation = state.generation, "paging.handle: stale result dropped");
				return;
			}
			let cursor = page.as_ref().and_then(|page| page.end_cursor.clone());
			state.accumulator.upsert(cursor, model.clone());
			state.page = page;
			tracing::trace!(?origin, pages = state.accumulator.len(), "paging.handle: merged");
			PageResponse {
				all_responses: state.accumulator.responses(),
				most_recent: model,
				source: fetched.source,
			}
		};

		let merged = (self.callbacks.combine)(response);
		(self.callbacks.on_result)(Ok(merged));
	}

	fn is_stale(&self, state: &State<C, M>, origin: Origin) -> bool {
		match origin {
			Origin::Initial => false,
			Origin::Subsequent { generation } => self.options.discard_stale && generation != state.generation,
		}
	}
}

impl<S: WatchSource, C, M, T> Drop for PaginatedWatcher<S, C, M, T> {
	fn drop(&mut self) {
		let (initial, subsequent) = {
			let mut state = self.inner.state.lock();
			(state.initial.take(), std::mem::take(&mut state.subsequent))
		};
		if initial.is_some() || !subsequent.is_empty() {
			tracing::debug!(subsequent = subsequent.len(), "paging.drop");
		}
		if let Some(initial) = initial {
			initial.cancel();
		}
		for handle in subsequent {
			handle.cancel();
		}
	}
}
