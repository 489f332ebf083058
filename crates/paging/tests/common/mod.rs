//! Hand-driven watch source for paging tests.

#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use folio_paging::{Page, PageResponse, PagerCallbacks, PaginatedWatcher, Transformed, WatcherOptions};
use folio_watch::{
	ExecutionContext, FetchStrategy, Fetched, ResultHandler, TransportError, TransportErrorKind, WatchError, WatchHandle,
	WatchSource,
};
use parking_lot::Mutex;

/// Query for the page after `after`; `None` is the first page.
pub type Query = Option<String>;

/// Raw data as a test server would return it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Raw {
	pub model: Option<String>,
	pub cursor: Option<String>,
	pub has_next: bool,
}

pub fn raw(model: &str, cursor: &str, has_next: bool) -> Raw {
	Raw {
		model: Some(model.to_owned()),
		cursor: Some(cursor.to_owned()),
		has_next,
	}
}

pub fn cache(raw: Raw) -> Result<Fetched<Raw>, WatchError> {
	Ok(Fetched::cache(raw))
}

pub fn network(raw: Raw) -> Result<Fetched<Raw>, WatchError> {
	Ok(Fetched::network(raw))
}

pub fn cancelled() -> Result<Fetched<Raw>, WatchError> {
	Err(WatchError::network("fetch", TransportError::cancelled()))
}

pub fn timed_out() -> Result<Fetched<Raw>, WatchError> {
	Err(WatchError::network("fetch", TransportError::new(TransportErrorKind::TimedOut, "30s")))
}

/// One watch opened on a [`ManualSource`].
pub struct Subscription {
	pub query: Query,
	pub strategy: FetchStrategy,
	handler: ResultHandler<Raw, WatchError>,
	cancelled: Arc<AtomicBool>,
	refetches: Arc<Mutex<Vec<FetchStrategy>>>,
}

struct ManualHandle {
	cancelled: Arc<AtomicBool>,
	refetches: Arc<Mutex<Vec<FetchStrategy>>>,
}

impl WatchHandle for ManualHandle {
	fn cancel(&self) {
		self.cancelled.store(true, Ordering::SeqCst);
	}

	fn refetch(&self, strategy: FetchStrategy) {
		self.cancelled.store(false, Ordering::SeqCst);
		self.refetches.lock().push(strategy);
	}
}

/// Records every watch and lets the test deliver results to any of them.
#[derive(Clone, Default)]
pub struct ManualSource {
	subscriptions: Arc<Mutex<Vec<Subscription>>>,
	inline: Arc<Mutex<Option<Result<Fetched<Raw>, WatchError>>>>,
}

impl ManualSource {
	/// A source whose next opened watch receives `result` before `watch` returns.
	pub fn delivering_inline(result: Result<Fetched<Raw>, WatchError>) -> Self {
		let source = Self::default();
		*source.inline.lock() = Some(result);
		source
	}

	pub fn len(&self) -> usize {
		self.subscriptions.lock().len()
	}

	/// Delivers `result` to the `index`th opened watch, on the calling thread.
	pub fn deliver(&self, index: usize, result: Result<Fetched<Raw>, WatchError>) {
		let handler = Arc::clone(&self.subscriptions.lock()[index].handler);
		handler(result);
	}

	pub fn query(&self, index: usize) -> Query {
		self.subscriptions.lock()[index].query.clone()
	}

	pub fn strategy(&self, index: usize) -> FetchStrategy {
		self.subscriptions.lock()[index].strategy
	}

	pub fn is_cancelled(&self, index: usize) -> bool {
		self.subscriptions.lock()[index].cancelled.load(Ordering::SeqCst)
	}

	pub fn refetches(&self, index: usize) -> Vec<FetchStrategy> {
		self.subscriptions.lock()[index].refetches.lock().clone()
	}
}

impl WatchSource for ManualSource {
	type Query = Query;
	type Data = Raw;
	type Error = WatchError;

	fn watch(
		&self,
		query: Query,
		strategy: FetchStrategy,
		_context: ExecutionContext,
		on_result: ResultHandler<Raw, WatchError>,
	) -> Box<dyn WatchHandle> {
		let cancelled = Arc::new(AtomicBool::new(false));
		let refetches = Arc::new(Mutex::new(Vec::new()));
		self.subscriptions.lock().push(Subscription {
			query,
			strategy,
			handler: Arc::clone(&on_result),
			cancelled: Arc::clone(&cancelled),
			refetches: Arc::clone(&refetches),
		});
		let inline = self.inline.lock().take();
		if let Some(result) = inline {
			on_result(result);
		}
		Box::new(ManualHandle { cancelled, refetches })
	}
}

pub type Emission = Result<PageResponse<String>, WatchError>;
pub type Watcher = PaginatedWatcher<ManualSource, String, String, PageResponse<String>>;

/// Every value passed to `on_result`, in order.
#[derive(Clone, Default)]
pub struct Recorder {
	emissions: Arc<Mutex<Vec<Emission>>>,
}

impl Recorder {
	pub fn all(&self) -> Vec<Emission> {
		self.emissions.lock().clone()
	}

	pub fn len(&self) -> usize {
		self.emissions.lock().len()
	}

	pub fn last(&self) -> Option<Emission> {
		self.emissions.lock().last().cloned()
	}

	pub fn push(&self, emission: Emission) {
		self.emissions.lock().push(emission);
	}
}

pub fn transform(raw: Raw) -> Option<Transformed<String, String>> {
	Some(Transformed {
		model: raw.model,
		page: Some(Page {
			has_next: raw.has_next,
			end_cursor: raw.cursor,
		}),
	})
}

pub fn callbacks(recorder: &Recorder) -> PagerCallbacks<ManualSource, String, String, PageResponse<String>> {
	let recorder = recorder.clone();
	PagerCallbacks::new(
		|page: &Page<String>| Some(page.end_cursor.clone()),
		transform,
		|response| response,
		move |result| recorder.push(result),
	)
}

/// A started watcher over a fresh source with default options.
pub fn started() -> (Watcher, ManualSource, Recorder) {
	started_with(WatcherOptions::default())
}

pub fn started_with(options: WatcherOptions) -> (Watcher, ManualSource, Recorder) {
	let source = ManualSource::default();
	let recorder = Recorder::default();
	let watcher = PaginatedWatcher::new(source.clone(), options, callbacks(&recorder));
	watcher.start(None).expect("first start");
	(watcher, source, recorder)
}

pub fn responses(emission: &Emission) -> Vec<String> {
	emission.as_ref().map(|r| r.all_responses.clone()).unwrap_or_default()
}
