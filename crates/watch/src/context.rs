use std::fmt;
use std::sync::Arc;

use folio_worker::TaskClass;
use tokio::sync::mpsc;

/// A unit of callback work.
pub type Job = Box<dyn FnOnce() + Send + 'static>;

/// Caller-supplied executor for result callbacks.
///
/// Implementations must run jobs in the order they are dispatched.
pub trait Dispatch: Send + Sync + 'static {
	/// Schedules `job` to run.
	fn dispatch(&self, job: Job);
}

/// Where result callbacks are executed.
#[derive(Clone, Default)]
pub enum ExecutionContext {
	/// Run on the thread that produced the result.
	#[default]
	Inline,
	/// Run in order on a worker-runtime queue.
	Queue(SerialQueue),
	/// Hand off to a caller-supplied dispatcher.
	Custom(Arc<dyn Dispatch>),
}

impl ExecutionContext {
	/// Context backed by a new [`SerialQueue`].
	pub fn queue(class: TaskClass) -> Self {
		Self::Queue(SerialQueue::new(class))
	}

	/// Context backed by `dispatch`.
	pub fn custom(dispatch: impl Dispatch) -> Self {
		Self::Custom(Arc::new(dispatch))
	}

	/// Runs `job` in this context.
	pub fn run(&self, job: Job) {
		match self {
			Self::Inline => job(),
			Self::Queue(queue) => queue.dispatch(job),
			Self::Custom(dispatch) => dispatch.dispatch(job),
		}
	}
}

impl fmt::Debug for ExecutionContext {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Inline => f.write_str("Inline"),
			Self::Queue(queue) => f.debug_tuple("Queue").field(&queue.class).finish(),
			Self::Custom(_) => f.write_str("Custom(..)"),
		}
	}
}

/// FIFO job queue drained by one task on the worker runtime.
///
/// The drain task exits once every clone of the queue is dropped.
#[derive(Clone)]
pub struct SerialQueue {
	class: TaskClass,
	tx: mpsc::UnboundedSender<Job>,
}

impl SerialQueue {
	/// Creates a queue and spawns its drain task.
	pub fn new(class: TaskClass) -> Self {
		let (tx, mut rx) = mpsc::unbounded_channel::<Job>();
		folio_worker::spawn(class, async move {
			while let Some(job) = rx.recv().await {
				job();
			}
			tracing::trace!(worker_class = class.as_str(), "watch.queue.closed");
		});
		Self { class, tx }
	}

	/// Returns the queue's task class.
	pub fn class(&self) -> TaskClass {
		self.class
	}
}

impl Dispatch for SerialQueue {
	fn dispatch(&self, job: Job) {
		if self.tx.send(job).is_err() {
			tracing::warn!(worker_class = self.class.as_str(), "watch.queue: drain task gone, job dropped");
		}
	}
}

#[cfg(test)]
mod tests {
	use std::sync::Mutex;
	use std::time::Duration;

	use super::*;

	#[test]
	fn inline_runs_immediately() {
		let hit = Arc::new(Mutex::new(false));
		let flag = Arc::clone(&hit);
		ExecutionContext::Inline.run(Box::new(move || *flag.lock().unwrap() = true));
		assert!(*hit.lock().unwrap());
	}

	#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
	async fn queue_preserves_dispatch_order() {
		let context = ExecutionContext::queue(TaskClass::Interactive);
		let (tx, mut rx) = mpsc::unbounded_channel();
		for i in 0..32 {
			let tx = tx.clone();
			context.run(Box::new(move || {
				let _ = tx.send(i);
			}));
		}

		let mut seen = Vec::new();
		while seen.len() < 32 {
			let next = tokio::time::timeout(Duration::from_secs(5), rx.recv()).await;
			seen.push(next.ok().flatten().expect("queued job ran"));
		}
		assert_eq!(seen, (0..32).collect::<Vec<_>>());
	}

	#[test]
	fn custom_dispatch_receives_jobs() {
		struct Deferred(Mutex<Vec<Job>>);
		impl Dispatch for Arc<Deferred> {
			fn dispatch(&self, job: Job) {
				self.0.lock().unwrap().push(job);
			}
		}

		let deferred = Arc::new(Deferred(Mutex::new(Vec::new())));
		let context = ExecutionContext::custom(Arc::clone(&deferred));
		let hit = Arc::new(Mutex::new(0));
		let counter = Arc::clone(&hit);
		context.run(Box::new(move || *counter.lock().unwrap() += 1));
		assert_eq!(*hit.lock().unwrap(), 0);

		for job in deferred.0.lock().unwrap().drain(..) {
			job();
		}
		assert_eq!(*hit.lock().unwrap(), 1);
	}
}
