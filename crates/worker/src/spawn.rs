use std::future::Future;
use std::sync::OnceLock;

use tokio::task::JoinHandle;

use crate::TaskClass;

fn runtime_handle() -> tokio::runtime::Handle {
	if let Ok(handle) = tokio::runtime::Handle::try_current() {
		return handle;
	}

	static GLOBAL_RT: OnceLock<tokio::runtime::Runtime> = OnceLock::new();
	let runtime = GLOBAL_RT.get_or_init(|| {
		tokio::runtime::Builder::new_multi_thread()
			.enable_all()
			.worker_threads(2)
			.thread_name("folio-worker-global")
			.build()
			.expect("failed to build folio-worker global tokio runtime")
	});
	runtime.handle().clone()
}

/// Spawns an async task tagged with a [`TaskClass`].
///
/// Uses the current tokio runtime when there is one, so tasks spawned from a
/// `#[tokio::test]` or an application runtime stay on it.
pub fn spawn<F>(class: TaskClass, fut: F) -> JoinHandle<F::Output>
where
	F: Future + Send + 'static,
	F::Output: Send + 'static,
{
	tracing::trace!(worker_class = class.as_str(), "worker.spawn");
	runtime_handle().spawn(fut)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[tokio::test]
	async fn spawn_runs_on_current_runtime() {
		let value = spawn(TaskClass::Interactive, async { 7 }).await;
		assert_eq!(value.ok(), Some(7));
	}

	#[test]
	fn spawn_outside_runtime_uses_global() {
		let (tx, rx) = std::sync::mpsc::channel();
		let _ = spawn(TaskClass::Background, async move {
			let _ = tx.send(std::thread::current().name().map(str::to_owned));
		});
		let name = rx.recv_timeout(std::time::Duration::from_secs(5)).ok().flatten();
		assert_eq!(name.as_deref(), Some("folio-worker-global"));
	}
}
