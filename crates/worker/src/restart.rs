//! Cancel-then-relaunch task without debouncing.

use std::future::Future;
use std::sync::Arc;

use livematch_primitives::{CancelSource, CancelToken, Cancelled};
use parking_lot::Mutex;
use tokio::task::JoinHandle;

use crate::panic::join_error_panic_message;
use crate::run::{RunObserver, RunSlot, RunView, is_cancellation};
use crate::{TaskClass, spawn};

struct TaskRun {
	slot: RunSlot,
	handle: JoinHandle<anyhow::Result<()>>,
}

/// Restartable async unit of work.
///
/// Each [`Self::restart`] cancels the previous run, waits for it to return,
/// then launches the new action with a fresh token. A task with nothing
/// running is idle; stopping it again is harmless.
pub struct RestartTask {
	name: Arc<str>,
	current: Mutex<Option<TaskRun>>,
}

impl RestartTask {
	pub fn new(name: impl Into<String>) -> Self {
		Self {
			name: name.into().into(),
			current: Mutex::new(None),
		}
	}

	pub fn name(&self) -> &str {
		&self.name
	}

	/// Cancels the current run and launches `action`.
	pub async fn restart<F, Fut>(&self, action: F)
	where
		F: FnOnce(CancelToken) -> Fut + Send + 'static,
		Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
	{
		self.stop().await;
		let source = CancelSource::new();
		let token = source.token();
		self.launch(source, token, None, action);
	}

	/// Cancels the current run and launches `action` once `producer`'s
	/// current run has finished.
	///
	/// The action's token is joined with the producer run's token, so
	/// restarting the producer also cancels this task. If the producer is
	/// idle the action starts immediately.
	pub async fn restart_after<P, F, Fut>(&self, producer: &P, action: F)
	where
		P: RunObserver + ?Sized,
		F: FnOnce(CancelToken) -> Fut + Send + 'static,
		Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
	{
		self.stop().await;
		let source = CancelSource::new();
		let prerequisite = producer.current_run();
		let token = match &prerequisite {
			Some(run) => source.token().joined(run.token()),
			None => source.token(),
		};
		self.launch(source, token, prerequisite, action);
	}

	fn launch<F, Fut>(&self, source: CancelSource, token: CancelToken, prerequisite: Option<RunView>, action: F)
	where
		F: FnOnce(CancelToken) -> Fut + Send + 'static,
		Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
	{
		let (slot, done) = RunSlot::new(source);
		let name = Arc::clone(&self.name);
		let handle = spawn(TaskClass::Background, async move {
			let result = async {
				if let Some(mut producer) = prerequisite {
					tokio::select! {
						biased;
						() = token.cancelled() => return Err(Cancelled.into()),
						() = producer.finished() => {}
					}
				}
				token.check()?;
				tracing::trace!(task = %name, "restart_task.run");
				action(token).await
			}
			.await;
			let _ = done.send(true);
			result
		});

		let previous = self.current.lock().replace(TaskRun { slot, handle });
		if let Some(previous) = previous {
			// Lost a race with a concurrent restart; the older run is detached.
			previous.slot.source.cancel();
		}
	}

	/// Requests cancellation of the current run without waiting for it.
	pub fn cancel(&self) {
		if let Some(run) = self.current.lock().as_ref() {
			run.slot.source.cancel();
		}
	}

	/// Cancels the current run and waits until it has returned.
	///
	/// Cancellation outcomes are expected; other failures are logged.
	pub async fn stop(&self) {
		let Some(run) = self.current.lock().take() else {
			return;
		};
		run.slot.source.cancel();
		self.reap(run.handle).await;
	}

	/// Waits for the current run to return without cancelling it.
	pub async fn wait(&self) {
		if let Some(mut run) = self.current_run() {
			run.finished().await;
		}
	}

	/// Returns true while a run is launched and has not yet returned.
	pub fn is_running(&self) -> bool {
		self.current_run().is_some_and(|run| !run.is_finished())
	}

	async fn reap(&self, handle: JoinHandle<anyhow::Result<()>>) {
		match handle.await {
			Ok(Ok(())) => {}
			Ok(Err(err)) if is_cancellation(&err) => {
				tracing::trace!(task = %self.name, "restart_task.cancelled");
			}
			Ok(Err(err)) => {
				tracing::error!(task = %self.name, error = %format!("{err:#}"), "restart task failed");
			}
			Err(join) => {
				if let Some(msg) = join_error_panic_message(join) {
					tracing::error!(task = %self.name, panic = %msg, "restart task panicked");
				}
			}
		}
	}
}

impl RunObserver for RestartTask {
	fn current_run(&self) -> Option<RunView> {
		self.current.lock().as_ref().map(|run| run.slot.view())
	}
}

impl Drop for RestartTask {
	fn drop(&mut self) {
		self.cancel();
	}
}

impl std::fmt::Debug for RestartTask {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("RestartTask")
			.field("name", &self.name)
			.field("running", &self.current.lock().is_some())
			.finish()
	}
}
