//! Debounced, restartable background loop.
//!
//! A [`ResumableLoop`] owns one dedicated thread. The thread waits for
//! signals, coalesces bursts of restarts behind an escalating debounce, then
//! runs the action once with a fresh cancellation token. Any signal that
//! arrives while the action runs cancels that token.

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};
use std::time::{Duration, Instant};

use livematch_primitives::{CancelSource, CancelToken};
use parking_lot::Mutex;
use tokio::sync::mpsc;

use crate::panic::panic_message;
use crate::run::{RunObserver, RunSlot, RunView, is_cancellation};
use crate::spawn::dedicated_runtime;
use crate::{TaskClass, spawn_named_thread};

/// Signals accepted by the worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LoopSignal {
	Restart,
	RedoAsap,
	Stop,
	Shutdown,
}

/// What the worker does after evaluating pending signals.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Decision {
	Debounce,
	Execute,
	Abandon,
	Exit,
}

impl Decision {
	/// Applies a signal that arrived after the ones this decision reflects.
	///
	/// Stop discards the work requested before it, never after it; a redo
	/// keeps skipping the debounce when restarts follow it.
	fn then(self, signal: LoopSignal) -> Self {
		match (self, signal) {
			(Self::Exit, _) | (_, LoopSignal::Shutdown) => Self::Exit,
			(_, LoopSignal::Stop) => Self::Abandon,
			(_, LoopSignal::RedoAsap) | (Self::Execute, LoopSignal::Restart) => Self::Execute,
			(_, LoopSignal::Restart) => Self::Debounce,
		}
	}
}

impl From<LoopSignal> for Decision {
	fn from(signal: LoopSignal) -> Self {
		match signal {
			LoopSignal::Restart => Self::Debounce,
			LoopSignal::RedoAsap => Self::Execute,
			LoopSignal::Stop => Self::Abandon,
			LoopSignal::Shutdown => Self::Exit,
		}
	}
}

/// Observable state of a [`ResumableLoop`] worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum LoopState {
	/// Waiting indefinitely for a signal.
	Idle = 0,
	/// A restart arrived; waiting for the burst to settle.
	DebounceWaiting = 1,
	/// Running the action.
	Executing = 2,
	/// The worker has exited, after shutdown or a failed action.
	Stopped = 3,
}

impl LoopState {
	fn from_u8(raw: u8) -> Self {
		match raw {
			0 => Self::Idle,
			1 => Self::DebounceWaiting,
			2 => Self::Executing,
			_ => Self::Stopped,
		}
	}
}

/// Debounce waits.
///
/// A burst starts with a `first` wait; every further restart during the wait
/// restarts it at `repeat`, never beyond. `settled` only applies when runs
/// keep getting superseded: each run cancelled by a newer signal moves the
/// next burst's opening wait one stage on, and a run that finishes resets it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DebounceTimeouts {
	pub first: Duration,
	pub repeat: Duration,
	pub settled: Duration,
}

impl DebounceTimeouts {
	/// Creates the stages; a zero stage inherits the previous one.
	pub fn new(first: Duration, repeat: Duration, settled: Duration) -> Self {
		let repeat = if repeat.is_zero() { first } else { repeat };
		let settled = if settled.is_zero() { repeat } else { settled };
		Self { first, repeat, settled }
	}

	pub fn from_millis(first: u64, repeat: u64, settled: u64) -> Self {
		Self::new(Duration::from_millis(first), Duration::from_millis(repeat), Duration::from_millis(settled))
	}

	/// Wait for stage `index`, clamped to the last stage.
	pub fn stage(&self, index: usize) -> Duration {
		match index {
			0 => self.first,
			1 => self.repeat,
			_ => self.settled,
		}
	}
}

impl Default for DebounceTimeouts {
	fn default() -> Self {
		Self::from_millis(33, 33, 444)
	}
}

/// Errors terminating a [`ResumableLoop`] worker.
#[derive(Debug, thiserror::Error)]
pub enum LoopError {
	#[error("failed to start loop worker: {0}")]
	Spawn(#[from] std::io::Error),
	#[error("loop action failed: {0:#}")]
	Action(anyhow::Error),
	#[error("loop action panicked: {0}")]
	Panicked(String),
}

#[derive(Debug)]
struct LoopShared {
	state: AtomicU8,
	current: Mutex<Option<RunSlot>>,
}

impl LoopShared {
	fn set_state(&self, state: LoopState) {
		self.state.store(state as u8, Ordering::Release);
	}
}

/// Marks the loop stopped however the worker exits, panics included.
struct StoppedGuard(Arc<LoopShared>);

impl Drop for StoppedGuard {
	fn drop(&mut self) {
		self.0.current.lock().take();
		self.0.set_state(LoopState::Stopped);
	}
}

/// Debounced, cancellable, restartable background loop.
#[derive(Debug)]
pub struct ResumableLoop {
	name: Arc<str>,
	tx: mpsc::UnboundedSender<LoopSignal>,
	shared: Arc<LoopShared>,
	thread: Option<std::thread::JoinHandle<Result<(), LoopError>>>,
}

impl ResumableLoop {
	/// Starts the worker thread.
	///
	/// `action` runs on that thread, on a single-threaded runtime. It should
	/// poll its token and return [`livematch_primitives::Cancelled`] (or an
	/// error caused by it) to stop early; any other error ends the worker.
	///
	/// # Errors
	///
	/// Fails if the worker thread cannot be spawned.
	pub fn new<F, Fut>(name: impl Into<String>, timeouts: DebounceTimeouts, action: F) -> Result<Self, LoopError>
	where
		F: FnMut(CancelToken) -> Fut + Send + 'static,
		Fut: Future<Output = anyhow::Result<()>> + 'static,
	{
		let name: Arc<str> = name.into().into();
		let (tx, rx) = mpsc::unbounded_channel();
		let shared = Arc::new(LoopShared {
			state: AtomicU8::new(LoopState::Idle as u8),
			current: Mutex::new(None),
		});
		let worker = Worker {
			name: Arc::clone(&name),
			timeouts,
			rx,
			shared: Arc::clone(&shared),
			action,
			superseded: 0,
		};
		let thread = spawn_named_thread(TaskClass::Dedicated, format!("loop-{name}"), move || worker.run())?;
		tracing::debug!(loop_name = %name, ?timeouts, "loop.started");
		Ok(Self {
			name,
			tx,
			shared,
			thread: Some(thread),
		})
	}

	pub fn name(&self) -> &str {
		&self.name
	}

	/// Abandons any pending or running work and returns to idle.
	pub fn send_stop(&self) {
		self.signal(LoopSignal::Stop);
	}

	/// Requests a debounced rerun; cancels the run in flight.
	pub fn send_restart(&self) {
		self.signal(LoopSignal::Restart);
	}

	/// Requests a rerun that skips the debounce; cancels the run in flight.
	pub fn send_redo_asap(&self) {
		self.signal(LoopSignal::RedoAsap);
	}

	fn signal(&self, signal: LoopSignal) {
		tracing::trace!(loop_name = %self.name, ?signal, "loop.signal");
		if self.tx.send(signal).is_err() {
			tracing::debug!(loop_name = %self.name, ?signal, "loop.signal_dropped");
			return;
		}
		if let Some(run) = self.shared.current.lock().as_ref() {
			run.source.cancel();
		}
	}

	pub fn state(&self) -> LoopState {
		LoopState::from_u8(self.shared.state.load(Ordering::Acquire))
	}

	pub fn observer(&self) -> LoopObserver {
		LoopObserver {
			shared: Arc::clone(&self.shared),
		}
	}

	/// Stops the worker and waits for its thread.
	///
	/// A run in flight is cancelled first. Returns the fault that ended the
	/// worker early, if any.
	///
	/// # Errors
	///
	/// Returns the failed action's error or panic message.
	pub fn shutdown(mut self) -> Result<(), LoopError> {
		self.signal(LoopSignal::Shutdown);
		let Some(thread) = self.thread.take() else {
			return Ok(());
		};
		match thread.join() {
			Ok(result) => result,
			Err(payload) => Err(LoopError::Panicked(panic_message(&*payload))),
		}
	}
}

impl RunObserver for ResumableLoop {
	fn current_run(&self) -> Option<RunView> {
		self.shared.current.lock().as_ref().map(RunSlot::view)
	}
}

/// Cloneable [`RunObserver`] over a [`ResumableLoop`]'s runs.
///
/// Lets dependents chain after the loop without borrowing it.
#[derive(Debug, Clone)]
pub struct LoopObserver {
	shared: Arc<LoopShared>,
}

impl LoopObserver {
	pub fn state(&self) -> LoopState {
		LoopState::from_u8(self.shared.state.load(Ordering::Acquire))
	}
}

impl RunObserver for LoopObserver {
	fn current_run(&self) -> Option<RunView> {
		self.shared.current.lock().as_ref().map(RunSlot::view)
	}
}

impl Drop for ResumableLoop {
	fn drop(&mut self) {
		if self.thread.is_some() {
			self.signal(LoopSignal::Shutdown);
		}
	}
}

struct Worker<F> {
	name: Arc<str>,
	timeouts: DebounceTimeouts,
	rx: mpsc::UnboundedReceiver<LoopSignal>,
	shared: Arc<LoopShared>,
	action: F,
	/// Consecutive runs cancelled by a newer signal.
	superseded: usize,
}

impl<F, Fut> Worker<F>
where
	F: FnMut(CancelToken) -> Fut + Send + 'static,
	Fut: Future<Output = anyhow::Result<()>> + 'static,
{
	fn run(self) -> Result<(), LoopError> {
		let _guard = StoppedGuard(Arc::clone(&self.shared));
		let runtime = dedicated_runtime()?;
		let name = Arc::clone(&self.name);
		let result = runtime.block_on(self.run_signals());
		tracing::debug!(loop_name = %name, ok = result.is_ok(), "loop.exited");
		result
	}

	async fn run_signals(mut self) -> Result<(), LoopError> {
		loop {
			self.shared.set_state(LoopState::Idle);
			let Some(first) = self.rx.recv().await else {
				return Ok(());
			};
			let mut decision = self.drain(Decision::from(first));
			loop {
				match decision {
					Decision::Debounce => decision = self.debounce().await,
					Decision::Execute => {
						self.execute().await?;
						break;
					}
					Decision::Abandon => {
						self.superseded = 0;
						tracing::trace!(loop_name = %self.name, "loop.abandoned");
						break;
					}
					Decision::Exit => return Ok(()),
				}
			}
		}
	}

	/// Folds the signals queued behind `decision` in arrival order.
	fn drain(&mut self, mut decision: Decision) -> Decision {
		while let Ok(next) = self.rx.try_recv() {
			decision = decision.then(next);
		}
		decision
	}

	/// Waits for the burst of restarts to settle.
	///
	/// The first wait is `first`, or a later stage when previous runs were
	/// superseded before finishing. Each restart during the wait restarts it
	/// at `repeat`.
	async fn debounce(&mut self) -> Decision {
		self.shared.set_state(LoopState::DebounceWaiting);
		let mut stage = self.superseded.min(2);
		loop {
			let wait = self.timeouts.stage(stage);
			match tokio::time::timeout(wait, self.rx.recv()).await {
				Err(_) => return self.drain(Decision::Execute),
				Ok(None) => return Decision::Exit,
				Ok(Some(LoopSignal::Restart)) => {
					stage = 1;
					tracing::trace!(loop_name = %self.name, ?wait, "loop.debounce_extended");
				}
				Ok(Some(signal)) => return self.drain(Decision::from(signal)),
			}
		}
	}

	async fn execute(&mut self) -> Result<(), LoopError> {
		self.shared.set_state(LoopState::Executing);
		let source = CancelSource::new();
		let (slot, done) = RunSlot::new(source.clone());
		*self.shared.current.lock() = Some(slot);
		// A signal sent before the slot was published could not cancel it.
		if !self.rx.is_empty() {
			source.cancel();
		}

		let started = Instant::now();
		tracing::debug!(loop_name = %self.name, "loop.execute");
		let result = (self.action)(source.token()).await;
		self.shared.current.lock().take();
		let _ = done.send(true);
		self.superseded = if source.is_cancelled() { self.superseded + 1 } else { 0 };

		match result {
			Ok(()) => {
				tracing::debug!(loop_name = %self.name, elapsed_ms = started.elapsed().as_millis() as u64, "loop.completed");
				Ok(())
			}
			Err(err) if is_cancellation(&err) => {
				tracing::debug!(loop_name = %self.name, elapsed_ms = started.elapsed().as_millis() as u64, "loop.cancelled");
				Ok(())
			}
			Err(err) => {
				tracing::error!(loop_name = %self.name, error = %format!("{err:#}"), "loop action failed; worker stopping");
				Err(LoopError::Action(err))
			}
		}
	}
}

#[cfg(test)]
mod tests;
