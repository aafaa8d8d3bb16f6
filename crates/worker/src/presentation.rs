//! Marshalling work onto the host's presentation thread.
//!
//! Background runs never touch rendering state directly. They hand a closure
//! to a [`PresentationExecutor`] and, through [`send`], await its result while
//! still honouring their cancellation token.

use std::sync::mpsc as std_mpsc;

use livematch_primitives::CancelToken;
use tokio::sync::oneshot;

use crate::TaskClass;

/// Unit of work executed on the presentation thread.
pub type PresentationJob = Box<dyn FnOnce() + Send + 'static>;

/// Host-provided queue onto the presentation thread.
pub trait PresentationExecutor: Send + Sync {
	/// Enqueues `job`. Implementations must not run it re-entrantly while
	/// holding locks the caller might need.
	fn post(&self, job: PresentationJob);
}

/// Why [`send`] did not deliver a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum SendError {
	#[error("presentation call cancelled")]
	Cancelled,
	#[error("presentation executor dropped the job")]
	Dropped,
}

/// Runs `f` on `executor` and waits for its result.
///
/// Returns [`SendError::Cancelled`] if `cancel` fires first; the job may still
/// run later, but it observes the same token and the result is discarded.
///
/// # Errors
///
/// Fails on cancellation or when the executor drops the job unrun.
pub async fn send<T, F>(executor: &dyn PresentationExecutor, cancel: &CancelToken, f: F) -> Result<T, SendError>
where
	T: Send + 'static,
	F: FnOnce() -> T + Send + 'static,
{
	if cancel.is_cancelled() {
		return Err(SendError::Cancelled);
	}
	let (tx, rx) = oneshot::channel();
	let job_token = cancel.clone();
	tracing::trace!(worker_class = TaskClass::Interactive.as_str(), "presentation.post");
	executor.post(Box::new(move || {
		if job_token.is_cancelled() {
			return;
		}
		let _ = tx.send(f());
	}));

	tokio::select! {
		biased;
		() = cancel.cancelled() => Err(SendError::Cancelled),
		result = rx => result.map_err(|_| if cancel.is_cancelled() { SendError::Cancelled } else { SendError::Dropped }),
	}
}

/// Runs every job immediately on the posting thread.
///
/// Suited to hosts without a UI thread, such as the CLI and tests.
#[derive(Debug, Clone, Copy, Default)]
pub struct InlineExecutor;

impl PresentationExecutor for InlineExecutor {
	fn post(&self, job: PresentationJob) {
		job();
	}
}

/// Posting half of a [`presentation_queue`].
#[derive(Debug, Clone)]
pub struct QueueExecutor {
	tx: std_mpsc::Sender<PresentationJob>,
}

impl PresentationExecutor for QueueExecutor {
	fn post(&self, job: PresentationJob) {
		if self.tx.send(job).is_err() {
			tracing::debug!("presentation.queue_closed");
		}
	}
}

/// Draining half of a [`presentation_queue`], owned by the presentation thread.
#[derive(Debug)]
pub struct PresentationQueue {
	rx: std_mpsc::Receiver<PresentationJob>,
}

impl PresentationQueue {
	/// Runs every job queued so far and returns how many ran.
	pub fn run_pending(&self) -> usize {
		let mut ran = 0;
		while let Ok(job) = self.rx.try_recv() {
			job();
			ran += 1;
		}
		ran
	}

	/// Runs the next queued job, if any.
	pub fn run_next(&self) -> bool {
		match self.rx.try_recv() {
			Ok(job) => {
				job();
				true
			}
			Err(_) => false,
		}
	}

	/// Blocks until a job arrives and runs it. Returns false once every
	/// executor has been dropped.
	pub fn blocking_run_next(&self) -> bool {
		match self.rx.recv() {
			Ok(job) => {
				job();
				true
			}
			Err(_) => false,
		}
	}
}

/// Creates a queue-backed executor and its draining half.
pub fn presentation_queue() -> (QueueExecutor, PresentationQueue) {
	let (tx, rx) = std_mpsc::channel();
	(QueueExecutor { tx }, PresentationQueue { rx })
}
