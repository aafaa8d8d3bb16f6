use livematch_primitives::{CancelSource, CancelToken, Cancelled};
use tokio::sync::watch;

/// Observable view of one in-flight run of a loop or task.
///
/// Dependents chain on it: they wait for [`Self::finished`] and join
/// [`Self::token`] into their own so a restarted producer also cancels them.
#[derive(Debug, Clone)]
pub struct RunView {
	token: CancelToken,
	done: watch::Receiver<bool>,
}

impl RunView {
	/// Cancellation token of the observed run.
	pub fn token(&self) -> &CancelToken {
		&self.token
	}

	/// Returns true once the run has returned (or its worker went away).
	pub fn is_finished(&self) -> bool {
		*self.done.borrow() || self.done.has_changed().is_err()
	}

	/// Resolves once the run has returned.
	pub async fn finished(&mut self) {
		let _ = self.done.wait_for(|done| *done).await;
	}
}

/// Anything whose current run a dependent task can chain after.
pub trait RunObserver {
	/// The run executing right now, if any.
	fn current_run(&self) -> Option<RunView>;
}

/// Bookkeeping for the run a loop or task is executing.
#[derive(Debug)]
pub(crate) struct RunSlot {
	pub(crate) source: CancelSource,
	done: watch::Receiver<bool>,
}

impl RunSlot {
	/// Creates a slot plus the sender the run flips when it returns.
	///
	/// Dropping the sender without sending also counts as finished.
	pub(crate) fn new(source: CancelSource) -> (Self, watch::Sender<bool>) {
		let (tx, rx) = watch::channel(false);
		(Self { source, done: rx }, tx)
	}

	pub(crate) fn view(&self) -> RunView {
		RunView {
			token: self.source.token(),
			done: self.done.clone(),
		}
	}
}

/// Returns true if `err` is, or was caused by, a cancellation.
///
/// Actions report early returns this way; it is never a fault.
pub fn is_cancellation(err: &anyhow::Error) -> bool {
	err.chain().any(|e| e.is::<Cancelled>())
}
