use smallvec::SmallVec;
use tokio_util::sync::CancellationToken;

/// Capability to observe whether cancellation was requested.
///
/// Long-running work polls this at natural iteration boundaries (character,
/// match, line). Nothing is pushed to the holder; it has to ask.
pub trait Cancellable: Send + Sync {
	/// Returns true once cancellation has been requested.
	fn is_cancellation_requested(&self) -> bool;
}

/// A [`Cancellable`] that never reports cancellation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NonCancellable;

/// Shared instance for callers running outside any loop.
pub const NON_CANCELLABLE: NonCancellable = NonCancellable;

impl Cancellable for NonCancellable {
	fn is_cancellation_requested(&self) -> bool {
		false
	}
}

/// Outcome of an operation that stopped early because its token was cancelled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, thiserror::Error)]
#[error("operation cancelled")]
pub struct Cancelled;

/// Owning side of a cancellation: the only handle that can request it.
#[derive(Debug, Clone, Default)]
pub struct CancelSource {
	inner: CancellationToken,
}

impl CancelSource {
	/// Creates a source that has not been cancelled.
	pub fn new() -> Self {
		Self::default()
	}

	/// Returns a read-only token observing this source.
	pub fn token(&self) -> CancelToken {
		CancelToken {
			sources: SmallVec::from_elem(self.inner.clone(), 1),
		}
	}

	/// Requests cancellation. Idempotent.
	pub fn cancel(&self) {
		self.inner.cancel();
	}

	/// Returns true once [`Self::cancel`] was called.
	pub fn is_cancelled(&self) -> bool {
		self.inner.is_cancelled()
	}
}

/// Read-only view over one or more [`CancelSource`]s.
///
/// A token joined from several sources is cancelled as soon as any of them is,
/// so its lifetime is the intersection of theirs. A token with no sources
/// never cancels.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
	sources: SmallVec<[CancellationToken; 2]>,
}

impl CancelToken {
	/// Token that is never cancelled.
	pub fn none() -> Self {
		Self::default()
	}

	/// Returns true if any joined source has been cancelled.
	pub fn is_cancelled(&self) -> bool {
		self.sources.iter().any(CancellationToken::is_cancelled)
	}

	/// Returns a token cancelled when either `self` or `other` is.
	#[must_use]
	pub fn joined(&self, other: &CancelToken) -> CancelToken {
		let mut sources = self.sources.clone();
		sources.extend(other.sources.iter().cloned());
		CancelToken { sources }
	}

	/// Returns `Err(Cancelled)` if cancellation was requested.
	pub fn check(&self) -> Result<(), Cancelled> {
		if self.is_cancelled() { Err(Cancelled) } else { Ok(()) }
	}

	/// Resolves once any joined source is cancelled; pends forever for [`Self::none`].
	pub async fn cancelled(&self) {
		match self.sources.as_slice() {
			[] => std::future::pending().await,
			[only] => only.cancelled().await,
			many => {
				let waits = many.iter().map(|t| Box::pin(t.cancelled()));
				futures::future::select_all(waits).await;
			}
		}
	}
}

impl Cancellable for CancelToken {
	fn is_cancellation_requested(&self) -> bool {
		self.is_cancelled()
	}
}

impl Cancellable for CancelSource {
	fn is_cancellation_requested(&self) -> bool {
		self.is_cancelled()
	}
}

impl<C: Cancellable + ?Sized> Cancellable for &C {
	fn is_cancellation_requested(&self) -> bool {
		(**self).is_cancellation_requested()
	}
}
