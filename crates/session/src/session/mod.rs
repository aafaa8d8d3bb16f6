//! Live matching session.
//!
//! Three cooperating workers keep the display in sync with the text:
//!
//! * the rescan loop recomputes all matches after edits, debounced;
//! * the local underline task marks the groups of matches under the caret,
//!   always after the rescan run it depends on;
//! * the external underline loop marks a segment chosen by the host.
//!
//! Results travel to the [`RegionSink`] as minimal region diffs, on the
//! presentation thread.

mod regions;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};

use livematch_engine::{Engine, EngineError, EngineRegistry, MatchOptions, Matcher};
use livematch_model::{MatchSet, TextSource};
use livematch_primitives::{CancelToken, Cancelled, RangesError, Segment};
use livematch_worker::{LoopError, LoopObserver, PresentationExecutor, RestartTask, ResumableLoop, SendError, TaskClass, send, spawn};
use parking_lot::Mutex;

use self::regions::{PendingRegions, RegionState};
use crate::{Config, RegionKind, RegionSink, ScanStatus};

/// Errors creating or driving a [`MatchSession`].
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
	#[error(transparent)]
	Engine(#[from] EngineError),
	#[error(transparent)]
	Loop(#[from] LoopError),
}

/// Engine and pattern currently in effect.
struct Query {
	engine: Arc<dyn Engine>,
	pattern: Option<String>,
	options: MatchOptions,
	compiled: Option<Result<Arc<dyn Matcher>, String>>,
}

impl Query {
	fn recompile(&mut self) {
		self.compiled = self.pattern.as_deref().map(|pattern| {
			self.engine.compile(pattern, &self.options).map_err(|err| {
				tracing::debug!(engine = self.engine.name(), error = %err, "session.pattern_rejected");
				err.to_string()
			})
		});
	}
}

struct SessionInner {
	registry: EngineRegistry,
	source: Arc<dyn TextSource>,
	executor: Arc<dyn PresentationExecutor>,
	sink: Arc<dyn RegionSink>,
	query: Mutex<Query>,
	latest: Mutex<ScanStatus>,
	caret: Mutex<Option<Segment>>,
	external_target: Mutex<Option<Segment>>,
	highlight: Arc<RegionState>,
	local_underline: Arc<RegionState>,
	external_underline: Arc<RegionState>,
	local: RestartTask,
	rescan_runs: OnceLock<LoopObserver>,
}

fn cancelled_or(err: RangesError) -> anyhow::Error {
	match err {
		RangesError::Cancelled => Cancelled.into(),
		other => other.into(),
	}
}

impl SessionInner {
	/// Runs `job` on the presentation thread, translating a cancelled
	/// hand-off into the loop's cancellation outcome.
	async fn present(&self, token: &CancelToken, job: impl FnOnce() + Send + 'static) -> anyhow::Result<()> {
		match send(&*self.executor, token, job).await {
			Ok(()) => Ok(()),
			Err(SendError::Cancelled) => Err(Cancelled.into()),
			Err(SendError::Dropped) => {
				tracing::warn!("presentation executor dropped a region update");
				Ok(())
			}
		}
	}

	async fn push_regions(&self, region: &Arc<RegionState>, pending: PendingRegions, token: &CancelToken) -> anyhow::Result<()> {
		if pending.is_noop() {
			return Ok(());
		}
		let region = Arc::clone(region);
		let sink = Arc::clone(&self.sink);
		self.present(token, move || region.apply(&*sink, pending)).await
	}

	async fn rescan(self: Arc<Self>, token: CancelToken) -> anyhow::Result<()> {
		let text = self.source.snapshot();
		let (engine, compiled) = {
			let query = self.query.lock();
			(query.engine.name().to_string(), query.compiled.clone())
		};

		let status = match compiled {
			None => ScanStatus::Idle,
			Some(Err(message)) => ScanStatus::Failed { engine, message },
			Some(Ok(matcher)) => match matcher.matches(&text, &token).await {
				Ok(Some(set)) => ScanStatus::Matches(set),
				Ok(None) => return Err(Cancelled.into()),
				Err(err) => {
					if err.is_defect() {
						tracing::error!(%engine, error = %err, "engine output rejected");
					} else {
						tracing::debug!(%engine, error = %err, "session.scan_failed");
					}
					ScanStatus::Failed {
						engine,
						message: err.to_string(),
					}
				}
			},
		};
		token.check()?;

		let next: Vec<Segment> = status.matches().map(|set| set.segments().collect()).unwrap_or_default();
		let pending = self.highlight.prepare(next, text.char_len(), &token).map_err(cancelled_or)?;
		tracing::debug!(
			matches = status.matches().map_or(0, MatchSet::count),
			failed = status.is_failed(),
			"session.scan_completed"
		);

		*self.latest.lock() = status.clone();
		let region = Arc::clone(&self.highlight);
		let sink = Arc::clone(&self.sink);
		self.present(&token, move || {
			if !pending.is_noop() {
				region.apply(&*sink, pending);
			}
			sink.scan_finished(&status);
		})
		.await?;

		Arc::clone(&self).underline_local_after_rescan();
		Ok(())
	}

	/// Groups of the latest matches that touch the caret.
	fn caret_groups(&self, token: &CancelToken) -> anyhow::Result<Option<(Vec<Segment>, usize)>> {
		let Some(set) = self.latest.lock().matches().cloned() else {
			return Ok(None);
		};
		let caret = *self.caret.lock();
		let mut segments = Vec::new();
		if let Some(caret) = caret {
			for m in &set {
				token.check()?;
				let span = m.segment();
				let touched = if caret.is_empty() { span.touches(caret.index) } else { span.intersects(&caret) };
				if !touched {
					continue;
				}
				let inner: Vec<Segment> = m.groups().iter().skip(1).filter(|g| g.success()).map(|g| g.segment()).collect();
				if inner.is_empty() {
					segments.push(span);
				} else {
					segments.extend(inner);
				}
			}
		}
		Ok(Some((segments, set.text().char_len())))
	}

	async fn underline_local(self: Arc<Self>, token: CancelToken) -> anyhow::Result<()> {
		let (next, len) = match self.caret_groups(&token)? {
			Some(found) => found,
			None => (Vec::new(), self.source.snapshot().char_len()),
		};
		let pending = self.local_underline.prepare(next, len, &token).map_err(cancelled_or)?;
		self.push_regions(&self.local_underline, pending, &token).await
	}

	async fn underline_external(self: Arc<Self>, token: CancelToken) -> anyhow::Result<()> {
		let len = self.source.snapshot().char_len();
		let target = *self.external_target.lock();
		let next: Vec<Segment> = target.map(|s| s.clipped(len)).filter(|s| !s.is_empty()).into_iter().collect();
		let pending = self.external_underline.prepare(next, len, &token).map_err(cancelled_or)?;
		self.push_regions(&self.external_underline, pending, &token).await
	}

	/// Restarts the local underline once the current rescan run, if any, is done.
	fn underline_local_after_rescan(self: Arc<Self>) {
		let _detached = spawn(TaskClass::Background, async move {
			let action_inner = Arc::clone(&self);
			let action = move |token| action_inner.underline_local(token);
			match self.rescan_runs.get() {
				Some(rescan) => self.local.restart_after(rescan, action).await,
				None => self.local.restart(action).await,
			}
		});
	}
}

/// Live matching over one text source.
///
/// All methods are cheap and non-blocking; they only signal the background
/// workers. Results arrive on the presentation thread through the sink.
pub struct MatchSession {
	inner: Arc<SessionInner>,
	rescan: ResumableLoop,
	external: ResumableLoop,
	scanning: AtomicBool,
}

impl MatchSession {
	/// Creates a session using `config`'s engines and debounce timings.
	///
	/// Scanning starts stopped; see [`Self::start_rescan`].
	///
	/// # Errors
	///
	/// Fails on an invalid engine list or if a worker thread cannot start.
	pub fn new(config: &Config, source: Arc<dyn TextSource>, executor: Arc<dyn PresentationExecutor>, sink: Arc<dyn RegionSink>) -> Result<Self, SessionError> {
		let registry = EngineRegistry::from_configs(&config.engines)?;
		let engine = registry.require(&config.default_engine)?;
		let inner = Arc::new(SessionInner {
			registry,
			source,
			executor,
			sink,
			query: Mutex::new(Query {
				engine,
				pattern: None,
				options: MatchOptions::default(),
				compiled: None,
			}),
			latest: Mutex::new(ScanStatus::Idle),
			caret: Mutex::new(None),
			external_target: Mutex::new(None),
			highlight: Arc::new(RegionState::new(RegionKind::Highlight)),
			local_underline: Arc::new(RegionState::new(RegionKind::LocalUnderline)),
			external_underline: Arc::new(RegionState::new(RegionKind::ExternalUnderline)),
			local: RestartTask::new("local-underline"),
			rescan_runs: OnceLock::new(),
		});

		let rescan_inner = Arc::clone(&inner);
		let rescan = ResumableLoop::new("rescan", config.rescan.timeouts(), move |token| Arc::clone(&rescan_inner).rescan(token))?;
		let _ = inner.rescan_runs.set(rescan.observer());

		let external_inner = Arc::clone(&inner);
		let external = ResumableLoop::new("external-underline", config.underline.timeouts(), move |token| {
			Arc::clone(&external_inner).underline_external(token)
		})?;

		Ok(Self {
			inner,
			rescan,
			external,
			scanning: AtomicBool::new(false),
		})
	}

	pub fn registry(&self) -> &EngineRegistry {
		&self.inner.registry
	}

	pub fn engine_name(&self) -> String {
		self.inner.query.lock().engine.name().to_string()
	}

	/// Switches engines, recompiling the current pattern.
	///
	/// # Errors
	///
	/// Fails if no engine is registered under `name`.
	pub fn set_engine(&self, name: &str) -> Result<(), EngineError> {
		let engine = self.inner.registry.require(name)?;
		{
			let mut query = self.inner.query.lock();
			query.engine = engine;
			query.recompile();
		}
		tracing::debug!(engine = name, "session.engine_changed");
		self.restart_if_scanning();
		Ok(())
	}

	/// Sets the pattern and options. A pattern the engine rejects shows up as
	/// [`ScanStatus::Failed`] after the next scan.
	pub fn set_pattern(&self, pattern: impl Into<String>, options: MatchOptions) {
		{
			let mut query = self.inner.query.lock();
			query.pattern = Some(pattern.into());
			query.options = options;
			query.recompile();
		}
		self.restart_if_scanning();
	}

	/// Clears the pattern; the next scan removes every highlight.
	pub fn clear_pattern(&self) {
		{
			let mut query = self.inner.query.lock();
			query.pattern = None;
			query.compiled = None;
		}
		self.restart_if_scanning();
	}

	/// Notifies the session that the source text changed.
	pub fn text_changed(&self) {
		self.restart_if_scanning();
	}

	/// Enables scanning and schedules a debounced scan.
	pub fn start_rescan(&self) {
		self.scanning.store(true, Ordering::Release);
		self.rescan.send_restart();
	}

	/// Disables scanning and abandons pending or running scans.
	pub fn stop_rescan(&self) {
		self.scanning.store(false, Ordering::Release);
		self.rescan.send_stop();
	}

	/// Scans immediately, skipping the debounce.
	pub fn redo_now(&self) {
		if self.scanning.load(Ordering::Acquire) {
			self.rescan.send_redo_asap();
		}
	}

	pub fn is_scanning(&self) -> bool {
		self.scanning.load(Ordering::Acquire)
	}

	fn restart_if_scanning(&self) {
		if self.scanning.load(Ordering::Acquire) {
			self.rescan.send_restart();
		}
	}

	/// Best-known result of the latest completed scan.
	pub fn current_matches(&self) -> ScanStatus {
		self.inner.latest.lock().clone()
	}

	/// Moves the caret (an empty segment) or selection; the local underline
	/// follows once the current scan is done.
	pub fn set_caret(&self, caret: Option<Segment>) {
		*self.inner.caret.lock() = caret;
		Arc::clone(&self.inner).underline_local_after_rescan();
	}

	/// Underlines `target`, or removes the external underline for `None`.
	pub fn underline_external(&self, target: Option<Segment>) {
		*self.inner.external_target.lock() = target;
		self.external.send_restart();
	}

	/// Segments currently applied to the sink for `kind`.
	pub fn applied_regions(&self, kind: RegionKind) -> Vec<Segment> {
		match kind {
			RegionKind::Highlight => self.inner.highlight.applied(),
			RegionKind::LocalUnderline => self.inner.local_underline.applied(),
			RegionKind::ExternalUnderline => self.inner.external_underline.applied(),
		}
	}

	/// Stops every worker and waits for the loops' threads.
	///
	/// # Errors
	///
	/// Returns the first fault that ended a loop early.
	pub fn shutdown(self) -> Result<(), LoopError> {
		let Self { inner, rescan, external, .. } = self;
		inner.local.cancel();
		let rescan = rescan.shutdown();
		let external = external.shutdown();
		tracing::debug!(rescan_ok = rescan.is_ok(), external_ok = external.is_ok(), "session.shutdown");
		rescan.and(external)
	}
}

impl std::fmt::Debug for MatchSession {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("MatchSession")
			.field("engine", &self.engine_name())
			.field("scanning", &self.is_scanning())
			.field("rescan", &self.rescan.state())
			.finish_non_exhaustive()
	}
}
