//! Out-of-process engines: one child process per match request.

mod child;

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use livematch_model::{MatchSet, SharedText};
use livematch_primitives::CancelToken;

use crate::protocol::{ProtocolCache, assemble};
use crate::{Engine, EngineConfig, EngineError, EngineKind, MatchOptions, Matcher};

struct ProcessShared {
	config: EngineConfig,
	cache: ProtocolCache,
	leaked: AtomicUsize,
}

/// Engine backed by an external program.
///
/// Every [`Matcher::matches`] call spawns the program, writes the request to
/// its standard input and decodes its standard output. Output on standard
/// error fails the request with that text.
#[derive(Clone)]
pub struct ProcessEngine {
	shared: Arc<ProcessShared>,
}

impl ProcessEngine {
	pub fn new(config: EngineConfig) -> Self {
		Self {
			shared: Arc::new(ProcessShared {
				config,
				cache: ProtocolCache::new(),
				leaked: AtomicUsize::new(0),
			}),
		}
	}

	pub fn config(&self) -> &EngineConfig {
		&self.shared.config
	}

	/// Children that were still alive one poll slice after being killed.
	pub fn leaked_processes(&self) -> usize {
		self.shared.leaked.load(Ordering::Relaxed)
	}
}

impl std::fmt::Debug for ProcessEngine {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("ProcessEngine")
			.field("config", &self.shared.config)
			.field("leaked", &self.leaked_processes())
			.finish()
	}
}

impl Engine for ProcessEngine {
	fn name(&self) -> &str {
		&self.shared.config.name
	}

	fn kind(&self) -> EngineKind {
		EngineKind::OutOfProcess
	}

	fn compile(&self, pattern: &str, options: &MatchOptions) -> Result<Arc<dyn Matcher>, EngineError> {
		Ok(Arc::new(ProcessMatcher {
			shared: Arc::clone(&self.shared),
			pattern: pattern.to_string(),
			options: options.clone(),
		}))
	}
}

/// A pattern bound to a [`ProcessEngine`].
pub struct ProcessMatcher {
	shared: Arc<ProcessShared>,
	pattern: String,
	options: MatchOptions,
}

#[async_trait]
impl Matcher for ProcessMatcher {
	async fn matches(&self, text: &SharedText, cancel: &CancelToken) -> Result<Option<MatchSet>, EngineError> {
		if cancel.is_cancelled() {
			return Ok(None);
		}
		let config = &self.shared.config;
		let request = config.protocol.encode_request(&self.pattern, text.as_str(), &self.options)?;
		let Some(output) = child::run(&self.shared, request, cancel).await? else {
			return Ok(None);
		};
		let raw = config.protocol.decode_response(&output, &self.shared.cache).inspect_err(|err| {
			tracing::error!(engine = %config.name, error = %err, "engine output does not follow its protocol");
		})?;
		assemble(text, raw, cancel)
	}
}
