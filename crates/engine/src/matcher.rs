use std::sync::Arc;

use async_trait::async_trait;
use livematch_model::{MatchSet, SharedText};
use livematch_primitives::CancelToken;

use crate::{EngineError, MatchOptions};

/// Where an engine does its work.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineKind {
	InProcess,
	OutOfProcess,
}

/// A regex engine: turns a pattern into a [`Matcher`].
pub trait Engine: Send + Sync {
	/// Registry name, unique per registry.
	fn name(&self) -> &str;

	fn kind(&self) -> EngineKind;

	/// Prepares `pattern` for matching.
	///
	/// In-process engines reject invalid patterns here. Out-of-process engines
	/// only learn about them on the first match and report them then.
	fn compile(&self, pattern: &str, options: &MatchOptions) -> Result<Arc<dyn Matcher>, EngineError>;
}

/// A compiled pattern bound to one engine.
#[async_trait]
pub trait Matcher: Send + Sync {
	/// Finds all matches in `text`.
	///
	/// Returns `Ok(None)` when `cancel` fired before a complete result was
	/// available. Offsets in the result are character offsets into `text`.
	async fn matches(&self, text: &SharedText, cancel: &CancelToken) -> Result<Option<MatchSet>, EngineError>;
}
