use std::io;
use std::process::ExitStatus;

use livematch_model::ModelError;

/// Failures surfaced by engines and matchers.
///
/// Cancellation is not an error; matchers report it as `Ok(None)`.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
	/// The engine process could not be started.
	#[error("failed to start engine `{program}`: {reason}")]
	Spawn { program: String, reason: String },
	/// The engine wrote to its error stream. The text is kept verbatim.
	#[error("{0}")]
	Engine(String),
	/// The engine exited unsuccessfully without explaining why.
	#[error("engine exited with {0}")]
	Exit(ExitStatus),
	/// The engine's output did not follow its wire protocol.
	#[error("protocol error: {0}")]
	Protocol(String),
	/// The pattern was rejected by an in-process engine.
	#[error("invalid pattern: {0}")]
	Pattern(String),
	#[error(transparent)]
	Io(#[from] io::Error),
	/// The engine reported offsets that do not fit the text.
	#[error("engine reported an invalid span: {0}")]
	Model(#[from] ModelError),
	#[error("engine `{0}` is already registered")]
	DuplicateEngine(String),
	#[error("unknown engine `{0}`")]
	UnknownEngine(String),
}

impl EngineError {
	pub(crate) fn protocol(msg: impl Into<String>) -> Self {
		Self::Protocol(msg.into())
	}

	/// Returns true for failures that indicate an adapter/engine mismatch
	/// rather than a problem with the user's input.
	pub fn is_defect(&self) -> bool {
		matches!(self, Self::Protocol(_) | Self::Model(_))
	}
}

impl From<serde_json::Error> for EngineError {
	fn from(err: serde_json::Error) -> Self {
		Self::Protocol(err.to_string())
	}
}
