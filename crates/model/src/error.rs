use livematch_primitives::{OffsetError, Segment};

/// Errors building a match tree from engine output.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ModelError {
	/// The engine reported a span past the end of the text.
	#[error("span {segment} exceeds text of {len} characters")]
	OutOfBounds { segment: Segment, len: usize },
	/// The engine reported an end before its start.
	#[error("span end {end} precedes start {start}")]
	InvertedSpan { start: usize, end: usize },
	#[error(transparent)]
	Offset(#[from] OffsetError),
}
