//! Wire formats spoken with out-of-process engines.
//!
//! Both formats carry byte offsets. Decoding yields [`RawMatch`]es, which
//! [`assemble`] converts to a character-indexed [`MatchSet`]. The encoding
//! halves for the engine side are public so helper engines can reuse them.

mod json;
mod sentinel;

use livematch_model::{MatchSet, MatchSetBuilder, SharedText};
use livematch_primitives::{ByteIdx, CancelToken};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::{EngineError, MatchOptions};

/// Half-open byte range `[start, end)` as reported by an engine.
pub type ByteSpan = (ByteIdx, ByteIdx);

/// Request/response encoding of a process engine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WireProtocol {
	/// One JSON document each way.
	#[default]
	Json,
	/// Escaped request lines; `M`/`G`/`C` marker lines back.
	Sentinel,
}

impl std::str::FromStr for WireProtocol {
	type Err = String;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s {
			"json" => Ok(Self::Json),
			"sentinel" => Ok(Self::Sentinel),
			other => Err(format!("unknown wire protocol `{other}`")),
		}
	}
}

/// A decoded request, as seen by the engine side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Request {
	pub pattern: String,
	pub text: String,
	#[serde(default)]
	pub options: MatchOptions,
}

/// One group of a [`RawMatch`]. `span` is `None` for a group that did not
/// participate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawGroup {
	pub name: String,
	pub span: Option<ByteSpan>,
	pub captures: Vec<ByteSpan>,
}

/// One match in engine byte offsets; `groups[0]` is the whole match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawMatch {
	pub span: ByteSpan,
	pub groups: Vec<RawGroup>,
}

/// Line patterns of the sentinel format, compiled once per engine instance.
#[derive(Debug, Clone)]
pub struct ProtocolCache {
	match_line: Regex,
	group_line: Regex,
	capture_line: Regex,
}

impl ProtocolCache {
	pub fn new() -> Self {
		Self {
			match_line: compile_static(r"^M (\d+) (\d+)$"),
			group_line: compile_static(r"^G (\S+) (?:(\d+) (\d+)|-)$"),
			capture_line: compile_static(r"^C (\d+) (\d+)$"),
		}
	}
}

impl Default for ProtocolCache {
	fn default() -> Self {
		Self::new()
	}
}

fn compile_static(pattern: &str) -> Regex {
	Regex::new(pattern).expect("sentinel line pattern must compile")
}

impl WireProtocol {
	/// Encodes the request written to the engine's standard input.
	pub fn encode_request(self, pattern: &str, text: &str, options: &MatchOptions) -> Result<String, EngineError> {
		match self {
			Self::Json => json::encode_request(pattern, text, options),
			Self::Sentinel => sentinel::encode_request(pattern, text, options),
		}
	}

	/// Decodes a request read by the engine side.
	pub fn decode_request(self, input: &str) -> Result<Request, EngineError> {
		match self {
			Self::Json => json::decode_request(input),
			Self::Sentinel => sentinel::decode_request(input),
		}
	}

	/// Encodes matches as the engine side writes them.
	pub fn encode_response(self, matches: &[RawMatch]) -> Result<String, EngineError> {
		match self {
			Self::Json => json::encode_response(matches),
			Self::Sentinel => Ok(sentinel::encode_response(matches)),
		}
	}

	/// Decodes a complete standard-output capture.
	pub fn decode_response(self, output: &str, cache: &ProtocolCache) -> Result<Vec<RawMatch>, EngineError> {
		match self {
			Self::Json => json::decode_response(output),
			Self::Sentinel => sentinel::decode_response(output, cache),
		}
	}
}

/// Converts engine byte offsets into a character-indexed match set.
///
/// A group reported without captures gets a single capture equal to its span.
/// Returns `Ok(None)` if `cancel` fires between matches.
pub fn assemble(text: &SharedText, matches: Vec<RawMatch>, cancel: &CancelToken) -> Result<Option<MatchSet>, EngineError> {
	let mut builder = MatchSetBuilder::new(text.clone());
	for raw in matches {
		if cancel.is_cancelled() {
			return Ok(None);
		}
		let mut m = builder.open_bytes(raw.span.0, raw.span.1)?;
		for group in raw.groups {
			let Some((start, end)) = group.span else {
				m.failed_group(group.name);
				continue;
			};
			let mut g = m.group_bytes(group.name, start, end)?;
			if group.captures.is_empty() {
				g.capture_bytes(start, end)?;
			}
			for (cs, ce) in group.captures {
				g.capture_bytes(cs, ce)?;
			}
		}
		m.commit();
	}
	Ok(Some(builder.finish()))
}

#[cfg(test)]
mod tests;
