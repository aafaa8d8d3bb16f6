//! Engines running inside the host process.

use std::sync::Arc;

use async_trait::async_trait;
use livematch_model::{MatchSet, MatchSetBuilder, SharedText};
use livematch_primitives::CancelToken;

use crate::{Engine, EngineError, EngineKind, MatchOptions, Matcher};

/// Regex dialect of a [`RegexEngine`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegexFlavor {
	/// The `regex` crate: linear time, no look-around or back-references.
	Standard,
	/// `fancy-regex`: backtracking, with look-around and back-references.
	Fancy,
}

impl RegexFlavor {
	pub const fn engine_name(self) -> &'static str {
		match self {
			Self::Standard => "regex",
			Self::Fancy => "fancy-regex",
		}
	}
}

/// In-process engine over the `regex` or `fancy-regex` crate.
#[derive(Debug, Clone, Copy)]
pub struct RegexEngine {
	flavor: RegexFlavor,
}

impl RegexEngine {
	pub const fn new(flavor: RegexFlavor) -> Self {
		Self { flavor }
	}

	pub const fn flavor(&self) -> RegexFlavor {
		self.flavor
	}
}

impl Engine for RegexEngine {
	fn name(&self) -> &str {
		self.flavor.engine_name()
	}

	fn kind(&self) -> EngineKind {
		EngineKind::InProcess
	}

	fn compile(&self, pattern: &str, options: &MatchOptions) -> Result<Arc<dyn Matcher>, EngineError> {
		let compiled = match self.flavor {
			RegexFlavor::Standard => Compiled::Standard(
				regex::RegexBuilder::new(pattern)
					.case_insensitive(options.case_insensitive)
					.multi_line(options.multi_line)
					.dot_matches_new_line(options.dot_matches_new_line)
					.ignore_whitespace(options.ignore_whitespace)
					.build()
					.map_err(|e| EngineError::Pattern(e.to_string()))?,
			),
			RegexFlavor::Fancy => {
				let source = format!("{}{pattern}", options.inline_flags());
				Compiled::Fancy(fancy_regex::Regex::new(&source).map_err(|e| EngineError::Pattern(e.to_string()))?)
			}
		};
		Ok(Arc::new(RegexMatcher { compiled }))
	}
}

enum Compiled {
	Standard(regex::Regex),
	Fancy(fancy_regex::Regex),
}

struct RegexMatcher {
	compiled: Compiled,
}

/// Group names in capture order; unnamed groups use their index.
fn group_names<'a>(names: impl Iterator<Item = Option<&'a str>>) -> Vec<Arc<str>> {
	names
		.enumerate()
		.map(|(i, name)| match name {
			Some(name) => Arc::from(name),
			None => Arc::from(i.to_string()),
		})
		.collect()
}

/// Appends one match given per-group byte spans, group 0 first.
fn push_match(builder: &mut MatchSetBuilder, names: &[Arc<str>], spans: impl Iterator<Item = Option<(usize, usize)>>) -> Result<(), EngineError> {
	let mut spans = spans.enumerate().peekable();
	let Some((_, Some((start, end)))) = spans.peek().copied() else {
		return Err(EngineError::protocol("match without a whole-match group"));
	};
	let mut m = builder.open_bytes(start, end)?;
	for (i, span) in spans {
		let name = Arc::clone(&names[i]);
		match span {
			Some((s, e)) => {
				m.group_bytes(name, s, e)?.capture_bytes(s, e)?;
			}
			None => m.failed_group(name),
		}
	}
	m.commit();
	Ok(())
}

#[async_trait]
impl Matcher for RegexMatcher {
	async fn matches(&self, text: &SharedText, cancel: &CancelToken) -> Result<Option<MatchSet>, EngineError> {
		let mut builder = MatchSetBuilder::new(text.clone());
		let haystack = text.as_str();
		match &self.compiled {
			Compiled::Standard(re) => {
				let names = group_names(re.capture_names());
				for caps in re.captures_iter(haystack) {
					if cancel.is_cancelled() {
						return Ok(None);
					}
					push_match(&mut builder, &names, caps.iter().map(|g| g.map(|g| (g.start(), g.end()))))?;
				}
			}
			Compiled::Fancy(re) => {
				let names = group_names(re.capture_names());
				for caps in re.captures_iter(haystack) {
					if cancel.is_cancelled() {
						return Ok(None);
					}
					let caps = caps.map_err(|e| EngineError::Engine(e.to_string()))?;
					push_match(&mut builder, &names, (0..caps.len()).map(|i| caps.get(i).map(|g| (g.start(), g.end()))))?;
				}
			}
		}
		if cancel.is_cancelled() {
			return Ok(None);
		}
		Ok(Some(builder.finish()))
	}
}

#[cfg(test)]
mod tests {
	use livematch_primitives::{CancelSource, Segment};
	use pretty_assertions::assert_eq;

	use super::*;

	async fn run(flavor: RegexFlavor, pattern: &str, text: &str) -> MatchSet {
		let matcher = RegexEngine::new(flavor).compile(pattern, &MatchOptions::default()).expect("compile");
		matcher.matches(&SharedText::from(text), &CancelToken::none()).await.expect("match").expect("not cancelled")
	}

	#[tokio::test]
	async fn single_match_with_whole_match_group() {
		for flavor in [RegexFlavor::Standard, RegexFlavor::Fancy] {
			let set = run(flavor, "a+", "baaab").await;
			assert_eq!(set.count(), 1);
			let m = set.get(0).expect("one match");
			assert_eq!((m.index(), m.length(), m.value()), (1, 3, "aaa"));
			assert_eq!(m.groups().len(), 1);
			assert!(m.groups()[0].success());
			assert_eq!(m.groups()[0].name(), "0");
		}
	}

	#[tokio::test]
	async fn multibyte_offsets_are_characters() {
		let set = run(RegexFlavor::Standard, "€", "a€b").await;
		let m = set.get(0).expect("match");
		assert_eq!(m.segment(), Segment::new(1, 1));
		assert_eq!(m.value(), "€");
	}

	#[tokio::test]
	async fn non_participating_group_is_reported_failed() {
		let set = run(RegexFlavor::Standard, "(?<x>x)|(?<y>y)", "y").await;
		let groups = set.get(0).expect("match").groups();
		assert_eq!(groups.len(), 3);
		assert_eq!(groups[1].name(), "x");
		assert!(!groups[1].success());
		assert_eq!(groups[1].value(), "");
		assert!(groups[2].success());
		assert_eq!(groups[2].captures().len(), 1);
	}

	#[tokio::test]
	async fn fancy_supports_lookbehind() {
		let set = run(RegexFlavor::Fancy, r"(?<=\$)\d+", "cost $42 or 7").await;
		assert_eq!(set.count(), 1);
		assert_eq!(set.get(0).expect("match").value(), "42");
	}

	#[tokio::test]
	async fn options_apply_to_both_flavors() {
		let options = MatchOptions {
			case_insensitive: true,
			..MatchOptions::default()
		};
		for flavor in [RegexFlavor::Standard, RegexFlavor::Fancy] {
			let matcher = RegexEngine::new(flavor).compile("abc", &options).expect("compile");
			let set = matcher.matches(&SharedText::from("xABCx"), &CancelToken::none()).await.expect("match").expect("set");
			assert_eq!(set.count(), 1, "{flavor:?}");
		}
	}

	#[test]
	fn invalid_pattern_is_rejected_at_compile() {
		let err = RegexEngine::new(RegexFlavor::Standard).compile("(", &MatchOptions::default()).err().expect("invalid");
		assert!(matches!(err, EngineError::Pattern(_)));
		let err = RegexEngine::new(RegexFlavor::Fancy).compile("(?<=", &MatchOptions::default()).err().expect("invalid");
		assert!(matches!(err, EngineError::Pattern(_)));
	}

	#[tokio::test]
	async fn cancelled_token_yields_no_result() {
		let source = CancelSource::new();
		source.cancel();
		let matcher = RegexEngine::new(RegexFlavor::Standard).compile("a", &MatchOptions::default()).expect("compile");
		let result = matcher.matches(&SharedText::from("aaaa"), &source.token()).await.expect("no error");
		assert!(result.is_none());
	}
}
