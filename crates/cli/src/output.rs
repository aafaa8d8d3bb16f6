use std::io::{self, Write};

use livematch_engine::EngineRegistry;
use livematch_model::{MatchSet, TextSource};
use livematch_primitives::Segment;

/// `line:column` of a character, both one-based.
fn position(set: &MatchSet, index: usize) -> String {
	match set.text().position_of(index) {
		Some(pos) => format!("{}:{}", pos.line + 1, pos.column + 1),
		None => format!("@{index}"),
	}
}

fn span(set: &MatchSet, segment: Segment) -> String {
	format!("{}-{}", position(set, segment.index), position(set, segment.end()))
}

/// One line per match, then one indented line per group.
///
/// Groups with more than one capture list each capture below the group.
pub fn write_text(out: &mut impl Write, set: &MatchSet) -> io::Result<()> {
	for m in set {
		writeln!(out, "{} {:?}", span(set, m.segment()), m.value())?;
		for group in m.groups().iter().skip(1) {
			if !group.success() {
				writeln!(out, "  {}: -", group.name())?;
				continue;
			}
			writeln!(out, "  {}: {} {:?}", group.name(), span(set, group.segment()), group.value())?;
			if group.captures().len() > 1 {
				for capture in group.captures() {
					writeln!(out, "    {} {:?}", span(set, capture.segment()), capture.value())?;
				}
			}
		}
	}
	Ok(())
}

pub fn write_json(out: &mut impl Write, set: &MatchSet) -> io::Result<()> {
	serde_json::to_writer_pretty(&mut *out, set)?;
	writeln!(out)
}

pub fn write_engines(out: &mut impl Write, registry: &EngineRegistry, default: &str) -> io::Result<()> {
	for engine in registry.iter() {
		let marker = if engine.name() == default { " (default)" } else { "" };
		writeln!(out, "{}\t{:?}{marker}", engine.name(), engine.kind())?;
	}
	Ok(())
}

#[cfg(test)]
mod tests {
	use livematch_engine::{Engine, MatchOptions, RegexEngine, RegexFlavor};
	use livematch_model::SharedText;
	use livematch_primitives::CancelToken;
	use pretty_assertions::assert_eq;

	use super::*;

	fn matches(pattern: &str, text: &str) -> MatchSet {
		let matcher = RegexEngine::new(RegexFlavor::Fancy).compile(pattern, &MatchOptions::default()).unwrap();
		let text = SharedText::from(text);
		let runtime = tokio::runtime::Builder::new_current_thread().build().unwrap();
		runtime.block_on(matcher.matches(&text, &CancelToken::none())).unwrap().unwrap()
	}

	fn render(set: &MatchSet) -> String {
		let mut out = Vec::new();
		write_text(&mut out, set).unwrap();
		String::from_utf8(out).unwrap()
	}

	#[test]
	fn text_lists_groups_by_position() {
		let set = matches(r"(?P<key>\w+)=(\d+)?", "a=1\nbé=");
		assert_eq!(
			render(&set),
			"1:1-1:4 \"a=1\"\n  key: 1:1-1:2 \"a\"\n  2: 1:3-1:4 \"1\"\n2:1-2:4 \"bé=\"\n  key: 2:1-2:3 \"bé\"\n  2: -\n"
		);
	}

	#[test]
	fn json_carries_values_and_offsets() {
		let set = matches("b+", "abbc");
		let mut out = Vec::new();
		write_json(&mut out, &set).unwrap();
		let value: serde_json::Value = serde_json::from_slice(&out).unwrap();
		assert_eq!(value["count"], 1);
		assert_eq!(value["matches"][0]["index"], 1);
		assert_eq!(value["matches"][0]["value"], "bb");
		assert_eq!(value["matches"][0]["groups"][0]["captures"][0]["length"], 2);
	}

	#[test]
	fn engines_mark_the_default() {
		let mut out = Vec::new();
		write_engines(&mut out, &EngineRegistry::with_builtins(), "fancy-regex").unwrap();
		let listing = String::from_utf8(out).unwrap();
		assert!(listing.contains("regex\tInProcess\n"), "{listing}");
		assert!(listing.contains("fancy-regex\tInProcess (default)\n"), "{listing}");
	}
}
