use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Options blob handed to every engine alongside the pattern.
///
/// The flag set is the common denominator of the supported engines. Anything
/// engine-specific travels in `extra`, untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchOptions {
	pub case_insensitive: bool,
	pub multi_line: bool,
	pub dot_matches_new_line: bool,
	pub ignore_whitespace: bool,
	/// Grammar selector for engines that support several dialects.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub grammar: Option<String>,
	#[serde(skip_serializing_if = "Map::is_empty")]
	pub extra: Map<String, Value>,
}

impl MatchOptions {
	/// Inline flag group equivalent to the boolean options, e.g. `(?im)`.
	///
	/// Empty when no flag is set.
	pub fn inline_flags(&self) -> String {
		let flags: String = [
			(self.case_insensitive, 'i'),
			(self.multi_line, 'm'),
			(self.dot_matches_new_line, 's'),
			(self.ignore_whitespace, 'x'),
		]
		.into_iter()
		.filter_map(|(on, flag)| on.then_some(flag))
		.collect();
		if flags.is_empty() { flags } else { format!("(?{flags})") }
	}
}
