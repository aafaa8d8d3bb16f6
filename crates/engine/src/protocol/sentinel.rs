use std::fmt::Write as _;

use regex::Captures;

use super::{ByteSpan, ProtocolCache, RawGroup, RawMatch, Request};
use crate::{EngineError, MatchOptions};

/// Escapes `\`, LF and CR so a value fits on one line.
pub(super) fn escape(value: &str) -> String {
	let mut out = String::with_capacity(value.len());
	for ch in value.chars() {
		match ch {
			'\\' => out.push_str("\\\\"),
			'\n' => out.push_str("\\n"),
			'\r' => out.push_str("\\r"),
			other => out.push(other),
		}
	}
	out
}

pub(super) fn unescape(line: &str) -> Result<String, EngineError> {
	let mut out = String::with_capacity(line.len());
	let mut chars = line.chars();
	while let Some(ch) = chars.next() {
		if ch != '\\' {
			out.push(ch);
			continue;
		}
		match chars.next() {
			Some('\\') => out.push('\\'),
			Some('n') => out.push('\n'),
			Some('r') => out.push('\r'),
			Some(other) => return Err(EngineError::protocol(format!("unknown escape `\\{other}`"))),
			None => return Err(EngineError::protocol("dangling escape at end of line")),
		}
	}
	Ok(out)
}

pub(super) fn encode_request(pattern: &str, text: &str, options: &MatchOptions) -> Result<String, EngineError> {
	let options = serde_json::to_string(options)?;
	Ok(format!("{}\n{}\n{}\n", escape(pattern), escape(text), escape(&options)))
}

pub(super) fn decode_request(input: &str) -> Result<Request, EngineError> {
	let mut lines = input.split('\n').map(|l| l.strip_suffix('\r').unwrap_or(l));
	let mut next = |what: &str| lines.next().ok_or_else(|| EngineError::protocol(format!("request is missing the {what} line")));
	let pattern = unescape(next("pattern")?)?;
	let text = unescape(next("text")?)?;
	let options = unescape(next("options")?)?;
	let options = if options.trim().is_empty() { MatchOptions::default() } else { serde_json::from_str(&options)? };
	Ok(Request { pattern, text, options })
}

pub(super) fn encode_response(matches: &[RawMatch]) -> String {
	let mut out = String::new();
	for m in matches {
		let _ = writeln!(out, "M {} {}", m.span.0, m.span.1);
		for g in &m.groups {
			match g.span {
				Some((s, e)) => {
					let _ = writeln!(out, "G {} {s} {e}", g.name);
				}
				None => {
					let _ = writeln!(out, "G {} -", g.name);
				}
			}
			for (s, e) in &g.captures {
				let _ = writeln!(out, "C {s} {e}");
			}
		}
	}
	out
}

fn offset(caps: &Captures<'_>, index: usize, line_no: usize) -> Result<usize, EngineError> {
	caps.get(index)
		.and_then(|m| m.as_str().parse().ok())
		.ok_or_else(|| EngineError::protocol(format!("line {line_no}: offset out of range")))
}

fn pair(caps: &Captures<'_>, first: usize, line_no: usize) -> Result<ByteSpan, EngineError> {
	Ok((offset(caps, first, line_no)?, offset(caps, first + 1, line_no)?))
}

pub(super) fn decode_response(output: &str, cache: &ProtocolCache) -> Result<Vec<RawMatch>, EngineError> {
	let mut matches: Vec<RawMatch> = Vec::new();
	for (i, line) in output.lines().enumerate() {
		let line_no = i + 1;
		let line = line.trim_end();
		if line.is_empty() || line.starts_with('#') {
			continue;
		}
		if let Some(caps) = cache.match_line.captures(line) {
			matches.push(RawMatch {
				span: pair(&caps, 1, line_no)?,
				groups: Vec::new(),
			});
		} else if let Some(caps) = cache.group_line.captures(line) {
			let current = matches.last_mut().ok_or_else(|| EngineError::protocol(format!("line {line_no}: group before any match")))?;
			let span = if caps.get(2).is_some() { Some(pair(&caps, 2, line_no)?) } else { None };
			current.groups.push(RawGroup {
				name: caps[1].to_string(),
				span,
				captures: Vec::new(),
			});
		} else if let Some(caps) = cache.capture_line.captures(line) {
			let group = matches
				.last_mut()
				.and_then(|m| m.groups.last_mut())
				.ok_or_else(|| EngineError::protocol(format!("line {line_no}: capture before any group")))?;
			if group.span.is_none() {
				return Err(EngineError::protocol(format!("line {line_no}: capture on a failed group")));
			}
			group.captures.push(pair(&caps, 1, line_no)?);
		} else {
			return Err(EngineError::protocol(format!("line {line_no}: unrecognized line `{line}`")));
		}
	}
	if let Some((n, _)) = matches.iter().enumerate().find(|(_, m)| m.groups.is_empty()) {
		return Err(EngineError::protocol(format!("match {n} has no groups")));
	}
	Ok(matches)
}
