use serde::{Deserialize, Serialize};

use super::{ByteSpan, RawGroup, RawMatch, Request};
use crate::{EngineError, MatchOptions};

#[derive(Serialize)]
struct RequestRef<'a> {
	pattern: &'a str,
	text: &'a str,
	options: &'a MatchOptions,
}

#[derive(Debug, Serialize, Deserialize)]
struct Response {
	names: Vec<String>,
	matches: Vec<ResponseMatch>,
}

#[derive(Debug, Serialize, Deserialize)]
struct ResponseMatch {
	groups: Vec<Option<[usize; 2]>>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	captures: Option<Vec<Option<Vec<[usize; 2]>>>>,
}

fn span(pair: [usize; 2]) -> ByteSpan {
	(pair[0], pair[1])
}

pub(super) fn encode_request(pattern: &str, text: &str, options: &MatchOptions) -> Result<String, EngineError> {
	Ok(serde_json::to_string(&RequestRef { pattern, text, options })?)
}

pub(super) fn decode_request(input: &str) -> Result<Request, EngineError> {
	Ok(serde_json::from_str(input)?)
}

pub(super) fn decode_response(output: &str) -> Result<Vec<RawMatch>, EngineError> {
	let response: Response = serde_json::from_str(output)?;
	response
		.matches
		.into_iter()
		.enumerate()
		.map(|(n, m)| {
			let whole = match m.groups.first() {
				Some(Some(pair)) => span(*pair),
				_ => return Err(EngineError::protocol(format!("match {n} has no whole-match group"))),
			};
			let mut captures = m.captures.unwrap_or_default().into_iter();
			let groups = m
				.groups
				.into_iter()
				.enumerate()
				.map(|(i, pair)| RawGroup {
					name: response.names.get(i).cloned().unwrap_or_else(|| i.to_string()),
					span: pair.map(span),
					captures: captures.next().flatten().unwrap_or_default().into_iter().map(span).collect(),
				})
				.collect();
			Ok(RawMatch { span: whole, groups })
		})
		.collect()
}

pub(super) fn encode_response(matches: &[RawMatch]) -> Result<String, EngineError> {
	let names = matches.first().map(|m| m.groups.iter().map(|g| g.name.clone()).collect()).unwrap_or_default();
	let matches = matches
		.iter()
		.map(|m| {
			let repeated = m.groups.iter().any(|g| g.captures.len() > 1);
			ResponseMatch {
				groups: m.groups.iter().map(|g| g.span.map(|(s, e)| [s, e])).collect(),
				captures: repeated.then(|| {
					m.groups
						.iter()
						.map(|g| g.span.map(|_| g.captures.iter().map(|&(s, e)| [s, e]).collect()))
						.collect()
				}),
			}
		})
		.collect();
	Ok(serde_json::to_string(&Response { names, matches })?)
}
