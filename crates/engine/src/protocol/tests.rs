use livematch_primitives::{CancelSource, Segment};
use pretty_assertions::assert_eq;

use super::*;

fn group(name: &str, span: Option<ByteSpan>, captures: Vec<ByteSpan>) -> RawGroup {
	RawGroup {
		name: name.to_string(),
		span,
		captures,
	}
}

#[test]
fn json_response_with_names_and_failed_group() {
	let output = r#"{"names":["0","word","num"],"matches":[{"groups":[[1,4],[1,4],null]}]}"#;
	let matches = WireProtocol::Json.decode_response(output, &ProtocolCache::new()).expect("decode");
	assert_eq!(
		matches,
		vec![RawMatch {
			span: (1, 4),
			groups: vec![group("0", Some((1, 4)), vec![]), group("word", Some((1, 4)), vec![]), group("num", None, vec![])],
		}]
	);
}

#[test]
fn json_response_missing_names_fall_back_to_indices() {
	let output = r#"{"names":[],"matches":[{"groups":[[0,2],[1,2]],"captures":[null,[[0,1],[1,2]]]}]}"#;
	let matches = WireProtocol::Json.decode_response(output, &ProtocolCache::new()).expect("decode");
	assert_eq!(matches[0].groups[1], group("1", Some((1, 2)), vec![(0, 1), (1, 2)]));
}

#[test]
fn json_match_without_whole_group_is_a_protocol_error() {
	let output = r#"{"names":["0"],"matches":[{"groups":[null]}]}"#;
	let err = WireProtocol::Json.decode_response(output, &ProtocolCache::new()).expect_err("invalid");
	assert!(matches!(err, EngineError::Protocol(_)), "{err:?}");
	let err = WireProtocol::Json.decode_response("[1,2", &ProtocolCache::new()).expect_err("truncated");
	assert!(err.is_defect());
}

#[test]
fn sentinel_response_builds_nested_groups() {
	let output = "# engine v1\nM 0 3\nG 0 0 3\nG 1 0 1\nC 0 1\n\nG 2 -\nM 4 5\nG 0 4 5\n";
	let matches = WireProtocol::Sentinel.decode_response(output, &ProtocolCache::new()).expect("decode");
	assert_eq!(matches.len(), 2);
	assert_eq!(matches[0].groups, vec![group("0", Some((0, 3)), vec![]), group("1", Some((0, 1)), vec![(0, 1)]), group("2", None, vec![])]);
	assert_eq!(matches[1].span, (4, 5));
}

#[test]
fn sentinel_rejects_out_of_order_lines() {
	let cache = ProtocolCache::new();
	for bad in ["G 0 0 1\n", "M 0 1\nC 0 1\n", "M 0 1\nG 0 -\nC 0 1\n", "M 0 1\n", "X 1 2\n", "M 0 99999999999999999999999\nG 0 -\n"] {
		let err = WireProtocol::Sentinel.decode_response(bad, &cache).expect_err(bad);
		assert!(matches!(err, EngineError::Protocol(_)), "{bad:?} gave {err:?}");
	}
}

#[test]
fn sentinel_request_survives_line_breaks_and_backslashes() {
	let options = MatchOptions {
		multi_line: true,
		..MatchOptions::default()
	};
	let text = "first\r\nsecond \\n literal\nthird";
	let encoded = WireProtocol::Sentinel.encode_request(r"a\d+$", text, &options).expect("encode");
	assert_eq!(encoded.lines().count(), 3);
	let request = WireProtocol::Sentinel.decode_request(&encoded).expect("decode");
	assert_eq!(request.pattern, r"a\d+$");
	assert_eq!(request.text, text);
	assert_eq!(request.options, options);
}

#[test]
fn sentinel_unknown_escape_is_rejected() {
	assert!(sentinel::unescape(r"tab\t").is_err());
	assert!(sentinel::unescape("trailing\\").is_err());
	assert_eq!(sentinel::unescape(r"a\\b\nc").expect("valid"), "a\\b\nc");
}

#[test]
fn json_request_carries_options_blob() {
	let encoded = WireProtocol::Json.encode_request("x", "y", &MatchOptions::default()).expect("encode");
	let value: serde_json::Value = serde_json::from_str(&encoded).expect("json");
	assert_eq!(value["pattern"], "x");
	assert_eq!(value["text"], "y");
	assert_eq!(value["options"]["case_insensitive"], false);
}

#[test]
fn encoded_responses_decode_to_the_same_matches() {
	let matches = vec![RawMatch {
		span: (0, 4),
		groups: vec![group("0", Some((0, 4)), vec![(0, 4)]), group("rep", Some((2, 4)), vec![(0, 2), (2, 4)]), group("opt", None, vec![])],
	}];
	let cache = ProtocolCache::new();
	for protocol in [WireProtocol::Json, WireProtocol::Sentinel] {
		let encoded = protocol.encode_response(&matches).expect("encode");
		assert_eq!(protocol.decode_response(&encoded, &cache).expect("decode"), matches, "{protocol:?}");
	}
}

#[test]
fn assemble_converts_bytes_to_characters() {
	let text = SharedText::from("a€b");
	let raw = vec![RawMatch {
		span: (1, 4),
		groups: vec![group("0", Some((1, 4)), vec![]), group("1", None, vec![])],
	}];
	let set = assemble(&text, raw, &CancelToken::none()).expect("assemble").expect("complete");
	let m = set.get(0).expect("match");
	assert_eq!(m.segment(), Segment::new(1, 1));
	assert_eq!(m.value(), "€");
	assert_eq!(m.groups()[0].captures().len(), 1, "implicit capture for a plain group");
	assert!(!m.groups()[1].success());
}

#[test]
fn assemble_rejects_offsets_inside_a_character() {
	let text = SharedText::from("a€b");
	let raw = vec![RawMatch {
		span: (1, 3),
		groups: vec![group("0", Some((1, 3)), vec![])],
	}];
	let err = assemble(&text, raw, &CancelToken::none()).expect_err("mid-character");
	assert!(matches!(err, EngineError::Model(_)));
}

#[test]
fn assemble_stops_when_cancelled() {
	let source = CancelSource::new();
	source.cancel();
	let raw = vec![RawMatch {
		span: (0, 1),
		groups: vec![group("0", Some((0, 1)), vec![])],
	}];
	assert!(assemble(&SharedText::from("a"), raw, &source.token()).expect("no error").is_none());
}

#[test]
fn protocol_names_parse() {
	assert_eq!("json".parse::<WireProtocol>(), Ok(WireProtocol::Json));
	assert_eq!("sentinel".parse::<WireProtocol>(), Ok(WireProtocol::Sentinel));
	assert!("xml".parse::<WireProtocol>().is_err());
}
