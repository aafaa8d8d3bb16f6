//! Reference out-of-process engine.
//!
//! Reads one request from standard input, matches it with the `regex` or
//! `fancy-regex` crate and writes byte-offset results to standard output.
//! Pattern errors go to standard error with exit code 1.

use std::io::{Read, Write};
use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;
use livematch_engine::WireProtocol;
use livematch_engine::protocol::{RawGroup, RawMatch, Request};

#[derive(Parser, Debug)]
#[command(name = "livematch-regex-engine")]
#[command(about = "Regex engine speaking the livematch wire protocols over stdio")]
struct Args {
	/// Wire protocol: `json` or `sentinel`.
	#[arg(long, default_value = "json")]
	protocol: WireProtocol,

	/// Use fancy-regex (look-around, back-references).
	#[arg(long)]
	fancy: bool,

	/// Sleep before answering, to simulate a slow engine.
	#[arg(long, default_value_t = 0)]
	delay_ms: u64,
}

fn group_name(index: usize, name: Option<&str>) -> String {
	name.map_or_else(|| index.to_string(), str::to_owned)
}

fn raw_match(names: &[String], spans: impl Iterator<Item = Option<(usize, usize)>>) -> Option<RawMatch> {
	let groups: Vec<RawGroup> = spans
		.zip(names)
		.map(|(span, name)| RawGroup {
			name: name.clone(),
			span,
			captures: span.into_iter().collect(),
		})
		.collect();
	Some(RawMatch {
		span: groups.first()?.span?,
		groups,
	})
}

fn find_standard(request: &Request) -> Result<Vec<RawMatch>, String> {
	let options = &request.options;
	let re = regex::RegexBuilder::new(&request.pattern)
		.case_insensitive(options.case_insensitive)
		.multi_line(options.multi_line)
		.dot_matches_new_line(options.dot_matches_new_line)
		.ignore_whitespace(options.ignore_whitespace)
		.build()
		.map_err(|e| e.to_string())?;
	let names: Vec<String> = re.capture_names().enumerate().map(|(i, n)| group_name(i, n)).collect();
	Ok(re
		.captures_iter(&request.text)
		.filter_map(|caps| raw_match(&names, caps.iter().map(|g| g.map(|g| (g.start(), g.end())))))
		.collect())
}

fn find_fancy(request: &Request) -> Result<Vec<RawMatch>, String> {
	let source = format!("{}{}", request.options.inline_flags(), request.pattern);
	let re = fancy_regex::Regex::new(&source).map_err(|e| e.to_string())?;
	let names: Vec<String> = re.capture_names().enumerate().map(|(i, n)| group_name(i, n)).collect();
	let mut out = Vec::new();
	for caps in re.captures_iter(&request.text) {
		let caps = caps.map_err(|e| e.to_string())?;
		out.extend(raw_match(&names, (0..caps.len()).map(|i| caps.get(i).map(|g| (g.start(), g.end())))));
	}
	Ok(out)
}

fn run(args: &Args) -> Result<String, String> {
	let mut input = String::new();
	std::io::stdin().read_to_string(&mut input).map_err(|e| format!("failed to read request: {e}"))?;
	let request = args.protocol.decode_request(&input).map_err(|e| e.to_string())?;
	if args.delay_ms > 0 {
		std::thread::sleep(Duration::from_millis(args.delay_ms));
	}
	let matches = if args.fancy { find_fancy(&request)? } else { find_standard(&request)? };
	args.protocol.encode_response(&matches).map_err(|e| e.to_string())
}

fn main() -> ExitCode {
	let args = Args::parse();
	match run(&args) {
		Ok(output) => {
			let mut stdout = std::io::stdout().lock();
			if stdout.write_all(output.as_bytes()).and_then(|()| stdout.flush()).is_err() {
				return ExitCode::FAILURE;
			}
			ExitCode::SUCCESS
		}
		Err(message) => {
			eprintln!("{message}");
			ExitCode::FAILURE
		}
	}
}
