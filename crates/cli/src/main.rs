//! livematch command line.
//!
//! Runs one pattern over a text through any configured engine and prints
//! the matches, their groups and captures.

mod output;

use std::io::Read;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use livematch_engine::{EngineRegistry, MatchOptions};
use livematch_model::SharedText;
use livematch_primitives::CancelSource;
use livematch_session::Config;
use tracing_subscriber::EnvFilter;

/// Exit status when the match was interrupted.
const EXIT_INTERRUPTED: u8 = 130;

/// livematch command line arguments.
#[derive(Parser, Debug)]
#[command(name = "livematch")]
#[command(about = "Match a pattern through a livematch engine")]
struct Args {
	/// Pattern to match
	#[arg(short, long, required_unless_present = "list_engines")]
	pattern: Option<String>,

	/// Text to match against
	#[arg(short, long, conflicts_with = "file")]
	text: Option<String>,

	/// Read the text from a file instead of stdin
	#[arg(short, long, value_name = "PATH")]
	file: Option<PathBuf>,

	/// Engine to use; defaults to the configured default engine
	#[arg(short, long)]
	engine: Option<String>,

	/// Configuration file
	#[arg(short, long, value_name = "PATH")]
	config: Option<PathBuf>,

	/// Case-insensitive matching
	#[arg(short = 'i', long)]
	ignore_case: bool,

	/// `^` and `$` match at line boundaries
	#[arg(short = 'm', long)]
	multi_line: bool,

	/// `.` also matches newlines
	#[arg(short = 's', long)]
	dot_all: bool,

	/// Ignore whitespace and comments in the pattern
	#[arg(short = 'x', long)]
	extended: bool,

	/// Print matches as JSON
	#[arg(long)]
	json: bool,

	/// List the available engines and exit
	#[arg(long)]
	list_engines: bool,

	/// Verbose logging
	#[arg(short, long)]
	verbose: bool,
}

impl Args {
	fn options(&self) -> MatchOptions {
		MatchOptions {
			case_insensitive: self.ignore_case,
			multi_line: self.multi_line,
			dot_matches_new_line: self.dot_all,
			ignore_whitespace: self.extended,
			..MatchOptions::default()
		}
	}

	fn input(&self) -> anyhow::Result<String> {
		if let Some(text) = &self.text {
			return Ok(text.clone());
		}
		if let Some(path) = &self.file {
			return std::fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()));
		}
		let mut text = String::new();
		std::io::stdin().read_to_string(&mut text).context("failed to read stdin")?;
		Ok(text)
	}
}

fn setup_tracing(verbose: bool) -> anyhow::Result<()> {
	let filter = EnvFilter::try_from_env("LIVEMATCH_LOG").unwrap_or_else(|_| EnvFilter::new(if verbose { "debug" } else { "warn" }));
	let subscriber = tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).finish();
	tracing::subscriber::set_global_default(subscriber)?;
	Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
	let args = Args::parse();
	if let Err(err) = setup_tracing(args.verbose) {
		eprintln!("livematch: {err:#}");
	}
	match run(args).await {
		Ok(code) => code,
		Err(err) => {
			eprintln!("livematch: {err:#}");
			ExitCode::from(2)
		}
	}
}

async fn run(args: Args) -> anyhow::Result<ExitCode> {
	let config = match &args.config {
		Some(path) => Config::load(path)?,
		None => Config::load_default()?,
	};
	let registry = EngineRegistry::from_configs(&config.engines).context("invalid engine configuration")?;

	let mut stdout = std::io::stdout().lock();
	if args.list_engines {
		output::write_engines(&mut stdout, &registry, &config.default_engine)?;
		return Ok(ExitCode::SUCCESS);
	}

	let pattern = args.pattern.as_deref().context("no pattern given")?;
	let engine_name = args.engine.as_deref().unwrap_or(&config.default_engine);
	let engine = registry.require(engine_name)?;
	let matcher = engine.compile(pattern, &args.options()).with_context(|| format!("engine `{engine_name}` rejected the pattern"))?;
	let text = SharedText::from(args.input()?);
	tracing::debug!(engine = engine_name, chars = text.char_len(), "cli.match");

	let source = CancelSource::new();
	let token = source.token();
	let matching = matcher.matches(&text, &token);
	tokio::pin!(matching);
	let result = tokio::select! {
		result = &mut matching => result,
		_ = tokio::signal::ctrl_c() => {
			tracing::info!("interrupted; cancelling match");
			source.cancel();
			matching.await
		}
	};

	let Some(set) = result.with_context(|| format!("engine `{engine_name}` failed"))? else {
		eprintln!("livematch: cancelled");
		return Ok(ExitCode::from(EXIT_INTERRUPTED));
	};

	if args.json {
		output::write_json(&mut stdout, &set)?;
	} else {
		output::write_text(&mut stdout, &set)?;
	}
	Ok(if set.is_empty() { ExitCode::FAILURE } else { ExitCode::SUCCESS })
}
