//! `livematch.toml` loading.

use std::path::{Path, PathBuf};

use livematch_engine::EngineConfig;
use livematch_worker::DebounceTimeouts;
use serde::{Deserialize, Serialize};

const CONFIG_DIR: &str = "livematch";
const CONFIG_FILE: &str = "livematch.toml";

/// Errors reading or parsing a configuration file.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
	#[error("failed to read {}: {source}", .path.display())]
	Read { path: PathBuf, source: std::io::Error },
	#[error("failed to parse {}: {source}", .path.display())]
	Parse { path: PathBuf, source: toml::de::Error },
}

/// Debounce stages in milliseconds; zero inherits the previous stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DebounceConfig {
	pub first_ms: u64,
	pub repeat_ms: u64,
	pub settled_ms: u64,
}

impl DebounceConfig {
	pub const fn new(first_ms: u64, repeat_ms: u64, settled_ms: u64) -> Self {
		Self { first_ms, repeat_ms, settled_ms }
	}

	pub fn timeouts(&self) -> DebounceTimeouts {
		DebounceTimeouts::from_millis(self.first_ms, self.repeat_ms, self.settled_ms)
	}
}

impl Default for DebounceConfig {
	fn default() -> Self {
		Self::new(33, 33, 444)
	}
}

/// Contents of `livematch.toml`.
///
/// ```toml
/// default_engine = "fancy-regex"
///
/// [rescan]
/// first_ms = 33
/// repeat_ms = 33
/// settled_ms = 444
///
/// [[engine]]
/// name = "pcre2"
/// program = "/usr/local/bin/pcre2-engine"
/// protocol = "sentinel"
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
	/// Engine a new session starts with.
	pub default_engine: String,
	pub rescan: DebounceConfig,
	/// External underline debounce; it follows pointer movement, so stays short.
	pub underline: DebounceConfig,
	#[serde(rename = "engine")]
	pub engines: Vec<EngineConfig>,
}

impl Default for Config {
	fn default() -> Self {
		Self {
			default_engine: "regex".to_string(),
			rescan: DebounceConfig::default(),
			underline: DebounceConfig::new(22, 22, 0),
			engines: Vec::new(),
		}
	}
}

impl Config {
	/// `<config dir>/livematch/livematch.toml`, if the platform has a config dir.
	pub fn default_path() -> Option<PathBuf> {
		dirs::config_dir().map(|dir| dir.join(CONFIG_DIR).join(CONFIG_FILE))
	}

	/// Reads and parses `path`.
	///
	/// # Errors
	///
	/// Fails if the file cannot be read or is not valid configuration.
	pub fn load(path: &Path) -> Result<Self, ConfigError> {
		let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
			path: path.to_path_buf(),
			source,
		})?;
		let config = Self::parse(&text).map_err(|source| ConfigError::Parse {
			path: path.to_path_buf(),
			source,
		})?;
		tracing::debug!(path = %path.display(), engines = config.engines.len(), "config.loaded");
		Ok(config)
	}

	/// Loads the file at [`Self::default_path`], or defaults when it does not exist.
	///
	/// # Errors
	///
	/// Fails if the file exists but cannot be read or parsed.
	pub fn load_default() -> Result<Self, ConfigError> {
		match Self::default_path() {
			Some(path) if path.exists() => Self::load(&path),
			_ => Ok(Self::default()),
		}
	}

	pub fn parse(text: &str) -> Result<Self, toml::de::Error> {
		toml::from_str(text)
	}
}

#[cfg(test)]
mod tests {
	use std::io::Write;

	use livematch_engine::WireProtocol;
	use pretty_assertions::assert_eq;

	use super::*;

	#[test]
	fn empty_file_is_the_default() {
		assert_eq!(Config::parse("").expect("parse"), Config::default());
	}

	#[test]
	fn sections_and_engine_tables() {
		let config = Config::parse(
			r#"
default_engine = "pcre"

[rescan]
first_ms = 50
repeat_ms = 0
settled_ms = 500

[[engine]]
name = "pcre"
program = "/opt/pcre-engine"
args = ["--utf"]
protocol = "sentinel"
poll_slice_ms = 100
"#,
		)
		.expect("parse");

		assert_eq!(config.default_engine, "pcre");
		assert_eq!(config.rescan.timeouts(), DebounceTimeouts::from_millis(50, 50, 500));
		assert_eq!(config.underline, Config::default().underline);
		assert_eq!(config.engines.len(), 1);
		let engine = &config.engines[0];
		assert_eq!(engine.protocol, WireProtocol::Sentinel);
		assert_eq!(engine.args, ["--utf"]);
		assert_eq!(engine.poll_slice_ms, 100);
	}

	#[test]
	fn unknown_keys_are_rejected() {
		assert!(Config::parse("[rescan]\nfirst = 5\n").is_err());
	}

	#[test]
	fn load_reports_path_on_error() {
		let mut file = tempfile::NamedTempFile::new().expect("tempfile");
		writeln!(file, "default_engine = 5").expect("write");
		let err = Config::load(file.path()).expect_err("invalid");
		assert!(matches!(err, ConfigError::Parse { .. }));
		assert!(err.to_string().contains(&file.path().display().to_string()));

		let missing = file.path().with_extension("missing");
		assert!(matches!(Config::load(&missing), Err(ConfigError::Read { .. })));
	}

	#[test]
	fn load_reads_file() {
		let mut file = tempfile::NamedTempFile::new().expect("tempfile");
		writeln!(file, "[underline]\nfirst_ms = 5").expect("write");
		let config = Config::load(file.path()).expect("load");
		assert_eq!(config.underline.first_ms, 5);
		assert_eq!(config.rescan, DebounceConfig::default());
	}
}
