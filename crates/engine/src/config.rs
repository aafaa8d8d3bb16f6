use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::WireProtocol;

const DEFAULT_POLL_SLICE_MS: u64 = 400;
const DEFAULT_DRAIN_TIMEOUT_MS: u64 = 2_000;

fn default_poll_slice_ms() -> u64 {
	DEFAULT_POLL_SLICE_MS
}

fn default_drain_timeout_ms() -> u64 {
	DEFAULT_DRAIN_TIMEOUT_MS
}

/// One `[[engine]]` table: an external program spoken to over stdio.
///
/// ```toml
/// [[engine]]
/// name = "pcre2"
/// program = "/usr/local/bin/pcre2-engine"
/// args = ["--utf"]
/// protocol = "sentinel"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EngineConfig {
	pub name: String,
	pub program: PathBuf,
	#[serde(default)]
	pub args: Vec<String>,
	#[serde(default)]
	pub env: BTreeMap<String, String>,
	#[serde(default)]
	pub working_dir: Option<PathBuf>,
	#[serde(default)]
	pub protocol: WireProtocol,
	/// Slice between cancellation checks while the engine runs.
	#[serde(default = "default_poll_slice_ms")]
	pub poll_slice_ms: u64,
	/// Upper bound on draining output after the engine exited.
	#[serde(default = "default_drain_timeout_ms")]
	pub drain_timeout_ms: u64,
}

impl EngineConfig {
	pub fn new(name: impl Into<String>, program: impl Into<PathBuf>) -> Self {
		Self {
			name: name.into(),
			program: program.into(),
			args: Vec::new(),
			env: BTreeMap::new(),
			working_dir: None,
			protocol: WireProtocol::default(),
			poll_slice_ms: DEFAULT_POLL_SLICE_MS,
			drain_timeout_ms: DEFAULT_DRAIN_TIMEOUT_MS,
		}
	}

	#[must_use]
	pub fn with_args<I, S>(mut self, args: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		self.args = args.into_iter().map(Into::into).collect();
		self
	}

	#[must_use]
	pub fn with_protocol(mut self, protocol: WireProtocol) -> Self {
		self.protocol = protocol;
		self
	}

	#[must_use]
	pub fn with_poll_slice(mut self, slice: Duration) -> Self {
		self.poll_slice_ms = u64::try_from(slice.as_millis()).unwrap_or(u64::MAX);
		self
	}

	/// Poll slice, never shorter than one millisecond.
	pub fn poll_slice(&self) -> Duration {
		Duration::from_millis(self.poll_slice_ms.max(1))
	}

	pub fn drain_timeout(&self) -> Duration {
		Duration::from_millis(self.drain_timeout_ms)
	}
}
