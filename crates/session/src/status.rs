use livematch_model::MatchSet;

/// Best-known outcome of the latest completed rescan.
#[derive(Debug, Clone, Default)]
pub enum ScanStatus {
	/// No scan has completed, or there is no pattern to scan for.
	#[default]
	Idle,
	Matches(MatchSet),
	/// The engine rejected the pattern or failed while matching.
	Failed { engine: String, message: String },
}

impl ScanStatus {
	pub fn matches(&self) -> Option<&MatchSet> {
		match self {
			Self::Matches(set) => Some(set),
			_ => None,
		}
	}

	pub fn is_failed(&self) -> bool {
		matches!(self, Self::Failed { .. })
	}
}
