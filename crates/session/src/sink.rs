use livematch_primitives::RegionDiff;

use crate::ScanStatus;

/// Kinds of display region the session maintains.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RegionKind {
	/// Every match in the text.
	Highlight,
	/// Groups of the matches under the caret.
	LocalUnderline,
	/// A segment selected elsewhere by the host, e.g. in a results list.
	ExternalUnderline,
}

/// Rendering boundary.
///
/// Always called on the presentation thread, through the session's
/// presentation executor. Diffs only name characters whose state changed.
pub trait RegionSink: Send + Sync {
	/// Removes `diff.removed` and adds `diff.added` for `kind`.
	fn apply(&self, kind: RegionKind, diff: &RegionDiff);

	/// A rescan produced `status`; it is also readable through
	/// [`crate::MatchSession::current_matches`].
	fn scan_finished(&self, status: &ScanStatus) {
		let _ = status;
	}
}
