use livematch_primitives::{CharLen, Cancellable, NON_CANCELLABLE, NaiveRanges, RangesError, RegionDiff, Segment};
use parking_lot::Mutex;

use crate::{RegionKind, RegionSink};

/// Segments of one region kind as last applied to the sink.
///
/// Stored as segment lists rather than flag arrays so they can be re-marked
/// onto a text of a different length after an edit.
#[derive(Debug)]
pub(super) struct RegionState {
	kind: RegionKind,
	applied: Mutex<Vec<Segment>>,
}

/// A diff computed off the presentation thread, plus what it was based on.
pub(super) struct PendingRegions {
	base: Vec<Segment>,
	diff: RegionDiff,
	next: Vec<Segment>,
	len: CharLen,
}

impl PendingRegions {
	pub(super) fn is_noop(&self) -> bool {
		self.diff.is_empty() && self.base == self.next
	}
}

/// Flags `segments` on an array of `len`, clipping anything past the end.
fn ranges(len: CharLen, segments: &[Segment]) -> Result<NaiveRanges, RangesError> {
	let clipped: Vec<Segment> = segments.iter().map(|s| s.clipped(len)).collect();
	NaiveRanges::from_segments(len, &clipped)
}

fn diff_segments(old: &[Segment], new: &[Segment], len: CharLen, cancel: &(impl Cancellable + ?Sized)) -> Result<RegionDiff, RangesError> {
	RegionDiff::between(&ranges(len, old)?, &ranges(len, new)?, cancel)
}

impl RegionState {
	pub(super) fn new(kind: RegionKind) -> Self {
		Self {
			kind,
			applied: Mutex::new(Vec::new()),
		}
	}

	pub(super) fn applied(&self) -> Vec<Segment> {
		self.applied.lock().clone()
	}

	/// Diffs the applied segments against `next` over a text of `len` characters.
	pub(super) fn prepare(&self, next: Vec<Segment>, len: CharLen, cancel: &(impl Cancellable + ?Sized)) -> Result<PendingRegions, RangesError> {
		let base = self.applied();
		let diff = diff_segments(&base, &next, len, cancel)?;
		Ok(PendingRegions { base, diff, next, len })
	}

	/// Pushes `pending` to `sink`. Must run on the presentation thread.
	///
	/// If another update landed since `pending` was prepared, the diff is
	/// recomputed against what is actually applied.
	pub(super) fn apply(&self, sink: &dyn RegionSink, pending: PendingRegions) {
		let mut applied = self.applied.lock();
		let PendingRegions { base, diff: prepared, next, len } = pending;
		let diff = if *applied == base {
			prepared
		} else {
			match diff_segments(&applied, &next, len, &NON_CANCELLABLE) {
				Ok(diff) => diff,
				Err(err) => {
					tracing::error!(kind = ?self.kind, error = %err, "region diff failed; skipping update");
					return;
				}
			}
		};
		if !diff.is_empty() {
			tracing::trace!(kind = ?self.kind, removed = diff.removed.len(), added = diff.added.len(), "regions.apply");
			sink.apply(self.kind, &diff);
		}
		*applied = next;
	}
}
