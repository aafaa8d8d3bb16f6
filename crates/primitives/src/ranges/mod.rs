//! Boolean range arrays used to diff highlighted regions.
//!
//! One flag per character index. Two arrays built from the previous and the
//! freshly computed regions are combined to find only the characters whose
//! state actually changed, then run-length encoded back into [`Segment`]s.

use crate::cancel::{Cancellable, Cancelled};
use crate::offsets::CharLen;
use crate::segment::Segment;

/// Errors from combining or filling [`NaiveRanges`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum RangesError {
	/// Operands were built for texts of different lengths.
	#[error("range arrays differ in size: {left} vs {right}")]
	SizeMismatch { left: usize, right: usize },
	/// A segment extends past the end of the array.
	#[error("segment {segment} exceeds range array of length {len}")]
	OutOfBounds { segment: Segment, len: usize },
	#[error("operation cancelled")]
	Cancelled,
}

impl From<Cancelled> for RangesError {
	fn from(_: Cancelled) -> Self {
		Self::Cancelled
	}
}

/// Fixed-length flag array over character positions.
///
/// The length never changes after construction. Combinators return new
/// instances and never mutate their operands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NaiveRanges {
	flags: Box<[bool]>,
}

impl NaiveRanges {
	/// Creates an array of `len` unset flags.
	pub fn new(len: CharLen) -> Self {
		Self {
			flags: vec![false; len].into_boxed_slice(),
		}
	}

	/// Creates an array of `len` flags with every segment marked.
	///
	/// # Errors
	///
	/// Fails if any segment exceeds `len`.
	pub fn from_segments<'a>(len: CharLen, segments: impl IntoIterator<Item = &'a Segment>) -> Result<Self, RangesError> {
		let mut ranges = Self::new(len);
		ranges.mark_all(segments)?;
		Ok(ranges)
	}

	pub fn len(&self) -> usize {
		self.flags.len()
	}

	pub fn is_empty(&self) -> bool {
		self.flags.is_empty()
	}

	/// Returns the flag at `index`, or `None` past the end.
	pub fn get(&self, index: usize) -> Option<bool> {
		self.flags.get(index).copied()
	}

	/// Sets every flag covered by `segment`.
	///
	/// # Errors
	///
	/// Fails without marking anything if the segment exceeds the array.
	pub fn mark(&mut self, segment: &Segment) -> Result<(), RangesError> {
		let len = self.flags.len();
		let slot = self.flags.get_mut(segment.index..segment.end()).ok_or(RangesError::OutOfBounds { segment: *segment, len })?;
		slot.fill(true);
		Ok(())
	}

	/// Marks each segment in turn.
	///
	/// # Errors
	///
	/// Stops at the first segment that exceeds the array.
	pub fn mark_all<'a>(&mut self, segments: impl IntoIterator<Item = &'a Segment>) -> Result<(), RangesError> {
		segments.into_iter().try_for_each(|s| self.mark(s))
	}

	/// Flags set in `self` but not in `other` ("removed").
	///
	/// # Errors
	///
	/// Fails if the lengths differ.
	pub fn material_nonimplication(&self, other: &NaiveRanges) -> Result<NaiveRanges, RangesError> {
		self.combine(other, |a, b| a && !b)
	}

	/// Flags set in `other` but not in `self` ("added").
	///
	/// # Errors
	///
	/// Fails if the lengths differ.
	pub fn converse_nonimplication(&self, other: &NaiveRanges) -> Result<NaiveRanges, RangesError> {
		self.combine(other, |a, b| !a && b)
	}

	/// Flags where both arrays agree, set or unset ("unchanged").
	///
	/// # Errors
	///
	/// Fails if the lengths differ.
	pub fn equivalence(&self, other: &NaiveRanges) -> Result<NaiveRanges, RangesError> {
		self.combine(other, |a, b| a == b)
	}

	fn combine(&self, other: &NaiveRanges, op: impl Fn(bool, bool) -> bool) -> Result<NaiveRanges, RangesError> {
		if self.len() != other.len() {
			return Err(RangesError::SizeMismatch {
				left: self.len(),
				right: other.len(),
			});
		}
		let flags = self.flags.iter().zip(other.flags.iter()).map(|(&a, &b)| op(a, b)).collect();
		Ok(NaiveRanges { flags })
	}

	/// Run-length encodes the runs whose flag equals `value`.
	///
	/// Segments come out ordered left to right, non-overlapping and maximal.
	/// Cancellation is polled between runs.
	///
	/// # Errors
	///
	/// Returns [`Cancelled`] if `cancel` fires mid-scan.
	pub fn extract_segments(&self, value: bool, cancel: &(impl Cancellable + ?Sized)) -> Result<Vec<Segment>, Cancelled> {
		let mut segments = Vec::new();
		let mut pos = 0;
		let flags = &self.flags;
		while pos < flags.len() {
			if cancel.is_cancellation_requested() {
				return Err(Cancelled);
			}
			let Some(offset) = flags[pos..].iter().position(|&f| f == value) else {
				break;
			};
			let start = pos + offset;
			let run = flags[start..].iter().take_while(|&&f| f == value).count();
			segments.push(Segment::new(start, run));
			pos = start + run;
		}
		Ok(segments)
	}
}

/// Minimal change between two highlighted region sets.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegionDiff {
	/// Segments highlighted before and not any more.
	pub removed: Vec<Segment>,
	/// Segments newly highlighted.
	pub added: Vec<Segment>,
}

impl RegionDiff {
	/// Computes which characters lost or gained the flag going from `old` to `new`.
	///
	/// # Errors
	///
	/// Fails on a length mismatch or on cancellation.
	pub fn between(old: &NaiveRanges, new: &NaiveRanges, cancel: &(impl Cancellable + ?Sized)) -> Result<Self, RangesError> {
		let removed = old.material_nonimplication(new)?.extract_segments(true, cancel)?;
		let added = old.converse_nonimplication(new)?.extract_segments(true, cancel)?;
		Ok(Self { removed, added })
	}

	/// Returns true if nothing changed.
	pub fn is_empty(&self) -> bool {
		self.removed.is_empty() && self.added.is_empty()
	}
}
