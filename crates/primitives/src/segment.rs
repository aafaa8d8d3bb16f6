use crate::offsets::{CharIdx, CharLen};

/// A half-open range `[index, index + length)` over a character sequence.
///
/// A zero `length` denotes an empty (zero-width) match.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Segment {
	/// First character covered by the segment.
	pub index: CharIdx,
	/// Number of characters covered.
	pub length: CharLen,
}

impl Segment {
	/// Creates a segment starting at `index` spanning `length` characters.
	pub const fn new(index: CharIdx, length: CharLen) -> Self {
		Self { index, length }
	}

	/// Creates a segment from a start and an exclusive end.
	///
	/// # Panics
	///
	/// Panics if `end < start`.
	pub fn from_bounds(start: CharIdx, end: CharIdx) -> Self {
		assert!(end >= start, "segment end {end} precedes start {start}");
		Self::new(start, end - start)
	}

	/// Zero-width segment at `index`.
	pub const fn empty_at(index: CharIdx) -> Self {
		Self::new(index, 0)
	}

	/// Exclusive end of the segment.
	#[inline]
	pub const fn end(&self) -> CharIdx {
		self.index + self.length
	}

	#[inline]
	pub const fn is_empty(&self) -> bool {
		self.length == 0
	}

	/// Returns true if `pos` lies inside the segment.
	///
	/// An empty segment contains nothing.
	#[inline]
	pub const fn contains(&self, pos: CharIdx) -> bool {
		pos >= self.index && pos < self.end()
	}

	/// Returns true if the segment covers or touches `pos`.
	///
	/// Unlike [`Self::contains`], both bounds are inclusive, so a caret sitting
	/// right after a match, or on an empty match, still counts.
	#[inline]
	pub const fn touches(&self, pos: CharIdx) -> bool {
		pos >= self.index && pos <= self.end()
	}

	/// Returns true if the two segments share at least one character.
	pub const fn intersects(&self, other: &Segment) -> bool {
		self.index < other.end() && other.index < self.end()
	}

	/// Returns this segment cut to fit inside `[0, len)`.
	#[must_use]
	pub fn clipped(&self, len: CharLen) -> Segment {
		let start = self.index.min(len);
		let end = self.end().min(len);
		Segment::from_bounds(start, end)
	}
}

impl std::fmt::Display for Segment {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "[{}..{})", self.index, self.end())
	}
}

#[cfg(test)]
mod tests;
