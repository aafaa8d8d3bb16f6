use std::sync::{Arc, OnceLock};

use livematch_primitives::{ByteIdx, CharLen, Segment, Utf8Offsets};

use crate::ModelError;

struct TextInner {
	text: Box<str>,
	offsets: OnceLock<Utf8Offsets>,
}

/// Immutable, reference-counted snapshot of the text being matched.
///
/// The snapshot exclusively owns the string; every match node holds a cheap
/// handle to it and slices lazily. The byte/character offset table is built
/// on first use and shared by all holders.
#[derive(Clone)]
pub struct SharedText {
	inner: Arc<TextInner>,
}

impl SharedText {
	pub fn new(text: impl Into<Box<str>>) -> Self {
		Self {
			inner: Arc::new(TextInner {
				text: text.into(),
				offsets: OnceLock::new(),
			}),
		}
	}

	pub fn as_str(&self) -> &str {
		&self.inner.text
	}

	/// Length in characters.
	pub fn char_len(&self) -> CharLen {
		self.offsets().char_len()
	}

	/// Length of the UTF-8 encoding.
	pub fn byte_len(&self) -> usize {
		self.inner.text.len()
	}

	/// Byte/character offset table for this snapshot.
	pub fn offsets(&self) -> &Utf8Offsets {
		self.inner.offsets.get_or_init(|| Utf8Offsets::new(&self.inner.text))
	}

	/// Returns the text covered by `segment` (character offsets).
	pub fn slice(&self, segment: Segment) -> Option<&str> {
		let offsets = self.offsets();
		let start = offsets.char_to_byte(segment.index).ok()?;
		let end = offsets.char_to_byte(segment.end()).ok()?;
		self.inner.text.get(start..end)
	}

	/// Checks that `segment` lies within the text.
	///
	/// # Errors
	///
	/// Returns [`ModelError::OutOfBounds`] otherwise.
	pub fn validate(&self, segment: Segment) -> Result<Segment, ModelError> {
		let len = self.char_len();
		if segment.end() > len {
			return Err(ModelError::OutOfBounds { segment, len });
		}
		Ok(segment)
	}

	/// Converts a UTF-8 byte span `[start, end)` into a character segment.
	///
	/// # Errors
	///
	/// Fails if either bound is out of range, splits a character, or if
	/// `end < start`.
	pub fn segment_from_bytes(&self, start: ByteIdx, end: ByteIdx) -> Result<Segment, ModelError> {
		if end < start {
			return Err(ModelError::InvertedSpan { start, end });
		}
		let offsets = self.offsets();
		let from = offsets.byte_to_char(start)?;
		let to = offsets.byte_to_char(end)?;
		Ok(Segment::from_bounds(from, to))
	}

	/// Returns true if both handles refer to the same snapshot.
	pub fn ptr_eq(&self, other: &SharedText) -> bool {
		Arc::ptr_eq(&self.inner, &other.inner)
	}
}

impl std::fmt::Debug for SharedText {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("SharedText").field("bytes", &self.byte_len()).finish_non_exhaustive()
	}
}

impl From<String> for SharedText {
	fn from(text: String) -> Self {
		Self::new(text)
	}
}

impl From<&str> for SharedText {
	fn from(text: &str) -> Self {
		Self::new(text)
	}
}
