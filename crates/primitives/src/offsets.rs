/// A position in the text, measured in characters (not bytes).
///
/// Every consumer of match results indexes by character.
pub type CharIdx = usize;

/// A length or count in the text, measured in characters (not bytes).
pub type CharLen = usize;

/// A position in the UTF-8 encoding of the text.
///
/// Engines operating on UTF-8 report these; they must be converted before use.
pub type ByteIdx = usize;

/// Errors converting between byte and character offsets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum OffsetError {
	#[error("byte offset {byte} is past the end of the text ({len} bytes)")]
	ByteOutOfRange { byte: ByteIdx, len: usize },
	#[error("byte offset {byte} falls inside a multi-byte character")]
	NotCharBoundary { byte: ByteIdx },
	#[error("character offset {index} is past the end of the text ({len} characters)")]
	CharOutOfRange { index: CharIdx, len: usize },
}

/// Exact byte/character offset map for one text snapshot.
///
/// Built once per text, then answers each conversion with a binary search
/// over character start positions. ASCII text skips the table entirely since
/// both offsets coincide.
#[derive(Debug, Clone)]
pub struct Utf8Offsets {
	byte_len: usize,
	char_len: usize,
	/// Byte offset of every character start; `None` for ASCII text.
	starts: Option<Box<[ByteIdx]>>,
}

impl Utf8Offsets {
	/// Builds the offset map for `text`.
	pub fn new(text: &str) -> Self {
		if text.is_ascii() {
			return Self {
				byte_len: text.len(),
				char_len: text.len(),
				starts: None,
			};
		}
		let starts: Box<[ByteIdx]> = text.char_indices().map(|(b, _)| b).collect();
		Self {
			byte_len: text.len(),
			char_len: starts.len(),
			starts: Some(starts),
		}
	}

	pub fn byte_len(&self) -> usize {
		self.byte_len
	}

	pub fn char_len(&self) -> usize {
		self.char_len
	}

	/// Returns true if byte and character offsets coincide.
	pub fn is_identity(&self) -> bool {
		self.starts.is_none()
	}

	/// Converts a byte offset into the character offset at the same position.
	///
	/// The end of the text (`byte == byte_len`) is a valid position.
	///
	/// # Errors
	///
	/// Fails if `byte` is past the end or does not start a character.
	pub fn byte_to_char(&self, byte: ByteIdx) -> Result<CharIdx, OffsetError> {
		if byte > self.byte_len {
			return Err(OffsetError::ByteOutOfRange { byte, len: self.byte_len });
		}
		let Some(starts) = &self.starts else {
			return Ok(byte);
		};
		if byte == self.byte_len {
			return Ok(self.char_len);
		}
		starts.binary_search(&byte).map_err(|_| OffsetError::NotCharBoundary { byte })
	}

	/// Converts a character offset into the byte offset of that character.
	///
	/// # Errors
	///
	/// Fails if `index` is past the end of the text.
	pub fn char_to_byte(&self, index: CharIdx) -> Result<ByteIdx, OffsetError> {
		if index > self.char_len {
			return Err(OffsetError::CharOutOfRange { index, len: self.char_len });
		}
		match &self.starts {
			None => Ok(index),
			Some(_) if index == self.char_len => Ok(self.byte_len),
			Some(starts) => Ok(starts[index]),
		}
	}
}

/// One-off conversion of a byte offset in `text` to a character offset.
///
/// Prefer [`Utf8Offsets`] when converting more than a handful of offsets.
///
/// # Errors
///
/// Fails if `byte` is past the end or does not start a character.
pub fn byte_to_char(text: &str, byte: ByteIdx) -> Result<CharIdx, OffsetError> {
	match text.get(..byte) {
		Some(prefix) => Ok(prefix.chars().count()),
		None if byte > text.len() => Err(OffsetError::ByteOutOfRange { byte, len: text.len() }),
		None => Err(OffsetError::NotCharBoundary { byte }),
	}
}
