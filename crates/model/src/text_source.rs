use livematch_primitives::CharIdx;

use crate::SharedText;

/// Line/column position in the host document, both zero based and in characters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TextPosition {
	pub line: usize,
	pub column: usize,
}

impl TextPosition {
	pub const fn new(line: usize, column: usize) -> Self {
		Self { line, column }
	}
}

/// Read-only accessor to the host's text model.
///
/// The matching core only ever sees the text as a flat string plus
/// character-offset ↔ position lookups; it never walks document structure.
pub trait TextSource: Send + Sync {
	/// Current text as an immutable snapshot.
	fn snapshot(&self) -> SharedText;

	/// Position of the character at `index`, or `None` past the end.
	fn position_of(&self, index: CharIdx) -> Option<TextPosition>;

	/// Character index at `position`, or `None` if it does not exist.
	fn char_at(&self, position: TextPosition) -> Option<CharIdx>;
}

/// A plain snapshot is its own text source; lookups scan the text.
impl TextSource for SharedText {
	fn snapshot(&self) -> SharedText {
		self.clone()
	}

	fn position_of(&self, index: CharIdx) -> Option<TextPosition> {
		if index > self.char_len() {
			return None;
		}
		let mut pos = TextPosition::default();
		for ch in self.as_str().chars().take(index) {
			if ch == '\n' {
				pos.line += 1;
				pos.column = 0;
			} else {
				pos.column += 1;
			}
		}
		Some(pos)
	}

	fn char_at(&self, position: TextPosition) -> Option<CharIdx> {
		let mut line_start = 0;
		let mut lines = self.as_str().split('\n');
		for _ in 0..position.line {
			line_start += lines.next()?.chars().count() + 1;
		}
		let line_len = lines.next()?.chars().count();
		(position.column <= line_len).then_some(line_start + position.column)
	}
}
