use livematch_model::{CharIdx, SharedText, TextPosition, TextSource};
use parking_lot::RwLock;
use ropey::Rope;

/// Editable [`TextSource`] backed by a rope.
///
/// Line and column lookups use the rope's line index instead of scanning.
/// Snapshots are cached until the next edit.
#[derive(Debug, Default)]
pub struct RopeTextSource {
	state: RwLock<RopeState>,
}

#[derive(Debug, Default)]
struct RopeState {
	rope: Rope,
	snapshot: Option<SharedText>,
}

impl RopeTextSource {
	pub fn new(text: &str) -> Self {
		Self {
			state: RwLock::new(RopeState {
				rope: Rope::from_str(text),
				snapshot: None,
			}),
		}
	}

	/// Replaces the whole text.
	pub fn set_text(&self, text: &str) {
		let mut state = self.state.write();
		state.rope = Rope::from_str(text);
		state.snapshot = None;
	}

	/// Replaces the characters in `[start, end)` with `replacement`.
	///
	/// Out-of-range bounds are clamped to the text.
	pub fn edit(&self, start: CharIdx, end: CharIdx, replacement: &str) {
		let mut state = self.state.write();
		let len = state.rope.len_chars();
		let end = end.min(len);
		let start = start.min(end);
		state.rope.remove(start..end);
		state.rope.insert(start, replacement);
		state.snapshot = None;
	}

	pub fn len_chars(&self) -> usize {
		self.state.read().rope.len_chars()
	}
}

impl TextSource for RopeTextSource {
	fn snapshot(&self) -> SharedText {
		if let Some(snapshot) = &self.state.read().snapshot {
			return snapshot.clone();
		}
		let mut guard = self.state.write();
		let state = &mut *guard;
		let rope = &state.rope;
		state.snapshot.get_or_insert_with(|| SharedText::from(rope.to_string())).clone()
	}

	fn position_of(&self, index: CharIdx) -> Option<TextPosition> {
		let state = self.state.read();
		let rope = &state.rope;
		if index > rope.len_chars() {
			return None;
		}
		let line = rope.char_to_line(index);
		Some(TextPosition::new(line, index - rope.line_to_char(line)))
	}

	fn char_at(&self, position: TextPosition) -> Option<CharIdx> {
		let state = self.state.read();
		let rope = &state.rope;
		if position.line >= rope.len_lines() {
			return None;
		}
		let line = rope.line(position.line);
		let mut width = line.len_chars();
		if line.chars().last() == Some('\n') {
			width -= 1;
			if line.len_chars() > 1 && line.char(line.len_chars() - 2) == '\r' {
				width -= 1;
			}
		}
		(position.column <= width).then(|| rope.line_to_char(position.line) + position.column)
	}
}
