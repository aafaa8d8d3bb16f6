use std::sync::Arc;

use livematch_primitives::{ByteIdx, Segment};

use crate::matches::{Capture, Group, Match, MatchSet};
use crate::{ModelError, SharedText};

/// Incrementally assembles a [`MatchSet`] from engine output.
///
/// Every span is validated against the text as it is added, so a finished
/// set never holds offsets outside its snapshot.
#[derive(Debug)]
pub struct MatchSetBuilder {
	text: SharedText,
	matches: Vec<Match>,
}

impl MatchSetBuilder {
	pub fn new(text: SharedText) -> Self {
		Self { text, matches: Vec::new() }
	}

	pub fn text(&self) -> &SharedText {
		&self.text
	}

	/// Number of matches committed so far.
	pub fn len(&self) -> usize {
		self.matches.len()
	}

	pub fn is_empty(&self) -> bool {
		self.matches.is_empty()
	}

	/// Opens a match spanning `segment` (character offsets).
	///
	/// # Errors
	///
	/// Fails if the segment exceeds the text.
	pub fn open(&mut self, segment: Segment) -> Result<MatchBuilder<'_>, ModelError> {
		let segment = self.text.validate(segment)?;
		Ok(MatchBuilder {
			span: Capture::new(segment, self.text.clone()),
			groups: Vec::new(),
			set: self,
		})
	}

	/// Opens a match spanning the UTF-8 byte range `[start, end)`.
	///
	/// # Errors
	///
	/// Fails if the byte span does not map onto the text.
	pub fn open_bytes(&mut self, start: ByteIdx, end: ByteIdx) -> Result<MatchBuilder<'_>, ModelError> {
		let segment = self.text.segment_from_bytes(start, end)?;
		self.open(segment)
	}

	pub fn finish(self) -> MatchSet {
		MatchSet {
			text: self.text,
			matches: self.matches,
		}
	}
}

/// Builder for one open match. Call [`Self::commit`] to add it to the set.
#[must_use = "a match is only recorded once committed"]
#[derive(Debug)]
pub struct MatchBuilder<'a> {
	set: &'a mut MatchSetBuilder,
	span: Capture,
	groups: Vec<Group>,
}

impl MatchBuilder<'_> {
	/// Appends a participating group spanning `segment`.
	///
	/// # Errors
	///
	/// Fails if the segment exceeds the text.
	pub fn group(&mut self, name: impl Into<Arc<str>>, segment: Segment) -> Result<GroupBuilder<'_>, ModelError> {
		let segment = self.set.text.validate(segment)?;
		Ok(self.push_group(name.into(), segment))
	}

	/// Appends a participating group spanning the byte range `[start, end)`.
	///
	/// # Errors
	///
	/// Fails if the byte span does not map onto the text.
	pub fn group_bytes(&mut self, name: impl Into<Arc<str>>, start: ByteIdx, end: ByteIdx) -> Result<GroupBuilder<'_>, ModelError> {
		let segment = self.set.text.segment_from_bytes(start, end)?;
		Ok(self.push_group(name.into(), segment))
	}

	/// Appends a group that did not participate in the match.
	pub fn failed_group(&mut self, name: impl Into<Arc<str>>) {
		let text = self.set.text.clone();
		self.groups.push(Group {
			span: Capture::new(Segment::default(), text),
			success: false,
			name: name.into(),
			captures: Vec::new(),
		});
	}

	fn push_group(&mut self, name: Arc<str>, segment: Segment) -> GroupBuilder<'_> {
		let text = self.set.text.clone();
		let slot = self.groups.len();
		self.groups.push(Group {
			span: Capture::new(segment, text.clone()),
			success: true,
			name,
			captures: Vec::new(),
		});
		GroupBuilder {
			group: &mut self.groups[slot],
			text,
		}
	}

	/// Records the match in the set.
	pub fn commit(self) {
		let MatchBuilder { set, span, groups } = self;
		set.matches.push(Match { span, groups });
	}
}

/// Appends individual captures to a just-added group.
#[derive(Debug)]
pub struct GroupBuilder<'m> {
	group: &'m mut Group,
	text: SharedText,
}

impl GroupBuilder<'_> {
	/// Adds a capture spanning `segment`.
	///
	/// # Errors
	///
	/// Fails if the segment exceeds the text.
	pub fn capture(&mut self, segment: Segment) -> Result<&mut Self, ModelError> {
		let segment = self.text.validate(segment)?;
		self.group.captures.push(Capture::new(segment, self.text.clone()));
		Ok(self)
	}

	/// Adds a capture spanning the byte range `[start, end)`.
	///
	/// # Errors
	///
	/// Fails if the byte span does not map onto the text.
	pub fn capture_bytes(&mut self, start: ByteIdx, end: ByteIdx) -> Result<&mut Self, ModelError> {
		let segment = self.text.segment_from_bytes(start, end)?;
		self.capture(segment)
	}
}

#[cfg(test)]
mod tests;
