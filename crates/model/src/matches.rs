use std::sync::Arc;

use livematch_primitives::{CharIdx, CharLen, Segment};

use crate::SharedText;

/// One span reported by an engine: offsets plus a handle to the text.
#[derive(Clone)]
pub struct Capture {
	pub(crate) segment: Segment,
	pub(crate) text: SharedText,
}

impl Capture {
	pub(crate) fn new(segment: Segment, text: SharedText) -> Self {
		Self { segment, text }
	}

	pub fn index(&self) -> CharIdx {
		self.segment.index
	}

	pub fn length(&self) -> CharLen {
		self.segment.length
	}

	pub fn segment(&self) -> Segment {
		self.segment
	}

	/// The matched text, sliced from the shared snapshot on each call.
	pub fn value(&self) -> &str {
		self.text.slice(self.segment).unwrap_or_default()
	}
}

impl std::fmt::Debug for Capture {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Capture")
			.field("segment", &self.segment)
			.field("value", &self.value())
			.finish()
	}
}

/// A capture group within one match.
///
/// Groups that did not participate still appear, with `success == false` and
/// an empty segment at 0.
#[derive(Clone)]
pub struct Group {
	pub(crate) span: Capture,
	pub(crate) success: bool,
	pub(crate) name: Arc<str>,
	pub(crate) captures: Vec<Capture>,
}

impl Group {
	pub fn index(&self) -> CharIdx {
		self.span.index()
	}

	pub fn length(&self) -> CharLen {
		self.span.length()
	}

	pub fn segment(&self) -> Segment {
		self.span.segment()
	}

	pub fn value(&self) -> &str {
		if self.success { self.span.value() } else { "" }
	}

	/// Whether this group participated in the match.
	pub fn success(&self) -> bool {
		self.success
	}

	/// Group name; the decimal group number when the group is unnamed.
	pub fn name(&self) -> &str {
		&self.name
	}

	/// Individual captures for engines that report repeated groups.
	pub fn captures(&self) -> &[Capture] {
		&self.captures
	}
}

impl std::fmt::Debug for Group {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Group")
			.field("name", &self.name)
			.field("success", &self.success)
			.field("span", &self.span)
			.field("captures", &self.captures)
			.finish()
	}
}

/// One match; `groups()[0]` is conventionally the whole match.
#[derive(Clone)]
pub struct Match {
	pub(crate) span: Capture,
	pub(crate) groups: Vec<Group>,
}

impl Match {
	pub fn index(&self) -> CharIdx {
		self.span.index()
	}

	pub fn length(&self) -> CharLen {
		self.span.length()
	}

	pub fn segment(&self) -> Segment {
		self.span.segment()
	}

	pub fn value(&self) -> &str {
		self.span.value()
	}

	/// Groups in engine-report order.
	pub fn groups(&self) -> &[Group] {
		&self.groups
	}

	/// Looks up a group by name (or decimal number for unnamed groups).
	pub fn group(&self, name: &str) -> Option<&Group> {
		self.groups.iter().find(|g| g.name() == name)
	}
}

impl std::fmt::Debug for Match {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Match").field("span", &self.span).field("groups", &self.groups).finish()
	}
}

/// Result of one matching pass over a text snapshot.
#[derive(Clone, Debug)]
pub struct MatchSet {
	pub(crate) text: SharedText,
	pub(crate) matches: Vec<Match>,
}

impl MatchSet {
	/// A pass that found nothing.
	pub fn empty(text: SharedText) -> Self {
		Self { text, matches: Vec::new() }
	}

	pub fn count(&self) -> usize {
		self.matches.len()
	}

	pub fn is_empty(&self) -> bool {
		self.matches.is_empty()
	}

	/// The snapshot these matches index into.
	pub fn text(&self) -> &SharedText {
		&self.text
	}

	pub fn iter(&self) -> std::slice::Iter<'_, Match> {
		self.matches.iter()
	}

	pub fn get(&self, index: usize) -> Option<&Match> {
		self.matches.get(index)
	}

	/// Whole-match segments, in report order.
	pub fn segments(&self) -> impl Iterator<Item = Segment> + '_ {
		self.matches.iter().map(Match::segment)
	}
}

impl<'a> IntoIterator for &'a MatchSet {
	type Item = &'a Match;
	type IntoIter = std::slice::Iter<'a, Match>;

	fn into_iter(self) -> Self::IntoIter {
		self.iter()
	}
}

impl IntoIterator for MatchSet {
	type Item = Match;
	type IntoIter = std::vec::IntoIter<Match>;

	fn into_iter(self) -> Self::IntoIter {
		self.matches.into_iter()
	}
}

#[cfg(feature = "serde")]
mod serialize {
	use serde::ser::{Serialize, SerializeStruct, Serializer};

	use super::{Capture, Group, Match, MatchSet};

	impl Serialize for Capture {
		fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
			let mut s = serializer.serialize_struct("Capture", 3)?;
			s.serialize_field("index", &self.index())?;
			s.serialize_field("length", &self.length())?;
			s.serialize_field("value", self.value())?;
			s.end()
		}
	}

	impl Serialize for Group {
		fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
			let mut s = serializer.serialize_struct("Group", 6)?;
			s.serialize_field("name", self.name())?;
			s.serialize_field("success", &self.success)?;
			s.serialize_field("index", &self.index())?;
			s.serialize_field("length", &self.length())?;
			s.serialize_field("value", self.value())?;
			s.serialize_field("captures", &self.captures)?;
			s.end()
		}
	}

	impl Serialize for Match {
		fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
			let mut s = serializer.serialize_struct("Match", 4)?;
			s.serialize_field("index", &self.index())?;
			s.serialize_field("length", &self.length())?;
			s.serialize_field("value", self.value())?;
			s.serialize_field("groups", &self.groups)?;
			s.end()
		}
	}

	impl Serialize for MatchSet {
		fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
			let mut s = serializer.serialize_struct("MatchSet", 2)?;
			s.serialize_field("count", &self.count())?;
			s.serialize_field("matches", &self.matches)?;
			s.end()
		}
	}
}
