use pretty_assertions::assert_eq;

use super::*;

#[test]
fn builds_single_match_with_whole_group() {
	let text = SharedText::from("baaab");
	let mut builder = MatchSetBuilder::new(text);
	let mut m = builder.open(Segment::new(1, 3)).unwrap();
	m.group("0", Segment::new(1, 3)).unwrap();
	m.commit();

	let set = builder.finish();
	assert_eq!(set.count(), 1);
	let first = set.get(0).unwrap();
	assert_eq!((first.index(), first.length(), first.value()), (1, 3, "aaa"));
	assert_eq!(first.groups().len(), 1);
	assert!(first.groups()[0].success());
	assert_eq!(first.groups()[0].name(), "0");
}

#[test]
fn failed_group_keeps_its_slot() {
	let mut builder = MatchSetBuilder::new(SharedText::from("ac"));
	let mut m = builder.open(Segment::new(0, 2)).unwrap();
	m.group("0", Segment::new(0, 2)).unwrap();
	m.failed_group("1");
	m.group("tail", Segment::new(1, 1)).unwrap();
	m.commit();

	let set = builder.finish();
	let groups = set.get(0).unwrap().groups();
	let names: Vec<_> = groups.iter().map(|g| (g.name(), g.success(), g.value())).collect();
	assert_eq!(names, vec![("0", true, "ac"), ("1", false, ""), ("tail", true, "c")]);
	assert_eq!(groups[1].segment(), Segment::new(0, 0));
	assert_eq!(set.get(0).unwrap().group("tail").map(Group::value), Some("c"));
}

#[test]
fn repeated_captures_are_kept_in_order() {
	let mut builder = MatchSetBuilder::new(SharedText::from("abab"));
	let mut m = builder.open(Segment::new(0, 4)).unwrap();
	m.group("0", Segment::new(0, 4)).unwrap();
	m.group("1", Segment::new(2, 2))
		.unwrap()
		.capture(Segment::new(0, 2))
		.unwrap()
		.capture(Segment::new(2, 2))
		.unwrap();
	m.commit();

	let set = builder.finish();
	let caps: Vec<_> = set.get(0).unwrap().groups()[1].captures().iter().map(Capture::index).collect();
	assert_eq!(caps, vec![0, 2]);
}

#[test]
fn byte_offsets_are_converted() {
	let mut builder = MatchSetBuilder::new(SharedText::from("a€b"));
	let mut m = builder.open_bytes(1, 4).unwrap();
	m.group_bytes("0", 1, 4).unwrap();
	m.commit();

	let set = builder.finish();
	let only = set.get(0).unwrap();
	assert_eq!(only.segment(), Segment::new(1, 1));
	assert_eq!(only.value(), "€");
}

#[test]
fn spans_past_the_end_are_rejected() {
	let mut builder = MatchSetBuilder::new(SharedText::from("abc"));
	let err = builder.open(Segment::new(2, 2)).err();
	assert_eq!(
		err,
		Some(ModelError::OutOfBounds {
			segment: Segment::new(2, 2),
			len: 3
		})
	);
	assert!(builder.open_bytes(0, 9).is_err());
	assert!(builder.is_empty());
}

#[test]
fn uncommitted_match_is_dropped() {
	let mut builder = MatchSetBuilder::new(SharedText::from("abc"));
	let _ = builder.open(Segment::new(0, 1)).unwrap();
	assert_eq!(builder.len(), 0);
	assert!(builder.finish().is_empty());
}
