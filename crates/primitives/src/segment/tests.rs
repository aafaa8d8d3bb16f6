use super::*;

#[test]
fn bounds_and_len() {
	let seg = Segment::from_bounds(2, 7);
	assert_eq!(seg, Segment::new(2, 5));
	assert_eq!(seg.end(), 7);
	assert!(!seg.is_empty());
}

#[test]
fn empty_segment_contains_nothing() {
	let seg = Segment::empty_at(3);
	assert!(seg.is_empty());
	assert!(!seg.contains(3));
	assert!(seg.touches(3));
}

#[test]
fn intersection_excludes_touching() {
	let a = Segment::new(0, 3);
	assert!(a.intersects(&Segment::new(2, 4)));
	assert!(!a.intersects(&Segment::new(3, 4)));
	assert!(!a.intersects(&Segment::empty_at(1)));
}

#[test]
fn clipping_to_shorter_text() {
	assert_eq!(Segment::new(2, 10).clipped(5), Segment::new(2, 3));
	assert_eq!(Segment::new(8, 2).clipped(5), Segment::empty_at(5));
	assert_eq!(Segment::new(1, 2).clipped(5), Segment::new(1, 2));
}

#[test]
fn ordering_is_by_index_then_length() {
	let mut segs = vec![Segment::new(4, 1), Segment::new(0, 2), Segment::new(0, 1)];
	segs.sort();
	assert_eq!(segs, vec![Segment::new(0, 1), Segment::new(0, 2), Segment::new(4, 1)]);
}

#[test]
fn display_is_half_open() {
	assert_eq!(Segment::new(1, 3).to_string(), "[1..4)");
}
