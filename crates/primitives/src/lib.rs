//! Core types for live matching: cancellation, text segments, offsets and region diffs.

/// Poll-based cancellation tokens.
pub mod cancel;
/// UTF-8 byte and character offset conversion.
pub mod offsets;
/// Boolean range arrays and region diffing.
pub mod ranges;
/// Half-open character ranges.
pub mod segment;

pub use cancel::{Cancellable, CancelSource, CancelToken, Cancelled, NON_CANCELLABLE, NonCancellable};
pub use offsets::{ByteIdx, CharIdx, CharLen, OffsetError, Utf8Offsets};
pub use ranges::{NaiveRanges, RangesError, RegionDiff};
pub use segment::Segment;
