//! Uniform match model.
//!
//! Every engine, in-process or not, reports its results as the same
//! [`Match`] → [`Group`] → [`Capture`] tree. Nodes only store offsets plus a
//! handle to the shared [`SharedText`]; values are sliced on demand.

mod builder;
mod error;
mod matches;
mod text;
mod text_source;

pub use builder::{GroupBuilder, MatchBuilder, MatchSetBuilder};
pub use error::ModelError;
pub use livematch_primitives::{CharIdx, CharLen, Segment};
pub use matches::{Capture, Group, Match, MatchSet};
pub use text::SharedText;
pub use text_source::{TextPosition, TextSource};
