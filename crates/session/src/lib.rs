//! Live matching sessions: debounced rescans, caret and external
//! underlines, and minimal region updates for a rendering sink.

mod config;
mod rope;
mod session;
mod sink;
mod status;

pub use config::{Config, ConfigError, DebounceConfig};
pub use rope::RopeTextSource;
pub use session::{MatchSession, SessionError};
pub use sink::{RegionKind, RegionSink};
pub use status::ScanStatus;
