//! Uniform matching over heterogeneous regex engines.
//!
//! An [`Engine`] compiles a pattern into a [`Matcher`]; every matcher produces
//! the same character-indexed [`livematch_model::MatchSet`], whether the work
//! happened in-process ([`RegexEngine`]) or in a child process speaking one of
//! the [`WireProtocol`]s ([`ProcessEngine`]).

mod config;
mod error;
mod inproc;
mod matcher;
mod options;
mod process;
pub mod protocol;
mod registry;

pub use config::EngineConfig;
pub use error::EngineError;
pub use inproc::{RegexEngine, RegexFlavor};
pub use matcher::{Engine, EngineKind, Matcher};
pub use options::MatchOptions;
pub use process::{ProcessEngine, ProcessMatcher};
pub use protocol::WireProtocol;
pub use registry::EngineRegistry;
