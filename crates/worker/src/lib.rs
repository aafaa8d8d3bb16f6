//! Background execution primitives for live matching.
//!
//! * [`ResumableLoop`]: a debounced worker on its own thread, restarted by
//!   signals and cancelled whenever a newer signal arrives.
//! * [`RestartTask`]: cancel-then-relaunch async work, optionally chained
//!   after another run through [`RunObserver`].
//! * [`presentation`]: marshalling results onto the host's presentation thread.

mod class;
mod panic;
pub mod presentation;
mod restart;
mod resumable;
mod run;
mod spawn;

pub use class::TaskClass;
pub use presentation::{InlineExecutor, PresentationExecutor, PresentationJob, PresentationQueue, QueueExecutor, SendError, presentation_queue, send};
pub use restart::RestartTask;
pub use resumable::{DebounceTimeouts, LoopError, LoopObserver, LoopState, ResumableLoop};
pub use run::{RunObserver, RunView, is_cancellation};
pub use spawn::{spawn, spawn_named_thread};
