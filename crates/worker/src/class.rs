/// Execution classes used to tag spawned work in traces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskClass {
	/// Work marshalled onto the host's presentation thread.
	Interactive,
	/// Short async work on the shared runtime, e.g. restart tasks.
	Background,
	/// A long-lived worker owning its own OS thread, e.g. a resumable loop.
	Dedicated,
}

impl TaskClass {
	pub(crate) const fn as_str(self) -> &'static str {
		match self {
			Self::Interactive => "interactive",
			Self::Background => "background",
			Self::Dedicated => "dedicated",
		}
	}
}
