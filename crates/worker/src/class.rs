/// Execution classes used for task scheduling and log fields.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum TaskClass {
	/// Latency-sensitive work, such as delivering results to a caller.
	Interactive,
	/// Fetches and other work that may lag behind interactive work.
	#[default]
	Background,
}

impl TaskClass {
	/// Stable label for log fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::Interactive => "interactive",
			Self::Background => "background",
		}
	}
}
