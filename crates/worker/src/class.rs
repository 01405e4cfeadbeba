/// Where a submitted task ended up executing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Placement {
	/// Admitted to the pool and run on one of its worker threads.
	Pooled,
	/// Rejected by the full backlog and run on the submitting thread.
	Inline,
}

impl Placement {
	pub(crate) const fn as_str(self) -> &'static str {
		match self {
			Self::Pooled => "pooled",
			Self::Inline => "inline",
		}
	}
}
