//! Optional observability helpers for session and sync flows.
//!
//! # Feature Flags
//!
//! - Enable `tracing` to emit spans named `playlist_sorter.flow` carrying `flow` and `stage`
//!   fields, plus debug/warn events at each transition.
//! - Enable `metrics` to increment the `playlist_sorter_flow_total` counter for every
//!   attempt/success/failure/cancellation, labeled by `flow` + `outcome`.

mod metrics;
mod tracing;

pub use metrics::*;
pub use tracing::*;

// self
use crate::_prelude::*;

/// Flows observed by the crate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FlowKind {
	/// Authorize redirect and callback exchange.
	Authorization,
	/// Restoring a persisted credential at mount.
	Restore,
	/// Refreshing the credential, inline or scheduled.
	Refresh,
	/// Loading the user's owned playlists.
	Load,
	/// Reordering and writing back selected playlists.
	Sync,
}
impl FlowKind {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			FlowKind::Authorization => "authorization",
			FlowKind::Restore => "restore",
			FlowKind::Refresh => "refresh",
			FlowKind::Load => "load",
			FlowKind::Sync => "sync",
		}
	}
}
impl Display for FlowKind {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Outcome labels recorded for each attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FlowOutcome {
	/// Flow started.
	Attempt,
	/// Flow completed.
	Success,
	/// Flow failed and the failure was surfaced.
	Failure,
	/// Owning scope was torn down first; no state was touched.
	Cancelled,
}
impl FlowOutcome {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			FlowOutcome::Attempt => "attempt",
			FlowOutcome::Success => "success",
			FlowOutcome::Failure => "failure",
			FlowOutcome::Cancelled => "cancelled",
		}
	}

	/// Classifies a finished result.
	pub fn of<T>(result: &Result<T>) -> Self {
		match result {
			Ok(_) => Self::Success,
			Err(e) if e.is_cancelled() => Self::Cancelled,
			Err(_) => Self::Failure,
		}
	}
}
impl Display for FlowOutcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn outcome_classifies_cancellation_separately() {
		assert_eq!(FlowOutcome::of(&Ok::<_, Error>(())), FlowOutcome::Success);
		assert_eq!(FlowOutcome::of::<()>(&Err(Error::Cancelled)), FlowOutcome::Cancelled);
		assert_eq!(FlowOutcome::of::<()>(&Err(Error::StateMismatch)), FlowOutcome::Failure);
	}
}
