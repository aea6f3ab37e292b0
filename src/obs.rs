//! Optional observability helpers for client operations.
//!
//! # Feature Flags
//!
//! - Enable `tracing` (default) to emit structured spans named `resilient_api.request` with the
//!   `op` and `stage` fields, plus warnings for swallowed storage failures.
//! - Enable `metrics` to increment the `resilient_api_request_total` counter for every
//!   attempt/outcome, labeled by `op` + `outcome`.

mod metrics;
mod tracing;

pub use metrics::*;
pub use tracing::*;

// self
use crate::_prelude::*;

/// Operations observed by the client.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Operation {
	/// A verb call going through the request executor.
	Execute,
	/// Credential renewal.
	Refresh,
	/// Pending-queue replay.
	Sync,
}
impl Operation {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			Operation::Execute => "execute",
			Operation::Refresh => "refresh",
			Operation::Sync => "sync",
		}
	}
}
impl Display for Operation {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Outcome labels recorded for each operation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Outcome {
	/// Entry to an operation.
	Attempt,
	/// Completed against the backend.
	Success,
	/// Answered from the response cache.
	CacheHit,
	/// Answered from an offline snapshot.
	Offline,
	/// Mutation queued for later replay.
	Pending,
	/// Failure propagated back to the caller.
	Failure,
}
impl Outcome {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			Outcome::Attempt => "attempt",
			Outcome::Success => "success",
			Outcome::CacheHit => "cache_hit",
			Outcome::Offline => "offline",
			Outcome::Pending => "pending",
			Outcome::Failure => "failure",
		}
	}
}
impl Display for Outcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
