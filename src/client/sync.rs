//! Pending-queue replay once connectivity returns.
//!
//! Entries replay one at a time in enqueue order through the regular executor path, refresh
//! and retry included. An entry that cannot be delivered right now (backend unreachable, local
//! credential store unavailable) ends the pass and stays queued together with everything behind
//! it, so a later pass still replays in the user's order. Any other failure is terminal and the
//! entry is dropped.

// self
use crate::{
	_prelude::*,
	client::{ApiClient, execute::Mode},
	error::AuthError,
	http::ApiHttpClient,
	obs::{self, Operation, Outcome, RequestSpan},
	request::{Method, RequestOptions},
};

/// Aggregate result of one replay pass.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SyncReport {
	/// Entries replayed successfully and removed.
	pub succeeded: usize,
	/// Entries rejected during replay and removed.
	pub failed: usize,
	/// One record per rejected entry.
	pub errors: Vec<SyncFailure>,
}
impl SyncReport {
	/// Returns `true` when nothing was replayed or abandoned.
	pub fn is_empty(&self) -> bool {
		self.succeeded == 0 && self.failed == 0
	}

	/// Single user-facing summary line, or `None` when there is nothing to report.
	pub fn summary(&self) -> Option<String> {
		match (self.succeeded, self.failed) {
			(0, 0) => None,
			(synced, 0) => Some(format!("{synced} offline action(s) synced.")),
			(0, abandoned) => Some(format!("{abandoned} offline action(s) could not be sent.")),
			(synced, abandoned) => Some(format!(
				"{synced} offline action(s) synced, {abandoned} could not be sent."
			)),
		}
	}
}

/// A queued entry that was rejected during replay.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SyncFailure {
	/// Identifier of the dropped entry.
	pub request_id: String,
	/// Verb of the dropped entry.
	pub method: Method,
	/// Path of the dropped entry.
	pub path: String,
	/// Reason reported by the executor.
	pub message: String,
	/// Set when the entry was dropped because the session is no longer valid.
	pub auth: Option<AuthError>,
}

impl<C> ApiClient<C>
where
	C: ?Sized + ApiHttpClient,
{
	/// Replays every queued mutation in FIFO order.
	///
	/// Safe to call repeatedly; concurrent calls are serialized so no entry is replayed twice,
	/// and an empty queue issues no network calls.
	pub async fn sync(&self) -> SyncReport {
		const OP: Operation = Operation::Sync;

		let span = RequestSpan::new(OP, "sync_pending_queue");

		obs::record_outcome(OP, Outcome::Attempt);

		let report = span
			.instrument(async {
				let _replaying = self.sync_guard.lock().await;
				let queued = self.mirror.list_queued().await;
				let mut report = SyncReport::default();
				let mut remaining = 0;

				for (position, request) in queued.iter().enumerate() {
					let options = RequestOptions { use_cache: false, ..request.options.clone() };
					let result = self
						.run(request.method, &request.path, request.body.clone(), options, Mode::Replay)
						.await;

					match result {
						Ok(_) => {
							self.mirror.remove(&request.id).await;

							report.succeeded += 1;
						},
						Err(e) if keeps_queued(&e) => {
							obs::replay_deferred(&request.id, &e);

							remaining = queued.len() - position;

							break;
						},
						Err(e) => {
							obs::replay_abandoned(&request.id, &e);
							self.mirror.remove(&request.id).await;

							report.failed += 1;
							report.errors.push(SyncFailure {
								request_id: request.id.clone(),
								method: request.method,
								path: request.path.clone(),
								message: e.user_message(),
								auth: match e {
									Error::Auth(auth) => Some(auth),
									_ => None,
								},
							});
						},
					}
				}

				obs::sync_finished(report.succeeded, report.failed, remaining);

				report
			})
			.await;

		obs::record_outcome(
			OP,
			if report.failed == 0 { Outcome::Success } else { Outcome::Failure },
		);

		report
	}
}

/// Failures that say nothing about the request itself; retrying later may succeed.
fn keeps_queued(e: &Error) -> bool {
	e.is_network() || matches!(e, Error::Storage(_))
}
