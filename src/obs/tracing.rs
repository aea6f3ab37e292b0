// self
use crate::{_prelude::*, obs::Operation};

/// Type alias that resolves to an instrumented future when tracing is enabled.
#[cfg(feature = "tracing")]
pub type InstrumentedRequest<F> = tracing::instrument::Instrumented<F>;
/// Passthrough future type when tracing is disabled.
#[cfg(not(feature = "tracing"))]
pub type InstrumentedRequest<F> = F;

/// A span builder used by client operations.
#[derive(Clone, Debug)]
pub struct RequestSpan {
	#[cfg(feature = "tracing")]
	span: tracing::Span,
}
impl RequestSpan {
	/// Creates a new span tagged with the provided operation + stage.
	pub fn new(op: Operation, stage: &str) -> Self {
		#[cfg(feature = "tracing")]
		{
			let span = tracing::info_span!("resilient_api.request", op = op.as_str(), stage);

			Self { span }
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = (op, stage);

			Self {}
		}
	}

	/// Instruments an async block without holding a guard across `.await` points.
	pub fn instrument<Fut>(&self, fut: Fut) -> InstrumentedRequest<Fut>
	where
		Fut: Future,
	{
		#[cfg(feature = "tracing")]
		{
			use tracing::Instrument;

			fut.instrument(self.span.clone())
		}
		#[cfg(not(feature = "tracing"))]
		{
			fut
		}
	}
}

/// Logs a storage failure that was swallowed to keep the request flow alive.
pub fn storage_failure(action: &'static str, key: &str, error: &dyn Display) {
	#[cfg(feature = "tracing")]
	tracing::warn!(action, key, %error, "offline storage operation failed");
	#[cfg(not(feature = "tracing"))]
	let _ = (action, key, error);
}

/// Logs a read answered from an offline snapshot.
pub fn offline_fallback(key: &str) {
	#[cfg(feature = "tracing")]
	tracing::info!(key, "backend unreachable; serving offline snapshot");
	#[cfg(not(feature = "tracing"))]
	let _ = key;
}

/// Logs a mutation queued for replay.
pub fn request_queued(key: &str, id: &str) {
	#[cfg(feature = "tracing")]
	tracing::info!(key, id, "backend unreachable; request queued for replay");
	#[cfg(not(feature = "tracing"))]
	let _ = (key, id);
}

/// Logs the queued request that ended a replay pass; it and everything behind it stay queued.
pub fn replay_deferred(id: &str, error: &dyn Display) {
	#[cfg(feature = "tracing")]
	tracing::info!(id, %error, "queued request could not be delivered; pausing replay");
	#[cfg(not(feature = "tracing"))]
	let _ = (id, error);
}

/// Logs a queued request that was abandoned during replay.
pub fn replay_abandoned(id: &str, error: &dyn Display) {
	#[cfg(feature = "tracing")]
	tracing::warn!(id, %error, "queued request rejected during replay; dropping it");
	#[cfg(not(feature = "tracing"))]
	let _ = (id, error);
}

/// Logs the aggregate result of a replay pass.
pub fn sync_finished(succeeded: usize, failed: usize, remaining: usize) {
	#[cfg(feature = "tracing")]
	tracing::info!(succeeded, failed, remaining, "pending queue replay finished");
	#[cfg(not(feature = "tracing"))]
	let _ = (succeeded, failed, remaining);
}

/// Logs a background cache sweep that removed entries.
pub fn cache_swept(removed: usize, remaining: usize) {
	#[cfg(feature = "tracing")]
	tracing::debug!(removed, remaining, "swept expired cache entries");
	#[cfg(not(feature = "tracing"))]
	let _ = (removed, remaining);
}
