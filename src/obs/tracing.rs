// self
use crate::{_prelude::*, obs::FlowKind};

/// Type alias that resolves to an instrumented future when tracing is enabled.
#[cfg(feature = "tracing")]
pub type InstrumentedFlow<F> = tracing::instrument::Instrumented<F>;
/// Passthrough future type when tracing is disabled.
#[cfg(not(feature = "tracing"))]
pub type InstrumentedFlow<F> = F;

/// Span wrapping one stage of a session or sync flow.
#[derive(Clone, Debug)]
pub struct FlowSpan {
	#[cfg(feature = "tracing")]
	span: tracing::Span,
}
impl FlowSpan {
	/// Creates a new span tagged with the provided flow kind + stage.
	pub fn new(kind: FlowKind, stage: &'static str) -> Self {
		#[cfg(feature = "tracing")]
		{
			let span = tracing::info_span!("playlist_sorter.flow", flow = kind.as_str(), stage);

			Self { span }
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = (kind, stage);

			Self {}
		}
	}

	/// Instruments an async block without holding a guard across `.await` points.
	pub fn instrument<Fut>(&self, fut: Fut) -> InstrumentedFlow<Fut>
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

/// Emits a debug event marking a transition inside `kind`.
pub fn trace_transition(kind: FlowKind, transition: &'static str) {
	#[cfg(feature = "tracing")]
	tracing::debug!(flow = kind.as_str(), transition, "Flow transition.");
	#[cfg(not(feature = "tracing"))]
	let _ = (kind, transition);
}

/// Emits a warn event for a surfaced failure. Errors never carry token material.
pub fn trace_failure(kind: FlowKind, error: &Error) {
	#[cfg(feature = "tracing")]
	tracing::warn!(flow = kind.as_str(), error = %error, "Flow failed.");
	#[cfg(not(feature = "tracing"))]
	let _ = (kind, error);
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn helpers_run_without_subscriber() {
		trace_transition(FlowKind::Restore, "restored");
		trace_failure(FlowKind::Refresh, &Error::Refresh { reason: "invalid_grant".into() });
	}

	#[tokio::test]
	async fn instrument_wraps_future() {
		let span = FlowSpan::new(FlowKind::Load, "instrument_wraps_future");
		let value = span.instrument(async { 7 }).await;

		assert_eq!(value, 7);
	}
}
