// self
use crate::{_prelude::*, obs::Stage};

/// Type alias that resolves to an instrumented future when tracing is enabled.
#[cfg(feature = "tracing")]
pub type InstrumentedCall<F> = tracing::instrument::Instrumented<F>;
/// Passthrough future type when tracing is disabled.
#[cfg(not(feature = "tracing"))]
pub type InstrumentedCall<F> = F;

/// A span builder used by client calls.
#[derive(Clone, Debug)]
pub struct CallSpan {
	#[cfg(feature = "tracing")]
	span: tracing::Span,
}
impl CallSpan {
	/// Creates a new span tagged with the provided stage + label.
	pub fn new(stage: Stage, label: &str) -> Self {
		#[cfg(feature = "tracing")]
		{
			let span = tracing::info_span!("dizzydata.call", stage = stage.as_str(), label);

			Self { span }
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = (stage, label);

			Self {}
		}
	}

	/// Instruments an async block without holding a guard across `.await` points.
	pub fn instrument<Fut>(&self, fut: Fut) -> InstrumentedCall<Fut>
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

/// Emits a debug event when the API rejected a cached token and the call is re-authenticating.
pub fn trace_reauthentication(label: &str, status: u16) {
	#[cfg(feature = "tracing")]
	{
		tracing::debug!(label, status, "cached token rejected, re-authenticating once");
	}
	#[cfg(not(feature = "tracing"))]
	{
		let _ = (label, status);
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn call_span_noop_without_tracing() {
		let span = CallSpan::new(Stage::CredentialExchange, "test");

		trace_reauthentication("test", 401);

		let _ = span;
	}

	#[tokio::test]
	async fn instrument_wraps_future() {
		let span = CallSpan::new(Stage::ApiRequest, "instrument_wraps_future");
		let value = span.instrument(async { 42 }).await;

		assert_eq!(value, 42);
	}
}
