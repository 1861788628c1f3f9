// self
use crate::{obs::FlowOutcome, provider::Operation};

/// Records an operation outcome via the global metrics recorder (when enabled).
pub fn record_flow_outcome(operation: Operation, outcome: FlowOutcome) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!(
			"oauth2_bridge_flow_total",
			"flow" => operation.as_str(),
			"outcome" => outcome.as_str()
		)
		.increment(1);
	}

	#[cfg(not(feature = "metrics"))]
	{
		let _ = (operation, outcome);
	}
}
