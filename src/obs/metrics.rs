// self
use crate::obs::{FlowOutcome, FlowStage};

/// Records a stage outcome via the global metrics recorder (when enabled).
pub fn record_stage_outcome(stage: FlowStage, outcome: FlowOutcome) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!(
			"oauth2_login_stage_total",
			"stage" => stage.as_str(),
			"outcome" => outcome.as_str()
		)
		.increment(1);
	}

	#[cfg(not(feature = "metrics"))]
	{
		let _ = (stage, outcome);
	}
}

/// Records a rejected or replayed state token.
///
/// Rejections are security-relevant, so they are surfaced distinctly instead of
/// being folded into the generic failure counter.
pub fn record_state_rejected(reason: &'static str) {
	#[cfg(feature = "tracing")]
	tracing::warn!(target: "oauth2_login", reason, "Rejected callback state token.");

	#[cfg(feature = "metrics")]
	metrics::counter!("oauth2_login_state_rejected_total", "reason" => reason).increment(1);

	#[cfg(not(any(feature = "tracing", feature = "metrics")))]
	let _ = reason;
}
