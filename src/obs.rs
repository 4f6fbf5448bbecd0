//! Optional observability helpers for the login flow.
//!
//! # Feature Flags
//!
//! - Enable `tracing` to emit structured spans named `oauth2_login.flow` with the `stage`
//!   (protocol stage) and `op` (call site) fields, plus a distinct warning for every
//!   rejected state token.
//! - Enable `metrics` to increment the `oauth2_login_stage_total` counter for every
//!   attempt/success/failure, labeled by `stage` + `outcome`, and the
//!   `oauth2_login_state_rejected_total` counter labeled by `reason`.

mod metrics;
mod tracing;

pub use metrics::*;
pub use tracing::*;

// self
use crate::_prelude::*;

/// Protocol stages observed by the flow.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FlowStage {
	/// Authorization redirect construction.
	Authorize,
	/// Callback validation and orchestration.
	Callback,
	/// Code-for-token exchange.
	ExchangeCode,
	/// User-info fetch and claim projection.
	FetchProfile,
}
impl FlowStage {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			FlowStage::Authorize => "authorize",
			FlowStage::Callback => "callback",
			FlowStage::ExchangeCode => "exchange_code",
			FlowStage::FetchProfile => "fetch_profile",
		}
	}
}
impl Display for FlowStage {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Outcome labels recorded for each attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FlowOutcome {
	/// Entry to a flow stage.
	Attempt,
	/// Successful completion.
	Success,
	/// Failure propagated back to the caller.
	Failure,
}
impl FlowOutcome {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			FlowOutcome::Attempt => "attempt",
			FlowOutcome::Success => "success",
			FlowOutcome::Failure => "failure",
		}
	}
}
impl Display for FlowOutcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
