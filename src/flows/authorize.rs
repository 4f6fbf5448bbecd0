//! Authorization redirect construction.

// self
use crate::{
	_prelude::*,
	flows::LoginFlow,
	http::HttpTransport,
	obs::{self, FlowOutcome, FlowSpan, FlowStage},
	provider::ProviderConfig,
	store::{AttemptMetadata, StateStore},
};

/// Redirect handed back to the host when a login attempt starts.
#[derive(Clone, Debug)]
pub struct AuthorizationRequest {
	/// Fully formed authorization URL the end user should be sent to.
	pub redirect_url: Url,
	/// Opaque state token that must round-trip via the callback.
	pub state: String,
}

impl<T> LoginFlow<T>
where
	T: ?Sized + HttpTransport,
{
	/// Starts a login attempt: issues a single-use state token through the store
	/// and renders the authorization redirect URL.
	///
	/// Every call issues its own store entry, so two calls always yield two
	/// distinct state values.
	pub async fn begin_login(&self, metadata: AttemptMetadata) -> Result<AuthorizationRequest> {
		const STAGE: FlowStage = FlowStage::Authorize;

		let span = FlowSpan::new(STAGE, "begin_login");

		obs::record_stage_outcome(STAGE, FlowOutcome::Attempt);

		let result = span
			.instrument(async move {
				let now = OffsetDateTime::now_utc();
				let state = self
					.store
					.issue(metadata, self.config.state_token_ttl, now)
					.await
					.map_err(Error::from)?;
				let redirect_url = build_authorize_url(&self.config, &state);

				Ok(AuthorizationRequest { redirect_url, state })
			})
			.await;

		match &result {
			Ok(_) => obs::record_stage_outcome(STAGE, FlowOutcome::Success),
			Err(_) => obs::record_stage_outcome(STAGE, FlowOutcome::Failure),
		}

		result
	}
}

fn build_authorize_url(config: &ProviderConfig, state: &str) -> Url {
	let mut url = config.endpoints.authorization.clone();
	let mut pairs = url.query_pairs_mut();

	pairs.append_pair("response_type", "code");
	pairs.append_pair("client_id", &config.client_id);
	pairs.append_pair("redirect_uri", config.redirect_uri.as_str());

	if !config.scopes.is_empty() {
		pairs.append_pair("scope", &config.scopes.joined());
	}

	pairs.append_pair("state", state);

	for (name, value) in &config.extra_authorize_params {
		pairs.append_pair(name, value);
	}

	drop(pairs);

	url
}
