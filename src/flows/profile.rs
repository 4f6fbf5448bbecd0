//! User-info fetch and claim projection.

// crates.io
use serde_json::Value;
// self
use crate::{
	_prelude::*,
	auth::ClaimSet,
	error::ProfileError,
	flows::{LoginFlow, body_preview},
	http::{HttpRequest, HttpTransport},
	obs::{self, FlowOutcome, FlowSpan, FlowStage},
	provider::mapping,
};

impl<T> LoginFlow<T>
where
	T: ?Sized + HttpTransport,
{
	/// Fetches the user profile and projects it through the claim-mapping table.
	///
	/// The user-info endpoint is read-only, which makes this the one stage of the
	/// flow that is safe to call again with the same access token after a
	/// failure.
	pub async fn fetch_profile(&self, access_token: &str) -> Result<ClaimSet> {
		const STAGE: FlowStage = FlowStage::FetchProfile;

		let span = FlowSpan::new(STAGE, "fetch_profile");

		obs::record_stage_outcome(STAGE, FlowOutcome::Attempt);

		let result = span.instrument(self.request_profile(access_token)).await;

		match &result {
			Ok(_) => obs::record_stage_outcome(STAGE, FlowOutcome::Success),
			Err(_) => obs::record_stage_outcome(STAGE, FlowOutcome::Failure),
		}

		result
	}

	async fn request_profile(&self, access_token: &str) -> Result<ClaimSet> {
		let mut request =
			HttpRequest::get(self.config.endpoints.user_info.clone(), self.http_timeout)
				.header("authorization", format!("Bearer {access_token}"))
				.header("accept", "application/json");

		for (name, value) in &self.config.extra_headers {
			request = request.header(name.as_str(), value.as_str());
		}

		let response =
			self.transport.execute(request).await.map_err(ProfileError::from_transport)?;

		if !response.is_success() {
			return Err(ProfileError::Status {
				status: response.status,
				detail: body_preview(&response.body_text()),
			}
			.into());
		}

		let mut deserializer = serde_json::Deserializer::from_slice(&response.body);
		let document: Value = serde_path_to_error::deserialize(&mut deserializer)
			.map_err(|source| ProfileError::Parse { source })?;

		mapping::project_claims(&self.config.claim_mappings, &document).map_err(Error::from)
	}
}
