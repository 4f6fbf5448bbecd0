//! Code-for-token exchange against the provider's token endpoint.

// crates.io
use url::form_urlencoded;
// self
use crate::{
	_prelude::*,
	auth::{TokenResponse, token::RawTokenResponse},
	error::TokenExchangeError,
	flows::{LoginFlow, body_preview},
	http::{HttpRequest, HttpTransport},
	obs::{self, FlowOutcome, FlowSpan, FlowStage},
};

impl<T> LoginFlow<T>
where
	T: ?Sized + HttpTransport,
{
	/// Exchanges an authorization code for tokens.
	///
	/// One request, one response; the exchange is never retried because
	/// authorization codes are single-use and token endpoints are not safe to
	/// hit twice with the same code.
	pub async fn exchange_code(&self, code: &str) -> Result<TokenResponse> {
		const STAGE: FlowStage = FlowStage::ExchangeCode;

		let span = FlowSpan::new(STAGE, "exchange_code");

		obs::record_stage_outcome(STAGE, FlowOutcome::Attempt);

		let result = span.instrument(self.request_tokens(code)).await;

		match &result {
			Ok(_) => obs::record_stage_outcome(STAGE, FlowOutcome::Success),
			Err(_) => obs::record_stage_outcome(STAGE, FlowOutcome::Failure),
		}

		result
	}

	async fn request_tokens(&self, code: &str) -> Result<TokenResponse> {
		let body = form_urlencoded::Serializer::new(String::new())
			.append_pair("grant_type", "authorization_code")
			.append_pair("code", code)
			.append_pair("redirect_uri", self.config.redirect_uri.as_str())
			.append_pair("client_id", &self.config.client_id)
			.append_pair("client_secret", self.config.client_secret.expose())
			.finish();
		let request = HttpRequest::post(self.config.endpoints.token.clone(), self.http_timeout)
			.header("content-type", "application/x-www-form-urlencoded")
			.header("accept", "application/json")
			.body(body.into_bytes());
		let response = self
			.transport
			.execute(request)
			.await
			.map_err(TokenExchangeError::from_transport)?;

		if !response.is_success() {
			return Err(TokenExchangeError::Status {
				status: response.status,
				detail: status_detail(&response.body),
			}
			.into());
		}

		let issued_at = OffsetDateTime::now_utc();
		let mut deserializer = serde_json::Deserializer::from_slice(&response.body);
		let raw: RawTokenResponse = serde_path_to_error::deserialize(&mut deserializer)
			.map_err(|source| TokenExchangeError::MalformedResponse {
				source,
				status: response.status,
			})?;

		Ok(raw.into_response(issued_at))
	}
}

/// OAuth error payload shape probed on non-success statuses.
#[derive(Deserialize)]
struct OAuthErrorBody {
	error: Option<String>,
	error_description: Option<String>,
}

fn status_detail(body: &[u8]) -> String {
	if let Ok(OAuthErrorBody { error: Some(error), error_description }) =
		serde_json::from_slice(body)
	{
		return match error_description {
			Some(description) => format!("{error}: {description}"),
			None => error,
		};
	}

	body_preview(&String::from_utf8_lossy(body))
}
