//! Callback handling: the linear per-attempt protocol state machine.
//!
//! A callback drives a strictly linear, single-pass sequence—provider error
//! check, state consumption, code exchange, profile projection—with every
//! failure short-circuiting into [`AuthResult::Failure`]. Attempts never share
//! mutable state beyond the [`StateStore`](crate::store::StateStore).

// self
use crate::{
	_prelude::*,
	auth::{ClaimSet, TokenResponse},
	error::{ProfileError, TokenExchangeError},
	flows::LoginFlow,
	http::HttpTransport,
	obs::{self, FlowOutcome, FlowSpan, FlowStage},
	store::{AttemptMetadata, StateStore},
};

/// Query parameters delivered on the provider's redirect back.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CallbackParams {
	/// Authorization code issued by the provider.
	pub code: Option<String>,
	/// State token echoed back by the provider.
	pub state: Option<String>,
	/// OAuth error code when the authorization was rejected.
	pub error: Option<String>,
	/// Optional human-readable error description.
	pub error_description: Option<String>,
}
impl CallbackParams {
	/// Collects the relevant parameters from raw query pairs; unknown keys are
	/// ignored and the first occurrence of a key wins.
	pub fn from_query_pairs<I, K, V>(pairs: I) -> Self
	where
		I: IntoIterator<Item = (K, V)>,
		K: AsRef<str>,
		V: Into<String>,
	{
		let mut params = Self::default();

		for (key, value) in pairs {
			let slot = match key.as_ref() {
				"code" => &mut params.code,
				"state" => &mut params.state,
				"error" => &mut params.error,
				"error_description" => &mut params.error_description,
				_ => continue,
			};

			if slot.is_none() {
				*slot = Some(value.into());
			}
		}

		params
	}

	/// Parses the parameters straight from a callback URL.
	pub fn from_url(url: &Url) -> Self {
		Self::from_query_pairs(url.query_pairs().map(|(k, v)| (k.into_owned(), v.into_owned())))
	}
}

/// Terminal failure kinds surfaced to the host.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
	/// Provider or end user rejected the authorization.
	ProviderDenied,
	/// State token was unknown, expired, or already consumed.
	InvalidOrReplayedState,
	/// Code-for-token exchange failed (transport, status, or timeout).
	TokenExchangeFailed,
	/// Token endpoint response could not be decoded.
	MalformedTokenResponse,
	/// User-info call failed (transport, status, or timeout).
	ProfileFetchFailed,
	/// User-info body was not valid JSON or violated the declared mapping contract.
	ProfileParseError,
	/// Configuration or storage problem surfaced mid-flight.
	Configuration,
}
impl FailureKind {
	/// Returns a stable label suitable for logs and host-side matching.
	pub const fn as_str(self) -> &'static str {
		match self {
			FailureKind::ProviderDenied => "provider_denied",
			FailureKind::InvalidOrReplayedState => "invalid_or_replayed_state",
			FailureKind::TokenExchangeFailed => "token_exchange_failed",
			FailureKind::MalformedTokenResponse => "malformed_token_response",
			FailureKind::ProfileFetchFailed => "profile_fetch_failed",
			FailureKind::ProfileParseError => "profile_parse_error",
			FailureKind::Configuration => "configuration",
		}
	}
}
impl Display for FailureKind {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Successful terminal outcome of a login attempt.
#[derive(Clone, Debug)]
pub struct LoginSuccess {
	/// Normalized identity claims projected from the user-info body.
	pub claims: ClaimSet,
	/// Tokens issued by the provider; ownership transfers to the host.
	pub tokens: TokenResponse,
	/// Attempt metadata recovered from the state store.
	pub metadata: AttemptMetadata,
}

/// Failed terminal outcome of a login attempt.
#[derive(Clone, Debug)]
pub struct AuthFailure {
	/// Failure classification.
	pub kind: FailureKind,
	/// Provider-supplied or diagnostic detail; never contains secrets.
	pub detail: Option<String>,
	/// Tokens already issued before the failure; populated only for
	/// profile-stage failures so hosts can retry the fetch with the still-valid
	/// access token.
	pub tokens: Option<TokenResponse>,
}
impl Display for AuthFailure {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		match &self.detail {
			Some(detail) => write!(f, "{}: {detail}", self.kind),
			None => Display::fmt(&self.kind, f),
		}
	}
}
impl From<Error> for AuthFailure {
	fn from(err: Error) -> Self {
		let kind = match &err {
			Error::ProviderDenied { .. } => FailureKind::ProviderDenied,
			Error::InvalidOrReplayedState => FailureKind::InvalidOrReplayedState,
			Error::TokenExchange(TokenExchangeError::MalformedResponse { .. }) =>
				FailureKind::MalformedTokenResponse,
			Error::TokenExchange(_) => FailureKind::TokenExchangeFailed,
			Error::Profile(
				ProfileError::Parse { .. } | ProfileError::MissingRequiredClaim { .. },
			) => FailureKind::ProfileParseError,
			Error::Profile(_) => FailureKind::ProfileFetchFailed,
			Error::Storage(_) | Error::Config(_) => FailureKind::Configuration,
		};
		let detail = match err {
			Error::ProviderDenied { error, description } => Some(match description {
				Some(description) => format!("{error}: {description}"),
				None => error,
			}),
			Error::InvalidOrReplayedState => None,
			other => Some(other.to_string()),
		};

		Self { kind, detail, tokens: None }
	}
}

/// Terminal result of a callback, handed back to the host.
#[derive(Clone, Debug)]
pub enum AuthResult {
	/// The attempt completed and produced claims plus tokens.
	Success(LoginSuccess),
	/// The attempt failed at some stage.
	Failure(AuthFailure),
}
impl AuthResult {
	/// Returns true for successful outcomes.
	pub fn is_success(&self) -> bool {
		matches!(self, AuthResult::Success(_))
	}

	/// Unwraps the success payload, if any.
	pub fn success(self) -> Option<LoginSuccess> {
		match self {
			AuthResult::Success(success) => Some(success),
			AuthResult::Failure(_) => None,
		}
	}

	/// Unwraps the failure payload, if any.
	pub fn failure(self) -> Option<AuthFailure> {
		match self {
			AuthResult::Success(_) => None,
			AuthResult::Failure(failure) => Some(failure),
		}
	}
}

impl<T> LoginFlow<T>
where
	T: ?Sized + HttpTransport,
{
	/// Runs the callback half of the flow; every failure folds into
	/// [`AuthResult::Failure`] instead of an `Err`.
	///
	/// The state token is consumed before the first network call, so a cancelled
	/// or failed attempt never frees its token for a second use.
	pub async fn handle_callback(&self, params: CallbackParams) -> AuthResult {
		const STAGE: FlowStage = FlowStage::Callback;

		let span = FlowSpan::new(STAGE, "handle_callback");

		obs::record_stage_outcome(STAGE, FlowOutcome::Attempt);

		let result = span.instrument(self.run_callback(params)).await;

		match &result {
			AuthResult::Success(_) => obs::record_stage_outcome(STAGE, FlowOutcome::Success),
			AuthResult::Failure(_) => obs::record_stage_outcome(STAGE, FlowOutcome::Failure),
		}

		result
	}

	async fn run_callback(&self, params: CallbackParams) -> AuthResult {
		if let Some(error) = params.error {
			return AuthResult::Failure(AuthFailure::from(Error::ProviderDenied {
				error,
				description: params.error_description,
			}));
		}

		let metadata = match self.consume_state(params.state.as_deref()).await {
			Ok(metadata) => metadata,
			Err(err) => return AuthResult::Failure(err.into()),
		};
		let Some(code) = params.code else {
			return AuthResult::Failure(AuthFailure {
				kind: FailureKind::TokenExchangeFailed,
				detail: Some("Callback did not include an authorization code.".into()),
				tokens: None,
			});
		};
		let tokens = match self.exchange_code(&code).await {
			Ok(tokens) => tokens,
			Err(err) => return AuthResult::Failure(err.into()),
		};
		let claims = match self.fetch_profile(tokens.access_token.expose()).await {
			Ok(claims) => claims,
			Err(err) => {
				let mut failure = AuthFailure::from(err);

				// The access token remains valid; hand it back for a host-side retry.
				failure.tokens = Some(tokens);

				return AuthResult::Failure(failure);
			},
		};

		AuthResult::Success(LoginSuccess { claims, tokens, metadata })
	}

	async fn consume_state(&self, state: Option<&str>) -> Result<AttemptMetadata> {
		let Some(state) = state else {
			obs::record_state_rejected("missing");

			return Err(Error::InvalidOrReplayedState);
		};
		let now = OffsetDateTime::now_utc();

		match self.store.consume(state, now).await? {
			Some(metadata) => Ok(metadata),
			None => {
				obs::record_state_rejected("unknown_or_replayed");

				Err(Error::InvalidOrReplayedState)
			},
		}
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn query_pairs_ignore_unknown_keys_and_first_value_wins() {
		let params = CallbackParams::from_query_pairs([
			("code", "first-code"),
			("code", "second-code"),
			("state", "state-token"),
			("session_state", "ignored"),
		]);

		assert_eq!(params.code.as_deref(), Some("first-code"));
		assert_eq!(params.state.as_deref(), Some("state-token"));
		assert_eq!(params.error, None);
	}

	#[test]
	fn params_parse_from_a_callback_url() {
		let url = Url::parse(
			"https://app.example.com/signin?code=abc&state=xyz&error=access_denied&error_description=nope",
		)
		.expect("Callback URL fixture should parse.");
		let params = CallbackParams::from_url(&url);

		assert_eq!(params.code.as_deref(), Some("abc"));
		assert_eq!(params.state.as_deref(), Some("xyz"));
		assert_eq!(params.error.as_deref(), Some("access_denied"));
		assert_eq!(params.error_description.as_deref(), Some("nope"));
	}

	#[test]
	fn errors_flatten_into_failure_kinds() {
		let denied: AuthFailure = Error::ProviderDenied {
			error: "access_denied".into(),
			description: Some("user cancelled".into()),
		}
		.into();

		assert_eq!(denied.kind, FailureKind::ProviderDenied);
		assert_eq!(denied.detail.as_deref(), Some("access_denied: user cancelled"));

		let replayed: AuthFailure = Error::InvalidOrReplayedState.into();

		assert_eq!(replayed.kind, FailureKind::InvalidOrReplayedState);
		assert_eq!(replayed.detail, None);

		let exchange: AuthFailure = Error::TokenExchange(TokenExchangeError::Status {
			status: 400,
			detail: "invalid_grant".into(),
		})
		.into();

		assert_eq!(exchange.kind, FailureKind::TokenExchangeFailed);

		let profile: AuthFailure = Error::Profile(ProfileError::MissingRequiredClaim {
			path: "email".into(),
			claim: "Email".into(),
		})
		.into();

		assert_eq!(profile.kind, FailureKind::ProfileParseError);
	}
}
