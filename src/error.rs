//! Flow-level error types shared across configuration, storage, and the protocol stages.

// self
use crate::_prelude::*;

/// Crate-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

pub(crate) type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical login-flow error exposed by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Storage-layer failure.
	#[error("{0}")]
	Storage(
		#[from]
		#[source]
		crate::store::StoreError,
	),
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Code-for-token exchange failure.
	#[error(transparent)]
	TokenExchange(#[from] TokenExchangeError),
	/// User-info fetch or claim projection failure.
	#[error(transparent)]
	Profile(#[from] ProfileError),

	/// Provider or end user rejected the authorization request.
	#[error("Provider denied the authorization request: {error}.")]
	ProviderDenied {
		/// OAuth `error` code returned on the callback.
		error: String,
		/// Optional provider-supplied `error_description`.
		description: Option<String>,
	},
	/// Callback carried a state token that was unknown, expired, or already consumed.
	#[error("Callback state token is invalid or has already been used.")]
	InvalidOrReplayedState,
}

/// Configuration and validation failures raised while building a provider
/// configuration or constructing a transport.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
	/// Authorization endpoint is required.
	#[error("Missing authorization endpoint.")]
	MissingAuthorizationEndpoint,
	/// Token endpoint is required.
	#[error("Missing token endpoint.")]
	MissingTokenEndpoint,
	/// User-info endpoint is required.
	#[error("Missing user-info endpoint.")]
	MissingUserInfoEndpoint,
	/// Client identifier must be a non-empty string.
	#[error("Missing or empty client identifier.")]
	MissingClientId,
	/// Client secret is required for the code exchange.
	#[error("Missing client secret.")]
	MissingClientSecret,
	/// Redirect URI is required.
	#[error("Missing redirect URI.")]
	MissingRedirectUri,
	/// Endpoints must use HTTPS.
	#[error("The {endpoint} endpoint must use HTTPS: {url}.")]
	InsecureEndpoint {
		/// Which endpoint failed validation.
		endpoint: &'static str,
		/// Endpoint URL that failed validation.
		url: String,
	},
	/// Requested scopes cannot be validated.
	#[error("Requested scopes are invalid.")]
	InvalidScope(#[from] crate::auth::ScopeValidationError),
	/// Claim mapping path could not be parsed.
	#[error("Claim mapping path is invalid.")]
	InvalidClaimPath(#[from] crate::provider::JsonPathError),
	/// Claim mapping paths must be unique within a configuration.
	#[error("Duplicate claim mapping path: {path}.")]
	DuplicateClaimPath {
		/// The offending JSON path.
		path: String,
	},
	/// Extra header names must be printable, non-empty, and whitespace-free.
	#[error("Extra header name is invalid: {name:?}.")]
	InvalidHeaderName {
		/// The offending header name.
		name: String,
	},
	/// State token time-to-live must be positive.
	#[error("State token TTL must be positive.")]
	NonPositiveStateTtl,
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + StdError) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for ConfigError {
	fn from(e: ReqwestError) -> Self {
		Self::http_client_build(e)
	}
}

/// Failures raised while exchanging an authorization code for tokens.
///
/// The exchange is never retried automatically; authorization codes are
/// single-use, so the caller decides whether to restart the whole login.
#[derive(Debug, ThisError)]
pub enum TokenExchangeError {
	/// Underlying HTTP transport reported a network failure.
	#[error("Network error occurred while calling the token endpoint.")]
	Transport {
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// The exchange exceeded the caller-supplied timeout.
	#[error("Request timed out while calling the token endpoint.")]
	Timeout,
	/// Token endpoint answered with a non-success status.
	#[error("Token endpoint returned HTTP {status}: {detail}.")]
	Status {
		/// HTTP status code returned by the token endpoint.
		status: u16,
		/// OAuth error fields or a truncated body preview.
		detail: String,
	},
	/// Token endpoint returned a body that could not be decoded.
	#[error("Token endpoint returned a malformed response.")]
	MalformedResponse {
		/// Structured decoding failure.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
		/// HTTP status code carried by the malformed response.
		status: u16,
	},
}
impl TokenExchangeError {
	pub(crate) fn from_transport(e: crate::http::TransportError) -> Self {
		match e {
			crate::http::TransportError::Timeout => Self::Timeout,
			crate::http::TransportError::Network { source } => Self::Transport { source },
			crate::http::TransportError::Io(io) => Self::Transport { source: Box::new(io) },
		}
	}
}

/// Failures raised while fetching or projecting the user profile.
#[derive(Debug, ThisError)]
pub enum ProfileError {
	/// Underlying HTTP transport reported a network failure.
	#[error("Network error occurred while calling the user-info endpoint.")]
	Transport {
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// The fetch exceeded the caller-supplied timeout.
	#[error("Request timed out while calling the user-info endpoint.")]
	Timeout,
	/// User-info endpoint answered with a non-success status.
	#[error("User-info endpoint returned HTTP {status}: {detail}.")]
	Status {
		/// HTTP status code returned by the user-info endpoint.
		status: u16,
		/// Truncated body preview.
		detail: String,
	},
	/// User-info endpoint returned a body that is not valid JSON.
	#[error("User-info endpoint returned a body that is not valid JSON.")]
	Parse {
		/// Structured decoding failure.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
	},
	/// A claim marked as required resolved to nothing.
	#[error("Required claim {claim} is missing at path {path}.")]
	MissingRequiredClaim {
		/// Source JSON path declared by the mapping.
		path: String,
		/// Destination claim name declared by the mapping.
		claim: String,
	},
}
impl ProfileError {
	pub(crate) fn from_transport(e: crate::http::TransportError) -> Self {
		match e {
			crate::http::TransportError::Timeout => Self::Timeout,
			crate::http::TransportError::Network { source } => Self::Transport { source },
			crate::http::TransportError::Io(io) => Self::Transport { source: Box::new(io) },
		}
	}
}
