//! Validated provider configuration consumed by the login flow.

// std
use std::{borrow::Borrow, ops::Deref};
// self
use crate::{
	_prelude::*,
	auth::{ScopeList, Secret},
	error::ConfigError,
	provider::mapping::ClaimMapping,
};

const PROVIDER_ID_MAX_LEN: usize = 128;

/// Error returned when provider identifier validation fails.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, ThisError)]
pub enum ProviderIdError {
	/// The identifier was empty.
	#[error("Provider identifier cannot be empty.")]
	Empty,
	/// The identifier contains whitespace characters.
	#[error("Provider identifier contains whitespace.")]
	ContainsWhitespace,
	/// The identifier exceeded the allowed character count.
	#[error("Provider identifier exceeds {max} characters.")]
	TooLong {
		/// Maximum permitted character count.
		max: usize,
	},
}

/// Identifier for a configured identity provider; doubles as the host-facing
/// authentication scheme name (e.g. `bungie`).
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ProviderId(String);
impl ProviderId {
	/// Creates a new identifier after validation.
	pub fn new(value: impl AsRef<str>) -> Result<Self, ProviderIdError> {
		let view = value.as_ref();

		validate_provider_id(view)?;

		Ok(Self(view.to_owned()))
	}
}
impl Deref for ProviderId {
	type Target = str;

	fn deref(&self) -> &Self::Target {
		&self.0
	}
}
impl AsRef<str> for ProviderId {
	fn as_ref(&self) -> &str {
		&self.0
	}
}
impl Borrow<str> for ProviderId {
	fn borrow(&self) -> &str {
		&self.0
	}
}
impl From<ProviderId> for String {
	fn from(value: ProviderId) -> Self {
		value.0
	}
}
impl TryFrom<String> for ProviderId {
	type Error = ProviderIdError;

	fn try_from(value: String) -> Result<Self, Self::Error> {
		validate_provider_id(&value)?;

		Ok(Self(value))
	}
}
impl Debug for ProviderId {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		write!(f, "Provider({})", self.0)
	}
}
impl Display for ProviderId {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(&self.0)
	}
}
impl FromStr for ProviderId {
	type Err = ProviderIdError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Self::new(s)
	}
}

fn validate_provider_id(view: &str) -> Result<(), ProviderIdError> {
	if view.is_empty() {
		return Err(ProviderIdError::Empty);
	}
	if view.chars().any(char::is_whitespace) {
		return Err(ProviderIdError::ContainsWhitespace);
	}
	if view.len() > PROVIDER_ID_MAX_LEN {
		return Err(ProviderIdError::TooLong { max: PROVIDER_ID_MAX_LEN });
	}

	Ok(())
}

/// Endpoint set declared by a provider configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderEndpoints {
	/// Authorization endpoint the end user is redirected to.
	pub authorization: Url,
	/// Token endpoint used for the code exchange.
	pub token: Url,
	/// User-info endpoint queried with the issued access token.
	pub user_info: Url,
}

/// Immutable provider configuration consumed by the login flow.
///
/// Built once at startup through [`ProviderConfig::builder`], then shared
/// read-only by every concurrent login attempt.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ProviderConfig {
	/// Provider identifier (authentication scheme name).
	pub id: ProviderId,
	/// Endpoint definitions exposed by the provider.
	pub endpoints: ProviderEndpoints,
	/// OAuth 2.0 client identifier.
	pub client_id: String,
	/// Confidential client secret sent during the code exchange.
	pub client_secret: Secret,
	/// Redirect URI registered with the provider.
	pub redirect_uri: Url,
	/// Requested scopes in provider-defined order.
	pub scopes: ScopeList,
	/// Ordered claim-mapping table applied to the user-info body.
	pub claim_mappings: Vec<ClaimMapping>,
	/// Static headers attached to every user-info call (e.g. a fixed API key).
	pub extra_headers: Vec<(String, String)>,
	/// Additional query parameters appended to the authorization URL.
	pub extra_authorize_params: Vec<(String, String)>,
	/// Time-to-live for issued state tokens.
	pub state_token_ttl: Duration,
}
impl ProviderConfig {
	/// Default state-token TTL applied when the builder is not told otherwise.
	pub const DEFAULT_STATE_TOKEN_TTL: Duration = Duration::minutes(15);

	/// Creates a new builder for the provided identifier.
	pub fn builder(id: ProviderId) -> ProviderConfigBuilder {
		ProviderConfigBuilder::new(id)
	}
}

/// Builder for [`ProviderConfig`] values.
///
/// Accumulating methods are infallible; all validation happens in
/// [`build`](Self::build) so registration code chains cleanly.
#[derive(Debug)]
pub struct ProviderConfigBuilder {
	id: ProviderId,
	authorization_endpoint: Option<Url>,
	token_endpoint: Option<Url>,
	user_info_endpoint: Option<Url>,
	client_id: Option<String>,
	client_secret: Option<Secret>,
	redirect_uri: Option<Url>,
	scopes: Vec<String>,
	claim_mappings: Vec<(String, String, bool)>,
	extra_headers: Vec<(String, String)>,
	extra_authorize_params: Vec<(String, String)>,
	state_token_ttl: Duration,
}
impl ProviderConfigBuilder {
	/// Creates a new builder seeded with the provided identifier.
	pub fn new(id: ProviderId) -> Self {
		Self {
			id,
			authorization_endpoint: None,
			token_endpoint: None,
			user_info_endpoint: None,
			client_id: None,
			client_secret: None,
			redirect_uri: None,
			scopes: Vec::new(),
			claim_mappings: Vec::new(),
			extra_headers: Vec::new(),
			extra_authorize_params: Vec::new(),
			state_token_ttl: ProviderConfig::DEFAULT_STATE_TOKEN_TTL,
		}
	}

	/// Sets the authorization endpoint.
	pub fn authorization_endpoint(mut self, url: Url) -> Self {
		self.authorization_endpoint = Some(url);

		self
	}

	/// Sets the token endpoint.
	pub fn token_endpoint(mut self, url: Url) -> Self {
		self.token_endpoint = Some(url);

		self
	}

	/// Sets the user-info endpoint.
	pub fn user_info_endpoint(mut self, url: Url) -> Self {
		self.user_info_endpoint = Some(url);

		self
	}

	/// Sets the OAuth 2.0 client identifier.
	pub fn client_id(mut self, client_id: impl Into<String>) -> Self {
		self.client_id = Some(client_id.into());

		self
	}

	/// Sets the confidential client secret.
	pub fn client_secret(mut self, client_secret: impl Into<String>) -> Self {
		self.client_secret = Some(Secret::new(client_secret));

		self
	}

	/// Sets the redirect URI registered with the provider.
	pub fn redirect_uri(mut self, url: Url) -> Self {
		self.redirect_uri = Some(url);

		self
	}

	/// Appends a single requested scope, keeping declaration order.
	pub fn scope(mut self, scope: impl Into<String>) -> Self {
		self.scopes.push(scope.into());

		self
	}

	/// Appends multiple requested scopes, keeping declaration order.
	pub fn scopes<I, S>(mut self, scopes: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		self.scopes.extend(scopes.into_iter().map(Into::into));

		self
	}

	/// Appends an optional claim mapping from a JSON path to a claim name.
	pub fn map_claim(mut self, path: impl Into<String>, claim: impl Into<String>) -> Self {
		self.claim_mappings.push((path.into(), claim.into(), false));

		self
	}

	/// Appends a required claim mapping; a missing source value fails the login.
	pub fn map_required_claim(
		mut self,
		path: impl Into<String>,
		claim: impl Into<String>,
	) -> Self {
		self.claim_mappings.push((path.into(), claim.into(), true));

		self
	}

	/// Appends a static header attached to every user-info call.
	pub fn extra_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
		self.extra_headers.push((name.into(), value.into()));

		self
	}

	/// Appends a provider-specific query parameter for the authorization URL.
	pub fn extra_authorize_param(
		mut self,
		name: impl Into<String>,
		value: impl Into<String>,
	) -> Self {
		self.extra_authorize_params.push((name.into(), value.into()));

		self
	}

	/// Overrides the state-token TTL (defaults to 15 minutes).
	pub fn state_token_ttl(mut self, ttl: Duration) -> Self {
		self.state_token_ttl = ttl;

		self
	}

	/// Consumes the builder and validates the resulting configuration.
	pub fn build(self) -> Result<ProviderConfig, ConfigError> {
		let authorization =
			self.authorization_endpoint.ok_or(ConfigError::MissingAuthorizationEndpoint)?;
		let token = self.token_endpoint.ok_or(ConfigError::MissingTokenEndpoint)?;
		let user_info = self.user_info_endpoint.ok_or(ConfigError::MissingUserInfoEndpoint)?;
		let client_id = self.client_id.filter(|id| !id.is_empty()).ok_or(ConfigError::MissingClientId)?;
		let client_secret = self.client_secret.ok_or(ConfigError::MissingClientSecret)?;
		let redirect_uri = self.redirect_uri.ok_or(ConfigError::MissingRedirectUri)?;
		let scopes = ScopeList::new(self.scopes)?;
		let mut claim_mappings = Vec::with_capacity(self.claim_mappings.len());

		for (path, claim, required) in self.claim_mappings {
			let mut mapping = ClaimMapping::new(&path, claim)?;

			if required {
				mapping = mapping.required();
			}
			if claim_mappings.iter().any(|existing: &ClaimMapping| existing.path == mapping.path) {
				return Err(ConfigError::DuplicateClaimPath { path });
			}

			claim_mappings.push(mapping);
		}

		for (name, _) in &self.extra_headers {
			validate_header_name(name)?;
		}

		if !self.state_token_ttl.is_positive() {
			return Err(ConfigError::NonPositiveStateTtl);
		}

		let config = ProviderConfig {
			id: self.id,
			endpoints: ProviderEndpoints { authorization, token, user_info },
			client_id,
			client_secret,
			redirect_uri,
			scopes,
			claim_mappings,
			extra_headers: self.extra_headers,
			extra_authorize_params: self.extra_authorize_params,
			state_token_ttl: self.state_token_ttl,
		};

		config.validate()?;

		Ok(config)
	}
}

impl ProviderConfig {
	/// Validates invariants for the configuration.
	fn validate(&self) -> Result<(), ConfigError> {
		validate_endpoint("authorization", &self.endpoints.authorization)?;
		validate_endpoint("token", &self.endpoints.token)?;
		validate_endpoint("user-info", &self.endpoints.user_info)?;

		Ok(())
	}
}

fn validate_endpoint(name: &'static str, url: &Url) -> Result<(), ConfigError> {
	if url.scheme() != "https" {
		Err(ConfigError::InsecureEndpoint { endpoint: name, url: url.to_string() })
	} else {
		Ok(())
	}
}

fn validate_header_name(name: &str) -> Result<(), ConfigError> {
	if name.is_empty() || name.chars().any(|ch| ch.is_whitespace() || ch.is_control()) {
		Err(ConfigError::InvalidHeaderName { name: name.to_owned() })
	} else {
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	fn url(value: &str) -> Url {
		Url::parse(value).expect("Fixture URL should parse.")
	}

	fn builder() -> ProviderConfigBuilder {
		let id = ProviderId::new("bungie").expect("Provider identifier should be valid.");

		ProviderConfig::builder(id)
			.authorization_endpoint(url("https://www.bungie.net/en/oauth/authorize"))
			.token_endpoint(url("https://www.bungie.net/platform/app/oauth/token/"))
			.user_info_endpoint(url(
				"https://www.bungie.net/platform/User/GetMembershipsForCurrentUser/",
			))
			.client_id("client-id")
			.client_secret("client-secret")
			.redirect_uri(url("https://app.example.com/signin-bungie"))
	}

	#[test]
	fn identifiers_validate() {
		assert!(ProviderId::new("").is_err());
		assert!(ProviderId::new("with space").is_err());
		assert!(ProviderId::new(&"a".repeat(PROVIDER_ID_MAX_LEN + 1)).is_err());

		let id = ProviderId::new("bungie").expect("Identifier fixture should be valid.");

		assert_eq!(id.as_ref(), "bungie");
		assert!(serde_json::from_str::<ProviderId>("\"with space\"").is_err());
	}

	#[test]
	fn builder_applies_defaults() {
		let config = builder().build().expect("Builder fixture should succeed.");

		assert_eq!(config.state_token_ttl, ProviderConfig::DEFAULT_STATE_TOKEN_TTL);
		assert!(config.scopes.is_empty());
		assert!(config.claim_mappings.is_empty());
		assert!(config.extra_headers.is_empty());
	}

	#[test]
	fn builder_rejects_missing_fields() {
		let id = ProviderId::new("incomplete").expect("Identifier fixture should be valid.");
		let err = ProviderConfig::builder(id)
			.token_endpoint(url("https://example.com/token"))
			.build()
			.expect_err("Missing authorization endpoint must be rejected.");

		assert!(matches!(err, ConfigError::MissingAuthorizationEndpoint));

		let err = builder()
			.client_id("")
			.build()
			.expect_err("Empty client identifiers must be rejected.");

		assert!(matches!(err, ConfigError::MissingClientId));
	}

	#[test]
	fn builder_rejects_insecure_endpoints() {
		let err = builder()
			.token_endpoint(url("http://www.bungie.net/platform/app/oauth/token/"))
			.build()
			.expect_err("Insecure token endpoints must be rejected.");

		assert!(matches!(err, ConfigError::InsecureEndpoint { endpoint: "token", .. }));
	}

	#[test]
	fn builder_rejects_duplicate_claim_paths() {
		let err = builder()
			.map_claim("name", "Name")
			.map_claim("name", "DisplayName")
			.build()
			.expect_err("Duplicate mapping paths must be rejected.");

		assert!(matches!(err, ConfigError::DuplicateClaimPath { .. }));
	}

	#[test]
	fn builder_rejects_invalid_header_names_and_ttl() {
		let err = builder()
			.extra_header("X API Key", "value")
			.build()
			.expect_err("Header names with whitespace must be rejected.");

		assert!(matches!(err, ConfigError::InvalidHeaderName { .. }));

		let err = builder()
			.state_token_ttl(Duration::ZERO)
			.build()
			.expect_err("Non-positive TTLs must be rejected.");

		assert!(matches!(err, ConfigError::NonPositiveStateTtl));
	}

	#[test]
	fn builder_preserves_scope_and_mapping_order() {
		let config = builder()
			.scope("ReadBasicUserProfile")
			.scope("MoveEquipDestinyItems")
			.map_claim("email", "Email")
			.map_required_claim("name", "Name")
			.extra_header("X-API-Key", "api-key")
			.build()
			.expect("Builder fixture should succeed.");

		assert_eq!(
			config.scopes.iter().collect::<Vec<_>>(),
			vec!["ReadBasicUserProfile", "MoveEquipDestinyItems"],
		);
		assert_eq!(config.claim_mappings.len(), 2);
		assert_eq!(config.claim_mappings[0].claim, "Email");
		assert!(!config.claim_mappings[0].required);
		assert!(config.claim_mappings[1].required);
		assert_eq!(config.extra_headers, vec![("X-API-Key".to_owned(), "api-key".to_owned())]);
	}

	#[test]
	fn debug_redacts_the_client_secret() {
		let config = builder().build().expect("Builder fixture should succeed.");
		let rendered = format!("{config:?}");

		assert!(!rendered.contains("client-secret"), "Secret must not leak: {rendered}");
	}
}
