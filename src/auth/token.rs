//! Token payloads returned by the code exchange.

// self
use crate::{_prelude::*, auth::Secret};

/// Issued tokens handed back to the host after a successful exchange.
///
/// The flow holds the value only transiently; ownership transfers to the caller
/// and nothing is persisted by the crate.
#[derive(Clone, Serialize, Deserialize)]
pub struct TokenResponse {
	/// Access token secret; callers must avoid logging it.
	pub access_token: Secret,
	/// Refresh token secret, if the provider issued one.
	pub refresh_token: Option<Secret>,
	/// Token type advertised by the provider (normally `Bearer`).
	pub token_type: Option<String>,
	/// Relative lifetime reported via `expires_in`.
	pub expires_in: Option<Duration>,
	/// Instant the response was received and decoded.
	pub issued_at: OffsetDateTime,
}
impl TokenResponse {
	/// Absolute expiry instant, when the provider reported a lifetime.
	pub fn expires_at(&self) -> Option<OffsetDateTime> {
		self.expires_in.map(|delta| self.issued_at + delta)
	}

	/// Returns true when the provider reported a lifetime that has elapsed.
	pub fn is_expired_at(&self, instant: OffsetDateTime) -> bool {
		self.expires_at().is_some_and(|expiry| instant >= expiry)
	}
}
impl Debug for TokenResponse {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("TokenResponse")
			.field("access_token", &"<redacted>")
			.field("refresh_token", &self.refresh_token.as_ref().map(|_| "<redacted>"))
			.field("token_type", &self.token_type)
			.field("expires_in", &self.expires_in)
			.field("issued_at", &self.issued_at)
			.finish()
	}
}

/// Wire shape of an RFC 6749 token endpoint response; unknown fields are ignored.
#[derive(Deserialize)]
pub(crate) struct RawTokenResponse {
	access_token: String,
	token_type: Option<String>,
	expires_in: Option<u64>,
	refresh_token: Option<String>,
}
impl RawTokenResponse {
	pub(crate) fn into_response(self, issued_at: OffsetDateTime) -> TokenResponse {
		let expires_in = self
			.expires_in
			.map(|secs| Duration::seconds(i64::try_from(secs).unwrap_or(i64::MAX)));

		TokenResponse {
			access_token: Secret::new(self.access_token),
			refresh_token: self.refresh_token.map(Secret::new),
			token_type: self.token_type,
			expires_in,
			issued_at,
		}
	}
}
