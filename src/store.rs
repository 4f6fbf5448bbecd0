//! Anti-forgery state token storage contracts and the built-in memory store.

pub mod memory;

pub use memory::MemoryStateStore;

// crates.io
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use rand::RngCore;
// self
use crate::_prelude::*;

const STATE_TOKEN_BYTES: usize = 32;

/// Future type returned by [`StateStore`] operations.
pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, StoreError>> + 'a + Send>>;

/// Persistence contract for single-use anti-forgery state tokens.
///
/// The flow only needs issue/consume/expire semantics, so entries may live
/// in-process ([`MemoryStateStore`]) or in a shared cache; the core never
/// assumes which. `consume` must be atomic: under concurrent callbacks
/// replaying one token, exactly one caller may observe `Some`.
pub trait StateStore
where
	Self: Send + Sync,
{
	/// Issues a fresh token valid for `ttl` from `now`, bound to the attempt metadata.
	fn issue<'a>(
		&'a self,
		metadata: AttemptMetadata,
		ttl: Duration,
		now: OffsetDateTime,
	) -> StoreFuture<'a, String>;

	/// Atomically consumes a token, returning the attempt metadata it was bound to.
	///
	/// `Some` is returned at most once per issued token; expired tokens are
	/// rejected and removed. A consumed token is never restored, even when the
	/// surrounding attempt is cancelled afterwards.
	fn consume<'a>(
		&'a self,
		token: &'a str,
		now: OffsetDateTime,
	) -> StoreFuture<'a, Option<AttemptMetadata>>;
}

/// Error type produced by [`StateStore`] implementations.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum StoreError {
	/// Serialization failures surfaced by the backend.
	#[error("Serialization error: {message}.")]
	Serialization {
		/// Human-readable error payload.
		message: String,
	},
	/// Backend-level failure for the storage engine.
	#[error("Backend failure: {message}.")]
	Backend {
		/// Human-readable error payload.
		message: String,
	},
}

/// Host-supplied context captured when a login attempt starts and recovered when
/// its callback arrives.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttemptMetadata {
	/// URL the host wants the user returned to after the login completes.
	pub return_url: Option<String>,
	/// Free-form key/value pairs carried across the redirect round trip.
	pub properties: BTreeMap<String, String>,
}
impl AttemptMetadata {
	/// Creates empty metadata.
	pub fn new() -> Self {
		Self::default()
	}

	/// Sets the post-login return URL.
	pub fn with_return_url(mut self, url: impl Into<String>) -> Self {
		self.return_url = Some(url.into());

		self
	}

	/// Adds a free-form property.
	pub fn with_property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
		self.properties.insert(key.into(), value.into());

		self
	}
}

/// Single in-flight authorization attempt tracked by a store.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorizationState {
	/// Opaque correlation token round-tripped through the provider redirect.
	pub token: String,
	/// Instant the token was issued.
	pub issued_at: OffsetDateTime,
	/// Instant after which the token is rejected.
	pub expires_at: OffsetDateTime,
	/// Host-supplied attempt metadata.
	pub metadata: AttemptMetadata,
}
impl AuthorizationState {
	/// Creates a new attempt record with a freshly generated token.
	pub fn issue(metadata: AttemptMetadata, ttl: Duration, now: OffsetDateTime) -> Self {
		Self { token: generate_state_token(), issued_at: now, expires_at: now + ttl, metadata }
	}

	/// Returns true when the token has outlived its TTL at the provided instant.
	pub fn is_expired_at(&self, instant: OffsetDateTime) -> bool {
		instant >= self.expires_at
	}
}

/// Generates an opaque state token carrying 256 bits of entropy, rendered as
/// unpadded URL-safe base64 so it survives query-string round trips verbatim.
pub fn generate_state_token() -> String {
	let mut bytes = [0_u8; STATE_TOKEN_BYTES];

	rand::rng().fill_bytes(&mut bytes);

	URL_SAFE_NO_PAD.encode(bytes)
}
