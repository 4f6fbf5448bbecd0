//! Login-flow orchestration: one [`LoginFlow`] value per configured provider.

pub mod authorize;
pub mod callback;

mod exchange;
mod profile;

pub use authorize::*;
pub use callback::*;

// std
use std::time::Duration as StdDuration;
// self
use crate::{_prelude::*, http::HttpTransport, provider::ProviderConfig, store::StateStore};
#[cfg(feature = "reqwest")] use crate::http::ReqwestTransport;

const BODY_PREVIEW_LIMIT: usize = 256;

#[cfg(feature = "reqwest")]
/// Login flow specialized for the crate's default reqwest transport.
pub type ReqwestLoginFlow = LoginFlow<ReqwestTransport>;

/// Coordinates the Authorization Code login flow for a single provider
/// configuration.
///
/// The flow owns the HTTP transport, state store, and provider configuration so
/// the individual stages (redirect construction, state validation, code
/// exchange, profile projection) can focus on protocol logic. Every login
/// attempt is an independent future; the state store is the only shared mutable
/// collaborator, and the configuration is read-only after construction.
pub struct LoginFlow<T>
where
	T: ?Sized + HttpTransport,
{
	/// HTTP transport used for every outbound provider request.
	pub transport: Arc<T>,
	/// State store that persists in-flight attempt tokens.
	pub store: Arc<dyn StateStore>,
	/// Immutable provider configuration driving the flow.
	pub config: ProviderConfig,
	/// Deadline applied to each outbound provider call.
	pub http_timeout: StdDuration,
}
impl<T> LoginFlow<T>
where
	T: ?Sized + HttpTransport,
{
	/// Default per-request timeout applied to provider calls.
	pub const DEFAULT_HTTP_TIMEOUT: StdDuration = StdDuration::from_secs(30);

	/// Creates a flow that reuses the caller-provided transport.
	pub fn with_transport(
		store: Arc<dyn StateStore>,
		config: ProviderConfig,
		transport: impl Into<Arc<T>>,
	) -> Self {
		Self {
			transport: transport.into(),
			store,
			config,
			http_timeout: Self::DEFAULT_HTTP_TIMEOUT,
		}
	}

	/// Overrides the per-request timeout for provider calls.
	pub fn with_http_timeout(mut self, timeout: StdDuration) -> Self {
		self.http_timeout = timeout;

		self
	}
}
#[cfg(feature = "reqwest")]
impl LoginFlow<ReqwestTransport> {
	/// Creates a flow backed by the default reqwest transport.
	pub fn new(store: Arc<dyn StateStore>, config: ProviderConfig) -> Self {
		Self::with_transport(store, config, ReqwestTransport::default())
	}
}
impl<T> Clone for LoginFlow<T>
where
	T: ?Sized + HttpTransport,
{
	fn clone(&self) -> Self {
		Self {
			transport: self.transport.clone(),
			store: self.store.clone(),
			config: self.config.clone(),
			http_timeout: self.http_timeout,
		}
	}
}
impl<T> Debug for LoginFlow<T>
where
	T: ?Sized + HttpTransport,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("LoginFlow")
			.field("provider", &self.config.id)
			.field("client_id", &self.config.client_id)
			.field("http_timeout", &self.http_timeout)
			.finish()
	}
}

/// Truncates provider-supplied body text before it is attached to error details.
pub(crate) fn body_preview(body: &str) -> String {
	if body.chars().count() <= BODY_PREVIEW_LIMIT {
		return body.to_owned();
	}

	let mut buf = String::new();

	for (idx, ch) in body.chars().enumerate() {
		if idx >= BODY_PREVIEW_LIMIT {
			buf.push('…');

			break;
		}
		buf.push(ch);
	}

	buf
}
