//! Provider-agnostic OAuth 2.0 Authorization Code login core—one validated provider
//! configuration drives the redirect, anti-forgery state, code exchange, and
//! claim-mapping stages of a login attempt.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod auth;
pub mod error;
pub mod flows;
pub mod http;
pub mod obs;
pub mod provider;
pub mod store;
#[cfg(feature = "reqwest")]
pub mod _preludet {
	//! Convenience re-exports and helpers for integration tests backed by the default
	//! reqwest transport.

	pub use crate::_prelude::*;

	// self
	use crate::{
		flows::LoginFlow,
		http::ReqwestTransport,
		provider::ProviderConfig,
		store::{MemoryStateStore, StateStore},
	};

	/// Login flow type alias used by reqwest-backed integration tests.
	pub type ReqwestTestLoginFlow = LoginFlow<ReqwestTransport>;

	/// Builds a reqwest transport that accepts the self-signed certificates produced by
	/// `httpmock` during tests.
	pub fn test_reqwest_transport() -> ReqwestTransport {
		let client = ReqwestClient::builder()
			.danger_accept_invalid_certs(true)
			.danger_accept_invalid_hostnames(true)
			.redirect(reqwest::redirect::Policy::none())
			.build()
			.expect("Failed to build insecure Reqwest client for tests.");

		ReqwestTransport::with_client(client)
	}

	/// Constructs a [`LoginFlow`] backed by an in-memory state store and the reqwest
	/// transport used across integration tests.
	pub fn build_reqwest_test_flow(
		config: ProviderConfig,
	) -> (ReqwestTestLoginFlow, Arc<MemoryStateStore>) {
		let store_backend = Arc::new(MemoryStateStore::default());
		let store: Arc<dyn StateStore> = store_backend.clone();
		let flow = LoginFlow::with_transport(store, config, test_reqwest_transport());

		(flow, store_backend)
	}
}

mod _prelude {
	pub use std::{
		collections::{BTreeMap, HashMap},
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		str::FromStr,
		sync::Arc,
	};

	pub use parking_lot::RwLock;
	#[cfg(feature = "reqwest")]
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize};
	pub use thiserror::Error as ThisError;
	pub use time::{Duration, OffsetDateTime};
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

#[cfg(feature = "reqwest")] pub use reqwest;
pub use url;
#[cfg(test)] use httpmock as _;
