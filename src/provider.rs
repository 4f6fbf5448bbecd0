//! Provider-facing configuration (data) and claim mapping (projection rules).
//!
//! `config` exposes validated metadata ([`ProviderConfig`]) covering HTTPS-only
//! endpoints, client credentials, ordered scopes, static user-info headers, and
//! the state-token TTL. `mapping` defines the declarative claim-mapping table
//! ([`ClaimMapping`]) together with the dotted/array-indexed [`JsonPath`]
//! resolver the profile stage projects user-info documents through.

pub mod config;
pub mod mapping;

pub use config::*;
pub use mapping::*;
