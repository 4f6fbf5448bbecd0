//! Identity-domain values: secrets, ordered scopes, claims, and token payloads.

pub mod claims;
pub mod scope;
pub mod secret;
pub mod token;

pub use claims::*;
pub use scope::*;
pub use secret::*;
pub use token::*;
