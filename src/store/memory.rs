//! Thread-safe in-memory [`StateStore`] implementation for single-process hosts.

// self
use crate::{
	_prelude::*,
	store::{AttemptMetadata, AuthorizationState, StateStore, StoreError, StoreFuture},
};

type StateMap = Arc<RwLock<HashMap<String, AuthorizationState>>>;

/// Thread-safe store keeping attempts in-process; suited to single-process
/// hosts, development, and tests.
#[derive(Clone, Debug, Default)]
pub struct MemoryStateStore(StateMap);
impl MemoryStateStore {
	fn issue_now(
		map: StateMap,
		metadata: AttemptMetadata,
		ttl: Duration,
		now: OffsetDateTime,
	) -> Result<String, StoreError> {
		let state = AuthorizationState::issue(metadata, ttl, now);
		let token = state.token.clone();
		let mut guard = map.write();

		// Expired entries are swept lazily so the map stays bounded by live attempts.
		guard.retain(|_, entry| !entry.is_expired_at(now));
		guard.insert(token.clone(), state);

		Ok(token)
	}

	fn consume_now(map: StateMap, token: &str, now: OffsetDateTime) -> Option<AttemptMetadata> {
		let mut guard = map.write();
		let state = guard.remove(token)?;

		if state.is_expired_at(now) {
			return None;
		}

		Some(state.metadata)
	}

	/// Number of live entries currently held.
	pub fn len(&self) -> usize {
		self.0.read().len()
	}

	/// Returns true when no attempts are tracked.
	pub fn is_empty(&self) -> bool {
		self.0.read().is_empty()
	}
}
impl StateStore for MemoryStateStore {
	fn issue<'a>(
		&'a self,
		metadata: AttemptMetadata,
		ttl: Duration,
		now: OffsetDateTime,
	) -> StoreFuture<'a, String> {
		let map = self.0.clone();

		Box::pin(async move { Self::issue_now(map, metadata, ttl, now) })
	}

	fn consume<'a>(
		&'a self,
		token: &'a str,
		now: OffsetDateTime,
	) -> StoreFuture<'a, Option<AttemptMetadata>> {
		let map = self.0.clone();
		let token = token.to_owned();

		Box::pin(async move { Ok(Self::consume_now(map, &token, now)) })
	}
}
