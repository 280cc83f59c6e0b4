//! Thread-safe in-memory [`ResponseCache`] for single-process clients and tests.

// self
use crate::{
	_prelude::*,
	cache::{CacheFuture, CacheKey, CachedResponse, ResponseCache},
};

type CacheMap = Arc<RwLock<HashMap<CacheKey, CachedResponse>>>;

/// Response cache that keeps entries in-process.
#[derive(Clone, Debug, Default)]
pub struct MemoryCache(CacheMap);
impl MemoryCache {
	/// Number of stored entries, expired ones included.
	pub fn len(&self) -> usize {
		self.0.read().len()
	}

	/// Returns true when nothing is stored.
	pub fn is_empty(&self) -> bool {
		self.0.read().is_empty()
	}

	fn get_now(map: CacheMap, key: CacheKey, now: OffsetDateTime) -> Option<CachedResponse> {
		map.read().get(&key).filter(|entry| !entry.is_expired_at(now)).cloned()
	}

	fn purge_now(map: CacheMap, now: OffsetDateTime) -> usize {
		let mut guard = map.write();
		let before = guard.len();

		guard.retain(|_, entry| !entry.is_expired_at(now));

		before - guard.len()
	}
}
impl ResponseCache for MemoryCache {
	fn get<'a>(
		&'a self,
		key: &'a CacheKey,
		now: OffsetDateTime,
	) -> CacheFuture<'a, Option<CachedResponse>> {
		let map = self.0.clone();
		let key = key.to_owned();

		Box::pin(async move { Ok(Self::get_now(map, key, now)) })
	}

	fn put(&self, key: CacheKey, response: CachedResponse) -> CacheFuture<'_, ()> {
		let map = self.0.clone();

		Box::pin(async move {
			let mut guard = map.write();

			guard.retain(|_, entry| !entry.is_expired_at(response.stored_at));
			guard.insert(key, response);

			Ok(())
		})
	}

	fn purge_expired(&self, now: OffsetDateTime) -> CacheFuture<'_, usize> {
		let map = self.0.clone();

		Box::pin(async move { Ok(Self::purge_now(map, now)) })
	}

	fn clear(&self) -> CacheFuture<'_, ()> {
		let map = self.0.clone();

		Box::pin(async move {
			map.write().clear();

			Ok(())
		})
	}
}
