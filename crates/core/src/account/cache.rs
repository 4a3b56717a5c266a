//! Account listing cache using Moka.
//!
//! Only the read path for listings goes through this cache. Balance
//! arithmetic always works on fresh account state.

use moka::sync::Cache;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use super::types::{Account, AccountFilter};

/// Default cache capacity (number of distinct filters).
const DEFAULT_CACHE_CAPACITY: u64 = 256;

/// Default time-to-live for cached listings (1 minute).
const DEFAULT_TTL_SECS: u64 = 60;

/// Cache of account listings keyed by filter.
///
/// Thread-safe and cheap to clone; clones share the same storage.
///
/// Every [`invalidate_all`](Self::invalidate_all) bumps a generation
/// counter. A listing read from state before an invalidation is never
/// left in the cache after it, even when its insert lands later.
#[derive(Clone)]
pub struct AccountListCache {
    cache: Cache<AccountFilter, Arc<Vec<Account>>>,
    generation: Arc<AtomicU64>,
}

impl AccountListCache {
    /// Creates a cache with default settings (256 entries, 60 second TTL).
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(DEFAULT_CACHE_CAPACITY, DEFAULT_TTL_SECS)
    }

    /// Creates a cache with custom capacity and time-to-live.
    #[must_use]
    pub fn with_config(max_capacity: u64, ttl_secs: u64) -> Self {
        let cache = Cache::builder()
            .max_capacity(max_capacity)
            .time_to_live(Duration::from_secs(ttl_secs))
            .build();

        Self {
            cache,
            generation: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Returns the cached listing for `filter`, or loads and caches it.
    ///
    /// # Errors
    ///
    /// Propagates the loader's error; nothing is cached in that case.
    pub fn get_or_load<E, F>(&self, filter: AccountFilter, load: F) -> Result<Arc<Vec<Account>>, E>
    where
        F: FnOnce() -> Result<Vec<Account>, E>,
    {
        if let Some(cached) = self.cache.get(&filter) {
            return Ok(cached);
        }

        let generation = self.generation();
        Ok(self.insert(filter, load()?, generation))
    }

    /// Returns the cached listing for `filter`, if any.
    ///
    /// Async stores check this first, take the [`generation`](Self::generation),
    /// and [`insert`](Self::insert) what they load, since the loader of
    /// [`get_or_load`](Self::get_or_load) is synchronous.
    #[must_use]
    pub fn get(&self, filter: &AccountFilter) -> Option<Arc<Vec<Account>>> {
        self.cache.get(filter)
    }

    /// Current invalidation generation. Read it before loading a listing.
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    /// Caches a listing loaded at `generation` and returns it.
    ///
    /// If an invalidation happened since `generation` was read, the listing
    /// is still returned but does not stay cached.
    pub fn insert(
        &self,
        filter: AccountFilter,
        accounts: Vec<Account>,
        generation: u64,
    ) -> Arc<Vec<Account>> {
        let accounts = Arc::new(accounts);
        self.cache.insert(filter, Arc::clone(&accounts));
        // Checked after the insert: an invalidation racing with it either
        // shows up here or clears the entry itself.
        if self.generation() != generation {
            self.cache.invalidate(&filter);
        }
        accounts
    }

    /// Drops every cached listing. Called after any account mutation.
    pub fn invalidate_all(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        self.cache.invalidate_all();
    }

    /// Returns true if a listing for `filter` is currently cached.
    #[must_use]
    pub fn contains(&self, filter: &AccountFilter) -> bool {
        self.cache.contains_key(filter)
    }
}

impl Default for AccountListCache {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for AccountListCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccountListCache")
            .field("entries", &self.cache.entry_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::account::AccountType;
    use std::cell::Cell;

    #[test]
    fn test_cache_miss_then_hit() {
        let cache = AccountListCache::new();
        let loads = Cell::new(0);
        let load = || {
            loads.set(loads.get() + 1);
            Ok::<_, ()>(Vec::new())
        };

        cache.get_or_load(AccountFilter::default(), load).unwrap();
        cache.get_or_load(AccountFilter::default(), load).unwrap();

        assert_eq!(loads.get(), 1);
        assert!(cache.contains(&AccountFilter::default()));
    }

    #[test]
    fn test_filters_cached_separately() {
        let cache = AccountListCache::new();
        let assets = AccountFilter {
            account_type: Some(AccountType::Asset),
            parent_only: false,
        };

        cache
            .get_or_load(AccountFilter::default(), || Ok::<_, ()>(Vec::new()))
            .unwrap();

        assert!(!cache.contains(&assets));
    }

    #[test]
    fn test_invalidate_all() {
        let cache = AccountListCache::new();
        cache
            .get_or_load(AccountFilter::default(), || Ok::<_, ()>(Vec::new()))
            .unwrap();

        cache.invalidate_all();

        assert!(!cache.contains(&AccountFilter::default()));
    }

    #[test]
    fn test_clones_share_storage() {
        let cache = AccountListCache::new();
        let clone = cache.clone();

        clone.insert(AccountFilter::default(), Vec::new(), clone.generation());
        assert!(cache.get(&AccountFilter::default()).is_some());

        cache.invalidate_all();
        assert!(clone.get(&AccountFilter::default()).is_none());
    }

    #[test]
    fn test_listing_read_before_invalidation_is_not_kept() {
        let cache = AccountListCache::new();
        let generation = cache.generation();
        cache.invalidate_all();

        let listing = cache.insert(AccountFilter::default(), Vec::new(), generation);

        assert!(listing.is_empty());
        assert!(!cache.contains(&AccountFilter::default()));
        assert_eq!(cache.generation(), generation + 1);
    }

    #[test]
    fn test_invalidation_during_load_is_not_overwritten() {
        let cache = AccountListCache::new();
        let result = cache.get_or_load(AccountFilter::default(), || {
            // An account mutation commits while the listing is being read.
            cache.invalidate_all();
            Ok::<_, ()>(Vec::new())
        });

        assert!(result.is_ok());
        assert!(!cache.contains(&AccountFilter::default()));

        cache
            .get_or_load(AccountFilter::default(), || Ok::<_, ()>(Vec::new()))
            .unwrap();
        assert!(cache.contains(&AccountFilter::default()));
    }

    #[test]
    fn test_loader_error_is_not_cached() {
        let cache = AccountListCache::new();
        let result = cache.get_or_load(AccountFilter::default(), || Err::<Vec<Account>, _>("boom"));

        assert_eq!(result.unwrap_err(), "boom");
        assert!(!cache.contains(&AccountFilter::default()));
    }
}
