//! Caller-owned cache for stitched statements.
//!
//! The engine itself is stateless; callers rendering the same filings
//! repeatedly can hold a [`StitchCache`] keyed by the stitching request
//! parameters. Entries are cloned on get, and nothing expires: the inputs
//! are immutable filings, so an entry only becomes wrong when the filing set
//! changes, at which point the caller clears the cache.

use quilt_core::{StatementType, StitchedStatement};
use std::collections::HashMap;
use tracing::debug;

/// Key identifying one stitching request.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StitchKey {
    /// Statement kind that was stitched
    pub statement_type: StatementType,
    /// Period cap used
    pub max_periods: usize,
    /// Whether standardization was applied
    pub standardize: bool,
    /// Whether periods came from the optimal-period selector
    pub use_optimal_periods: bool,
}

/// In-memory map from stitching parameters to stitched statements.
///
/// # Examples
///
/// ```
/// use quilt::{StitchCache, StitchKey};
/// use quilt_core::{StatementType, StitchedStatement};
///
/// let mut cache = StitchCache::new();
/// let key = StitchKey {
///     statement_type: StatementType::BalanceSheet,
///     max_periods: 8,
///     standardize: false,
///     use_optimal_periods: true,
/// };
/// cache.insert(key.clone(), StitchedStatement::default());
/// assert!(cache.get(&key).is_some());
/// ```
#[derive(Debug, Default)]
pub struct StitchCache {
    entries: HashMap<StitchKey, StitchedStatement>,
}

impl StitchCache {
    /// Create an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a cached statement.
    pub fn get(&self, key: &StitchKey) -> Option<StitchedStatement> {
        let hit = self.entries.get(key).cloned();
        debug!(?key, hit = hit.is_some(), "stitch cache lookup");
        hit
    }

    /// Store a stitched statement, replacing any previous entry.
    pub fn insert(&mut self, key: StitchKey, statement: StitchedStatement) {
        self.entries.insert(key, statement);
    }

    /// Fetch from the cache or compute and store.
    pub fn get_or_insert_with<F>(&mut self, key: StitchKey, compute: F) -> StitchedStatement
    where
        F: FnOnce() -> StitchedStatement,
    {
        self.entries.entry(key).or_insert_with(compute).clone()
    }

    /// Number of cached statements.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true when nothing is cached.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop all entries, e.g. after the underlying filing set changed.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(max_periods: usize) -> StitchKey {
        StitchKey {
            statement_type: StatementType::BalanceSheet,
            max_periods,
            standardize: false,
            use_optimal_periods: true,
        }
    }

    #[test]
    fn test_miss_then_hit() {
        let mut cache = StitchCache::new();
        assert!(cache.get(&key(8)).is_none());

        cache.insert(key(8), StitchedStatement::default());
        assert!(cache.get(&key(8)).is_some());
        // Different parameters are a different entry.
        assert!(cache.get(&key(3)).is_none());
    }

    #[test]
    fn test_get_or_insert_with_computes_once() {
        let mut cache = StitchCache::new();
        let mut calls = 0;
        for _ in 0..2 {
            cache.get_or_insert_with(key(8), || {
                calls += 1;
                StitchedStatement::default()
            });
        }
        assert_eq!(calls, 1);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_clear() {
        let mut cache = StitchCache::new();
        cache.insert(key(8), StitchedStatement::default());
        cache.clear();
        assert!(cache.is_empty());
    }
}
