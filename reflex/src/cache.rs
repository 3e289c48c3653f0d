//! Resolution cache.
//!
//! Memoizes resolution outcomes by (type, rule set identity). Population
//! of a key is serialized: concurrent callers for the same key block on a
//! per-key cell while exactly one of them computes, then all of them read
//! the same shared snapshot. Populated entries are never rewritten.
//!
//! Each entry holds a weak reference to its rule set. Once every clone of
//! a rule set is dropped its entries can no longer be hit, and they are
//! pruned the next time the table grows past its prune threshold.

use std::sync::{Arc, OnceLock};

use parking_lot::RwLock;
use rustc_hash::FxHashMap;

use crate::result::ResolutionResult;
use crate::rules::{RuleSet, RuleSetId, RuleSetLiveness};
use crate::types::TypeRef;

/// Table size below which dead entries are left in place.
const MIN_PRUNE_THRESHOLD: usize = 64;

/// Cache key: the searched type and the rule set's identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub ty: TypeRef,
    pub rules: RuleSetId,
}

impl CacheKey {
    pub fn new(ty: &TypeRef, rules: &RuleSet) -> Self {
        Self {
            ty: ty.clone(),
            rules: rules.id(),
        }
    }
}

type Slot = Arc<OnceLock<Arc<ResolutionResult>>>;

#[derive(Debug)]
struct Entry {
    owner: RuleSetLiveness,
    slot: Slot,
}

#[derive(Debug, Default)]
struct Slots {
    entries: FxHashMap<CacheKey, Entry>,
    prune_at: usize,
}

impl Slots {
    fn prune(&mut self) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, entry| entry.owner.is_alive());
        self.prune_at = (self.entries.len() * 2).max(MIN_PRUNE_THRESHOLD);
        before - self.entries.len()
    }
}

/// First-writer-wins memo of resolution results.
#[derive(Debug, Default)]
pub struct ResolutionCache {
    slots: RwLock<Slots>,
}

impl ResolutionCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached result for `rules` against `ty`, computing it with
    /// `resolve` on a miss. `resolve` runs at most once per key.
    pub fn get_or_resolve<F>(
        &self,
        ty: &TypeRef,
        rules: &RuleSet,
        resolve: F,
    ) -> Arc<ResolutionResult>
    where
        F: FnOnce() -> ResolutionResult,
    {
        let slot = self.slot(CacheKey::new(ty, rules), rules);
        Arc::clone(slot.get_or_init(|| Arc::new(resolve())))
    }

    /// The cached result for `key`, if already populated.
    pub fn get(&self, key: &CacheKey) -> Option<Arc<ResolutionResult>> {
        self.slots
            .read()
            .entries
            .get(key)
            .and_then(|entry| entry.slot.get().cloned())
    }

    /// Number of populated entries, including dead ones not yet pruned.
    pub fn len(&self) -> usize {
        self.slots
            .read()
            .entries
            .values()
            .filter(|entry| entry.slot.get().is_some())
            .count()
    }

    /// Whether no entry is populated.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop entries whose rule set is gone. Returns how many were removed.
    pub fn prune(&self) -> usize {
        let removed = self.slots.write().prune();
        if removed > 0 {
            tracing::trace!(target: "reflex", removed, "pruned dead cache entries");
        }
        removed
    }

    /// Drop every entry. Results already handed out stay valid.
    pub fn clear(&self) {
        let mut slots = self.slots.write();
        slots.entries.clear();
        slots.prune_at = 0;
    }

    fn slot(&self, key: CacheKey, rules: &RuleSet) -> Slot {
        if let Some(entry) = self.slots.read().entries.get(&key) {
            return Arc::clone(&entry.slot);
        }

        let mut slots = self.slots.write();
        let threshold = slots.prune_at.max(MIN_PRUNE_THRESHOLD);
        if !slots.entries.contains_key(&key) && slots.entries.len() >= threshold {
            slots.prune();
        }
        let entry = slots.entries.entry(key).or_insert_with(|| Entry {
            owner: rules.liveness(),
            slot: Slot::default(),
        });
        Arc::clone(&entry.slot)
    }
}
