//! Correlation id issuance and ownership.

use crate::RegistryError;
use resumption_types::{AppId, CorrelationId, CorrelationKey};
use std::collections::{HashMap, HashSet};
use tracing::{debug, trace};

/// Issues correlation ids and maps outstanding keys to their consumer.
///
/// A key is *live* while it is registered to a consumer or reserved by a
/// pending-resumption handler (or both, when a handler sends a request on a
/// consumer's behalf). Issuance walks `first..=max`, wraps around, and never
/// returns an id that is live under any function.
#[derive(Debug)]
pub struct CorrelationRegistry {
    first: u32,
    max: u32,
    next: u32,
    /// key -> owning consumer
    owners: HashMap<CorrelationKey, AppId>,
    /// Keys awaited by a handler independently of any consumer.
    reserved: HashSet<CorrelationKey>,
    /// Reference count of live keys per raw id.
    live: HashMap<CorrelationId, usize>,
}

impl Default for CorrelationRegistry {
    fn default() -> Self {
        Self::new(1, u32::MAX)
    }
}

impl CorrelationRegistry {
    /// Create a registry issuing ids from `first` to `max` inclusive.
    pub fn new(first: u32, max: u32) -> Self {
        let max = max.max(first);
        Self {
            first,
            max,
            next: first,
            owners: HashMap::new(),
            reserved: HashSet::new(),
            live: HashMap::new(),
        }
    }

    /// Issue the next free correlation id.
    ///
    /// Returns `None` when every id in the range is live.
    pub fn new_correlation_id(&mut self) -> Option<CorrelationId> {
        let span = u64::from(self.max - self.first) + 1;
        if self.live.len() as u64 >= span {
            debug!(live = self.live.len(), "Correlation ids exhausted");
            return None;
        }

        // At most `live.len()` candidates can be skipped.
        for _ in 0..=self.live.len() {
            let candidate = CorrelationId(self.next);
            self.next = if self.next >= self.max {
                trace!(first = self.first, "Correlation id counter wrapped");
                self.first
            } else {
                self.next + 1
            };
            if !self.live.contains_key(&candidate) {
                return Some(candidate);
            }
            trace!(correlation_id = %candidate, "Skipping live correlation id");
        }
        None
    }

    /// Map `key` to the consumer awaiting its response.
    pub fn register(&mut self, key: CorrelationKey, app_id: AppId) -> Result<(), RegistryError> {
        if let Some(&owner) = self.owners.get(&key) {
            return Err(RegistryError::AlreadyRegistered { key, owner });
        }
        self.owners.insert(key, app_id);
        self.acquire(key.correlation_id);
        Ok(())
    }

    /// The consumer awaiting `key`, if any.
    pub fn resolve(&self, key: &CorrelationKey) -> Option<AppId> {
        self.owners.get(key).copied()
    }

    /// Forget the consumer mapping for `key`.
    pub fn unregister(&mut self, key: &CorrelationKey) -> Option<AppId> {
        let owner = self.owners.remove(key)?;
        self.drop_ref(key.correlation_id);
        Some(owner)
    }

    /// Mark `key` as awaited by a handler.
    pub fn reserve(&mut self, key: CorrelationKey) -> Result<(), RegistryError> {
        if !self.reserved.insert(key) {
            return Err(RegistryError::AlreadyReserved(key));
        }
        self.acquire(key.correlation_id);
        Ok(())
    }

    /// Release a handler reservation. Returns whether it existed.
    pub fn release(&mut self, key: &CorrelationKey) -> bool {
        if self.reserved.remove(key) {
            self.drop_ref(key.correlation_id);
            true
        } else {
            false
        }
    }

    pub fn is_reserved(&self, key: &CorrelationKey) -> bool {
        self.reserved.contains(key)
    }

    /// Whether `correlation_id` is live under any function.
    pub fn is_live(&self, correlation_id: CorrelationId) -> bool {
        self.live.contains_key(&correlation_id)
    }

    /// Number of keys registered to consumers.
    pub fn len(&self) -> usize {
        self.owners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.owners.is_empty()
    }

    fn acquire(&mut self, correlation_id: CorrelationId) {
        *self.live.entry(correlation_id).or_insert(0) += 1;
    }

    fn drop_ref(&mut self, correlation_id: CorrelationId) {
        if let Some(count) = self.live.get_mut(&correlation_id) {
            *count -= 1;
            if *count == 0 {
                self.live.remove(&correlation_id);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use resumption_types::FunctionId;
    use tracing_test::traced_test;

    fn key(cid: u32) -> CorrelationKey {
        CorrelationKey::new(FunctionId::UiAddSubMenu, CorrelationId(cid))
    }

    #[traced_test]
    #[test]
    fn test_register_resolve_unregister() {
        let mut registry = CorrelationRegistry::default();
        let cid = registry.new_correlation_id().unwrap();
        let k = CorrelationKey::new(FunctionId::UiAddSubMenu, cid);

        registry.register(k, AppId(1)).unwrap();
        assert_eq!(registry.resolve(&k), Some(AppId(1)));
        assert_eq!(
            registry.register(k, AppId(2)),
            Err(RegistryError::AlreadyRegistered {
                key: k,
                owner: AppId(1)
            })
        );

        assert_eq!(registry.unregister(&k), Some(AppId(1)));
        assert_eq!(registry.resolve(&k), None);
        assert_eq!(registry.unregister(&k), None);
        assert!(!registry.is_live(cid));
    }

    #[traced_test]
    #[test]
    fn test_ids_are_monotonic() {
        let mut registry = CorrelationRegistry::default();
        let a = registry.new_correlation_id().unwrap();
        let b = registry.new_correlation_id().unwrap();
        let c = registry.new_correlation_id().unwrap();
        assert_eq!((a.get(), b.get(), c.get()), (1, 2, 3));
    }

    #[traced_test]
    #[test]
    fn test_wraparound_skips_live_ids() {
        let mut registry = CorrelationRegistry::new(1, 3);
        let first = registry.new_correlation_id().unwrap();
        registry.register(key(first.get()), AppId(1)).unwrap();
        let second = registry.new_correlation_id().unwrap();
        registry.reserve(key(second.get())).unwrap();
        let third = registry.new_correlation_id().unwrap();
        assert_eq!(third, CorrelationId(3));

        // 1 and 2 are live, 3 was issued but never registered.
        assert_eq!(registry.new_correlation_id(), Some(CorrelationId(3)));

        registry.unregister(&key(1));
        assert_eq!(registry.new_correlation_id(), Some(CorrelationId(1)));
    }

    #[traced_test]
    #[test]
    fn test_exhaustion_returns_none() {
        let mut registry = CorrelationRegistry::new(10, 11);
        registry.register(key(10), AppId(1)).unwrap();
        registry.register(key(11), AppId(1)).unwrap();
        assert_eq!(registry.new_correlation_id(), None);

        registry.unregister(&key(11));
        assert_eq!(registry.new_correlation_id(), Some(CorrelationId(11)));
    }

    #[traced_test]
    #[test]
    fn test_registration_and_reservation_share_liveness() {
        let mut registry = CorrelationRegistry::default();
        let k = key(1);
        registry.register(k, AppId(1)).unwrap();
        registry.reserve(k).unwrap();
        assert_eq!(registry.reserve(k), Err(RegistryError::AlreadyReserved(k)));

        registry.unregister(&k);
        assert!(registry.is_live(k.correlation_id));
        assert!(registry.release(&k));
        assert!(!registry.is_live(k.correlation_id));
        assert!(!registry.release(&k));
    }
}
