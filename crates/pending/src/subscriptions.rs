//! Which consumers hold which shared subscriptions.

use resumption_types::AppId;
use std::collections::{BTreeSet, HashMap};
use std::hash::Hash;

/// Tracks applied subscriptions per consumer.
///
/// Maintains a bidirectional index so both questions are cheap:
///
/// 1. Which resources does a consumer hold? (consumer teardown)
/// 2. Does anyone else still hold a resource? (whether reverting one
///    consumer must unsubscribe on the HMI)
#[derive(Debug)]
pub struct SubscriptionIndex<R> {
    /// consumer -> resources it holds
    resources_by_consumer: HashMap<AppId, BTreeSet<R>>,
    /// Reverse index: resource -> consumers holding it
    holders: HashMap<R, BTreeSet<AppId>>,
}

impl<R> Default for SubscriptionIndex<R> {
    fn default() -> Self {
        Self {
            resources_by_consumer: HashMap::new(),
            holders: HashMap::new(),
        }
    }
}

impl<R: Clone + Eq + Hash + Ord> SubscriptionIndex<R> {
    /// Create a new empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that `app_id` holds `resource`.
    pub fn add(&mut self, app_id: AppId, resource: R) {
        self.holders
            .entry(resource.clone())
            .or_default()
            .insert(app_id);
        self.resources_by_consumer
            .entry(app_id)
            .or_default()
            .insert(resource);
    }

    /// Forget that `app_id` holds `resource`.
    ///
    /// Returns `true` when `app_id` was the last holder. A consumer that did
    /// not hold `resource` releases nothing.
    pub fn remove(&mut self, app_id: AppId, resource: &R) -> bool {
        if let Some(resources) = self.resources_by_consumer.get_mut(&app_id) {
            resources.remove(resource);
            if resources.is_empty() {
                self.resources_by_consumer.remove(&app_id);
            }
        }
        let Some(apps) = self.holders.get_mut(resource) else {
            return false;
        };
        if !apps.remove(&app_id) {
            return false;
        }
        if apps.is_empty() {
            self.holders.remove(resource);
        }
        !self.holders.contains_key(resource)
    }

    /// Forget every resource `app_id` holds.
    ///
    /// Returns the resources nobody holds any more.
    pub fn remove_consumer(&mut self, app_id: AppId) -> Vec<R> {
        let Some(resources) = self.resources_by_consumer.remove(&app_id) else {
            return Vec::new();
        };
        let mut released = Vec::new();
        for resource in resources {
            if let Some(apps) = self.holders.get_mut(&resource) {
                apps.remove(&app_id);
                if apps.is_empty() {
                    self.holders.remove(&resource);
                    released.push(resource);
                }
            }
        }
        released
    }

    /// Whether any consumer holds `resource`.
    pub fn is_held(&self, resource: &R) -> bool {
        self.holders.contains_key(resource)
    }

    pub fn holds(&self, app_id: AppId, resource: &R) -> bool {
        self.holders
            .get(resource)
            .is_some_and(|apps| apps.contains(&app_id))
    }

    /// Consumers holding `resource`.
    pub fn holders(&self, resource: &R) -> Option<&BTreeSet<AppId>> {
        self.holders.get(resource)
    }

    /// Resources `app_id` holds.
    pub fn resources_of(&self, app_id: AppId) -> Option<&BTreeSet<R>> {
        self.resources_by_consumer.get(&app_id)
    }

    /// Number of held resources.
    pub fn len(&self) -> usize {
        self.holders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.holders.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_basic() {
        let mut index = SubscriptionIndex::new();
        index.add(AppId(1), "gps".to_string());
        index.add(AppId(1), "speed".to_string());
        index.add(AppId(2), "gps".to_string());

        // Check forward lookups
        assert_eq!(index.resources_of(AppId(1)).map(|r| r.len()), Some(2));
        assert!(index.holds(AppId(2), &"gps".to_string()));

        // Check reverse lookups
        assert_eq!(
            index.holders(&"gps".to_string()),
            Some(&[AppId(1), AppId(2)].into_iter().collect())
        );

        // gps is still held by App(2)
        assert!(!index.remove(AppId(1), &"gps".to_string()));
        assert!(index.is_held(&"gps".to_string()));

        // speed was only held by App(1)
        assert!(index.remove(AppId(1), &"speed".to_string()));
        assert!(index.resources_of(AppId(1)).is_none());
    }

    #[test]
    fn test_remove_by_non_holder_releases_nothing() {
        let mut index = SubscriptionIndex::new();
        index.add(AppId(1), "gps".to_string());

        assert!(!index.remove(AppId(2), &"gps".to_string()));
        assert!(!index.remove(AppId(2), &"rpm".to_string()));
        assert!(index.holds(AppId(1), &"gps".to_string()));

        assert!(index.remove(AppId(1), &"gps".to_string()));
        assert!(!index.remove(AppId(1), &"gps".to_string()));
    }

    #[test]
    fn test_remove_consumer_reports_released() {
        let mut index = SubscriptionIndex::new();
        index.add(AppId(1), "gps".to_string());
        index.add(AppId(1), "rpm".to_string());
        index.add(AppId(2), "gps".to_string());

        assert_eq!(index.remove_consumer(AppId(1)), vec!["rpm".to_string()]);
        assert!(index.is_held(&"gps".to_string()));
        assert!(index.remove_consumer(AppId(1)).is_empty());
        assert_eq!(index.len(), 1);
    }
}
