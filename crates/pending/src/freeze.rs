//! Per-resource freeze queue.
//!
//! At most one request per resource is outstanding at the HMI. Other
//! consumers asking for the same resource meanwhile are *frozen*: recorded,
//! not sent. When the outstanding request resolves, a success is replayed to
//! every frozen waiter and a failure promotes exactly one of them.

use indexmap::IndexMap;
use resumption_messages::HmiMessage;
use resumption_types::{AppId, CorrelationKey, ResourceKey};
use std::collections::{HashMap, VecDeque};

/// How requests for the same resource from different consumers interact.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueuePolicy {
    /// One outstanding request per resource across all consumers.
    Shared,
    /// Every consumer gets its own slot, so nothing is ever frozen.
    PassThrough,
}

/// A consumer waiting on a resource, with the request it would send.
#[derive(Debug, Clone, PartialEq)]
pub struct Waiter {
    pub app_id: AppId,
    /// The consumer's own correlation key. Replays are addressed to it.
    pub key: CorrelationKey,
    pub message: HmiMessage,
}

/// Result of [`FreezeQueue::request_subscription`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// Nothing was outstanding; the caller must send the request.
    Dispatch,
    /// Another request is outstanding; the waiter was queued.
    Frozen,
    /// The consumer already waits on this resource.
    Duplicate,
}

/// What to do after the outstanding request for a resource resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedEntry {
    pub resource: ResourceKey,
    pub outstanding: Waiter,
    /// The outstanding consumer went away before the response.
    pub orphaned: bool,
    /// Frozen waiters satisfied by a successful response.
    pub replay_to: Vec<Waiter>,
    /// Frozen waiter promoted after a failure. The caller must send it.
    pub promoted: Option<Waiter>,
}

/// Everything dropped by [`FreezeQueue::clear`].
#[derive(Debug, Default)]
pub struct ClearedEntries {
    pub outstanding: Vec<Waiter>,
    pub frozen: Vec<Waiter>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct Slot {
    /// Set only under [`QueuePolicy::PassThrough`].
    owner: Option<AppId>,
    resource: ResourceKey,
}

#[derive(Debug)]
struct FreezeEntry {
    outstanding: Waiter,
    orphaned: bool,
    frozen: VecDeque<Waiter>,
}

impl FreezeEntry {
    fn has_consumer(&self, app_id: AppId) -> bool {
        (self.outstanding.app_id == app_id && !self.orphaned)
            || self.frozen.iter().any(|w| w.app_id == app_id)
    }
}

/// Freeze queues for every resource a handler owns.
#[derive(Debug)]
pub struct FreezeQueue {
    policy: QueuePolicy,
    /// Insertion-ordered so teardown follows request order.
    entries: IndexMap<Slot, FreezeEntry>,
    /// Outstanding correlation key -> slot.
    by_key: HashMap<CorrelationKey, Slot>,
}

impl FreezeQueue {
    pub fn new(policy: QueuePolicy) -> Self {
        Self {
            policy,
            entries: IndexMap::new(),
            by_key: HashMap::new(),
        }
    }

    pub fn policy(&self) -> QueuePolicy {
        self.policy
    }

    fn slot(&self, app_id: AppId, resource: ResourceKey) -> Slot {
        let owner = match self.policy {
            QueuePolicy::Shared => None,
            QueuePolicy::PassThrough => Some(app_id),
        };
        Slot { owner, resource }
    }

    /// Admit `waiter` for `resource`.
    pub fn request_subscription(&mut self, resource: ResourceKey, waiter: Waiter) -> Admission {
        let slot = self.slot(waiter.app_id, resource);
        match self.entries.get_mut(&slot) {
            None => {
                self.by_key.insert(waiter.key, slot.clone());
                self.entries.insert(
                    slot,
                    FreezeEntry {
                        outstanding: waiter,
                        orphaned: false,
                        frozen: VecDeque::new(),
                    },
                );
                Admission::Dispatch
            }
            Some(entry) if entry.has_consumer(waiter.app_id) => Admission::Duplicate,
            Some(entry) => {
                entry.frozen.push_back(waiter);
                Admission::Frozen
            }
        }
    }

    /// Whether `app_id` is outstanding or frozen on `resource`.
    pub fn is_pending(&self, app_id: AppId, resource: &ResourceKey) -> bool {
        let slot = self.slot(app_id, resource.clone());
        self.entries
            .get(&slot)
            .is_some_and(|entry| entry.has_consumer(app_id))
    }

    /// Whether `key` is an outstanding request of this queue.
    pub fn owns(&self, key: &CorrelationKey) -> bool {
        self.by_key.contains_key(key)
    }

    /// Number of frozen waiters on `resource` across all slots.
    pub fn frozen_len(&self, resource: &ResourceKey) -> usize {
        self.entries
            .iter()
            .filter(|(slot, _)| &slot.resource == resource)
            .map(|(_, entry)| entry.frozen.len())
            .sum()
    }

    /// Apply the outcome of the outstanding request `key`.
    pub fn on_outstanding_resolved(
        &mut self,
        key: &CorrelationKey,
        success: bool,
    ) -> Option<ResolvedEntry> {
        let slot = self.by_key.remove(key)?;

        if success {
            let entry = self.entries.shift_remove(&slot)?;
            return Some(ResolvedEntry {
                resource: slot.resource,
                outstanding: entry.outstanding,
                orphaned: entry.orphaned,
                replay_to: entry.frozen.into(),
                promoted: None,
            });
        }

        let entry = self.entries.get_mut(&slot)?;
        match entry.frozen.pop_front() {
            Some(next) => {
                self.by_key.insert(next.key, slot.clone());
                let previous = std::mem::replace(&mut entry.outstanding, next.clone());
                let orphaned = std::mem::replace(&mut entry.orphaned, false);
                Some(ResolvedEntry {
                    resource: slot.resource,
                    outstanding: previous,
                    orphaned,
                    replay_to: Vec::new(),
                    promoted: Some(next),
                })
            }
            None => {
                let entry = self.entries.shift_remove(&slot)?;
                Some(ResolvedEntry {
                    resource: slot.resource,
                    outstanding: entry.outstanding,
                    orphaned: entry.orphaned,
                    replay_to: Vec::new(),
                    promoted: None,
                })
            }
        }
    }

    /// Keys of the requests `app_id` has outstanding, orphaned ones excluded.
    pub fn outstanding_keys(&self, app_id: AppId) -> Vec<CorrelationKey> {
        self.entries
            .values()
            .filter(|entry| entry.outstanding.app_id == app_id && !entry.orphaned)
            .map(|entry| entry.outstanding.key)
            .collect()
    }

    /// Forget `app_id`'s frozen waiters and return them.
    ///
    /// An outstanding request of `app_id` stays in flight, marked orphaned,
    /// so its response still drives the other waiters.
    pub fn remove_consumer(&mut self, app_id: AppId) -> Vec<Waiter> {
        let mut removed = Vec::new();
        for entry in self.entries.values_mut() {
            if entry.outstanding.app_id == app_id {
                entry.orphaned = true;
            }
            let (gone, kept): (VecDeque<Waiter>, VecDeque<Waiter>) = entry
                .frozen
                .drain(..)
                .partition(|w| w.app_id == app_id);
            entry.frozen = kept;
            removed.extend(gone);
        }
        removed
    }

    /// Drop every entry.
    pub fn clear(&mut self) -> ClearedEntries {
        self.by_key.clear();
        let mut cleared = ClearedEntries::default();
        for (_, entry) in self.entries.drain(..) {
            cleared.outstanding.push(entry.outstanding);
            cleared.frozen.extend(entry.frozen);
        }
        cleared
    }

    /// Number of resources with an outstanding request.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
