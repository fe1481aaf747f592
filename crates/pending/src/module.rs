//! Remote-control module subscriptions.
//!
//! Each `(module type, module id)` pair is a shared resource: while one
//! application's `GetInteriorVehicleData(subscribe)` is outstanding for a
//! module, other applications resuming the same module are frozen behind it.

use crate::freeze::QueuePolicy;
use crate::handler::RevertSet;
use crate::shared::{SubscriptionHandler, SubscriptionScheme};
use resumption_messages::{builders, Directive};
use resumption_types::{ResourceKey, SavedSubscriptions};

/// Remote-control module subscription semantics.
#[derive(Debug)]
pub struct RemoteControlModules;

impl SubscriptionScheme for RemoteControlModules {
    const NAME: &'static str = "rc";
    const POLICY: QueuePolicy = QueuePolicy::Shared;

    fn requested(saved: &SavedSubscriptions) -> Vec<ResourceKey> {
        saved.modules.clone()
    }

    fn reverted(keys: &RevertSet) -> Vec<ResourceKey> {
        keys.modules.iter().cloned().collect()
    }

    fn subscribe(resource: &ResourceKey) -> Directive {
        builders::get_interior_vehicle_data(resource, true)
    }

    fn unsubscribe(resource: &ResourceKey) -> Directive {
        builders::get_interior_vehicle_data(resource, false)
    }
}

pub type ModuleResumptionHandler = SubscriptionHandler<RemoteControlModules>;
