//! App service data subscriptions.
//!
//! Subscriptions are per application, so requests pass straight through:
//! the freeze queue never holds more than the outstanding request.

use crate::freeze::QueuePolicy;
use crate::handler::RevertSet;
use crate::shared::{SubscriptionHandler, SubscriptionScheme};
use resumption_messages::{builders, Directive};
use resumption_types::{ResourceKey, SavedSubscriptions};

#[derive(Debug)]
pub struct AppServices;

impl SubscriptionScheme for AppServices {
    const NAME: &'static str = "app_service";
    const POLICY: QueuePolicy = QueuePolicy::PassThrough;

    fn requested(saved: &SavedSubscriptions) -> Vec<ResourceKey> {
        saved
            .app_services
            .iter()
            .map(ResourceKey::app_service)
            .collect()
    }

    fn reverted(keys: &RevertSet) -> Vec<ResourceKey> {
        keys.app_services
            .iter()
            .map(ResourceKey::app_service)
            .collect()
    }

    fn subscribe(resource: &ResourceKey) -> Directive {
        builders::get_app_service_data(&resource.instance_id, true)
    }

    fn unsubscribe(resource: &ResourceKey) -> Directive {
        builders::get_app_service_data(&resource.instance_id, false)
    }
}

pub type AppServiceResumptionHandler = SubscriptionHandler<AppServices>;
