//! Navigation way-points subscription.
//!
//! There is exactly one way-points channel, so every resuming application
//! queues on the same resource.

use crate::freeze::QueuePolicy;
use crate::handler::RevertSet;
use crate::shared::{SubscriptionHandler, SubscriptionScheme};
use resumption_messages::{builders, Directive};
use resumption_types::{ResourceKey, SavedSubscriptions};

#[derive(Debug)]
pub struct WayPoints;

impl SubscriptionScheme for WayPoints {
    const NAME: &'static str = "way_points";
    const POLICY: QueuePolicy = QueuePolicy::Shared;

    fn requested(saved: &SavedSubscriptions) -> Vec<ResourceKey> {
        if saved.way_points {
            vec![ResourceKey::way_points()]
        } else {
            Vec::new()
        }
    }

    fn reverted(keys: &RevertSet) -> Vec<ResourceKey> {
        Self::requested(&SavedSubscriptions {
            way_points: keys.way_points,
            ..Default::default()
        })
    }

    fn subscribe(_resource: &ResourceKey) -> Directive {
        builders::subscribe_way_points()
    }

    fn unsubscribe(_resource: &ResourceKey) -> Directive {
        builders::unsubscribe_way_points()
    }
}

pub type WayPointsResumptionHandler = SubscriptionHandler<WayPoints>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::{PendingResumptionHandler, ResumptionContext};
    use resumption_ledger::{CorrelationRegistry, RequestLedger};
    use resumption_messages::HmiResponse;
    use resumption_types::{AppId, FunctionId, ResultCode};
    use std::time::Duration;
    use tracing_test::traced_test;

    fn subscribed() -> SavedSubscriptions {
        SavedSubscriptions {
            way_points: true,
            ..Default::default()
        }
    }

    #[traced_test]
    #[test]
    fn test_retry_after_timeout_reaches_next_application() {
        let mut handler = WayPointsResumptionHandler::new();
        let mut ledger =
            RequestLedger::new(CorrelationRegistry::default(), Duration::from_secs(10));

        let mut ctx = ResumptionContext::new(&mut ledger);
        handler.process_resumption(AppId(1), &subscribed(), &mut ctx);
        handler.process_resumption(AppId(2), &subscribed(), &mut ctx);
        let (actions, _) = ctx.into_parts();
        let sent: Vec<_> = actions.iter().filter_map(|a| a.as_hmi_message()).collect();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].function(), FunctionId::NavigationSubscribeWayPoints);
        let key = sent[0].correlation_key().unwrap();

        // A timeout is a synthesized failure.
        let timeout = HmiResponse::negative(key, ResultCode::GenericError, "timed out");
        let mut ctx = ResumptionContext::new(&mut ledger);
        handler.on_response(&timeout, &mut ctx);
        let (actions, raised) = ctx.into_parts();
        let sent: Vec<_> = actions.iter().filter_map(|a| a.as_hmi_message()).collect();

        assert!(raised.is_empty());
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].app_id, AppId(2));
        assert!(handler.owns(&sent[0].correlation_key().unwrap()));
    }

    #[test]
    fn test_no_way_points_saved() {
        assert!(WayPoints::requested(&SavedSubscriptions::default()).is_empty());
        assert!(WayPoints::reverted(&RevertSet::default()).is_empty());
    }
}
