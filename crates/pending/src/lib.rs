//! Pending subscription resumption.
//!
//! Several applications resuming at once may ask the HMI for the same
//! resource. The handlers here send one request per resource, freeze the
//! rest, and answer the frozen waiters from the single response.

mod app_service;
mod freeze;
mod handler;
mod module;
mod shared;
mod subscriptions;
mod vehicle_data;
mod way_points;

pub use app_service::{AppServiceResumptionHandler, AppServices};
pub use freeze::{Admission, ClearedEntries, FreezeQueue, QueuePolicy, ResolvedEntry, Waiter};
pub use handler::{PendingResumptionHandler, ResumptionContext, RevertSet};
pub use module::{ModuleResumptionHandler, RemoteControlModules};
pub use shared::{SubscriptionHandler, SubscriptionScheme};
pub use subscriptions::SubscriptionIndex;
pub use vehicle_data::{VehicleDataPendingResumption, VehicleDataResumptionHandler};
pub use way_points::{WayPoints, WayPointsResumptionHandler};
