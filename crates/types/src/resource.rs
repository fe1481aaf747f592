//! Shared HMI resources that several applications may subscribe to.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identity of a shared HMI-side resource: `(type, instance id)`.
///
/// Used by the pending-subscription handlers to collapse concurrent
/// subscription requests for the same resource.
#[derive(
    Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct ResourceKey {
    pub resource_type: String,
    pub instance_id: String,
}

impl ResourceKey {
    /// Create a resource key from its parts.
    pub fn new(resource_type: impl Into<String>, instance_id: impl Into<String>) -> Self {
        Self {
            resource_type: resource_type.into(),
            instance_id: instance_id.into(),
        }
    }

    /// A remote-control module, e.g. `("CLIMATE", "2df6518c-...")`.
    pub fn module(module_type: impl Into<String>, module_id: impl Into<String>) -> Self {
        Self::new(module_type, module_id)
    }

    /// The navigation way-points channel. There is exactly one.
    pub fn way_points() -> Self {
        Self::new("WAY_POINTS", "")
    }

    /// The vehicle data channel. Individual data items are tracked per key
    /// by the vehicle data handler; the channel itself is a single resource.
    pub fn vehicle_data() -> Self {
        Self::new("VEHICLE_DATA", "")
    }

    /// An app service data stream of the given service type.
    pub fn app_service(service_type: impl Into<String>) -> Self {
        Self::new("APP_SERVICE", service_type)
    }
}

impl fmt::Display for ResourceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.instance_id.is_empty() {
            f.write_str(&self.resource_type)
        } else {
            write!(f, "{}/{}", self.resource_type, self.instance_id)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resource_key_identity() {
        let a = ResourceKey::module("CLIMATE", "front");
        let b = ResourceKey::module("CLIMATE", "rear");
        assert_ne!(a, b);
        assert_eq!(a, ResourceKey::new("CLIMATE", "front"));
        assert_eq!(a.to_string(), "CLIMATE/front");
        assert_eq!(ResourceKey::way_points().to_string(), "WAY_POINTS");
    }
}
