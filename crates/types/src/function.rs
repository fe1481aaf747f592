//! HMI function identifiers and correlation keys.

use crate::CorrelationId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// HMI-side function identifier.
///
/// Only the functions that take part in resumption (restore directives and
/// their inverses) are modelled.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub enum FunctionId {
    UiAddSubMenu,
    UiDeleteSubMenu,
    UiAddCommand,
    UiDeleteCommand,
    VrAddCommand,
    VrDeleteCommand,
    UiSetGlobalProperties,
    TtsSetGlobalProperties,
    ButtonsOnButtonSubscription,
    VehicleInfoSubscribeVehicleData,
    VehicleInfoUnsubscribeVehicleData,
    RcGetInteriorVehicleData,
    NavigationSubscribeWayPoints,
    NavigationUnsubscribeWayPoints,
    AppServiceGetAppServiceData,
    UiCreateWindow,
    UiDeleteWindow,
}

impl FunctionId {
    /// Wire name of the function (`Interface.Function`).
    pub fn name(self) -> &'static str {
        match self {
            FunctionId::UiAddSubMenu => "UI.AddSubMenu",
            FunctionId::UiDeleteSubMenu => "UI.DeleteSubMenu",
            FunctionId::UiAddCommand => "UI.AddCommand",
            FunctionId::UiDeleteCommand => "UI.DeleteCommand",
            FunctionId::VrAddCommand => "VR.AddCommand",
            FunctionId::VrDeleteCommand => "VR.DeleteCommand",
            FunctionId::UiSetGlobalProperties => "UI.SetGlobalProperties",
            FunctionId::TtsSetGlobalProperties => "TTS.SetGlobalProperties",
            FunctionId::ButtonsOnButtonSubscription => "Buttons.OnButtonSubscription",
            FunctionId::VehicleInfoSubscribeVehicleData => "VehicleInfo.SubscribeVehicleData",
            FunctionId::VehicleInfoUnsubscribeVehicleData => {
                "VehicleInfo.UnsubscribeVehicleData"
            }
            FunctionId::RcGetInteriorVehicleData => "RC.GetInteriorVehicleData",
            FunctionId::NavigationSubscribeWayPoints => "Navigation.SubscribeWayPoints",
            FunctionId::NavigationUnsubscribeWayPoints => "Navigation.UnsubscribeWayPoints",
            FunctionId::AppServiceGetAppServiceData => "AppService.GetAppServiceData",
            FunctionId::UiCreateWindow => "UI.CreateWindow",
            FunctionId::UiDeleteWindow => "UI.DeleteWindow",
        }
    }

    /// Whether the HMI side of this function is a notification.
    ///
    /// Notifications never receive a response and are not tracked.
    pub fn is_notification(self) -> bool {
        matches!(self, FunctionId::ButtonsOnButtonSubscription)
    }
}

impl fmt::Display for FunctionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Identity of an outstanding HMI request: `(function, correlation id)`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct CorrelationKey {
    pub function: FunctionId,
    pub correlation_id: CorrelationId,
}

impl CorrelationKey {
    /// Create a new correlation key.
    pub fn new(function: FunctionId, correlation_id: CorrelationId) -> Self {
        Self {
            function,
            correlation_id,
        }
    }
}

impl fmt::Display for CorrelationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.function, self.correlation_id.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    #[test]
    fn test_correlation_key_ordering_is_total() {
        // Keys differing in either component must never compare equal.
        let a = CorrelationKey::new(FunctionId::UiAddCommand, CorrelationId(2));
        let b = CorrelationKey::new(FunctionId::VrAddCommand, CorrelationId(1));
        let c = CorrelationKey::new(FunctionId::UiAddCommand, CorrelationId(1));

        let set: BTreeSet<_> = [a, b, c].into_iter().collect();
        assert_eq!(set.len(), 3);
        assert!(c < a);
    }

    #[test]
    fn test_notification_functions() {
        assert!(FunctionId::ButtonsOnButtonSubscription.is_notification());
        assert!(!FunctionId::UiAddSubMenu.is_notification());
    }

    #[test]
    fn test_key_display() {
        let key = CorrelationKey::new(FunctionId::UiCreateWindow, CorrelationId(9));
        assert_eq!(key.to_string(), "UI.CreateWindow#9");
    }
}
