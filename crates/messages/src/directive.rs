//! Outbound directives and the HMI messages built from them.

use resumption_types::{
    AppId, ButtonName, CommandId, CorrelationId, CorrelationKey, FunctionId, GlobalProperties,
    MenuId, MenuParams, ResourceKey, SavedWindow, VrCommandType, WindowId,
};
use serde::{Deserialize, Serialize};

/// Whether the HMI answers a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MessageKind {
    /// Answered by exactly one response carrying the same correlation id.
    Request,
    /// Fire-and-forget; never tracked.
    Notification,
}

/// Function-specific parameters of a directive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RequestParams {
    AddSubMenu {
        menu_id: MenuId,
        menu_name: String,
        position: Option<u32>,
        parent_id: Option<MenuId>,
    },
    DeleteSubMenu {
        menu_id: MenuId,
    },
    AddUiCommand {
        cmd_id: CommandId,
        menu_params: MenuParams,
    },
    DeleteUiCommand {
        cmd_id: CommandId,
    },
    AddVrCommand {
        cmd_id: CommandId,
        vr_commands: Vec<String>,
        command_type: VrCommandType,
        grammar_id: Option<u32>,
    },
    DeleteVrCommand {
        cmd_id: CommandId,
        command_type: VrCommandType,
        grammar_id: Option<u32>,
    },
    SetGlobalProperties {
        properties: GlobalProperties,
    },
    /// Restores the HMI defaults for the half named by the function id.
    ResetGlobalProperties,
    ButtonSubscription {
        button: ButtonName,
        is_subscribed: bool,
    },
    SubscribeVehicleData {
        keys: Vec<String>,
    },
    UnsubscribeVehicleData {
        keys: Vec<String>,
    },
    GetInteriorVehicleData {
        module: ResourceKey,
        subscribe: bool,
    },
    SubscribeWayPoints,
    UnsubscribeWayPoints,
    GetAppServiceData {
        service_type: String,
        subscribe: bool,
    },
    CreateWindow {
        window: SavedWindow,
    },
    DeleteWindow {
        window_id: WindowId,
    },
}

/// A message synthesized from saved state, not yet addressed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Directive {
    pub function: FunctionId,
    pub params: RequestParams,
}

impl Directive {
    pub fn new(function: FunctionId, params: RequestParams) -> Self {
        Self { function, params }
    }

    /// Whether the HMI will answer this directive.
    pub fn kind(&self) -> MessageKind {
        if self.function.is_notification() {
            MessageKind::Notification
        } else {
            MessageKind::Request
        }
    }

    /// Address the directive to the HMI on behalf of `app_id`.
    pub fn into_message(self, app_id: AppId, correlation_id: Option<CorrelationId>) -> HmiMessage {
        HmiMessage {
            app_id,
            correlation_id,
            kind: self.kind(),
            directive: self,
        }
    }
}

/// An addressed directive handed to the transport.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HmiMessage {
    pub app_id: AppId,
    /// Absent for notifications and for requests sent when no id was free.
    pub correlation_id: Option<CorrelationId>,
    pub kind: MessageKind,
    pub directive: Directive,
}

impl HmiMessage {
    pub fn function(&self) -> FunctionId {
        self.directive.function
    }

    /// The key a response to this message will carry.
    pub fn correlation_key(&self) -> Option<CorrelationKey> {
        self.correlation_id
            .map(|cid| CorrelationKey::new(self.directive.function, cid))
    }

    pub fn params(&self) -> &RequestParams {
        &self.directive.params
    }
}
