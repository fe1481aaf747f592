//! Directive builders for every saved-state category and its inverse.

use crate::{Directive, RequestParams};
use resumption_types::{
    ButtonName, CommandId, FunctionId, GlobalProperties, MenuId, ResourceKey, SavedChoiceSet,
    SavedCommand, SavedSubMenu, SavedWindow, VrCommandType, WindowId,
};

pub fn add_submenu(submenu: &SavedSubMenu) -> Directive {
    Directive::new(
        FunctionId::UiAddSubMenu,
        RequestParams::AddSubMenu {
            menu_id: submenu.menu_id,
            menu_name: submenu.menu_name.clone(),
            position: submenu.position,
            parent_id: submenu.parent_id,
        },
    )
}

pub fn delete_submenu(menu_id: MenuId) -> Directive {
    Directive::new(
        FunctionId::UiDeleteSubMenu,
        RequestParams::DeleteSubMenu { menu_id },
    )
}

/// UI and VR halves of a command. Either may be absent.
pub fn add_command(command: &SavedCommand) -> Vec<Directive> {
    let mut directives = Vec::with_capacity(2);
    if let Some(menu_params) = &command.menu_params {
        directives.push(Directive::new(
            FunctionId::UiAddCommand,
            RequestParams::AddUiCommand {
                cmd_id: command.cmd_id,
                menu_params: menu_params.clone(),
            },
        ));
    }
    if let Some(vr_commands) = command.vr_commands.as_ref().filter(|v| !v.is_empty()) {
        directives.push(Directive::new(
            FunctionId::VrAddCommand,
            RequestParams::AddVrCommand {
                cmd_id: command.cmd_id,
                vr_commands: vr_commands.clone(),
                command_type: VrCommandType::Command,
                grammar_id: None,
            },
        ));
    }
    directives
}

pub fn delete_ui_command(cmd_id: CommandId) -> Directive {
    Directive::new(
        FunctionId::UiDeleteCommand,
        RequestParams::DeleteUiCommand { cmd_id },
    )
}

pub fn delete_vr_command(
    cmd_id: CommandId,
    command_type: VrCommandType,
    grammar_id: Option<u32>,
) -> Directive {
    Directive::new(
        FunctionId::VrDeleteCommand,
        RequestParams::DeleteVrCommand {
            cmd_id,
            command_type,
            grammar_id,
        },
    )
}

/// One VR command per choice that carries voice commands.
pub fn add_choice_set(choice_set: &SavedChoiceSet) -> Vec<Directive> {
    choice_set
        .choices
        .iter()
        .filter_map(|choice| {
            let vr_commands = choice.vr_commands.as_ref().filter(|v| !v.is_empty())?;
            Some(Directive::new(
                FunctionId::VrAddCommand,
                RequestParams::AddVrCommand {
                    cmd_id: choice.choice_id,
                    vr_commands: vr_commands.clone(),
                    command_type: VrCommandType::Choice,
                    grammar_id: Some(choice_set.grammar_id),
                },
            ))
        })
        .collect()
}

/// UI half of the global properties, if any UI property is saved.
pub fn set_ui_global_properties(properties: &GlobalProperties) -> Option<Directive> {
    if !properties.has_ui_properties() {
        return None;
    }
    let ui_only = GlobalProperties {
        help_prompt: Vec::new(),
        timeout_prompt: Vec::new(),
        ..properties.clone()
    };
    Some(Directive::new(
        FunctionId::UiSetGlobalProperties,
        RequestParams::SetGlobalProperties {
            properties: ui_only,
        },
    ))
}

/// TTS half of the global properties, if any prompt is saved.
pub fn set_tts_global_properties(properties: &GlobalProperties) -> Option<Directive> {
    if !properties.has_tts_properties() {
        return None;
    }
    let tts_only = GlobalProperties {
        help_prompt: properties.help_prompt.clone(),
        timeout_prompt: properties.timeout_prompt.clone(),
        ..Default::default()
    };
    Some(Directive::new(
        FunctionId::TtsSetGlobalProperties,
        RequestParams::SetGlobalProperties {
            properties: tts_only,
        },
    ))
}

pub fn reset_global_properties(function: FunctionId) -> Directive {
    Directive::new(function, RequestParams::ResetGlobalProperties)
}

pub fn button_subscription(button: ButtonName, is_subscribed: bool) -> Directive {
    Directive::new(
        FunctionId::ButtonsOnButtonSubscription,
        RequestParams::ButtonSubscription {
            button,
            is_subscribed,
        },
    )
}

pub fn subscribe_vehicle_data<'a>(keys: impl IntoIterator<Item = &'a String>) -> Directive {
    Directive::new(
        FunctionId::VehicleInfoSubscribeVehicleData,
        RequestParams::SubscribeVehicleData {
            keys: keys.into_iter().cloned().collect(),
        },
    )
}

pub fn unsubscribe_vehicle_data<'a>(keys: impl IntoIterator<Item = &'a String>) -> Directive {
    Directive::new(
        FunctionId::VehicleInfoUnsubscribeVehicleData,
        RequestParams::UnsubscribeVehicleData {
            keys: keys.into_iter().cloned().collect(),
        },
    )
}

pub fn get_interior_vehicle_data(module: &ResourceKey, subscribe: bool) -> Directive {
    Directive::new(
        FunctionId::RcGetInteriorVehicleData,
        RequestParams::GetInteriorVehicleData {
            module: module.clone(),
            subscribe,
        },
    )
}

pub fn subscribe_way_points() -> Directive {
    Directive::new(
        FunctionId::NavigationSubscribeWayPoints,
        RequestParams::SubscribeWayPoints,
    )
}

pub fn unsubscribe_way_points() -> Directive {
    Directive::new(
        FunctionId::NavigationUnsubscribeWayPoints,
        RequestParams::UnsubscribeWayPoints,
    )
}

pub fn get_app_service_data(service_type: &str, subscribe: bool) -> Directive {
    Directive::new(
        FunctionId::AppServiceGetAppServiceData,
        RequestParams::GetAppServiceData {
            service_type: service_type.to_string(),
            subscribe,
        },
    )
}

pub fn create_window(window: &SavedWindow) -> Directive {
    Directive::new(
        FunctionId::UiCreateWindow,
        RequestParams::CreateWindow {
            window: window.clone(),
        },
    )
}

pub fn delete_window(window_id: WindowId) -> Directive {
    Directive::new(
        FunctionId::UiDeleteWindow,
        RequestParams::DeleteWindow { window_id },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use resumption_types::{ChoiceSetId, MenuParams, SavedChoice};

    #[test]
    fn test_command_halves() {
        let both = SavedCommand {
            cmd_id: CommandId(1),
            menu_params: Some(MenuParams {
                menu_name: "Play".into(),
                parent_id: None,
                position: None,
            }),
            vr_commands: Some(vec!["play".into()]),
        };
        let functions: Vec<_> = add_command(&both).iter().map(|d| d.function).collect();
        assert_eq!(
            functions,
            vec![FunctionId::UiAddCommand, FunctionId::VrAddCommand]
        );

        let vr_empty = SavedCommand {
            vr_commands: Some(vec![]),
            ..both
        };
        assert_eq!(add_command(&vr_empty).len(), 1);
    }

    #[test]
    fn test_choice_set_skips_choices_without_voice() {
        let choice_set = SavedChoiceSet {
            choice_set_id: ChoiceSetId(4),
            grammar_id: 77,
            choices: vec![
                SavedChoice {
                    choice_id: CommandId(10),
                    menu_name: "Yes".into(),
                    vr_commands: Some(vec!["yes".into()]),
                },
                SavedChoice {
                    choice_id: CommandId(11),
                    menu_name: "No".into(),
                    vr_commands: None,
                },
            ],
        };
        let directives = add_choice_set(&choice_set);
        assert_eq!(directives.len(), 1);
        assert_eq!(
            directives[0].params,
            RequestParams::AddVrCommand {
                cmd_id: CommandId(10),
                vr_commands: vec!["yes".into()],
                command_type: VrCommandType::Choice,
                grammar_id: Some(77),
            }
        );
    }

    #[test]
    fn test_global_properties_split() {
        let properties = GlobalProperties {
            help_prompt: vec!["help".into()],
            menu_title: Some("Menu".into()),
            ..Default::default()
        };

        let ui = set_ui_global_properties(&properties).unwrap();
        let RequestParams::SetGlobalProperties { properties: ui_props } = ui.params else {
            panic!("unexpected params");
        };
        assert!(ui_props.help_prompt.is_empty());
        assert_eq!(ui_props.menu_title.as_deref(), Some("Menu"));

        let tts = set_tts_global_properties(&properties).unwrap();
        assert_eq!(tts.function, FunctionId::TtsSetGlobalProperties);

        assert!(set_tts_global_properties(&GlobalProperties::default()).is_none());
    }
}
