//! Saved application state fixtures.

use resumption_types::{
    ButtonName, ChoiceSetId, CommandId, GlobalProperties, MenuId, MenuParams, ResourceKey,
    SavedApplication, SavedChoice, SavedChoiceSet, SavedCommand, SavedFile, SavedSubMenu,
    SavedSubscriptions, SavedWindow, WindowId, WindowType,
};

pub fn submenu(id: u32) -> SavedSubMenu {
    SavedSubMenu {
        menu_id: MenuId(id),
        menu_name: format!("Menu {id}"),
        position: None,
        parent_id: None,
    }
}

/// A command with both a UI and a VR half.
pub fn command(id: u32) -> SavedCommand {
    SavedCommand {
        cmd_id: CommandId(id),
        menu_params: Some(MenuParams {
            menu_name: format!("Command {id}"),
            parent_id: None,
            position: None,
        }),
        vr_commands: Some(vec![format!("command {id}")]),
    }
}

/// A choice set whose choices all carry voice commands.
pub fn choice_set(id: u32, choice_ids: &[u32]) -> SavedChoiceSet {
    SavedChoiceSet {
        choice_set_id: ChoiceSetId(id),
        grammar_id: 1000 + id,
        choices: choice_ids
            .iter()
            .map(|choice| SavedChoice {
                choice_id: CommandId(*choice),
                menu_name: format!("Choice {choice}"),
                vr_commands: Some(vec![format!("choice {choice}")]),
            })
            .collect(),
    }
}

/// Global properties with both halves set.
pub fn global_properties() -> GlobalProperties {
    GlobalProperties {
        help_prompt: vec!["Say a command".into()],
        timeout_prompt: vec!["Please try again".into()],
        menu_title: Some("Apps".into()),
        ..Default::default()
    }
}

pub fn widget(id: i32) -> SavedWindow {
    SavedWindow {
        window_id: WindowId(id),
        window_name: format!("Widget {id}"),
        window_type: WindowType::Widget,
        associated_service_type: None,
        duplicate_updates_from_window_id: None,
    }
}

pub fn persistent_file(name: &str) -> SavedFile {
    SavedFile {
        file_name: name.to_string(),
        file_type: "GRAPHIC_PNG".into(),
        persistent: true,
        is_download_complete: true,
    }
}

pub fn climate_module() -> ResourceKey {
    ResourceKey::module("CLIMATE", "climate-1")
}

/// Saved state holding only subscriptions.
pub fn subscriptions_only(subscriptions: SavedSubscriptions) -> SavedApplication {
    SavedApplication {
        subscriptions: Some(subscriptions),
        ..Default::default()
    }
}

/// Saved state holding one remote-control module subscription.
pub fn module_subscription(module: ResourceKey) -> SavedApplication {
    subscriptions_only(SavedSubscriptions {
        modules: vec![module],
        ..Default::default()
    })
}

/// Saved state holding vehicle data subscriptions.
pub fn vehicle_data_subscription(items: &[&str]) -> SavedApplication {
    subscriptions_only(SavedSubscriptions {
        vehicle_data: items.iter().map(|item| item.to_string()).collect(),
        ..Default::default()
    })
}

/// Saved state exercising every restore step.
pub fn full_application() -> SavedApplication {
    SavedApplication {
        files: Some(vec![persistent_file("icon.png")]),
        submenus: Some(vec![submenu(1)]),
        commands: Some(vec![command(10)]),
        choice_sets: Some(vec![choice_set(20, &[21])]),
        global_properties: Some(global_properties()),
        subscriptions: Some(SavedSubscriptions {
            buttons: vec![ButtonName::Ok, ButtonName::CustomButton],
            vehicle_data: vec!["gps".into()],
            modules: vec![climate_module()],
            way_points: true,
            app_services: vec!["MEDIA".into()],
        }),
        windows: Some(vec![widget(2)]),
    }
}
