//! Actions panel on the right side of the inspector.
//! Hosts the command menu.

use bevy::ecs::hierarchy::ChildSpawnerCommands;
use bevy::prelude::*;
use bevy::ui::Val::*;

use crate::inspector::config::InspectorConfig;
use crate::widget_tree::WidgetId;

use super::detail_panel::spawn_scroll_area;
use super::mirror::MirrorRoot;

/// Spawns the actions panel; its content mirrors the widget `root`.
pub fn spawn_actions_panel(
    parent: &mut ChildSpawnerCommands<'_>,
    config: &InspectorConfig,
    root: WidgetId,
) {
    parent
        .spawn((
            Node {
                width: config.actions_panel_width,
                height: Percent(100.0),
                display: Display::Flex,
                flex_direction: FlexDirection::Column,
                border: UiRect::all(Px(1.0)),
                ..default()
            },
            BorderColor::all(config.border_color),
        ))
        .with_children(|panel| {
            spawn_scroll_area(panel, config, MirrorRoot(root));
        });
}
