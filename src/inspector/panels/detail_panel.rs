//! Detail panel on the left side of the inspector.
//! Hosts the mirrored inspector tree: tab bar, headers and field rows.

use bevy::ecs::hierarchy::ChildSpawnerCommands;
use bevy::prelude::*;
use bevy::ui::Val::*;
use bevy::ui_widgets::{ControlOrientation, CoreScrollbarThumb, Scrollbar};

use crate::inspector::config::InspectorConfig;
use crate::widget_tree::WidgetId;

use super::mirror::MirrorRoot;

/// Spawns the detail panel; its content mirrors the widget `root`.
pub fn spawn_detail_panel(
    parent: &mut ChildSpawnerCommands<'_>,
    config: &InspectorConfig,
    root: WidgetId,
) {
    parent
        .spawn((
            Node {
                flex_grow: 1.0,
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

/// Spawns a vertically scrolling content node plus its scrollbar.
/// `content` is inserted on the content node.
pub fn spawn_scroll_area(
    parent: &mut ChildSpawnerCommands<'_>,
    config: &InspectorConfig,
    content: impl Bundle,
) {
    // Grid layout: content column plus a fixed scrollbar column
    let scrollbar_width = 8.0;
    parent
        .spawn(Node {
            width: Percent(100.0),
            flex_grow: 1.0,
            display: Display::Grid,
            grid_template_columns: vec![GridTrack::fr(1.0), GridTrack::px(scrollbar_width)],
            ..default()
        })
        .with_children(|scroll_area| {
            let content_id = scroll_area
                .spawn((
                    Node {
                        display: Display::Flex,
                        flex_direction: FlexDirection::Column,
                        row_gap: config.item_gap,
                        padding: config.panel_padding,
                        overflow: Overflow::scroll_y(),
                        ..default()
                    },
                    ScrollPosition::default(),
                    content,
                ))
                .id();

            scroll_area
                .spawn((
                    Scrollbar {
                        target: content_id,
                        orientation: ControlOrientation::Vertical,
                        min_thumb_length: 20.0,
                    },
                    Node {
                        width: Px(scrollbar_width),
                        height: Percent(100.0),
                        ..default()
                    },
                    BackgroundColor(Color::srgba(0.15, 0.15, 0.15, 0.5)),
                ))
                .with_children(|sb| {
                    sb.spawn((
                        CoreScrollbarThumb,
                        Node {
                            width: Percent(100.0),
                            ..default()
                        },
                        BackgroundColor(Color::srgba(0.5, 0.5, 0.5, 0.8)),
                    ));
                });
        });
}
