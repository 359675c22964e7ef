//! Inspector window plugin and UI scaffold.

use bevy::camera::RenderTarget;
use bevy::ecs::hierarchy::ChildSpawnerCommands;
use bevy::ecs::relationship::Relationship;
use bevy::feathers::FeathersPlugins;
use bevy::feathers::dark_theme::create_dark_theme;
use bevy::feathers::theme::{ThemeBackgroundColor, UiTheme};
use bevy::feathers::tokens;
use bevy::input::mouse::{MouseScrollUnit, MouseWheel};
use bevy::input_focus::InputFocus;
use bevy::picking::hover::HoverMap;
use bevy::prelude::*;
use bevy::ui::Val::*;
use bevy::window::{WindowRef, WindowResolution};

use crate::command_menu::CommandList;
use crate::inspection::{InspectableEntity, ModuleRegistry};

use super::config::InspectorConfig;
use super::panels::{spawn_actions_panel, spawn_detail_panel, sync_inspector_panels, MirrorState};
use super::state::{
    EditMode, InspectorHost, InspectorInternal, InspectorState, InspectorWindowState, SelectionSet,
};
use super::widgets::{commit_on_focus_loss, PendingWidgetEvents, TextFieldPlugin};

/// Marker component for the inspector window.
#[derive(Component)]
pub struct InspectorWindow;

/// Marker to indicate UI has been initialized.
#[derive(Component)]
struct InspectorUiInitialized;

/// System sets for organizing inspector systems.
#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub enum InspectorSet {
    /// Handle input events.
    Input,
    /// Rebuild the inspector tree.
    Refresh,
    /// Sync UI with the tree.
    SyncUi,
}

/// Plugin that opens the inspector window and keeps it in sync with the
/// selection.
pub struct LiveInspectorPlugin;

impl Plugin for LiveInspectorPlugin {
    fn build(&self, app: &mut App) {
        app.add_plugins(FeathersPlugins)
            .add_plugins(TextFieldPlugin)
            .insert_resource(UiTheme(create_dark_theme()))
            // State resources
            .init_resource::<InspectorConfig>()
            .init_resource::<CommandList>()
            .init_resource::<ModuleRegistry>()
            .init_resource::<SelectionSet>()
            .init_resource::<EditMode>()
            .init_resource::<InspectorWindowState>()
            .init_resource::<MirrorState>()
            .init_resource::<InspectorState>()
            // System ordering
            .configure_sets(
                Update,
                (
                    InspectorSet::Input,
                    InspectorSet::Refresh,
                    InspectorSet::SyncUi,
                )
                    .chain(),
            )
            // Startup
            .add_systems(Startup, (setup_inspector_window, spawn_inspector_host))
            // Update systems
            .add_systems(
                Update,
                (
                    // Input handling
                    (commit_on_focus_loss, apply_widget_events)
                        .chain()
                        .in_set(InspectorSet::Input),
                    (handle_mouse_wheel_scroll, dispatch_command_chords)
                        .in_set(InspectorSet::Input),
                    // Tree rebuild
                    refresh_inspector.in_set(InspectorSet::Refresh),
                    // UI sync
                    (setup_inspector_ui, sync_inspector_panels)
                        .chain()
                        .in_set(InspectorSet::SyncUi),
                    // Cleanup
                    handle_window_close,
                ),
            );
    }
}

/// Spawns the inspector window on startup.
fn setup_inspector_window(
    mut commands: Commands,
    config: Res<InspectorConfig>,
    mut window_state: ResMut<InspectorWindowState>,
) {
    let window_entity = commands
        .spawn((
            Window {
                title: config.window_title.clone(),
                resolution: WindowResolution::new(config.window_width, config.window_height),
                ..default()
            },
            InspectorWindow,
            Visibility::Visible,
            InheritedVisibility::default(),
            ViewVisibility::default(),
        ))
        .id();

    window_state.window_entity = Some(window_entity);
    window_state.is_open = true;

    info!("Inspector window created: {:?}", window_entity);
}

/// Spawns the host entity unless the app already marked one.
fn spawn_inspector_host(mut commands: Commands, hosts: Query<(), With<InspectorHost>>) {
    if !hosts.is_empty() {
        return;
    }
    let host = commands
        .spawn((
            Name::new("Inspector"),
            InspectableEntity::new("Inspector", "inspector"),
            InspectorHost,
        ))
        .id();
    debug!("Spawned inspector host {host}");
}

/// Sets up the UI scaffold once the window exists.
fn setup_inspector_ui(
    mut commands: Commands,
    mut window_state: ResMut<InspectorWindowState>,
    config: Res<InspectorConfig>,
    state: Res<InspectorState>,
    mut mirror: ResMut<MirrorState>,
    inspector_windows: Query<Entity, (With<InspectorWindow>, Without<InspectorUiInitialized>)>,
) {
    let Some(window_entity) = window_state.window_entity else {
        return;
    };

    if inspector_windows.get(window_entity).is_err() {
        return;
    }

    // Mark window as initialized
    commands.entity(window_entity).insert(InspectorUiInitialized);

    // Camera for the inspector window, marked internal so it is never inspected
    let camera_entity = commands
        .spawn((
            Camera2d,
            Camera {
                target: RenderTarget::Window(WindowRef::Entity(window_entity)),
                ..default()
            },
            InspectorInternal,
        ))
        .id();
    window_state.camera_entity = Some(camera_entity);

    let tree_root = state.tree().root();
    let actions_root = state.actions_panel();

    // Build UI hierarchy
    commands
        .spawn((
            Node {
                width: Percent(100.0),
                height: Percent(100.0),
                display: Display::Flex,
                flex_direction: FlexDirection::Column,
                ..default()
            },
            ThemeBackgroundColor(tokens::WINDOW_BG),
            UiTargetCamera(camera_entity),
            InspectorInternal,
        ))
        .with_children(|root| {
            // Title bar
            spawn_title_bar(root, &config);

            // Main content area
            root.spawn(Node {
                width: Percent(100.0),
                flex_grow: 1.0,
                display: Display::Flex,
                flex_direction: FlexDirection::Row,
                padding: config.panel_padding,
                column_gap: config.column_gap,
                ..default()
            })
            .with_children(|content| {
                // Left panel: inspector tree
                spawn_detail_panel(content, &config, tree_root);

                // Right panel: command menu
                spawn_actions_panel(content, &config, actions_root);
            });
        });

    // Fresh panels need a full mirror
    mirror.invalidate();

    info!("Inspector UI initialized");
}

fn spawn_title_bar(parent: &mut ChildSpawnerCommands<'_>, config: &InspectorConfig) {
    parent
        .spawn((
            Node {
                width: Percent(100.0),
                height: config.title_bar_height,
                display: Display::Flex,
                align_items: AlignItems::Center,
                padding: config.panel_padding,
                border: UiRect::bottom(Px(1.0)),
                ..default()
            },
            BorderColor::all(config.border_color),
        ))
        .with_children(|bar| {
            bar.spawn((
                Text::new(config.window_title.clone()),
                TextFont {
                    font_size: config.title_font_size + 2.0,
                    ..default()
                },
                TextColor(Color::WHITE),
            ));
        });
}

/// Exclusive system that hands queued widget events to the inspector.
pub fn apply_widget_events(world: &mut World) {
    let events = std::mem::take(&mut world.resource_mut::<PendingWidgetEvents>().events);
    if events.is_empty() {
        return;
    }

    let state = world.resource::<InspectorState>();
    for event in &events {
        if !state.handle_event(event) {
            trace!("Unhandled widget event {event:?}");
        }
    }
}

/// Exclusive system that rebuilds the inspector tree when its inputs changed.
pub fn refresh_inspector(world: &mut World) {
    let mut hosts = world.query_filtered::<Entity, With<InspectorHost>>();
    let Some(host) = hosts.iter(world).next() else {
        return;
    };
    let config = world.resource::<InspectorConfig>().clone();
    let edit_mode = world.resource::<EditMode>().0;

    world.resource_scope(|world, mut state: Mut<InspectorState>| {
        let world: &World = world;
        let selection = world.resource::<SelectionSet>();
        if state.refresh(world, &config, selection, edit_mode, host) {
            debug!(
                "Inspector rebuilt for {} selected entities (edit mode {edit_mode})",
                selection.len()
            );
        }
    });
}

/// Invokes commands whose chord was pressed this frame. Text editing owns the
/// keyboard, so nothing fires while any entity has input focus.
fn dispatch_command_chords(
    keys: Res<ButtonInput<KeyCode>>,
    input_focus: Res<InputFocus>,
    command_list: Res<CommandList>,
) {
    if input_focus.get().is_some() {
        return;
    }
    for entry in command_list.entries() {
        if entry.chord.just_pressed(&keys) && entry.is_enabled() {
            debug!("Chord for {:?} pressed", entry.label);
            entry.action.invoke();
        }
    }
}

/// Despawns the inspector camera and UI once the inspector window is closed.
fn handle_window_close(
    mut commands: Commands,
    mut window_state: ResMut<InspectorWindowState>,
    mut removed_windows: RemovedComponents<Window>,
    internals: Query<Entity, (With<InspectorInternal>, Without<ChildOf>)>,
) {
    for entity in removed_windows.read() {
        if window_state.window_entity != Some(entity) {
            continue;
        }
        for internal in &internals {
            commands.entity(internal).despawn();
        }
        window_state.window_entity = None;
        window_state.camera_entity = None;
        window_state.is_open = false;
        info!("Inspector window closed");
    }
}

/// Handles mouse wheel scrolling by traversing up from hovered entities to find scrollable containers.
fn handle_mouse_wheel_scroll(
    mut mouse_wheel_reader: MessageReader<MouseWheel>,
    hover_map: Res<HoverMap>,
    parents: Query<&ChildOf>,
    mut scrollables: Query<(&mut ScrollPosition, &Node, &ComputedNode)>,
) {
    for event in mouse_wheel_reader.read() {
        let mut delta = Vec2::new(event.x, event.y);
        if event.unit == MouseScrollUnit::Line {
            delta *= 20.0; // Convert lines to pixels
        }
        delta = -delta; // Invert for natural scrolling

        for pointer_map in hover_map.values() {
            for &hovered_entity in pointer_map.keys() {
                // Traverse up to find scrollable ancestor
                let mut current = hovered_entity;
                loop {
                    if let Ok((mut scroll_pos, node, computed)) = scrollables.get_mut(current) {
                        if node.overflow.y == OverflowAxis::Scroll && delta.y != 0.0 {
                            let max_y = (computed.content_size().y - computed.size().y)
                                .max(0.0)
                                * computed.inverse_scale_factor();
                            scroll_pos.y = (scroll_pos.y + delta.y).clamp(0.0, max_y);
                        }
                        if node.overflow.x == OverflowAxis::Scroll && delta.x != 0.0 {
                            let max_x = (computed.content_size().x - computed.size().x)
                                .max(0.0)
                                * computed.inverse_scale_factor();
                            scroll_pos.x = (scroll_pos.x + delta.x).clamp(0.0, max_x);
                        }
                        return;
                    }

                    if let Ok(child_of) = parents.get(current) {
                        current = child_of.get();
                    } else {
                        break;
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command_menu::{Chord, CommandEntry};
    use crate::reactive::{Action, Property};
    use crate::widget_tree::WidgetEvent;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counting_action(count: &Arc<AtomicUsize>) -> Action {
        let count = count.clone();
        Action::new(move || {
            count.fetch_add(1, Ordering::SeqCst);
        })
    }

    #[test]
    fn closing_the_window_despawns_internal_entities() {
        let mut app = App::new();
        app.init_resource::<InspectorWindowState>()
            .add_systems(Update, handle_window_close);
        let world = app.world_mut();
        let window = world.spawn(Window::default()).id();
        let camera = world.spawn(InspectorInternal).id();
        let ui_root = world.spawn((Node::default(), InspectorInternal)).id();
        let label = world.spawn((Text::new("Inspector"), ChildOf(ui_root))).id();
        let game = world.spawn(Name::new("Square")).id();
        {
            let mut window_state = world.resource_mut::<InspectorWindowState>();
            window_state.window_entity = Some(window);
            window_state.camera_entity = Some(camera);
            window_state.is_open = true;
        }

        app.update();
        assert!(app.world().get_entity(camera).is_ok());

        app.world_mut().despawn(window);
        app.update();

        let world = app.world();
        assert!(world.get_entity(camera).is_err());
        assert!(world.get_entity(ui_root).is_err());
        assert!(world.get_entity(label).is_err());
        assert!(world.get_entity(game).is_ok());
        let window_state = world.resource::<InspectorWindowState>();
        assert_eq!(window_state.camera_entity, None);
        assert!(!window_state.is_open);
    }

    #[test]
    fn chords_fire_only_without_input_focus() {
        let count = Arc::new(AtomicUsize::new(0));
        let mut app = App::new();
        app.init_resource::<ButtonInput<KeyCode>>()
            .init_resource::<InputFocus>()
            .init_resource::<CommandList>()
            .add_systems(Update, dispatch_command_chords);
        app.world_mut().resource_mut::<CommandList>().push(
            CommandEntry::new("Spawn", counting_action(&count)).with_chord(Chord::key(KeyCode::KeyS)),
        );

        app.world_mut()
            .resource_mut::<ButtonInput<KeyCode>>()
            .press(KeyCode::KeyS);
        app.update();
        assert_eq!(count.load(Ordering::SeqCst), 1);

        let focused = app.world_mut().spawn_empty().id();
        app.world_mut().resource_mut::<InputFocus>().set(focused);
        {
            let mut keys = app.world_mut().resource_mut::<ButtonInput<KeyCode>>();
            keys.release(KeyCode::KeyS);
            keys.clear();
            keys.press(KeyCode::KeyS);
        }
        app.update();
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn queued_events_reach_bindings_after_refresh() {
        let speed = Property::new(2.5_f32);
        let mut world = World::new();
        world.init_resource::<SelectionSet>();
        world.init_resource::<EditMode>();
        world.init_resource::<PendingWidgetEvents>();
        world.spawn((
            InspectableEntity::new("Editor", "editor").with_property("Speed", speed.clone()),
            InspectorHost,
        ));
        let state = InspectorState::from_world(&mut world);
        world.insert_resource(state);

        refresh_inspector(&mut world);
        let tab = world.resource::<InspectorState>().tree().tabs()[0].clone();
        let ui = world.resource::<InspectorState>().ui().clone();
        let speed_row = ui.children(tab.body)[1];
        let field = ui.children(speed_row)[1];

        world
            .resource_mut::<PendingWidgetEvents>()
            .push(WidgetEvent::TextSubmitted {
                widget: field,
                text: "4".to_string(),
            });
        apply_widget_events(&mut world);

        assert_eq!(speed.get(), 4.0);
        assert_eq!(ui.text(field).as_deref(), Some("4.00"));
        assert!(world.resource::<PendingWidgetEvents>().events.is_empty());
    }
}
