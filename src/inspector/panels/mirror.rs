//! Mirrors the widget tree into `bevy_ui` nodes.
//!
//! A structural change of the tree (its generation) despawns and re-spawns every
//! mirrored node; a content change (its revision) patches text, colors and
//! visibility in place. Input on the nodes is queued as [`WidgetEvent`]s for the
//! inspector to route.

use bevy::ecs::observer::On;
use bevy::feathers::controls::{button, ButtonProps};
use bevy::prelude::*;
use bevy::ui::Val::*;
use bevy::ui_widgets::{observe, Activate};

use crate::inspector::config::InspectorConfig;
use crate::inspector::state::InspectorState;
use crate::inspector::widgets::{PendingWidgetEvents, TextField};
use crate::widget_tree::{UiTree, Widget, WidgetEvent, WidgetId, WidgetKind};

/// Container whose children mirror the children of a widget.
#[derive(Component)]
pub struct MirrorRoot(pub WidgetId);

/// The node mirroring one widget.
#[derive(Component)]
pub struct WidgetNode(pub WidgetId);

/// Button in the tab bar of a tab host.
#[derive(Component)]
pub struct TabButton {
    pub host: WidgetId,
    pub index: usize,
}

/// What activating a mirrored button does.
#[derive(Component, Clone, Copy, Debug)]
pub enum WidgetAction {
    Click(WidgetId),
    Toggle(WidgetId),
    Select {
        widget: WidgetId,
        index: usize,
        /// Option list to collapse afterwards.
        list: Option<Entity>,
    },
    /// Shows or hides a drop-down's option list.
    Expand(Entity),
}

/// Tree counters the mirrored nodes were last synced to.
#[derive(Resource, Default)]
pub struct MirrorState {
    synced: Option<(u64, u64)>,
}

impl MirrorState {
    /// Forces a full re-spawn on the next sync.
    pub fn invalidate(&mut self) {
        self.synced = None;
    }
}

const LABEL_COLOR: Color = Color::srgba(0.9, 0.9, 0.9, 1.0);
const KEY_COLOR: Color = Color::srgba(0.6, 0.8, 1.0, 1.0);
const VALUE_COLOR: Color = Color::srgba(0.9, 0.9, 0.6, 1.0);

/// Observer for every mirrored button.
fn on_widget_action(
    activate: On<Activate>,
    actions: Query<&WidgetAction>,
    state: Res<InspectorState>,
    mut pending: ResMut<PendingWidgetEvents>,
    mut nodes: Query<&mut Node>,
) {
    let Ok(action) = actions.get(activate.entity) else {
        return;
    };
    match *action {
        WidgetAction::Click(widget) => pending.push(WidgetEvent::Clicked { widget }),
        WidgetAction::Toggle(widget) => {
            let checked = state.ui().widget(widget).is_some_and(|w| w.checked);
            pending.push(WidgetEvent::Toggled {
                widget,
                checked: !checked,
            });
        }
        WidgetAction::Select { widget, index, list } => {
            if let Some(list) = list
                && let Ok(mut node) = nodes.get_mut(list)
            {
                node.display = Display::None;
            }
            if widget == state.menu().drop_down() && !state.menu().is_enabled(index) {
                debug!("Ignoring disabled menu command {index}");
                return;
            }
            pending.push(WidgetEvent::OptionSelected { widget, index });
        }
        WidgetAction::Expand(list) => {
            if let Ok(mut node) = nodes.get_mut(list) {
                node.display = match node.display {
                    Display::None => Display::Flex,
                    _ => Display::None,
                };
            }
        }
    }
}

/// Exclusive system that keeps every [`MirrorRoot`] in sync with the tree.
pub fn sync_inspector_panels(world: &mut World) {
    let mut query = world.query::<(Entity, &MirrorRoot)>();
    let roots: Vec<(Entity, WidgetId)> = query.iter(world).map(|(e, root)| (e, root.0)).collect();
    if roots.is_empty() {
        return;
    }

    let config = world.resource::<InspectorConfig>().clone();
    world.resource_scope(|world, state: Mut<InspectorState>| {
        let counters = state.ui().read(|tree| (tree.generation(), tree.revision()));
        let synced = world.resource::<MirrorState>().synced;
        if synced == Some(counters) {
            return;
        }
        let respawn = synced.is_none_or(|(generation, _)| generation != counters.0);

        state.ui().read(|tree| {
            let mirror = Mirror {
                tree,
                state: &state,
                config: &config,
            };
            if respawn {
                for &(container, root) in &roots {
                    mirror.respawn(world, container, root);
                }
            } else {
                mirror.patch_all(world);
            }
        });

        world.resource_mut::<MirrorState>().synced = Some(counters);
    });
}

struct Mirror<'a> {
    tree: &'a UiTree,
    state: &'a InspectorState,
    config: &'a InspectorConfig,
}

impl Mirror<'_> {
    fn respawn(&self, world: &mut World, container: Entity, root: WidgetId) {
        let stale: Vec<Entity> = world
            .get::<Children>(container)
            .map(|c| c.iter().collect())
            .unwrap_or_default();
        for child in stale {
            if world.entities().contains(child) {
                world.entity_mut(child).despawn();
            }
        }

        if let Some(widget) = self.tree.get(root) {
            self.spawn_children(world, container, widget);
        }
    }

    fn spawn_children(&self, world: &mut World, parent: Entity, widget: &Widget) {
        for &child in &widget.children {
            self.spawn(world, parent, child);
        }
    }

    fn spawn(&self, world: &mut World, parent: Entity, id: WidgetId) {
        let Some(widget) = self.tree.get(id) else {
            return;
        };
        let config = self.config;
        let display = display_of(widget.visible);

        match widget.kind {
            WidgetKind::Panel | WidgetKind::Tab => {
                let in_tab = widget
                    .parent
                    .and_then(|p| self.tree.get(p))
                    .is_some_and(|p| p.kind == WidgetKind::Tab);
                let entity = world
                    .spawn((
                        Node {
                            display,
                            flex_direction: FlexDirection::Column,
                            row_gap: config.item_gap,
                            margin: if in_tab {
                                UiRect::left(config.body_indent)
                            } else {
                                UiRect::default()
                            },
                            ..default()
                        },
                        WidgetNode(id),
                        ChildOf(parent),
                    ))
                    .id();
                self.spawn_children(world, entity, widget);
            }
            WidgetKind::Row => {
                let entity = world
                    .spawn((
                        Node {
                            display,
                            flex_direction: FlexDirection::Row,
                            align_items: AlignItems::Center,
                            column_gap: Px(4.0),
                            ..default()
                        },
                        WidgetNode(id),
                        ChildOf(parent),
                    ))
                    .id();
                self.spawn_children(world, entity, widget);
            }
            WidgetKind::TabHost => {
                let host = world
                    .spawn((
                        Node {
                            display,
                            flex_direction: FlexDirection::Column,
                            row_gap: config.item_gap,
                            ..default()
                        },
                        WidgetNode(id),
                        ChildOf(parent),
                    ))
                    .id();
                let bar = world
                    .spawn((
                        Node {
                            width: Percent(100.0),
                            height: config.tab_bar_height,
                            display: Display::Flex,
                            align_items: AlignItems::Center,
                            column_gap: config.column_gap,
                            border: UiRect::bottom(Px(1.0)),
                            ..default()
                        },
                        BorderColor::all(config.border_color),
                        ChildOf(host),
                    ))
                    .id();
                for (index, title) in widget.options.iter().enumerate() {
                    let action = WidgetAction::Select {
                        widget: id,
                        index,
                        list: None,
                    };
                    let color = self.tab_color(widget.selected == Some(index));
                    let tab_button = spawn_button(world, bar, Some(action), title, color, config.body_font_size);
                    world.entity_mut(tab_button).insert(TabButton { host: id, index });
                }
                self.spawn_children(world, host, widget);
            }
            WidgetKind::Label => {
                let mut node = Node {
                    display,
                    padding: UiRect::horizontal(Px(4.0)),
                    ..default()
                };
                let mut background = Color::NONE;
                if let Some(width) = widget.width {
                    node.width = Px(width);
                    background = config.key_background;
                }
                world.spawn((
                    Text::new(widget.text.clone()),
                    TextFont {
                        font_size: config.small_font_size,
                        ..default()
                    },
                    TextColor(self.label_color(widget)),
                    node,
                    BackgroundColor(background),
                    WidgetNode(id),
                    ChildOf(parent),
                ));
            }
            WidgetKind::Header => {
                let wrapper = spawn_wrapper(world, parent, id, display);
                spawn_button(
                    world,
                    wrapper,
                    Some(WidgetAction::Click(id)),
                    &widget.text,
                    self.header_color(widget),
                    config.body_font_size,
                );
            }
            WidgetKind::TextField => {
                let read_only = !self.state.tree().is_bound(id);
                let mut node = Node {
                    display,
                    padding: UiRect::horizontal(Px(4.0)),
                    border: UiRect::all(Px(1.0)),
                    ..default()
                };
                if let Some(width) = widget.width {
                    node.min_width = Px(width);
                }
                world.spawn((
                    node,
                    BorderColor::all(config.border_color),
                    BackgroundColor(config.field_background),
                    TextField {
                        widget: id,
                        value: widget.text.clone(),
                        multiline: widget.multiline,
                        pattern: widget.pattern,
                        read_only,
                    },
                    WidgetNode(id),
                    ChildOf(parent),
                    children![(
                        Text::new(widget.text.clone()),
                        TextFont {
                            font_size: config.small_font_size,
                            ..default()
                        },
                        TextColor(if read_only {
                            config.muted_text_color
                        } else {
                            VALUE_COLOR
                        }),
                    )],
                ));
            }
            WidgetKind::CheckBox => {
                let wrapper = spawn_wrapper(world, parent, id, display);
                spawn_button(
                    world,
                    wrapper,
                    Some(WidgetAction::Toggle(id)),
                    check_glyph(widget.checked),
                    VALUE_COLOR,
                    config.small_font_size,
                );
            }
            WidgetKind::DropDown => {
                let wrapper = world
                    .spawn((
                        Node {
                            display,
                            flex_direction: FlexDirection::Column,
                            row_gap: Px(2.0),
                            ..default()
                        },
                        WidgetNode(id),
                        ChildOf(parent),
                    ))
                    .id();
                let toggle = spawn_button(
                    world,
                    wrapper,
                    None,
                    &drop_down_caption(widget),
                    VALUE_COLOR,
                    config.small_font_size,
                );
                let list = world
                    .spawn((
                        Node {
                            display: Display::None,
                            flex_direction: FlexDirection::Column,
                            row_gap: Px(2.0),
                            ..default()
                        },
                        ChildOf(wrapper),
                    ))
                    .id();
                world.entity_mut(toggle).insert(WidgetAction::Expand(list));

                let is_menu = id == self.state.menu().drop_down();
                for (index, option) in widget.options.iter().enumerate() {
                    let enabled = !is_menu || self.state.menu().is_enabled(index);
                    let action = WidgetAction::Select {
                        widget: id,
                        index,
                        list: Some(list),
                    };
                    let color = if enabled {
                        LABEL_COLOR
                    } else {
                        config.muted_text_color
                    };
                    spawn_button(world, list, Some(action), option, color, config.small_font_size);
                }
            }
            WidgetKind::Button => {
                let wrapper = spawn_wrapper(world, parent, id, display);
                spawn_button(
                    world,
                    wrapper,
                    Some(WidgetAction::Click(id)),
                    &widget.text,
                    LABEL_COLOR,
                    config.small_font_size,
                );
            }
        }
    }

    fn patch_all(&self, world: &mut World) {
        let mut nodes = world.query::<(Entity, &WidgetNode)>();
        let mirrored: Vec<(Entity, WidgetId)> = nodes.iter(world).map(|(e, n)| (e, n.0)).collect();
        for (entity, id) in mirrored {
            if let Some(widget) = self.tree.get(id) {
                self.patch(world, entity, widget);
            }
        }

        let mut tabs = world.query::<(Entity, &TabButton)>();
        let tab_buttons: Vec<(Entity, WidgetId, usize)> =
            tabs.iter(world).map(|(e, t)| (e, t.host, t.index)).collect();
        for (entity, host, index) in tab_buttons {
            let selected = self.tree.get(host).is_some_and(|w| w.selected == Some(index));
            if let Some(text) = first_text(world, entity) {
                set_text_color(world, text, self.tab_color(selected));
            }
        }
    }

    fn patch(&self, world: &mut World, entity: Entity, widget: &Widget) {
        let display = display_of(widget.visible);
        if let Some(mut node) = world.get_mut::<Node>(entity)
            && node.display != display
        {
            node.display = display;
        }

        match widget.kind {
            WidgetKind::Label => self.patch_text(world, entity, &widget.text, self.label_color(widget)),
            WidgetKind::Header => self.patch_text(world, entity, &widget.text, self.header_color(widget)),
            WidgetKind::Button => self.patch_text(world, entity, &widget.text, LABEL_COLOR),
            WidgetKind::CheckBox => {
                self.patch_text(world, entity, check_glyph(widget.checked), VALUE_COLOR)
            }
            WidgetKind::DropDown => {
                self.patch_text(world, entity, &drop_down_caption(widget), VALUE_COLOR)
            }
            WidgetKind::TextField => {
                if let Some(mut field) = world.get_mut::<TextField>(entity)
                    && (field.value != widget.text
                        || field.multiline != widget.multiline
                        || field.pattern != widget.pattern)
                {
                    field.value.clone_from(&widget.text);
                    field.multiline = widget.multiline;
                    field.pattern = widget.pattern;
                }
            }
            WidgetKind::Panel | WidgetKind::Row | WidgetKind::TabHost | WidgetKind::Tab => {}
        }
    }

    fn patch_text(&self, world: &mut World, entity: Entity, text: &str, color: Color) {
        let Some(target) = first_text(world, entity) else {
            return;
        };
        if let Some(mut current) = world.get_mut::<Text>(target)
            && current.0 != text
        {
            current.0 = text.to_string();
        }
        set_text_color(world, target, color);
    }

    fn label_color(&self, widget: &Widget) -> Color {
        if widget.highlighted {
            self.config.error_text_color
        } else if widget.width.is_some() {
            KEY_COLOR
        } else {
            LABEL_COLOR
        }
    }

    fn header_color(&self, widget: &Widget) -> Color {
        if widget.highlighted {
            Color::WHITE
        } else {
            self.config.muted_text_color
        }
    }

    fn tab_color(&self, selected: bool) -> Color {
        if selected {
            Color::WHITE
        } else {
            self.config.muted_text_color
        }
    }
}

fn display_of(visible: bool) -> Display {
    if visible { Display::Flex } else { Display::None }
}

fn check_glyph(checked: bool) -> &'static str {
    if checked { "[x]" } else { "[ ]" }
}

fn drop_down_caption(widget: &Widget) -> String {
    format!("{} v", widget.selected_option().unwrap_or("..."))
}

/// Node carrying the widget identity and visibility of a button, since
/// `button()` already brings its own `Node`.
fn spawn_wrapper(world: &mut World, parent: Entity, id: WidgetId, display: Display) -> Entity {
    world
        .spawn((
            Node {
                display,
                ..default()
            },
            WidgetNode(id),
            ChildOf(parent),
        ))
        .id()
}

fn spawn_button(
    world: &mut World,
    parent: Entity,
    action: Option<WidgetAction>,
    text: &str,
    color: Color,
    font_size: f32,
) -> Entity {
    let mut entity = world.spawn((
        button(
            ButtonProps::default(),
            (),
            Spawn((
                Text::new(text),
                TextFont {
                    font_size,
                    ..default()
                },
                TextColor(color),
            )),
        ),
        observe(on_widget_action),
        ChildOf(parent),
    ));
    if let Some(action) = action {
        entity.insert(action);
    }
    entity.id()
}

fn first_text(world: &World, entity: Entity) -> Option<Entity> {
    if world.get::<Text>(entity).is_some() {
        return Some(entity);
    }
    let children = world.get::<Children>(entity)?;
    children.iter().find_map(|child| first_text(world, child))
}

fn set_text_color(world: &mut World, entity: Entity, color: Color) {
    if let Some(mut current) = world.get_mut::<TextColor>(entity)
        && current.0 != color
    {
        current.0 = color;
    }
}
