//! Inspector tree builder.
//!
//! Every refresh discards the previous tree wholesale (bindings first, then
//! widgets) and builds a new one for the resolved target: one tab per member
//! group, each tab a clickable header over a body of `key | editor` rows.

use bevy::prelude::*;

use crate::binding::BindingSet;
use crate::editors::{EditorContext, build_editor};
use crate::inspection::{MemberGroup, enumerate};
use crate::widget_tree::{UiContext, WidgetEvent, WidgetId, WidgetKind};

/// Which entity, if any, the inspector shows.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InspectTarget {
    /// Self-inspection of the inspector's host entity.
    Host(Entity),
    Single(Entity),
    /// More than one entity is selected; only the count is shown.
    Multiple(usize),
}

impl InspectTarget {
    /// Empty selection or edit mode inspects the host.
    pub fn resolve(selection: &[Entity], edit_mode: bool, host: Entity) -> Self {
        match selection {
            _ if edit_mode => InspectTarget::Host(host),
            [] => InspectTarget::Host(host),
            [entity] => InspectTarget::Single(*entity),
            many => InspectTarget::Multiple(many.len()),
        }
    }

    /// Host inspection is [`TreeState::Empty`], including edit mode over a
    /// non-empty selection.
    pub fn state(self) -> TreeState {
        match self {
            InspectTarget::Host(_) => TreeState::Empty,
            InspectTarget::Single(_) => TreeState::SingleTarget,
            InspectTarget::Multiple(_) => TreeState::MultiTarget,
        }
    }
}

/// Builder state, named after what the selection holds.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TreeState {
    /// Nothing selected, or edit mode on: the host's own members are shown.
    #[default]
    Empty,
    SingleTarget,
    /// Only a count label is shown.
    MultiTarget,
}

/// Widgets of one built tab.
#[derive(Clone, Debug)]
pub struct InspectorTab {
    pub label: String,
    pub tab: WidgetId,
    pub header: WidgetId,
    pub body: WidgetId,
}

/// The built inspector tree and the bindings it owns.
///
/// Notices are plain labels shown instead of tabs; a highlighted notice is an
/// error.
pub struct InspectorTree {
    root: WidgetId,
    tab_host: Option<WidgetId>,
    tabs: Vec<InspectorTab>,
    notices: Vec<WidgetId>,
    bindings: BindingSet,
    state: TreeState,
}

impl InspectorTree {
    pub fn new(ui: &UiContext) -> Self {
        Self {
            root: ui.spawn(WidgetKind::Panel, None, ""),
            tab_host: None,
            tabs: Vec::new(),
            notices: Vec::new(),
            bindings: BindingSet::default(),
            state: TreeState::Empty,
        }
    }

    pub fn root(&self) -> WidgetId {
        self.root
    }

    pub fn tab_host(&self) -> Option<WidgetId> {
        self.tab_host
    }

    pub fn tabs(&self) -> &[InspectorTab] {
        &self.tabs
    }

    pub fn notices(&self) -> &[WidgetId] {
        &self.notices
    }

    pub fn state(&self) -> TreeState {
        self.state
    }

    pub fn binding_count(&self) -> usize {
        self.bindings.len()
    }

    /// Whether `widget` has a live binding, i.e. accepts edits.
    pub fn is_bound(&self, widget: WidgetId) -> bool {
        self.bindings.contains(widget)
    }

    /// Releases every binding, then destroys every widget below the root.
    pub fn clear(&mut self, ui: &UiContext) {
        let released = self.bindings.release_all();
        for child in ui.children(self.root) {
            ui.destroy(child);
        }
        self.tab_host = None;
        self.tabs.clear();
        self.notices.clear();
        debug!("Cleared inspector tree ({released} bindings released)");
    }

    /// Discards the current tree and builds one for `target`.
    pub fn rebuild(&mut self, world: &World, cx: EditorContext<'_>, target: InspectTarget) {
        self.clear(cx.ui);
        self.state = target.state();

        let entity = match target {
            InspectTarget::Multiple(count) => {
                self.notice(cx, cx.config.multi_selection_text(count), false);
                return;
            }
            InspectTarget::Host(entity) | InspectTarget::Single(entity) => entity,
        };

        match enumerate(world, entity) {
            Err(error) => {
                warn!("Cannot inspect {entity}: {error}");
                self.notice(cx, format!("Error: {error}"), true);
            }
            Ok(groups) if groups.is_empty() => {
                self.notice(cx, cx.config.empty_text.clone(), false);
            }
            Ok(groups) => {
                self.build_tabs(cx, &groups);
                debug!(
                    "Built inspector tree for {entity}: {} tabs, {} bindings",
                    self.tabs.len(),
                    self.bindings.len()
                );
            }
        }
    }

    fn notice(&mut self, cx: EditorContext<'_>, text: String, error: bool) {
        let label = cx.ui.spawn(WidgetKind::Label, Some(self.root), text);
        cx.ui.set_highlighted(label, error);
        self.notices.push(label);
    }

    fn build_tabs(&mut self, cx: EditorContext<'_>, groups: &[MemberGroup]) {
        let ui = cx.ui;
        let tab_host = ui.spawn(WidgetKind::TabHost, Some(self.root), "");

        for (index, group) in groups.iter().enumerate() {
            let tab = ui.spawn(WidgetKind::Tab, Some(tab_host), group.label.clone());
            ui.set_visible(tab, index == 0);

            let header = ui.spawn(WidgetKind::Header, Some(tab), group.label.clone());
            let body = ui.spawn(WidgetKind::Panel, Some(tab), "");
            ui.set_highlighted(header, true);

            for member in &group.members {
                let row = ui.spawn(WidgetKind::Row, Some(body), "");
                let key = ui.spawn(WidgetKind::Label, Some(row), member.label.clone());
                ui.set_width(key, cx.config.key_label_width);
                for binding in build_editor(cx, row, &member.member) {
                    self.bindings.insert(binding);
                }
            }

            self.tabs.push(InspectorTab {
                label: group.label.clone(),
                tab,
                header,
                body,
            });
        }

        let titles = self.tabs.iter().map(|tab| tab.label.clone()).collect();
        ui.set_options(tab_host, titles);
        ui.select_option(tab_host, Some(0));
        self.tab_host = Some(tab_host);
    }

    /// Shows the tab at `index` and hides the others.
    pub fn show_tab(&self, ui: &UiContext, index: usize) -> bool {
        let (Some(tab_host), true) = (self.tab_host, index < self.tabs.len()) else {
            return false;
        };
        for (i, tab) in self.tabs.iter().enumerate() {
            ui.set_visible(tab.tab, i == index);
        }
        ui.select_option(tab_host, Some(index))
    }

    /// Routes a widget event: header clicks fold their body, tab-host
    /// selections switch tabs, everything else goes to the bindings.
    pub fn handle_event(&self, ui: &UiContext, event: &WidgetEvent) -> bool {
        match event {
            WidgetEvent::Clicked { widget } => {
                if let Some(tab) = self.tabs.iter().find(|tab| tab.header == *widget) {
                    let expanded = ui.widget(tab.body).is_some_and(|body| !body.visible);
                    ui.set_visible(tab.body, expanded);
                    ui.set_highlighted(tab.header, expanded);
                    return true;
                }
            }
            WidgetEvent::OptionSelected { widget, index } if Some(*widget) == self.tab_host => {
                return self.show_tab(ui, *index);
            }
            _ => {}
        }
        self.bindings.dispatch(ui, event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inspection::{InspectableEntity, InspectableModule, ModuleDescriptor, ModuleRegistry};
    use crate::inspector::config::InspectorConfig;
    use crate::reactive::{Action, Property};
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Component)]
    struct Engine {
        speed: Property<f32>,
        offset: Property<Vec2>,
        stop: Action,
    }

    impl InspectableModule for Engine {
        fn describe(descriptor: &mut ModuleDescriptor<Self>) {
            descriptor
                .property("Speed", |m| &m.speed)
                .property("Offset", |m| &m.offset)
                .action("Stop", |m| &m.stop);
        }
    }

    #[derive(Component)]
    struct Throttle {
        speed: Property<f32>,
    }

    impl InspectableModule for Throttle {
        fn describe(descriptor: &mut ModuleDescriptor<Self>) {
            descriptor.property("Speed", |m| &m.speed);
        }
    }

    struct Fixture {
        world: World,
        ui: UiContext,
        config: InspectorConfig,
        needs_save: Property<bool>,
        tree: InspectorTree,
    }

    impl Fixture {
        fn new() -> Self {
            let mut world = World::new();
            let mut registry = ModuleRegistry::default();
            registry.register::<Engine>();
            registry.register::<Throttle>();
            world.insert_resource(registry);
            let ui = UiContext::new();
            let tree = InspectorTree::new(&ui);
            Self {
                world,
                ui,
                config: InspectorConfig::default(),
                needs_save: Property::new(false),
                tree,
            }
        }

        fn rebuild(&mut self, target: InspectTarget) {
            let cx = EditorContext {
                ui: &self.ui,
                config: &self.config,
                needs_save: &self.needs_save,
            };
            self.tree.rebuild(&self.world, cx, target);
        }

        fn snapshot(&self) -> Vec<(WidgetKind, String, bool)> {
            self.ui.read(|tree| {
                tree.descendants(self.tree.root())
                    .into_iter()
                    .filter_map(|id| tree.get(id))
                    .map(|w| (w.kind, w.text.clone(), w.visible))
                    .collect()
            })
        }
    }

    #[test]
    fn target_follows_selection_size_and_edit_mode() {
        let mut world = World::new();
        let host = world.spawn_empty().id();
        let a = world.spawn_empty().id();
        let b = world.spawn_empty().id();

        assert_eq!(InspectTarget::resolve(&[], false, host), InspectTarget::Host(host));
        assert_eq!(InspectTarget::resolve(&[a], false, host), InspectTarget::Single(a));
        assert_eq!(InspectTarget::resolve(&[a, b], false, host), InspectTarget::Multiple(2));
        assert_eq!(InspectTarget::resolve(&[a, b], true, host), InspectTarget::Host(host));
        assert_eq!(InspectTarget::Multiple(2).state(), TreeState::MultiTarget);
        assert_eq!(
            InspectTarget::resolve(&[a, b], true, host).state(),
            TreeState::Empty
        );
    }

    #[test]
    fn single_float_member_yields_one_tab_with_one_row() {
        let mut fx = Fixture::new();
        let speed = Property::new(2.5_f32);
        let entity = fx
            .world
            .spawn(Throttle {
                speed: speed.clone(),
            })
            .id();

        fx.rebuild(InspectTarget::Single(entity));

        let tabs = fx.tree.tabs().to_vec();
        assert_eq!(tabs.len(), 1);
        let rows = fx.ui.children(tabs[0].body);
        assert_eq!(rows.len(), 1);
        let cells = fx.ui.children(rows[0]);
        assert_eq!(fx.ui.text(cells[0]).as_deref(), Some("Speed"));
        assert_eq!(fx.ui.widget(cells[0]).unwrap().width, Some(128.0));

        let field = cells[1];
        assert_eq!(fx.ui.text(field).as_deref(), Some("2.50"));

        let submit = |text: &str| WidgetEvent::TextSubmitted {
            widget: field,
            text: text.to_string(),
        };
        assert!(fx.tree.handle_event(&fx.ui, &submit("abc")));
        assert_eq!(speed.get(), 2.5);
        assert_eq!(fx.ui.text(field).as_deref(), Some("2.50"));

        fx.tree.handle_event(&fx.ui, &submit("4"));
        assert_eq!(speed.get(), 4.0);
    }

    #[test]
    fn tabs_follow_group_order_and_rows_follow_members() {
        let mut fx = Fixture::new();
        let entity = fx
            .world
            .spawn((
                InspectableEntity::new("Car", "car-7"),
                Engine {
                    speed: Property::new(1.0),
                    offset: Property::new(Vec2::ZERO),
                    stop: Action::new(|| {}).shown_in_editor(),
                },
            ))
            .id();

        fx.rebuild(InspectTarget::Single(entity));

        let labels: Vec<&str> = fx.tree.tabs().iter().map(|t| t.label.as_str()).collect();
        assert_eq!(labels, vec!["[Car entity]", "Engine"]);
        let engine = &fx.tree.tabs()[1];
        let keys: Vec<String> = fx
            .ui
            .children(engine.body)
            .into_iter()
            .filter_map(|row| fx.ui.children(row).first().copied())
            .filter_map(|key| fx.ui.text(key))
            .collect();
        assert_eq!(keys, vec!["Speed", "Offset", "Stop"]);
        assert_eq!(
            fx.ui.read(|t| t.texts_of(engine.body, WidgetKind::Button)),
            vec!["[Execute]"]
        );
        // ID + Speed + Offset.x + Offset.y + Stop
        assert_eq!(fx.tree.binding_count(), 5);
    }

    #[test]
    fn header_click_folds_body_and_reflects_state() {
        let mut fx = Fixture::new();
        let entity = fx
            .world
            .spawn(Throttle {
                speed: Property::new(1.0),
            })
            .id();
        fx.rebuild(InspectTarget::Single(entity));
        let tab = fx.tree.tabs()[0].clone();
        assert!(fx.ui.widget(tab.header).unwrap().highlighted);

        fx.tree
            .handle_event(&fx.ui, &WidgetEvent::Clicked { widget: tab.header });
        assert!(!fx.ui.widget(tab.body).unwrap().visible);
        assert!(!fx.ui.widget(tab.header).unwrap().highlighted);

        fx.tree
            .handle_event(&fx.ui, &WidgetEvent::Clicked { widget: tab.header });
        assert!(fx.ui.widget(tab.body).unwrap().visible);
        assert!(fx.ui.widget(tab.header).unwrap().highlighted);
    }

    #[test]
    fn tab_host_selection_switches_visible_tab() {
        let mut fx = Fixture::new();
        let entity = fx
            .world
            .spawn((
                InspectableEntity::new("Car", "c"),
                Throttle {
                    speed: Property::new(1.0),
                },
            ))
            .id();
        fx.rebuild(InspectTarget::Single(entity));
        let host = fx.tree.tab_host().unwrap();
        let tabs = fx.tree.tabs().to_vec();
        assert!(fx.ui.widget(tabs[0].tab).unwrap().visible);
        assert!(!fx.ui.widget(tabs[1].tab).unwrap().visible);

        fx.tree.handle_event(
            &fx.ui,
            &WidgetEvent::OptionSelected {
                widget: host,
                index: 1,
            },
        );
        assert!(!fx.ui.widget(tabs[0].tab).unwrap().visible);
        assert!(fx.ui.widget(tabs[1].tab).unwrap().visible);
    }

    #[test]
    fn multi_selection_shows_only_the_count() {
        let mut fx = Fixture::new();
        fx.rebuild(InspectTarget::Multiple(3));

        assert_eq!(fx.tree.state(), TreeState::MultiTarget);
        assert!(fx.tree.tabs().is_empty());
        assert_eq!(fx.tree.binding_count(), 0);
        assert_eq!(
            fx.ui.read(|t| t.texts_of(fx.tree.root(), WidgetKind::Label)),
            vec!["[3 entities]"]
        );
    }

    #[test]
    fn nothing_editable_shows_a_single_label() {
        let mut fx = Fixture::new();
        let header = InspectableEntity::new("Rock", "r");
        header.id.set_editable(false);
        let entity = fx.world.spawn(header).id();

        fx.rebuild(InspectTarget::Host(entity));

        assert!(fx.tree.tabs().is_empty());
        assert_eq!(
            fx.ui.read(|t| t.texts_of(fx.tree.root(), WidgetKind::Label)),
            vec!["Nothing to inspect"]
        );
    }

    #[test]
    fn vanished_entity_shows_an_error_notice() {
        let mut fx = Fixture::new();
        let entity = fx.world.spawn_empty().id();
        fx.world.despawn(entity);

        fx.rebuild(InspectTarget::Single(entity));

        let notice = fx.tree.notices()[0];
        assert!(fx.ui.widget(notice).unwrap().highlighted);
    }

    #[test]
    fn rebuilding_twice_shows_identical_content() {
        let mut fx = Fixture::new();
        let entity = fx
            .world
            .spawn((
                InspectableEntity::new("Car", "c"),
                Engine {
                    speed: Property::new(3.25),
                    offset: Property::new(Vec2::new(1.0, 2.0)),
                    stop: Action::new(|| {}).shown_in_editor(),
                },
            ))
            .id();

        fx.rebuild(InspectTarget::Single(entity));
        let first = fx.snapshot();
        fx.rebuild(InspectTarget::Single(entity));
        assert_eq!(first, fx.snapshot());
    }

    #[test]
    fn discarded_tree_receives_no_notifications() {
        let mut fx = Fixture::new();
        let speed = Property::new(1.0_f32);
        let entity = fx
            .world
            .spawn(Throttle {
                speed: speed.clone(),
            })
            .id();
        fx.rebuild(InspectTarget::Single(entity));
        let field = fx.ui.children(fx.ui.children(fx.tree.tabs()[0].body)[0])[1];
        assert_eq!(speed.subscriber_count(), 1);

        let host = fx.world.spawn_empty().id();
        fx.rebuild(InspectTarget::Host(host));
        let revision = fx.ui.revision();
        speed.set(9.0);

        assert_eq!(speed.subscriber_count(), 0);
        assert!(!fx.ui.contains(field));
        assert_eq!(fx.ui.revision(), revision);
    }

    #[test]
    fn stop_action_runs_once_per_click() {
        let mut fx = Fixture::new();
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = hits.clone();
        let entity = fx
            .world
            .spawn(Engine {
                speed: Property::new(1.0),
                offset: Property::new(Vec2::ZERO),
                stop: Action::new(move || {
                    counter.fetch_add(1, Ordering::SeqCst);
                })
                .shown_in_editor(),
            })
            .id();
        fx.rebuild(InspectTarget::Single(entity));

        let body = fx.tree.tabs()[0].body;
        let button = fx
            .ui
            .read(|t| {
                t.descendants(body)
                    .into_iter()
                    .find(|id| t.get(*id).is_some_and(|w| w.kind == WidgetKind::Button))
            })
            .unwrap();
        fx.tree
            .handle_event(&fx.ui, &WidgetEvent::Clicked { widget: button });
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }
}
