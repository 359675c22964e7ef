//! Central UI state for the inspector.

use bevy::prelude::*;

use crate::command_menu::{CommandList, CommandMenu};
use crate::editors::EditorContext;
use crate::inspector::config::InspectorConfig;
use crate::inspector_tree::{InspectTarget, InspectorTree};
use crate::reactive::Property;
use crate::widget_tree::{UiContext, WidgetEvent, WidgetId, WidgetKind};

/// Marker component for inspector-internal entities (cameras, UI nodes).
#[derive(Component)]
pub struct InspectorInternal;

/// Marks the entity the inspector shows when nothing is selected or edit mode
/// is on.
#[derive(Component)]
pub struct InspectorHost;

/// Ordered, duplicate-free set of selected entities.
///
/// Every effective mutation bumps [`SelectionSet::revision`], which is what
/// triggers an inspector rebuild.
#[derive(Resource, Default, Debug)]
pub struct SelectionSet {
    entities: Vec<Entity>,
    revision: u64,
}

impl SelectionSet {
    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn contains(&self, entity: Entity) -> bool {
        self.entities.contains(&entity)
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Adds `entity` at the end. Returns false if it was already selected.
    pub fn insert(&mut self, entity: Entity) -> bool {
        if self.contains(entity) {
            return false;
        }
        self.entities.push(entity);
        self.bump();
        true
    }

    pub fn remove(&mut self, entity: Entity) -> bool {
        let Some(index) = self.entities.iter().position(|e| *e == entity) else {
            return false;
        };
        self.entities.remove(index);
        self.bump();
        true
    }

    /// Replaces the entity at `index`. A duplicate elsewhere collapses into it.
    pub fn replace(&mut self, index: usize, entity: Entity) -> bool {
        if self.entities.get(index) == Some(&entity) || index >= self.entities.len() {
            return false;
        }
        self.entities[index] = entity;
        let mut seen = 0;
        self.entities.retain(|e| {
            if *e != entity {
                return true;
            }
            seen += 1;
            seen == 1
        });
        self.bump();
        true
    }

    /// Replaces the whole selection, dropping duplicates.
    pub fn set(&mut self, entities: impl IntoIterator<Item = Entity>) {
        let mut next: Vec<Entity> = Vec::new();
        for entity in entities {
            if !next.contains(&entity) {
                next.push(entity);
            }
        }
        if next != self.entities {
            self.entities = next;
            self.bump();
        }
    }

    pub fn clear(&mut self) {
        if !self.entities.is_empty() {
            self.entities.clear();
            self.bump();
        }
    }

    /// Drops entities for which `keep` is false.
    pub fn retain(&mut self, keep: impl FnMut(&Entity) -> bool) -> usize {
        let before = self.entities.len();
        self.entities.retain(keep);
        let dropped = before - self.entities.len();
        if dropped > 0 {
            self.bump();
        }
        dropped
    }

    fn bump(&mut self) {
        self.revision += 1;
    }
}

/// Map-edit mode. While on, the inspector always shows its host.
#[derive(Resource, Default, Debug, Clone, Copy, PartialEq, Eq, Deref, DerefMut)]
pub struct EditMode(pub bool);

/// Central UI state for the inspector.
///
/// Owns the widget model, the built tree with its bindings, and the command
/// menu. All widget events flow through [`InspectorState::handle_event`].
#[derive(Resource)]
pub struct InspectorState {
    ui: UiContext,
    tree: InspectorTree,
    actions_panel: WidgetId,
    menu: CommandMenu,
    needs_save: Property<bool>,
    /// Selection revision, edit mode and target liveness the current tree
    /// was built for.
    built_for: Option<(u64, bool, bool)>,
}

impl FromWorld for InspectorState {
    fn from_world(world: &mut World) -> Self {
        let config = world.get_resource_or_init::<InspectorConfig>().clone();
        let ui = UiContext::new();
        let tree = InspectorTree::new(&ui);

        let actions_panel = ui.spawn(WidgetKind::Panel, None, "");
        ui.spawn(WidgetKind::Label, Some(actions_panel), config.actions_label);
        let drop_down = ui.spawn(WidgetKind::DropDown, Some(actions_panel), "");
        let menu = CommandMenu::attach(&ui, drop_down, &world.get_resource_or_init::<CommandList>());

        Self {
            ui,
            tree,
            actions_panel,
            menu,
            needs_save: Property::new(false),
            built_for: None,
        }
    }
}

impl InspectorState {
    pub fn ui(&self) -> &UiContext {
        &self.ui
    }

    pub fn tree(&self) -> &InspectorTree {
        &self.tree
    }

    pub fn menu(&self) -> &CommandMenu {
        &self.menu
    }

    pub fn actions_panel(&self) -> WidgetId {
        self.actions_panel
    }

    /// Raised whenever a bool field commits; persistence logic resets it.
    pub fn needs_save(&self) -> &Property<bool> {
        &self.needs_save
    }

    /// Rebuilds the tree if the selection or edit mode changed since the last
    /// build, or the inspected entity was despawned. Returns whether a rebuild
    /// happened.
    pub fn refresh(
        &mut self,
        world: &World,
        config: &InspectorConfig,
        selection: &SelectionSet,
        edit_mode: bool,
        host: Entity,
    ) -> bool {
        let target = InspectTarget::resolve(selection.entities(), edit_mode, host);
        let alive = match target {
            InspectTarget::Host(entity) | InspectTarget::Single(entity) => {
                world.get_entity(entity).is_ok()
            }
            InspectTarget::Multiple(_) => true,
        };
        let key = (selection.revision(), edit_mode, alive);
        if self.built_for == Some(key) {
            return false;
        }
        self.built_for = Some(key);

        let cx = EditorContext {
            ui: &self.ui,
            config,
            needs_save: &self.needs_save,
        };
        self.tree.rebuild(world, cx, target);
        true
    }

    pub fn handle_event(&self, event: &WidgetEvent) -> bool {
        self.menu.handle_event(&self.ui, event) || self.tree.handle_event(&self.ui, event)
    }
}

/// Tracks the state of the inspector window.
#[derive(Resource, Default)]
pub struct InspectorWindowState {
    /// Entity ID of the inspector window, if it exists.
    pub window_entity: Option<Entity>,
    /// Entity ID of the camera rendering to the inspector window.
    pub camera_entity: Option<Entity>,
    /// Whether the inspector window is currently open.
    pub is_open: bool,
}
