//! Member discovery.
//!
//! An inspectable entity contributes one synthetic header group (from its
//! [`InspectableEntity`] component) followed by one group per attached module
//! registered in the [`ModuleRegistry`]. Modules describe their members up front
//! through a [`ModuleDescriptor`], so discovery never needs open-ended reflection
//! over module types.

use core::any::TypeId;

use bevy::ecs::world::EntityRef;
use bevy::prelude::*;

use crate::error::InspectError;
use crate::reactive::{Action, Property};
use crate::value::FieldProperty;

/// Something offered for editing: an invocable action or a property.
#[derive(Clone)]
pub enum Member {
    Action(Action),
    Property(FieldProperty),
}

impl Member {
    pub fn property(property: impl Into<FieldProperty>) -> Self {
        Member::Property(property.into())
    }

    /// Actions must be flagged for the editor; properties must be editable
    /// and not a bulk collection.
    pub fn is_offered(&self) -> bool {
        match self {
            Member::Action(action) => action.show_in_editor(),
            Member::Property(property) => property.editable() && !property.is_bulk_collection(),
        }
    }
}

impl From<Action> for Member {
    fn from(action: Action) -> Self {
        Member::Action(action)
    }
}

impl From<FieldProperty> for Member {
    fn from(property: FieldProperty) -> Self {
        Member::Property(property)
    }
}

#[derive(Clone)]
pub struct InspectedMember {
    pub label: String,
    pub member: Member,
}

/// One tab worth of members.
#[derive(Clone)]
pub struct MemberGroup {
    pub label: String,
    pub members: Vec<InspectedMember>,
}

impl MemberGroup {
    pub fn labels(&self) -> Vec<&str> {
        self.members.iter().map(|m| m.label.as_str()).collect()
    }
}

/// Members of a group before filtering. `None` stands for an absent value.
struct RawGroup {
    label: String,
    editable: bool,
    members: Vec<(String, Option<Member>)>,
}

impl RawGroup {
    fn retain(self) -> Option<MemberGroup> {
        if !self.editable {
            return None;
        }
        let members: Vec<InspectedMember> = self
            .members
            .into_iter()
            .filter_map(|(label, member)| {
                member
                    .filter(Member::is_offered)
                    .map(|member| InspectedMember { label, member })
            })
            .collect();
        (!members.is_empty()).then_some(MemberGroup {
            label: self.label,
            members,
        })
    }
}

/// Entity-level members shown in the header group.
#[derive(Component, Clone)]
pub struct InspectableEntity {
    pub type_name: String,
    /// When false the header group is never shown.
    pub editable: bool,
    pub id: Property<String>,
    properties: Vec<(String, FieldProperty)>,
    actions: Vec<(String, Action)>,
}

impl InspectableEntity {
    pub fn new(type_name: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            editable: true,
            id: Property::new(id.into()),
            properties: Vec::new(),
            actions: Vec::new(),
        }
    }

    pub fn with_editable(mut self, editable: bool) -> Self {
        self.editable = editable;
        self
    }

    pub fn with_property(
        mut self,
        label: impl Into<String>,
        property: impl Into<FieldProperty>,
    ) -> Self {
        self.properties.push((label.into(), property.into()));
        self
    }

    pub fn with_action(mut self, label: impl Into<String>, action: Action) -> Self {
        self.actions.push((label.into(), action));
        self
    }

    /// `[Type entity]`
    pub fn header_label(&self) -> String {
        format!("[{} entity]", self.type_name)
    }

    /// ID first, then properties, then actions.
    fn header_group(&self) -> RawGroup {
        let id = (
            "ID".to_string(),
            Some(Member::property(self.id.clone())),
        );
        let properties = self
            .properties
            .iter()
            .map(|(label, property)| (label.clone(), Some(Member::Property(property.clone()))));
        let actions = self
            .actions
            .iter()
            .map(|(label, action)| (label.clone(), Some(Member::Action(action.clone()))));

        RawGroup {
            label: self.header_label(),
            editable: self.editable,
            members: core::iter::once(id).chain(properties).chain(actions).collect(),
        }
    }
}

type MemberAccessor<M> = Box<dyn Fn(&M) -> Option<Member> + Send + Sync>;

/// Ordered member table of one module type.
pub struct ModuleDescriptor<M> {
    entries: Vec<(String, MemberAccessor<M>)>,
}

impl<M> Default for ModuleDescriptor<M> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl<M: 'static> ModuleDescriptor<M> {
    pub fn property<P>(
        &mut self,
        label: impl Into<String>,
        accessor: impl Fn(&M) -> &P + Send + Sync + 'static,
    ) -> &mut Self
    where
        P: Clone + Into<FieldProperty>,
    {
        self.member(label, move |module| {
            Some(Member::property(accessor(module).clone()))
        })
    }

    pub fn action(
        &mut self,
        label: impl Into<String>,
        accessor: impl Fn(&M) -> &Action + Send + Sync + 'static,
    ) -> &mut Self {
        self.member(label, move |module| Some(Member::Action(accessor(module).clone())))
    }

    /// A member that may be absent at inspection time.
    pub fn member(
        &mut self,
        label: impl Into<String>,
        accessor: impl Fn(&M) -> Option<Member> + Send + Sync + 'static,
    ) -> &mut Self {
        self.entries.push((label.into(), Box::new(accessor)));
        self
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn read(&self, module: &M) -> Vec<(String, Option<Member>)> {
        self.entries
            .iter()
            .map(|(label, accessor)| (label.clone(), accessor(module)))
            .collect()
    }
}

/// A component type whose members can be shown in the inspector.
pub trait InspectableModule: Component + Sized {
    /// Lists the members in display order.
    fn describe(descriptor: &mut ModuleDescriptor<Self>);

    /// When false the module's group is skipped.
    fn module_editable(&self) -> bool {
        true
    }

    /// Tab title of the module's group.
    fn module_name() -> String {
        ShortName::of::<Self>().to_string()
    }
}

type ModuleReader = Box<dyn Fn(EntityRef<'_>) -> Option<RawGroup> + Send + Sync>;

struct RegisteredModule {
    type_id: TypeId,
    read: ModuleReader,
}

/// Registered module types, in registration order.
#[derive(Resource, Default)]
pub struct ModuleRegistry {
    modules: Vec<RegisteredModule>,
}

impl ModuleRegistry {
    /// Registers `M`. Returns false if it was already registered.
    pub fn register<M: InspectableModule>(&mut self) -> bool {
        let type_id = TypeId::of::<M>();
        if self.modules.iter().any(|module| module.type_id == type_id) {
            return false;
        }

        let mut descriptor = ModuleDescriptor::<M>::default();
        M::describe(&mut descriptor);
        let label = M::module_name();
        debug!("Registered inspectable module {label} ({} members)", descriptor.len());

        self.modules.push(RegisteredModule {
            type_id,
            read: Box::new(move |entity: EntityRef<'_>| {
                let module = entity.get::<M>()?;
                Some(RawGroup {
                    label: label.clone(),
                    editable: module.module_editable(),
                    members: descriptor.read(module),
                })
            }),
        });
        true
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    fn read_modules<'a>(&'a self, entity: EntityRef<'a>) -> impl Iterator<Item = RawGroup> + 'a {
        self.modules.iter().filter_map(move |module| (module.read)(entity))
    }
}

/// Enumerates the groups of an entity that have at least one offered member.
///
/// Order is stable for an unchanged entity: header group first, then modules
/// in registration order, members in declaration order.
pub fn enumerate(world: &World, entity: Entity) -> Result<Vec<MemberGroup>, InspectError> {
    let entity_ref = world
        .get_entity(entity)
        .map_err(|_| InspectError::EntityNotFound(entity))?;

    let header = entity_ref
        .get::<InspectableEntity>()
        .map(InspectableEntity::header_group);
    let modules = world
        .get_resource::<ModuleRegistry>()
        .into_iter()
        .flat_map(move |registry| registry.read_modules(entity_ref));

    Ok(header
        .into_iter()
        .chain(modules)
        .filter_map(RawGroup::retain)
        .collect())
}

/// Registration of inspectable modules on an [`App`].
pub trait InspectorAppExt {
    fn register_inspectable_module<M: InspectableModule>(&mut self) -> &mut Self;
}

impl InspectorAppExt for App {
    fn register_inspectable_module<M: InspectableModule>(&mut self) -> &mut Self {
        self.init_resource::<ModuleRegistry>();
        self.world_mut()
            .resource_mut::<ModuleRegistry>()
            .register::<M>();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::ValueKind;

    #[derive(Component)]
    struct Mover {
        speed: Property<f32>,
        locked: Property<f32>,
        waypoints: Property<Vec<Vec3>>,
        reset: Action,
        internal: Action,
        target: Option<Property<Vec3>>,
    }

    impl Mover {
        fn new() -> Self {
            Self {
                speed: Property::new(2.5),
                locked: Property::new(1.0).read_only(),
                waypoints: Property::new(vec![Vec3::ZERO]),
                reset: Action::new(|| {}).shown_in_editor(),
                internal: Action::new(|| {}),
                target: None,
            }
        }
    }

    impl InspectableModule for Mover {
        fn describe(descriptor: &mut ModuleDescriptor<Self>) {
            descriptor
                .property("Speed", |m| &m.speed)
                .property("Locked", |m| &m.locked)
                .property("Waypoints", |m| &m.waypoints)
                .member("Target", |m| m.target.clone().map(Member::property))
                .action("Reset", |m| &m.reset)
                .action("Internal", |m| &m.internal);
        }
    }

    #[derive(Component)]
    struct Frozen {
        mass: Property<f32>,
    }

    impl InspectableModule for Frozen {
        fn describe(descriptor: &mut ModuleDescriptor<Self>) {
            descriptor.property("Mass", |m| &m.mass);
        }

        fn module_editable(&self) -> bool {
            false
        }
    }

    fn world_with_modules() -> World {
        let mut world = World::new();
        let mut registry = ModuleRegistry::default();
        assert!(registry.register::<Mover>());
        assert!(registry.register::<Frozen>());
        assert!(!registry.register::<Mover>());
        world.insert_resource(registry);
        world
    }

    #[test]
    fn header_group_lists_id_properties_then_actions() {
        let mut world = world_with_modules();
        let entity = world
            .spawn(
                InspectableEntity::new("Player", "player-1")
                    .with_action("Respawn", Action::new(|| {}).shown_in_editor())
                    .with_property("Health", Property::new(100_i32)),
            )
            .id();

        let groups = enumerate(&world, entity).unwrap();
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].label, "[Player entity]");
        assert_eq!(groups[0].labels(), vec!["ID", "Health", "Respawn"]);
    }

    #[test]
    fn module_members_are_filtered_by_editability() {
        let mut world = world_with_modules();
        let entity = world
            .spawn((
                Mover::new(),
                Frozen {
                    mass: Property::new(3.0),
                },
            ))
            .id();

        let groups = enumerate(&world, entity).unwrap();
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].label, "Mover");
        assert_eq!(groups[0].labels(), vec!["Speed", "Reset"]);
        match &groups[0].members[0].member {
            Member::Property(property) => assert_eq!(property.kind(), ValueKind::Float),
            Member::Action(_) => panic!("expected a property"),
        }
    }

    #[test]
    fn absent_values_are_skipped_and_present_ones_kept() {
        let mut world = world_with_modules();
        let mut mover = Mover::new();
        mover.target = Some(Property::new(Vec3::ONE));
        let entity = world.spawn(mover).id();

        let groups = enumerate(&world, entity).unwrap();
        assert_eq!(groups[0].labels(), vec!["Speed", "Target", "Reset"]);
    }

    #[test]
    fn empty_groups_are_omitted() {
        let mut world = world_with_modules();
        let hidden_header = InspectableEntity::new("Prop", "p").with_editable(false);
        let read_only_header = InspectableEntity::new("Prop", "p");
        read_only_header.id.set_editable(false);

        let a = world.spawn(hidden_header).id();
        let b = world.spawn(read_only_header).id();

        assert!(enumerate(&world, a).unwrap().is_empty());
        assert!(enumerate(&world, b).unwrap().is_empty());
    }

    #[test]
    fn enumeration_is_stable_across_calls() {
        let mut world = world_with_modules();
        let entity = world
            .spawn((InspectableEntity::new("Crate", "c"), Mover::new()))
            .id();

        let first: Vec<Vec<String>> = enumerate(&world, entity)
            .unwrap()
            .iter()
            .map(|g| g.labels().into_iter().map(String::from).collect())
            .collect();
        let second: Vec<Vec<String>> = enumerate(&world, entity)
            .unwrap()
            .iter()
            .map(|g| g.labels().into_iter().map(String::from).collect())
            .collect();
        assert_eq!(first, second);
        assert_eq!(first.len(), 2);
    }

    #[test]
    fn missing_entity_is_reported() {
        let mut world = World::new();
        let entity = world.spawn_empty().id();
        world.despawn(entity);
        assert_eq!(
            enumerate(&world, entity).err(),
            Some(InspectError::EntityNotFound(entity))
        );
    }
}
