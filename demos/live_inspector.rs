//! Demonstrates the live inspector window.
//!
//! A few moving squares carry a `Mover` module whose properties drive the
//! simulation. Select squares from the command menu (or with `N`) and edit
//! their fields in the inspector window; changes apply on the next frame.

use std::sync::{Arc, Mutex};

use bevy::prelude::*;
use live_inspector::LiveInspectorPlugin;
use live_inspector::command_menu::{Chord, CommandEntry, CommandList};
use live_inspector::inspection::{
    InspectableEntity, InspectableModule, InspectorAppExt, Member, ModuleDescriptor,
};
use live_inspector::inspector::{EditMode, SelectionSet};
use live_inspector::reactive::{Action, Property};
use live_inspector::value::EnumProperty;

fn main() {
    App::new()
        .add_plugins(DefaultPlugins)
        .add_plugins(LiveInspectorPlugin)
        .register_inspectable_module::<Mover>()
        .init_resource::<DemoRequests>()
        .add_systems(Startup, (setup, register_commands))
        .add_systems(Update, (apply_demo_requests, move_squares).chain())
        .run();
}

#[derive(Reflect, Clone, Copy, Debug, PartialEq)]
enum Motion {
    Bounce,
    Wrap,
    Still,
}

/// Simulation module edited through the inspector.
#[derive(Component)]
struct Mover {
    speed: Property<f32>,
    direction: Property<Vec2>,
    tint: Property<Color>,
    motion: Property<Motion>,
    label: Property<String>,
    reset: Action,
}

impl InspectableModule for Mover {
    fn describe(descriptor: &mut ModuleDescriptor<Self>) {
        descriptor
            .property("Speed", |m| &m.speed)
            .property("Direction", |m| &m.direction)
            .property("Tint", |m| &m.tint)
            .member("Motion", |m| {
                Some(Member::property(EnumProperty::new(m.motion.clone())))
            })
            .property("Label", |m| &m.label)
            .action("Reset", |m| &m.reset);
    }
}

impl Mover {
    fn new(speed: f32, direction: Vec2, tint: Color) -> Self {
        let speed = Property::new(speed);
        let direction = Property::new(direction);
        let reset = {
            let speed = speed.clone();
            let direction = direction.clone();
            Action::new(move || {
                speed.set(100.0);
                direction.set(Vec2::X);
            })
            .shown_in_editor()
        };
        Self {
            speed,
            direction,
            tint: Property::new(tint),
            motion: Property::new(Motion::Bounce),
            label: Property::new("square".to_string()),
            reset,
        }
    }
}

/// World changes requested by command actions, applied by a system.
#[derive(Resource, Clone, Default)]
struct DemoRequests(Arc<Mutex<Vec<DemoRequest>>>);

#[derive(Clone, Copy, Debug)]
enum DemoRequest {
    SelectNext,
    SelectAll,
    ClearSelection,
    ToggleEditMode,
    SpawnSquare,
}

impl DemoRequests {
    fn action(&self, request: DemoRequest) -> Action {
        let queue = self.0.clone();
        Action::new(move || {
            if let Ok(mut queue) = queue.lock() {
                queue.push(request);
            }
        })
    }

    fn drain(&self) -> Vec<DemoRequest> {
        self.0
            .lock()
            .map(|mut queue| std::mem::take(&mut *queue))
            .unwrap_or_default()
    }
}

fn setup(mut commands: Commands) {
    commands.spawn(Camera2d);

    let squares = [
        (Vec2::new(-150.0, 0.0), 120.0, Vec2::new(1.0, 0.5), Color::srgb(0.9, 0.3, 0.3)),
        (Vec2::new(0.0, 80.0), 80.0, Vec2::new(-0.5, 1.0), Color::srgb(0.3, 0.9, 0.3)),
        (Vec2::new(150.0, -60.0), 160.0, Vec2::new(0.2, -1.0), Color::srgb(0.3, 0.3, 0.9)),
    ];
    for (index, (position, speed, direction, tint)) in squares.into_iter().enumerate() {
        spawn_square(&mut commands, index, position, speed, direction, tint);
    }

    let instructions = "\
Check the Inspector Window!

N  select the next square
A  select every square
Ctrl+E  toggle edit mode
S  spawn a square

Click a field to edit it; Enter commits, Escape cancels.";

    commands.spawn((
        Text::new(instructions),
        Node {
            position_type: PositionType::Absolute,
            top: Val::Px(12.0),
            left: Val::Px(12.0),
            ..default()
        },
        TextFont {
            font_size: 16.0,
            ..default()
        },
    ));
}

fn spawn_square(
    commands: &mut Commands,
    index: usize,
    position: Vec2,
    speed: f32,
    direction: Vec2,
    tint: Color,
) {
    let mover = Mover::new(speed, direction, tint);
    let size = Property::new(30.0_f32);
    commands.spawn((
        Sprite {
            color: tint,
            custom_size: Some(Vec2::splat(30.0)),
            ..default()
        },
        Transform::from_translation(position.extend(0.0)),
        Name::new(format!("Square {index}")),
        InspectableEntity::new("Square", format!("square-{index}")).with_property("Size", size),
        mover,
    ));
}

fn register_commands(requests: Res<DemoRequests>, mut command_list: ResMut<CommandList>) {
    let edit_mode_action = requests.action(DemoRequest::ToggleEditMode);
    command_list.push(
        CommandEntry::new("Select next", requests.action(DemoRequest::SelectNext))
            .with_chord(Chord::key(KeyCode::KeyN)),
    );
    command_list.push(
        CommandEntry::new("Select all", requests.action(DemoRequest::SelectAll))
            .with_chord(Chord::key(KeyCode::KeyA)),
    );
    command_list.push(CommandEntry::new(
        "Clear selection",
        requests.action(DemoRequest::ClearSelection),
    ));
    command_list.push(
        CommandEntry::new("Toggle edit mode", edit_mode_action)
            .with_chord(Chord::with_modifier(KeyCode::ControlLeft, KeyCode::KeyE)),
    );
    command_list.push(
        CommandEntry::new("Spawn square", requests.action(DemoRequest::SpawnSquare))
            .with_chord(Chord::key(KeyCode::KeyS)),
    );
}

fn apply_demo_requests(
    mut commands: Commands,
    requests: Res<DemoRequests>,
    mut selection: ResMut<SelectionSet>,
    mut edit_mode: ResMut<EditMode>,
    squares: Query<Entity, With<Mover>>,
) {
    for request in requests.drain() {
        info!("Demo request {request:?}");
        let mut all: Vec<Entity> = squares.iter().collect();
        all.sort();
        match request {
            DemoRequest::SelectNext => {
                let next = selection
                    .entities()
                    .first()
                    .and_then(|current| all.iter().position(|e| e == current))
                    .map_or(0, |index| (index + 1) % all.len().max(1));
                if let Some(&entity) = all.get(next) {
                    selection.set([entity]);
                }
            }
            DemoRequest::SelectAll => selection.set(all),
            DemoRequest::ClearSelection => selection.clear(),
            DemoRequest::ToggleEditMode => edit_mode.0 = !edit_mode.0,
            DemoRequest::SpawnSquare => {
                let index = all.len();
                let x = (index as f32 * 57.0) % 300.0 - 150.0;
                spawn_square(
                    &mut commands,
                    index,
                    Vec2::new(x, 0.0),
                    100.0,
                    Vec2::new(0.7, 0.7),
                    Color::srgb(0.9, 0.8, 0.2),
                );
            }
        }
    }
}

/// Reads the module properties every frame; edits show up immediately.
fn move_squares(time: Res<Time>, mut squares: Query<(&Mover, &mut Transform, &mut Sprite)>) {
    const BOUNDS: Vec2 = Vec2::new(300.0, 200.0);
    for (mover, mut transform, mut sprite) in &mut squares {
        sprite.color = mover.tint.get();
        let motion = mover.motion.get();
        if motion == Motion::Still {
            continue;
        }

        let direction = mover.direction.get().normalize_or_zero();
        let step = direction * mover.speed.get() * time.delta_secs();
        let mut position = transform.translation.truncate() + step;

        match motion {
            Motion::Bounce => {
                let mut bounced = direction;
                if position.x.abs() > BOUNDS.x {
                    bounced.x = -bounced.x;
                }
                if position.y.abs() > BOUNDS.y {
                    bounced.y = -bounced.y;
                }
                if bounced != direction {
                    mover.direction.set(bounced);
                }
                position = position.clamp(-BOUNDS, BOUNDS);
            }
            Motion::Wrap => {
                if position.x.abs() > BOUNDS.x {
                    position.x = -position.x.signum() * BOUNDS.x;
                }
                if position.y.abs() > BOUNDS.y {
                    position.y = -position.y.signum() * BOUNDS.y;
                }
            }
            Motion::Still => {}
        }
        transform.translation = position.extend(transform.translation.z);
    }
}
