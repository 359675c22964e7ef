//! Text field widget.
//!
//! Editing works like this:
//! 1. Click the field to start editing; the buffer starts from the shown value
//! 2. Type; an [`InputPattern`] filters keystrokes of numeric fields
//! 3. Enter commits a single-line field, Escape cancels, losing focus commits
//!
//! The widget never writes values itself. It queues [`WidgetEvent`]s for the
//! inspector, which hands them to the field's binding.

use bevy::ecs::observer::On;
use bevy::input::ButtonState;
use bevy::input::keyboard::{Key, KeyboardInput};
use bevy::input_focus::{FocusedInput, InputFocus};
use bevy::picking::events::{Click, Pointer};
use bevy::prelude::*;

use crate::inspector::config::InspectorConfig;
use crate::value::InputPattern;
use crate::widget_tree::{WidgetEvent, WidgetId};

/// A text field mirroring one [`WidgetId`] of the widget tree.
#[derive(Component, Clone, Debug)]
#[require(TextFieldEditState, Interaction)]
pub struct TextField {
    pub widget: WidgetId,
    /// Committed contents, as last published by the widget tree.
    pub value: String,
    pub multiline: bool,
    pub pattern: Option<InputPattern>,
    /// Placeholders never enter editing.
    pub read_only: bool,
}

/// Editing state of a [`TextField`].
#[derive(Component, Default, Debug)]
pub struct TextFieldEditState {
    pub editing: bool,
    pub buffer: String,
}

/// Widget events queued by UI observers until the inspector handles them.
#[derive(Resource, Default)]
pub struct PendingWidgetEvents {
    pub events: Vec<WidgetEvent>,
}

impl PendingWidgetEvents {
    pub fn push(&mut self, event: WidgetEvent) {
        self.events.push(event);
    }
}

/// What a key press did to an editing field.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum KeyOutcome {
    Edited,
    Commit,
    Cancel,
    Ignored,
}

/// Applies one pressed key to the edit buffer.
pub fn apply_key(field: &TextField, state: &mut TextFieldEditState, key: &Key) -> KeyOutcome {
    match key {
        Key::Enter if field.multiline => {
            state.buffer.push('\n');
            KeyOutcome::Edited
        }
        Key::Enter => KeyOutcome::Commit,
        Key::Escape => KeyOutcome::Cancel,
        Key::Backspace => {
            if state.buffer.pop().is_some() {
                KeyOutcome::Edited
            } else {
                KeyOutcome::Ignored
            }
        }
        Key::Space if field.pattern.is_none() => {
            state.buffer.push(' ');
            KeyOutcome::Edited
        }
        Key::Character(chars) => {
            let mut edited = false;
            for ch in chars.chars() {
                let accepted = field
                    .pattern
                    .is_none_or(|pattern| pattern.accepts_keystroke(&state.buffer, ch));
                if accepted {
                    state.buffer.push(ch);
                    edited = true;
                }
            }
            if edited {
                KeyOutcome::Edited
            } else {
                KeyOutcome::Ignored
            }
        }
        _ => KeyOutcome::Ignored,
    }
}

/// Enters editing with the buffer seeded from the shown value.
/// Returns false for read-only fields and fields already editing.
pub fn begin_edit(field: &TextField, state: &mut TextFieldEditState) -> bool {
    if field.read_only || state.editing {
        return false;
    }
    state.editing = true;
    state.buffer = field.value.clone();
    true
}

// Observer: a click starts editing
fn text_field_on_click(
    mut click: On<Pointer<Click>>,
    mut fields: Query<(&TextField, &mut TextFieldEditState)>,
    mut input_focus: ResMut<InputFocus>,
    mut pending: ResMut<PendingWidgetEvents>,
) {
    let Ok((field, mut state)) = fields.get_mut(click.entity) else {
        return;
    };
    click.propagate(false);
    if !begin_edit(field, &mut state) {
        return;
    }

    input_focus.set(click.entity);
    pending.push(WidgetEvent::EditingStarted {
        widget: field.widget,
    });
}

// Observer: keyboard input while editing
fn text_field_on_keyboard_input(
    trigger: On<FocusedInput<KeyboardInput>>,
    mut fields: Query<(&TextField, &mut TextFieldEditState)>,
    mut input_focus: ResMut<InputFocus>,
    mut pending: ResMut<PendingWidgetEvents>,
) {
    if trigger.input.state != ButtonState::Pressed {
        return;
    }

    let entity = trigger.focused_entity;
    let Ok((field, mut state)) = fields.get_mut(entity) else {
        return;
    };
    if !state.editing {
        return;
    }

    match apply_key(field, &mut state, &trigger.input.logical_key) {
        KeyOutcome::Commit => {
            commit(field, &mut state, &mut pending);
            input_focus.clear();
        }
        KeyOutcome::Cancel => {
            state.editing = false;
            state.buffer.clear();
            input_focus.clear();
            pending.push(WidgetEvent::EditingCancelled {
                widget: field.widget,
            });
        }
        KeyOutcome::Edited | KeyOutcome::Ignored => {}
    }
}

fn commit(field: &TextField, state: &mut TextFieldEditState, pending: &mut PendingWidgetEvents) {
    state.editing = false;
    pending.push(WidgetEvent::TextSubmitted {
        widget: field.widget,
        text: std::mem::take(&mut state.buffer),
    });
}

/// Commits every editing field that no longer has input focus.
pub fn commit_on_focus_loss(
    input_focus: Res<InputFocus>,
    mut fields: Query<(Entity, &TextField, &mut TextFieldEditState)>,
    mut pending: ResMut<PendingWidgetEvents>,
) {
    for (entity, field, mut state) in &mut fields {
        if state.editing && input_focus.get() != Some(entity) {
            commit(field, &mut state, &mut pending);
        }
    }
}

/// Shows the edit buffer with a cursor while editing, the committed value
/// otherwise.
fn update_text_field_display(
    config: Res<InspectorConfig>,
    mut fields: Query<
        (&TextField, &TextFieldEditState, &Children, &mut BackgroundColor),
        Or<(Changed<TextField>, Changed<TextFieldEditState>)>,
    >,
    mut texts: Query<&mut Text>,
) {
    for (field, state, children, mut background) in &mut fields {
        let shown = if state.editing {
            format!("{}|", state.buffer)
        } else {
            field.value.clone()
        };
        background.0 = if state.editing {
            config.field_editing_background
        } else {
            config.field_background
        };
        for child in children.iter() {
            if let Ok(mut text) = texts.get_mut(child)
                && text.0 != shown
            {
                text.0.clone_from(&shown);
            }
        }
    }
}

/// Plugin that adds the text field observers.
pub struct TextFieldPlugin;

impl Plugin for TextFieldPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<PendingWidgetEvents>()
            .add_observer(text_field_on_click)
            .add_observer(text_field_on_keyboard_input)
            .add_systems(PostUpdate, update_text_field_display);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::widget_tree::{UiContext, WidgetKind};

    fn field(pattern: Option<InputPattern>, multiline: bool) -> (WidgetId, TextField) {
        let ui = UiContext::new();
        let widget = ui.spawn(WidgetKind::TextField, None, "");
        let field = TextField {
            widget,
            value: String::new(),
            multiline,
            pattern,
            read_only: false,
        };
        (widget, field)
    }

    fn type_keys(field: &TextField, state: &mut TextFieldEditState, keys: &[Key]) -> Vec<KeyOutcome> {
        keys.iter().map(|key| apply_key(field, state, key)).collect()
    }

    #[test]
    fn decimal_fields_filter_keystrokes() {
        let (_, field) = field(Some(InputPattern::Decimal), false);
        let mut state = TextFieldEditState::default();

        let outcomes = type_keys(
            &field,
            &mut state,
            &[
                Key::Character("1".into()),
                Key::Character("x".into()),
                Key::Character(".".into()),
                Key::Character("5".into()),
                Key::Space,
                Key::Character(".".into()),
            ],
        );

        assert_eq!(state.buffer, "1.5");
        assert_eq!(outcomes[1], KeyOutcome::Ignored);
        assert_eq!(outcomes[4], KeyOutcome::Ignored);
        assert_eq!(outcomes[5], KeyOutcome::Ignored);
        assert_eq!(apply_key(&field, &mut state, &Key::Enter), KeyOutcome::Commit);
    }

    #[test]
    fn multiline_fields_take_enter_as_newline() {
        let (_, field) = field(None, true);
        let mut state = TextFieldEditState::default();

        type_keys(
            &field,
            &mut state,
            &[
                Key::Character("a".into()),
                Key::Enter,
                Key::Character("b".into()),
                Key::Space,
            ],
        );
        assert_eq!(state.buffer, "a\nb ");
        assert_eq!(apply_key(&field, &mut state, &Key::Escape), KeyOutcome::Cancel);
    }

    #[test]
    fn backspace_on_empty_buffer_is_ignored() {
        let (_, field) = field(None, false);
        let mut state = TextFieldEditState::default();
        assert_eq!(apply_key(&field, &mut state, &Key::Backspace), KeyOutcome::Ignored);
        state.buffer.push('q');
        assert_eq!(apply_key(&field, &mut state, &Key::Backspace), KeyOutcome::Edited);
        assert!(state.buffer.is_empty());
    }

    #[test]
    fn read_only_fields_never_enter_editing() {
        let (_, mut field) = field(None, false);
        field.value = "shown".to_string();
        field.read_only = true;
        let mut state = TextFieldEditState::default();
        assert!(!begin_edit(&field, &mut state));
        assert!(!state.editing);

        field.read_only = false;
        assert!(begin_edit(&field, &mut state));
        assert_eq!(state.buffer, "shown");
        assert!(!begin_edit(&field, &mut state));
    }

    #[test]
    fn losing_focus_commits_the_buffer() {
        let (widget, field) = field(None, false);
        let mut app = App::new();
        app.init_resource::<InputFocus>()
            .init_resource::<PendingWidgetEvents>()
            .add_systems(Update, commit_on_focus_loss);
        app.world_mut().spawn((
            field,
            TextFieldEditState {
                editing: true,
                buffer: "draft".to_string(),
            },
        ));

        app.update();
        app.update();

        let pending = app.world().resource::<PendingWidgetEvents>();
        assert_eq!(
            pending.events,
            vec![WidgetEvent::TextSubmitted {
                widget,
                text: "draft".to_string()
            }]
        );
    }
}
