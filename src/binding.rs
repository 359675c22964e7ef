//! Two-way bindings between editor widgets and backing properties.
//!
//! A binding paints the widget once from the backing value, subscribes so that
//! external changes repaint it, and turns user events on the widget into writes.
//! Repaints go through plain widget setters, which never report events, so an
//! external change cannot loop back into a write.
//!
//! Each binding owns exactly one subscription. [`BindingSet::release_all`] drops
//! them all; a released binding never touches its widget again.

use bevy::log::debug;
use bevy::platform::collections::HashMap;

use crate::reactive::{Action, Property, Subscription};
use crate::value::{EnumProperty, NumericValue};
use crate::widget_tree::{UiContext, WidgetEvent, WidgetId};

/// The live edge between one widget and one member.
pub trait FieldBinding: Send + Sync {
    fn widget(&self) -> WidgetId;

    /// Applies a user event aimed at this binding's widget.
    /// Returns false if the event kind means nothing to this binding.
    fn handle(&self, ui: &UiContext, event: &WidgetEvent) -> bool;

    /// Drops the backing-store subscription.
    fn release(self: Box<Self>);
}

/// One numeric component of a property shown in a text field.
pub struct NumericBinding<T> {
    widget: WidgetId,
    property: Property<T>,
    component: usize,
    subscription: Subscription,
}

impl<T: NumericValue> NumericBinding<T> {
    pub fn bind(ui: &UiContext, widget: WidgetId, property: Property<T>, component: usize) -> Self {
        let format = T::FORMAT;
        ui.set_pattern(widget, Some(format.pattern()));
        ui.set_text(widget, format.render(property.get().component(component)));

        let repaint = ui.clone();
        let subscription = property.subscribe(move |value: &T| {
            repaint.set_text(widget, format.render(value.component(component)));
        });

        Self {
            widget,
            property,
            component,
            subscription,
        }
    }

    fn rendered_backing_value(&self) -> String {
        T::FORMAT.render(self.property.get().component(self.component))
    }

    fn commit(&self, ui: &UiContext, text: &str) {
        let format = T::FORMAT;
        match format.parse(text) {
            Ok(value) if text.trim() != self.rendered_backing_value() => {
                let component = self.component;
                self.property
                    .update(|current| current.set_component(component, value));
            }
            Ok(_) => {}
            Err(error) => debug!("Rejected edit on {:?}: {error}", self.widget),
        }
        self.restore(ui);
    }

    fn restore(&self, ui: &UiContext) {
        ui.set_text(self.widget, self.rendered_backing_value());
        ui.set_editing(self.widget, false);
    }
}

impl<T: NumericValue> FieldBinding for NumericBinding<T> {
    fn widget(&self) -> WidgetId {
        self.widget
    }

    fn handle(&self, ui: &UiContext, event: &WidgetEvent) -> bool {
        match event {
            WidgetEvent::TextSubmitted { text, .. } => self.commit(ui, text),
            WidgetEvent::EditingStarted { .. } => {
                ui.set_editing(self.widget, true);
            }
            WidgetEvent::EditingCancelled { .. } => self.restore(ui),
            _ => return false,
        }
        true
    }

    fn release(self: Box<Self>) {
        self.subscription.release();
    }
}

/// A string property shown in a (possibly multi-line) text field.
pub struct TextBinding {
    widget: WidgetId,
    property: Property<String>,
    subscription: Subscription,
}

impl TextBinding {
    pub fn bind(ui: &UiContext, widget: WidgetId, property: Property<String>) -> Self {
        let value = property.get();
        ui.set_multiline(widget, value.contains('\n'));
        ui.set_text(widget, value);

        let repaint = ui.clone();
        let subscription = property.subscribe(move |value: &String| {
            repaint.set_text(widget, value.clone());
        });

        Self {
            widget,
            property,
            subscription,
        }
    }
}

impl FieldBinding for TextBinding {
    fn widget(&self) -> WidgetId {
        self.widget
    }

    fn handle(&self, ui: &UiContext, event: &WidgetEvent) -> bool {
        match event {
            WidgetEvent::TextSubmitted { text, .. } => {
                if self.property.get() != *text {
                    self.property.set(text.clone());
                }
                ui.set_editing(self.widget, false);
            }
            WidgetEvent::EditingStarted { .. } => {
                ui.set_editing(self.widget, true);
            }
            WidgetEvent::EditingCancelled { .. } => {
                ui.set_text(self.widget, self.property.get());
                ui.set_editing(self.widget, false);
            }
            _ => return false,
        }
        true
    }

    fn release(self: Box<Self>) {
        self.subscription.release();
    }
}

/// A bool property shown as a checkbox.
///
/// Every committed toggle also raises the inspector's needs-save flag.
pub struct ToggleBinding {
    widget: WidgetId,
    property: Property<bool>,
    needs_save: Property<bool>,
    subscription: Subscription,
}

impl ToggleBinding {
    pub fn bind(
        ui: &UiContext,
        widget: WidgetId,
        property: Property<bool>,
        needs_save: Property<bool>,
    ) -> Self {
        ui.set_checked(widget, property.get());

        let repaint = ui.clone();
        let subscription = property.subscribe(move |checked: &bool| {
            repaint.set_checked(widget, *checked);
        });

        Self {
            widget,
            property,
            needs_save,
            subscription,
        }
    }
}

impl FieldBinding for ToggleBinding {
    fn widget(&self) -> WidgetId {
        self.widget
    }

    fn handle(&self, ui: &UiContext, event: &WidgetEvent) -> bool {
        let WidgetEvent::Toggled { checked, .. } = event else {
            return false;
        };
        self.needs_save.set(true);
        self.property.set(*checked);
        ui.set_checked(self.widget, self.property.get());
        true
    }

    fn release(self: Box<Self>) {
        self.subscription.release();
    }
}

/// An enum property shown as a drop-down of its variants.
pub struct ChoiceBinding {
    widget: WidgetId,
    property: EnumProperty,
    subscription: Subscription,
}

impl ChoiceBinding {
    pub fn bind(ui: &UiContext, widget: WidgetId, property: EnumProperty) -> Self {
        let options = property
            .variant_names()
            .iter()
            .map(|name| name.to_string())
            .collect();
        ui.set_options(widget, options);
        ui.select_option(widget, Some(property.selected()));

        let repaint = ui.clone();
        let subscription = property.subscribe(move |index| {
            repaint.select_option(widget, Some(index));
        });

        Self {
            widget,
            property,
            subscription,
        }
    }
}

impl FieldBinding for ChoiceBinding {
    fn widget(&self) -> WidgetId {
        self.widget
    }

    fn handle(&self, ui: &UiContext, event: &WidgetEvent) -> bool {
        let WidgetEvent::OptionSelected { index, .. } = event else {
            return false;
        };
        if !self.property.select(*index) {
            debug!("Variant {index} of {:?} cannot be written back", self.widget);
            ui.select_option(self.widget, Some(self.property.selected()));
        }
        true
    }

    fn release(self: Box<Self>) {
        self.subscription.release();
    }
}

/// A trigger widget that invokes an action and nothing else.
pub struct TriggerBinding {
    widget: WidgetId,
    action: Action,
}

impl TriggerBinding {
    pub fn bind(widget: WidgetId, action: Action) -> Self {
        Self { widget, action }
    }
}

impl FieldBinding for TriggerBinding {
    fn widget(&self) -> WidgetId {
        self.widget
    }

    fn handle(&self, _ui: &UiContext, event: &WidgetEvent) -> bool {
        if !matches!(event, WidgetEvent::Clicked { .. }) {
            return false;
        }
        self.action.invoke();
        true
    }

    fn release(self: Box<Self>) {}
}

/// All bindings of one built tree, keyed by widget.
#[derive(Default)]
pub struct BindingSet {
    bindings: HashMap<WidgetId, Box<dyn FieldBinding>>,
}

impl BindingSet {
    /// Adds a binding, releasing any previous binding of the same widget.
    pub fn insert(&mut self, binding: Box<dyn FieldBinding>) {
        if let Some(previous) = self.bindings.insert(binding.widget(), binding) {
            previous.release();
        }
    }

    /// Routes an event to the binding of its widget.
    pub fn dispatch(&self, ui: &UiContext, event: &WidgetEvent) -> bool {
        self.bindings
            .get(&event.widget())
            .is_some_and(|binding| binding.handle(ui, event))
    }

    pub fn contains(&self, widget: WidgetId) -> bool {
        self.bindings.contains_key(&widget)
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// Releases every binding. Returns how many were released.
    pub fn release_all(&mut self) -> usize {
        let count = self.bindings.len();
        for (_, binding) in self.bindings.drain() {
            binding.release();
        }
        count
    }
}

impl Drop for BindingSet {
    fn drop(&mut self) {
        self.release_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::widget_tree::WidgetKind;
    use bevy::prelude::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn field(ui: &UiContext) -> WidgetId {
        ui.spawn(WidgetKind::TextField, None, "")
    }

    fn submit(widget: WidgetId, text: &str) -> WidgetEvent {
        WidgetEvent::TextSubmitted {
            widget,
            text: text.to_string(),
        }
    }

    #[test]
    fn float_field_rejects_malformed_input_and_reverts() {
        let ui = UiContext::new();
        let widget = field(&ui);
        let speed = Property::new(2.5_f32);
        let binding = NumericBinding::bind(&ui, widget, speed.clone(), 0);
        assert_eq!(ui.text(widget).as_deref(), Some("2.50"));

        ui.set_text(widget, "abc");
        binding.handle(&ui, &WidgetEvent::EditingStarted { widget });
        binding.handle(&ui, &submit(widget, "abc"));
        assert_eq!(speed.get(), 2.5);
        assert_eq!(ui.text(widget).as_deref(), Some("2.50"));
        assert!(!ui.widget(widget).unwrap().editing);

        binding.handle(&ui, &submit(widget, "4"));
        assert_eq!(speed.get(), 4.0);
        assert_eq!(ui.text(widget).as_deref(), Some("4.00"));
    }

    #[test]
    fn submitting_rendered_text_leaves_value_unchanged() {
        let ui = UiContext::new();
        let widget = field(&ui);
        let drag = Property::new(0.125_f32);
        let writes = Arc::new(AtomicUsize::new(0));
        let counter = writes.clone();
        let _watch = drag.subscribe(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        let binding = NumericBinding::bind(&ui, widget, drag.clone(), 0);

        let rendered = ui.text(widget).unwrap();
        binding.handle(&ui, &submit(widget, &rendered));

        assert_eq!(drag.get(), 0.125);
        assert_eq!(writes.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn small_float_accepts_values_with_the_same_rendering() {
        let ui = UiContext::new();
        let widget = field(&ui);
        let threshold = Property::new(0.001_f32);
        let binding = NumericBinding::bind(&ui, widget, threshold.clone(), 0);
        assert_eq!(ui.text(widget).as_deref(), Some("0.00"));

        binding.handle(&ui, &submit(widget, "0"));
        assert_eq!(threshold.get(), 0.0);

        binding.handle(&ui, &submit(widget, "0.004"));
        assert_eq!(threshold.get(), 0.004);
        assert_eq!(ui.text(widget).as_deref(), Some("0.00"));
    }

    #[test]
    fn external_change_repaints_without_writing_back() {
        let ui = UiContext::new();
        let widget = field(&ui);
        let position = Property::new(Vec3::new(1.0, 2.0, 3.0));
        let _binding = NumericBinding::bind(&ui, widget, position.clone(), 1);
        assert_eq!(ui.text(widget).as_deref(), Some("2.00"));

        position.set(Vec3::new(1.0, 7.25, 3.0));
        assert_eq!(ui.text(widget).as_deref(), Some("7.25"));
        assert_eq!(position.subscriber_count(), 1);
    }

    #[test]
    fn axis_commit_only_touches_its_component() {
        let ui = UiContext::new();
        let widget = field(&ui);
        let cell = Property::new(IVec3::new(1, 2, 3));
        let binding = NumericBinding::bind(&ui, widget, cell.clone(), 2);

        binding.handle(&ui, &submit(widget, "9"));
        assert_eq!(cell.get(), IVec3::new(1, 2, 9));
        binding.handle(&ui, &submit(widget, "1.5"));
        assert_eq!(cell.get(), IVec3::new(1, 2, 9));
        assert_eq!(ui.text(widget).as_deref(), Some("9"));
    }

    #[test]
    fn text_field_marks_multiline_and_writes_on_change() {
        let ui = UiContext::new();
        let widget = field(&ui);
        let notes = Property::new("first\nsecond".to_string());
        let binding = TextBinding::bind(&ui, widget, notes.clone());
        assert!(ui.widget(widget).unwrap().multiline);

        binding.handle(&ui, &submit(widget, "third"));
        assert_eq!(notes.get(), "third");
        assert_eq!(ui.text(widget).as_deref(), Some("third"));
    }

    #[test]
    fn toggle_writes_and_raises_needs_save() {
        let ui = UiContext::new();
        let widget = ui.spawn(WidgetKind::CheckBox, None, "");
        let enabled = Property::new(false);
        let needs_save = Property::new(false);
        let binding = ToggleBinding::bind(&ui, widget, enabled.clone(), needs_save.clone());

        binding.handle(&ui, &WidgetEvent::Toggled { widget, checked: true });
        assert!(enabled.get());
        assert!(needs_save.get());

        enabled.set(false);
        assert!(!ui.widget(widget).unwrap().checked);
    }

    #[test]
    fn trigger_invokes_action_on_click_only() {
        let ui = UiContext::new();
        let widget = ui.spawn(WidgetKind::Button, None, "[Execute]");
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = hits.clone();
        let binding = TriggerBinding::bind(
            widget,
            Action::new(move || {
                counter.fetch_add(1, Ordering::SeqCst);
            }),
        );

        assert!(!binding.handle(&ui, &submit(widget, "x")));
        assert!(binding.handle(&ui, &WidgetEvent::Clicked { widget }));
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn release_all_drops_every_subscription() {
        let ui = UiContext::new();
        let speed = Property::new(1.0_f32);
        let mut set = BindingSet::default();
        for _ in 0..3 {
            let widget = field(&ui);
            set.insert(Box::new(NumericBinding::bind(&ui, widget, speed.clone(), 0)));
        }
        assert_eq!(speed.subscriber_count(), 3);

        assert_eq!(set.release_all(), 3);
        assert_eq!(speed.subscriber_count(), 0);
        assert!(set.is_empty());
    }

    #[test]
    fn rebinding_a_widget_replaces_its_subscription() {
        let ui = UiContext::new();
        let widget = field(&ui);
        let speed = Property::new(1.0_f32);
        let mut set = BindingSet::default();
        set.insert(Box::new(NumericBinding::bind(&ui, widget, speed.clone(), 0)));
        set.insert(Box::new(NumericBinding::bind(&ui, widget, speed.clone(), 0)));
        assert_eq!(set.len(), 1);
        assert_eq!(speed.subscriber_count(), 1);
    }
}
