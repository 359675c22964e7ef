//! Retained widget model.
//!
//! The inspector builds its UI into a [`UiTree`] reached through a shared
//! [`UiContext`]. The tree is toolkit-neutral: the Bevy presenter mirrors it into
//! `bevy_ui` nodes and routes user input back as [`WidgetEvent`]s, and tests read
//! it directly.
//!
//! Two counters describe change: `generation` moves when widgets are created or
//! destroyed (the presenter re-spawns), `revision` moves on any change at all (the
//! presenter patches text and visibility).

use std::sync::{Arc, Mutex};

use bevy::platform::collections::HashMap;

use crate::reactive::lock;
use crate::value::InputPattern;

/// Identity of a widget. Never reused within one tree.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WidgetId(u64);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WidgetKind {
    /// Vertical container.
    Panel,
    /// Horizontal container.
    Row,
    /// Container showing one [`WidgetKind::Tab`] child at a time.
    TabHost,
    /// A page of a tab host; its text is the tab title.
    Tab,
    Label,
    /// Clickable label.
    Header,
    TextField,
    CheckBox,
    DropDown,
    Button,
}

/// State of one widget.
#[derive(Clone, Debug)]
pub struct Widget {
    pub kind: WidgetKind,
    pub parent: Option<WidgetId>,
    pub children: Vec<WidgetId>,
    /// Label text, field contents, button caption or tab title.
    pub text: String,
    pub checked: bool,
    pub options: Vec<String>,
    pub selected: Option<usize>,
    pub visible: bool,
    pub highlighted: bool,
    /// Whether a text field is in its selected/editing state.
    pub editing: bool,
    pub multiline: bool,
    pub pattern: Option<InputPattern>,
    pub width: Option<f32>,
}

impl Widget {
    fn new(kind: WidgetKind, parent: Option<WidgetId>, text: String) -> Self {
        Self {
            kind,
            parent,
            children: Vec::new(),
            text,
            checked: false,
            options: Vec::new(),
            selected: None,
            visible: true,
            highlighted: false,
            editing: false,
            multiline: false,
            pattern: None,
            width: None,
        }
    }

    /// Caption of the selected option, if any.
    pub fn selected_option(&self) -> Option<&str> {
        self.selected
            .and_then(|index| self.options.get(index))
            .map(String::as_str)
    }
}

/// User input reported by the presenter.
#[derive(Clone, Debug, PartialEq)]
pub enum WidgetEvent {
    TextSubmitted { widget: WidgetId, text: String },
    Toggled { widget: WidgetId, checked: bool },
    OptionSelected { widget: WidgetId, index: usize },
    Clicked { widget: WidgetId },
    EditingStarted { widget: WidgetId },
    EditingCancelled { widget: WidgetId },
}

impl WidgetEvent {
    pub fn widget(&self) -> WidgetId {
        match self {
            WidgetEvent::TextSubmitted { widget, .. }
            | WidgetEvent::Toggled { widget, .. }
            | WidgetEvent::OptionSelected { widget, .. }
            | WidgetEvent::Clicked { widget }
            | WidgetEvent::EditingStarted { widget }
            | WidgetEvent::EditingCancelled { widget } => *widget,
        }
    }
}

#[derive(Default, Debug)]
pub struct UiTree {
    widgets: HashMap<WidgetId, Widget>,
    roots: Vec<WidgetId>,
    next_id: u64,
    generation: u64,
    revision: u64,
}

impl UiTree {
    pub fn get(&self, id: WidgetId) -> Option<&Widget> {
        self.widgets.get(&id)
    }

    pub fn contains(&self, id: WidgetId) -> bool {
        self.widgets.contains_key(&id)
    }

    pub fn roots(&self) -> &[WidgetId] {
        &self.roots
    }

    pub fn len(&self) -> usize {
        self.widgets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.widgets.is_empty()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Ids of `root` and all its descendants, depth first.
    pub fn descendants(&self, root: WidgetId) -> Vec<WidgetId> {
        let mut out = Vec::new();
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            if let Some(widget) = self.widgets.get(&id) {
                out.push(id);
                stack.extend(widget.children.iter().rev().copied());
            }
        }
        out
    }

    /// Text of every widget of the given kind under `root`, depth first.
    pub fn texts_of(&self, root: WidgetId, kind: WidgetKind) -> Vec<String> {
        self.descendants(root)
            .into_iter()
            .filter_map(|id| self.widgets.get(&id))
            .filter(|widget| widget.kind == kind)
            .map(|widget| widget.text.clone())
            .collect()
    }

    fn spawn(&mut self, kind: WidgetKind, parent: Option<WidgetId>, text: String) -> WidgetId {
        let id = WidgetId(self.next_id);
        self.next_id += 1;
        let parent = parent.filter(|p| self.widgets.contains_key(p));
        match parent {
            Some(p) => {
                if let Some(parent_widget) = self.widgets.get_mut(&p) {
                    parent_widget.children.push(id);
                }
            }
            None => self.roots.push(id),
        }
        self.widgets.insert(id, Widget::new(kind, parent, text));
        self.bump_structure();
        id
    }

    fn destroy(&mut self, id: WidgetId) -> usize {
        let Some(parent) = self.widgets.get(&id).map(|w| w.parent) else {
            return 0;
        };
        match parent.and_then(|p| self.widgets.get_mut(&p)) {
            Some(parent_widget) => parent_widget.children.retain(|child| *child != id),
            None => self.roots.retain(|root| *root != id),
        }
        let doomed = self.descendants(id);
        for child in &doomed {
            self.widgets.remove(child);
        }
        self.bump_structure();
        doomed.len()
    }

    fn modify(&mut self, id: WidgetId, f: impl FnOnce(&mut Widget)) -> bool {
        match self.widgets.get_mut(&id) {
            Some(widget) => {
                f(widget);
                self.revision += 1;
                true
            }
            None => false,
        }
    }

    fn bump_structure(&mut self) {
        self.generation += 1;
        self.revision += 1;
    }
}

/// Shared handle to the widget tree of one inspector.
///
/// Every construction call takes the context explicitly; leaf widgets never look
/// up a global UI root. Setters on destroyed widgets do nothing and return false.
#[derive(Clone, Default)]
pub struct UiContext {
    tree: Arc<Mutex<UiTree>>,
}

impl UiContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs `f` with the tree locked. `f` must not call back into the context.
    pub fn read<R>(&self, f: impl FnOnce(&UiTree) -> R) -> R {
        f(&lock(&self.tree))
    }

    pub fn spawn(
        &self,
        kind: WidgetKind,
        parent: Option<WidgetId>,
        text: impl Into<String>,
    ) -> WidgetId {
        lock(&self.tree).spawn(kind, parent, text.into())
    }

    /// Destroys a widget and its subtree. Returns how many widgets went away.
    pub fn destroy(&self, id: WidgetId) -> usize {
        lock(&self.tree).destroy(id)
    }

    pub fn widget(&self, id: WidgetId) -> Option<Widget> {
        lock(&self.tree).get(id).cloned()
    }

    pub fn contains(&self, id: WidgetId) -> bool {
        lock(&self.tree).contains(id)
    }

    pub fn text(&self, id: WidgetId) -> Option<String> {
        lock(&self.tree).get(id).map(|w| w.text.clone())
    }

    pub fn children(&self, id: WidgetId) -> Vec<WidgetId> {
        lock(&self.tree)
            .get(id)
            .map(|w| w.children.clone())
            .unwrap_or_default()
    }

    pub fn revision(&self) -> u64 {
        lock(&self.tree).revision()
    }

    pub fn set_text(&self, id: WidgetId, text: impl Into<String>) -> bool {
        let text = text.into();
        lock(&self.tree).modify(id, |w| w.text = text)
    }

    pub fn set_checked(&self, id: WidgetId, checked: bool) -> bool {
        lock(&self.tree).modify(id, |w| w.checked = checked)
    }

    /// Replaces the option list and clears the selection.
    pub fn set_options(&self, id: WidgetId, options: Vec<String>) -> bool {
        let mut tree = lock(&self.tree);
        let changed = tree.modify(id, |w| {
            w.options = options;
            w.selected = None;
        });
        if changed {
            tree.bump_structure();
        }
        changed
    }

    /// Changes which option is shown as selected. Never reports an event.
    pub fn select_option(&self, id: WidgetId, index: Option<usize>) -> bool {
        lock(&self.tree).modify(id, |w| {
            w.selected = index.filter(|i| *i < w.options.len());
        })
    }

    pub fn set_visible(&self, id: WidgetId, visible: bool) -> bool {
        lock(&self.tree).modify(id, |w| w.visible = visible)
    }

    pub fn set_highlighted(&self, id: WidgetId, highlighted: bool) -> bool {
        lock(&self.tree).modify(id, |w| w.highlighted = highlighted)
    }

    pub fn set_editing(&self, id: WidgetId, editing: bool) -> bool {
        lock(&self.tree).modify(id, |w| w.editing = editing)
    }

    pub fn set_multiline(&self, id: WidgetId, multiline: bool) -> bool {
        lock(&self.tree).modify(id, |w| w.multiline = multiline)
    }

    pub fn set_pattern(&self, id: WidgetId, pattern: Option<InputPattern>) -> bool {
        lock(&self.tree).modify(id, |w| w.pattern = pattern)
    }

    pub fn set_width(&self, id: WidgetId, width: f32) -> bool {
        lock(&self.tree).modify(id, |w| w.width = Some(width))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn destroy_removes_subtree_and_detaches() {
        let ui = UiContext::new();
        let root = ui.spawn(WidgetKind::Panel, None, "");
        let row = ui.spawn(WidgetKind::Row, Some(root), "");
        let field = ui.spawn(WidgetKind::TextField, Some(row), "1");
        let other = ui.spawn(WidgetKind::Label, Some(root), "x");

        assert_eq!(ui.destroy(row), 2);
        assert!(!ui.contains(field));
        assert_eq!(ui.children(root), vec![other]);
        assert!(!ui.set_text(field, "2"));
    }

    #[test]
    fn generation_tracks_structure_and_revision_tracks_content() {
        let ui = UiContext::new();
        let label = ui.spawn(WidgetKind::Label, None, "a");
        let (generation, revision) = ui.read(|t| (t.generation(), t.revision()));

        ui.set_text(label, "b");
        ui.read(|t| {
            assert_eq!(t.generation(), generation);
            assert!(t.revision() > revision);
        });

        ui.set_options(label, vec!["x".into()]);
        ui.read(|t| assert!(t.generation() > generation));
    }

    #[test]
    fn selection_is_bounded_by_options() {
        let ui = UiContext::new();
        let drop = ui.spawn(WidgetKind::DropDown, None, "");
        ui.set_options(drop, vec!["Idle".into(), "Running".into()]);
        ui.select_option(drop, Some(1));
        assert_eq!(ui.widget(drop).unwrap().selected_option(), Some("Running"));
        ui.select_option(drop, Some(5));
        assert_eq!(ui.widget(drop).unwrap().selected, None);
    }

    #[test]
    fn descendants_are_depth_first_in_child_order() {
        let ui = UiContext::new();
        let root = ui.spawn(WidgetKind::Panel, None, "");
        let a = ui.spawn(WidgetKind::Row, Some(root), "");
        let a1 = ui.spawn(WidgetKind::Label, Some(a), "a1");
        let b = ui.spawn(WidgetKind::Label, Some(root), "b");
        assert_eq!(ui.read(|t| t.descendants(root)), vec![root, a, a1, b]);
        assert_eq!(
            ui.read(|t| t.texts_of(root, WidgetKind::Label)),
            vec!["a1".to_string(), "b".to_string()]
        );
    }
}
