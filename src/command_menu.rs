//! Command menu.
//!
//! [`CommandList`] is the ordered, mutable list of commands offered to the
//! user. Every mutation emits one coarse "changed" signal; a [`CommandMenu`]
//! listens and rebuilds its drop-down from scratch, so the visible options are
//! always a projection of the list.

use std::sync::{Arc, Mutex};

use bevy::prelude::*;

use crate::reactive::{Action, Signal, Subscription, lock};
use crate::widget_tree::{UiContext, WidgetEvent, WidgetId};

/// Minimum Jaro-Winkler similarity for a fuzzy match.
const SEARCH_THRESHOLD: f64 = 0.8;

/// Keyboard shortcut: an optional modifier plus an optional primary key.
///
/// A chord without a primary key is unset and never shown or matched.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Chord {
    pub modifier: Option<KeyCode>,
    pub key: Option<KeyCode>,
}

impl Chord {
    pub const NONE: Chord = Chord {
        modifier: None,
        key: None,
    };

    pub fn key(key: KeyCode) -> Self {
        Self {
            modifier: None,
            key: Some(key),
        }
    }

    pub fn with_modifier(modifier: KeyCode, key: KeyCode) -> Self {
        Self {
            modifier: Some(modifier),
            key: Some(key),
        }
    }

    /// `Ctrl+D`, `S`, or `None` when no primary key is set.
    pub fn describe(&self) -> Option<String> {
        let key = key_name(self.key?);
        Some(match self.modifier {
            Some(modifier) => format!("{}+{key}", key_name(modifier)),
            None => key,
        })
    }

    /// Whether the chord's key went down this frame with its modifier held.
    ///
    /// A chord without a modifier only fires while no modifier is held.
    pub fn just_pressed(&self, keys: &ButtonInput<KeyCode>) -> bool {
        let Some(key) = self.key else {
            return false;
        };
        if !keys.just_pressed(key) {
            return false;
        }
        match self.modifier {
            Some(modifier) => keys.any_pressed(modifier_variants(modifier)),
            None => !MODIFIERS
                .iter()
                .any(|&modifier| keys.any_pressed(modifier_variants(modifier))),
        }
    }
}

const MODIFIERS: [KeyCode; 4] = [
    KeyCode::ControlLeft,
    KeyCode::ShiftLeft,
    KeyCode::AltLeft,
    KeyCode::SuperLeft,
];

/// Left and right variants of a modifier key.
fn modifier_variants(modifier: KeyCode) -> [KeyCode; 2] {
    match modifier {
        KeyCode::ControlLeft | KeyCode::ControlRight => [KeyCode::ControlLeft, KeyCode::ControlRight],
        KeyCode::ShiftLeft | KeyCode::ShiftRight => [KeyCode::ShiftLeft, KeyCode::ShiftRight],
        KeyCode::AltLeft | KeyCode::AltRight => [KeyCode::AltLeft, KeyCode::AltRight],
        KeyCode::SuperLeft | KeyCode::SuperRight => [KeyCode::SuperLeft, KeyCode::SuperRight],
        other => [other, other],
    }
}

/// Display name of a key: `A`..`Z`, `0`..`9`, `Ctrl`, `Shift`, `Alt`, `Super`,
/// otherwise the key code's name.
pub fn key_name(key: KeyCode) -> String {
    match key {
        KeyCode::ControlLeft | KeyCode::ControlRight => "Ctrl".to_string(),
        KeyCode::ShiftLeft | KeyCode::ShiftRight => "Shift".to_string(),
        KeyCode::AltLeft | KeyCode::AltRight => "Alt".to_string(),
        KeyCode::SuperLeft | KeyCode::SuperRight => "Super".to_string(),
        other => {
            let name = format!("{other:?}");
            match name
                .strip_prefix("Key")
                .or_else(|| name.strip_prefix("Digit"))
            {
                Some(short) if short.len() == 1 => short.to_string(),
                _ => name,
            }
        }
    }
}

type EnablePredicate = Arc<dyn Fn() -> bool + Send + Sync>;

/// One entry of the command menu.
#[derive(Clone)]
pub struct CommandEntry {
    pub label: String,
    pub chord: Chord,
    pub action: Action,
    pub enabled: Option<EnablePredicate>,
}

impl CommandEntry {
    pub fn new(label: impl Into<String>, action: Action) -> Self {
        Self {
            label: label.into(),
            chord: Chord::NONE,
            action,
            enabled: None,
        }
    }

    pub fn with_chord(mut self, chord: Chord) -> Self {
        self.chord = chord;
        self
    }

    pub fn with_enabled(mut self, enabled: impl Fn() -> bool + Send + Sync + 'static) -> Self {
        self.enabled = Some(Arc::new(enabled));
        self
    }

    /// `Spawn [S]`, `Delete [Ctrl+D]`, or just the label without a chord.
    pub fn display_text(&self) -> String {
        match self.chord.describe() {
            Some(chord) => format!("{} [{chord}]", self.label),
            None => self.label.clone(),
        }
    }

    /// Entries without a predicate are always enabled.
    pub fn is_enabled(&self) -> bool {
        self.enabled.as_ref().is_none_or(|enabled| enabled())
    }
}

/// Ordered list of commands offered in the menu and through chords.
#[derive(Resource, Default)]
pub struct CommandList {
    entries: Vec<CommandEntry>,
    changed: Arc<Signal<[CommandEntry]>>,
}

impl CommandList {
    pub fn entries(&self) -> &[CommandEntry] {
        &self.entries
    }

    pub fn get(&self, index: usize) -> Option<&CommandEntry> {
        self.entries.get(index)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn push(&mut self, entry: CommandEntry) {
        self.entries.push(entry);
        self.notify();
    }

    /// Inserts at `index`, clamped to the end of the list.
    pub fn insert(&mut self, index: usize, entry: CommandEntry) {
        let index = index.min(self.entries.len());
        self.entries.insert(index, entry);
        self.notify();
    }

    pub fn remove(&mut self, index: usize) -> Option<CommandEntry> {
        if index >= self.entries.len() {
            return None;
        }
        let removed = self.entries.remove(index);
        self.notify();
        Some(removed)
    }

    /// Replaces the entry at `index` in place.
    pub fn set(&mut self, index: usize, entry: CommandEntry) -> bool {
        let Some(slot) = self.entries.get_mut(index) else {
            return false;
        };
        *slot = entry;
        self.notify();
        true
    }

    pub fn clear(&mut self) {
        if self.entries.is_empty() {
            return;
        }
        self.entries.clear();
        self.notify();
    }

    /// Registers a listener called with the whole list after every mutation.
    pub fn subscribe(
        &self,
        on_change: impl Fn(&[CommandEntry]) + Send + Sync + 'static,
    ) -> Subscription {
        self.changed.connect(on_change)
    }

    fn notify(&self) {
        self.changed.emit(&self.entries);
    }

    /// Entries whose label matches `query`, best first.
    ///
    /// Substring matches rank above fuzzy ones; ties keep list order. An empty
    /// query returns every entry.
    pub fn search(&self, query: &str) -> Vec<&CommandEntry> {
        let query = query.trim().to_lowercase();
        if query.is_empty() {
            return self.entries.iter().collect();
        }

        let mut scored: Vec<(bool, f64, usize)> = self
            .entries
            .iter()
            .enumerate()
            .filter_map(|(index, entry)| {
                let label = entry.label.to_lowercase();
                let contains = label.contains(&query);
                let score = strsim::jaro_winkler(&query, &label);
                (contains || score > SEARCH_THRESHOLD).then_some((contains, score, index))
            })
            .collect();

        scored.sort_by(|a, b| {
            b.0.cmp(&a.0)
                .then_with(|| b.1.total_cmp(&a.1))
                .then_with(|| a.2.cmp(&b.2))
        });
        scored
            .into_iter()
            .map(|(_, _, index)| &self.entries[index])
            .collect()
    }

    /// Invokes the best enabled match for `query`. Returns its label.
    pub fn invoke_matching(&self, query: &str) -> Option<&str> {
        let entry = self
            .search(query)
            .into_iter()
            .find(|entry| entry.is_enabled())?;
        debug!("Invoking command {:?} for query {query:?}", entry.label);
        entry.action.invoke();
        Some(&entry.label)
    }
}

/// Keeps a drop-down in sync with a [`CommandList`].
pub struct CommandMenu {
    drop_down: WidgetId,
    entries: Arc<Mutex<Vec<CommandEntry>>>,
    subscription: Option<Subscription>,
}

impl CommandMenu {
    pub fn attach(ui: &UiContext, drop_down: WidgetId, list: &CommandList) -> Self {
        let entries = Arc::new(Mutex::new(Vec::new()));
        project(ui, drop_down, &entries, list.entries());

        let ui = ui.clone();
        let slot = entries.clone();
        let subscription = list.subscribe(move |current| project(&ui, drop_down, &slot, current));

        Self {
            drop_down,
            entries,
            subscription: Some(subscription),
        }
    }

    pub fn drop_down(&self) -> WidgetId {
        self.drop_down
    }

    /// Whether the option at `index` may be selected right now.
    pub fn is_enabled(&self, index: usize) -> bool {
        lock(&self.entries)
            .get(index)
            .is_some_and(CommandEntry::is_enabled)
    }

    /// Invokes the action of a selected option and clears the selection.
    pub fn handle_event(&self, ui: &UiContext, event: &WidgetEvent) -> bool {
        let WidgetEvent::OptionSelected { widget, index } = event else {
            return false;
        };
        if *widget != self.drop_down {
            return false;
        }
        let entry = lock(&self.entries).get(*index).cloned();
        ui.select_option(self.drop_down, None);
        if let Some(entry) = entry {
            debug!("Menu command {:?} selected", entry.label);
            entry.action.invoke();
        }
        true
    }
}

impl Drop for CommandMenu {
    fn drop(&mut self) {
        if let Some(subscription) = self.subscription.take() {
            subscription.release();
        }
    }
}

fn project(
    ui: &UiContext,
    drop_down: WidgetId,
    slot: &Mutex<Vec<CommandEntry>>,
    entries: &[CommandEntry],
) {
    ui.set_options(drop_down, entries.iter().map(CommandEntry::display_text).collect());
    *lock(slot) = entries.to_vec();
}
