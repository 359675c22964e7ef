//! A live inspector for Bevy entities.
//!
//! Shows the editable members of the selected entity as tabs of typed editors,
//! bound both ways to reactive properties, next to a menu of registered
//! commands. Built using bevy_feathers.

pub mod binding;
pub mod command_menu;
pub mod editors;
pub mod error;
pub mod inspection;
pub mod inspector;
pub mod inspector_tree;
pub mod reactive;
pub mod value;
pub mod widget_tree;

// Re-export the main plugin for convenience
pub use inspector::{InspectorConfig, LiveInspectorPlugin};

