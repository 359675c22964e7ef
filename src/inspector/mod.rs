//! Inspector UI module.
//!
//! Provides a separate window that mirrors the inspector tree and the command
//! menu using bevy_ui and bevy_experimental_feathers.

pub mod config;
pub mod panels;
pub mod plugin;
pub mod state;
pub mod widgets;

pub use config::InspectorConfig;
pub use plugin::{InspectorSet, InspectorWindow, LiveInspectorPlugin};
pub use state::{
    EditMode, InspectorHost, InspectorInternal, InspectorState, InspectorWindowState, SelectionSet,
};
pub use widgets::{PendingWidgetEvents, TextField, TextFieldPlugin};
