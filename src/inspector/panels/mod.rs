//! UI panels for the inspector.

pub mod actions_panel;
pub mod detail_panel;
pub mod mirror;

pub use actions_panel::*;
pub use detail_panel::*;
pub use mirror::*;
