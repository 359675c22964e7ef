//! Inspector UI widgets.
//!
//! - TextField: click-to-edit text input used by every value editor
//!   - Enter commits, Escape cancels, losing focus commits

pub mod text_field;

pub use text_field::{
    begin_edit, commit_on_focus_loss, KeyOutcome, PendingWidgetEvents, TextField, TextFieldEditState,
    TextFieldPlugin,
};
