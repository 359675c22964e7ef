//! Configuration for the inspector UI.

use bevy::prelude::*;
use bevy::ui::Val;

/// Configuration for inspector layout, styling and texts.
///
/// Insert before adding the plugin to override the defaults.
#[derive(Resource, Clone)]
pub struct InspectorConfig {
    // Window
    pub window_title: String,
    pub window_width: u32,
    pub window_height: u32,

    // Layout
    /// Height of the title bar.
    pub title_bar_height: Val,
    /// Height of the tab bar.
    pub tab_bar_height: Val,
    /// Width of the key label in front of every row.
    pub key_label_width: f32,
    /// Width of each per-axis field of a vector editor.
    pub axis_field_width: f32,
    /// Width of a scalar or text field.
    pub scalar_field_width: f32,
    /// Width of the actions panel on the right.
    pub actions_panel_width: Val,

    // Spacing
    /// Padding inside panels.
    pub panel_padding: UiRect,
    /// Gap between items in lists.
    pub item_gap: Val,
    /// Gap between columns.
    pub column_gap: Val,
    /// Left indent of a tab body below its header.
    pub body_indent: Val,

    // Typography
    pub title_font_size: f32,
    pub body_font_size: f32,
    pub small_font_size: f32,

    // Colors (for non-themed elements)
    pub border_color: Color,
    pub muted_text_color: Color,
    pub error_text_color: Color,
    /// Key label background.
    pub key_background: Color,
    /// Text field background.
    pub field_background: Color,
    /// Text field background while editing.
    pub field_editing_background: Color,

    // Texts
    /// Caption of the trigger next to an action.
    pub execute_text: String,
    /// Contents of the inert field shown for values without an editor.
    pub placeholder_text: String,
    /// Shown when nothing in the resolved target is editable.
    pub empty_text: String,
    /// Title above the command menu.
    pub actions_label: String,
}

impl InspectorConfig {
    /// `[N entities]`
    pub fn multi_selection_text(&self, count: usize) -> String {
        format!("[{count} entities]")
    }
}

impl Default for InspectorConfig {
    fn default() -> Self {
        Self {
            // Window
            window_title: "Live Inspector".to_string(),
            window_width: 900,
            window_height: 420,

            // Layout
            title_bar_height: Val::Px(40.0),
            tab_bar_height: Val::Px(36.0),
            key_label_width: 128.0,
            axis_field_width: 30.0,
            scalar_field_width: 70.0,
            actions_panel_width: Val::Percent(35.0),

            // Spacing
            panel_padding: UiRect::all(Val::Px(8.0)),
            item_gap: Val::Px(4.0),
            column_gap: Val::Px(8.0),
            body_indent: Val::Px(10.0),

            // Typography
            title_font_size: 16.0,
            body_font_size: 13.0,
            small_font_size: 11.0,

            // Colors
            border_color: Color::srgba(0.3, 0.3, 0.3, 1.0),
            muted_text_color: Color::srgba(0.6, 0.6, 0.6, 1.0),
            error_text_color: Color::srgba(0.8, 0.3, 0.3, 1.0),
            key_background: Color::srgba(0.0, 0.0, 0.0, 0.5),
            field_background: Color::srgba(0.15, 0.15, 0.15, 1.0),
            field_editing_background: Color::srgba(0.22, 0.22, 0.3, 1.0),

            // Texts
            execute_text: "[Execute]".to_string(),
            placeholder_text: "<no editor>".to_string(),
            empty_text: "Nothing to inspect".to_string(),
            actions_label: "Actions:".to_string(),
        }
    }
}
