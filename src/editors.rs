//! Value-editor registry.
//!
//! Dispatch is on the member's classified kind, never on its runtime type:
//!
//! | member                         | editor                                  |
//! |--------------------------------|-----------------------------------------|
//! | action                         | button reading `[Execute]`              |
//! | 2/3/4-component vectors, color | one numeric field per axis (X, Y, Z, W) |
//! | enum                           | drop-down of the variants               |
//! | int, float                     | one numeric field                       |
//! | bool                           | checkbox                                |
//! | string                         | text field, multi-line if it has `\n`   |
//! | anything else                  | inert field holding a placeholder       |

use crate::binding::{
    ChoiceBinding, FieldBinding, NumericBinding, TextBinding, ToggleBinding, TriggerBinding,
};
use crate::inspection::Member;
use crate::inspector::config::InspectorConfig;
use crate::reactive::Property;
use crate::value::{Axis, FieldProperty, NumericValue, ValueKind};
use crate::widget_tree::{UiContext, WidgetId, WidgetKind};

/// What editor construction needs besides the member itself.
#[derive(Clone, Copy)]
pub struct EditorContext<'a> {
    pub ui: &'a UiContext,
    pub config: &'a InspectorConfig,
    /// Raised whenever a bool field commits.
    pub needs_save: &'a Property<bool>,
}

type Bindings = Vec<Box<dyn FieldBinding>>;

/// Spawns the editor widgets of `member` under `parent`.
///
/// Returns the bindings of the new widgets; an inert placeholder has none.
pub fn build_editor(cx: EditorContext<'_>, parent: WidgetId, member: &Member) -> Bindings {
    let property = match member {
        Member::Action(action) => {
            let button = cx
                .ui
                .spawn(WidgetKind::Button, Some(parent), cx.config.execute_text.clone());
            return vec![Box::new(TriggerBinding::bind(button, action.clone()))];
        }
        Member::Property(property) => property,
    };

    let kind = property.kind();
    match property {
        FieldProperty::Vector2(p) => axis_fields(cx, parent, p, kind),
        FieldProperty::Vector3(p) => axis_fields(cx, parent, p, kind),
        FieldProperty::LatticeCoord(p) => axis_fields(cx, parent, p, kind),
        FieldProperty::Vector4(p) => axis_fields(cx, parent, p, kind),
        FieldProperty::Quaternion(p) => axis_fields(cx, parent, p, kind),
        FieldProperty::Color(p) => axis_fields(cx, parent, p, kind),
        FieldProperty::Enum(p) => {
            let drop_down = cx.ui.spawn(WidgetKind::DropDown, Some(parent), "");
            vec![Box::new(ChoiceBinding::bind(cx.ui, drop_down, p.clone()))]
        }
        FieldProperty::Int(p) => scalar_field(cx, parent, p),
        FieldProperty::Float(p) => scalar_field(cx, parent, p),
        FieldProperty::Bool(p) => {
            let check_box = cx.ui.spawn(WidgetKind::CheckBox, Some(parent), "");
            vec![Box::new(ToggleBinding::bind(
                cx.ui,
                check_box,
                p.clone(),
                cx.needs_save.clone(),
            ))]
        }
        FieldProperty::Text(p) => {
            let field = text_field(cx, parent, cx.config.scalar_field_width);
            vec![Box::new(TextBinding::bind(cx.ui, field, p.clone()))]
        }
        FieldProperty::Collection(_) | FieldProperty::Unknown(_) => {
            let field = text_field(cx, parent, cx.config.scalar_field_width);
            cx.ui.set_text(field, cx.config.placeholder_text.clone());
            Vec::new()
        }
    }
}

fn text_field(cx: EditorContext<'_>, parent: WidgetId, width: f32) -> WidgetId {
    let field = cx.ui.spawn(WidgetKind::TextField, Some(parent), "");
    cx.ui.set_width(field, width);
    field
}

fn scalar_field<T: NumericValue>(
    cx: EditorContext<'_>,
    parent: WidgetId,
    property: &Property<T>,
) -> Bindings {
    let field = text_field(cx, parent, cx.config.scalar_field_width);
    vec![Box::new(NumericBinding::bind(cx.ui, field, property.clone(), 0))]
}

fn axis_fields<T: NumericValue>(
    cx: EditorContext<'_>,
    parent: WidgetId,
    property: &Property<T>,
    kind: ValueKind,
) -> Bindings {
    kind.axes()
        .iter()
        .map(|axis: &Axis| {
            cx.ui.spawn(WidgetKind::Label, Some(parent), axis.label());
            let field = text_field(cx, parent, cx.config.axis_field_width);
            Box::new(NumericBinding::bind(cx.ui, field, property.clone(), axis.index()))
                as Box<dyn FieldBinding>
        })
        .collect()
}
