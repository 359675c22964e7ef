//! Tagged value model.
//!
//! Every property handed to the inspector is classified once, at the boundary,
//! into a [`FieldProperty`]: a closed union over the value kinds the editors know
//! how to render. Nothing downstream compares runtime types.

use core::fmt;
use std::sync::Arc;

use bevy::prelude::*;
use bevy::reflect::{DynamicEnum, DynamicVariant, Enum, FromReflect, TypeInfo, Typed};

use crate::error::FieldParseError;
use crate::reactive::{Property, Subscription};

/// Semantic kind of a property value.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ValueKind {
    Int,
    Float,
    Bool,
    Text,
    Vector2,
    Vector3,
    /// Integer lattice coordinate with named axes.
    LatticeCoord,
    Vector4,
    Quaternion,
    Color,
    Enum,
    /// Bulk collection; never edited row by row.
    Collection,
    Unknown,
}

impl ValueKind {
    /// Axes rendered as separate fields, in display order.
    pub fn axes(self) -> &'static [Axis] {
        match self {
            ValueKind::Vector2 => &[Axis::X, Axis::Y],
            ValueKind::Vector3 | ValueKind::LatticeCoord => &[Axis::X, Axis::Y, Axis::Z],
            ValueKind::Vector4 | ValueKind::Quaternion | ValueKind::Color => {
                &[Axis::X, Axis::Y, Axis::Z, Axis::W]
            }
            _ => &[],
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Axis {
    X,
    Y,
    Z,
    W,
}

impl Axis {
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn label(self) -> &'static str {
        match self {
            Axis::X => "X",
            Axis::Y => "Y",
            Axis::Z => "Z",
            Axis::W => "W",
        }
    }
}

/// Input well-formedness rule of a numeric text field.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum InputPattern {
    /// `^\d+$`
    Integer,
    /// `^\d+(\.\d+)?$`
    Decimal,
}

impl InputPattern {
    /// Whether the complete text is well formed.
    pub fn accepts(self, text: &str) -> bool {
        let all_digits = |s: &str| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit());
        match self {
            InputPattern::Integer => all_digits(text),
            InputPattern::Decimal => match text.split_once('.') {
                Some((whole, fraction)) => all_digits(whole) && all_digits(fraction),
                None => all_digits(text),
            },
        }
    }

    /// Whether `ch` may be typed into a field currently holding `buffer`.
    pub fn accepts_keystroke(self, buffer: &str, ch: char) -> bool {
        match self {
            InputPattern::Integer => ch.is_ascii_digit(),
            InputPattern::Decimal => ch.is_ascii_digit() || (ch == '.' && !buffer.contains('.')),
        }
    }
}

impl fmt::Display for InputPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InputPattern::Integer => f.write_str("integer"),
            InputPattern::Decimal => f.write_str("decimal"),
        }
    }
}

/// Display and parse rule of a numeric field.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NumericFormat {
    /// `f32`, shown with two decimals.
    Float,
    /// `i32`.
    Integer,
    /// A color channel, `0..=255`.
    Byte,
}

impl NumericFormat {
    pub fn pattern(self) -> InputPattern {
        match self {
            NumericFormat::Float => InputPattern::Decimal,
            NumericFormat::Integer | NumericFormat::Byte => InputPattern::Integer,
        }
    }

    pub fn render(self, value: f64) -> String {
        match self {
            NumericFormat::Float => format!("{value:.2}"),
            NumericFormat::Integer | NumericFormat::Byte => format!("{value:.0}"),
        }
    }

    pub fn parse(self, text: &str) -> Result<f64, FieldParseError> {
        let pattern = self.pattern();
        if !pattern.accepts(text) {
            return Err(FieldParseError::Rejected {
                text: text.to_string(),
                pattern,
            });
        }
        let out_of_range = || FieldParseError::OutOfRange {
            text: text.to_string(),
        };
        match self {
            NumericFormat::Float => text
                .parse::<f32>()
                .ok()
                .filter(|v| v.is_finite())
                .map(f64::from)
                .ok_or_else(out_of_range),
            NumericFormat::Integer => text
                .parse::<i32>()
                .map(f64::from)
                .map_err(|_| out_of_range()),
            NumericFormat::Byte => text
                .parse::<u8>()
                .map(f64::from)
                .map_err(|_| out_of_range()),
        }
    }
}

/// A value whose components are edited through numeric text fields.
///
/// Scalars have a single component at index 0.
pub trait NumericValue: Clone + Send + Sync + 'static {
    const FORMAT: NumericFormat;

    fn component(&self, index: usize) -> f64;

    fn set_component(&mut self, index: usize, value: f64);
}

impl NumericValue for f32 {
    const FORMAT: NumericFormat = NumericFormat::Float;

    fn component(&self, _index: usize) -> f64 {
        f64::from(*self)
    }

    fn set_component(&mut self, _index: usize, value: f64) {
        *self = value as f32;
    }
}

impl NumericValue for i32 {
    const FORMAT: NumericFormat = NumericFormat::Integer;

    fn component(&self, _index: usize) -> f64 {
        f64::from(*self)
    }

    fn set_component(&mut self, _index: usize, value: f64) {
        *self = value as i32;
    }
}

macro_rules! float_vector_value {
    ($($ty:ty),*) => {$(
        impl NumericValue for $ty {
            const FORMAT: NumericFormat = NumericFormat::Float;

            fn component(&self, index: usize) -> f64 {
                self.to_array().get(index).copied().map(f64::from).unwrap_or_default()
            }

            fn set_component(&mut self, index: usize, value: f64) {
                let mut array = self.to_array();
                if let Some(slot) = array.get_mut(index) {
                    *slot = value as f32;
                    *self = <$ty>::from_array(array);
                }
            }
        }
    )*};
}

float_vector_value!(Vec2, Vec3, Vec4, Quat);

impl NumericValue for IVec3 {
    const FORMAT: NumericFormat = NumericFormat::Integer;

    fn component(&self, index: usize) -> f64 {
        self.to_array().get(index).copied().map(f64::from).unwrap_or_default()
    }

    fn set_component(&mut self, index: usize, value: f64) {
        let mut array = self.to_array();
        if let Some(slot) = array.get_mut(index) {
            *slot = value as i32;
            *self = IVec3::from_array(array);
        }
    }
}

impl NumericValue for Color {
    const FORMAT: NumericFormat = NumericFormat::Byte;

    fn component(&self, index: usize) -> f64 {
        let srgba = self.to_srgba();
        let channel = match index {
            0 => srgba.red,
            1 => srgba.green,
            2 => srgba.blue,
            _ => srgba.alpha,
        };
        (f64::from(channel) * 255.0).round()
    }

    fn set_component(&mut self, index: usize, value: f64) {
        let mut srgba = self.to_srgba();
        let channel = (value / 255.0) as f32;
        match index {
            0 => srgba.red = channel,
            1 => srgba.green = channel,
            2 => srgba.blue = channel,
            _ => srgba.alpha = channel,
        }
        *self = Color::from(srgba);
    }
}

/// Type-erased access for properties the inspector only needs to classify.
trait ErasedProperty: Send + Sync {
    fn editable(&self) -> bool;
    fn subscriber_count(&self) -> usize;
}

impl<T: Clone + Send + Sync + 'static> ErasedProperty for Property<T> {
    fn editable(&self) -> bool {
        Property::editable(self)
    }

    fn subscriber_count(&self) -> usize {
        Property::subscriber_count(self)
    }
}

/// A property whose value type has no editor. Rendered as an inert placeholder.
#[derive(Clone)]
pub struct OpaqueProperty {
    inner: Arc<dyn ErasedProperty>,
    type_name: &'static str,
}

impl OpaqueProperty {
    pub fn new<T: Clone + Send + Sync + 'static>(property: Property<T>) -> Self {
        Self {
            inner: Arc::new(property),
            type_name: core::any::type_name::<T>(),
        }
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }
}

/// A bulk collection-valued property.
#[derive(Clone)]
pub struct CollectionProperty {
    inner: Arc<dyn ErasedProperty>,
}

impl CollectionProperty {
    pub fn new<T: Clone + Send + Sync + 'static>(property: Property<Vec<T>>) -> Self {
        Self {
            inner: Arc::new(property),
        }
    }
}

trait ErasedEnum: Send + Sync {
    fn variant_names(&self) -> &'static [&'static str];
    fn selected(&self) -> usize;
    fn select(&self, index: usize) -> bool;
    fn subscribe(&self, on_change: Box<dyn Fn(usize) + Send + Sync>) -> Subscription;
    fn editable(&self) -> bool;
    fn subscriber_count(&self) -> usize;
}

impl<E> ErasedEnum for Property<E>
where
    E: Enum + Typed + FromReflect + Clone + Send + Sync + 'static,
{
    fn variant_names(&self) -> &'static [&'static str] {
        match E::type_info() {
            TypeInfo::Enum(info) => info.variant_names(),
            _ => &[],
        }
    }

    fn selected(&self) -> usize {
        self.get().variant_index()
    }

    fn select(&self, index: usize) -> bool {
        let Some(name) = self.variant_names().get(index) else {
            return false;
        };
        let dynamic = DynamicEnum::new(*name, DynamicVariant::Unit);
        match E::from_reflect(&dynamic) {
            Some(value) => {
                self.set(value);
                true
            }
            None => false,
        }
    }

    fn subscribe(&self, on_change: Box<dyn Fn(usize) + Send + Sync>) -> Subscription {
        Property::subscribe(self, move |value: &E| on_change(value.variant_index()))
    }

    fn editable(&self) -> bool {
        Property::editable(self)
    }

    fn subscriber_count(&self) -> usize {
        Property::subscriber_count(self)
    }
}

/// A property holding a reflected enum, edited by picking one of its variants.
///
/// Only unit variants can be written back.
#[derive(Clone)]
pub struct EnumProperty {
    inner: Arc<dyn ErasedEnum>,
}

impl EnumProperty {
    pub fn new<E>(property: Property<E>) -> Self
    where
        E: Enum + Typed + FromReflect + Clone + Send + Sync + 'static,
    {
        Self {
            inner: Arc::new(property),
        }
    }

    /// Variant names in declaration order.
    pub fn variant_names(&self) -> &'static [&'static str] {
        self.inner.variant_names()
    }

    /// Declaration index of the current variant.
    pub fn selected(&self) -> usize {
        self.inner.selected()
    }

    /// Writes the variant at `index`. Returns false if it cannot be built.
    pub fn select(&self, index: usize) -> bool {
        self.inner.select(index)
    }

    pub fn subscribe(&self, on_change: impl Fn(usize) + Send + Sync + 'static) -> Subscription {
        self.inner.subscribe(Box::new(on_change))
    }
}

/// A property classified by value kind.
#[derive(Clone)]
pub enum FieldProperty {
    Int(Property<i32>),
    Float(Property<f32>),
    Bool(Property<bool>),
    Text(Property<String>),
    Vector2(Property<Vec2>),
    Vector3(Property<Vec3>),
    LatticeCoord(Property<IVec3>),
    Vector4(Property<Vec4>),
    Quaternion(Property<Quat>),
    Color(Property<Color>),
    Enum(EnumProperty),
    Collection(CollectionProperty),
    Unknown(OpaqueProperty),
}

impl FieldProperty {
    pub fn kind(&self) -> ValueKind {
        match self {
            FieldProperty::Int(_) => ValueKind::Int,
            FieldProperty::Float(_) => ValueKind::Float,
            FieldProperty::Bool(_) => ValueKind::Bool,
            FieldProperty::Text(_) => ValueKind::Text,
            FieldProperty::Vector2(_) => ValueKind::Vector2,
            FieldProperty::Vector3(_) => ValueKind::Vector3,
            FieldProperty::LatticeCoord(_) => ValueKind::LatticeCoord,
            FieldProperty::Vector4(_) => ValueKind::Vector4,
            FieldProperty::Quaternion(_) => ValueKind::Quaternion,
            FieldProperty::Color(_) => ValueKind::Color,
            FieldProperty::Enum(_) => ValueKind::Enum,
            FieldProperty::Collection(_) => ValueKind::Collection,
            FieldProperty::Unknown(_) => ValueKind::Unknown,
        }
    }

    pub fn editable(&self) -> bool {
        match self {
            FieldProperty::Int(p) => p.editable(),
            FieldProperty::Float(p) => p.editable(),
            FieldProperty::Bool(p) => p.editable(),
            FieldProperty::Text(p) => p.editable(),
            FieldProperty::Vector2(p) => p.editable(),
            FieldProperty::Vector3(p) => p.editable(),
            FieldProperty::LatticeCoord(p) => p.editable(),
            FieldProperty::Vector4(p) => p.editable(),
            FieldProperty::Quaternion(p) => p.editable(),
            FieldProperty::Color(p) => p.editable(),
            FieldProperty::Enum(p) => p.inner.editable(),
            FieldProperty::Collection(p) => p.inner.editable(),
            FieldProperty::Unknown(p) => p.inner.editable(),
        }
    }

    pub fn is_bulk_collection(&self) -> bool {
        matches!(self, FieldProperty::Collection(_))
    }

    /// Live subscriptions on the underlying property.
    pub fn subscriber_count(&self) -> usize {
        match self {
            FieldProperty::Int(p) => p.subscriber_count(),
            FieldProperty::Float(p) => p.subscriber_count(),
            FieldProperty::Bool(p) => p.subscriber_count(),
            FieldProperty::Text(p) => p.subscriber_count(),
            FieldProperty::Vector2(p) => p.subscriber_count(),
            FieldProperty::Vector3(p) => p.subscriber_count(),
            FieldProperty::LatticeCoord(p) => p.subscriber_count(),
            FieldProperty::Vector4(p) => p.subscriber_count(),
            FieldProperty::Quaternion(p) => p.subscriber_count(),
            FieldProperty::Color(p) => p.subscriber_count(),
            FieldProperty::Enum(p) => p.inner.subscriber_count(),
            FieldProperty::Collection(p) => p.inner.subscriber_count(),
            FieldProperty::Unknown(p) => p.inner.subscriber_count(),
        }
    }
}

macro_rules! field_property_from {
    ($($ty:ty => $variant:ident),* $(,)?) => {$(
        impl From<Property<$ty>> for FieldProperty {
            fn from(property: Property<$ty>) -> Self {
                FieldProperty::$variant(property)
            }
        }
    )*};
}

field_property_from!(
    i32 => Int,
    f32 => Float,
    bool => Bool,
    String => Text,
    Vec2 => Vector2,
    Vec3 => Vector3,
    IVec3 => LatticeCoord,
    Vec4 => Vector4,
    Quat => Quaternion,
    Color => Color,
);

impl<T: Clone + Send + Sync + 'static> From<Property<Vec<T>>> for FieldProperty {
    fn from(property: Property<Vec<T>>) -> Self {
        FieldProperty::Collection(CollectionProperty::new(property))
    }
}

impl From<EnumProperty> for FieldProperty {
    fn from(property: EnumProperty) -> Self {
        FieldProperty::Enum(property)
    }
}

impl From<OpaqueProperty> for FieldProperty {
    fn from(property: OpaqueProperty) -> Self {
        FieldProperty::Unknown(property)
    }
}
