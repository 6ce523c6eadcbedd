//! Property kinds and values.
//!
//! A property's declared type is a [`PropertyKind`]; its value is a
//! [`PropertyValue`]. Every consumption site matches exhaustively on the
//! value rather than downcasting.

use crate::workspace::DataObject;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Element type of an array property.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ScalarKind {
    Int,
    Double,
    String,
    Bool,
}

impl ScalarKind {
    pub fn name(&self) -> &'static str {
        match self {
            ScalarKind::Int => "int",
            ScalarKind::Double => "double",
            ScalarKind::String => "string",
            ScalarKind::Bool => "bool",
        }
    }
}

/// Declared type of a property.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PropertyKind {
    Int,
    Double,
    String,
    Bool,
    ArrayOf(ScalarKind),
    /// An opaque data object. A `type_tag` restricts the accepted objects.
    Object { type_tag: Option<String> },
}

impl PropertyKind {
    /// Any object, regardless of its type tag.
    pub fn any_object() -> Self {
        PropertyKind::Object { type_tag: None }
    }

    /// Objects carrying the given type tag.
    pub fn object(type_tag: impl Into<String>) -> Self {
        PropertyKind::Object {
            type_tag: Some(type_tag.into()),
        }
    }

    /// Human-readable type name, used in messages and introspection.
    pub fn type_name(&self) -> String {
        match self {
            PropertyKind::Int => "int".to_string(),
            PropertyKind::Double => "double".to_string(),
            PropertyKind::String => "string".to_string(),
            PropertyKind::Bool => "bool".to_string(),
            PropertyKind::ArrayOf(elem) => format!("{}[]", elem.name()),
            PropertyKind::Object { type_tag: Some(tag) } => format!("object<{}>", tag),
            PropertyKind::Object { type_tag: None } => "object".to_string(),
        }
    }

    /// The zero value of this kind.
    pub fn zero_value(&self) -> PropertyValue {
        match self {
            PropertyKind::Int => PropertyValue::Int(0),
            PropertyKind::Double => PropertyValue::Double(0.0),
            PropertyKind::String => PropertyValue::Str(String::new()),
            PropertyKind::Bool => PropertyValue::Bool(false),
            PropertyKind::ArrayOf(ScalarKind::Int) => PropertyValue::IntArray(Vec::new()),
            PropertyKind::ArrayOf(ScalarKind::Double) => PropertyValue::DoubleArray(Vec::new()),
            PropertyKind::ArrayOf(ScalarKind::String) => PropertyValue::StrArray(Vec::new()),
            PropertyKind::ArrayOf(ScalarKind::Bool) => PropertyValue::BoolArray(Vec::new()),
            PropertyKind::Object { .. } => PropertyValue::Object(None),
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            PropertyKind::Int
                | PropertyKind::Double
                | PropertyKind::ArrayOf(ScalarKind::Int)
                | PropertyKind::ArrayOf(ScalarKind::Double)
        )
    }
}

impl fmt::Display for PropertyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.type_name())
    }
}

/// Shared handle to an opaque data object, named as it is known to the
/// data service.
#[derive(Clone)]
pub struct ObjectHandle {
    name: String,
    object: Arc<dyn DataObject>,
}

impl ObjectHandle {
    pub fn new(name: impl Into<String>, object: Arc<dyn DataObject>) -> Self {
        Self {
            name: name.into(),
            object,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn type_tag(&self) -> &str {
        self.object.type_tag()
    }

    pub fn object(&self) -> &Arc<dyn DataObject> {
        &self.object
    }

    /// Borrow the object as a concrete type.
    pub fn downcast_ref<T: DataObject>(&self) -> Option<&T> {
        self.object.as_any().downcast_ref::<T>()
    }
}

impl PartialEq for ObjectHandle {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && Arc::ptr_eq(&self.object, &other.object)
    }
}

impl fmt::Debug for ObjectHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectHandle")
            .field("name", &self.name)
            .field("type_tag", &self.object.type_tag())
            .finish()
    }
}

/// Current or default value of a property.
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue {
    Int(i64),
    Double(f64),
    Str(String),
    Bool(bool),
    IntArray(Vec<i64>),
    DoubleArray(Vec<f64>),
    StrArray(Vec<String>),
    BoolArray(Vec<bool>),
    Object(Option<ObjectHandle>),
}

impl PropertyValue {
    /// Type name of the carried value.
    pub fn type_name(&self) -> String {
        match self {
            PropertyValue::Int(_) => "int".to_string(),
            PropertyValue::Double(_) => "double".to_string(),
            PropertyValue::Str(_) => "string".to_string(),
            PropertyValue::Bool(_) => "bool".to_string(),
            PropertyValue::IntArray(_) => "int[]".to_string(),
            PropertyValue::DoubleArray(_) => "double[]".to_string(),
            PropertyValue::StrArray(_) => "string[]".to_string(),
            PropertyValue::BoolArray(_) => "bool[]".to_string(),
            PropertyValue::Object(Some(handle)) => format!("object<{}>", handle.type_tag()),
            PropertyValue::Object(None) => "object".to_string(),
        }
    }

    /// Convert into `kind`, widening integers to doubles where needed.
    ///
    /// Returns the value unchanged in `Err` when no conversion applies.
    pub fn coerce(self, kind: &PropertyKind) -> Result<PropertyValue, PropertyValue> {
        match (kind, self) {
            (PropertyKind::Int, v @ PropertyValue::Int(_)) => Ok(v),
            (PropertyKind::Double, v @ PropertyValue::Double(_)) => Ok(v),
            (PropertyKind::Double, PropertyValue::Int(i)) => Ok(PropertyValue::Double(i as f64)),
            (PropertyKind::String, v @ PropertyValue::Str(_)) => Ok(v),
            (PropertyKind::Bool, v @ PropertyValue::Bool(_)) => Ok(v),
            (PropertyKind::ArrayOf(ScalarKind::Int), v @ PropertyValue::IntArray(_)) => Ok(v),
            (PropertyKind::ArrayOf(ScalarKind::Double), v @ PropertyValue::DoubleArray(_)) => Ok(v),
            (PropertyKind::ArrayOf(ScalarKind::Double), PropertyValue::IntArray(values)) => Ok(
                PropertyValue::DoubleArray(values.into_iter().map(|i| i as f64).collect()),
            ),
            (PropertyKind::ArrayOf(ScalarKind::String), v @ PropertyValue::StrArray(_)) => Ok(v),
            (PropertyKind::ArrayOf(ScalarKind::Bool), v @ PropertyValue::BoolArray(_)) => Ok(v),
            (PropertyKind::Object { type_tag }, PropertyValue::Object(handle)) => match (type_tag, handle) {
                (Some(tag), Some(h)) if h.type_tag() != tag => Err(PropertyValue::Object(Some(h))),
                (_, handle) => Ok(PropertyValue::Object(handle)),
            },
            (_, other) => Err(other),
        }
    }

    /// Whether the value is an empty string, empty array or unset object.
    pub fn is_empty(&self) -> bool {
        match self {
            PropertyValue::Str(s) => s.is_empty(),
            PropertyValue::IntArray(v) => v.is_empty(),
            PropertyValue::DoubleArray(v) => v.is_empty(),
            PropertyValue::StrArray(v) => v.is_empty(),
            PropertyValue::BoolArray(v) => v.is_empty(),
            PropertyValue::Object(h) => h.is_none(),
            PropertyValue::Int(_) | PropertyValue::Double(_) | PropertyValue::Bool(_) => false,
        }
    }

    /// Number of elements for arrays, `None` for scalars.
    pub fn array_len(&self) -> Option<usize> {
        match self {
            PropertyValue::IntArray(v) => Some(v.len()),
            PropertyValue::DoubleArray(v) => Some(v.len()),
            PropertyValue::StrArray(v) => Some(v.len()),
            PropertyValue::BoolArray(v) => Some(v.len()),
            _ => None,
        }
    }

    /// Numeric elements as doubles (one element for scalars).
    pub fn numeric_elements(&self) -> Option<Vec<f64>> {
        match self {
            PropertyValue::Int(i) => Some(vec![*i as f64]),
            PropertyValue::Double(d) => Some(vec![*d]),
            PropertyValue::IntArray(v) => Some(v.iter().map(|&i| i as f64).collect()),
            PropertyValue::DoubleArray(v) => Some(v.clone()),
            _ => None,
        }
    }

    /// Canonical string form.
    pub fn to_text(&self) -> String {
        fn join<T: ToString>(items: &[T]) -> String {
            items.iter().map(ToString::to_string).collect::<Vec<_>>().join(",")
        }

        match self {
            PropertyValue::Int(i) => i.to_string(),
            PropertyValue::Double(d) => d.to_string(),
            PropertyValue::Str(s) => s.clone(),
            PropertyValue::Bool(b) => bool_text(*b).to_string(),
            PropertyValue::IntArray(v) => join(v),
            PropertyValue::DoubleArray(v) => join(v),
            PropertyValue::StrArray(v) => join_strings(v),
            PropertyValue::BoolArray(v) => v.iter().map(|&b| bool_text(b)).collect::<Vec<_>>().join(","),
            PropertyValue::Object(Some(handle)) => handle.name().to_string(),
            PropertyValue::Object(None) => String::new(),
        }
    }

    /// Parse `text` as a value of `kind`.
    ///
    /// Objects cannot be parsed here; they are resolved by name through
    /// the data service by the owning property.
    pub fn parse(kind: &PropertyKind, text: &str) -> Result<PropertyValue, String> {
        match kind {
            PropertyKind::Int => parse_int(text).map(PropertyValue::Int),
            PropertyKind::Double => parse_double(text).map(PropertyValue::Double),
            PropertyKind::String => Ok(PropertyValue::Str(text.to_string())),
            PropertyKind::Bool => parse_bool(text).map(PropertyValue::Bool),
            PropertyKind::ArrayOf(ScalarKind::Int) => {
                split_list(text).map(parse_int).collect::<Result<_, _>>().map(PropertyValue::IntArray)
            }
            PropertyKind::ArrayOf(ScalarKind::Double) => split_list(text)
                .map(parse_double)
                .collect::<Result<_, _>>()
                .map(PropertyValue::DoubleArray),
            PropertyKind::ArrayOf(ScalarKind::String) => Ok(PropertyValue::StrArray(split_strings(text))),
            PropertyKind::ArrayOf(ScalarKind::Bool) => split_list(text)
                .map(parse_bool)
                .collect::<Result<_, _>>()
                .map(PropertyValue::BoolArray),
            PropertyKind::Object { .. } => Err("objects are resolved by name".to_string()),
        }
    }
}

impl fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_text())
    }
}

fn bool_text(b: bool) -> &'static str {
    if b {
        "1"
    } else {
        "0"
    }
}

fn split_list(text: &str) -> impl Iterator<Item = &str> {
    let trimmed = text.trim();
    let empty = trimmed.is_empty();
    trimmed
        .split(',')
        .map(str::trim)
        .filter(move |_| !empty)
}

const LIST_SEPARATOR: char = ',';
const LIST_ESCAPE: char = '\\';

/// String elements are written verbatim apart from escaping separators.
/// A lone escape stands for a single empty element, since empty text
/// is the empty array.
fn join_strings(items: &[String]) -> String {
    if let [only] = items {
        if only.is_empty() {
            return LIST_ESCAPE.to_string();
        }
    }
    let mut out = String::new();
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            out.push(LIST_SEPARATOR);
        }
        for c in item.chars() {
            if c == LIST_ESCAPE || c == LIST_SEPARATOR {
                out.push(LIST_ESCAPE);
            }
            out.push(c);
        }
    }
    out
}

fn split_strings(text: &str) -> Vec<String> {
    if text.is_empty() {
        return Vec::new();
    }
    let mut items = Vec::new();
    let mut current = String::new();
    let mut chars = text.chars();
    while let Some(c) = chars.next() {
        match c {
            LIST_ESCAPE => {
                // A trailing escape contributes nothing.
                if let Some(next) = chars.next() {
                    current.push(next);
                }
            }
            LIST_SEPARATOR => items.push(std::mem::take(&mut current)),
            _ => current.push(c),
        }
    }
    items.push(current);
    items
}

fn parse_int(text: &str) -> Result<i64, String> {
    text.trim()
        .parse::<i64>()
        .map_err(|e| format!("not an integer ({})", e))
}

fn parse_double(text: &str) -> Result<f64, String> {
    text.trim()
        .parse::<f64>()
        .map_err(|e| format!("not a number ({})", e))
}

fn parse_bool(text: &str) -> Result<bool, String> {
    match text.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" => Ok(true),
        "0" | "false" | "no" => Ok(false),
        other => Err(format!("'{}' is not a boolean", other)),
    }
}

macro_rules! impl_from_value {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for PropertyValue {
                fn from(v: $ty) -> Self {
                    PropertyValue::$variant(v)
                }
            }
        )*
    };
}

impl_from_value! {
    i64 => Int,
    f64 => Double,
    String => Str,
    bool => Bool,
    Vec<i64> => IntArray,
    Vec<f64> => DoubleArray,
    Vec<String> => StrArray,
    Vec<bool> => BoolArray,
}

impl From<i32> for PropertyValue {
    fn from(v: i32) -> Self {
        PropertyValue::Int(i64::from(v))
    }
}

impl From<&str> for PropertyValue {
    fn from(v: &str) -> Self {
        PropertyValue::Str(v.to_string())
    }
}

impl From<Vec<&str>> for PropertyValue {
    fn from(v: Vec<&str>) -> Self {
        PropertyValue::StrArray(v.into_iter().map(str::to_string).collect())
    }
}

impl From<ObjectHandle> for PropertyValue {
    fn from(v: ObjectHandle) -> Self {
        PropertyValue::Object(Some(v))
    }
}

/// Typed extraction of a property value.
pub trait FromPropertyValue: Sized {
    /// Name of the Rust-side type, for mismatch messages.
    const TYPE_NAME: &'static str;

    fn from_value(value: &PropertyValue) -> Option<Self>;
}

macro_rules! impl_from_property_value {
    ($($ty:ty, $name:literal, $variant:ident);* $(;)?) => {
        $(
            impl FromPropertyValue for $ty {
                const TYPE_NAME: &'static str = $name;

                fn from_value(value: &PropertyValue) -> Option<Self> {
                    match value {
                        PropertyValue::$variant(v) => Some(v.clone()),
                        _ => None,
                    }
                }
            }
        )*
    };
}

impl_from_property_value! {
    i64, "int", Int;
    bool, "bool", Bool;
    String, "string", Str;
    Vec<i64>, "int[]", IntArray;
    Vec<String>, "string[]", StrArray;
    Vec<bool>, "bool[]", BoolArray;
}

impl FromPropertyValue for f64 {
    const TYPE_NAME: &'static str = "double";

    fn from_value(value: &PropertyValue) -> Option<Self> {
        match value {
            PropertyValue::Double(d) => Some(*d),
            PropertyValue::Int(i) => Some(*i as f64),
            _ => None,
        }
    }
}

impl FromPropertyValue for Vec<f64> {
    const TYPE_NAME: &'static str = "double[]";

    fn from_value(value: &PropertyValue) -> Option<Self> {
        match value {
            PropertyValue::DoubleArray(v) => Some(v.clone()),
            PropertyValue::IntArray(v) => Some(v.iter().map(|&i| i as f64).collect()),
            _ => None,
        }
    }
}

impl FromPropertyValue for ObjectHandle {
    const TYPE_NAME: &'static str = "object";

    fn from_value(value: &PropertyValue) -> Option<Self> {
        match value {
            PropertyValue::Object(Some(h)) => Some(h.clone()),
            _ => None,
        }
    }
}

impl FromPropertyValue for Option<ObjectHandle> {
    const TYPE_NAME: &'static str = "object";

    fn from_value(value: &PropertyValue) -> Option<Self> {
        match value {
            PropertyValue::Object(h) => Some(h.clone()),
            _ => None,
        }
    }
}
