//! Ordered, name-keyed collection of properties.

use super::base::{Direction, Property};
use super::validator::Validator;
use super::value::{FromPropertyValue, PropertyValue};
use crate::error::{FrameworkError, FrameworkResult, PropertyIssue, ValidationFailures};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::collections::HashMap;

const PAIR_SEPARATOR: char = ';';
const ESCAPE: char = '\\';

/// Snapshot of one property for the execution history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyHistory {
    pub name: String,
    pub value: String,
    pub is_default: bool,
    pub direction: Direction,
}

/// Properties in declaration order, looked up case-insensitively.
#[derive(Debug, Clone, Default)]
pub struct PropertyManager {
    properties: Vec<Property>,
    index: HashMap<String, usize>,
}

impl PropertyManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a property. Names are unique ignoring case.
    pub fn declare(&mut self, property: Property) -> FrameworkResult<()> {
        let name = property.name();
        if name.is_empty() || name.contains(['=', PAIR_SEPARATOR]) {
            return Err(FrameworkError::Parse {
                property: name.to_string(),
                text: name.to_string(),
                reason: "property names must be non-empty and may not contain '=' or ';'".to_string(),
            });
        }

        let key = name.to_lowercase();
        if self.index.contains_key(&key) {
            return Err(FrameworkError::DuplicateName {
                name: name.to_string(),
            });
        }

        self.index.insert(key, self.properties.len());
        self.properties.push(property);
        Ok(())
    }

    /// Declare a property from its parts.
    pub fn declare_property(
        &mut self,
        name: &str,
        default: impl Into<PropertyValue>,
        validator: Option<Validator>,
        direction: Direction,
    ) -> FrameworkResult<()> {
        let mut property = Property::new(name, default).with_direction(direction);
        if let Some(v) = validator {
            property = property.with_validator(v);
        }
        self.declare(property)
    }

    pub fn exists_property(&self, name: &str) -> bool {
        self.index.contains_key(&name.to_lowercase())
    }

    pub fn get_property(&self, name: &str) -> FrameworkResult<&Property> {
        self.position(name).map(|i| &self.properties[i])
    }

    /// String form of a property's current value.
    pub fn get_property_value(&self, name: &str) -> FrameworkResult<String> {
        self.get_property(name).map(Property::value_as_string)
    }

    /// Typed value of a property.
    pub fn get_value<T: FromPropertyValue>(&self, name: &str) -> FrameworkResult<T> {
        let property = self.get_property(name)?;
        T::from_value(property.value()).ok_or_else(|| FrameworkError::TypeMismatch {
            property: property.name().to_string(),
            expected: T::TYPE_NAME.to_string(),
            found: property.value().type_name(),
        })
    }

    /// Set a typed value; returns the validator's rejection, if any.
    pub fn set_property(
        &mut self,
        name: &str,
        value: impl Into<PropertyValue>,
    ) -> FrameworkResult<Option<String>> {
        let i = self.position(name)?;
        self.properties[i].set_value(value)
    }

    /// Parse and set a value; returns the validator's rejection, if any.
    pub fn set_property_value(&mut self, name: &str, text: &str) -> FrameworkResult<Option<String>> {
        let i = self.position(name)?;
        self.properties[i].set_value_from_string(text)
    }

    /// Apply every `(name, text)` pair, then report all failures together.
    pub fn set_properties<I, K, V>(&mut self, values: I) -> FrameworkResult<()>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut issues = Vec::new();
        for (name, text) in values {
            let name = name.as_ref();
            match self.set_property_value(name, text.as_ref()) {
                Ok(None) => {}
                Ok(Some(reason)) => issues.push(PropertyIssue::new(name, reason)),
                Err(e) => issues.push(PropertyIssue::new(name, e.to_string())),
            }
        }

        if issues.is_empty() {
            Ok(())
        } else {
            Err(FrameworkError::Validation(ValidationFailures(issues)))
        }
    }

    /// Apply a form produced by [`as_string`](Self::as_string).
    ///
    /// Entries naming output properties are skipped.
    pub fn set_properties_from_string(&mut self, text: &str) -> FrameworkResult<()> {
        let pairs = Self::parse_serialized(text)?;
        let inputs: Vec<(String, String)> = pairs
            .into_iter()
            .filter(|(name, _)| {
                self.get_property(name)
                    .map(|p| p.direction() != Direction::Output)
                    .unwrap_or(true)
            })
            .collect();
        self.set_properties(inputs)
    }

    /// All properties in declaration order.
    pub fn properties(&self) -> &[Property] {
        &self.properties
    }

    pub fn property_names(&self) -> Vec<&str> {
        self.properties.iter().map(Property::name).collect()
    }

    pub fn len(&self) -> usize {
        self.properties.len()
    }

    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }

    pub fn remove_property(&mut self, name: &str) -> FrameworkResult<Property> {
        let i = self.position(name)?;
        let removed = self.properties.remove(i);
        self.rebuild_index();
        Ok(removed)
    }

    /// Restore every property to its default.
    pub fn reset_properties(&mut self) {
        for p in &mut self.properties {
            p.reset();
        }
    }

    /// Every validation issue among input properties.
    pub fn validate_properties(&self) -> ValidationFailures {
        ValidationFailures(
            self.properties
                .iter()
                .filter(|p| p.direction().is_input())
                .filter_map(|p| p.validate().map(|reason| PropertyIssue::new(p.name(), reason)))
                .collect(),
        )
    }

    /// `name=value` pairs in declaration order, `;`-separated.
    pub fn as_string(&self) -> String {
        self.serialize(|_| true)
    }

    /// Like [`as_string`](Self::as_string) but omitting defaulted properties.
    pub fn as_string_non_default(&self) -> String {
        self.serialize(|p| !p.is_default())
    }

    /// Typed JSON object of the current values.
    pub fn as_json(&self) -> Value {
        let mut map = Map::new();
        for p in &self.properties {
            map.insert(p.name().to_string(), value_to_json(p.value()));
        }
        Value::Object(map)
    }

    /// History records for every property.
    pub fn history(&self) -> Vec<PropertyHistory> {
        self.properties
            .iter()
            .map(|p| PropertyHistory {
                name: p.name().to_string(),
                value: p.value_as_string(),
                is_default: p.is_default(),
                direction: p.direction(),
            })
            .collect()
    }

    /// Split a serialized form into `(name, value)` pairs.
    pub fn parse_serialized(text: &str) -> FrameworkResult<Vec<(String, String)>> {
        let mut pairs = Vec::new();
        for segment in split_unescaped(text) {
            if segment.trim().is_empty() {
                continue;
            }
            let (name, raw) = segment.split_once('=').ok_or_else(|| FrameworkError::Parse {
                property: String::new(),
                text: segment.clone(),
                reason: "expected name=value".to_string(),
            })?;
            pairs.push((name.trim().to_string(), unescape(raw)));
        }
        Ok(pairs)
    }

    fn serialize(&self, include: impl Fn(&Property) -> bool) -> String {
        self.properties
            .iter()
            .filter(|p| include(p))
            .map(|p| format!("{}={}", p.name(), escape(&p.value_as_string())))
            .collect::<Vec<_>>()
            .join(&PAIR_SEPARATOR.to_string())
    }

    fn position(&self, name: &str) -> FrameworkResult<usize> {
        self.index
            .get(&name.to_lowercase())
            .copied()
            .ok_or_else(|| FrameworkError::not_found("property", name))
    }

    fn rebuild_index(&mut self) {
        self.index = self
            .properties
            .iter()
            .enumerate()
            .map(|(i, p)| (p.name().to_lowercase(), i))
            .collect();
    }
}

fn value_to_json(value: &PropertyValue) -> Value {
    match value {
        PropertyValue::Int(i) => json!(i),
        PropertyValue::Double(d) => json!(d),
        PropertyValue::Str(s) => json!(s),
        PropertyValue::Bool(b) => json!(b),
        PropertyValue::IntArray(v) => json!(v),
        PropertyValue::DoubleArray(v) => json!(v),
        PropertyValue::StrArray(v) => json!(v),
        PropertyValue::BoolArray(v) => json!(v),
        PropertyValue::Object(Some(handle)) => json!(handle.name()),
        PropertyValue::Object(None) => Value::Null,
    }
}

fn escape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        if c == ESCAPE || c == PAIR_SEPARATOR {
            out.push(ESCAPE);
        }
        out.push(c);
    }
    out
}

fn unescape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars();
    while let Some(c) = chars.next() {
        if c == ESCAPE {
            if let Some(next) = chars.next() {
                out.push(next);
                continue;
            }
        }
        out.push(c);
    }
    out
}

/// Split on separators not preceded by an escape; escapes are kept.
fn split_unescaped(text: &str) -> Vec<String> {
    let mut segments = Vec::new();
    let mut current = String::new();
    let mut chars = text.chars();
    while let Some(c) = chars.next() {
        match c {
            ESCAPE => {
                current.push(c);
                if let Some(next) = chars.next() {
                    current.push(next);
                }
            }
            PAIR_SEPARATOR => segments.push(std::mem::take(&mut current)),
            _ => current.push(c),
        }
    }
    segments.push(current);
    segments
}
