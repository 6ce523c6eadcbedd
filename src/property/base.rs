//! A single named, typed, validated property.

use super::validator::Validator;
use super::value::{PropertyKind, PropertyValue, ScalarKind};
use crate::error::{FrameworkError, FrameworkResult};
use crate::workspace::AnalysisDataService;
use serde::{Deserialize, Serialize};

/// Data flow direction of a property relative to its algorithm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    Input,
    Output,
    InOut,
}

impl Direction {
    pub fn name(&self) -> &'static str {
        match self {
            Direction::Input => "Input",
            Direction::Output => "Output",
            Direction::InOut => "InOut",
        }
    }

    /// Whether the algorithm reads this property.
    pub fn is_input(&self) -> bool {
        matches!(self, Direction::Input | Direction::InOut)
    }
}

/// A named value of a declared kind.
#[derive(Debug, Clone)]
pub struct Property {
    name: String,
    kind: PropertyKind,
    value: PropertyValue,
    default: PropertyValue,
    direction: Direction,
    validator: Option<Validator>,
    documentation: String,
    is_default: bool,
}

impl Property {
    /// Create an input property whose kind follows its default value.
    pub fn new(name: impl Into<String>, default: impl Into<PropertyValue>) -> Self {
        let default = default.into();
        let kind = kind_of(&default);
        Self::build(name.into(), kind, default)
    }

    /// Create a property of an explicit kind, defaulting to the kind's
    /// zero value.
    pub fn with_kind(name: impl Into<String>, kind: PropertyKind) -> Self {
        let default = kind.zero_value();
        Self::build(name.into(), kind, default)
    }

    fn build(name: String, kind: PropertyKind, default: PropertyValue) -> Self {
        Self {
            name,
            kind,
            value: default.clone(),
            default,
            direction: Direction::Input,
            validator: None,
            documentation: String::new(),
            is_default: true,
        }
    }

    pub fn with_validator(mut self, validator: Validator) -> Self {
        self.validator = Some(validator);
        self
    }

    pub fn with_direction(mut self, direction: Direction) -> Self {
        self.direction = direction;
        self
    }

    pub fn with_documentation(mut self, doc: impl Into<String>) -> Self {
        self.documentation = doc.into();
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> &PropertyKind {
        &self.kind
    }

    pub fn value(&self) -> &PropertyValue {
        &self.value
    }

    pub fn default_value(&self) -> &PropertyValue {
        &self.default
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn validator(&self) -> Option<&Validator> {
        self.validator.as_ref()
    }

    pub fn documentation(&self) -> &str {
        &self.documentation
    }

    pub fn is_default(&self) -> bool {
        self.is_default
    }

    pub fn value_as_string(&self) -> String {
        self.value.to_text()
    }

    pub fn default_as_string(&self) -> String {
        self.default.to_text()
    }

    /// Values offered to a user, derived from the validator.
    pub fn allowed_values(&self) -> Vec<String> {
        match (&self.validator, &self.kind) {
            (Some(v), _) => v.allowed_values(),
            (None, PropertyKind::Bool) => vec!["0".to_string(), "1".to_string()],
            (None, _) => Vec::new(),
        }
    }

    /// Set a new value.
    ///
    /// Fails only on a kind mismatch. A value the validator rejects is
    /// still stored; the rejection reason is returned.
    pub fn set_value(&mut self, value: impl Into<PropertyValue>) -> FrameworkResult<Option<String>> {
        let value = value.into().coerce(&self.kind).map_err(|rejected| FrameworkError::TypeMismatch {
            property: self.name.clone(),
            expected: self.kind.type_name(),
            found: rejected.type_name(),
        })?;

        self.is_default = value == self.default;
        self.value = value;
        Ok(self.validate())
    }

    /// Parse `text` into the declared kind and set it.
    ///
    /// Object properties resolve `text` as a name in the data service;
    /// empty text clears the object.
    pub fn set_value_from_string(&mut self, text: &str) -> FrameworkResult<Option<String>> {
        let value = match &self.kind {
            PropertyKind::Object { .. } => {
                let name = text.trim();
                if name.is_empty() {
                    PropertyValue::Object(None)
                } else {
                    let handle = AnalysisDataService::instance()?
                        .retrieve(name)
                        .map_err(|e| self.parse_error(text, e.to_string()))?;
                    PropertyValue::Object(Some(handle))
                }
            }
            kind => PropertyValue::parse(kind, text).map_err(|reason| self.parse_error(text, reason))?,
        };
        self.set_value(value)
    }

    /// Restore the default value.
    pub fn reset(&mut self) {
        self.value = self.default.clone();
        self.is_default = true;
    }

    /// Validator verdict on the current value.
    pub fn validate(&self) -> Option<String> {
        self.validator
            .as_ref()
            .and_then(|v| v.check(&self.value, self.is_default))
    }

    pub fn is_valid(&self) -> bool {
        self.validate().is_none()
    }

    fn parse_error(&self, text: &str, reason: String) -> FrameworkError {
        FrameworkError::Parse {
            property: self.name.clone(),
            text: text.to_string(),
            reason,
        }
    }
}

fn kind_of(value: &PropertyValue) -> PropertyKind {
    match value {
        PropertyValue::Int(_) => PropertyKind::Int,
        PropertyValue::Double(_) => PropertyKind::Double,
        PropertyValue::Str(_) => PropertyKind::String,
        PropertyValue::Bool(_) => PropertyKind::Bool,
        PropertyValue::IntArray(_) => PropertyKind::ArrayOf(ScalarKind::Int),
        PropertyValue::DoubleArray(_) => PropertyKind::ArrayOf(ScalarKind::Double),
        PropertyValue::StrArray(_) => PropertyKind::ArrayOf(ScalarKind::String),
        PropertyValue::BoolArray(_) => PropertyKind::ArrayOf(ScalarKind::Bool),
        PropertyValue::Object(Some(handle)) => PropertyKind::object(handle.type_tag()),
        PropertyValue::Object(None) => PropertyKind::any_object(),
    }
}
