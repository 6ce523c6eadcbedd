//! Typed, validated properties and their ordered manager.

pub mod base;
pub mod manager;
pub mod validator;
pub mod value;

pub use base::{Direction, Property};
pub use manager::{PropertyHistory, PropertyManager};
pub use validator::{Relation, Validator};
pub use value::{FromPropertyValue, ObjectHandle, PropertyKind, PropertyValue, ScalarKind};
