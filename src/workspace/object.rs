//! Opaque data objects carried by object properties.

use std::any::Any;
use std::fmt;

/// A data payload the core stores and hands around without interpreting.
pub trait DataObject: Any + Send + Sync + fmt::Debug {
    /// Tag checked against object-property declarations.
    fn type_tag(&self) -> &str;

    fn as_any(&self) -> &dyn Any;

    /// Approximate memory footprint in bytes.
    fn memory_size(&self) -> usize {
        0
    }
}
