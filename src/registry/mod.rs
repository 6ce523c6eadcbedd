//! Name-keyed factories and process-wide singletons.

pub mod factory;
pub mod singleton;

pub use factory::{DuplicatePolicy, DynamicFactory};
pub use singleton::SingletonHolder;
