//! Built-in algorithms.

mod create_workspace;
mod normalise_to_max;
mod scale;

pub use create_workspace::CreateWorkspace;
pub use normalise_to_max::NormaliseToMax;
pub use scale::Scale;

use crate::algorithm::AlgorithmFactory;
use crate::error::FrameworkResult;
use crate::registry::DuplicatePolicy;

/// Subscribe every built-in algorithm to `factory`.
///
/// Keys that are already taken keep their existing constructor, so this
/// can be repeated and never displaces a user registration.
pub fn register_builtin(factory: &AlgorithmFactory) -> FrameworkResult<()> {
    factory.subscribe_with::<CreateWorkspace>(DuplicatePolicy::Ignore)?;
    factory.subscribe_with::<Scale>(DuplicatePolicy::Ignore)?;
    factory.subscribe_with::<NormaliseToMax>(DuplicatePolicy::Ignore)?;
    Ok(())
}
