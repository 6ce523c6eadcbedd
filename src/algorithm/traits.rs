//! Hook interface implemented by concrete algorithms.

use super::instance::ExecutionContext;
use crate::error::{FrameworkResult, PropertyIssue};
use crate::property::PropertyManager;

/// A named, versioned unit of work driven through its properties.
///
/// The engine ([`AlgorithmInstance`](super::AlgorithmInstance)) owns the
/// property manager and the lifecycle; implementors only declare
/// properties and do the work.
pub trait Algorithm: Send {
    fn name(&self) -> &'static str;

    fn version(&self) -> u32 {
        1
    }

    fn category(&self) -> &'static str {
        "General"
    }

    /// One-line description shown to users.
    fn summary(&self) -> &'static str {
        ""
    }

    /// Declare every property. Called once, on initialization.
    fn declare_properties(&mut self, properties: &mut PropertyManager) -> FrameworkResult<()>;

    /// Cross-property checks run after per-property validation.
    fn validate_inputs(&self, _properties: &PropertyManager) -> Vec<PropertyIssue> {
        Vec::new()
    }

    /// Do the work. Inputs and outputs flow through the context's
    /// properties.
    fn run(&mut self, ctx: &mut ExecutionContext<'_>) -> anyhow::Result<()>;
}
