//! NormaliseToMax: divides a workspace by its largest y value.

use crate::algorithm::{Algorithm, ExecutionContext};
use crate::error::FrameworkResult;
use crate::property::{ObjectHandle, Property, PropertyKind, PropertyManager, Validator};
use crate::workspace::{Workspace2D, WORKSPACE_2D};
use anyhow::{anyhow, bail};

/// Finds the maximum, then delegates the division to a `Scale` child
/// reporting over the second half of the progress range.
#[derive(Debug, Default)]
pub struct NormaliseToMax;

impl Algorithm for NormaliseToMax {
    fn name(&self) -> &'static str {
        "NormaliseToMax"
    }

    fn category(&self) -> &'static str {
        "Arithmetic"
    }

    fn summary(&self) -> &'static str {
        "Scales a workspace so that its largest y value is 1."
    }

    fn declare_properties(&mut self, pm: &mut PropertyManager) -> FrameworkResult<()> {
        pm.declare(
            Property::with_kind("InputWorkspace", PropertyKind::object(WORKSPACE_2D))
                .with_validator(Validator::Mandatory),
        )?;
        pm.declare(Property::new("OutputWorkspace", "").with_validator(Validator::Mandatory))
    }

    fn run(&mut self, ctx: &mut ExecutionContext<'_>) -> anyhow::Result<()> {
        let input: ObjectHandle = ctx.get("InputWorkspace")?;
        let output: String = ctx.get("OutputWorkspace")?;

        let max = input
            .downcast_ref::<Workspace2D>()
            .ok_or_else(|| anyhow!("'{}' is not a {WORKSPACE_2D}", input.name()))?
            .max_y()
            .ok_or_else(|| anyhow!("'{}' holds no y values", input.name()))?;
        if max == 0.0 {
            bail!("cannot normalise '{}': maximum is zero", input.name());
        }
        ctx.report_progress(0.5, "maximum found");
        ctx.interruption_point()?;

        let mut scale = ctx.create_child_algorithm("Scale", 0.5, 1.0)?;
        scale.set_property("InputWorkspace", input)?;
        scale.set_property("Factor", 1.0 / max)?;
        scale.set_property("Operation", "Multiply")?;
        scale.set_property("OutputWorkspace", output)?;
        scale.execute()?;
        Ok(())
    }
}
