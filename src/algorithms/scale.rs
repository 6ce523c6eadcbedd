//! Scale: multiplies or offsets every y value of a workspace.

use crate::algorithm::{Algorithm, ExecutionContext};
use crate::error::{FrameworkError, FrameworkResult};
use crate::property::{ObjectHandle, Property, PropertyKind, PropertyManager, Validator};
use crate::workspace::{AnalysisDataService, Workspace2D, WORKSPACE_2D};
use anyhow::anyhow;
use ndarray::Axis;
use std::sync::Arc;

const MULTIPLY: &str = "Multiply";
const ADD: &str = "Add";

#[derive(Debug, Default)]
pub struct Scale;

impl Algorithm for Scale {
    fn name(&self) -> &'static str {
        "Scale"
    }

    fn category(&self) -> &'static str {
        "Arithmetic"
    }

    fn summary(&self) -> &'static str {
        "Scales or offsets the y values of a workspace by a constant."
    }

    fn declare_properties(&mut self, pm: &mut PropertyManager) -> FrameworkResult<()> {
        pm.declare(
            Property::with_kind("InputWorkspace", PropertyKind::object(WORKSPACE_2D))
                .with_validator(Validator::Mandatory),
        )?;
        pm.declare(Property::new("Factor", 1.0).with_documentation("The value to scale by or add"))?;
        pm.declare(Property::new("Operation", MULTIPLY).with_validator(Validator::allowed([MULTIPLY, ADD])))?;
        pm.declare(Property::new("OutputWorkspace", "").with_validator(Validator::Mandatory))
    }

    fn run(&mut self, ctx: &mut ExecutionContext<'_>) -> anyhow::Result<()> {
        use rayon::prelude::*;

        let input: ObjectHandle = ctx.get("InputWorkspace")?;
        let factor: f64 = ctx.get("Factor")?;
        let operation: String = ctx.get("Operation")?;
        let output: String = ctx.get("OutputWorkspace")?;

        let source = input
            .downcast_ref::<Workspace2D>()
            .ok_or_else(|| anyhow!("'{}' is not a {WORKSPACE_2D}", input.name()))?;
        let mut result = source.clone();

        let multiply = operation == MULTIPLY;
        let progress = ctx.progress(0.0, 1.0, result.y().nrows());
        let name = self.name();
        let (y, e) = result.data_mut();

        y.axis_iter_mut(Axis(0))
            .into_par_iter()
            .zip(e.axis_iter_mut(Axis(0)).into_par_iter())
            .try_for_each(|(mut y_row, mut e_row)| {
                if progress.is_cancelled() {
                    return Err(FrameworkError::Cancelled {
                        algorithm: name.to_string(),
                    });
                }
                if multiply {
                    y_row.mapv_inplace(|v| v * factor);
                    e_row.mapv_inplace(|v| v * factor.abs());
                } else {
                    y_row.mapv_inplace(|v| v + factor);
                }
                progress.report();
                Ok(())
            })?;

        AnalysisDataService::instance()?.add_or_replace(&output, Arc::new(result))?;
        Ok(())
    }
}
