//! CreateWorkspace: builds a workspace from flat y data.

use crate::algorithm::{Algorithm, ExecutionContext};
use crate::error::{FrameworkResult, PropertyIssue};
use crate::property::{Property, PropertyKind, PropertyManager, ScalarKind, Validator};
use crate::workspace::{AnalysisDataService, Workspace2D};
use anyhow::Context;
use ndarray::Array2;
use std::sync::Arc;

/// Splits `DataY` into `NSpec` equal spectra and stores the result.
#[derive(Debug, Default)]
pub struct CreateWorkspace;

impl Algorithm for CreateWorkspace {
    fn name(&self) -> &'static str {
        "CreateWorkspace"
    }

    fn category(&self) -> &'static str {
        "Utility\\Workspaces"
    }

    fn summary(&self) -> &'static str {
        "Creates a 2D workspace from a flat list of y values."
    }

    fn declare_properties(&mut self, pm: &mut PropertyManager) -> FrameworkResult<()> {
        pm.declare(
            Property::with_kind("DataY", PropertyKind::ArrayOf(ScalarKind::Double))
                .with_validator(Validator::Mandatory)
                .with_documentation("Y values of every spectrum, concatenated"),
        )?;
        pm.declare(
            Property::new("NSpec", 1i64)
                .with_validator(Validator::lower_bound(1.0))
                .with_documentation("Number of spectra"),
        )?;
        pm.declare(
            Property::new("OutputWorkspace", "")
                .with_validator(Validator::Mandatory)
                .with_documentation("Name under which the workspace is stored"),
        )
    }

    fn validate_inputs(&self, pm: &PropertyManager) -> Vec<PropertyIssue> {
        let (Ok(data), Ok(n_spec)) = (pm.get_value::<Vec<f64>>("DataY"), pm.get_value::<i64>("NSpec")) else {
            return Vec::new();
        };
        if n_spec >= 1 && !data.is_empty() && data.len() % n_spec as usize != 0 {
            return vec![PropertyIssue::new(
                "DataY",
                format!("length {} is not a multiple of NSpec ({n_spec})", data.len()),
            )];
        }
        Vec::new()
    }

    fn run(&mut self, ctx: &mut ExecutionContext<'_>) -> anyhow::Result<()> {
        let data: Vec<f64> = ctx.get("DataY")?;
        let n_spec = ctx.get::<i64>("NSpec")? as usize;
        let output: String = ctx.get("OutputWorkspace")?;

        let y_len = data.len() / n_spec;
        let y = Array2::from_shape_vec((n_spec, y_len), data).context("DataY does not fit NSpec")?;
        let workspace = Workspace2D::from_y(y);

        AnalysisDataService::instance()?.add_or_replace(&output, Arc::new(workspace))?;
        ctx.report_progress(1.0, "workspace created");
        Ok(())
    }
}
