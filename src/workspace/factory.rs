//! Factory for workspace types.

use super::workspace2d::{Workspace, Workspace2D, WORKSPACE_2D};
use crate::error::FrameworkResult;
use crate::registry::{DuplicatePolicy, DynamicFactory, SingletonHolder};
use std::ops::Deref;
use std::sync::Arc;

static INSTANCE: SingletonHolder<WorkspaceFactory> =
    SingletonHolder::new("WorkspaceFactory", || Ok(WorkspaceFactory::new()));

/// Creates workspaces by type name.
pub struct WorkspaceFactory {
    inner: DynamicFactory<dyn Workspace>,
}

impl WorkspaceFactory {
    pub fn new() -> Self {
        Self {
            inner: DynamicFactory::new("workspace type"),
        }
    }

    /// The process-wide factory.
    pub fn instance() -> FrameworkResult<Arc<WorkspaceFactory>> {
        INSTANCE.instance()
    }

    /// Subscribe the workspace types this crate provides. A key that is
    /// already taken keeps its constructor.
    pub fn register_builtin(&self) -> FrameworkResult<()> {
        self.inner.subscribe_with(
            WORKSPACE_2D,
            || Box::new(Workspace2D::default()) as Box<dyn Workspace>,
            DuplicatePolicy::Ignore,
        )
    }

    /// Create and size a workspace of type `key`.
    pub fn create_workspace(
        &self,
        key: &str,
        n_histograms: usize,
        x_len: usize,
        y_len: usize,
    ) -> FrameworkResult<Box<dyn Workspace>> {
        let mut ws = self.inner.create_unwrapped(key)?;
        ws.initialize(n_histograms, x_len, y_len);
        Ok(ws)
    }
}

impl Default for WorkspaceFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl Deref for WorkspaceFactory {
    type Target = DynamicFactory<dyn Workspace>;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}
