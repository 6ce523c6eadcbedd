//! Opaque data objects handed between algorithms.

pub mod data_service;
pub mod factory;
pub mod object;
pub mod workspace2d;

pub use data_service::AnalysisDataService;
pub use factory::WorkspaceFactory;
pub use object::DataObject;
pub use workspace2d::{Workspace, Workspace2D, WORKSPACE_2D};
