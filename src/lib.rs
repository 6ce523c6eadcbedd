//! reductionrs - property-driven algorithm execution core.
//!
//! This crate provides the machinery data-reduction algorithms are built
//! on:
//!
//! - Typed, validated properties collected in a `PropertyManager`
//! - Name-keyed constructor registries and lazy process-wide singletons
//! - An execution engine with notifications, progress, cancellation,
//!   child algorithms and execution history
//! - Async execution on a tokio worker pool
//! - FFI layer for C and other language bindings
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────┐
//! │     FFI Layer (reductionrs.h)       │
//! │  C-compatible functions & types     │
//! └─────────────────────────────────────┘
//!                   │
//!                   ▼
//! ┌─────────────────────────────────────┐
//! │        Execution Engine             │
//! │  ┌───────────┐  ┌───────────────┐  │
//! │  │ Algorithm │  │ Notifications │  │
//! │  │ Instance  │  │  & Progress   │  │
//! │  └───────────┘  └───────────────┘  │
//! │  ┌───────────┐  ┌───────────────┐  │
//! │  │ Property  │  │    Tokio      │  │
//! │  │ Manager   │  │   Workers     │  │
//! │  └───────────┘  └───────────────┘  │
//! └─────────────────────────────────────┘
//!                   │
//!                   ▼
//! ┌─────────────────────────────────────┐
//! │  Registries: AlgorithmFactory,      │
//! │  WorkspaceFactory, DataService      │
//! └─────────────────────────────────────┘
//! ```
//!
//! # Usage
//!
//! ```no_run
//! use reductionrs::{bootstrap, FrameworkConfig};
//!
//! let manager = bootstrap(&FrameworkConfig::default())?;
//! let mut alg = manager.create("CreateWorkspace", None)?;
//! alg.set_property("DataY", vec![1.0, 2.0, 3.0, 4.0])?;
//! alg.set_property("NSpec", 2i64)?;
//! alg.set_property("OutputWorkspace", "raw")?;
//! alg.execute()?;
//! # Ok::<(), reductionrs::FrameworkError>(())
//! ```
//!
//! # FFI Usage
//!
//! ```c
//! rdx_framework_init(NULL);
//!
//! AlgorithmHandle alg;
//! rdx_algorithm_create("Scale", 0, &alg);
//! rdx_algorithm_set_property(alg, "InputWorkspace", "raw");
//! rdx_algorithm_set_property(alg, "Factor", "2.5");
//! rdx_algorithm_set_property(alg, "OutputWorkspace", "scaled");
//! if (rdx_algorithm_execute(alg) != RdxStatus_Ok) {
//!     puts(rdx_last_error_message());
//! }
//! rdx_algorithm_free(alg);
//! ```

pub mod algorithm;
pub mod algorithms;
pub mod config;
pub mod error;
pub mod ffi;
pub mod property;
pub mod registry;
pub mod runtime;
pub mod workspace;

// Re-export commonly used items
pub use algorithm::{
    Algorithm, AlgorithmEvent, AlgorithmFactory, AlgorithmInstance, AlgorithmManager, AlgorithmObserver,
    EventMask, ExecutionContext, HistoryRecord, LoggingObserver, Notification, Progress, Subscription,
};
pub use config::{bootstrap, init_logging, FrameworkConfig};
pub use error::{FrameworkError, FrameworkResult, PropertyIssue, ValidationFailures};
pub use property::{Direction, Property, PropertyKind, PropertyManager, PropertyValue, Validator};
pub use registry::{DuplicatePolicy, DynamicFactory, SingletonHolder};
pub use runtime::{AsyncExecutor, RuntimeConfig};
pub use workspace::{AnalysisDataService, DataObject, Workspace, Workspace2D, WorkspaceFactory};

// Re-export FFI types for cbindgen
pub use ffi::algorithm::*;
pub use ffi::runtime::*;
pub use ffi::types::*;
