//! Framework configuration and the explicit startup sequence.

use crate::algorithm::{AlgorithmFactory, AlgorithmManager};
use crate::algorithms::register_builtin;
use crate::error::FrameworkResult;
use crate::registry::DuplicatePolicy;
use crate::runtime::RuntimeConfig;
use crate::workspace::WorkspaceFactory;
use parking_lot::{const_mutex, Mutex};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

static BOOTSTRAPPED: Mutex<bool> = const_mutex(false);

/// Process-level settings, usually read from JSON.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FrameworkConfig {
    /// Threads of the asynchronous executor; 0 means one per CPU.
    pub worker_count: usize,
    /// Policy applied to repeated factory subscriptions.
    pub on_duplicate: DuplicatePolicy,
    /// Whether managed algorithms record execution history.
    pub record_history: bool,
}

impl Default for FrameworkConfig {
    fn default() -> Self {
        Self {
            worker_count: 0,
            on_duplicate: DuplicatePolicy::Error,
            record_history: true,
        }
    }
}

impl FrameworkConfig {
    /// Parse a JSON document; missing fields take their defaults.
    pub fn from_json(text: &str) -> FrameworkResult<Self> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn to_json(&self) -> FrameworkResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Executor settings derived from this configuration.
    pub fn runtime_config(&self) -> RuntimeConfig {
        match self.worker_count {
            0 => RuntimeConfig::default(),
            n => RuntimeConfig { worker_count: n },
        }
    }
}

/// Apply `config` to the process-wide services and register the built-in
/// algorithm and workspace types.
///
/// Registration happens once per process; later calls only re-apply the
/// policies.
pub fn bootstrap(config: &FrameworkConfig) -> FrameworkResult<Arc<AlgorithmManager>> {
    let factory = AlgorithmFactory::instance()?;
    let workspaces = WorkspaceFactory::instance()?;
    factory.set_duplicate_policy(config.on_duplicate);
    workspaces.set_duplicate_policy(config.on_duplicate);

    let manager = AlgorithmManager::instance()?;
    manager.set_record_history(config.record_history);

    let mut bootstrapped = BOOTSTRAPPED.lock();
    if !*bootstrapped {
        register_builtin(&factory)?;
        workspaces.register_builtin()?;
        *bootstrapped = true;
        info!(
            algorithms = factory.len(),
            workspace_types = workspaces.len(),
            on_duplicate = ?config.on_duplicate,
            "framework bootstrapped"
        );
    }
    Ok(manager)
}

/// Install a `tracing` subscriber filtered by `RUST_LOG` (default
/// `info`). Returns `false` if a subscriber was already installed.
pub fn init_logging() -> bool {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).try_init().is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_uses_defaults() {
        let config = FrameworkConfig::from_json(r#"{ "on_duplicate": "overwrite" }"#).unwrap();
        assert_eq!(config.on_duplicate, DuplicatePolicy::Overwrite);
        assert_eq!(config.worker_count, 0);
        assert!(config.record_history);
    }

    #[test]
    fn test_malformed_json_is_a_config_error() {
        let err = FrameworkConfig::from_json("{ worker_count: }").unwrap_err();
        assert!(matches!(err, crate::error::FrameworkError::Config(_)));
    }

    #[test]
    fn test_runtime_config_resolves_zero_workers() {
        let config = FrameworkConfig {
            worker_count: 3,
            ..Default::default()
        };
        assert_eq!(config.runtime_config().worker_count, 3);
        assert_eq!(FrameworkConfig::default().runtime_config().worker_count, num_cpus::get());
    }

    #[test]
    fn test_bootstrap_is_repeatable() {
        let config = FrameworkConfig::default();
        let manager = bootstrap(&config).unwrap();
        bootstrap(&config).unwrap();

        assert!(manager.factory().exists("Scale", Some(1)));
        assert!(WorkspaceFactory::instance().unwrap().exists(crate::workspace::WORKSPACE_2D));
        init_logging();
        assert!(!init_logging());
    }
}
