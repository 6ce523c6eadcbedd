//! Process-wide creation point for managed algorithms.

use super::cancel::WeakCancelFlag;
use super::factory::AlgorithmFactory;
use super::instance::AlgorithmInstance;
use super::notification::{AlgorithmIdentity, AlgorithmObserver, EventMask, NotificationCenter, Subscription};
use crate::error::FrameworkResult;
use crate::registry::SingletonHolder;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::debug;

static INSTANCE: SingletonHolder<AlgorithmManager> =
    SingletonHolder::new("AlgorithmManager", || Ok(AlgorithmManager::new(AlgorithmFactory::instance()?)));

struct Managed {
    identity: AlgorithmIdentity,
    cancel: WeakCancelFlag,
}

/// Creates initialized algorithms and keeps track of the live ones.
///
/// Every managed instance posts `Starting` on the manager's wildcard
/// channel before it runs, so one observer can follow all of them.
pub struct AlgorithmManager {
    factory: Arc<AlgorithmFactory>,
    starting: Arc<NotificationCenter>,
    managed: Mutex<Vec<Managed>>,
    record_history: AtomicBool,
}

impl AlgorithmManager {
    pub fn new(factory: Arc<AlgorithmFactory>) -> Self {
        Self {
            factory,
            starting: Arc::new(NotificationCenter::new()),
            managed: Mutex::new(Vec::new()),
            record_history: AtomicBool::new(true),
        }
    }

    /// The process-wide manager, backed by the process-wide factory.
    pub fn instance() -> FrameworkResult<Arc<AlgorithmManager>> {
        INSTANCE.instance()
    }

    pub fn factory(&self) -> &Arc<AlgorithmFactory> {
        &self.factory
    }

    /// Whether instances created from now on record history.
    pub fn set_record_history(&self, record: bool) {
        self.record_history.store(record, Ordering::Relaxed);
    }

    pub fn record_history(&self) -> bool {
        self.record_history.load(Ordering::Relaxed)
    }

    /// Create and initialize a managed algorithm.
    pub fn create(&self, name: &str, version: Option<u32>) -> FrameworkResult<AlgorithmInstance> {
        let mut alg = self.factory.create(name, version)?;
        alg.set_starting_channel(self.starting.clone());
        alg.set_record_history(self.record_history());
        alg.initialize()?;

        let mut managed = self.managed.lock();
        managed.retain(|m| m.cancel.is_alive());
        managed.push(Managed {
            identity: alg.identity(),
            cancel: alg.cancel_flag().downgrade(),
        });
        debug!(algorithm = alg.name(), id = alg.identity().id, "managed algorithm created");
        Ok(alg)
    }

    /// Create and initialize an algorithm the manager does not track.
    pub fn create_unmanaged(&self, name: &str, version: Option<u32>) -> FrameworkResult<AlgorithmInstance> {
        let mut alg = self.factory.create(name, version)?;
        alg.set_record_history(self.record_history());
        alg.initialize()?;
        Ok(alg)
    }

    /// Observe `Starting` for every managed algorithm.
    pub fn observe_starting(&self, observer: Arc<dyn AlgorithmObserver>) -> Subscription {
        Subscription::new(&self.starting, self.starting.add(observer, EventMask::STARTING))
    }

    /// Request cancellation of every live managed algorithm; returns how
    /// many were reached.
    pub fn cancel_all(&self) -> usize {
        let mut managed = self.managed.lock();
        managed.retain(|m| m.cancel.is_alive());
        let reached = managed.iter().filter(|m| m.cancel.cancel()).count();
        debug!(reached, "cancel requested for all managed algorithms");
        reached
    }

    /// Identities of managed instances that have not been dropped.
    pub fn live(&self) -> Vec<AlgorithmIdentity> {
        let mut managed = self.managed.lock();
        managed.retain(|m| m.cancel.is_alive());
        managed.iter().map(|m| m.identity).collect()
    }

    pub fn live_count(&self) -> usize {
        self.live().len()
    }
}
