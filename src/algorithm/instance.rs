//! The execution engine: lifecycle, validation, notifications, child
//! algorithms and history around an [`Algorithm`] hook implementation.

use super::cancel::CancelFlag;
use super::factory::AlgorithmFactory;
use super::history::HistoryRecord;
use super::notification::{
    AlgorithmEvent, AlgorithmIdentity, AlgorithmObserver, EventMask, Notification, NotificationCenter,
    Subscription,
};
use super::progress::Progress;
use super::traits::Algorithm;
use crate::error::{FrameworkError, FrameworkResult, PropertyIssue, ValidationFailures};
use crate::property::{FromPropertyValue, PropertyManager, PropertyValue};
use chrono::Utc;
use parking_lot::Mutex;
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Weak};
use std::time::{Duration, Instant};
use tracing::debug;

/// Where an instance is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionState {
    Constructed,
    Initialized,
    Executing,
    Succeeded,
    Failed,
}

type HistorySink = Arc<Mutex<Vec<HistoryRecord>>>;

/// An algorithm together with its properties and execution state.
///
/// `execute()` blocks the calling thread. Properties belong to the
/// instance owner; only progress reporting and notifications may be used
/// from several threads during a run.
pub struct AlgorithmInstance {
    algorithm: Box<dyn Algorithm>,
    identity: AlgorithmIdentity,
    properties: PropertyManager,
    state: ExecutionState,
    initialized: bool,
    executed: bool,
    is_child: bool,
    record_history: bool,
    notifications: Arc<NotificationCenter>,
    /// Wildcard channel of the owning manager, if any.
    starting: Option<Arc<NotificationCenter>>,
    cancel: CancelFlag,
    factory: Option<Arc<AlgorithmFactory>>,
    history: Vec<HistoryRecord>,
    /// Records of children finished during the current run.
    child_history: HistorySink,
    /// The parent's `child_history`, for child instances.
    parent_history: Option<HistorySink>,
}

impl AlgorithmInstance {
    pub fn new(algorithm: Box<dyn Algorithm>) -> Self {
        let identity = AlgorithmIdentity::new(algorithm.name(), algorithm.version());
        Self {
            algorithm,
            identity,
            properties: PropertyManager::new(),
            state: ExecutionState::Constructed,
            initialized: false,
            executed: false,
            is_child: false,
            record_history: true,
            notifications: Arc::new(NotificationCenter::new()),
            starting: None,
            cancel: CancelFlag::new(),
            factory: None,
            history: Vec::new(),
            child_history: Arc::new(Mutex::new(Vec::new())),
            parent_history: None,
        }
    }

    /// Wrap a concrete algorithm value.
    pub fn from_algorithm<A: Algorithm + 'static>(algorithm: A) -> Self {
        Self::new(Box::new(algorithm))
    }

    /// Use `factory` to resolve child algorithms instead of the
    /// process-wide one.
    pub fn with_factory(mut self, factory: Arc<AlgorithmFactory>) -> Self {
        self.factory = Some(factory);
        self
    }

    pub(crate) fn set_starting_channel(&mut self, channel: Arc<NotificationCenter>) {
        self.starting = Some(channel);
    }

    pub fn name(&self) -> &'static str {
        self.identity.name
    }

    pub fn version(&self) -> u32 {
        self.identity.version
    }

    pub fn category(&self) -> &'static str {
        self.algorithm.category()
    }

    pub fn summary(&self) -> &'static str {
        self.algorithm.summary()
    }

    pub fn identity(&self) -> AlgorithmIdentity {
        self.identity
    }

    pub fn state(&self) -> ExecutionState {
        self.state
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Whether the most recent `execute()` succeeded.
    pub fn is_executed(&self) -> bool {
        self.executed
    }

    pub fn is_child(&self) -> bool {
        self.is_child
    }

    /// Declare the properties. Only the first call reaches the hook.
    pub fn initialize(&mut self) -> FrameworkResult<()> {
        if self.initialized {
            return Ok(());
        }

        let mut properties = PropertyManager::new();
        self.algorithm
            .declare_properties(&mut properties)
            .map_err(|source| FrameworkError::Initialization {
                algorithm: self.name().to_string(),
                source: Box::new(source),
            })?;

        self.properties = properties;
        self.initialized = true;
        self.state = ExecutionState::Initialized;
        debug!(algorithm = self.name(), properties = self.properties.len(), "initialized");
        Ok(())
    }

    pub fn properties(&self) -> &PropertyManager {
        &self.properties
    }

    pub fn properties_mut(&mut self) -> &mut PropertyManager {
        &mut self.properties
    }

    pub fn set_property(&mut self, name: &str, value: impl Into<PropertyValue>) -> FrameworkResult<Option<String>> {
        self.properties.set_property(name, value)
    }

    pub fn set_property_value(&mut self, name: &str, text: &str) -> FrameworkResult<Option<String>> {
        self.properties.set_property_value(name, text)
    }

    pub fn get_property_value(&self, name: &str) -> FrameworkResult<String> {
        self.properties.get_property_value(name)
    }

    pub fn get_value<T: FromPropertyValue>(&self, name: &str) -> FrameworkResult<T> {
        self.properties.get_value(name)
    }

    /// Run the algorithm to completion on the calling thread.
    ///
    /// Input problems are reported together as one `Validation` error
    /// before anything is emitted. A failing hook emits `Error` and the
    /// failure is returned; a panicking hook emits `Error` and the panic
    /// continues.
    pub fn execute(&mut self) -> FrameworkResult<()> {
        if !self.initialized {
            return Err(FrameworkError::NotInitialized {
                algorithm: self.name().to_string(),
            });
        }

        let mut failures = self.properties.validate_properties();
        failures.0.extend(self.algorithm.validate_inputs(&self.properties));
        if !failures.is_empty() {
            debug!(algorithm = self.name(), invalid = failures.len(), "input validation failed");
            return Err(FrameworkError::Validation(failures));
        }

        if !self.is_child {
            self.cancel.reset();
        }
        self.child_history.lock().clear();
        self.executed = false;
        self.state = ExecutionState::Executing;

        if let Some(starting) = &self.starting {
            starting.post(&Notification::new(self.identity, AlgorithmEvent::Starting));
        }
        self.post(AlgorithmEvent::Started);
        debug!(algorithm = self.name(), id = self.identity.id, child = self.is_child, "executing");

        let started_at = Utc::now();
        let timer = Instant::now();
        let outcome = {
            let mut ctx = ExecutionContext {
                identity: self.identity,
                properties: &mut self.properties,
                link: ParentLink {
                    identity: self.identity,
                    notifications: &self.notifications,
                    cancel: &self.cancel,
                    factory: self.factory.as_ref(),
                    child_history: &self.child_history,
                    record_history: self.record_history,
                },
            };
            let algorithm = &mut self.algorithm;
            panic::catch_unwind(AssertUnwindSafe(|| algorithm.run(&mut ctx)))
        };
        let duration = timer.elapsed();

        match outcome {
            Ok(Ok(())) => {
                self.succeed(started_at, duration);
                Ok(())
            }
            Ok(Err(err)) => Err(self.fail(err)),
            Err(payload) => {
                self.state = ExecutionState::Failed;
                self.post(AlgorithmEvent::Error {
                    message: panic_message(payload.as_ref()),
                });
                panic::resume_unwind(payload)
            }
        }
    }

    /// Like [`execute`](Self::execute), but a panicking hook is returned
    /// as an `Execution` error instead of unwinding into the caller.
    pub fn execute_catching_panics(&mut self) -> FrameworkResult<()> {
        match panic::catch_unwind(AssertUnwindSafe(|| self.execute())) {
            Ok(result) => result,
            Err(payload) => Err(FrameworkError::Execution {
                algorithm: self.name().to_string(),
                version: self.version(),
                source: anyhow::anyhow!("panicked: {}", panic_message(payload.as_ref())),
            }),
        }
    }

    fn succeed(&mut self, started_at: chrono::DateTime<Utc>, duration: Duration) {
        self.executed = true;
        self.state = ExecutionState::Succeeded;

        if self.record_history {
            let record = HistoryRecord {
                name: self.name().to_string(),
                version: self.version(),
                execution_date: started_at,
                duration,
                success: true,
                properties: self.properties.history(),
                children: std::mem::take(&mut *self.child_history.lock()),
            };
            if let Some(parent) = &self.parent_history {
                parent.lock().push(record.clone());
            }
            self.history.push(record);
        }

        debug!(algorithm = self.name(), elapsed_ms = duration.as_millis() as u64, "finished");
        self.post(AlgorithmEvent::Finished);
    }

    fn fail(&mut self, err: anyhow::Error) -> FrameworkError {
        self.state = ExecutionState::Failed;
        self.post(AlgorithmEvent::Error {
            message: format!("{err:#}"),
        });

        let cancelled = err
            .chain()
            .any(|cause| matches!(cause.downcast_ref::<FrameworkError>(), Some(FrameworkError::Cancelled { .. })));
        if cancelled {
            debug!(algorithm = self.name(), "cancelled");
            FrameworkError::Cancelled {
                algorithm: self.name().to_string(),
            }
        } else {
            FrameworkError::Execution {
                algorithm: self.name().to_string(),
                version: self.version(),
                source: err,
            }
        }
    }

    fn post(&self, event: AlgorithmEvent) {
        self.notifications.post(&Notification::new(self.identity, event));
    }

    /// Register an observer for the selected events of this instance.
    pub fn add_observer(&self, observer: Arc<dyn AlgorithmObserver>, mask: EventMask) -> Subscription {
        Subscription::new(&self.notifications, self.notifications.add(observer, mask))
    }

    /// Register a closure for the selected events of this instance.
    pub fn observe<F>(&self, mask: EventMask, observer: F) -> Subscription
    where
        F: Fn(&Notification) + Send + Sync + 'static,
    {
        self.add_observer(Arc::new(observer), mask)
    }

    pub fn notification_center(&self) -> &Arc<NotificationCenter> {
        &self.notifications
    }

    /// Ask a running execution to stop at its next interruption point.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn cancel_flag(&self) -> &CancelFlag {
        &self.cancel
    }

    pub fn history(&self) -> &[HistoryRecord] {
        &self.history
    }

    pub fn record_history(&self) -> bool {
        self.record_history
    }

    pub fn set_record_history(&mut self, record: bool) {
        self.record_history = record;
    }

    /// Create an initialized child of this instance.
    ///
    /// Child progress in `[0, 1]` is re-emitted on this instance mapped
    /// onto `[progress_start, progress_end]`.
    pub fn create_child_algorithm(
        &self,
        name: &str,
        progress_start: f64,
        progress_end: f64,
    ) -> FrameworkResult<AlgorithmInstance> {
        self.link().spawn_child(name, None, progress_start, progress_end)
    }

    fn link(&self) -> ParentLink<'_> {
        ParentLink {
            identity: self.identity,
            notifications: &self.notifications,
            cancel: &self.cancel,
            factory: self.factory.as_ref(),
            child_history: &self.child_history,
            record_history: self.record_history,
        }
    }
}

impl std::fmt::Debug for AlgorithmInstance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AlgorithmInstance")
            .field("identity", &self.identity)
            .field("state", &self.state)
            .field("is_child", &self.is_child)
            .field("properties", &self.properties.as_string())
            .finish()
    }
}

/// What a parent hands down to the children it creates.
struct ParentLink<'a> {
    identity: AlgorithmIdentity,
    notifications: &'a Arc<NotificationCenter>,
    cancel: &'a CancelFlag,
    factory: Option<&'a Arc<AlgorithmFactory>>,
    child_history: &'a HistorySink,
    record_history: bool,
}

impl ParentLink<'_> {
    fn spawn_child(
        &self,
        name: &str,
        version: Option<u32>,
        progress_start: f64,
        progress_end: f64,
    ) -> FrameworkResult<AlgorithmInstance> {
        let factory = match self.factory {
            Some(factory) => factory.clone(),
            None => AlgorithmFactory::instance()?,
        };

        let mut child = AlgorithmInstance::new(factory.create_algorithm(name, version)?);
        child.factory = Some(factory);
        child.is_child = true;
        child.cancel = self.cancel.clone();
        child.record_history = self.record_history;
        child.parent_history = Some(self.child_history.clone());

        if progress_start >= 0.0 && progress_end > progress_start && progress_end <= 1.0 {
            let forwarder = ProgressForwarder {
                parent: Arc::downgrade(self.notifications),
                parent_identity: self.identity,
                start: progress_start,
                end: progress_end,
            };
            child.notifications.add(Arc::new(forwarder), EventMask::PROGRESS);
        }

        child.initialize()?;
        debug!(parent = self.identity.name, child = child.name(), "child algorithm created");
        Ok(child)
    }
}

/// Re-emits a child's progress on its parent, mapped onto a sub-range.
struct ProgressForwarder {
    parent: Weak<NotificationCenter>,
    parent_identity: AlgorithmIdentity,
    start: f64,
    end: f64,
}

impl AlgorithmObserver for ProgressForwarder {
    fn on_notification(&self, notification: &Notification) {
        let AlgorithmEvent::Progress { fraction, message } = &notification.event else {
            return;
        };
        if let Some(parent) = self.parent.upgrade() {
            parent.post(&Notification::new(
                self.parent_identity,
                AlgorithmEvent::Progress {
                    fraction: self.start + (self.end - self.start) * fraction,
                    message: message.clone(),
                },
            ));
        }
    }
}

/// What a running hook sees of its instance.
pub struct ExecutionContext<'a> {
    identity: AlgorithmIdentity,
    properties: &'a mut PropertyManager,
    link: ParentLink<'a>,
}

impl ExecutionContext<'_> {
    pub fn identity(&self) -> AlgorithmIdentity {
        self.identity
    }

    pub fn properties(&self) -> &PropertyManager {
        self.properties
    }

    pub fn properties_mut(&mut self) -> &mut PropertyManager {
        self.properties
    }

    pub fn get<T: FromPropertyValue>(&self, name: &str) -> FrameworkResult<T> {
        self.properties.get_value(name)
    }

    pub fn get_property_value(&self, name: &str) -> FrameworkResult<String> {
        self.properties.get_property_value(name)
    }

    /// Set a property, typically an output. A validator rejection is an
    /// error here.
    pub fn set(&mut self, name: &str, value: impl Into<PropertyValue>) -> FrameworkResult<()> {
        match self.properties.set_property(name, value)? {
            None => Ok(()),
            Some(reason) => Err(FrameworkError::Validation(ValidationFailures(vec![PropertyIssue::new(
                name, reason,
            )]))),
        }
    }

    /// A step-based reporter over `[start, end]` of this run.
    pub fn progress(&self, start: f64, end: f64, total_steps: usize) -> Progress {
        Progress::new(
            self.identity,
            self.link.notifications.clone(),
            self.link.cancel.clone(),
            start,
            end,
            total_steps,
        )
    }

    /// Emit a single progress notification.
    pub fn report_progress(&self, fraction: f64, message: &str) {
        self.link.notifications.post(&Notification::new(
            self.identity,
            AlgorithmEvent::Progress {
                fraction,
                message: message.to_string(),
            },
        ));
    }

    pub fn is_cancelled(&self) -> bool {
        self.link.cancel.is_cancelled()
    }

    /// Fails with `Cancelled` once cancellation has been requested.
    pub fn interruption_point(&self) -> FrameworkResult<()> {
        if self.is_cancelled() {
            Err(FrameworkError::Cancelled {
                algorithm: self.identity.name.to_string(),
            })
        } else {
            Ok(())
        }
    }

    /// Create an initialized child, latest version.
    pub fn create_child_algorithm(
        &self,
        name: &str,
        progress_start: f64,
        progress_end: f64,
    ) -> FrameworkResult<AlgorithmInstance> {
        self.link.spawn_child(name, None, progress_start, progress_end)
    }

    pub fn create_child_algorithm_version(
        &self,
        name: &str,
        version: u32,
        progress_start: f64,
        progress_end: f64,
    ) -> FrameworkResult<AlgorithmInstance> {
        self.link.spawn_child(name, Some(version), progress_start, progress_end)
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "algorithm panicked".to_string()
    }
}
