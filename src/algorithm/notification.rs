//! Lifecycle notifications and their observers.

use parking_lot::Mutex;
use std::ops::BitOr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use tracing::{debug, error, info};

static NEXT_ALGORITHM_ID: AtomicU64 = AtomicU64::new(1);

/// Identity of one algorithm instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AlgorithmIdentity {
    /// Process-unique instance id.
    pub id: u64,
    pub name: &'static str,
    pub version: u32,
}

impl AlgorithmIdentity {
    /// Allocate a fresh identity.
    pub fn new(name: &'static str, version: u32) -> Self {
        Self {
            id: NEXT_ALGORITHM_ID.fetch_add(1, Ordering::Relaxed),
            name,
            version,
        }
    }
}

/// What happened to an algorithm.
#[derive(Debug, Clone, PartialEq)]
pub enum AlgorithmEvent {
    /// Any managed algorithm is about to start (wildcard channel).
    Starting,
    Started,
    Progress { fraction: f64, message: String },
    Finished,
    Error { message: String },
}

impl AlgorithmEvent {
    pub fn mask(&self) -> EventMask {
        match self {
            AlgorithmEvent::Starting => EventMask::STARTING,
            AlgorithmEvent::Started => EventMask::STARTED,
            AlgorithmEvent::Progress { .. } => EventMask::PROGRESS,
            AlgorithmEvent::Finished => EventMask::FINISHED,
            AlgorithmEvent::Error { .. } => EventMask::ERROR,
        }
    }
}

/// Immutable event record.
#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    pub algorithm: AlgorithmIdentity,
    pub event: AlgorithmEvent,
}

impl Notification {
    pub fn new(algorithm: AlgorithmIdentity, event: AlgorithmEvent) -> Self {
        Self { algorithm, event }
    }
}

/// Set of event kinds an observer wants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EventMask(u8);

impl EventMask {
    pub const STARTING: EventMask = EventMask(1);
    pub const STARTED: EventMask = EventMask(1 << 1);
    pub const PROGRESS: EventMask = EventMask(1 << 2);
    pub const FINISHED: EventMask = EventMask(1 << 3);
    pub const ERROR: EventMask = EventMask(1 << 4);
    pub const ALL: EventMask = EventMask(0b1_1111);

    pub fn contains(self, other: EventMask) -> bool {
        self.0 & other.0 == other.0
    }
}

impl BitOr for EventMask {
    type Output = EventMask;

    fn bitor(self, rhs: EventMask) -> EventMask {
        EventMask(self.0 | rhs.0)
    }
}

/// Receives notifications. May be called from any thread.
pub trait AlgorithmObserver: Send + Sync {
    fn on_notification(&self, notification: &Notification);
}

impl<F> AlgorithmObserver for F
where
    F: Fn(&Notification) + Send + Sync,
{
    fn on_notification(&self, notification: &Notification) {
        self(notification)
    }
}

pub type ObserverId = u64;

struct Registration {
    id: ObserverId,
    mask: EventMask,
    observer: Arc<dyn AlgorithmObserver>,
}

/// Observer list for one algorithm instance (or the wildcard channel).
pub struct NotificationCenter {
    observers: Mutex<Vec<Registration>>,
    next_id: AtomicU64,
}

impl NotificationCenter {
    pub fn new() -> Self {
        Self {
            observers: Mutex::new(Vec::new()),
            next_id: AtomicU64::new(1),
        }
    }

    pub fn add(&self, observer: Arc<dyn AlgorithmObserver>, mask: EventMask) -> ObserverId {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.observers.lock().push(Registration { id, mask, observer });
        id
    }

    /// Remove an observer; `false` if it was not registered.
    pub fn remove(&self, id: ObserverId) -> bool {
        let mut observers = self.observers.lock();
        let before = observers.len();
        observers.retain(|r| r.id != id);
        observers.len() != before
    }

    pub fn observer_count(&self) -> usize {
        self.observers.lock().len()
    }

    /// Deliver to every interested observer.
    ///
    /// Observers run outside the list lock, so they may add or remove
    /// observers on this center.
    pub fn post(&self, notification: &Notification) {
        let mask = notification.event.mask();
        let targets: Vec<Arc<dyn AlgorithmObserver>> = self
            .observers
            .lock()
            .iter()
            .filter(|r| r.mask.contains(mask))
            .map(|r| r.observer.clone())
            .collect();

        for observer in targets {
            observer.on_notification(notification);
        }
    }
}

impl Default for NotificationCenter {
    fn default() -> Self {
        Self::new()
    }
}

/// Handle to an observer registration.
///
/// Unsubscribing is safe at any time, including after the algorithm has
/// finished or been dropped.
#[derive(Debug, Clone)]
pub struct Subscription {
    center: Weak<NotificationCenter>,
    id: ObserverId,
}

impl Subscription {
    pub fn new(center: &Arc<NotificationCenter>, id: ObserverId) -> Self {
        Self {
            center: Arc::downgrade(center),
            id,
        }
    }

    pub fn id(&self) -> ObserverId {
        self.id
    }

    /// Returns `true` if the observer was still registered.
    pub fn unsubscribe(self) -> bool {
        self.center.upgrade().map_or(false, |c| c.remove(self.id))
    }
}

/// Forwards notifications to `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingObserver;

impl AlgorithmObserver for LoggingObserver {
    fn on_notification(&self, n: &Notification) {
        let alg = n.algorithm;
        match &n.event {
            AlgorithmEvent::Starting => debug!(algorithm = alg.name, id = alg.id, "starting"),
            AlgorithmEvent::Started => info!(algorithm = alg.name, version = alg.version, "{} started", alg.name),
            AlgorithmEvent::Progress { fraction, message } => {
                debug!(algorithm = alg.name, fraction, message = %message, "progress")
            }
            AlgorithmEvent::Finished => info!(algorithm = alg.name, "{} successful", alg.name),
            AlgorithmEvent::Error { message } => error!(algorithm = alg.name, "{} failed: {}", alg.name, message),
        }
    }
}
