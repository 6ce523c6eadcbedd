//! Algorithm execution engine.

pub mod cancel;
pub mod factory;
pub mod history;
pub mod instance;
pub mod manager;
pub mod notification;
pub mod progress;
pub mod traits;

pub use cancel::CancelFlag;
pub use factory::{algorithm_key, AlgorithmDescriptor, AlgorithmFactory};
pub use history::HistoryRecord;
pub use instance::{AlgorithmInstance, ExecutionContext, ExecutionState};
pub use manager::AlgorithmManager;
pub use notification::{
    AlgorithmEvent, AlgorithmIdentity, AlgorithmObserver, EventMask, LoggingObserver, Notification,
    NotificationCenter, ObserverId, Subscription,
};
pub use progress::Progress;
pub use traits::Algorithm;
