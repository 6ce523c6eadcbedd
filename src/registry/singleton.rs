//! Lazily constructed process-wide singletons with explicit shutdown.

use crate::error::{FrameworkError, FrameworkResult};
use parking_lot::{const_rwlock, RwLock};
use std::sync::Arc;
use tracing::trace;

enum State<T> {
    Empty,
    Live(Arc<T>),
    ShutDown,
}

/// Holds the single instance of `T`, built on first access.
///
/// Racing first calls construct exactly once; every caller sees the same
/// fully built instance. After [`shutdown`](Self::shutdown) every
/// [`instance`](Self::instance) call fails.
///
/// The constructor must not call `instance()` on the same holder.
pub struct SingletonHolder<T> {
    name: &'static str,
    create: fn() -> FrameworkResult<T>,
    state: RwLock<State<T>>,
}

impl<T: Send + Sync + 'static> SingletonHolder<T> {
    pub const fn new(name: &'static str, create: fn() -> FrameworkResult<T>) -> Self {
        Self {
            name,
            create,
            state: const_rwlock(State::Empty),
        }
    }

    pub fn instance(&self) -> FrameworkResult<Arc<T>> {
        {
            let state = self.state.read();
            match &*state {
                State::Live(instance) => return Ok(instance.clone()),
                State::ShutDown => return Err(FrameworkError::ShutDown { service: self.name }),
                State::Empty => {}
            }
        }

        let mut state = self.state.write();
        match &*state {
            State::Live(instance) => Ok(instance.clone()),
            State::ShutDown => Err(FrameworkError::ShutDown { service: self.name }),
            State::Empty => {
                let instance = Arc::new((self.create)()?);
                *state = State::Live(instance.clone());
                trace!(service = self.name, "singleton created");
                Ok(instance)
            }
        }
    }

    pub fn is_initialized(&self) -> bool {
        matches!(&*self.state.read(), State::Live(_))
    }

    /// Drop the held instance and refuse further access.
    ///
    /// Returns `true` if an instance was live. Handles obtained earlier
    /// stay valid until their owners drop them.
    pub fn shutdown(&self) -> bool {
        let previous = std::mem::replace(&mut *self.state.write(), State::ShutDown);
        trace!(service = self.name, "singleton shut down");
        matches!(previous, State::Live(_))
    }
}
