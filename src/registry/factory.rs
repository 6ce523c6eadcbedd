//! Generic name-keyed constructor registry.

use crate::error::{FrameworkError, FrameworkResult};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn};

/// What to do when a key is subscribed twice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DuplicatePolicy {
    /// Fail with `ExistingFactory`.
    #[default]
    Error,
    /// Replace the existing constructor.
    Overwrite,
    /// Keep the existing constructor.
    Ignore,
}

type Constructor<B> = Arc<dyn Fn() -> Box<B> + Send + Sync>;

struct Entries<B: ?Sized> {
    order: Vec<String>,
    constructors: HashMap<String, Constructor<B>>,
}

impl<B: ?Sized> Default for Entries<B> {
    fn default() -> Self {
        Self {
            order: Vec::new(),
            constructors: HashMap::new(),
        }
    }
}

/// Registry of zero-argument constructors producing `B`.
///
/// Safe to share between threads; subscription and creation may race.
pub struct DynamicFactory<B: ?Sized> {
    kind: &'static str,
    entries: RwLock<Entries<B>>,
    policy: RwLock<DuplicatePolicy>,
}

impl<B: ?Sized + 'static> DynamicFactory<B> {
    /// Create an empty factory. `kind` names the products in errors.
    pub fn new(kind: &'static str) -> Self {
        Self::with_policy(kind, DuplicatePolicy::default())
    }

    pub fn with_policy(kind: &'static str, policy: DuplicatePolicy) -> Self {
        Self {
            kind,
            entries: RwLock::new(Entries::default()),
            policy: RwLock::new(policy),
        }
    }

    pub fn duplicate_policy(&self) -> DuplicatePolicy {
        *self.policy.read()
    }

    pub fn set_duplicate_policy(&self, policy: DuplicatePolicy) {
        *self.policy.write() = policy;
    }

    /// Subscribe a constructor under `key` using the factory's policy.
    pub fn subscribe<F>(&self, key: impl Into<String>, constructor: F) -> FrameworkResult<()>
    where
        F: Fn() -> Box<B> + Send + Sync + 'static,
    {
        self.subscribe_with(key, constructor, self.duplicate_policy())
    }

    /// Subscribe a constructor under `key` with an explicit policy.
    pub fn subscribe_with<F>(
        &self,
        key: impl Into<String>,
        constructor: F,
        policy: DuplicatePolicy,
    ) -> FrameworkResult<()>
    where
        F: Fn() -> Box<B> + Send + Sync + 'static,
    {
        let key = key.into();
        let mut entries = self.entries.write();

        if entries.constructors.contains_key(&key) {
            match policy {
                DuplicatePolicy::Error => return Err(FrameworkError::ExistingFactory { key }),
                DuplicatePolicy::Ignore => {
                    debug!(kind = self.kind, key = %key, "ignoring duplicate subscription");
                    return Ok(());
                }
                DuplicatePolicy::Overwrite => {
                    warn!(kind = self.kind, key = %key, "overwriting existing subscription");
                }
            }
        } else {
            entries.order.push(key.clone());
        }

        debug!(kind = self.kind, key = %key, "subscribed");
        entries.constructors.insert(key, Arc::new(constructor));
        Ok(())
    }

    pub fn unsubscribe(&self, key: &str) -> FrameworkResult<()> {
        let mut entries = self.entries.write();
        if entries.constructors.remove(key).is_none() {
            return Err(FrameworkError::not_found(self.kind, key));
        }
        entries.order.retain(|k| k != key);
        debug!(kind = self.kind, key, "unsubscribed");
        Ok(())
    }

    /// Construct a new instance behind a shared handle.
    pub fn create(&self, key: &str) -> FrameworkResult<Arc<B>> {
        self.create_unwrapped(key).map(Arc::from)
    }

    /// Construct a new instance the caller owns outright.
    pub fn create_unwrapped(&self, key: &str) -> FrameworkResult<Box<B>> {
        // Release the lock before running the constructor, which may itself
        // consult this factory.
        let constructor = self
            .entries
            .read()
            .constructors
            .get(key)
            .cloned()
            .ok_or_else(|| FrameworkError::not_found(self.kind, key))?;
        Ok(constructor())
    }

    pub fn exists(&self, key: &str) -> bool {
        self.entries.read().constructors.contains_key(key)
    }

    /// Registered keys in subscription order.
    pub fn get_keys(&self) -> Vec<String> {
        self.entries.read().order.clone()
    }

    pub fn len(&self) -> usize {
        self.entries.read().order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<B: ?Sized + 'static> Default for DynamicFactory<B> {
    fn default() -> Self {
        Self::new("factory key")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    trait Shape: std::fmt::Debug + Send + Sync {
        fn kind(&self) -> &'static str;
    }

    #[derive(Debug)]
    struct Circle;
    #[derive(Debug)]
    struct Square;

    impl Shape for Circle {
        fn kind(&self) -> &'static str {
            "circle"
        }
    }

    impl Shape for Square {
        fn kind(&self) -> &'static str {
            "square"
        }
    }

    fn circle() -> Box<dyn Shape> {
        Box::new(Circle)
    }

    fn square() -> Box<dyn Shape> {
        Box::new(Square)
    }

    #[test]
    fn test_create_matches_subscribed_type() {
        let factory: DynamicFactory<dyn Shape> = DynamicFactory::new("shape");
        factory.subscribe("Foo", circle).unwrap();

        assert_eq!(factory.create("Foo").unwrap().kind(), "circle");
        assert_eq!(factory.create_unwrapped("Foo").unwrap().kind(), "circle");
    }

    #[test]
    fn test_duplicate_policies() {
        let factory: DynamicFactory<dyn Shape> = DynamicFactory::new("shape");
        factory.subscribe("Foo", circle).unwrap();

        let err = factory.subscribe("Foo", square).unwrap_err();
        assert!(matches!(err, FrameworkError::ExistingFactory { .. }));
        assert_eq!(factory.create("Foo").unwrap().kind(), "circle");

        factory
            .subscribe_with("Foo", square, DuplicatePolicy::Ignore)
            .unwrap();
        assert_eq!(factory.create("Foo").unwrap().kind(), "circle");

        factory
            .subscribe_with("Foo", square, DuplicatePolicy::Overwrite)
            .unwrap();
        assert_eq!(factory.create("Foo").unwrap().kind(), "square");
        assert_eq!(factory.get_keys(), vec!["Foo"]);
    }

    #[test]
    fn test_unknown_key_is_not_found() {
        let factory: DynamicFactory<dyn Shape> = DynamicFactory::new("shape");
        assert!(factory.create("Bar").unwrap_err().is_not_found());
        assert!(factory.unsubscribe("Bar").unwrap_err().is_not_found());
    }

    #[test]
    fn test_keys_in_subscription_order() {
        let factory: DynamicFactory<dyn Shape> = DynamicFactory::new("shape");
        factory.subscribe("Beta", square).unwrap();
        factory.subscribe("Alpha", circle).unwrap();
        assert_eq!(factory.get_keys(), vec!["Beta", "Alpha"]);

        factory.unsubscribe("Beta").unwrap();
        assert_eq!(factory.get_keys(), vec!["Alpha"]);
        assert!(!factory.exists("Beta"));
    }

    #[test]
    fn test_concurrent_subscription() {
        let factory: Arc<DynamicFactory<dyn Shape>> = Arc::new(DynamicFactory::new("shape"));

        let handles: Vec<_> = (0..8)
            .map(|t| {
                let factory = factory.clone();
                thread::spawn(move || {
                    for i in 0..50 {
                        factory.subscribe(format!("shape-{}-{}", t, i), circle).unwrap();
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }

        assert_eq!(factory.len(), 400);
        assert_eq!(factory.create("shape-7-49").unwrap().kind(), "circle");
    }
}
