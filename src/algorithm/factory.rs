//! Registry of algorithm types keyed by name and version.

use super::instance::AlgorithmInstance;
use super::traits::Algorithm;
use crate::error::{FrameworkError, FrameworkResult};
use crate::registry::{DuplicatePolicy, DynamicFactory, SingletonHolder};
use parking_lot::RwLock;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;

static INSTANCE: SingletonHolder<AlgorithmFactory> =
    SingletonHolder::new("AlgorithmFactory", || Ok(AlgorithmFactory::new()));

/// Registry key for one algorithm version.
pub fn algorithm_key(name: &str, version: u32) -> String {
    format!("{name}|{version}")
}

/// What the registry knows about a subscribed algorithm.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AlgorithmDescriptor {
    pub name: String,
    pub version: u32,
    pub category: String,
    pub summary: String,
}

impl AlgorithmDescriptor {
    fn of(algorithm: &dyn Algorithm) -> Self {
        Self {
            name: algorithm.name().to_string(),
            version: algorithm.version(),
            category: algorithm.category().to_string(),
            summary: algorithm.summary().to_string(),
        }
    }

    pub fn key(&self) -> String {
        algorithm_key(&self.name, self.version)
    }
}

/// Creates algorithms by name, optionally pinned to a version.
pub struct AlgorithmFactory {
    inner: DynamicFactory<dyn Algorithm>,
    descriptors: RwLock<HashMap<String, AlgorithmDescriptor>>,
}

impl AlgorithmFactory {
    /// An empty registry, independent of the process-wide one.
    pub fn new() -> Self {
        Self {
            inner: DynamicFactory::new("algorithm"),
            descriptors: RwLock::new(HashMap::new()),
        }
    }

    /// The process-wide registry.
    pub fn instance() -> FrameworkResult<Arc<AlgorithmFactory>> {
        INSTANCE.instance()
    }

    /// Subscribe `A`, keyed by its own name and version.
    pub fn subscribe<A: Algorithm + Default + 'static>(&self) -> FrameworkResult<String> {
        self.subscribe_fn(|| Box::new(A::default()) as Box<dyn Algorithm>)
    }

    /// Subscribe `A` resolving a clash with `policy` instead of the
    /// registry's own policy.
    pub fn subscribe_with<A: Algorithm + Default + 'static>(&self, policy: DuplicatePolicy) -> FrameworkResult<String> {
        self.subscribe_fn_with(|| Box::new(A::default()) as Box<dyn Algorithm>, policy)
    }

    /// Subscribe a constructor. One instance is built to read its name,
    /// version, category and summary.
    pub fn subscribe_fn<F>(&self, constructor: F) -> FrameworkResult<String>
    where
        F: Fn() -> Box<dyn Algorithm> + Send + Sync + 'static,
    {
        self.subscribe_fn_with(constructor, self.inner.duplicate_policy())
    }

    pub fn subscribe_fn_with<F>(&self, constructor: F, policy: DuplicatePolicy) -> FrameworkResult<String>
    where
        F: Fn() -> Box<dyn Algorithm> + Send + Sync + 'static,
    {
        let descriptor = AlgorithmDescriptor::of(constructor().as_ref());
        let key = descriptor.key();

        let mut descriptors = self.descriptors.write();
        let existed = self.inner.exists(&key);
        self.inner.subscribe_with(key.clone(), constructor, policy)?;
        if !existed || policy == DuplicatePolicy::Overwrite {
            descriptors.insert(key.clone(), descriptor);
        }
        Ok(key)
    }

    pub fn unsubscribe(&self, name: &str, version: u32) -> FrameworkResult<()> {
        let key = algorithm_key(name, version);
        let mut descriptors = self.descriptors.write();
        self.inner.unsubscribe(&key)?;
        descriptors.remove(&key);
        Ok(())
    }

    /// Construct the bare hook implementation. `None` picks the highest
    /// registered version.
    pub fn create_algorithm(&self, name: &str, version: Option<u32>) -> FrameworkResult<Box<dyn Algorithm>> {
        let version = match version {
            Some(v) => v,
            None => self
                .highest_version(name)
                .ok_or_else(|| FrameworkError::not_found("algorithm", name))?,
        };
        self.inner.create_unwrapped(&algorithm_key(name, version))
    }

    /// Construct an uninitialized instance that resolves its children
    /// through this registry.
    pub fn create(self: &Arc<Self>, name: &str, version: Option<u32>) -> FrameworkResult<AlgorithmInstance> {
        let algorithm = self.create_algorithm(name, version)?;
        Ok(AlgorithmInstance::new(algorithm).with_factory(self.clone()))
    }

    /// Whether `name` is registered, at `version` if given.
    pub fn exists(&self, name: &str, version: Option<u32>) -> bool {
        match version {
            Some(v) => self.inner.exists(&algorithm_key(name, v)),
            None => self.highest_version(name).is_some(),
        }
    }

    pub fn highest_version(&self, name: &str) -> Option<u32> {
        self.versions(name).into_iter().max()
    }

    pub fn versions(&self, name: &str) -> Vec<u32> {
        let mut versions: Vec<u32> = self
            .descriptors
            .read()
            .values()
            .filter(|d| d.name == name)
            .map(|d| d.version)
            .collect();
        versions.sort_unstable();
        versions
    }

    /// Registered algorithms sorted by name, then version.
    pub fn descriptors(&self) -> Vec<AlgorithmDescriptor> {
        let mut all: Vec<AlgorithmDescriptor> = self.descriptors.read().values().cloned().collect();
        all.sort_by(|a, b| a.name.cmp(&b.name).then(a.version.cmp(&b.version)));
        all
    }

    /// Distinct algorithm names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.descriptors.read().values().map(|d| d.name.clone()).collect();
        names.sort();
        names.dedup();
        names
    }

    /// `Name|version` keys in subscription order.
    pub fn get_keys(&self) -> Vec<String> {
        self.inner.get_keys()
    }

    pub fn duplicate_policy(&self) -> DuplicatePolicy {
        self.inner.duplicate_policy()
    }

    pub fn set_duplicate_policy(&self, policy: DuplicatePolicy) {
        self.inner.set_duplicate_policy(policy);
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

impl Default for AlgorithmFactory {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algorithm::ExecutionContext;
    use crate::property::PropertyManager;

    struct Versioned(u32);

    impl Algorithm for Versioned {
        fn name(&self) -> &'static str {
            "Rebin"
        }

        fn version(&self) -> u32 {
            self.0
        }

        fn category(&self) -> &'static str {
            "Transforms"
        }

        fn declare_properties(&mut self, _: &mut PropertyManager) -> FrameworkResult<()> {
            Ok(())
        }

        fn run(&mut self, _: &mut ExecutionContext<'_>) -> anyhow::Result<()> {
            Ok(())
        }
    }

    fn factory() -> Arc<AlgorithmFactory> {
        let factory = Arc::new(AlgorithmFactory::new());
        factory.subscribe_fn(|| Box::new(Versioned(1))).unwrap();
        factory.subscribe_fn(|| Box::new(Versioned(3))).unwrap();
        factory.subscribe_fn(|| Box::new(Versioned(2))).unwrap();
        factory
    }

    #[test]
    fn test_latest_version_by_default() {
        let factory = factory();
        assert_eq!(factory.create_algorithm("Rebin", None).unwrap().version(), 3);
        assert_eq!(factory.create_algorithm("Rebin", Some(1)).unwrap().version(), 1);
        assert_eq!(factory.versions("Rebin"), vec![1, 2, 3]);
    }

    #[test]
    fn test_unknown_names_and_versions() {
        let factory = factory();
        assert!(factory.create_algorithm("Nope", None).err().unwrap().is_not_found());
        assert!(factory.create_algorithm("Rebin", Some(7)).err().unwrap().is_not_found());
        assert!(!factory.exists("Rebin", Some(7)));
        assert!(factory.exists("Rebin", None));
    }

    #[test]
    fn test_duplicate_version_respects_policy() {
        let factory = factory();
        let err = factory.subscribe_fn(|| Box::new(Versioned(2))).unwrap_err();
        assert!(matches!(err, FrameworkError::ExistingFactory { key } if key == "Rebin|2"));

        factory.set_duplicate_policy(DuplicatePolicy::Ignore);
        factory.subscribe_fn(|| Box::new(Versioned(2))).unwrap();
        assert_eq!(factory.len(), 3);
    }

    #[test]
    fn test_unsubscribe_drops_descriptor() {
        let factory = factory();
        factory.unsubscribe("Rebin", 3).unwrap();
        assert_eq!(factory.highest_version("Rebin"), Some(2));
        assert!(factory.unsubscribe("Rebin", 3).unwrap_err().is_not_found());

        let descriptors = factory.descriptors();
        assert_eq!(descriptors.len(), 2);
        assert_eq!(descriptors[0].category, "Transforms");
        assert_eq!(factory.names(), vec!["Rebin".to_string()]);
    }

    #[test]
    fn test_create_wires_instance() {
        let factory = factory();
        let mut alg = factory.create("Rebin", None).unwrap();
        assert!(!alg.is_initialized());
        alg.initialize().unwrap();
        alg.execute().unwrap();
        assert_eq!(alg.history()[0].version, 3);
    }
}
