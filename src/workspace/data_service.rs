//! Named store of data objects shared across algorithms.

use super::object::DataObject;
use crate::error::{FrameworkError, FrameworkResult};
use crate::property::ObjectHandle;
use crate::registry::SingletonHolder;
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;

static INSTANCE: SingletonHolder<AnalysisDataService> =
    SingletonHolder::new("AnalysisDataService", || Ok(AnalysisDataService::new()));

/// Thread-safe name to object map.
#[derive(Default)]
pub struct AnalysisDataService {
    objects: RwLock<BTreeMap<String, Arc<dyn DataObject>>>,
}

impl AnalysisDataService {
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide service.
    pub fn instance() -> FrameworkResult<Arc<AnalysisDataService>> {
        INSTANCE.instance()
    }

    /// Add a new object; fails if the name is taken.
    pub fn add(&self, name: &str, object: Arc<dyn DataObject>) -> FrameworkResult<ObjectHandle> {
        let name = checked_name(name)?;
        let mut objects = self.objects.write();
        if objects.contains_key(name) {
            return Err(FrameworkError::DuplicateName {
                name: name.to_string(),
            });
        }
        objects.insert(name.to_string(), object.clone());
        debug!(name, "data object added");
        Ok(ObjectHandle::new(name, object))
    }

    /// Add an object, replacing any held under the same name.
    pub fn add_or_replace(&self, name: &str, object: Arc<dyn DataObject>) -> FrameworkResult<ObjectHandle> {
        let name = checked_name(name)?;
        self.objects.write().insert(name.to_string(), object.clone());
        debug!(name, "data object stored");
        Ok(ObjectHandle::new(name, object))
    }

    pub fn retrieve(&self, name: &str) -> FrameworkResult<ObjectHandle> {
        self.objects
            .read()
            .get(name)
            .map(|object| ObjectHandle::new(name, object.clone()))
            .ok_or_else(|| FrameworkError::not_found("data object", name))
    }

    pub fn remove(&self, name: &str) -> FrameworkResult<Arc<dyn DataObject>> {
        self.objects
            .write()
            .remove(name)
            .ok_or_else(|| FrameworkError::not_found("data object", name))
    }

    pub fn does_exist(&self, name: &str) -> bool {
        self.objects.read().contains_key(name)
    }

    /// Stored names, sorted.
    pub fn names(&self) -> Vec<String> {
        self.objects.read().keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.objects.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.objects.write().clear();
    }
}

fn checked_name(name: &str) -> FrameworkResult<&str> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(FrameworkError::Parse {
            property: String::new(),
            text: name.to_string(),
            reason: "data object names may not be empty".to_string(),
        });
    }
    Ok(trimmed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workspace::Workspace2D;

    #[test]
    fn test_add_retrieve_remove() {
        let ads = AnalysisDataService::new();
        let ws: Arc<dyn DataObject> = Arc::new(Workspace2D::new(1, 3));

        ads.add("ws", ws.clone()).unwrap();
        assert!(matches!(
            ads.add("ws", ws.clone()),
            Err(FrameworkError::DuplicateName { .. })
        ));

        let handle = ads.retrieve("ws").unwrap();
        assert_eq!(handle.name(), "ws");
        assert!(handle.downcast_ref::<Workspace2D>().is_some());

        ads.remove("ws").unwrap();
        assert!(ads.retrieve("ws").unwrap_err().is_not_found());
    }

    #[test]
    fn test_replace_and_names() {
        let ads = AnalysisDataService::new();
        ads.add_or_replace("b", Arc::new(Workspace2D::new(1, 1))).unwrap();
        ads.add_or_replace("a", Arc::new(Workspace2D::new(2, 1))).unwrap();
        ads.add_or_replace("b", Arc::new(Workspace2D::new(3, 1))).unwrap();

        assert_eq!(ads.names(), vec!["a", "b"]);
        let b = ads.retrieve("b").unwrap();
        assert_eq!(b.downcast_ref::<Workspace2D>().unwrap().y().nrows(), 3);

        assert!(ads.add("  ", Arc::new(Workspace2D::new(1, 1))).is_err());
        ads.clear();
        assert!(ads.is_empty());
    }
}
