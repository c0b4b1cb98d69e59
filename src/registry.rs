use std::sync::Arc;

use hashbrown::HashMap;
use parking_lot::RwLock;
use tracing::debug;

use crate::error::GaugeError;
use crate::spec::{GaugeDescriptor, GaugeSpec};

/// The descriptor registry: name → immutable gauge declaration.
///
/// Descriptors are append-mostly and read far more often than written, so the whole map sits
/// behind one read-optimized lock, distinct from the per-shard locking used for values. Lookups
/// on the mutation hot path take the read side only.
pub(crate) struct DescriptorRegistry {
    descriptors: RwLock<HashMap<Arc<str>, Arc<GaugeDescriptor>>>,
}

impl DescriptorRegistry {
    pub(crate) fn new() -> Self {
        Self { descriptors: RwLock::new(HashMap::new()) }
    }

    /// Declares a gauge, treating a name collision as a no-op.
    ///
    /// Returns the descriptor handle plus `true` if this call created it, `false` if a
    /// descriptor with that name already existed (in which case the existing handle is returned
    /// and the incoming spec is discarded). The spec is validated either way.
    pub(crate) fn declare(
        &self,
        spec: GaugeSpec,
    ) -> Result<(Arc<GaugeDescriptor>, bool), GaugeError> {
        let descriptor = spec.into_descriptor()?;

        let mut descriptors = self.descriptors.write();
        if let Some(existing) = descriptors.get(descriptor.name()) {
            return Ok((Arc::clone(existing), false));
        }

        let descriptor = Arc::new(descriptor);
        descriptors.insert(descriptor.interned_name(), Arc::clone(&descriptor));
        debug!(metric = descriptor.name(), "declared gauge");

        Ok((descriptor, true))
    }

    /// Registers a gauge, failing on a name collision.
    pub(crate) fn register(&self, spec: GaugeSpec) -> Result<Arc<GaugeDescriptor>, GaugeError> {
        let descriptor = spec.into_descriptor()?;

        let mut descriptors = self.descriptors.write();
        if descriptors.contains_key(descriptor.name()) {
            return Err(GaugeError::MetricAlreadyExists(descriptor.name().to_string()));
        }

        let descriptor = Arc::new(descriptor);
        descriptors.insert(descriptor.interned_name(), Arc::clone(&descriptor));
        debug!(metric = descriptor.name(), "registered gauge");

        Ok(descriptor)
    }

    /// Looks up a descriptor by name.
    pub(crate) fn lookup(&self, name: &str) -> Option<Arc<GaugeDescriptor>> {
        self.descriptors.read().get(name).cloned()
    }

    /// Removes a descriptor by name, returning it so the caller can cascade cell removal.
    pub(crate) fn remove(&self, name: &str) -> Option<Arc<GaugeDescriptor>> {
        let removed = self.descriptors.write().remove(name);
        if removed.is_some() {
            debug!(metric = name, "deregistered gauge");
        }
        removed
    }

    /// A point-in-time copy of every registered descriptor.
    pub(crate) fn all(&self) -> HashMap<Arc<str>, Arc<GaugeDescriptor>> {
        self.descriptors.read().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::DescriptorRegistry;
    use crate::error::GaugeError;
    use crate::spec::GaugeSpec;
    use std::sync::Arc;

    fn spec() -> GaugeSpec {
        GaugeSpec::new("queue_size", "items in queue")
    }

    #[test]
    fn declare_is_idempotent() {
        let registry = DescriptorRegistry::new();

        let (first, created) = registry.declare(spec()).unwrap();
        assert!(created);

        let (second, created) = registry.declare(spec()).unwrap();
        assert!(!created);
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn register_errors_on_collision() {
        let registry = DescriptorRegistry::new();

        registry.register(spec()).unwrap();
        let err = registry.register(spec()).unwrap_err();
        assert_eq!(err, GaugeError::MetricAlreadyExists("queue_size".to_string()));
    }

    #[test]
    fn declare_still_validates_when_the_metric_exists() {
        let registry = DescriptorRegistry::new();
        registry.declare(spec()).unwrap();

        let err = registry.declare(GaugeSpec::new("queue_size", " ")).unwrap_err();
        assert_eq!(err, GaugeError::InvalidMetricHelp("queue_size".to_string()));
    }

    #[test]
    fn lookup_and_remove() {
        let registry = DescriptorRegistry::new();
        assert!(registry.lookup("queue_size").is_none());

        registry.declare(spec()).unwrap();
        assert!(registry.lookup("queue_size").is_some());

        assert!(registry.remove("queue_size").is_some());
        assert!(registry.lookup("queue_size").is_none());
        assert!(registry.remove("queue_size").is_none());
    }
}
