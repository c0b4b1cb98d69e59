use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use rapidhash::fast::RapidHasher;

use crate::common::{Hashable, SharedString};
use crate::error::GaugeError;
use crate::spec::GaugeDescriptor;

/// The resolved identity of one series: interned metric name plus ordered label values.
///
/// A key's hash is computed once at construction and memoized, so shard selection and every map
/// lookup afterwards reuse it instead of rehashing the name and labels. Two keys are equal iff
/// their names are equal and their label values are equal element-wise; label order is
/// significant and never normalized.
#[derive(Clone, Debug)]
pub struct SeriesKey {
    name: Arc<str>,
    labels: Vec<SharedString>,
    hash: u64,
}

impl SeriesKey {
    /// Resolves a caller-supplied list of label values against a descriptor.
    ///
    /// Fails with [`GaugeError::InvalidMetricArity`] when the value count does not match the
    /// descriptor's declared label count. Nothing is interned or hashed on the failure path.
    pub fn resolve(descriptor: &GaugeDescriptor, label_values: &[&str]) -> Result<Self, GaugeError> {
        let expected = descriptor.label_names().len();
        if label_values.len() != expected {
            return Err(GaugeError::InvalidMetricArity {
                metric: descriptor.name().to_string(),
                expected,
                actual: label_values.len(),
            });
        }

        let labels = label_values
            .iter()
            .map(|v| SharedString::Owned((*v).to_string()))
            .collect::<Vec<_>>();
        Ok(Self::from_parts(descriptor.interned_name(), labels))
    }

    pub(crate) fn from_parts(name: Arc<str>, labels: Vec<SharedString>) -> Self {
        let mut hasher = RapidHasher::default();
        name.hash(&mut hasher);
        labels.hash(&mut hasher);
        let hash = hasher.finish();

        SeriesKey { name, labels, hash }
    }

    /// Name of the metric this series belongs to.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Ordered label values of this series.
    pub fn labels(&self) -> &[SharedString] {
        &self.labels
    }

    /// Consumes this key, returning the label values.
    pub(crate) fn into_labels(self) -> Vec<SharedString> {
        self.labels
    }
}

impl PartialEq for SeriesKey {
    fn eq(&self, other: &Self) -> bool {
        self.hash == other.hash && self.name == other.name && self.labels == other.labels
    }
}

impl Eq for SeriesKey {}

impl Hash for SeriesKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        // The memoized hash stands in for the full key; the shard maps rehash through
        // `KeyHasher`, which only accepts this `write_u64`.
        state.write_u64(self.hash);
    }
}

impl Hashable for SeriesKey {
    #[inline]
    fn hashable(&self) -> u64 {
        self.hash
    }
}

impl fmt::Display for SeriesKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.labels.is_empty() {
            write!(f, "SeriesKey({})", self.name)
        } else {
            write!(f, "SeriesKey({}, [{}])", self.name, self.labels.join(", "))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::SeriesKey;
    use crate::common::Hashable;
    use crate::error::GaugeError;
    use crate::spec::GaugeSpec;

    #[test]
    fn arity_is_enforced_exactly() {
        let desc = GaugeSpec::new("pool_checked_out", "connections checked out")
            .with_labels(["pool"])
            .into_descriptor()
            .unwrap();

        assert!(SeriesKey::resolve(&desc, &["db"]).is_ok());
        let err = SeriesKey::resolve(&desc, &[]).unwrap_err();
        assert_eq!(
            err,
            GaugeError::InvalidMetricArity {
                metric: "pool_checked_out".to_string(),
                expected: 1,
                actual: 0
            }
        );
        assert!(SeriesKey::resolve(&desc, &["db", "extra"]).is_err());
    }

    #[test]
    fn equality_is_elementwise_and_order_sensitive() {
        let desc = GaugeSpec::new("conns", "open connections")
            .with_labels(["src", "dst"])
            .into_descriptor()
            .unwrap();

        let a = SeriesKey::resolve(&desc, &["east", "west"]).unwrap();
        let b = SeriesKey::resolve(&desc, &["east", "west"]).unwrap();
        let c = SeriesKey::resolve(&desc, &["west", "east"]).unwrap();

        assert_eq!(a, b);
        assert_eq!(a.hashable(), b.hashable());
        assert_ne!(a, c);
    }

    #[test]
    fn keys_share_the_interned_name() {
        let desc = GaugeSpec::new("queue_size", "items in queue").into_descriptor().unwrap();
        let key = SeriesKey::resolve(&desc, &[]).unwrap();
        assert_eq!(key.name(), "queue_size");
        assert!(key.labels().is_empty());
    }
}
