use std::sync::Arc;
use std::time::SystemTime;

use quanta::Clock;
use tracing::debug;

use crate::atomics::{AtomicU64, GaugeFn};
use crate::common::IntoF64;
use crate::error::GaugeError;
use crate::key::SeriesKey;
use crate::registry::DescriptorRegistry;
use crate::snapshot::GaugeSample;
use crate::spec::{GaugeDescriptor, GaugeSpec};
use crate::storage::ValueStore;

/// A single mutation to apply to one series.
///
/// All of the store's write entry points funnel through [`GaugeStore::apply`] with one of these;
/// the named convenience methods are thin wrappers. Validation happens before the operation
/// touches storage, so a rejected operation never creates a cell.
#[derive(Clone, Debug)]
pub enum GaugeOp {
    /// Sets the series to this value.
    Set(f64),
    /// Increments the series by this much.
    Increment(f64),
    /// Decrements the series by this much.
    Decrement(f64),
    /// Sets the series to the current wall-clock time, as seconds since the Unix epoch.
    SetToCurrentTime,
    /// Sets the series back to zero.
    Reset,
}

impl GaugeOp {
    /// The numeric payload of this operation, if it carries one.
    fn value(&self) -> Option<f64> {
        match self {
            GaugeOp::Set(v) | GaugeOp::Increment(v) | GaugeOp::Decrement(v) => Some(*v),
            GaugeOp::SetToCurrentTime | GaugeOp::Reset => None,
        }
    }
}

/// A concurrent, label-partitioned gauge store.
///
/// `GaugeStore` ties the three layers together: the descriptor registry (what gauges exist), the
/// label key resolver (which series a caller is addressing), and the sharded value store (the
/// cells themselves). Every public operation validates in that order and short-circuits on the
/// first failure, so arity or value errors never touch storage.
///
/// The store is a long-lived, process-wide object: create one at startup and hand out `&GaugeStore`
/// (or wrap it in an `Arc`) to anything that mutates or exports metrics. All methods take
/// `&self` and are safe to call from any number of threads.
pub struct GaugeStore {
    registry: DescriptorRegistry,
    values: ValueStore,
    clock: Clock,
}

impl GaugeStore {
    /// Creates an empty store, sharded by available CPUs.
    pub fn new() -> Self {
        Self { registry: DescriptorRegistry::new(), values: ValueStore::new(), clock: Clock::new() }
    }

    #[cfg(test)]
    pub(crate) fn with_clock(clock: Clock) -> Self {
        Self { registry: DescriptorRegistry::new(), values: ValueStore::new(), clock }
    }

    /// Declares a gauge, treating a name collision as a no-op.
    ///
    /// Returns the descriptor handle plus `true` if this call created it. Declaring the same
    /// name twice is idempotent: the second call returns the existing handle and `false`.
    pub fn declare(&self, spec: GaugeSpec) -> Result<(Arc<GaugeDescriptor>, bool), GaugeError> {
        self.registry.declare(spec)
    }

    /// Registers a gauge, failing with [`GaugeError::MetricAlreadyExists`] on a name collision.
    pub fn register(&self, spec: GaugeSpec) -> Result<Arc<GaugeDescriptor>, GaugeError> {
        self.registry.register(spec)
    }

    /// Looks up the descriptor for a gauge by name.
    pub fn lookup(&self, name: &str) -> Option<Arc<GaugeDescriptor>> {
        self.registry.lookup(name)
    }

    /// Removes a gauge and all of its live series.
    ///
    /// Returns `true` if the descriptor existed. Cell removal cascades shard by shard, so a
    /// concurrent collector may still observe some of the removed series mid-pass.
    pub fn deregister(&self, name: &str) -> bool {
        match self.registry.remove(name) {
            Some(descriptor) => {
                self.values.retain(|key| key.name() != descriptor.name());
                true
            }
            None => false,
        }
    }

    /// Applies a single operation to the series addressed by `name` and `label_values`.
    ///
    /// This is the single entry point used by all binding-layer calls; validation runs in a
    /// fixed order (descriptor, arity, payload) and the first failure short-circuits without
    /// creating a cell.
    pub fn apply(&self, name: &str, label_values: &[&str], op: GaugeOp) -> Result<(), GaugeError> {
        let (_, key) = self.resolve(name, label_values)?;
        if let Some(value) = op.value() {
            if !value.is_finite() {
                return Err(GaugeError::InvalidValue(value));
            }
        }

        self.values.get_or_create(&key, |cell| match op {
            GaugeOp::Set(v) => cell.set(v),
            GaugeOp::Increment(v) => cell.increment(v),
            GaugeOp::Decrement(v) => cell.decrement(v),
            GaugeOp::SetToCurrentTime => cell.set(unix_now_seconds()),
            GaugeOp::Reset => cell.set(0.0),
        });

        Ok(())
    }

    /// Sets the series to `value`, creating it if absent.
    ///
    /// Duration-valued gauges take the value in base seconds; unit scaling happens on read.
    pub fn set<V: IntoF64>(
        &self,
        name: &str,
        label_values: &[&str],
        value: V,
    ) -> Result<(), GaugeError> {
        self.apply(name, label_values, GaugeOp::Set(value.into_f64()))
    }

    /// Increments the series by `delta`, creating it at zero first if absent.
    ///
    /// Integer and floating deltas both funnel through the same atomic float add.
    pub fn increment<V: IntoF64>(
        &self,
        name: &str,
        label_values: &[&str],
        delta: V,
    ) -> Result<(), GaugeError> {
        self.apply(name, label_values, GaugeOp::Increment(delta.into_f64()))
    }

    /// Decrements the series by `delta`, creating it at zero first if absent.
    ///
    /// Gauges may go negative; nothing clamps at zero.
    pub fn decrement<V: IntoF64>(
        &self,
        name: &str,
        label_values: &[&str],
        delta: V,
    ) -> Result<(), GaugeError> {
        self.apply(name, label_values, GaugeOp::Decrement(delta.into_f64()))
    }

    /// Sets the series to the current wall-clock time, as seconds since the Unix epoch.
    pub fn set_to_current_time(&self, name: &str, label_values: &[&str]) -> Result<(), GaugeError> {
        self.apply(name, label_values, GaugeOp::SetToCurrentTime)
    }

    /// Sets the series back to zero, creating it if absent.
    pub fn reset(&self, name: &str, label_values: &[&str]) -> Result<(), GaugeError> {
        self.apply(name, label_values, GaugeOp::Reset)
    }

    /// Removes one series.
    ///
    /// Returns `Ok(true)` if the cell existed; subsequent reads of the key report absent until
    /// it is recreated by a mutation.
    pub fn remove(&self, name: &str, label_values: &[&str]) -> Result<bool, GaugeError> {
        let (_, key) = self.resolve(name, label_values)?;
        Ok(self.values.delete(&key))
    }

    /// Reads the current value of one series.
    ///
    /// Returns `Ok(None)` for a series that has never been written (or was removed), never an
    /// implicit zero. If the descriptor carries a duration unit, the stored base-seconds value
    /// is scaled to that unit before being handed back.
    pub fn read(&self, name: &str, label_values: &[&str]) -> Result<Option<f64>, GaugeError> {
        let (descriptor, key) = self.resolve(name, label_values)?;
        Ok(self.values.get(&key).map(|cell| descriptor.scale(cell.read())))
    }

    /// Runs `work` with the series incremented for the duration.
    ///
    /// The series is incremented by one before `work` starts and decremented on every exit path,
    /// including an unwinding panic, restoring the prior value. No store lock is held while
    /// `work` executes. `work`'s return value is passed through unchanged.
    pub fn track_in_progress<F, T>(
        &self,
        name: &str,
        label_values: &[&str],
        work: F,
    ) -> Result<T, GaugeError>
    where
        F: FnOnce() -> T,
    {
        let (_, key) = self.resolve(name, label_values)?;
        let cell = self.values.get_or_create(&key, Arc::clone);

        cell.increment(1.0);
        let _guard = InProgressGuard { cell };

        Ok(work())
    }

    /// Runs `work` and sets the series to its wall-clock duration.
    ///
    /// The elapsed time is measured with a monotonic clock and recorded on every exit path,
    /// including an unwinding panic. The value is stored in base seconds; if the descriptor
    /// carries a duration unit, scaling is applied when the series is read or collected. No
    /// store lock is held while `work` executes.
    pub fn observe_duration<F, T>(
        &self,
        name: &str,
        label_values: &[&str],
        work: F,
    ) -> Result<T, GaugeError>
    where
        F: FnOnce() -> T,
    {
        let (_, key) = self.resolve(name, label_values)?;
        let cell = self.values.get_or_create(&key, Arc::clone);

        let _guard = ObserveDurationGuard { cell, clock: &self.clock, start: self.clock.now() };

        Ok(work())
    }

    /// Enumerates every live series as a point-in-time sample set.
    ///
    /// Shards are locked one at a time while being copied, so the result is a set of per-shard
    /// consistent snapshots rather than one globally linearizable snapshot; exporters that need
    /// exact cross-series consistency must quiesce writers themselves. Samples are sorted by
    /// metric name and label values, so repeated collection of a quiet store is deterministic.
    /// Each call re-enumerates current state from scratch.
    pub fn collect(&self) -> Vec<GaugeSample> {
        let descriptors = self.registry.all();

        let mut samples = Vec::new();
        self.values.visit(|key, cell| {
            // A series whose descriptor was deregistered mid-pass is skipped; its cells are
            // being removed by the cascade.
            if let Some(descriptor) = descriptors.get(key.name()) {
                samples.push(GaugeSample {
                    descriptor: Arc::clone(descriptor),
                    labels: key.clone().into_labels(),
                    value: descriptor.scale(cell.read()),
                });
            }
        });

        samples.sort_by(|a, b| {
            a.descriptor
                .name()
                .cmp(b.descriptor.name())
                .then_with(|| a.labels.cmp(&b.labels))
        });
        samples
    }

    /// Removes every live series, leaving descriptors registered.
    ///
    /// Eventually consistent: cells are dropped shard by shard.
    pub fn clear(&self) {
        debug!("clearing all gauge series");
        self.values.clear();
    }

    /// Number of live series. Advisory under concurrent mutation.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the store currently holds no live series.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Resolves a name and label values to the descriptor and series key.
    fn resolve(
        &self,
        name: &str,
        label_values: &[&str],
    ) -> Result<(Arc<GaugeDescriptor>, SeriesKey), GaugeError> {
        let descriptor =
            self.registry.lookup(name).ok_or_else(|| GaugeError::UnknownMetric(name.to_string()))?;
        let key = SeriesKey::resolve(&descriptor, label_values)?;
        Ok((descriptor, key))
    }
}

impl Default for GaugeStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Decrements the tracked series on drop, which runs on every exit path of the wrapped work.
struct InProgressGuard {
    cell: Arc<AtomicU64>,
}

impl Drop for InProgressGuard {
    fn drop(&mut self) {
        self.cell.decrement(1.0);
    }
}

/// Records elapsed time into the series on drop, which runs on every exit path of the wrapped
/// work.
struct ObserveDurationGuard<'a> {
    cell: Arc<AtomicU64>,
    clock: &'a Clock,
    start: quanta::Instant,
}

impl Drop for ObserveDurationGuard<'_> {
    fn drop(&mut self) {
        let elapsed = self.clock.now() - self.start;
        self.cell.set(elapsed.as_secs_f64());
    }
}

fn unix_now_seconds() -> f64 {
    SystemTime::UNIX_EPOCH.elapsed().map(|elapsed| elapsed.as_secs_f64()).unwrap_or_default()
}
