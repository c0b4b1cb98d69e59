use std::sync::Arc;

use crate::common::SharedString;
use crate::spec::GaugeDescriptor;

/// A point-in-time value for one series, as enumerated by
/// [`GaugeStore::collect`][crate::GaugeStore::collect].
///
/// The descriptor is attached so an exporter can render help text, label names, and the
/// duration unit without a second registry lookup; `value` has already been scaled to the
/// descriptor's unit, if one is configured.
///
/// Collection is per-shard consistent, not globally linearizable: two samples in the same result
/// may straddle a concurrent mutation. Exporters that require exact cross-series consistency
/// must quiesce writers themselves.
#[derive(Clone, Debug)]
pub struct GaugeSample {
    /// The declaration of the gauge this series belongs to.
    pub descriptor: Arc<GaugeDescriptor>,
    /// Ordered label values identifying this series, matching the descriptor's label names.
    pub labels: Vec<SharedString>,
    /// The value at collection time, unit-scaled.
    pub value: f64,
}
