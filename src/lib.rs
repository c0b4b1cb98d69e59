//! A concurrent, label-partitioned gauge store.
//!
//! `gauge-registry` tracks instantaneous numeric values (gauges) identified by a metric name
//! plus an ordered set of label values. It is the storage core underneath an exporter or a
//! language-binding layer: callers declare gauges up front, mutate series with atomic set /
//! increment / decrement operations, and enumerate point-in-time samples for export.
//!
//! # Overview
//!
//! A **gauge** is a metric that can go up and down arbitrarily over time, representing an
//! instantaneous measurement: queue depth, connections checked out of a pool, temperature,
//! current memory usage. Unlike a counter, a gauge may go negative.
//!
//! Each gauge is declared once as a [`GaugeSpec`] (name, help text, ordered label names, and an
//! optional [`DurationUnit`]) and becomes an immutable [`GaugeDescriptor`]. A **series** is one
//! (descriptor, label values) pair; its storage cell is created lazily on first mutation and
//! read back exactly -- a series that has never been written reads as absent, never as an
//! implicit zero.
//!
//! ```
//! use gauge_registry::{GaugeSpec, GaugeStore};
//!
//! let store = GaugeStore::new();
//! store.register(GaugeSpec::new("queue_size", "items in queue"))?;
//!
//! store.set("queue_size", &[], 5)?;
//! store.increment("queue_size", &[], 3)?;
//! assert_eq!(store.read("queue_size", &[])?, Some(8.0));
//! # Ok::<(), gauge_registry::GaugeError>(())
//! ```
//!
//! # Performance
//!
//! The store is built for many concurrent writers with minimal contention:
//!
//! - Series keys are hashed once at resolution time and partitioned into a power-of-two number
//!   of shards; each shard lock is held only across a single map lookup, insert, or removal.
//! - Cells are `Arc`-shared atomics holding `f64` bits, so increments and decrements on an
//!   existing series are a lock-free compare-and-swap loop. Same-series adjustments are
//!   linearizable with respect to each other; operations on different series carry no mutual
//!   ordering guarantee.
//! - The descriptor registry is append-mostly and sits behind a separate read-optimized lock,
//!   so hot-path lookups never contend with value shards.
//!
//! # Collection
//!
//! [`GaugeStore::collect`] enumerates every live series as [`GaugeSample`]s, locking one shard
//! at a time. The result is per-shard consistent rather than one global snapshot, which is the
//! trade-off for not stalling writers during export. Scoped instrumentation
//! ([`GaugeStore::track_in_progress`], [`GaugeStore::observe_duration`]) never holds a store
//! lock while the wrapped work runs, and its bookkeeping is applied on every exit path,
//! including panics.
//!
//! # Validation
//!
//! Declarations and mutations are validated synchronously at the call boundary and surface a
//! [`GaugeError`] describing exactly what was malformed; a failed operation never creates a
//! cell. Non-finite values (NaN, ±∞) are rejected with [`GaugeError::InvalidValue`].

pub mod atomics;
mod common;
mod error;
mod key;
mod registry;
mod snapshot;
mod spec;
mod storage;
mod store;
mod unit;

pub use self::atomics::GaugeFn;
pub use self::common::{Hashable, IntoF64, KeyHasher, SharedString};
pub use self::error::GaugeError;
pub use self::key::SeriesKey;
pub use self::snapshot::GaugeSample;
pub use self::spec::{GaugeDescriptor, GaugeSpec};
pub use self::store::{GaugeOp, GaugeStore};
pub use self::unit::DurationUnit;
