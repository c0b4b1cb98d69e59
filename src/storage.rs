//! Sharded storage for live gauge cells.

use std::hash::BuildHasherDefault;
use std::iter::repeat_with;
use std::sync::{Arc, PoisonError, RwLock};

use hashbrown::{HashMap, hash_map::RawEntryMut};

use crate::atomics::AtomicU64;
use crate::common::{Hashable, KeyHasher};
use crate::key::SeriesKey;

type ShardMap = HashMap<SeriesKey, Arc<AtomicU64>, BuildHasherDefault<KeyHasher>>;

/// The concurrent map from series key to gauge cell.
///
/// Keys are partitioned by their memoized hash into a power-of-two number of shards, each
/// guarding its own map with a lock that is held only for the duration of a single lookup,
/// insert, or removal, and never across caller-supplied work. Cells themselves are `Arc`-shared
/// atomics, so adjustments to an existing cell never take a shard lock at all once the handle
/// has been cloned out.
pub(crate) struct ValueStore {
    shards: Vec<RwLock<ShardMap>>,
    shard_mask: usize,
}

impl ValueStore {
    /// Creates a store with one shard per CPU, rounded up to a power of two.
    pub(crate) fn new() -> Self {
        let shard_count = std::cmp::max(1, num_cpus::get()).next_power_of_two();
        let shard_mask = shard_count - 1;
        let shards =
            repeat_with(|| RwLock::new(ShardMap::default())).take(shard_count).collect();

        Self { shards, shard_mask }
    }

    #[inline]
    fn get_hash_and_shard(&self, key: &SeriesKey) -> (u64, &RwLock<ShardMap>) {
        let hash = key.hashable();

        // SAFETY: We initialize the vector of shards with a power-of-two value, and
        // `self.shard_mask` is `self.shards.len() - 1`, thus we can never have a result from the
        // masking operation that results in a value which is not in bounds of our shards vector.
        let shard = unsafe { self.shards.get_unchecked(hash as usize & self.shard_mask) };

        (hash, shard)
    }

    /// Gets or creates the cell for the given key.
    ///
    /// The `op` function will be called for the cell under the given `key`, with the cell first
    /// being created (initialized to zero) if it does not already exist. `op` runs while the
    /// shard lock is held, so it must stay confined to a single atomic operation or an `Arc`
    /// clone; callers that need the cell for longer clone the handle out.
    pub(crate) fn get_or_create<O, V>(&self, key: &SeriesKey, op: O) -> V
    where
        O: FnOnce(&Arc<AtomicU64>) -> V,
    {
        let (hash, shard) = self.get_hash_and_shard(key);

        // Try and get the cell if it exists, running our operation if we succeed.
        let shard_read = shard.read().unwrap_or_else(PoisonError::into_inner);
        if let Some((_, v)) = shard_read.raw_entry().from_key_hashed_nocheck(hash, key) {
            op(v)
        } else {
            // Switch to write guard and insert the cell first.
            drop(shard_read);
            let mut shard_write = shard.write().unwrap_or_else(PoisonError::into_inner);
            let v = if let Some((_, v)) = shard_write.raw_entry().from_key_hashed_nocheck(hash, key)
            {
                v
            } else {
                let (_, v) = shard_write
                    .raw_entry_mut()
                    .from_key_hashed_nocheck(hash, key)
                    .or_insert_with(|| (key.clone(), Arc::new(AtomicU64::new(0))));

                v
            };

            op(v)
        }
    }

    /// Gets a handle to an existing cell.
    pub(crate) fn get(&self, key: &SeriesKey) -> Option<Arc<AtomicU64>> {
        let (hash, shard) = self.get_hash_and_shard(key);
        let shard_read = shard.read().unwrap_or_else(PoisonError::into_inner);
        shard_read.raw_entry().from_key_hashed_nocheck(hash, key).map(|(_, v)| Arc::clone(v))
    }

    /// Deletes a cell.
    ///
    /// Returns `true` if the cell existed and was removed, `false` otherwise.
    pub(crate) fn delete(&self, key: &SeriesKey) -> bool {
        let (hash, shard) = self.get_hash_and_shard(key);
        let mut shard_write = shard.write().unwrap_or_else(PoisonError::into_inner);
        let entry = shard_write.raw_entry_mut().from_key_hashed_nocheck(hash, key);
        if let RawEntryMut::Occupied(entry) = entry {
            let _ = entry.remove_entry();
            return true;
        }

        false
    }

    /// Visits every live cell.
    ///
    /// This operation does not lock the entire store, but proceeds shard by shard. As a result, a
    /// cell that existed at the exact moment `visit` was called may not be observed if it is
    /// deleted before its shard is reached, and a cell added mid-pass may or may not be observed.
    /// Each shard is internally consistent; the pass as a whole is not one linearizable snapshot.
    pub(crate) fn visit<F>(&self, mut collect: F)
    where
        F: FnMut(&SeriesKey, &Arc<AtomicU64>),
    {
        for shard in self.shards.iter() {
            let shard_read = shard.read().unwrap_or_else(PoisonError::into_inner);
            for (key, cell) in shard_read.iter() {
                collect(key, cell);
            }
        }
    }

    /// Retains only cells specified by the predicate.
    ///
    /// Removes all cells for which `f(&k)` returns false, proceeding through the shards the same
    /// way as `visit`.
    pub(crate) fn retain<F>(&self, mut f: F)
    where
        F: FnMut(&SeriesKey) -> bool,
    {
        for shard in self.shards.iter() {
            let mut shard_write = shard.write().unwrap_or_else(PoisonError::into_inner);
            shard_write.retain(|k, _| f(k));
        }
    }

    /// Removes all cells.
    ///
    /// This operation is eventually consistent: cells are removed shard by shard, and this method
    /// does not ensure that callers will see the store as entirely empty at any given point.
    pub(crate) fn clear(&self) {
        for shard in &self.shards {
            shard.write().unwrap_or_else(PoisonError::into_inner).clear();
        }
    }

    /// Number of live cells. Advisory under concurrent mutation.
    pub(crate) fn len(&self) -> usize {
        self.shards
            .iter()
            .map(|shard| shard.read().unwrap_or_else(PoisonError::into_inner).len())
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::ValueStore;
    use crate::atomics::GaugeFn;
    use crate::key::SeriesKey;
    use crate::spec::{GaugeDescriptor, GaugeSpec};
    use std::sync::Arc;

    fn descriptor() -> GaugeDescriptor {
        GaugeSpec::new("pool_checked_out", "connections checked out")
            .with_labels(["pool"])
            .into_descriptor()
            .unwrap()
    }

    #[test]
    fn cells_are_created_lazily_and_shared() {
        let store = ValueStore::new();
        let desc = descriptor();
        let key = SeriesKey::resolve(&desc, &["db"]).unwrap();

        assert!(store.get(&key).is_none());
        assert_eq!(store.len(), 0);

        store.get_or_create(&key, |cell| cell.increment(1.0));
        assert_eq!(store.len(), 1);

        let first = store.get(&key).expect("cell should exist");
        let second = store.get_or_create(&key, Arc::clone);
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(first.read(), 1.0);
    }

    #[test]
    fn distinct_label_values_are_distinct_cells() {
        let store = ValueStore::new();
        let desc = descriptor();
        let db = SeriesKey::resolve(&desc, &["db"]).unwrap();
        let cache = SeriesKey::resolve(&desc, &["cache"]).unwrap();

        store.get_or_create(&db, |cell| cell.set(5.0));
        assert!(store.get(&cache).is_none());
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn delete_and_clear() {
        let store = ValueStore::new();
        let desc = descriptor();
        let key = SeriesKey::resolve(&desc, &["db"]).unwrap();

        assert!(!store.delete(&key));
        store.get_or_create(&key, |_| ());
        assert!(store.delete(&key));
        assert!(store.get(&key).is_none());

        store.get_or_create(&key, |_| ());
        store.clear();
        assert_eq!(store.len(), 0);
    }

    #[test]
    fn retain_filters_by_key() {
        let store = ValueStore::new();
        let desc = descriptor();
        let db = SeriesKey::resolve(&desc, &["db"]).unwrap();
        let cache = SeriesKey::resolve(&desc, &["cache"]).unwrap();

        store.get_or_create(&db, |_| ());
        store.get_or_create(&cache, |_| ());

        store.retain(|k| k.labels() == ["db"]);
        assert!(store.get(&db).is_some());
        assert!(store.get(&cache).is_none());
    }

    #[test]
    fn visit_sees_every_live_cell() {
        let store = ValueStore::new();
        let desc = descriptor();
        for pool in ["db", "cache", "search"] {
            let key = SeriesKey::resolve(&desc, &[pool]).unwrap();
            store.get_or_create(&key, |cell| cell.set(1.0));
        }

        let mut seen = Vec::new();
        store.visit(|k, _| seen.push(k.labels()[0].to_string()));
        seen.sort();
        assert_eq!(seen, ["cache", "db", "search"]);
    }
}
