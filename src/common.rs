use std::borrow::Cow;
use std::hash::{Hash, Hasher};
use std::time::Duration;

/// An allocation-flexible string.
///
/// Metric names, help text, and label values can come from static declaration sites or be built
/// dynamically by a binding layer. `SharedString` accepts both without forcing an allocation for
/// the static case.
pub type SharedString = Cow<'static, str>;

/// A type that can hash itself.
///
/// Series keys are hashed at construction time and then looked up many times. Rather than the
/// standard library `Hash` trait, `Hashable` exposes an interface that lets an object hand back
/// its memoized 8-byte hash directly, so the sharded store never rehashes a key on the hot path.
pub trait Hashable: Hash {
    /// Generate the hash of this object.
    fn hashable(&self) -> u64;
}

/// A no-op hasher for pre-hashed key types.
///
/// This hasher is designed for use with [`SeriesKey`][crate::key::SeriesKey], which pre-computes
/// its hash at construction time. When `SeriesKey::hash()` is called, it writes the pre-computed
/// hash via `write_u64()`, and `finish()` simply returns that value.
///
/// This ensures that `HashMap<SeriesKey, V, BuildHasherDefault<KeyHasher>>` lookups work
/// correctly when using raw_entry APIs with pre-computed hashes.
///
/// # Panics
///
/// Panics if `finish()` is called without first calling `write_u64()`, or if any write method
/// other than `write_u64()` is called. This hasher is specifically for pre-hashed keys only.
#[derive(Debug, Default)]
pub struct KeyHasher {
    hash: Option<u64>,
}

impl Hasher for KeyHasher {
    #[inline(always)]
    fn finish(&self) -> u64 {
        self.hash
            .expect("KeyHasher::finish() called without write_u64(); KeyHasher is only for pre-hashed key types")
    }

    fn write(&mut self, _bytes: &[u8]) {
        panic!("KeyHasher::write() called; KeyHasher only supports write_u64() for pre-hashed key types");
    }

    #[inline(always)]
    fn write_u64(&mut self, i: u64) {
        self.hash = Some(i);
    }
}

/// An object which can be converted into a `f64` representation.
///
/// This trait provides a mechanism for existing types, which have a natural representation as a
/// 64-bit floating-point number, to be transparently passed in when setting or adjusting a gauge.
/// Integer deltas and floating deltas both funnel through here: the store performs all arithmetic
/// in `f64` regardless of which flavor the caller uses.
pub trait IntoF64 {
    /// Converts this object to its `f64` representation.
    fn into_f64(self) -> f64;
}

impl IntoF64 for f64 {
    fn into_f64(self) -> f64 {
        self
    }
}

impl IntoF64 for f32 {
    fn into_f64(self) -> f64 {
        f64::from(self)
    }
}

impl IntoF64 for Duration {
    fn into_f64(self) -> f64 {
        self.as_secs_f64()
    }
}

macro_rules! into_f64_int {
    ($($ty:ty),*) => {
        $(
            impl IntoF64 for $ty {
                fn into_f64(self) -> f64 {
                    self as f64
                }
            }
        )*
    };
}

into_f64_int!(i8, u8, i16, u16, i32, u32, i64, u64, isize, usize);
