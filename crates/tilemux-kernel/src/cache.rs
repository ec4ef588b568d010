//! Value cache: kernel contract.

/// Process-wide key → value store with time-bounded entries.
///
/// Population is lazy: callers `get`, compute on a miss, then `set`.
/// Concurrent misses for the same key may each compute and write;
/// implementations keep whichever value was written last, and callers only
/// store values that are equal for equal inputs, so either outcome is
/// correct.
pub trait ValueCache<V>: Send + Sync
where
    V: Clone + Send + Sync,
{
    /// Current value for `key`, or `None` if absent or expired.
    fn get(&self, key: &str) -> Option<V>;

    /// Store `value` under `key` and return the stored value.
    fn set(&self, key: &str, value: V) -> V;
}
