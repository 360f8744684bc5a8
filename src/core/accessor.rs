//! Purpose: Cached client-side view over one remotely-held data stream.
//! Exports: `DataAccessor`, `StreamValue`, `AccessorIter`, `CacheStats`.
//! Role: Makes host-held point sequences look like local collections.
//! Invariants: Every cached value passed its shape check on the way in.
//! Invariants: Any acknowledged mutation drops the whole cache and the
//! Invariants: measured length; there is no partial invalidation.
use crate::core::error::Error;
use crate::core::transport::{IndexSpan, StreamKind, StreamTransport};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, trace};

/// One of the closed set of value shapes a stream can carry.
///
/// `from_raw` is the shape predicate: it returns `None` for any raw value
/// that does not match, and the accessor silently drops such values instead
/// of caching or surfacing them.
pub trait StreamValue: Clone {
    fn from_raw(raw: &Value) -> Option<Self>;
    fn into_raw(self) -> Value;
}

impl StreamValue for f64 {
    fn from_raw(raw: &Value) -> Option<Self> {
        raw.as_f64().filter(|n| n.is_finite())
    }

    fn into_raw(self) -> Value {
        Value::from(self)
    }
}

impl StreamValue for bool {
    fn from_raw(raw: &Value) -> Option<Self> {
        raw.as_bool()
    }

    fn into_raw(self) -> Value {
        Value::from(self)
    }
}

/// Cache introspection snapshot. `total_size` is `None` until measured.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct CacheStats {
    pub cached_count: usize,
    pub total_size: Option<u64>,
}

/// Lazy, caching proxy for one `(owner, stream)` remote sequence.
///
/// Each instance owns its cache outright; two accessors over the same stream
/// identity never observe each other's state. All cache-touching operations
/// take `&mut self`, so overlapping un-awaited mutation of one instance is
/// unrepresentable.
pub struct DataAccessor<T: StreamValue> {
    transport: Arc<dyn StreamTransport>,
    owner: String,
    stream: StreamKind,
    size: Option<u64>,
    cache: HashMap<u64, T>,
    // Closed-open intervals already fetched in bulk.
    ranges: Vec<(u64, u64)>,
}

impl<T: StreamValue> DataAccessor<T> {
    /// No I/O happens here. `owner` may still be empty if the element has
    /// not yet received its identifier from the host; callers must not
    /// invoke operations in that window.
    pub fn new(
        transport: Arc<dyn StreamTransport>,
        owner: impl Into<String>,
        stream: StreamKind,
    ) -> Self {
        let owner = owner.into();
        trace!(owner = %owner, stream = ?stream, "data accessor created");
        Self {
            transport,
            owner,
            stream,
            size: None,
            cache: HashMap::new(),
            ranges: Vec::new(),
        }
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub(crate) fn transport(&self) -> &Arc<dyn StreamTransport> {
        &self.transport
    }

    pub fn stream(&self) -> StreamKind {
        self.stream
    }

    /// Total length of the remote sequence, measured once and cached until
    /// the next acknowledged mutation. Concurrent first callers each issue
    /// their own remote call; `size` is infrequent enough that coalescing
    /// is not worth the machinery.
    pub async fn size(&mut self) -> Result<u64, Error> {
        if let Some(size) = self.size {
            return Ok(size);
        }
        let size = self.transport.size_of(&self.owner, self.stream).await?;
        self.size = Some(size);
        Ok(size)
    }

    /// Value at `index`, or `None` when the index is out of range or the
    /// host returned something that fails the shape check.
    pub async fn get(&mut self, index: u64) -> Result<Option<T>, Error> {
        if let Some(value) = self.cache.get(&index) {
            trace!(owner = %self.owner, index, "cache hit");
            return Ok(Some(value.clone()));
        }

        let raw = self
            .transport
            .fetch_by_index(&self.owner, self.stream, index)
            .await?;
        if let Some(first) = raw.first() {
            if let Some(value) = T::from_raw(first) {
                self.cache.insert(index, value.clone());
                return Ok(Some(value));
            }
        }
        Ok(None)
    }

    /// Values for `[start, start+count)`, served from cache when a recorded
    /// bulk fetch already covers the whole span. Shape-invalid entries are
    /// dropped, not substituted.
    pub async fn get_range(&mut self, start: u64, count: u64) -> Result<Vec<T>, Error> {
        if count == 0 {
            return Ok(Vec::new());
        }

        let end = start + count;
        let covered = self
            .ranges
            .iter()
            .any(|&(lo, hi)| start >= lo && end <= hi);
        if covered {
            // Indices inside a covered range should all be cached; filter
            // gaps rather than trust that.
            let values = (start..end)
                .filter_map(|i| self.cache.get(&i).cloned())
                .collect();
            return Ok(values);
        }

        let raw = self
            .transport
            .fetch_range(&self.owner, self.stream, start, end - 1)
            .await?;
        debug!(owner = %self.owner, start, count, fetched = raw.len(), "bulk fetch");
        if raw.is_empty() {
            return Ok(Vec::new());
        }

        let mut values = Vec::new();
        for (offset, item) in raw.iter().enumerate() {
            if let Some(value) = T::from_raw(item) {
                self.cache.insert(start + offset as u64, value.clone());
                values.push(value);
            }
        }
        self.ranges.push((start, end));
        Ok(values)
    }

    /// Restartable iteration over all values from index 0 to `size()-1`.
    /// The length is read once at the first `next`, so appends landing
    /// mid-iteration are not reflected.
    pub fn iter(&mut self) -> AccessorIter<'_, T> {
        AccessorIter {
            accessor: self,
            index: 0,
            total: None,
        }
    }

    /// Insert `value` at `index`. A truthy host acknowledgement invalidates
    /// the entire cache; a falsy one leaves it untouched.
    pub async fn add(&mut self, index: u64, value: T) -> Result<bool, Error> {
        let ack = self
            .transport
            .insert_at(&self.owner, self.stream, index, vec![value.into_raw()])
            .await?;
        if ack {
            self.invalidate();
            return Ok(true);
        }
        Ok(false)
    }

    /// Replace the value at `index`. No client-side bounds check; the host
    /// is authoritative on index validity.
    pub async fn set(&mut self, index: u64, value: T) -> Result<bool, Error> {
        let ack = self
            .transport
            .replace_at(
                &self.owner,
                self.stream,
                IndexSpan::At(index),
                vec![value.into_raw()],
            )
            .await?;
        if ack {
            self.invalidate();
            return Ok(true);
        }
        Ok(false)
    }

    /// Replace `[start, end]` inclusive with `values`. The caller is
    /// responsible for the value count matching the span.
    pub async fn set_range(&mut self, start: u64, end: u64, values: Vec<T>) -> Result<bool, Error> {
        let raw = values.into_iter().map(StreamValue::into_raw).collect();
        let ack = self
            .transport
            .replace_at(&self.owner, self.stream, IndexSpan::Between(start, end), raw)
            .await?;
        if ack {
            self.invalidate();
            return Ok(true);
        }
        Ok(false)
    }

    /// Warm the cache ahead of sequential access.
    pub async fn preload(&mut self, start: u64, count: u64) -> Result<(), Error> {
        self.get_range(start, count).await.map(|_| ())
    }

    /// Drop cached values and coverage intervals. The measured length is
    /// kept; only mutations reset it.
    pub fn clear_cache(&mut self) {
        self.cache.clear();
        self.ranges.clear();
    }

    pub fn is_cached(&self, index: u64) -> bool {
        self.cache.contains_key(&index)
    }

    pub fn cache_stats(&self) -> CacheStats {
        CacheStats {
            cached_count: self.cache.len(),
            total_size: self.size,
        }
    }

    fn invalidate(&mut self) {
        trace!(owner = %self.owner, stream = ?self.stream, "cache invalidated");
        self.clear_cache();
        self.size = None;
    }
}

impl<T: StreamValue> fmt::Debug for DataAccessor<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DataAccessor")
            .field("owner", &self.owner)
            .field("stream", &self.stream)
            .field("size", &self.size)
            .field("cached", &self.cache.len())
            .finish()
    }
}

/// Pull-style async iterator over an accessor.
///
/// Yields cache-backed values in ascending index order, skipping indices the
/// host has no valid value for. Obtain a fresh one from
/// [`DataAccessor::iter`] to restart from index 0.
pub struct AccessorIter<'a, T: StreamValue> {
    accessor: &'a mut DataAccessor<T>,
    index: u64,
    total: Option<u64>,
}

impl<T: StreamValue> AccessorIter<'_, T> {
    pub async fn next(&mut self) -> Result<Option<T>, Error> {
        let total = match self.total {
            Some(total) => total,
            None => {
                let total = self.accessor.size().await?;
                self.total = Some(total);
                total
            }
        };

        while self.index < total {
            let index = self.index;
            self.index += 1;
            if let Some(value) = self.accessor.get(index).await? {
                return Ok(Some(value));
            }
        }
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::StreamValue;
    use serde_json::json;

    #[test]
    fn number_shape_rejects_non_numbers() {
        assert_eq!(f64::from_raw(&json!(0.75)), Some(0.75));
        assert_eq!(f64::from_raw(&json!({"x": 1, "y": 2})), None);
        assert_eq!(f64::from_raw(&json!("0.75")), None);
        assert_eq!(f64::from_raw(&json!(null)), None);
    }

    #[test]
    fn boolean_shape_rejects_truthy_lookalikes() {
        assert_eq!(bool::from_raw(&json!(true)), Some(true));
        assert_eq!(bool::from_raw(&json!(1)), None);
        assert_eq!(bool::from_raw(&json!("true")), None);
    }

    #[test]
    fn number_round_trips_through_raw() {
        let raw = 0.5f64.into_raw();
        assert_eq!(f64::from_raw(&raw), Some(0.5));
    }
}
