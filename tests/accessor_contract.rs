//! Accessor behavior against a scripted in-memory stream transport.
use async_trait::async_trait;
use inkbridge::core::accessor::DataAccessor;
use inkbridge::core::error::Error;
use inkbridge::core::transport::{IndexSpan, StreamKind, StreamTransport};
use inkbridge::model::element::Point;
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};

#[derive(Default)]
struct Counters {
    size_calls: usize,
    index_calls: usize,
    range_calls: usize,
    releases: Vec<String>,
}

/// One stream's worth of raw values, plus call accounting.
struct MockStream {
    data: Mutex<Vec<Value>>,
    accept_writes: bool,
    counters: Mutex<Counters>,
}

impl MockStream {
    fn new(data: Vec<Value>) -> Arc<Self> {
        Arc::new(Self {
            data: Mutex::new(data),
            accept_writes: true,
            counters: Mutex::new(Counters::default()),
        })
    }

    fn read_only(data: Vec<Value>) -> Arc<Self> {
        Arc::new(Self {
            data: Mutex::new(data),
            accept_writes: false,
            counters: Mutex::new(Counters::default()),
        })
    }

    fn counts(&self) -> (usize, usize, usize) {
        let c = self.counters.lock().unwrap();
        (c.size_calls, c.index_calls, c.range_calls)
    }
}

#[async_trait]
impl StreamTransport for MockStream {
    async fn size_of(&self, _owner: &str, _stream: StreamKind) -> Result<u64, Error> {
        self.counters.lock().unwrap().size_calls += 1;
        Ok(self.data.lock().unwrap().len() as u64)
    }

    async fn fetch_by_index(
        &self,
        _owner: &str,
        _stream: StreamKind,
        index: u64,
    ) -> Result<Vec<Value>, Error> {
        self.counters.lock().unwrap().index_calls += 1;
        let data = self.data.lock().unwrap();
        Ok(data.get(index as usize).cloned().into_iter().collect())
    }

    async fn fetch_range(
        &self,
        _owner: &str,
        _stream: StreamKind,
        start: u64,
        end: u64,
    ) -> Result<Vec<Value>, Error> {
        self.counters.lock().unwrap().range_calls += 1;
        let data = self.data.lock().unwrap();
        let lo = (start as usize).min(data.len());
        let hi = ((end + 1) as usize).min(data.len());
        Ok(data[lo..hi].to_vec())
    }

    async fn insert_at(
        &self,
        _owner: &str,
        _stream: StreamKind,
        index: u64,
        values: Vec<Value>,
    ) -> Result<bool, Error> {
        if !self.accept_writes {
            return Ok(false);
        }
        let mut data = self.data.lock().unwrap();
        let at = (index as usize).min(data.len());
        for (offset, value) in values.into_iter().enumerate() {
            data.insert(at + offset, value);
        }
        Ok(true)
    }

    async fn replace_at(
        &self,
        _owner: &str,
        _stream: StreamKind,
        span: IndexSpan,
        values: Vec<Value>,
    ) -> Result<bool, Error> {
        if !self.accept_writes {
            return Ok(false);
        }
        let mut data = self.data.lock().unwrap();
        match span {
            IndexSpan::At(index) => {
                if let (Some(slot), Some(value)) =
                    (data.get_mut(index as usize), values.into_iter().next())
                {
                    *slot = value;
                }
            }
            IndexSpan::Between(start, _end) => {
                for (offset, value) in values.into_iter().enumerate() {
                    if let Some(slot) = data.get_mut(start as usize + offset) {
                        *slot = value;
                    }
                }
            }
        }
        Ok(true)
    }

    fn release_element_cache(&self, owner: &str) {
        self.counters
            .lock()
            .unwrap()
            .releases
            .push(owner.to_string());
    }
}

fn pressures() -> Vec<Value> {
    vec![json!(0.5), json!(0.6), json!(0.7), json!(0.75)]
}

#[tokio::test]
async fn single_index_fetch_is_cached() {
    let stream = MockStream::new(pressures());
    let mut acc: DataAccessor<f64> =
        DataAccessor::new(stream.clone(), "e1", StreamKind::StrokePressure);

    assert_eq!(acc.get(3).await.unwrap(), Some(0.75));
    assert_eq!(acc.get(3).await.unwrap(), Some(0.75));
    let (_, index_calls, _) = stream.counts();
    assert_eq!(index_calls, 1, "second read must come from cache");
    assert!(acc.is_cached(3));
}

#[tokio::test]
async fn covered_range_is_served_without_refetch() {
    let stream = MockStream::new(pressures());
    let mut acc: DataAccessor<f64> =
        DataAccessor::new(stream.clone(), "e1", StreamKind::StrokePressure);

    assert_eq!(acc.get_range(0, 3).await.unwrap(), vec![0.5, 0.6, 0.7]);
    // Sub-span of a recorded fetch: no remote traffic.
    assert_eq!(acc.get_range(1, 2).await.unwrap(), vec![0.6, 0.7]);
    assert_eq!(acc.get(1).await.unwrap(), Some(0.6));
    let (_, index_calls, range_calls) = stream.counts();
    assert_eq!(range_calls, 1);
    assert_eq!(index_calls, 0);
}

#[tokio::test]
async fn empty_range_request_is_free() {
    let stream = MockStream::new(pressures());
    let mut acc: DataAccessor<f64> =
        DataAccessor::new(stream.clone(), "e1", StreamKind::StrokePressure);

    assert!(acc.get_range(2, 0).await.unwrap().is_empty());
    let (_, index_calls, range_calls) = stream.counts();
    assert_eq!((index_calls, range_calls), (0, 0));
}

#[tokio::test]
async fn malformed_values_are_dropped_not_surfaced() {
    let stream = MockStream::new(vec![json!(0.5), json!("bad"), json!(0.7)]);
    let mut acc: DataAccessor<f64> =
        DataAccessor::new(stream.clone(), "e1", StreamKind::StrokePressure);

    assert_eq!(acc.get_range(0, 3).await.unwrap(), vec![0.5, 0.7]);
    assert_eq!(acc.get(1).await.unwrap(), None);
    assert!(!acc.is_cached(1));
    assert!(acc.is_cached(0));
}

#[tokio::test]
async fn point_sequence_stream_drops_invalid_entries() {
    let valid = json!([{"x": 0.0, "y": 0.0}, {"x": 3.0, "y": 4.0}]);
    let stream = MockStream::new(vec![valid, json!("not-an-array")]);
    let mut acc: DataAccessor<Vec<Point>> =
        DataAccessor::new(stream, "e2", StreamKind::ContourPoint);

    let polygons = acc.get_range(0, 2).await.unwrap();
    assert_eq!(polygons.len(), 1);
    assert_eq!(polygons[0][1], Point { x: 3.0, y: 4.0 });
}

#[tokio::test]
async fn size_is_measured_once_until_mutation() {
    let stream = MockStream::new(pressures());
    let mut acc: DataAccessor<f64> =
        DataAccessor::new(stream.clone(), "e1", StreamKind::StrokePressure);

    assert_eq!(acc.size().await.unwrap(), 4);
    assert_eq!(acc.size().await.unwrap(), 4);
    let (size_calls, _, _) = stream.counts();
    assert_eq!(size_calls, 1);
}

#[tokio::test]
async fn acknowledged_mutation_invalidates_everything() {
    let stream = MockStream::new(pressures());
    let mut acc: DataAccessor<f64> =
        DataAccessor::new(stream.clone(), "e1", StreamKind::StrokePressure);

    acc.preload(0, 4).await.unwrap();
    acc.size().await.unwrap();
    assert!(acc.is_cached(0));

    assert!(acc.add(0, 0.4).await.unwrap());
    assert!(!acc.is_cached(0));
    assert_eq!(acc.cache_stats().total_size, None);

    // Post-invalidation reads observe the new state.
    assert_eq!(acc.size().await.unwrap(), 5);
    assert_eq!(acc.get(0).await.unwrap(), Some(0.4));
}

#[tokio::test]
async fn rejected_mutation_leaves_cache_intact() {
    let stream = MockStream::read_only(pressures());
    let mut acc: DataAccessor<f64> =
        DataAccessor::new(stream, "e1", StreamKind::StrokePressure);

    acc.preload(0, 4).await.unwrap();
    assert!(!acc.set(0, 9.9).await.unwrap());
    assert!(!acc.set_range(0, 1, vec![9.9, 9.8]).await.unwrap());
    assert!(acc.is_cached(0));
    assert_eq!(acc.get(0).await.unwrap(), Some(0.5));
}

#[tokio::test]
async fn replace_then_read_sees_new_value() {
    let stream = MockStream::new(pressures());
    let mut acc: DataAccessor<f64> =
        DataAccessor::new(stream, "e1", StreamKind::StrokePressure);

    assert_eq!(acc.get(2).await.unwrap(), Some(0.7));
    assert!(acc.set(2, 0.9).await.unwrap());
    assert_eq!(acc.get(2).await.unwrap(), Some(0.9));
}

#[tokio::test]
async fn clear_cache_keeps_measured_size() {
    let stream = MockStream::new(pressures());
    let mut acc: DataAccessor<f64> =
        DataAccessor::new(stream.clone(), "e1", StreamKind::StrokePressure);

    acc.size().await.unwrap();
    acc.preload(0, 4).await.unwrap();
    acc.clear_cache();
    assert_eq!(acc.cache_stats().cached_count, 0);
    assert_eq!(acc.cache_stats().total_size, Some(4));
    let (size_calls, _, _) = stream.counts();
    assert_eq!(acc.size().await.unwrap(), 4);
    assert_eq!(stream.counts().0, size_calls, "size stays cached");
}

#[tokio::test]
async fn iteration_skips_invalid_and_uses_start_snapshot() {
    let stream = MockStream::new(vec![json!(0.1), json!("bad"), json!(0.3)]);
    let mut acc: DataAccessor<f64> =
        DataAccessor::new(stream, "e1", StreamKind::StrokePressure);

    let mut seen = Vec::new();
    let mut iter = acc.iter();
    while let Some(value) = iter.next().await.unwrap() {
        seen.push(value);
    }
    assert_eq!(seen, vec![0.1, 0.3]);

    // A fresh iterator restarts from index 0.
    let mut iter = acc.iter();
    assert_eq!(iter.next().await.unwrap(), Some(0.1));
}

#[tokio::test]
async fn iteration_length_is_snapshotted_at_first_next() {
    let stream = MockStream::new(vec![json!(0.1), json!(0.2)]);
    let mut acc: DataAccessor<f64> =
        DataAccessor::new(stream.clone(), "e1", StreamKind::StrokePressure);

    let mut iter = acc.iter();
    assert_eq!(iter.next().await.unwrap(), Some(0.1));

    // The stream grows behind the iterator's back.
    stream.data.lock().unwrap().push(json!(0.9));

    assert_eq!(iter.next().await.unwrap(), Some(0.2));
    assert_eq!(iter.next().await.unwrap(), None, "appends after the snapshot are not yielded");
}

#[tokio::test]
async fn accessors_over_the_same_stream_do_not_share_state() {
    let stream = MockStream::new(pressures());
    let mut left: DataAccessor<f64> =
        DataAccessor::new(stream.clone(), "e1", StreamKind::StrokePressure);
    let mut right: DataAccessor<f64> =
        DataAccessor::new(stream.clone(), "e1", StreamKind::StrokePressure);

    left.get(0).await.unwrap();
    assert!(left.is_cached(0));
    assert!(!right.is_cached(0));

    right.get(0).await.unwrap();
    let (_, index_calls, _) = stream.counts();
    assert_eq!(index_calls, 2, "independent caches each pay their fetch");
}
