//! Purpose: Abstract transport for large per-element data streams.
//! Exports: `StreamKind`, `IndexSpan`, `StreamTransport`.
//! Role: The only channel through which accessors reach host-held data.
//! Invariants: One already-established channel to one remote peer; ordering
//! Invariants: and timeout policy belong to the implementation, not callers.
use crate::core::error::Error;
use async_trait::async_trait;
use serde_json::Value;

/// Tag naming one of the large-data streams an element can own.
///
/// The discriminants match the host's stream numbering and must not change.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
#[repr(u8)]
pub enum StreamKind {
    /// Per-point pen angle data, present on every element.
    AnglePoint = 0,
    /// Contour polygons, present on every element.
    ContourPoint = 1,
    /// Stroke sample points.
    StrokeSamplePoint = 2,
    /// Stroke pressure values.
    StrokePressure = 3,
    /// Eraser-line trail numbers.
    EraseLineData = 4,
    /// Per-point write flags.
    WriteFlag = 5,
    /// Marker pen direction vectors.
    MarkPenDirection = 6,
    /// Handwriting recognition records.
    RecognitionData = 7,
}

/// Index addressing for a replace operation: one slot or an inclusive span.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum IndexSpan {
    At(u64),
    Between(u64, u64),
}

/// Indexed operations on one named remote stream.
///
/// Implementations bridge to the host process. Every async method suspends
/// the caller until the host answers or the channel fails; the trait imposes
/// no retry, queueing, or cancellation behavior of its own.
#[async_trait]
pub trait StreamTransport: Send + Sync {
    /// Total number of values currently held in the stream.
    async fn size_of(&self, owner: &str, stream: StreamKind) -> Result<u64, Error>;

    /// Fetch the value at `index`. Returns at most one raw value; an empty
    /// reply means the index is out of range.
    async fn fetch_by_index(
        &self,
        owner: &str,
        stream: StreamKind,
        index: u64,
    ) -> Result<Vec<Value>, Error>;

    /// Fetch `[start, end]` inclusive, in request order.
    async fn fetch_range(
        &self,
        owner: &str,
        stream: StreamKind,
        start: u64,
        end: u64,
    ) -> Result<Vec<Value>, Error>;

    /// Insert `values` at `index`. A `false` acknowledgement means the host
    /// rejected the write.
    async fn insert_at(
        &self,
        owner: &str,
        stream: StreamKind,
        index: u64,
        values: Vec<Value>,
    ) -> Result<bool, Error>;

    /// Replace the addressed span with `values`.
    async fn replace_at(
        &self,
        owner: &str,
        stream: StreamKind,
        span: IndexSpan,
        values: Vec<Value>,
    ) -> Result<bool, Error>;

    /// Release the host-side cache for `owner`. Fire-and-forget: the caller
    /// never observes completion.
    fn release_element_cache(&self, owner: &str);
}
