//! Purpose: Full host boundary: stream operations plus the generic host call.
//! Exports: `HostTransport`.
//! Role: The one trait a host binding implements to back the whole SDK.
//! Invariants: `invoke` carries every whole-element/document operation; the
//! Invariants: method name and JSON params mirror the host's own surface.
use crate::api::response::ApiResponse;
use crate::core::error::Error;
use crate::core::transport::StreamTransport;
use async_trait::async_trait;
use serde_json::Value;

/// Abstract call interface to the host process.
///
/// Stream-indexed operations come from [`StreamTransport`]; everything else
/// (element CRUD, layers, lasso, document queries) goes through `invoke` as
/// one named remote procedure with JSON params, answered with the uniform
/// envelope. Transport-level failures are `Err`; host-reported business
/// failures arrive inside the envelope.
#[async_trait]
pub trait HostTransport: StreamTransport {
    async fn invoke(&self, method: &str, params: Value) -> Result<ApiResponse<Value>, Error>;
}
