//! Purpose: Define the stable public surface plugins program against.
//! Exports: Facades, envelope types, transport trait, shared schemas.
//! Role: Public, additive-only surface over the core and model modules.
//! Invariants: Facades never bypass validation on the way to the transport.

mod comm;
mod doc;
mod response;
pub mod schemas;
mod transport;

pub use crate::core::error::{to_code, Error, ErrorKind};
pub use crate::core::transport::{IndexSpan, StreamKind, StreamTransport};
pub use crate::core::verify::{verify, Rule, Schema, VerifyOptions};
pub use comm::CommApi;
pub use doc::DocApi;
pub use response::{ApiResponse, ErrorBody};
pub use transport::HostTransport;
