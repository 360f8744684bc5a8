//! Purpose: Client SDK library for note-app plugins talking to a host device.
//! Exports: `api` (facades, envelopes), `core` (accessors, validation,
//! Exports: errors), `model` (elements, pages).
//! Invariants: All host I/O flows through the transport traits in `core`
//! Invariants: and `api`; nothing in this crate touches the network itself.
pub mod api;
pub mod core;
pub mod model;
