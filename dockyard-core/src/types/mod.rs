//! Core types for Dockyard.
//!
//! - `RequestId`: correlates an RPC request with its response
//! - `Generation`: distinguishes successive units registered under one slug

mod ids;

pub use ids::{Generation, RequestId};
