//! The host's side of the request/response channel to execution units.
//!
//! Each live unit has a [`UnitConnection`] for issuing requests, a
//! [`PendingTable`] correlating responses by request id, and a reader task
//! that routes inbound frames and notices when the unit exits.

mod connection;
mod pending;
mod reader;

pub use connection::UnitConnection;
pub use pending::{PendingTable, Responder};
pub use reader::{BootSignal, EXIT_CAUSE, spawn_reader};
