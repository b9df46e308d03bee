//! Execution units.
//!
//! An execution unit owns one connector package. It loads the package's
//! definitions at boot, announces them to the host with a `ready` event,
//! then serves `listComponents`, `propOptions` and `runComponent` requests
//! until it is told to stop or faults.
//!
//! The host never calls into a unit directly: every exchange is a JSON frame
//! over the channel returned by a [`UnitLauncher`].

mod context;
mod index;
mod launcher;
mod loader;
mod serve;

pub use context::{ExecutionContextBuilder, bind_props, merge_result};
pub use index::UnitIndex;
pub use launcher::{ThreadLauncher, UnitChannel, UnitLauncher, UnitSpec};
pub use loader::load_package;
pub use serve::{handle, run_unit};
