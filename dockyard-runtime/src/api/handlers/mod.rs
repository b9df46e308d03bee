//! Request handlers, one module per resource.

pub mod apps;
pub mod components;
pub mod health;
