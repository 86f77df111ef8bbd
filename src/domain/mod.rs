//! Domain layer: pure data types and the ports the outside world plugs into.

pub mod models;
pub mod ports;
