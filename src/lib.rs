//! Single-shot HTTP probe for services listening on the loopback address.
//!
//! [`config::resolve`] turns the command line into a [`config::ProbeConfig`], and
//! [`probe::execute`] performs exactly one GET request with it.

pub mod config;
pub mod error;
pub mod headers;
pub mod probe;
pub mod telemetry;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
