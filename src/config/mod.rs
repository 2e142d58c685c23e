//! Configuration models for the poll loop and process startup.

pub mod runtime;

pub use runtime::{RuntimeConfig, StartupOptions};
