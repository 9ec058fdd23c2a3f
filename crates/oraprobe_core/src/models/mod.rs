//! Data models for the connectivity probe.
//!
//! - `connection` - ConnectDescriptor
//! - `probe` - ProbeConfig, ProbeSuccess, ProbeReport

pub mod connection;
pub mod probe;

pub use connection::ConnectDescriptor;
pub use probe::{ProbeConfig, ProbeReport, ProbeSuccess, DEFAULT_LINGER_SECS, DEFAULT_QUERY};
