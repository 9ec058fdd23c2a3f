//! Core types and services for the Oraprobe connectivity probe.
//!
//! - **error**: Error type, Oracle error classification, failure trace
//! - **models**: Connection descriptor, probe config and report
//! - **services**: Driver seam, credentials, probe sequence, linger
//! - **config**: Config loading from file and environment
//! - **logging**: Structured logging setup
//! - **runner**: Report, linger and exit code around one run

pub mod config;
pub mod error;
pub mod logging;
pub mod models;
pub mod runner;
pub mod services;


pub use error::ProbeError;
pub use models::{ConnectDescriptor, ProbeConfig, ProbeReport, ProbeSuccess};
pub use services::{CredentialService, LingerOutcome, OracleDriver, Probe};
