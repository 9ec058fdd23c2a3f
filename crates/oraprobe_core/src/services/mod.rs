//! Services behind the connectivity probe.
//!
//! - `driver` - Database driver seam and the Oracle client implementation
//! - `credentials` - Password lookup (environment, file, OS keychain)
//! - `probe` - The one-shot probe sequence
//! - `linger` - Post-run pause with interrupt handling

pub mod credentials;
pub mod driver;
pub mod linger;
pub mod probe;

pub use credentials::{CredentialService, CredentialsProvider};
pub use driver::{DatabaseDriver, DatabaseSession, OracleDriver};
pub use linger::{linger, LingerOutcome};
pub use probe::{write_failure, Probe};
