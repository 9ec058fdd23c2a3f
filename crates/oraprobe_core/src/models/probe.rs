//! Probe configuration and run report models.

use crate::error::ProbeError;
use crate::models::ConnectDescriptor;

use chrono::{DateTime, Utc};
use std::time::Duration;
use uuid::Uuid;

/// Query run when none is configured.
pub const DEFAULT_QUERY: &str = "SELECT 'Hello from Oracle DB - ' || version FROM v$instance";

/// Post-run linger when none is configured.
pub const DEFAULT_LINGER_SECS: u64 = 50;

/// Everything one probe run needs, except the password.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeConfig {
    /// Target server and identity
    pub descriptor: ConnectDescriptor,
    /// Read-only statement returning one text column
    pub query: String,
    /// Pause after the attempt, before the process exits
    pub linger_secs: u64,
    /// Exit non-zero when the probe fails
    pub strict_exit: bool,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            descriptor: ConnectDescriptor::default(),
            query: DEFAULT_QUERY.to_string(),
            linger_secs: DEFAULT_LINGER_SECS,
            strict_exit: false,
        }
    }
}

impl ProbeConfig {
    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), String> {
        self.descriptor.validate()?;
        if self.query.trim().is_empty() {
            return Err("Query is required".to_string());
        }
        Ok(())
    }

    /// Post-run linger as a duration.
    pub fn linger(&self) -> Duration {
        Duration::from_secs(self.linger_secs)
    }
}

/// What a successful probe observed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeSuccess {
    /// Oracle client library version
    pub client_version: String,
    /// Server version banner, when the server reported one
    pub server_version: Option<String>,
    /// Rows printed
    pub row_count: usize,
}

/// One probe run, for structured logging.
#[derive(Debug)]
pub struct ProbeReport {
    /// Correlates log lines of one run
    pub run_id: Uuid,
    /// When the attempt started
    pub started_at: DateTime<Utc>,
    /// When the attempt finished (before the linger)
    pub finished_at: DateTime<Utc>,
    /// Tagged result of the attempt
    pub outcome: Result<ProbeSuccess, ProbeError>,
}

impl ProbeReport {
    /// Check if the probe succeeded.
    pub fn is_success(&self) -> bool {
        self.outcome.is_ok()
    }

    /// Wall-clock time the attempt took.
    pub fn elapsed_ms(&self) -> i64 {
        (self.finished_at - self.started_at).num_milliseconds()
    }
}
