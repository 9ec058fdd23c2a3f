//! The connectivity probe sequence.
//!
//! One attempt: announce the target, load the driver, resolve the password,
//! connect, run the configured query, print each row, release everything.
//! The attempt never panics on database errors; it returns a [`ProbeReport`]
//! carrying either a [`ProbeSuccess`] or the [`ProbeError`] that stopped it.

use crate::error::{write_trace, ProbeError};
use crate::models::{ProbeConfig, ProbeReport, ProbeSuccess};
use crate::services::credentials::CredentialService;
use crate::services::driver::{DatabaseDriver, OracleDriver};

use chrono::Utc;
use std::io::Write;
use uuid::Uuid;

/// First line printed by every run.
pub const STARTING_LINE: &str = "Starting Oracle connectivity probe...";

/// Printed once the session is open, before any result row.
pub const CONNECTED_LINE: &str = "Connected successfully via OCI Driver!";

/// First stderr line of the failure trace.
pub const FAILURE_HEADING: &str = "Connection failed:";

/// Prefix of each result row line.
pub const RESULT_PREFIX: &str = "Query Result: ";

/// Rendering of a NULL column value.
const NULL_TEXT: &str = "null";

/// One-shot connectivity probe.
pub struct Probe<D: DatabaseDriver = OracleDriver> {
    config: ProbeConfig,
    driver: D,
    credentials: CredentialService,
}

impl Probe<OracleDriver> {
    /// Create a probe backed by the Oracle client library.
    pub fn oracle(config: ProbeConfig, credentials: CredentialService) -> Self {
        Self::new(config, OracleDriver::new(), credentials)
    }
}

impl<D: DatabaseDriver> Probe<D> {
    pub fn new(config: ProbeConfig, driver: D, credentials: CredentialService) -> Self {
        Self { config, driver, credentials }
    }

    /// Get the probe configuration.
    pub fn config(&self) -> &ProbeConfig {
        &self.config
    }

    /// Run one attempt, writing progress and result rows to `out`.
    ///
    /// Nothing is written to stderr here; reporting a failure is up to the
    /// caller (see [`write_failure`]).
    pub fn run(&self, out: &mut dyn Write) -> ProbeReport {
        let run_id = Uuid::new_v4();
        let span = tracing::info_span!("probe", run_id = %run_id);
        let _enter = span.enter();

        let started_at = Utc::now();
        tracing::info!(
            driver = self.driver.name(),
            target = %self.config.descriptor.display_url(),
            "Probe started"
        );

        let outcome = self.attempt(out);
        let finished_at = Utc::now();

        let report = ProbeReport { run_id, started_at, finished_at, outcome };
        match &report.outcome {
            Ok(success) => tracing::info!(
                client_version = %success.client_version,
                server_version = success.server_version.as_deref().unwrap_or("unknown"),
                row_count = success.row_count,
                elapsed_ms = report.elapsed_ms(),
                "Probe succeeded"
            ),
            Err(e) => tracing::error!(
                category = e.category(),
                error = %e,
                elapsed_ms = report.elapsed_ms(),
                "Probe failed"
            ),
        }
        report
    }

    fn attempt(&self, out: &mut dyn Write) -> Result<ProbeSuccess, ProbeError> {
        let descriptor = &self.config.descriptor;

        writeln!(out, "{STARTING_LINE}")?;
        writeln!(out, "URL: {}", descriptor.display_url())?;
        out.flush()?;

        let client_version = self.driver.verify()?;
        let password = self.credentials.resolve_password(descriptor)?;

        // Dropping the session releases it if any later step fails.
        let mut session = self.driver.connect(descriptor, &password)?;
        drop(password);
        writeln!(out, "{CONNECTED_LINE}")?;

        let server_version = match session.server_version() {
            Ok(banner) => Some(banner),
            Err(e) => {
                tracing::debug!(error = %e, "Server version unavailable");
                None
            }
        };

        tracing::debug!(query = %self.config.query, "Executing query");
        let row_count = session.for_each_text_row(&self.config.query, &mut |value: Option<String>| {
            writeln!(out, "{RESULT_PREFIX}{}", value.as_deref().unwrap_or(NULL_TEXT))?;
            Ok(())
        })?;

        session.close()?;
        out.flush()?;

        Ok(ProbeSuccess { client_version, server_version, row_count })
    }
}

/// Write the failure trace for `report` to `err`; a success writes nothing.
pub fn write_failure(report: &ProbeReport, err: &mut dyn Write) -> std::io::Result<()> {
    match &report.outcome {
        Ok(_) => Ok(()),
        Err(e) => write_trace(err, FAILURE_HEADING, e),
    }
}

impl<D: DatabaseDriver> std::fmt::Debug for Probe<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Probe")
            .field("config", &self.config)
            .field("driver", &self.driver.name())
            .field("credentials", &self.credentials)
            .finish()
    }
}
