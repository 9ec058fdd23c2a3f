//! Process flow around one probe run.
//!
//! Config result in, exit code out. The binary passes the real console and
//! [`linger`](crate::services::linger); tests pass buffers and a recorder.

use crate::error::{write_trace, ProbeError};
use crate::models::ProbeConfig;
use crate::services::driver::DatabaseDriver;
use crate::services::linger::LingerOutcome;
use crate::services::probe::{write_failure, Probe};

use std::io::Write;
use std::time::Duration;

/// Exit code after a completed run (success, or failure without strict exit).
pub const EXIT_OK: u8 = 0;

/// Exit code when the probe failed and strict exit is enabled.
pub const EXIT_PROBE_FAILED: u8 = 1;

/// Exit code when the configuration is unusable.
pub const EXIT_BAD_CONFIG: u8 = 2;

/// Heading of the stderr trace for a rejected configuration.
pub const BAD_CONFIG_HEADING: &str = "Invalid configuration:";

/// Run the probe for `config`, report, linger and pick the exit code.
///
/// An invalid configuration is reported on `err` and returns
/// [`EXIT_BAD_CONFIG`] without building the probe or lingering.
pub fn run<D, B, L>(
    config: Result<ProbeConfig, ProbeError>,
    build_probe: B,
    out: &mut dyn Write,
    err: &mut dyn Write,
    linger: L,
) -> u8
where
    D: DatabaseDriver,
    B: FnOnce(ProbeConfig) -> Probe<D>,
    L: FnOnce(Duration) -> LingerOutcome,
{
    let config = match config {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(error = %e, "Invalid configuration");
            if let Err(io) = write_trace(err, BAD_CONFIG_HEADING, &e) {
                tracing::warn!(error = %io, "Failed to write configuration error");
            }
            return EXIT_BAD_CONFIG;
        }
    };

    let probe = build_probe(config);

    let report = probe.run(out);
    if let Err(e) = write_failure(&report, err) {
        tracing::warn!(error = %e, "Failed to write failure report");
    }

    // Same pause on success and failure
    if linger(probe.config().linger()) == LingerOutcome::Interrupted {
        tracing::info!("Linger interrupted, exiting");
    }

    if probe.config().strict_exit && !report.is_success() {
        EXIT_PROBE_FAILED
    } else {
        EXIT_OK
    }
}
