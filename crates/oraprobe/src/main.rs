//! Oraprobe - one-shot Oracle connectivity smoke test.

use oraprobe_core::config::load_config;
use oraprobe_core::logging::init_logging_default;
use oraprobe_core::services::linger;
use oraprobe_core::{runner, CredentialService, Probe};
use std::process::ExitCode;

fn main() -> ExitCode {
    // Logging goes to a file (and optionally stderr), never to stdout
    let _logging_guard = init_logging_default();

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "Starting oraprobe");

    let code = runner::run(
        load_config(),
        |config| Probe::oracle(config, CredentialService::new()),
        &mut std::io::stdout().lock(),
        &mut std::io::stderr(),
        linger,
    );

    tracing::info!(exit_code = code, "Oraprobe finished");
    ExitCode::from(code)
}
