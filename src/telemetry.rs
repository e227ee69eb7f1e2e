use std::io::{self, IsTerminal};

use tracing_subscriber::EnvFilter;

/// Installs the stderr log subscriber. Stdout stays reserved for the version string.
///
/// Verbosity comes from `RUST_LOG` and defaults to `WARN`, so a passing probe prints nothing.
pub fn init_telemetry() {
    let filter = EnvFilter::try_from_default_env().unwrap_or(EnvFilter::new("WARN"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_ansi(io::stderr().is_terminal())
        .with_target(false)
        .init();
}
