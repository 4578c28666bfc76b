//! Process logging setup.
//!
//! Library code only emits `tracing` events; binaries and test harnesses call
//! [`init_logging`] once to get them on stderr.

use tracing_subscriber::EnvFilter;

/// Environment variable holding the filter directive (e.g. `stsm=debug`).
pub const LOG_ENV: &str = "STSM_LOG";

const DEFAULT_DIRECTIVE: &str = "info";

/// Install a formatted stderr subscriber.
///
/// Returns `false` when a global subscriber was already installed, which makes
/// repeated calls harmless.
pub fn init_logging() -> bool {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVE));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .try_init()
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_is_idempotent() {
        init_logging();
        assert!(!init_logging());
    }
}
