//! Log subscriber setup for the `lbscope` binary
//!
//! Library code only emits `tracing` events; installing a subscriber is
//! left to the application.

use tracing_subscriber::EnvFilter;

/// Environment variable holding the log filter (`EnvFilter` syntax)
pub const LOG_ENV: &str = "LBSCOPE_LOG";

/// Filter used when `LBSCOPE_LOG` is unset or invalid
pub const DEFAULT_FILTER: &str = "warn";

/// Install a stderr fmt subscriber
///
/// Safe to call more than once: later calls leave the first subscriber in
/// place. Stdout stays reserved for command output.
pub fn init() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_twice_is_harmless() {
        init();
        init();
        tracing::warn!("logging initialized");
    }
}
