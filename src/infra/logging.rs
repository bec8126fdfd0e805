//! Tracing subscriber setup for the binary.

use tracing_subscriber::EnvFilter;

/// Environment variable holding the log filter directive
pub const LOG_ENV: &str = "FKIT_LOG";

/// Filter used when `FKIT_LOG` is unset or invalid.
pub fn default_directive(quiet: bool) -> &'static str {
    if quiet { "error" } else { "warn" }
}

/// Install the global subscriber: `FKIT_LOG` filter, stderr output.
/// `--quiet` forces `error` regardless of the environment.
pub fn init_tracing(quiet: bool) {
    let fallback = default_directive(quiet);
    let filter = if quiet {
        EnvFilter::new(fallback)
    } else {
        EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(fallback))
    };

    // A second init (tests, embedding) is not an error worth surfacing.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
