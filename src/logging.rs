//! Diagnostic logging setup
//!
//! Log lines go to stderr so stdout stays a clean stream of JSON envelopes.

use tracing_subscriber::EnvFilter;

/// Environment variable holding an `EnvFilter` directive, e.g. `conta_certa=debug`
pub const LOG_ENV: &str = "CONTA_CERTA_LOG";

fn default_directive(verbose: bool) -> &'static str {
    if verbose {
        "debug"
    } else {
        "warn"
    }
}

/// Install the global fmt subscriber
///
/// `--verbose` raises the fallback level to `debug`; an explicit
/// `CONTA_CERTA_LOG` always wins. Calling this twice is harmless.
pub fn init(verbose: bool) {
    let filter = EnvFilter::try_from_env(LOG_ENV)
        .unwrap_or_else(|_| EnvFilter::new(default_directive(verbose)));

    let _ = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}
