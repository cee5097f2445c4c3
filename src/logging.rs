//! Diagnostic logging with `tracing`.
//!
//! Report text goes to stdout through `println!`; logs go to stderr and stay
//! quiet unless asked for. `GLC_LOG` takes any `EnvFilter` directive and wins
//! over `--verbose`.

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

pub const LOG_ENV: &str = "GLC_LOG";

/// Filter used when `GLC_LOG` is not set
#[must_use]
pub fn default_directive(verbose: bool) -> &'static str {
    if verbose { "git_lite=debug,warn" } else { "warn" }
}

/// Install the global subscriber. Calling it twice is harmless.
pub fn init(verbose: bool) {
    let filter = EnvFilter::try_from_env(LOG_ENV)
        .unwrap_or_else(|_| EnvFilter::new(default_directive(verbose)));

    let console = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(verbose)
        .without_time();

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(console)
        .try_init();
}
