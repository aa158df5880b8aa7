//! Log output for the `lookbook` binary.

use tracing_subscriber::EnvFilter;

/// Install the global `tracing` subscriber.
///
/// Logs go to stderr so stdout stays clean for rendered results. The filter
/// defaults to `warn` (or `debug` with `verbose`) and `RUST_LOG` overrides it.
pub fn init(verbose: bool) {
    let default_level = if verbose { "lookbook=debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .try_init();
}
