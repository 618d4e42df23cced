use tracing_subscriber::{EnvFilter, fmt};

/// Env var holding a tracing filter directive, e.g. `CPA_LOG=cpa_hooks=debug`.
pub const LOG_ENV: &str = "CPA_LOG";

/// Install the stderr subscriber. stdout stays clean for `report` output.
pub fn init_logging(debug: bool) {
    let level = if debug { "debug" } else { "info" };
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(level));

    // a global subscriber may already be installed (integration tests)
    let _ = fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .try_init();
}
