//! Logging initialization for the command line tool

use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt;
use tracing_subscriber::prelude::*;

/// Filter used when `RUST_LOG` is not set
const DEFAULT_FILTER: &str = "info,reqwest=warn,hyper=warn";

/// Install a stderr `fmt` subscriber so stdout only carries command output.
pub fn setup_logging(verbose: bool) {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) if verbose => EnvFilter::new("debug,reqwest=info,hyper=warn"),
        Err(_) => EnvFilter::new(DEFAULT_FILTER),
    };

    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_filter(filter);
    tracing_subscriber::registry().with(fmt_layer).init();

    tracing::debug!("Logging initialized");
}
