//! Diagnostic logging to stderr
//!
//! User-facing messages go through [`crate::output::Output`]; this is only for
//! tracing the framework itself. The filter comes from `TINYSCRIPT_LOG`
//! (`debug`, `tinyscript::task=debug`, ...) and defaults to `warn`.

use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Layer};

pub const LOG_ENV: &str = "TINYSCRIPT_LOG";

fn filter() -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"))
}

/// Installs the global subscriber. A second call is a no-op.
pub fn setup_logging() {
    let layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_filter(filter());

    if tracing_subscriber::registry().with(layer).try_init().is_ok() {
        tracing::debug!("logging initialised");
    }
}
