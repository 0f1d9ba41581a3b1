//! Stderr diagnostics for the engine.
//!
//! What gets logged where:
//! - path guard rejections and failed actions: `warn`
//! - command spawns and exit codes: `info`/`debug`; timeouts and truncated
//!   output: `warn`
//! - state file reads and writes under `.neuralcode/`: `debug`
//! - turn state that could not be persisted after actions ran: `warn`
//!
//! Result lines on stdout never go through here.

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Level used when `RUST_LOG` is unset or unparsable.
pub const DEFAULT_FILTER: &str = "warn";

/// Install the global subscriber: compact lines on stderr, filtered by
/// `RUST_LOG`.
///
/// ```bash
/// RUST_LOG=neuralcode::io=debug neuralcode apply reply.md
/// ```
pub fn init() {
    let filter = filter_from(std::env::var("RUST_LOG").ok().as_deref());
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).compact())
        .init();
}

fn filter_from(directives: Option<&str>) -> EnvFilter {
    directives
        .filter(|d| !d.trim().is_empty())
        .and_then(|d| EnvFilter::try_new(d).ok())
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_FILTER))
}
