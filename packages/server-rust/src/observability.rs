//! Tracing subscriber setup.
//!
//! Initialization is guarded by `OnceLock` so repeated calls (tests, embedded
//! use) are no-ops.

use std::sync::OnceLock;

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

static TRACING_INIT: OnceLock<()> = OnceLock::new();

/// Installs the global tracing subscriber.
///
/// Filtering follows `RUST_LOG`, falling back to `default_filter`. With
/// `json` set, events are emitted as one JSON object per line.
pub fn init_tracing(default_filter: &str, json: bool) {
    TRACING_INIT.get_or_init(|| {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(default_filter));
        let registry = tracing_subscriber::registry().with(filter);
        let _ = if json {
            registry
                .with(tracing_subscriber::fmt::layer().json().with_current_span(true))
                .try_init()
        } else {
            registry.with(tracing_subscriber::fmt::layer()).try_init()
        };
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_is_idempotent() {
        init_tracing("info", false);
        init_tracing("debug", true);
        assert!(TRACING_INIT.get().is_some());
    }
}
