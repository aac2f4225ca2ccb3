//! Logging initialization.
//!
//! The library only emits `tracing` events; the binary installs a subscriber
//! once at startup. Logs go to stderr so `fetch` can stream image bytes on
//! stdout. `RUST_LOG` overrides the configured filter.

use std::sync::Once;
use tracing_subscriber::EnvFilter;

/// Default filter when neither `RUST_LOG` nor the config sets one.
pub const DEFAULT_FILTER: &str = "imgvar=info";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human-readable lines
    #[default]
    Pretty,
    /// One JSON object per event
    Json,
}

static INIT_ONCE: Once = Once::new();

/// Install the global subscriber. Later calls are no-ops.
pub fn init(format: LogFormat, filter: &str) {
    INIT_ONCE.call_once(|| {
        let filter = EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new(filter))
            .unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
        let builder = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr);
        // Another subscriber may already be installed (e.g. by a test harness).
        let _ = match format {
            LogFormat::Pretty => builder.try_init(),
            LogFormat::Json => builder.json().try_init(),
        };
    });
}
