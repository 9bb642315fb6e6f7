//! Tracing setup for the heartdb CLI
//!
//! Usage:
//!   heartdb --debug ...                 # Debug logging to stderr
//!   RUST_LOG=heartdb_store=debug heartdb  # Fine-grained log control
//!
//! Environment variables:
//!   RUST_LOG      # Log filter, wins over everything else
//!   HEARTDB_LOG   # Fallback level (also `[logging] level` in config.toml)
//!
//! Logs go to stderr so command output on stdout stays machine-readable.
//!
//! Tracing starts before `.env` and config.toml are read so their events are
//! not lost. The filter sits behind a reload layer and is swapped once the
//! configured level is known.

use anyhow::{anyhow, Result};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{reload, EnvFilter, Registry};

/// Tracing configuration options
#[derive(Debug, Clone, Default)]
pub struct TracingConfig {
    /// Enable debug logging (sets the level to debug if RUST_LOG is not set)
    pub debug: bool,
    /// Level from configuration, used when RUST_LOG is not set
    pub level: Option<String>,
}

impl TracingConfig {
    fn fallback_filter(&self) -> EnvFilter {
        if self.debug {
            return EnvFilter::new("debug");
        }
        self.level
            .as_deref()
            .and_then(|level| EnvFilter::try_new(level).ok())
            .unwrap_or_else(|| EnvFilter::new("info"))
    }

    fn filter(&self) -> EnvFilter {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| self.fallback_filter())
    }
}

/// Live handle on the installed filter.
pub struct TracingHandle {
    filter: reload::Handle<EnvFilter, Registry>,
}

impl TracingHandle {
    /// Swap in the filter for `config`. `RUST_LOG` still wins, including one
    /// that only arrived through a `.env` file.
    pub fn apply(&self, config: &TracingConfig) -> Result<()> {
        self.filter
            .reload(config.filter())
            .map_err(|err| anyhow!("failed to update log filter: {err}"))
    }
}

/// Initialize console tracing with a reloadable filter.
pub fn init(config: &TracingConfig) -> Result<TracingHandle> {
    let (filter, handle) = reload::Layer::new(config.filter());

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(config.debug) // Show targets in debug mode
        .with_writer(std::io::stderr)
        .compact();

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init()
        .map_err(|err| anyhow!(err))?;

    Ok(TracingHandle { filter: handle })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_flag_beats_configured_level() {
        let config = TracingConfig {
            debug: true,
            level: Some("warn".into()),
        };
        assert_eq!(config.fallback_filter().to_string(), "debug");
    }

    #[test]
    fn unparseable_level_falls_back_to_info() {
        let config = TracingConfig {
            debug: false,
            level: Some("heartdb_store=loud".into()),
        };
        assert_eq!(config.fallback_filter().to_string(), "info");
    }

    #[test]
    fn apply_swaps_the_live_filter() {
        let (filter, handle) = reload::Layer::new(EnvFilter::new("info"));
        // The handle only works while the subscriber holding the layer lives.
        let _subscriber = tracing_subscriber::registry().with(filter);
        let tracing = TracingHandle { filter: handle };

        tracing
            .apply(&TracingConfig {
                debug: true,
                level: None,
            })
            .unwrap();

        let current = tracing.filter.with_current(|f| f.to_string()).unwrap();
        // RUST_LOG from the test environment takes precedence when set.
        if std::env::var_os("RUST_LOG").is_none() {
            assert_eq!(current, "debug");
        }
    }
}
