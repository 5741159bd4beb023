//! Tracing initialization.

use std::sync::Once;

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use adsopt_core::config::ObservabilityConfig;

static INIT: Once = Once::new();

/// Install the global subscriber.
///
/// `RUST_LOG` wins when set and valid; otherwise `config.log_level` is used,
/// falling back to `info`. Idempotent, and a no-op if the host process already
/// installed a subscriber.
pub fn init_tracing(config: &ObservabilityConfig) {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new(&config.log_level))
            .unwrap_or_else(|_| EnvFilter::new("info"));

        let result = if config.json {
            tracing_subscriber::registry()
                .with(fmt::layer().json().with_target(true).with_current_span(false))
                .with(filter)
                .try_init()
        } else {
            tracing_subscriber::registry()
                .with(fmt::layer().with_target(true).with_thread_ids(true))
                .with(filter)
                .try_init()
        };
        if let Err(e) = result {
            tracing::debug!(error = %e, "tracing subscriber already installed");
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_is_idempotent() {
        let config = ObservabilityConfig::default();
        init_tracing(&config);
        init_tracing(&ObservabilityConfig {
            log_level: "not a [valid filter".to_string(),
            json: true,
        });
        tracing::info!("still logging");
    }
}
