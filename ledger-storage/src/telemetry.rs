//! Tracing subscriber setup for hosts embedding the ledger store.
//!
//! The library only emits `tracing` events. Hosts that have no subscriber of
//! their own can call [`init_tracing`] once at startup.

use ledger_core::{LedgerError, LedgerResult};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Telemetry configuration from environment variables.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    /// Filter used when `RUST_LOG` is unset.
    pub default_filter: String,
    /// Emit JSON lines instead of human-readable output.
    pub json: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            default_filter: "ledger_storage=info,warn".to_string(),
            json: false,
        }
    }
}

impl TelemetryConfig {
    /// - `LEDGER_LOG_FORMAT`: "json" for JSON lines (default: text)
    /// - `LEDGER_LOG_FILTER`: fallback filter when `RUST_LOG` is unset
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            default_filter: std::env::var("LEDGER_LOG_FILTER").unwrap_or(defaults.default_filter),
            json: std::env::var("LEDGER_LOG_FORMAT")
                .map(|s| s.eq_ignore_ascii_case("json"))
                .unwrap_or(defaults.json),
        }
    }
}

/// Install a global subscriber configured from the environment.
pub fn init_tracing() -> LedgerResult<()> {
    init_tracing_with(&TelemetryConfig::from_env())
}

/// Install a global subscriber. Fails if one is already installed.
pub fn init_tracing_with(config: &TelemetryConfig) -> LedgerResult<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.default_filter));

    let json_layer = config.json.then(|| fmt::layer().json());
    let text_layer = (!config.json).then(fmt::layer);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(json_layer)
        .with(text_layer)
        .try_init()
        .map_err(|e| LedgerError::config(format!("Failed to install tracing subscriber: {}", e)))
}
