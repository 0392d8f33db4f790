use std::time::Duration;

use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};

use crate::messaging::FailurePolicy;
use crate::utils::RetryPolicy;

// ============================================================================
// Settings
// ============================================================================
//
// Layered, later wins:
//   built-in defaults -> storefront.toml (optional) -> STOREFRONT__* env vars
//
// Nested keys use `__` in env vars, e.g. STOREFRONT__BUS__TRANSPORT=queued
//
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub http: HttpSettings,
    /// Default tracing filter; `RUST_LOG` overrides it
    pub log_filter: String,
    pub bus: BusSettings,
    pub shipping: ShippingSettings,
    pub dead_letters: DeadLetterSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HttpSettings {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Transport {
    InProcess,
    Queued,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BusSettings {
    pub transport: Transport,
    /// Only used by the in-process transport
    pub failure_policy: FailurePolicy,
    pub queue_capacity: usize,
    pub retry: RetrySettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RetrySettings {
    pub max_attempts: u32,
    pub initial_delay_ms: u64,
    pub max_delay_ms: u64,
    pub multiplier: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ShippingSettings {
    pub surcharge_percent: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DeadLetterSettings {
    pub capacity: usize,
}

impl RetrySettings {
    pub fn policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.max_attempts,
            initial_delay: Duration::from_millis(self.initial_delay_ms),
            max_delay: Duration::from_millis(self.max_delay_ms),
            multiplier: self.multiplier,
        }
    }
}

impl Settings {
    /// Load from defaults, `storefront.toml` and the environment
    pub fn load() -> Result<Self, ConfigError> {
        Self::builder()?
            .add_source(File::with_name("storefront").required(false))
            .add_source(
                Environment::with_prefix("STOREFRONT")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }

    pub fn defaults() -> Result<Self, ConfigError> {
        Self::builder()?.build()?.try_deserialize()
    }

    /// Defaults overlaid with a TOML document
    pub fn from_toml(toml: &str) -> Result<Self, ConfigError> {
        Self::builder()?
            .add_source(File::from_str(toml, FileFormat::Toml))
            .build()?
            .try_deserialize()
    }

    fn builder() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
        Config::builder()
            .set_default("http.host", "127.0.0.1")?
            .set_default("http.port", 8080_i64)?
            .set_default("log_filter", "info,storefront=debug")?
            .set_default("bus.transport", "in_process")?
            .set_default("bus.failure_policy", "isolate")?
            .set_default("bus.queue_capacity", 256_i64)?
            .set_default("bus.retry.max_attempts", 3_i64)?
            .set_default("bus.retry.initial_delay_ms", 100_i64)?
            .set_default("bus.retry.max_delay_ms", 5_000_i64)?
            .set_default("bus.retry.multiplier", 2.0)?
            .set_default("shipping.surcharge_percent", 20_i64)?
            .set_default("dead_letters.capacity", crate::actors::DEFAULT_CAPACITY as i64)
    }
}
