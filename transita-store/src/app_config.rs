use serde::Deserialize;
use std::env;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub queue: QueueSettings,
    pub events: EventBusSettings,
    pub email: EmailSettings,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct QueueSettings {
    pub visibility_timeout_seconds: u64,
    pub dedup_window_seconds: u64,
    pub max_receive_count: u32,
    #[serde(default = "default_poll_timeout")]
    pub poll_timeout_seconds: u64,
}

fn default_poll_timeout() -> u64 {
    1
}

#[derive(Debug, Deserialize, Clone)]
pub struct EventBusSettings {
    pub max_delivery_attempts: u32,
    pub retry_base_ms: u64,
    pub archive_retention_days: i64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct EmailSettings {
    pub sender: String,
    pub customer_support: String,
    /// Opaque credential handed to the notification relay, never parsed.
    pub credential: String,
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = config::Config::builder()
            // Start off by merging in the "default" configuration file
            .add_source(config::File::with_name("config/default"))
            // Add in the current environment file
            // Default to 'development' env
            // Note that this file is _optional_
            .add_source(config::File::with_name(&format!("config/{}", run_mode)).required(false))
            // Add in a local configuration file
            // This file shouldn't be checked in to git
            .add_source(config::File::with_name("config/local").required(false))
            // Add in settings from the environment (with a prefix of TRANSITA)
            .add_source(config::Environment::with_prefix("TRANSITA").separator("__"))
            .build()?;

        s.try_deserialize()
    }
}
