//! Configuration management for the Sniffer server
//!
//! Supports hierarchical configuration loading:
//! 1. Default values in code
//! 2. Configuration files (config/development.toml, config/production.toml)
//! 3. Environment variable overrides with SNIFFER_ prefix

use config::{ConfigError, Environment, File};
use serde::Deserialize;

/// Main application configuration
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Current environment (development, production)
    pub environment: String,

    /// Server configuration
    pub server: ServerConfig,

    /// Database configuration
    pub database: DatabaseConfig,

    /// External data providers
    pub providers: ProvidersConfig,

    /// Scoring engine configuration
    pub scoring: ScoringConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    /// Server port
    pub port: u16,

    /// Server host
    pub host: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL; the in-memory store is used without one
    pub url: Option<String>,

    /// Maximum number of connections in the pool
    pub max_connections: u32,

    /// Minimum number of connections in the pool
    pub min_connections: u32,

    /// Run migrations at startup
    pub run_migrations: bool,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ProvidersConfig {
    pub elevation: ProviderConfig,
    pub weather: ProviderConfig,
    pub vision: ProviderConfig,
    pub llm: LlmConfig,
}

/// A keyed HTTP provider; disabled while `api_key` is unset
#[derive(Debug, Deserialize, Clone)]
pub struct ProviderConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LlmConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    pub timeout_secs: u64,
    pub model: String,
    pub max_tokens: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ScoringConfig {
    /// Fixed RNG seed for reproducible scoring
    pub seed: Option<u64>,

    /// Maximum records returned by dashboard listings
    pub dashboard_limit: i64,
}

impl Config {
    /// Load configuration from files and environment variables
    pub fn load() -> Result<Self, ConfigError> {
        let environment =
            std::env::var("SNIFFER_ENVIRONMENT").unwrap_or_else(|_| "development".into());

        let config = Self::defaults(config::Config::builder(), &environment)?
            // Load environment-specific config file
            .add_source(File::with_name(&format!("config/{}", environment)).required(false))
            // Override with environment variables (SNIFFER_ prefix)
            .add_source(
                Environment::with_prefix("SNIFFER")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    /// Configuration from code defaults only
    pub fn from_defaults() -> Result<Self, ConfigError> {
        Self::defaults(config::Config::builder(), "test")?
            .build()?
            .try_deserialize()
    }

    fn defaults(
        builder: config::ConfigBuilder<config::builder::DefaultState>,
        environment: &str,
    ) -> Result<config::ConfigBuilder<config::builder::DefaultState>, ConfigError> {
        builder
            .set_default("environment", environment)?
            .set_default("server.port", 3000)?
            .set_default("server.host", "0.0.0.0")?
            .set_default("database.max_connections", 10)?
            .set_default("database.min_connections", 2)?
            .set_default("database.run_migrations", true)?
            .set_default(
                "providers.elevation.base_url",
                "https://maps.googleapis.com/maps/api/elevation/json",
            )?
            .set_default("providers.elevation.timeout_secs", 5)?
            .set_default(
                "providers.weather.base_url",
                "https://api.openweathermap.org/data/2.5",
            )?
            .set_default("providers.weather.timeout_secs", 5)?
            .set_default(
                "providers.vision.base_url",
                "https://vision.googleapis.com/v1",
            )?
            .set_default("providers.vision.timeout_secs", 10)?
            .set_default("providers.llm.base_url", "https://api.anthropic.com/v1")?
            .set_default("providers.llm.timeout_secs", 30)?
            .set_default("providers.llm.model", "claude-3-sonnet-20240229")?
            .set_default("providers.llm.max_tokens", 1000)?
            .set_default("scoring.dashboard_limit", 200)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 3000,
            host: "0.0.0.0".to_string(),
        }
    }
}
