//! External data providers
//!
//! Every provider is optional. A client exists only when its API key is
//! configured; callers fall back to local estimates on any error.

use std::time::Duration;

use reqwest::{Client, Response};

use crate::config::ProvidersConfig;
use crate::error::{AppError, AppResult};

pub mod elevation;
pub mod llm;
pub mod vision;
pub mod weather;

pub use elevation::ElevationClient;
pub use llm::LlmClient;
pub use vision::VisionClient;
pub use weather::WeatherClient;

/// The configured provider clients
#[derive(Clone, Default)]
pub struct Providers {
    pub elevation: Option<ElevationClient>,
    pub weather: Option<WeatherClient>,
    pub vision: Option<VisionClient>,
    pub llm: Option<LlmClient>,
}

impl Providers {
    /// Providers with no clients; every lookup uses its fallback
    pub fn disabled() -> Self {
        Self::default()
    }

    pub fn from_config(config: &ProvidersConfig) -> AppResult<Self> {
        let elevation = match &config.elevation.api_key {
            Some(key) => Some(ElevationClient::new(
                key.clone(),
                config.elevation.base_url.clone(),
                http_client(config.elevation.timeout_secs)?,
            )),
            None => None,
        };
        let weather = match &config.weather.api_key {
            Some(key) => Some(WeatherClient::new(
                key.clone(),
                config.weather.base_url.clone(),
                http_client(config.weather.timeout_secs)?,
            )),
            None => None,
        };
        let vision = match &config.vision.api_key {
            Some(key) => Some(VisionClient::new(
                key.clone(),
                config.vision.base_url.clone(),
                http_client(config.vision.timeout_secs)?,
            )),
            None => None,
        };
        let llm = match &config.llm.api_key {
            Some(key) => Some(LlmClient::new(
                key.clone(),
                config.llm.base_url.clone(),
                config.llm.model.clone(),
                config.llm.max_tokens,
                http_client(config.llm.timeout_secs)?,
            )),
            None => None,
        };

        Ok(Self {
            elevation,
            weather,
            vision,
            llm,
        })
    }

    /// Names of the providers with a client, for the startup log
    pub fn enabled(&self) -> Vec<&'static str> {
        let mut names = Vec::new();
        if self.elevation.is_some() {
            names.push("elevation");
        }
        if self.weather.is_some() {
            names.push("weather");
        }
        if self.vision.is_some() {
            names.push("vision");
        }
        if self.llm.is_some() {
            names.push("llm");
        }
        names
    }
}

/// HTTP client with a request timeout
pub fn http_client(timeout_secs: u64) -> AppResult<Client> {
    Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| AppError::Internal(format!("Failed to create HTTP client: {}", e)))
}

/// Turns a non-2xx response into an error carrying the body
async fn ensure_success(provider: &str, response: Response) -> AppResult<Response> {
    if response.status().is_success() {
        return Ok(response);
    }
    let status = response.status();
    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "Unknown error".to_string());
    Err(AppError::external(
        provider,
        format!("API returned {}: {}", status, body),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_keys_no_clients() {
        let config = crate::config::Config::from_defaults().unwrap();
        let providers = Providers::from_config(&config.providers).unwrap();
        assert!(providers.enabled().is_empty());
    }

    #[test]
    fn test_keyed_provider_is_enabled() {
        let mut config = crate::config::Config::from_defaults().unwrap();
        config.providers.weather.api_key = Some("key".to_string());
        let providers = Providers::from_config(&config.providers).unwrap();
        assert_eq!(providers.enabled(), vec!["weather"]);
    }
}
