//! Elevation lookup through the Google Elevation API

use reqwest::Client;
use serde::Deserialize;

use super::ensure_success;
use crate::error::{AppError, AppResult};

const PROVIDER: &str = "elevation";

#[derive(Clone)]
pub struct ElevationClient {
    client: Client,
    api_key: String,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct ElevationResponse {
    status: String,
    #[serde(default)]
    results: Vec<ElevationResult>,
}

#[derive(Debug, Deserialize)]
struct ElevationResult {
    elevation: f64,
}

impl ElevationClient {
    pub fn new(api_key: String, base_url: String, client: Client) -> Self {
        Self {
            client,
            api_key,
            base_url,
        }
    }

    /// Meters above sea level, rounded to the nearest meter
    pub async fn get_elevation(&self, latitude: f64, longitude: f64) -> AppResult<f64> {
        let url = format!(
            "{}?locations={},{}&key={}",
            self.base_url, latitude, longitude, self.api_key
        );

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| AppError::external(PROVIDER, format!("Request failed: {}", e)))?;
        let response = ensure_success(PROVIDER, response).await?;

        let data: ElevationResponse = response
            .json()
            .await
            .map_err(|e| AppError::external(PROVIDER, format!("Failed to parse response: {}", e)))?;

        parse_elevation(data)
    }
}

fn parse_elevation(data: ElevationResponse) -> AppResult<f64> {
    if data.status != "OK" {
        return Err(AppError::external(PROVIDER, format!("status {}", data.status)));
    }
    data.results
        .first()
        .map(|r| r.elevation.round())
        .ok_or_else(|| AppError::external(PROVIDER, "empty result set"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_elevation_rounds() {
        let data: ElevationResponse = serde_json::from_str(
            r#"{"status":"OK","results":[{"elevation":1234.56,"resolution":9.5}]}"#,
        )
        .unwrap();
        assert_eq!(parse_elevation(data).unwrap(), 1235.0);
    }

    #[test]
    fn test_parse_elevation_rejects_error_status() {
        let data: ElevationResponse =
            serde_json::from_str(r#"{"status":"REQUEST_DENIED","results":[]}"#).unwrap();
        assert!(parse_elevation(data).is_err());

        let data: ElevationResponse = serde_json::from_str(r#"{"status":"OK"}"#).unwrap();
        assert!(parse_elevation(data).is_err());
    }
}
