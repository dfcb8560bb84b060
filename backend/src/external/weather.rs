//! Current conditions from the OpenWeatherMap API

use reqwest::Client;
use serde::Deserialize;
use sniffer_shared::WeatherReport;

use super::ensure_success;
use crate::error::{AppError, AppResult};

const PROVIDER: &str = "weather";

#[derive(Clone)]
pub struct WeatherClient {
    client: Client,
    api_key: String,
    base_url: String,
}

/// OpenWeatherMap API response for current weather
#[derive(Debug, Deserialize)]
struct OWMCurrentResponse {
    #[serde(default)]
    weather: Vec<OWMWeather>,
    main: OWMMain,
}

#[derive(Debug, Deserialize)]
struct OWMWeather {
    main: String,
    description: String,
}

#[derive(Debug, Deserialize)]
struct OWMMain {
    temp: f64,
    humidity: Option<f64>,
    pressure: Option<f64>,
}

impl WeatherClient {
    pub fn new(api_key: String, base_url: String, client: Client) -> Self {
        Self {
            client,
            api_key,
            base_url,
        }
    }

    /// Current conditions with an Italian description
    pub async fn get_current_weather(&self, latitude: f64, longitude: f64) -> AppResult<WeatherReport> {
        let url = format!(
            "{}/weather?lat={}&lon={}&appid={}&units=metric&lang=it",
            self.base_url, latitude, longitude, self.api_key
        );

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| AppError::external(PROVIDER, format!("Request failed: {}", e)))?;
        let response = ensure_success(PROVIDER, response).await?;

        let data: OWMCurrentResponse = response
            .json()
            .await
            .map_err(|e| AppError::external(PROVIDER, format!("Failed to parse response: {}", e)))?;

        Ok(convert_current_response(data))
    }
}

fn convert_current_response(data: OWMCurrentResponse) -> WeatherReport {
    let weather = data.weather.first();
    let description = weather.map(|w| w.description.as_str()).unwrap_or("n/d");

    WeatherReport {
        description: format!("{}, {}°C", description, data.main.temp.round()),
        temperature: Some(data.main.temp),
        humidity: data.main.humidity,
        pressure: data.main.pressure,
        condition: weather.map(|w| w.main.to_lowercase()),
        live: true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_convert_current_response() {
        let data: OWMCurrentResponse = serde_json::from_str(
            r#"{
                "weather": [{"id": 500, "main": "Rain", "description": "pioggia leggera", "icon": "10d"}],
                "main": {"temp": 13.6, "feels_like": 12.9, "pressure": 1012, "humidity": 88}
            }"#,
        )
        .unwrap();

        let report = convert_current_response(data);
        assert_eq!(report.description, "pioggia leggera, 14°C");
        assert_eq!(report.humidity, Some(88.0));
        assert_eq!(report.condition.as_deref(), Some("rain"));
        assert!(report.live);
    }
}
