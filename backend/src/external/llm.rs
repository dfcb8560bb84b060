//! Text analysis through the Anthropic Messages API
//!
//! The model is asked for a JSON object. Replies that are not JSON are
//! used verbatim as the analysis, with the probability read from the text.

use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sniffer_shared::{PhotoLabel, SensorReading, Target, TextAnalysis, WeatherReport};

use super::ensure_success;
use crate::error::{AppError, AppResult};

const PROVIDER: &str = "llm";
const ANTHROPIC_VERSION: &str = "2023-06-01";

const DEFAULT_PROBABILITY: f64 = 50.0;
const JSON_CONFIDENCE: u8 = 85;
const TEXT_CONFIDENCE: u8 = 80;
const JSON_SUGGESTIONS: &str = "Continua la ricerca nella zona.";
const TEXT_SUGGESTIONS: &str = "Analizza le condizioni locali e continua la ricerca.";

static JSON_OBJECT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{[\s\S]*\}").expect("Valid JSON object regex"));
static PROBABILITY_IN_TEXT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)probabilità[^\d]*(\d+)").expect("Valid probability regex"));

#[derive(Clone)]
pub struct LlmClient {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
    max_tokens: u32,
}

/// Evidence collected for one scan
pub struct PromptInput<'a> {
    pub target: &'a Target,
    pub latitude: f64,
    pub longitude: f64,
    pub elevation: f64,
    pub weather: &'a WeatherReport,
    pub labels: &'a [PhotoLabel],
    pub sensor: Option<&'a SensorReading>,
}

#[derive(Debug, Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    messages: Vec<Message>,
}

#[derive(Debug, Serialize)]
struct Message {
    role: &'static str,
    content: String,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(default)]
    text: Option<String>,
}

impl LlmClient {
    pub fn new(
        api_key: String,
        base_url: String,
        model: String,
        max_tokens: u32,
        client: Client,
    ) -> Self {
        Self {
            client,
            api_key,
            base_url,
            model,
            max_tokens,
        }
    }

    pub async fn get_text_analysis(&self, input: &PromptInput<'_>) -> AppResult<TextAnalysis> {
        let body = MessagesRequest {
            model: &self.model,
            max_tokens: self.max_tokens,
            messages: vec![Message {
                role: "user",
                content: build_prompt(input),
            }],
        };

        let response = self
            .client
            .post(format!("{}/messages", self.base_url))
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::external(PROVIDER, format!("Request failed: {}", e)))?;
        let response = ensure_success(PROVIDER, response).await?;

        let data: MessagesResponse = response
            .json()
            .await
            .map_err(|e| AppError::external(PROVIDER, format!("Failed to parse response: {}", e)))?;

        let text = data
            .content
            .into_iter()
            .find_map(|block| block.text)
            .ok_or_else(|| AppError::external(PROVIDER, "response has no text block"))?;

        Ok(parse_analysis(&text))
    }
}

pub fn build_prompt(input: &PromptInput<'_>) -> String {
    let target = input.target.display_name();
    let mut prompt = format!(
        "Analizza le condizioni per la ricerca di {} in base a questi dati reali:\n\n\
         POSIZIONE:\n\
         - Coordinate: {}, {}\n\
         - Altitudine: {}m\n\
         - Meteo: {}",
        target, input.latitude, input.longitude, input.elevation, input.weather.description
    );

    if input.weather.live {
        if let Some(temperature) = input.weather.temperature {
            prompt.push_str(&format!("\n- Temperatura: {}°C", temperature));
        }
        if let Some(humidity) = input.weather.humidity {
            prompt.push_str(&format!("\n- Umidità: {}%", humidity));
        }
        if let Some(pressure) = input.weather.pressure {
            prompt.push_str(&format!("\n- Pressione: {}hPa", pressure));
        }
    }

    if !input.labels.is_empty() {
        let labels: Vec<String> = input
            .labels
            .iter()
            .map(|l| format!("{} ({}%)", l.description, (l.score * 100.0).round()))
            .collect();
        prompt.push_str(&format!(
            "\n\nANALISI FOTO:\nElementi rilevati: {}",
            labels.join(", ")
        ));
    }

    if let Some(sensor) = input.sensor {
        prompt.push_str(&format!(
            "\n\nDATI SENSORI:\n- VOC: {} ppm\n- Gas: {} Ω\n- Umidità sensore: {}%",
            sensor.voc, sensor.gas, sensor.humidity
        ));
        if let Some(temp) = sensor.temp {
            prompt.push_str(&format!("\n- Temperatura sensore: {}°C", temp));
        }
    }

    prompt.push_str(&format!(
        "\n\nFornisci un'analisi dettagliata che includa:\n\
         1. Probabilità di trovare {} (0-100%)\n\
         2. Spiegazione delle condizioni\n\
         3. Suggerimenti specifici per la ricerca\n\
         4. Specie probabili per questa zona e stagione\n\n\
         Rispondi in formato JSON con: probability, analysis, suggestions, species",
        target
    ));
    prompt
}

/// Reads a model reply as JSON when it contains an object, as text otherwise
pub fn parse_analysis(text: &str) -> TextAnalysis {
    let json = JSON_OBJECT
        .find(text)
        .and_then(|m| serde_json::from_str::<Value>(m.as_str()).ok())
        .filter(Value::is_object);

    match json {
        Some(object) => TextAnalysis {
            probability: number(&object["probability"]).unwrap_or(DEFAULT_PROBABILITY),
            analysis: non_empty_string(&object["analysis"]).unwrap_or_else(|| text.to_string()),
            suggestions: Some(
                non_empty_string(&object["suggestions"])
                    .unwrap_or_else(|| JSON_SUGGESTIONS.to_string()),
            ),
            species: Some(string_list(&object["species"])),
            confidence: JSON_CONFIDENCE,
        },
        None => TextAnalysis {
            probability: PROBABILITY_IN_TEXT
                .captures(text)
                .and_then(|c| c.get(1))
                .and_then(|m| m.as_str().parse::<f64>().ok())
                .unwrap_or(DEFAULT_PROBABILITY),
            analysis: text.to_string(),
            suggestions: Some(TEXT_SUGGESTIONS.to_string()),
            species: Some(Vec::new()),
            confidence: TEXT_CONFIDENCE,
        },
    }
}

fn number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().trim_end_matches('%').parse().ok(),
        _ => None,
    }
}

fn non_empty_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Array(_) => Some(string_list(value).join(" ")).filter(|s| !s.is_empty()),
        _ => None,
    }
}

fn string_list(value: &Value) -> Vec<String> {
    match value {
        Value::Array(items) => items
            .iter()
            .filter_map(|i| i.as_str().map(str::to_string))
            .collect(),
        Value::String(s) => s
            .split(',')
            .map(|p| p.trim().to_string())
            .filter(|p| !p.is_empty())
            .collect(),
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_json_reply() {
        let reply = r#"Ecco la mia analisi:
{"probability": 72, "analysis": "Bosco umido e ombroso.", "suggestions": "Cerca sotto i faggi.", "species": ["Boletus edulis", "Cantharellus cibarius"]}
Buona fortuna!"#;
        let analysis = parse_analysis(reply);
        assert_eq!(analysis.probability, 72.0);
        assert_eq!(analysis.analysis, "Bosco umido e ombroso.");
        assert_eq!(analysis.suggestions.as_deref(), Some("Cerca sotto i faggi."));
        assert_eq!(analysis.species.unwrap().len(), 2);
        assert_eq!(analysis.confidence, 85);
    }

    #[test]
    fn test_parse_json_reply_defaults() {
        let analysis = parse_analysis(r#"{"analysis": ""}"#);
        assert_eq!(analysis.probability, 50.0);
        assert_eq!(analysis.analysis, r#"{"analysis": ""}"#);
        assert_eq!(analysis.suggestions.as_deref(), Some(JSON_SUGGESTIONS));
        assert_eq!(analysis.species, Some(vec![]));
    }

    #[test]
    fn test_parse_text_reply() {
        let analysis = parse_analysis("La Probabilità stimata è del 64% grazie alle piogge.");
        assert_eq!(analysis.probability, 64.0);
        assert_eq!(analysis.suggestions.as_deref(), Some(TEXT_SUGGESTIONS));
        assert_eq!(analysis.confidence, 80);
    }

    #[test]
    fn test_parse_text_reply_without_number() {
        let analysis = parse_analysis("Condizioni incerte {non json}");
        assert_eq!(analysis.probability, 50.0);
        assert_eq!(analysis.analysis, "Condizioni incerte {non json}");
    }

    #[test]
    fn test_prompt_mentions_evidence() {
        let weather = WeatherReport {
            description: "pioggia leggera, 12°C".to_string(),
            temperature: Some(12.0),
            humidity: Some(90.0),
            pressure: Some(1010.0),
            condition: Some("rain".to_string()),
            live: true,
        };
        let labels = vec![PhotoLabel {
            description: "Moss".to_string(),
            score: 0.91,
        }];
        let sensor = SensorReading {
            voc: 0.8,
            gas: 12000.0,
            humidity: 75.0,
            temp: Some(11.5),
        };
        let prompt = build_prompt(&PromptInput {
            target: &Target::Funghi,
            latitude: 45.6,
            longitude: 11.0,
            elevation: 1100.0,
            weather: &weather,
            labels: &labels,
            sensor: Some(&sensor),
        });
        assert!(prompt.contains("Altitudine: 1100m"));
        assert!(prompt.contains("Umidità: 90%"));
        assert!(prompt.contains("Moss (91%)"));
        assert!(prompt.contains("VOC: 0.8 ppm"));
        assert!(prompt.ends_with("probability, analysis, suggestions, species"));
    }
}
