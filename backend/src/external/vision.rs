//! Label detection through the Google Cloud Vision API

use base64::{engine::general_purpose::STANDARD, Engine as _};
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use sniffer_shared::PhotoLabel;

use super::ensure_success;
use crate::error::{AppError, AppResult};

const PROVIDER: &str = "vision";
const MAX_LABELS: u32 = 20;

static DATA_URL_PREFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^data:image/[a-z]+;base64,").expect("Valid data URL regex"));

#[derive(Clone)]
pub struct VisionClient {
    client: Client,
    api_key: String,
    base_url: String,
}

#[derive(Debug, Serialize)]
struct AnnotateRequest<'a> {
    requests: Vec<AnnotateImage<'a>>,
}

#[derive(Debug, Serialize)]
struct AnnotateImage<'a> {
    image: ImageContent<'a>,
    features: Vec<Feature>,
}

#[derive(Debug, Serialize)]
struct ImageContent<'a> {
    content: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Feature {
    #[serde(rename = "type")]
    kind: &'static str,
    max_results: u32,
}

#[derive(Debug, Deserialize)]
struct AnnotateResponse {
    #[serde(default)]
    responses: Vec<ImageAnnotations>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ImageAnnotations {
    #[serde(default)]
    label_annotations: Vec<PhotoLabel>,
}

/// Raw base64 payload of a photo sent as a data URL or as bare base64
pub fn strip_data_url(photo: &str) -> &str {
    match DATA_URL_PREFIX.find(photo) {
        Some(prefix) => &photo[prefix.end()..],
        None => photo,
    }
}

impl VisionClient {
    pub fn new(api_key: String, base_url: String, client: Client) -> Self {
        Self {
            client,
            api_key,
            base_url,
        }
    }

    /// Labels detected in the photo, most confident first
    pub async fn get_photo_labels(&self, photo: &str) -> AppResult<Vec<PhotoLabel>> {
        let content = strip_data_url(photo);
        STANDARD
            .decode(content)
            .map_err(|e| AppError::external(PROVIDER, format!("Photo is not base64: {}", e)))?;

        let url = format!("{}/images:annotate?key={}", self.base_url, self.api_key);
        let body = AnnotateRequest {
            requests: vec![AnnotateImage {
                image: ImageContent { content },
                features: vec![Feature {
                    kind: "LABEL_DETECTION",
                    max_results: MAX_LABELS,
                }],
            }],
        };

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::external(PROVIDER, format!("Request failed: {}", e)))?;
        let response = ensure_success(PROVIDER, response).await?;

        let data: AnnotateResponse = response
            .json()
            .await
            .map_err(|e| AppError::external(PROVIDER, format!("Failed to parse response: {}", e)))?;

        Ok(data
            .responses
            .into_iter()
            .next()
            .map(|r| r.label_annotations)
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_data_url() {
        assert_eq!(strip_data_url("data:image/jpeg;base64,QUJD"), "QUJD");
        assert_eq!(strip_data_url("data:image/png;base64,QUJD"), "QUJD");
        assert_eq!(strip_data_url("QUJD"), "QUJD");
    }

    #[test]
    fn test_request_shape() {
        let body = AnnotateRequest {
            requests: vec![AnnotateImage {
                image: ImageContent { content: "QUJD" },
                features: vec![Feature {
                    kind: "LABEL_DETECTION",
                    max_results: MAX_LABELS,
                }],
            }],
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["requests"][0]["features"][0]["type"], "LABEL_DETECTION");
        assert_eq!(json["requests"][0]["features"][0]["maxResults"], 20);
        assert_eq!(json["requests"][0]["image"]["content"], "QUJD");
    }

    #[test]
    fn test_parse_labels() {
        let data: AnnotateResponse = serde_json::from_str(
            r#"{"responses":[{"labelAnnotations":[
                {"mid":"/m/05s2s","description":"Moss","score":0.93,"topicality":0.93},
                {"mid":"/m/07j7r","description":"Tree","score":0.41,"topicality":0.41}
            ]}]}"#,
        )
        .unwrap();
        let labels = &data.responses[0].label_annotations;
        assert_eq!(labels.len(), 2);
        assert_eq!(labels[0].description, "Moss");
    }
}
