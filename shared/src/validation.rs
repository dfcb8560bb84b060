//! Boundary validation for Sniffer requests

use thiserror::Error;
use validator::{Validate, ValidationErrors};

use crate::models::{Feedback, FeedbackInput, ScanInput, ScanRequest};

/// A rejected request field
#[derive(Debug, Clone, Error, PartialEq)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl From<ValidationErrors> for ValidationError {
    /// Reports the first failing field in alphabetical order
    fn from(errors: ValidationErrors) -> Self {
        let mut fields: Vec<_> = errors.field_errors().into_iter().collect();
        fields.sort_by_key(|(name, _)| *name);
        match fields.first() {
            Some((name, errs)) => {
                let code = errs
                    .first()
                    .map(|e| e.code.to_string())
                    .unwrap_or_else(|| "invalid".to_string());
                let message = match code.as_str() {
                    "required" => "is required".to_string(),
                    "range" => "is out of range".to_string(),
                    "length" => "has an invalid length".to_string(),
                    other => format!("failed `{}` check", other),
                };
                ValidationError::new(*name, message)
            }
            None => ValidationError::new("body", "is invalid"),
        }
    }
}

// ============================================================================
// Request Validations
// ============================================================================

/// Validate an analyze body and convert it for the engine
pub fn validate_scan_input(input: ScanInput) -> Result<ScanRequest, ValidationError> {
    input.validate()?;
    if let Some(target) = &input.target {
        if target.trim().is_empty() {
            return Err(ValidationError::new("target", "is required"));
        }
    }
    input
        .into_request()
        .ok_or_else(|| ValidationError::new("body", "is incomplete"))
}

/// Validate a feedback body
pub fn validate_feedback_input(input: FeedbackInput) -> Result<Feedback, ValidationError> {
    input.validate()?;
    validate_probability(input.predicted)
        .map_err(|msg| ValidationError::new("predicted", msg))?;
    input
        .into_feedback()
        .ok_or_else(|| ValidationError::new("body", "is incomplete"))
}

// ============================================================================
// Value Validations
// ============================================================================

/// Validate decimal-degree coordinates
pub fn validate_coordinates(lat: f64, lon: f64) -> Result<(), &'static str> {
    if !lat.is_finite() || !(-90.0..=90.0).contains(&lat) {
        return Err("Latitude must be between -90 and 90");
    }
    if !lon.is_finite() || !(-180.0..=180.0).contains(&lon) {
        return Err("Longitude must be between -180 and 180");
    }
    Ok(())
}

/// Validate a predicted probability (0-100)
pub fn validate_probability(value: f64) -> Result<(), &'static str> {
    if !value.is_finite() || !(0.0..=100.0).contains(&value) {
        return Err("Probability must be between 0 and 100");
    }
    Ok(())
}

/// Validate a zone hash of the form `"{lat},{lon}"`
pub fn validate_zone_hash(hash: &str) -> Result<(), &'static str> {
    let mut parts = hash.split(',');
    let (Some(lat), Some(lon), None) = (parts.next(), parts.next(), parts.next()) else {
        return Err("Zone hash must be `lat,lon`");
    };
    match (lat.trim().parse::<f64>(), lon.trim().parse::<f64>()) {
        (Ok(lat), Ok(lon)) => validate_coordinates(lat, lon),
        _ => Err("Zone hash coordinates must be numbers"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_scan_input() {
        let input: ScanInput = serde_json::from_str(
            r#"{"target":"Tartufi","latitude":45.55,"longitude":10.95,"timestamp":"2024-08-14T07:00:00Z"}"#,
        )
        .unwrap();
        let request = validate_scan_input(input).unwrap();
        assert_eq!(request.target, crate::types::Target::Tartufi);
        assert_eq!(request.timestamp.as_deref(), Some("2024-08-14T07:00:00Z"));
    }

    #[test]
    fn test_missing_target_reported() {
        let input: ScanInput = serde_json::from_str(r#"{"latitude":45.55,"longitude":10.95}"#).unwrap();
        let err = validate_scan_input(input).unwrap_err();
        assert_eq!(err, ValidationError::new("target", "is required"));
    }

    #[test]
    fn test_blank_target_rejected() {
        let input: ScanInput =
            serde_json::from_str(r#"{"target":"  ","latitude":45.55,"longitude":10.95}"#).unwrap();
        assert_eq!(validate_scan_input(input).unwrap_err().field, "target");
    }

    #[test]
    fn test_feedback_probability_range() {
        let input: FeedbackInput = serde_json::from_str(
            r#"{"scanId":"s1","found":true,"predicted":140,"lat":45.0,"lon":11.0}"#,
        )
        .unwrap();
        assert_eq!(validate_feedback_input(input).unwrap_err().field, "predicted");
    }

    #[test]
    fn test_validate_coordinates() {
        assert!(validate_coordinates(45.0, 11.0).is_ok());
        assert!(validate_coordinates(-91.0, 11.0).is_err());
        assert!(validate_coordinates(45.0, 180.5).is_err());
        assert!(validate_coordinates(f64::NAN, 0.0).is_err());
    }

    #[test]
    fn test_validate_zone_hash() {
        assert!(validate_zone_hash("45.523,10.959").is_ok());
        assert!(validate_zone_hash("45,-10").is_ok());
        assert!(validate_zone_hash("45.523").is_err());
        assert!(validate_zone_hash("a,b").is_err());
        assert!(validate_zone_hash("1,2,3").is_err());
    }
}
