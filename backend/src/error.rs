//! Error handling for the Sniffer server
//!
//! Provides consistent error responses in English and Italian

use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::store::StoreError;

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    // Validation errors
    #[error("Validation error: {message}")]
    Validation {
        field: String,
        message: String,
        message_it: String,
    },

    #[error("Invalid request body: {0}")]
    InvalidBody(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    // External service errors
    #[error("{provider} unavailable: {message}")]
    ExternalService { provider: String, message: String },

    #[error("{0} not configured")]
    ProviderDisabled(String),

    // Storage errors
    #[error("Storage error: {0}")]
    Storage(#[from] StoreError),

    #[error("Export error: {0}")]
    Export(String),

    // Internal errors
    #[error("Internal server error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn external(provider: &str, message: impl ToString) -> Self {
        AppError::ExternalService {
            provider: provider.to_string(),
            message: message.to_string(),
        }
    }
}

impl From<sniffer_shared::ValidationError> for AppError {
    fn from(err: sniffer_shared::ValidationError) -> Self {
        AppError::Validation {
            message_it: format!("{}: {}", err.field, translate(&err.message)),
            message: format!("{} {}", err.field, err.message),
            field: err.field,
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::InvalidBody(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::InvalidBody(rejection.body_text())
    }
}

fn translate(message: &str) -> &str {
    match message {
        "is required" => "campo obbligatorio",
        "is out of range" => "valore fuori intervallo",
        "has an invalid length" => "lunghezza non valida",
        "is incomplete" => "dati incompleti",
        other => other,
    }
}

/// Error response structure
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message_en: String,
    pub message_it: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_detail) = match &self {
            AppError::Validation {
                field,
                message,
                message_it,
            } => (
                StatusCode::BAD_REQUEST,
                ErrorDetail {
                    code: "VALIDATION_ERROR".to_string(),
                    message_en: message.clone(),
                    message_it: message_it.clone(),
                    field: Some(field.clone()),
                },
            ),
            AppError::InvalidBody(msg) => (
                StatusCode::BAD_REQUEST,
                ErrorDetail {
                    code: "INVALID_BODY".to_string(),
                    message_en: msg.clone(),
                    message_it: format!("Richiesta non valida: {}", msg),
                    field: None,
                },
            ),
            AppError::NotFound(resource) => (
                StatusCode::NOT_FOUND,
                ErrorDetail {
                    code: "NOT_FOUND".to_string(),
                    message_en: format!("{} not found", resource),
                    message_it: format!("{} non trovato", resource),
                    field: None,
                },
            ),
            AppError::ExternalService { provider, message } => (
                StatusCode::BAD_GATEWAY,
                ErrorDetail {
                    code: "EXTERNAL_SERVICE_ERROR".to_string(),
                    message_en: format!("{} error: {}", provider, message),
                    message_it: format!("Errore del servizio {}: {}", provider, message),
                    field: None,
                },
            ),
            AppError::ProviderDisabled(provider) => (
                StatusCode::SERVICE_UNAVAILABLE,
                ErrorDetail {
                    code: "PROVIDER_DISABLED".to_string(),
                    message_en: format!("{} is not configured", provider),
                    message_it: format!("{} non configurato", provider),
                    field: None,
                },
            ),
            AppError::Storage(_) => (
                StatusCode::SERVICE_UNAVAILABLE,
                ErrorDetail {
                    code: "STORAGE_ERROR".to_string(),
                    message_en: "The record store is unavailable".to_string(),
                    message_it: "Archivio dati non disponibile".to_string(),
                    field: None,
                },
            ),
            AppError::Export(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorDetail {
                    code: "EXPORT_ERROR".to_string(),
                    message_en: format!("Export failed: {}", msg),
                    message_it: format!("Esportazione non riuscita: {}", msg),
                    field: None,
                },
            ),
            AppError::Internal(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorDetail {
                    code: "INTERNAL_ERROR".to_string(),
                    message_en: msg.clone(),
                    message_it: "Errore interno del server".to_string(),
                    field: None,
                },
            ),
        };

        // Log the error for debugging
        if status.is_server_error() {
            tracing::error!("Error: {:?}", self);
        } else {
            tracing::debug!("Rejected request: {}", self);
        }

        (status, Json(ErrorResponse { error: error_detail })).into_response()
    }
}

/// Result type alias for handlers
pub type AppResult<T> = Result<T, AppError>;
