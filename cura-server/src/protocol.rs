//! Request bodies, validation, and error responses for the analysis API.

use axum::{
    Json,
    extract::{FromRequest, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use cura_rag::{CandidateItem, CandidateKind, FoodTiming, MedicationRef, RagError};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::error;

/// `newItem` of an interaction request.
#[derive(Debug, Clone, Deserialize)]
pub struct NewItem {
    #[serde(rename = "type")]
    pub kind: CandidateKind,
    pub name: String,
    #[serde(default)]
    pub dosage: Option<String>,
    #[serde(default)]
    pub frequency: Option<String>,
}

impl From<NewItem> for CandidateItem {
    fn from(item: NewItem) -> Self {
        CandidateItem {
            kind: item.kind,
            name: item.name,
            dosage: item.dosage,
            frequency: item.frequency,
            quantity: None,
            timing: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InteractionsRequest {
    pub current_medications: Vec<MedicationRef>,
    pub new_item: NewItem,
}

/// The only accepted `type` for a food-compatibility item.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FoodType {
    Food,
}

/// `newItem` of a food-compatibility request.
#[derive(Debug, Clone, Deserialize)]
pub struct FoodItem {
    #[serde(rename = "type")]
    pub kind: FoodType,
    pub name: String,
    #[serde(default)]
    pub quantity: Option<String>,
    #[serde(default)]
    pub timing: Option<FoodTiming>,
}

impl From<FoodItem> for CandidateItem {
    fn from(item: FoodItem) -> Self {
        CandidateItem {
            kind: match item.kind {
                FoodType::Food => CandidateKind::Food,
            },
            name: item.name,
            dosage: None,
            frequency: None,
            quantity: item.quantity,
            timing: item.timing,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FoodCompatibilityRequest {
    pub current_medications: Vec<MedicationRef>,
    pub new_item: FoodItem,
}

/// Checks beyond what deserialisation enforces.
pub trait Validate {
    fn validate(&self) -> Result<(), ApiError>;
}

fn validate_names(medications: &[MedicationRef], candidate: &str) -> Result<(), ApiError> {
    if candidate.trim().is_empty() {
        return Err(ApiError::Validation("newItem.name must not be empty".to_string()));
    }
    if let Some(i) = medications.iter().position(|m| m.name.trim().is_empty()) {
        return Err(ApiError::Validation(format!("currentMedications[{i}].name must not be empty")));
    }
    Ok(())
}

impl Validate for InteractionsRequest {
    fn validate(&self) -> Result<(), ApiError> {
        validate_names(&self.current_medications, &self.new_item.name)
    }
}

impl Validate for FoodCompatibilityRequest {
    fn validate(&self) -> Result<(), ApiError> {
        validate_names(&self.current_medications, &self.new_item.name)
    }
}

/// JSON body extractor that reports malformed bodies as [`ApiError::Validation`].
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("invalid request data: {0}")]
    Validation(String),

    #[error(transparent)]
    Analysis(#[from] RagError),
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::Validation(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            ApiError::Validation(details) => (
                StatusCode::BAD_REQUEST,
                ErrorBody { error: "Invalid request data".to_string(), details: Some(details) },
            ),
            ApiError::Analysis(e) => {
                error!(
                    error = %e,
                    embedding_failure = e.is_embedding_failure(),
                    timeout = e.is_timeout(),
                    "analysis failed"
                );
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorBody { error: "Internal server error".to_string(), details: None },
                )
            }
        };
        (status, Json(body)).into_response()
    }
}
