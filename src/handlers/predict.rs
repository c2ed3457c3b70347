use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use serde::{Deserialize, Serialize};

use super::AppState;
use crate::{error::AppError, metrics};

#[derive(Debug, Clone, Deserialize)]
pub struct PredictRequest {
    pub text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PredictResponse {
    pub predicted_tip: String,
}

/// Validate and normalize the input text.
///
/// Returns the trimmed text: non-empty, at least 2 characters, with at least
/// one letter.
pub fn validate_text(text: &str) -> Result<String, AppError> {
    let trimmed = text.trim();

    if trimmed.is_empty() {
        return Err(AppError::Validation("text must not be empty".to_string()));
    }
    if !trimmed.chars().any(char::is_alphabetic) {
        return Err(AppError::Validation("text must contain letters".to_string()));
    }
    if trimmed.chars().count() < 2 {
        return Err(AppError::Validation(
            "text must be at least 2 characters long".to_string(),
        ));
    }

    Ok(trimmed.to_string())
}

/// Handle the prediction endpoint
pub async fn handle_predict(
    State(state): State<AppState>,
    payload: Result<Json<PredictRequest>, JsonRejection>,
) -> Result<Json<PredictResponse>, AppError> {
    let Json(request) = payload.map_err(|e| AppError::Validation(e.body_text()))?;
    let text = validate_text(&request.text)?;

    let predicted_tip = state
        .predictor
        .predict(&text)
        .map_err(|e| AppError::Prediction(e.to_string()))?;

    tracing::debug!(label = %predicted_tip, "Prediction served");
    metrics::record_prediction(&predicted_tip);

    Ok(Json(PredictResponse { predicted_tip }))
}
