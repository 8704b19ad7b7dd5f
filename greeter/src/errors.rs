use crate::contract::ContractError;
use axum::{http::StatusCode, response::{IntoResponse, Response}, Json};
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("internal error")]
    Internal,
}

impl From<ContractError> for ApiError {
    fn from(e: ContractError) -> Self {
        match e {
            // Malformed or unverifiable submissions.
            ContractError::InvalidUsername
            | ContractError::InvalidMessage
            | ContractError::InvalidProof => ApiError::BadRequest(e.to_string()),

            // Valid requests racing against contract state.
            ContractError::DuplicateCommitment
            | ContractError::GroupFull(_)
            | ContractError::StaleRoot
            | ContractError::NullifierAlreadyUsed => ApiError::Conflict(e.to_string()),

            ContractError::Group(_) => ApiError::Internal,
        }
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, msg) = match &self {
            ApiError::BadRequest(m) => (StatusCode::BAD_REQUEST, m.clone()),
            ApiError::Conflict(m) => (StatusCode::CONFLICT, m.clone()),
            ApiError::Internal => (StatusCode::INTERNAL_SERVER_ERROR, "internal error".to_string()),
        };

        (status, Json(ErrorBody { error: msg })).into_response()
    }
}
