use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use thiserror::Error;

use crate::domain::catalog::PricingError;
use crate::domain::employee::EmployeeUploadError;
use crate::domain::order::{BulkOrderError, TrackingError};
use crate::store::StoreError;
use crate::utils::PayloadError;

// ============================================================================
// API Errors - every domain error ends up here before it reaches a client
// ============================================================================

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("Missing or invalid API token")]
    Unauthorized,

    #[error("Corporate account required")]
    Forbidden,

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Gone(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Gone(_) => StatusCode::GONE,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        if let ApiError::Internal(reason) = self {
            tracing::error!(error = %reason, "Request failed");
        }

        HttpResponse::build(self.status_code()).json(serde_json::json!({ "error": self.to_string() }))
    }
}

impl From<StoreError> for ApiError {
    fn from(error: StoreError) -> Self {
        match error {
            StoreError::InsufficientStock { .. } => ApiError::BadRequest(error.to_string()),
            StoreError::ProductNotFound(_) => ApiError::NotFound(error.to_string()),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl From<EmployeeUploadError> for ApiError {
    fn from(error: EmployeeUploadError) -> Self {
        match error {
            EmployeeUploadError::Store(e) => e.into(),
            other => ApiError::BadRequest(other.to_string()),
        }
    }
}

impl From<BulkOrderError> for ApiError {
    fn from(error: BulkOrderError) -> Self {
        match error {
            BulkOrderError::Store(e) => ApiError::Internal(e.to_string()),
            other => ApiError::BadRequest(other.to_string()),
        }
    }
}

impl From<PricingError> for ApiError {
    fn from(error: PricingError) -> Self {
        ApiError::BadRequest(error.to_string())
    }
}

impl From<TrackingError> for ApiError {
    fn from(error: TrackingError) -> Self {
        match error {
            TrackingError::NotFound => ApiError::NotFound(error.to_string()),
            TrackingError::Expired => ApiError::Gone(error.to_string()),
        }
    }
}

impl From<PayloadError> for ApiError {
    fn from(error: PayloadError) -> Self {
        match error {
            PayloadError::Encryption => ApiError::Internal(error.to_string()),
            other => ApiError::BadRequest(other.to_string()),
        }
    }
}
