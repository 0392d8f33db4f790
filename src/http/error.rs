use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};

use crate::domain::books::BookError;
use crate::domain::orders::OrderError;
use crate::domain::shipping::ShippingError;
use crate::store::StoreError;

/// Maps domain failures to HTTP responses with a JSON `{"error": ...}` body
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Internal(String),
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(serde_json::json!({ "error": self.to_string() }))
    }
}

impl From<StoreError> for ApiError {
    fn from(error: StoreError) -> Self {
        match error {
            StoreError::Conflict(_) => ApiError::Conflict(error.to_string()),
            StoreError::Unavailable(_) => ApiError::Internal(error.to_string()),
        }
    }
}

impl From<BookError> for ApiError {
    fn from(error: BookError) -> Self {
        match error {
            BookError::Conflict(_) => ApiError::Conflict(error.to_string()),
            BookError::NotFound(_) => ApiError::NotFound(error.to_string()),
            BookError::Invalid(_) | BookError::Patch(_) => ApiError::BadRequest(error.to_string()),
            BookError::Store(e) => e.into(),
        }
    }
}

impl From<OrderError> for ApiError {
    fn from(error: OrderError) -> Self {
        match error {
            OrderError::Conflict(_) => ApiError::Conflict(error.to_string()),
            OrderError::NotFound(_) => ApiError::NotFound(error.to_string()),
            OrderError::Invalid(_) => ApiError::BadRequest(error.to_string()),
            OrderError::Store(e) => e.into(),
            OrderError::Dispatch(_) => {
                tracing::error!(error = %error, "Order request failed during dispatch");
                ApiError::Internal(error.to_string())
            }
        }
    }
}

impl From<ShippingError> for ApiError {
    fn from(error: ShippingError) -> Self {
        match error {
            ShippingError::NotFound(_) => ApiError::NotFound(error.to_string()),
            ShippingError::Store(e) => e.into(),
            ShippingError::Rejected(_) | ShippingError::Dispatch(_) => ApiError::Internal(error.to_string()),
        }
    }
}
