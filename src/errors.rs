use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::services::backend::StoreError;
use crate::services::draft::ValidationError;
use crate::services::wizard::WizardError;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{0}")]
    Validation(#[from] ValidationError),

    #[error("{0}")]
    Wizard(WizardError),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("{0}")]
    BookingConflict(String),

    #[error("{0}")]
    BookingRejected(String),

    #[error("availability unavailable: {0}")]
    AvailabilityFetch(String),

    #[error("payment update failed: {0}")]
    PaymentUpdate(String),

    #[error("backend error: {0}")]
    Backend(String),

    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<WizardError> for AppError {
    fn from(e: WizardError) -> Self {
        match e {
            WizardError::Validation(v) => AppError::Validation(v),
            WizardError::UnknownSlot(start) => {
                AppError::NotFound(format!("slot starting at {start}"))
            }
            other => AppError::Wizard(other),
        }
    }
}

impl AppError {
    pub fn from_create(e: StoreError) -> Self {
        let message = e.to_string();
        match e {
            StoreError::Conflict => AppError::BookingConflict(message),
            StoreError::OutsideOpeningHours { .. } => AppError::BookingRejected(message),
            StoreError::NotFound(id) => AppError::NotFound(id),
            StoreError::Backend(_) => AppError::Backend(message),
        }
    }

    pub fn from_payment(e: StoreError) -> Self {
        match e {
            StoreError::NotFound(id) => AppError::NotFound(format!("booking {id}")),
            other => AppError::PaymentUpdate(other.to_string()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Wizard(_) => StatusCode::CONFLICT,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::BookingConflict(_) => StatusCode::CONFLICT,
            AppError::BookingRejected(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::AvailabilityFetch(_) => StatusCode::BAD_GATEWAY,
            AppError::PaymentUpdate(_) => StatusCode::BAD_GATEWAY,
            AppError::Backend(_) => StatusCode::BAD_GATEWAY,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let mut body = serde_json::json!({ "error": self.to_string() });
        if let AppError::Validation(v) = &self {
            body["field"] = serde_json::json!(v.field());
        }
        (status, axum::Json(body)).into_response()
    }
}
