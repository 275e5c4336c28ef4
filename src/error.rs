//! Application error taxonomy and its HTTP mapping.
//!
//! Resolution outcomes (`NotFound`, `Inactive`, `Expired`, `BudgetExhausted`) are
//! expected and user-facing. `StoreUnavailable` is unexpected and surfaces as 500.
//! `EnrichmentFailed` and `AccountingPersistFailed` only ever occur inside the
//! click accounting pipeline and are logged, never returned to a client.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::{Value, json};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("short link not found")]
    NotFound,

    #[error("link is inactive")]
    Inactive,

    #[error("link has expired")]
    Expired,

    #[error("click limit exceeded")]
    BudgetExhausted,

    #[error("{message}")]
    StoreUnavailable { message: String, details: Value },

    #[error("enrichment failed: {0}")]
    EnrichmentFailed(String),

    #[error("click accounting failed: {0}")]
    AccountingPersistFailed(String),
}

impl AppError {
    pub fn store_unavailable(message: impl Into<String>, details: Value) -> Self {
        Self::StoreUnavailable {
            message: message.into(),
            details,
        }
    }

    pub fn enrichment_failed(reason: impl Into<String>) -> Self {
        Self::EnrichmentFailed(reason.into())
    }

    /// HTTP status for this error when it reaches a client.
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::Inactive => StatusCode::FORBIDDEN,
            AppError::Expired => StatusCode::GONE,
            AppError::BudgetExhausted => StatusCode::TOO_MANY_REQUESTS,
            AppError::StoreUnavailable { .. }
            | AppError::EnrichmentFailed(_)
            | AppError::AccountingPersistFailed(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Short label used for the `outcome` metric label and log fields.
    pub fn outcome(&self) -> &'static str {
        match self {
            AppError::NotFound => "not_found",
            AppError::Inactive => "inactive",
            AppError::Expired => "expired",
            AppError::BudgetExhausted => "budget_exhausted",
            AppError::StoreUnavailable { .. } => "store_unavailable",
            AppError::EnrichmentFailed(_) => "enrichment_failed",
            AppError::AccountingPersistFailed(_) => "accounting_failed",
        }
    }

    fn body(&self) -> &'static str {
        match self {
            AppError::NotFound => "Link not found",
            AppError::Inactive => "Link is inactive",
            AppError::Expired => "Link has expired",
            AppError::BudgetExhausted => "Click limit exceeded",
            _ => "Internal server error",
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        if status.is_server_error() {
            match &self {
                AppError::StoreUnavailable { message, details } => {
                    tracing::error!(%details, "Store unavailable: {}", message);
                }
                other => tracing::error!("Internal error: {}", other),
            }
        }

        (status, self.body()).into_response()
    }
}

impl From<sqlx::Error> for AppError {
    fn from(e: sqlx::Error) -> Self {
        AppError::store_unavailable("Database error", json!({ "reason": e.to_string() }))
    }
}
