// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application error types with consistent API responses.
//!
//! Every pipeline stage fails with one of these variants. Only the quota
//! rejection is distinguishable by status code; everything else is a 500
//! carrying a message that is safe to show the user.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Application error type that converts to HTTP responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Authentication required")]
    Unauthenticated,

    #[error("Invalid request: {0}")]
    InvalidInput(String),

    #[error("Subscription lookup failed: {0}")]
    SubscriptionLookupFailed(String),

    #[error("Free tier plan quota exceeded")]
    QuotaExceeded,

    #[error("Activity fetch failed: {0}")]
    ActivityFetchFailed(String),

    #[error("Plan generation failed: {0}")]
    GenerationFailed(String),

    #[error("Generated plan is malformed: {field} {reason}")]
    MalformedPlan { field: String, reason: String },

    #[error("Persistence failed: {0}")]
    PersistenceFailed(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// Message returned to callers when the free-tier quota is used up.
    pub const QUOTA_MESSAGE: &'static str = "Free tier limit reached. You can generate 1 plan per month. Upgrade to Pro for unlimited plans.";

    pub fn malformed(field: impl Into<String>, reason: impl Into<String>) -> Self {
        AppError::MalformedPlan {
            field: field.into(),
            reason: reason.into(),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::QuotaExceeded => StatusCode::FORBIDDEN,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message that can be shown to the caller without leaking internals.
    pub fn public_message(&self) -> String {
        match self {
            AppError::Unauthenticated => "Invalid token or user not found".to_string(),
            AppError::InvalidInput(msg) => format!("Invalid request: {}", msg),
            AppError::SubscriptionLookupFailed(_) => {
                "Unable to verify your subscription. Please try again later.".to_string()
            }
            AppError::QuotaExceeded => Self::QUOTA_MESSAGE.to_string(),
            AppError::ActivityFetchFailed(_) => {
                "Unable to load your recent activities. Please try again later.".to_string()
            }
            AppError::GenerationFailed(_) => "Failed to generate workout plan".to_string(),
            AppError::MalformedPlan { field, reason } => {
                format!("Generated plan was invalid ({} {})", field, reason)
            }
            AppError::PersistenceFailed(_) => "Error saving plan".to_string(),
            AppError::Internal(_) => "Internal server error".to_string(),
        }
    }
}

/// JSON error response body
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match &self {
            AppError::Unauthenticated | AppError::InvalidInput(_) | AppError::QuotaExceeded => {
                tracing::info!(error = %self, "Plan request rejected");
            }
            AppError::MalformedPlan { .. } => {
                tracing::warn!(error = %self, "Model returned a malformed plan");
            }
            _ => {
                tracing::error!(error = %self, "Plan request failed");
            }
        }

        let body = ErrorResponse {
            error: self.public_message(),
        };

        (self.status(), Json(body)).into_response()
    }
}

/// Result type alias for handlers
pub type Result<T> = std::result::Result<T, AppError>;
