// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Bearer authentication middleware.

use crate::error::AppError;
use crate::AppState;
use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use std::sync::Arc;

pub use crate::services::identity::AuthUser;

/// Middleware that requires a verified bearer credential.
///
/// Runs before the body is read, so a request without a usable
/// `Authorization` header never reaches any other stage.
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let auth_header = request
        .headers()
        .get(header::AUTHORIZATION)
        .map(|h| h.to_str().map_err(|_| AppError::Unauthenticated))
        .transpose()?;

    let auth_user = state.pipeline.authenticate(auth_header).await?;
    tracing::debug!(user_id = %auth_user.user_id, "Request authenticated");

    request.extensions_mut().insert(auth_user);
    Ok(next.run(request).await)
}
