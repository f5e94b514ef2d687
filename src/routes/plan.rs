// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Plan generation endpoint (requires authentication).

use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::services::PlanInput;
use crate::AppState;
use axum::{
    body::Bytes,
    extract::State,
    routing::post,
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;
use validator::Validate;

/// Plan routes. The auth middleware is applied in routes/mod.rs.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/functions/v1/generate-plan", post(generate_plan))
        .route("/api/plans/generate", post(generate_plan))
}

/// Request body. Every field is optional; the body itself is not.
#[derive(Debug, Default, Deserialize, Validate)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "camelCase")]
pub struct GeneratePlanRequest {
    #[validate(length(max = 200, message = "must be at most 200 characters"))]
    pub goal: Option<String>,
    #[validate(length(max = 200, message = "must be at most 200 characters"))]
    pub race_type: Option<String>,
    #[validate(length(max = 200, message = "must be at most 200 characters"))]
    pub fitness_level: Option<String>,
    #[cfg_attr(feature = "binding-generation", ts(type = "number | null"))]
    pub activity_count: Option<i64>,
}

impl GeneratePlanRequest {
    /// Parse and check a raw request body.
    pub fn from_body(body: &[u8]) -> Result<Self> {
        if body.iter().all(u8::is_ascii_whitespace) {
            return Err(AppError::InvalidInput(
                "request body is required".to_string(),
            ));
        }

        let request: Self = serde_json::from_slice(body)
            .map_err(|e| AppError::InvalidInput(format!("invalid JSON body: {}", e)))?;

        request.validate().map_err(|errors| {
            let mut problems: Vec<String> = errors
                .field_errors()
                .into_iter()
                .flat_map(|(field, errs)| {
                    let name = wire_name(&field);
                    errs.iter().map(move |e| {
                        let rule = e
                            .message
                            .as_deref()
                            .map(str::to_string)
                            .unwrap_or_else(|| format!("failed {}", e.code));
                        format!("{} {}", name, rule)
                    })
                })
                .collect();
            problems.sort();
            AppError::InvalidInput(problems.join("; "))
        })?;

        Ok(request)
    }
}

/// Body field name as the client sends it (`race_type` -> `raceType`).
fn wire_name(field: &str) -> String {
    let mut name = String::with_capacity(field.len());
    let mut upper = false;
    for c in field.chars() {
        if c == '_' {
            upper = true;
        } else if upper {
            name.push(c.to_ascii_uppercase());
            upper = false;
        } else {
            name.push(c);
        }
    }
    name
}

impl From<GeneratePlanRequest> for PlanInput {
    fn from(request: GeneratePlanRequest) -> Self {
        PlanInput {
            goal: request.goal,
            race_type: request.race_type,
            fitness_level: request.fitness_level,
            activity_count: request.activity_count,
        }
    }
}

/// Successful generation response.
#[derive(Debug, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct GeneratePlanResponse {
    pub success: bool,
    pub plan_id: String,
    pub title: String,
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub workout_count: usize,
}

/// Generate, validate and store a new training plan for the caller.
async fn generate_plan(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    body: Bytes,
) -> Result<Json<GeneratePlanResponse>> {
    let request = GeneratePlanRequest::from_body(&body)?;

    tracing::info!(
        user_id = %user.user_id,
        activity_count = ?request.activity_count,
        "Plan generation requested"
    );

    let outcome = state.pipeline.generate(&user, request.into()).await?;

    Ok(Json(GeneratePlanResponse {
        success: true,
        plan_id: outcome.plan_id,
        title: outcome.title,
        workout_count: outcome.workout_count,
    }))
}
