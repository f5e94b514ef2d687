// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Plan generation: call the model and parse its output into a
//! `CandidatePlan`.
//!
//! The output is untrusted. Parsing here only checks that it is JSON and
//! locates the workout array; field-level checks belong to the validator.

use crate::error::{AppError, Result};
use crate::models::{CandidatePlan, CandidateWorkout, GenerationRequest};
use crate::services::prompt::{plan_title, SYSTEM_PROMPT};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

/// Base delay between retries; attempt `n` waits `n` times this.
const RETRY_BACKOFF: Duration = Duration::from_millis(500);

/// Output constraint passed to the model service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseFormat {
    JsonObject,
}

/// One structured-generation call.
#[derive(Debug, Clone, Copy)]
pub struct ModelRequest<'a> {
    pub system_prompt: &'a str,
    pub prompt: &'a str,
    pub response_format: ResponseFormat,
}

/// Model-service failures.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ModelError {
    /// Timeouts, connection failures, rate limits, provider 5xx.
    #[error("transient model error: {0}")]
    Transient(String),

    #[error("model error: {0}")]
    Fatal(String),
}

/// A generative model that returns structured text.
#[async_trait]
pub trait PlanModel: Send + Sync {
    async fn generate(&self, request: &ModelRequest<'_>) -> std::result::Result<String, ModelError>;

    /// Model identifier, for logs.
    fn name(&self) -> &str;
}

/// Calls the model and turns its output into a candidate plan.
#[derive(Clone)]
pub struct PlanGenerator {
    model: Arc<dyn PlanModel>,
    max_retries: u32,
}

impl PlanGenerator {
    pub fn new(model: Arc<dyn PlanModel>, max_retries: u32) -> Self {
        Self { model, max_retries }
    }

    /// Generate a candidate plan for a rendered prompt.
    pub async fn generate(
        &self,
        request: &GenerationRequest,
        prompt: &str,
        now: DateTime<Utc>,
    ) -> Result<CandidatePlan> {
        let model_request = ModelRequest {
            system_prompt: SYSTEM_PROMPT,
            prompt,
            response_format: ResponseFormat::JsonObject,
        };

        let mut attempt = 0;
        let content = loop {
            match self.model.generate(&model_request).await {
                Ok(content) => break content,
                Err(ModelError::Transient(reason)) if attempt < self.max_retries => {
                    attempt += 1;
                    tracing::warn!(
                        model = self.model.name(),
                        attempt,
                        reason = %reason,
                        "Transient model failure, retrying"
                    );
                    tokio::time::sleep(RETRY_BACKOFF * attempt).await;
                }
                Err(e) => return Err(AppError::GenerationFailed(e.to_string())),
            }
        };

        tracing::debug!(
            model = self.model.name(),
            bytes = content.len(),
            "Model response received"
        );

        let mut candidate = parse_candidate(&content)?;
        candidate.title = Some(plan_title(request.goal.as_deref(), now));
        Ok(candidate)
    }
}

/// Parse model output. Accepts `{"workouts": [...]}` or a bare array.
///
/// Non-JSON output is a generation failure; anything that is JSON but has
/// the wrong shape is left for the validator to reject.
pub fn parse_candidate(content: &str) -> Result<CandidatePlan> {
    let value: Value = serde_json::from_str(content.trim())
        .map_err(|e| AppError::GenerationFailed(format!("Model output is not JSON: {}", e)))?;

    let workouts = match &value {
        Value::Array(items) => Some(items),
        Value::Object(map) => map.get("workouts").and_then(Value::as_array),
        _ => None,
    };

    Ok(CandidatePlan {
        title: None,
        workouts: workouts.map(|items| items.iter().map(CandidateWorkout::from_value).collect()),
    })
}
