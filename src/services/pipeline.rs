// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! The plan generation workflow.
//!
//! Stages run strictly in order and the first failure ends the request:
//! 1. Verify the bearer credential
//! 2. Check tier and free-tier quota (before any model call)
//! 3. Load recent activities
//! 4. Render the prompt
//! 5. Generate a candidate plan
//! 6. Validate it
//! 7. Persist plan and workouts together
//!
//! Dropping the returned future (client disconnect) abandons whatever call is
//! in flight. Persistence runs on its own task so it is never cut off between
//! the header and workout writes.

use crate::error::{AppError, Result};
use crate::models::{GenerationRequest, PlanOutcome};
use crate::services::activity::ActivityAggregator;
use crate::services::generator::PlanGenerator;
use crate::services::identity::{bearer_credential, AuthUser, IdentityVerifier};
use crate::services::persister::PlanPersister;
use crate::services::prompt::render_prompt;
use crate::services::quota::QuotaEnforcer;
use crate::services::validator::validate_plan;
use chrono::{DateTime, Utc};
use std::sync::Arc;

/// Caller-supplied generation options.
#[derive(Debug, Clone, Default)]
pub struct PlanInput {
    pub goal: Option<String>,
    pub race_type: Option<String>,
    pub fitness_level: Option<String>,
    pub activity_count: Option<i64>,
}

/// Explicitly wired pipeline; every collaborator is injected.
#[derive(Clone)]
pub struct PlanPipeline {
    identity: Arc<dyn IdentityVerifier>,
    quota: QuotaEnforcer,
    activities: ActivityAggregator,
    generator: PlanGenerator,
    persister: PlanPersister,
}

impl PlanPipeline {
    pub fn new(
        identity: Arc<dyn IdentityVerifier>,
        quota: QuotaEnforcer,
        activities: ActivityAggregator,
        generator: PlanGenerator,
        persister: PlanPersister,
    ) -> Self {
        Self {
            identity,
            quota,
            activities,
            generator,
            persister,
        }
    }

    /// Stage 1: resolve the `Authorization` header to a user.
    pub async fn authenticate(&self, authorization: Option<&str>) -> Result<AuthUser> {
        let credential = bearer_credential(authorization)?;
        self.identity.verify(credential).await
    }

    /// Run stages 2-7 for an authenticated user.
    pub async fn generate(&self, user: &AuthUser, input: PlanInput) -> Result<PlanOutcome> {
        self.generate_at(user, input, Utc::now()).await
    }

    /// As [`generate`](Self::generate), with an explicit clock.
    pub async fn generate_at(
        &self,
        user: &AuthUser,
        input: PlanInput,
        now: DateTime<Utc>,
    ) -> Result<PlanOutcome> {
        let count = self.activities.resolve_count(input.activity_count)?;

        let permit = self.quota.check(user, now).await?;

        let activity_summary = self.activities.load(user, count).await?;

        let request = GenerationRequest {
            goal: input.goal,
            race_type: input.race_type,
            fitness_level: input.fitness_level,
            activity_summary,
        };
        let prompt = render_prompt(&request);
        tracing::debug!(user_id = %user.user_id, prompt_len = prompt.len(), "Prompt built");

        let candidate = self.generator.generate(&request, &prompt, now).await?;

        let plan = validate_plan(candidate)?;
        tracing::debug!(
            user_id = %user.user_id,
            workouts = plan.workouts().len(),
            "Plan validated"
        );

        let persister = self.persister.clone();
        let owner = user.clone();
        tokio::spawn(async move { persister.persist(&owner, prompt, plan, permit, now).await })
            .await
            .map_err(|e| AppError::Internal(anyhow::anyhow!("Persistence task failed: {}", e)))?
    }
}
