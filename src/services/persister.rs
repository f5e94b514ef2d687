// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Stores a validated plan and its workouts as one unit.
//!
//! Header and workouts go to the store in a single commit. A failed commit
//! is followed by a best-effort delete in case the backend applied part of
//! it before reporting the error.

use crate::db::PlanStore;
use crate::error::{AppError, Result};
use crate::models::{PersistedPlan, PlanOutcome, ValidatedPlan, Workout};
use crate::services::identity::AuthUser;
use crate::services::quota::QuotaPermit;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use uuid::Uuid;

#[derive(Clone)]
pub struct PlanPersister {
    store: Arc<dyn PlanStore>,
}

impl PlanPersister {
    pub fn new(store: Arc<dyn PlanStore>) -> Self {
        Self { store }
    }

    /// Persist a plan. The quota permit is released only once the plan is
    /// either fully stored or fully rolled back.
    pub async fn persist(
        &self,
        user: &AuthUser,
        prompt: String,
        plan: ValidatedPlan,
        permit: QuotaPermit,
        now: DateTime<Utc>,
    ) -> Result<PlanOutcome> {
        let header = PersistedPlan {
            id: Uuid::new_v4().to_string(),
            user_id: user.user_id.clone(),
            title: plan.title().to_string(),
            prompt,
            created_at: now,
        };

        let workouts: Vec<Workout> = plan
            .workouts()
            .iter()
            .map(|w| Workout {
                id: Uuid::new_v4().to_string(),
                user_id: user.user_id.clone(),
                plan_id: header.id.clone(),
                date: w.date,
                workout_type: w.workout_type.clone(),
                duration: w.duration_minutes,
                notes: w.notes.clone(),
                created_at: now,
                updated_at: now,
            })
            .collect();

        if let Err(e) = self.store.create_plan(&header, &workouts).await {
            tracing::warn!(
                user_id = %user.user_id,
                plan_id = %header.id,
                error = %e,
                "Plan write failed, removing any partial rows"
            );
            if let Err(cleanup) = self.store.delete_plan(&header.id).await {
                tracing::error!(
                    plan_id = %header.id,
                    error = %cleanup,
                    "Failed to remove partial plan"
                );
            }
            return Err(AppError::PersistenceFailed(format!(
                "Error saving plan: {}",
                e
            )));
        }

        tracing::info!(
            user_id = %user.user_id,
            plan_id = %header.id,
            workout_count = workouts.len(),
            is_pro = permit.is_pro(),
            "Plan persisted"
        );
        drop(permit);

        Ok(PlanOutcome {
            plan_id: header.id,
            title: header.title,
            workout_count: workouts.len(),
        })
    }
}
