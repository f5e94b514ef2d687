// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Database layer.
//!
//! The pipeline only sees the store traits below; `FirestoreDb` backs them in
//! production and `MemoryDb` in local development and tests.

pub mod firestore;
pub mod memory;

pub use self::firestore::FirestoreDb;
pub use memory::MemoryDb;

use crate::error::AppError;
use crate::models::{ActivityRecord, PersistedPlan, Subscription, Workout};
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Collection names as constants.
pub mod collections {
    pub const SUBSCRIPTIONS: &str = "subscriptions";
    pub const ACTIVITIES: &str = "activities";
    pub const WORKOUT_PLANS: &str = "workout_plans";
    pub const WORKOUTS: &str = "workouts";
}

/// Read access to subscription records.
#[async_trait]
pub trait SubscriptionStore: Send + Sync {
    /// `Ok(None)` when the user has no subscription document.
    async fn get_subscription(&self, user_id: &str) -> Result<Option<Subscription>, AppError>;
}

/// Read access to imported activities.
#[async_trait]
pub trait ActivityStore: Send + Sync {
    /// Up to `limit` activities for the user, most recent first.
    async fn list_activities(
        &self,
        user_id: &str,
        limit: u32,
    ) -> Result<Vec<ActivityRecord>, AppError>;
}

/// Plan headers and their workouts.
#[async_trait]
pub trait PlanStore: Send + Sync {
    /// Number of plans the user created at or after `since`.
    async fn count_plans(&self, user_id: &str, since: DateTime<Utc>) -> Result<u64, AppError>;

    async fn insert_plan(&self, plan: &PersistedPlan) -> Result<(), AppError>;

    /// Insert every workout of a plan. Either all rows become visible or the
    /// call fails; a failure may still leave rows behind that
    /// `delete_plan` removes.
    async fn insert_workouts(&self, plan_id: &str, workouts: &[Workout]) -> Result<(), AppError>;

    /// Write a plan header and all of its workouts in one commit. On error
    /// neither the header nor any workout is visible.
    async fn create_plan(&self, plan: &PersistedPlan, workouts: &[Workout])
        -> Result<(), AppError>;

    /// Remove a plan header and any workouts that reference it.
    async fn delete_plan(&self, plan_id: &str) -> Result<(), AppError>;
}
