// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Plan and workout records for storage, and the generation request.

use super::ActivitySummary;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Everything the prompt builder needs for one generation request.
#[derive(Debug, Clone, Default)]
pub struct GenerationRequest {
    pub goal: Option<String>,
    pub race_type: Option<String>,
    pub fitness_level: Option<String>,
    pub activity_summary: ActivitySummary,
}

/// Plan header stored in Firestore (`workout_plans`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersistedPlan {
    /// Plan ID (also used as document ID)
    pub id: String,
    /// Owner
    pub user_id: String,
    pub title: String,
    /// Rendered prompt the plan was generated from
    pub prompt: String,
    #[serde(with = "firestore::serialize_as_timestamp")]
    pub created_at: DateTime<Utc>,
}

/// A single planned workout, owned by exactly one plan (`workouts`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Workout {
    /// Workout ID (also used as document ID)
    pub id: String,
    pub user_id: String,
    /// Owning plan
    pub plan_id: String,
    /// Scheduled day (midnight UTC)
    #[serde(with = "firestore::serialize_as_timestamp")]
    pub date: DateTime<Utc>,
    #[serde(rename = "type")]
    pub workout_type: String,
    /// Duration in minutes
    pub duration: u32,
    pub notes: String,
    #[serde(with = "firestore::serialize_as_timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "firestore::serialize_as_timestamp")]
    pub updated_at: DateTime<Utc>,
}

/// What the caller learns about a freshly stored plan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanOutcome {
    pub plan_id: String,
    pub title: String,
    pub workout_count: usize,
}
