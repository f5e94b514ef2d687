// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Model output before and after validation.
//!
//! `CandidatePlan` holds whatever the model produced, field by field, as raw
//! JSON. Only `services::validator` can turn it into a `ValidatedPlan`, which
//! is the sole input the persister accepts.

use chrono::{DateTime, Utc};
use serde_json::Value;

/// Untrusted plan as returned by the generator.
#[derive(Debug, Clone, Default)]
pub struct CandidatePlan {
    pub title: Option<String>,
    /// `None` when the model output had no workout array at all.
    pub workouts: Option<Vec<CandidateWorkout>>,
}

/// Untrusted workout entry; every field is kept exactly as the model sent it.
#[derive(Debug, Clone, Default)]
pub struct CandidateWorkout {
    pub date: Option<Value>,
    pub workout_type: Option<Value>,
    pub duration: Option<Value>,
    pub notes: Option<Value>,
}

impl CandidateWorkout {
    /// Pick the known fields out of one array element. Anything that is not a
    /// JSON object yields an entry with every field missing.
    pub fn from_value(value: &Value) -> Self {
        let field = |name: &str| value.get(name).filter(|v| !v.is_null()).cloned();
        Self {
            date: field("date"),
            workout_type: field("type"),
            duration: field("duration"),
            notes: field("notes"),
        }
    }
}

/// Plan that passed validation and may be persisted.
#[derive(Debug, Clone)]
pub struct ValidatedPlan {
    title: String,
    workouts: Vec<PlannedWorkout>,
}

/// Workout that passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedWorkout {
    pub date: DateTime<Utc>,
    pub workout_type: String,
    pub duration_minutes: u32,
    pub notes: String,
}

impl ValidatedPlan {
    pub(crate) fn new(title: String, workouts: Vec<PlannedWorkout>) -> Self {
        Self { title, workouts }
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn workouts(&self) -> &[PlannedWorkout] {
        &self.workouts
    }
}
