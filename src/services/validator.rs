// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Candidate plan validation: the trust boundary between model output and
//! storage.
//!
//! Checks run in a fixed order and stop at the first violation, which is
//! reported with the offending field's path.

use crate::error::{AppError, Result};
use crate::models::{CandidatePlan, CandidateWorkout, PlannedWorkout, ValidatedPlan};
use crate::time_utils::parse_plan_date;
use serde_json::Value;

/// Upper bound on workouts accepted from a single generation.
pub const MAX_WORKOUTS: usize = 60;

/// Longest single workout accepted, in minutes.
pub const MAX_DURATION_MINUTES: u32 = 600;

/// Validate a candidate plan.
pub fn validate_plan(candidate: CandidatePlan) -> Result<ValidatedPlan> {
    let title = candidate
        .title
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .ok_or_else(|| AppError::malformed("title", "is missing or empty"))?;

    let entries = candidate
        .workouts
        .filter(|w| !w.is_empty())
        .ok_or_else(|| AppError::malformed("workouts", "must be a non-empty array"))?;

    if entries.len() > MAX_WORKOUTS {
        return Err(AppError::malformed(
            "workouts",
            format!("has {} entries (at most {} allowed)", entries.len(), MAX_WORKOUTS),
        ));
    }

    let workouts = entries
        .iter()
        .enumerate()
        .map(|(i, entry)| validate_workout(i, entry))
        .collect::<Result<Vec<_>>>()?;

    Ok(ValidatedPlan::new(title, workouts))
}

fn validate_workout(index: usize, entry: &CandidateWorkout) -> Result<PlannedWorkout> {
    let field = |name: &str| format!("workouts[{}].{}", index, name);

    let date = entry
        .date
        .as_ref()
        .and_then(Value::as_str)
        .and_then(parse_plan_date)
        .ok_or_else(|| AppError::malformed(field("date"), "must be a YYYY-MM-DD date"))?;

    let workout_type = entry
        .workout_type
        .as_ref()
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| AppError::malformed(field("type"), "must be a non-empty string"))?;

    let duration_minutes = entry
        .duration
        .as_ref()
        .and_then(whole_minutes)
        .filter(|d| (1..=MAX_DURATION_MINUTES).contains(d))
        .ok_or_else(|| {
            AppError::malformed(
                field("duration"),
                format!("must be a whole number of minutes from 1 to {}", MAX_DURATION_MINUTES),
            )
        })?;

    let notes = entry
        .notes
        .as_ref()
        .and_then(Value::as_str)
        .ok_or_else(|| AppError::malformed(field("notes"), "must be a string"))?;

    Ok(PlannedWorkout {
        date,
        workout_type: workout_type.to_string(),
        duration_minutes,
        notes: notes.to_string(),
    })
}

/// Integer minutes, including integral floats such as `45.0`.
fn whole_minutes(value: &Value) -> Option<u32> {
    if let Some(n) = value.as_u64() {
        return u32::try_from(n).ok();
    }
    let f = value.as_f64()?;
    if f.fract() != 0.0 || f < 0.0 || f > f64::from(u32::MAX) {
        return None;
    }
    Some(f as u32)
}
