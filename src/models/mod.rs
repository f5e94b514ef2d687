// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Data models for the application.

pub mod activity;
pub mod candidate;
pub mod plan;
pub mod subscription;

pub use activity::{ActivityRecord, ActivitySummary};
pub use candidate::{CandidatePlan, CandidateWorkout, PlannedWorkout, ValidatedPlan};
pub use plan::{GenerationRequest, PersistedPlan, PlanOutcome, Workout};
pub use subscription::{Subscription, SubscriptionStatus, Tier};
