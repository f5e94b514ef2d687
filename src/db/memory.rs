// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Process-local store for development and tests.
//!
//! Clones share the same underlying maps. Failure switches let tests force
//! individual store operations to fail.

use crate::db::{ActivityStore, PlanStore, SubscriptionStore};
use crate::error::AppError;
use crate::models::{ActivityRecord, PersistedPlan, Subscription, Workout};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

#[derive(Default)]
struct Inner {
    subscriptions: DashMap<String, Subscription>,
    activities: DashMap<String, Vec<ActivityRecord>>,
    plans: DashMap<String, PersistedPlan>,
    workouts: DashMap<String, Workout>,
    fail_subscription_reads: AtomicBool,
    fail_activity_reads: AtomicBool,
    fail_workout_inserts: AtomicBool,
    fail_plan_deletes: AtomicBool,
}

/// In-memory implementation of every store trait.
#[derive(Clone, Default)]
pub struct MemoryDb {
    inner: Arc<Inner>,
}

impl MemoryDb {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put_subscription(&self, subscription: Subscription) {
        self.inner
            .subscriptions
            .insert(subscription.user_id.clone(), subscription);
    }

    pub fn put_activity(&self, activity: ActivityRecord) {
        self.inner
            .activities
            .entry(activity.user_id.clone())
            .or_default()
            .push(activity);
    }

    /// Plans owned by a user, oldest first.
    pub fn plans_for_user(&self, user_id: &str) -> Vec<PersistedPlan> {
        let mut plans: Vec<PersistedPlan> = self
            .inner
            .plans
            .iter()
            .filter(|p| p.user_id == user_id)
            .map(|p| p.value().clone())
            .collect();
        plans.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        plans
    }

    /// Workouts owned by a plan, in date order.
    pub fn workouts_for_plan(&self, plan_id: &str) -> Vec<Workout> {
        let mut workouts: Vec<Workout> = self
            .inner
            .workouts
            .iter()
            .filter(|w| w.plan_id == plan_id)
            .map(|w| w.value().clone())
            .collect();
        workouts.sort_by(|a, b| a.date.cmp(&b.date));
        workouts
    }

    pub fn plan_count(&self) -> usize {
        self.inner.plans.len()
    }

    pub fn workout_count(&self) -> usize {
        self.inner.workouts.len()
    }

    pub fn fail_subscription_reads(&self, fail: bool) {
        self.inner
            .fail_subscription_reads
            .store(fail, Ordering::SeqCst);
    }

    pub fn fail_activity_reads(&self, fail: bool) {
        self.inner.fail_activity_reads.store(fail, Ordering::SeqCst);
    }

    /// Make workout writes fail. `insert_workouts` writes half of the rows
    /// first; `create_plan` writes nothing.
    pub fn fail_workout_inserts(&self, fail: bool) {
        self.inner.fail_workout_inserts.store(fail, Ordering::SeqCst);
    }

    pub fn fail_plan_deletes(&self, fail: bool) {
        self.inner.fail_plan_deletes.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl SubscriptionStore for MemoryDb {
    async fn get_subscription(&self, user_id: &str) -> Result<Option<Subscription>, AppError> {
        if self.inner.fail_subscription_reads.load(Ordering::SeqCst) {
            return Err(AppError::SubscriptionLookupFailed(
                "subscription store unavailable".to_string(),
            ));
        }
        Ok(self
            .inner
            .subscriptions
            .get(user_id)
            .map(|s| s.value().clone()))
    }
}

#[async_trait]
impl ActivityStore for MemoryDb {
    async fn list_activities(
        &self,
        user_id: &str,
        limit: u32,
    ) -> Result<Vec<ActivityRecord>, AppError> {
        if self.inner.fail_activity_reads.load(Ordering::SeqCst) {
            return Err(AppError::ActivityFetchFailed(
                "activity store unavailable".to_string(),
            ));
        }
        let mut activities = self
            .inner
            .activities
            .get(user_id)
            .map(|a| a.value().clone())
            .unwrap_or_default();
        activities.sort_by(|a, b| b.date.cmp(&a.date));
        activities.truncate(limit as usize);
        Ok(activities)
    }
}

#[async_trait]
impl PlanStore for MemoryDb {
    async fn count_plans(&self, user_id: &str, since: DateTime<Utc>) -> Result<u64, AppError> {
        Ok(self
            .inner
            .plans
            .iter()
            .filter(|p| p.user_id == user_id && p.created_at >= since)
            .count() as u64)
    }

    async fn insert_plan(&self, plan: &PersistedPlan) -> Result<(), AppError> {
        self.inner.plans.insert(plan.id.clone(), plan.clone());
        Ok(())
    }

    async fn insert_workouts(&self, plan_id: &str, workouts: &[Workout]) -> Result<(), AppError> {
        if !self.inner.plans.contains_key(plan_id) {
            return Err(AppError::PersistenceFailed(format!(
                "Plan {} does not exist",
                plan_id
            )));
        }

        if self.inner.fail_workout_inserts.load(Ordering::SeqCst) {
            for workout in workouts.iter().take(workouts.len() / 2) {
                self.inner.workouts.insert(workout.id.clone(), workout.clone());
            }
            return Err(AppError::PersistenceFailed(
                "workout batch rejected".to_string(),
            ));
        }

        for workout in workouts {
            self.inner.workouts.insert(workout.id.clone(), workout.clone());
        }
        Ok(())
    }

    async fn create_plan(
        &self,
        plan: &PersistedPlan,
        workouts: &[Workout],
    ) -> Result<(), AppError> {
        if let Some(stray) = workouts.iter().find(|w| w.plan_id != plan.id) {
            return Err(AppError::PersistenceFailed(format!(
                "Workout {} does not belong to plan {}",
                stray.id, plan.id
            )));
        }
        if self.inner.fail_workout_inserts.load(Ordering::SeqCst) {
            return Err(AppError::PersistenceFailed(
                "plan transaction rejected".to_string(),
            ));
        }

        // Workouts first so a reader never sees the header without them.
        for workout in workouts {
            self.inner.workouts.insert(workout.id.clone(), workout.clone());
        }
        self.inner.plans.insert(plan.id.clone(), plan.clone());
        Ok(())
    }

    async fn delete_plan(&self, plan_id: &str) -> Result<(), AppError> {
        if self.inner.fail_plan_deletes.load(Ordering::SeqCst) {
            return Err(AppError::PersistenceFailed(
                "plan delete rejected".to_string(),
            ));
        }
        self.inner.workouts.retain(|_, w| w.plan_id != plan_id);
        self.inner.plans.remove(plan_id);
        Ok(())
    }
}
