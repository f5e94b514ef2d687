// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Recent activity history used as generation context.

use crate::db::ActivityStore;
use crate::error::{AppError, Result};
use crate::models::ActivitySummary;
use crate::services::identity::AuthUser;
use std::sync::Arc;

/// Activities summarized when the caller does not ask for a count.
pub const DEFAULT_ACTIVITY_COUNT: u32 = 10;

/// Loads a bounded, newest-first slice of a user's activities.
#[derive(Clone)]
pub struct ActivityAggregator {
    store: Arc<dyn ActivityStore>,
    max_count: u32,
}

impl ActivityAggregator {
    pub fn new(store: Arc<dyn ActivityStore>, max_count: u32) -> Self {
        Self { store, max_count }
    }

    /// Apply the default and reject counts outside `1..=max_count`.
    pub fn resolve_count(&self, requested: Option<i64>) -> Result<u32> {
        let count = requested.unwrap_or(i64::from(DEFAULT_ACTIVITY_COUNT));
        if count < 1 || count > i64::from(self.max_count) {
            return Err(AppError::InvalidInput(format!(
                "activityCount must be between 1 and {}",
                self.max_count
            )));
        }
        Ok(count as u32)
    }

    /// Fetch up to `count` activities. No history is not an error.
    pub async fn load(&self, user: &AuthUser, count: u32) -> Result<ActivitySummary> {
        let activities = self
            .store
            .list_activities(&user.user_id, count)
            .await
            .map_err(|e| match e {
                AppError::ActivityFetchFailed(_) => e,
                other => AppError::ActivityFetchFailed(other.to_string()),
            })?;

        let mut summary = ActivitySummary::new(activities);
        if summary.len() > count as usize {
            tracing::warn!(
                user_id = %user.user_id,
                returned = summary.len(),
                count,
                "Activity store returned more rows than requested"
            );
            summary = ActivitySummary::new(summary.iter().take(count as usize).cloned().collect());
        }

        tracing::debug!(user_id = %user.user_id, activities = summary.len(), "Activities loaded");
        Ok(summary)
    }
}
