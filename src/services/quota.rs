// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Tier lookup and free-tier plan quota.
//!
//! Non-pro callers are serialized per user from the quota check until their
//! plan is persisted (or the request fails), so two concurrent requests can
//! never both observe an unused quota.

use crate::config::MAX_QUOTA_WINDOW_DAYS;
use crate::db::{PlanStore, SubscriptionStore};
use crate::error::{AppError, Result};
use crate::services::identity::AuthUser;
use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Per-user locks guarding the count-then-insert sequence.
pub type QuotaLocks = Arc<DashMap<String, Arc<Mutex<()>>>>;

/// Proof that the caller may create one plan.
///
/// For free-tier users this holds the per-user quota lock; it must be kept
/// alive until the plan is stored.
#[derive(Debug)]
pub struct QuotaPermit {
    is_pro: bool,
    _lock: Option<HeldLock>,
}

impl QuotaPermit {
    pub fn is_pro(&self) -> bool {
        self.is_pro
    }

    #[cfg(test)]
    pub(crate) fn unlimited() -> Self {
        Self {
            is_pro: true,
            _lock: None,
        }
    }
}

/// A held per-user lock. The map entry is removed on release unless another
/// request is already waiting on it.
#[derive(Debug)]
struct HeldLock {
    locks: QuotaLocks,
    user_id: String,
    guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for HeldLock {
    fn drop(&mut self) {
        drop(self.guard.take());
        self.locks
            .remove_if(&self.user_id, |_, lock| Arc::strong_count(lock) == 1);
    }
}

/// Decides whether a user may generate another plan.
#[derive(Clone)]
pub struct QuotaEnforcer {
    subscriptions: Arc<dyn SubscriptionStore>,
    plans: Arc<dyn PlanStore>,
    locks: QuotaLocks,
    free_plans_per_window: u64,
    window: Duration,
}

impl QuotaEnforcer {
    pub fn new(
        subscriptions: Arc<dyn SubscriptionStore>,
        plans: Arc<dyn PlanStore>,
        free_plans_per_window: u32,
        window_days: i64,
    ) -> Self {
        Self {
            subscriptions,
            plans,
            locks: Arc::new(DashMap::new()),
            free_plans_per_window: u64::from(free_plans_per_window),
            window: Duration::days(window_days.clamp(1, MAX_QUOTA_WINDOW_DAYS)),
        }
    }

    /// Check the caller's tier and, for non-pro users, the rolling quota.
    pub async fn check(&self, user: &AuthUser, now: DateTime<Utc>) -> Result<QuotaPermit> {
        let subscription = self
            .subscriptions
            .get_subscription(&user.user_id)
            .await
            .map_err(|e| match e {
                AppError::SubscriptionLookupFailed(_) => e,
                other => AppError::SubscriptionLookupFailed(other.to_string()),
            })?
            .ok_or_else(|| {
                AppError::SubscriptionLookupFailed(format!(
                    "No subscription record for user {}",
                    user.user_id
                ))
            })?;

        if subscription.is_pro() {
            tracing::debug!(user_id = %user.user_id, "Pro subscription, quota not applied");
            return Ok(QuotaPermit {
                is_pro: true,
                _lock: None,
            });
        }

        let lock = self
            .locks
            .entry(user.user_id.clone())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        let held = HeldLock {
            locks: self.locks.clone(),
            user_id: user.user_id.clone(),
            guard: Some(lock.lock_owned().await),
        };

        let since = now - self.window;
        let recent_plans = self
            .plans
            .count_plans(&user.user_id, since)
            .await
            .map_err(|e| AppError::SubscriptionLookupFailed(format!("Plan count failed: {}", e)))?;

        if recent_plans >= self.free_plans_per_window {
            tracing::info!(
                user_id = %user.user_id,
                recent_plans,
                "Free tier quota exhausted"
            );
            return Err(AppError::QuotaExceeded);
        }

        tracing::debug!(user_id = %user.user_id, recent_plans, "Free tier quota available");
        Ok(QuotaPermit {
            is_pro: false,
            _lock: Some(held),
        })
    }
}
