// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Subscription record, written by the billing integration and only read here.

use serde::{Deserialize, Serialize};

/// Service tier gating plan-generation limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    Free,
    Pro,
}

/// Billing status of a subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionStatus {
    Active,
    Inactive,
    Trialing,
    PastDue,
    Canceled,
    #[serde(other)]
    Unknown,
}

/// Subscription document, keyed by user id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Subscription {
    pub user_id: String,
    pub tier: Tier,
    pub status: SubscriptionStatus,
}

impl Subscription {
    /// Only an active pro subscription lifts the free-tier quota.
    pub fn is_pro(&self) -> bool {
        self.tier == Tier::Pro && self.status == SubscriptionStatus::Active
    }
}
