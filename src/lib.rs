// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Training Planner: AI-generated training plans from recent activity.
//!
//! This crate provides the backend endpoint that checks a user's tier and
//! quota, summarizes their recent activities, asks a language model for a
//! four-week plan, validates it, and stores it with its workouts.

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod time_utils;

use config::Config;
use db::{ActivityStore, PlanStore, SubscriptionStore};
use services::{
    ActivityAggregator, IdentityVerifier, PlanGenerator, PlanModel, PlanPersister, PlanPipeline,
    QuotaEnforcer,
};
use std::sync::Arc;

/// Backing stores for the pipeline.
#[derive(Clone)]
pub struct Stores {
    pub subscriptions: Arc<dyn SubscriptionStore>,
    pub activities: Arc<dyn ActivityStore>,
    pub plans: Arc<dyn PlanStore>,
}

impl Stores {
    /// Use one value for every store.
    pub fn single<S>(store: S) -> Self
    where
        S: SubscriptionStore + ActivityStore + PlanStore + 'static,
    {
        let store = Arc::new(store);
        Self {
            subscriptions: store.clone(),
            activities: store.clone(),
            plans: store,
        }
    }
}

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub pipeline: PlanPipeline,
}

impl AppState {
    /// Wire the pipeline from configuration and injected collaborators.
    pub fn new(
        config: Config,
        stores: Stores,
        identity: Arc<dyn IdentityVerifier>,
        model: Arc<dyn PlanModel>,
    ) -> Self {
        let quota = QuotaEnforcer::new(
            stores.subscriptions,
            stores.plans.clone(),
            config.free_plans_per_window,
            config.quota_window_days,
        );
        let activities = ActivityAggregator::new(stores.activities, config.max_activity_count);
        let generator = PlanGenerator::new(model, config.openai_max_retries);
        let persister = PlanPersister::new(stores.plans);

        let pipeline = PlanPipeline::new(identity, quota, activities, generator, persister);

        Self { config, pipeline }
    }
}
