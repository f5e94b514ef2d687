// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firestore client wrapper with typed operations.
//!
//! Provides high-level operations for:
//! - Subscriptions (read-only, keyed by user id)
//! - Activities (imported history, queried newest first)
//! - Workout plans and their workouts

use crate::db::{collections, ActivityStore, PlanStore, SubscriptionStore};
use crate::error::AppError;
use crate::models::{ActivityRecord, PersistedPlan, Subscription, Workout};
use async_trait::async_trait;
use chrono::{DateTime, Utc};

// Firestore limits batch/transaction writes to 500 operations.
// We use a safe limit of 400 to allow headroom.
const BATCH_SIZE: usize = 400;

/// Firestore database client.
#[derive(Clone)]
pub struct FirestoreDb {
    client: Option<firestore::FirestoreDb>,
}

impl FirestoreDb {
    /// Create a new Firestore client.
    ///
    /// For local development with emulator, set FIRESTORE_EMULATOR_HOST.
    pub async fn new(project_id: &str) -> Result<Self, AppError> {
        if std::env::var("FIRESTORE_EMULATOR_HOST").is_ok() {
            return Self::create_emulator_client(project_id).await;
        }

        let client = firestore::FirestoreDb::new(project_id).await.map_err(|e| {
            AppError::Internal(anyhow::anyhow!("Failed to connect to Firestore: {}", e))
        })?;

        tracing::info!(project = project_id, "Connected to Firestore");

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a Firestore client for the emulator with unauthenticated access.
    async fn create_emulator_client(project_id: &str) -> Result<Self, AppError> {
        tracing::info!("Using unauthenticated connection for Firestore Emulator");

        let token_source = gcloud_sdk::ExternalJwtFunctionSource::new(|| async {
            Ok(gcloud_sdk::Token {
                token_type: "Bearer".to_string(),
                token: gcloud_sdk::SecretValue::new(
                    "eyJhbGciOiJub25lIn0.eyJ1aWQiOiJ0ZXN0In0."
                        .to_string()
                        .into(),
                ),
                expiry: chrono::Utc::now() + chrono::Duration::hours(1),
            })
        });

        let options = firestore::FirestoreDbOptions::new(project_id.to_string());

        let client = firestore::FirestoreDb::with_options_token_source(
            options,
            gcloud_sdk::GCP_DEFAULT_SCOPES.clone(),
            gcloud_sdk::TokenSourceType::ExternalSource(Box::new(token_source)),
        )
        .await
        .map_err(|e| {
            AppError::Internal(anyhow::anyhow!(
                "Failed to connect to Firestore Emulator: {}",
                e
            ))
        })?;

        tracing::info!(
            project = project_id,
            "Connected to Firestore (Emulator/Unauthenticated)"
        );

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create an offline client. Every operation fails.
    pub fn new_mock() -> Self {
        Self { client: None }
    }

    fn get_client(&self) -> Result<&firestore::FirestoreDb, String> {
        self.client
            .as_ref()
            .ok_or_else(|| "Database not connected (offline mode)".to_string())
    }

    // ─── Helper Methods ────────────────────────────────────────────

    /// Helper to batch write documents using transactions.
    async fn batch_write<T, F>(
        &self,
        items: &[T],
        collection: &str,
        id_extractor: F,
    ) -> Result<(), String>
    where
        T: serde::Serialize + for<'de> serde::Deserialize<'de> + Sync + Send,
        F: Fn(&T) -> String,
    {
        let client = self.get_client()?;

        for chunk in items.chunks(BATCH_SIZE) {
            let mut transaction = client
                .begin_transaction()
                .await
                .map_err(|e| format!("Failed to begin transaction: {}", e))?;

            for item in chunk {
                let doc_id = id_extractor(item);
                client
                    .fluent()
                    .update()
                    .in_col(collection)
                    .document_id(&doc_id)
                    .object(item)
                    .add_to_transaction(&mut transaction)
                    .map_err(|e| {
                        format!("Failed to add write to transaction for {}: {}", collection, e)
                    })?;
            }

            transaction
                .commit()
                .await
                .map_err(|e| format!("Failed to commit batch write: {}", e))?;
        }

        Ok(())
    }

    /// Helper to batch delete documents using transactions.
    async fn batch_delete<T, F>(
        &self,
        items: &[T],
        collection: &str,
        id_extractor: F,
    ) -> Result<(), String>
    where
        F: Fn(&T) -> String,
    {
        let client = self.get_client()?;

        for chunk in items.chunks(BATCH_SIZE) {
            let mut transaction = client
                .begin_transaction()
                .await
                .map_err(|e| format!("Failed to begin transaction: {}", e))?;

            for item in chunk {
                let doc_id = id_extractor(item);
                client
                    .fluent()
                    .delete()
                    .from(collection)
                    .document_id(&doc_id)
                    .add_to_transaction(&mut transaction)
                    .map_err(|e| {
                        format!(
                            "Failed to add deletion to transaction for {}: {}",
                            collection, e
                        )
                    })?;
            }

            transaction
                .commit()
                .await
                .map_err(|e| format!("Failed to commit batch deletion: {}", e))?;
        }

        Ok(())
    }

    /// Get all workouts belonging to a plan.
    pub async fn get_workouts_for_plan(&self, plan_id: &str) -> Result<Vec<Workout>, AppError> {
        let plan_id = plan_id.to_string();
        self.get_client()
            .map_err(AppError::PersistenceFailed)?
            .fluent()
            .select()
            .from(collections::WORKOUTS)
            .filter(move |q| q.for_all([q.field("plan_id").eq(plan_id.clone())]))
            .order_by([("date", firestore::FirestoreQueryDirection::Ascending)])
            .obj()
            .query()
            .await
            .map_err(|e| AppError::PersistenceFailed(e.to_string()))
    }

    /// Get a plan header by ID.
    pub async fn get_plan(&self, plan_id: &str) -> Result<Option<PersistedPlan>, AppError> {
        self.get_client()
            .map_err(AppError::PersistenceFailed)?
            .fluent()
            .select()
            .by_id_in(collections::WORKOUT_PLANS)
            .obj()
            .one(plan_id)
            .await
            .map_err(|e| AppError::PersistenceFailed(e.to_string()))
    }
}

// ─── Subscription Operations ─────────────────────────────────

#[async_trait]
impl SubscriptionStore for FirestoreDb {
    async fn get_subscription(&self, user_id: &str) -> Result<Option<Subscription>, AppError> {
        self.get_client()
            .map_err(AppError::SubscriptionLookupFailed)?
            .fluent()
            .select()
            .by_id_in(collections::SUBSCRIPTIONS)
            .obj()
            .one(user_id)
            .await
            .map_err(|e| AppError::SubscriptionLookupFailed(e.to_string()))
    }
}

// ─── Activity Operations ─────────────────────────────────────

#[async_trait]
impl ActivityStore for FirestoreDb {
    async fn list_activities(
        &self,
        user_id: &str,
        limit: u32,
    ) -> Result<Vec<ActivityRecord>, AppError> {
        let user_id = user_id.to_string();
        self.get_client()
            .map_err(AppError::ActivityFetchFailed)?
            .fluent()
            .select()
            .from(collections::ACTIVITIES)
            .filter(move |q| q.for_all([q.field("user_id").eq(user_id.clone())]))
            .order_by([("date", firestore::FirestoreQueryDirection::Descending)])
            .limit(limit)
            .obj()
            .query()
            .await
            .map_err(|e| AppError::ActivityFetchFailed(e.to_string()))
    }
}

// ─── Plan Operations ─────────────────────────────────────────

#[async_trait]
impl PlanStore for FirestoreDb {
    async fn count_plans(&self, user_id: &str, since: DateTime<Utc>) -> Result<u64, AppError> {
        let user_id = user_id.to_string();
        let plans: Vec<PersistedPlan> = self
            .get_client()
            .map_err(AppError::SubscriptionLookupFailed)?
            .fluent()
            .select()
            .from(collections::WORKOUT_PLANS)
            .filter(move |q| {
                q.for_all([
                    q.field("user_id").eq(user_id.clone()),
                    q.field("created_at")
                        .greater_than_or_equal(firestore::FirestoreTimestamp(since)),
                ])
            })
            .obj()
            .query()
            .await
            .map_err(|e| AppError::SubscriptionLookupFailed(e.to_string()))?;

        Ok(plans.len() as u64)
    }

    async fn insert_plan(&self, plan: &PersistedPlan) -> Result<(), AppError> {
        let _: () = self
            .get_client()
            .map_err(AppError::PersistenceFailed)?
            .fluent()
            .update()
            .in_col(collections::WORKOUT_PLANS)
            .document_id(&plan.id)
            .object(plan)
            .execute()
            .await
            .map_err(|e| AppError::PersistenceFailed(e.to_string()))?;
        Ok(())
    }

    async fn insert_workouts(&self, plan_id: &str, workouts: &[Workout]) -> Result<(), AppError> {
        if let Some(stray) = workouts.iter().find(|w| w.plan_id != plan_id) {
            return Err(AppError::PersistenceFailed(format!(
                "Workout {} does not belong to plan {}",
                stray.id, plan_id
            )));
        }

        self.batch_write(workouts, collections::WORKOUTS, |w: &Workout| w.id.clone())
            .await
            .map_err(AppError::PersistenceFailed)?;

        tracing::debug!(plan_id, count = workouts.len(), "Workouts written");
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
        if workouts.len() + 1 > BATCH_SIZE {
            return Err(AppError::PersistenceFailed(format!(
                "Plan {} has {} workouts, more than one transaction holds",
                plan.id,
                workouts.len()
            )));
        }

        let client = self.get_client().map_err(AppError::PersistenceFailed)?;
        let mut transaction = client.begin_transaction().await.map_err(|e| {
            AppError::PersistenceFailed(format!("Failed to begin transaction: {}", e))
        })?;

        client
            .fluent()
            .update()
            .in_col(collections::WORKOUT_PLANS)
            .document_id(&plan.id)
            .object(plan)
            .add_to_transaction(&mut transaction)
            .map_err(|e| {
                AppError::PersistenceFailed(format!("Failed to add plan to transaction: {}", e))
            })?;

        for workout in workouts {
            client
                .fluent()
                .update()
                .in_col(collections::WORKOUTS)
                .document_id(&workout.id)
                .object(workout)
                .add_to_transaction(&mut transaction)
                .map_err(|e| {
                    AppError::PersistenceFailed(format!(
                        "Failed to add workout to transaction: {}",
                        e
                    ))
                })?;
        }

        transaction.commit().await.map_err(|e| {
            AppError::PersistenceFailed(format!("Transaction commit failed: {}", e))
        })?;

        tracing::debug!(plan_id = %plan.id, workouts = workouts.len(), "Plan created");
        Ok(())
    }

    async fn delete_plan(&self, plan_id: &str) -> Result<(), AppError> {
        let workouts = self.get_workouts_for_plan(plan_id).await?;
        let count = workouts.len();

        self.batch_delete(&workouts, collections::WORKOUTS, |w: &Workout| {
            w.id.clone()
        })
        .await
        .map_err(AppError::PersistenceFailed)?;

        self.get_client()
            .map_err(AppError::PersistenceFailed)?
            .fluent()
            .delete()
            .from(collections::WORKOUT_PLANS)
            .document_id(plan_id)
            .execute()
            .await
            .map_err(|e| AppError::PersistenceFailed(e.to_string()))?;

        tracing::debug!(plan_id, workouts = count, "Deleted plan");
        Ok(())
    }
}
