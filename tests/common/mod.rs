// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Request, Response};
use chrono::{Duration, NaiveDate, Utc};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use training_planner::config::Config;
use training_planner::db::{FirestoreDb, MemoryDb};
use training_planner::models::{ActivityRecord, Subscription, SubscriptionStatus, Tier};
use training_planner::routes::create_router;
use training_planner::services::identity::create_jwt;
use training_planner::services::{JwtVerifier, ModelError, ModelRequest, PlanModel};
use training_planner::{AppState, Stores};

/// Check if emulator is available via environment variable.
#[allow(dead_code)]
pub fn emulator_available() -> bool {
    std::env::var("FIRESTORE_EMULATOR_HOST").is_ok()
}

/// Skip test with message if emulator not available.
#[macro_export]
macro_rules! require_emulator {
    () => {
        if !crate::common::emulator_available() {
            eprintln!("⚠️  Skipping: FIRESTORE_EMULATOR_HOST not set");
            return;
        }
    };
}

/// Create a test database connection.
#[allow(dead_code)]
pub async fn test_db() -> FirestoreDb {
    FirestoreDb::new("test-project")
        .await
        .expect("Failed to connect to Firestore emulator")
}

/// Model double that returns a fixed response and records every prompt.
#[allow(dead_code)]
#[derive(Default)]
pub struct MockModel {
    response: Mutex<Option<Result<String, ModelError>>>,
    prompts: Mutex<Vec<String>>,
    calls: AtomicUsize,
}

#[allow(dead_code)]
impl MockModel {
    pub fn returning(content: impl Into<String>) -> Arc<Self> {
        Arc::new(Self {
            response: Mutex::new(Some(Ok(content.into()))),
            ..Default::default()
        })
    }

    pub fn failing(error: ModelError) -> Arc<Self> {
        Arc::new(Self {
            response: Mutex::new(Some(Err(error))),
            ..Default::default()
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl PlanModel for MockModel {
    async fn generate(&self, request: &ModelRequest<'_>) -> Result<String, ModelError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.prompts.lock().unwrap().push(request.prompt.to_string());
        self.response
            .lock()
            .unwrap()
            .clone()
            .unwrap_or_else(|| Err(ModelError::Fatal("no response configured".to_string())))
    }

    fn name(&self) -> &str {
        "mock"
    }
}

/// Create a test app over an in-memory store and a mock model.
#[allow(dead_code)]
pub fn create_test_app(db: &MemoryDb, model: Arc<MockModel>) -> (axum::Router, Arc<AppState>) {
    let config = Config::test_default();
    let identity = Arc::new(JwtVerifier::new(
        &config.jwt_signing_key,
        config.jwt_audience.as_deref(),
    ));

    let state = Arc::new(AppState::new(
        config,
        Stores::single(db.clone()),
        identity,
        model,
    ));

    (create_router(state.clone()), state)
}

/// Create a bearer token the test app accepts.
#[allow(dead_code)]
pub fn create_test_jwt(user_id: &str, state: &AppState) -> String {
    create_jwt(
        user_id,
        &state.config.jwt_signing_key,
        state.config.jwt_audience.as_deref(),
    )
    .unwrap()
}

#[allow(dead_code)]
pub fn subscribe(db: &MemoryDb, user_id: &str, tier: Tier, status: SubscriptionStatus) {
    db.put_subscription(Subscription {
        user_id: user_id.to_string(),
        tier,
        status,
    });
}

/// Seed `count` runs on consecutive days ending yesterday.
#[allow(dead_code)]
pub fn seed_activities(db: &MemoryDb, user_id: &str, count: i64) {
    for day in 1..=count {
        db.put_activity(ActivityRecord {
            user_id: user_id.to_string(),
            activity_type: "Run".to_string(),
            distance_meters: 8000.0 + day as f64 * 100.0,
            duration_seconds: 2700,
            date: Utc::now() - Duration::days(day),
            source: "strava".to_string(),
        });
    }
}

/// Model output for a plan of `count` workouts starting 2026-11-02.
#[allow(dead_code)]
pub fn plan_json(count: usize) -> serde_json::Value {
    let start = NaiveDate::from_ymd_opt(2026, 11, 2).unwrap();
    let workouts: Vec<_> = (0..count)
        .map(|i| {
            let date = start + Duration::days((i as i64 / 4) * 7 + (i as i64 % 4) * 2);
            serde_json::json!({
                "date": date.format("%Y-%m-%d").to_string(),
                "type": if i % 4 == 3 { "Recovery" } else { "Running" },
                "duration": 30 + (i % 4) * 10,
                "notes": format!("Workout {} of the block", i + 1),
            })
        })
        .collect();
    serde_json::json!({ "workouts": workouts })
}

/// Build a plan generation request.
#[allow(dead_code)]
pub fn generate_request(token: Option<&str>, body: &str) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri("/functions/v1/generate-plan")
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

/// Read a JSON response body.
#[allow(dead_code)]
pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}
