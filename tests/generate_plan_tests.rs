// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! End-to-end tests for plan generation over the in-memory store.

mod common;

use axum::http::StatusCode;
use chrono::{Duration, Utc};
use common::*;
use training_planner::db::{MemoryDb, PlanStore};
use training_planner::models::{PersistedPlan, SubscriptionStatus, Tier};
use training_planner::services::ModelError;
use tower::ServiceExt;

async fn add_plan(db: &MemoryDb, user_id: &str, days_ago: i64) {
    db.insert_plan(&PersistedPlan {
        id: uuid::Uuid::new_v4().to_string(),
        user_id: user_id.to_string(),
        title: "Earlier Plan".to_string(),
        prompt: String::new(),
        created_at: Utc::now() - Duration::days(days_ago),
    })
    .await
    .unwrap();
}

#[tokio::test]
async fn test_free_user_generates_plan() {
    let db = MemoryDb::new();
    subscribe(&db, "runner-1", Tier::Free, SubscriptionStatus::Active);
    seed_activities(&db, "runner-1", 2);

    let model = MockModel::returning(plan_json(16).to_string());
    let (app, state) = create_test_app(&db, model.clone());
    let token = create_test_jwt("runner-1", &state);

    let response = app
        .oneshot(generate_request(
            Some(&token),
            r#"{"goal":"Run a sub-25 5K","raceType":"5K","fitnessLevel":"intermediate"}"#,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["workout_count"], 16);
    let plan_id = body["plan_id"].as_str().unwrap().to_string();
    assert!(body["title"]
        .as_str()
        .unwrap()
        .starts_with("Run a sub-25 5K Plan ("));

    let plans = db.plans_for_user("runner-1");
    assert_eq!(plans.len(), 1);
    assert_eq!(plans[0].id, plan_id);
    assert_eq!(db.workouts_for_plan(&plan_id).len(), 16);

    assert_eq!(model.calls(), 1);
    let prompt = &model.prompts()[0];
    assert!(prompt.contains("Run a sub-25 5K"));
    assert!(prompt.contains("5K"));
    assert_eq!(prompt.matches("km, ").count(), 2, "one line per activity");
    assert_eq!(plans[0].prompt, *prompt, "stored prompt matches model input");
}

#[tokio::test]
async fn test_alternate_route_generates_plan() {
    let db = MemoryDb::new();
    subscribe(&db, "runner-1", Tier::Pro, SubscriptionStatus::Active);

    let (app, state) = create_test_app(&db, MockModel::returning(plan_json(4).to_string()));
    let token = create_test_jwt("runner-1", &state);

    let mut request = generate_request(Some(&token), "{}");
    *request.uri_mut() = "/api/plans/generate".parse().unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["workout_count"], 4);
    assert!(body["title"].as_str().unwrap().starts_with("Fitness Plan ("));
}

#[tokio::test]
async fn test_no_activity_history_still_generates() {
    let db = MemoryDb::new();
    subscribe(&db, "runner-1", Tier::Free, SubscriptionStatus::Active);

    let model = MockModel::returning(plan_json(16).to_string());
    let (app, state) = create_test_app(&db, model.clone());
    let token = create_test_jwt("runner-1", &state);

    let response = app
        .oneshot(generate_request(Some(&token), "{}"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(model.prompts()[0].contains("no activity history available"));
}

#[tokio::test]
async fn test_non_integer_duration_rejected() {
    let db = MemoryDb::new();
    subscribe(&db, "runner-1", Tier::Free, SubscriptionStatus::Active);

    let mut plan = plan_json(16);
    plan["workouts"][5]["duration"] = serde_json::json!("forty");

    let (app, state) = create_test_app(&db, MockModel::returning(plan.to_string()));
    let token = create_test_jwt("runner-1", &state);

    let response = app
        .oneshot(generate_request(Some(&token), "{}"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = body_json(response).await;
    let error = body["error"].as_str().unwrap();
    assert!(error.contains("workouts[5].duration"), "got: {}", error);

    assert_eq!(db.plan_count(), 0);
    assert_eq!(db.workout_count(), 0);
}

#[tokio::test]
async fn test_empty_workout_list_rejected() {
    let db = MemoryDb::new();
    subscribe(&db, "runner-1", Tier::Pro, SubscriptionStatus::Active);

    let (app, state) = create_test_app(&db, MockModel::returning(r#"{"workouts":[]}"#));
    let token = create_test_jwt("runner-1", &state);

    let response = app
        .oneshot(generate_request(Some(&token), "{}"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(db.plan_count(), 0);
}

#[tokio::test]
async fn test_free_user_over_quota_never_calls_model() {
    let db = MemoryDb::new();
    subscribe(&db, "runner-1", Tier::Free, SubscriptionStatus::Active);
    add_plan(&db, "runner-1", 3).await;

    let model = MockModel::returning(plan_json(16).to_string());
    let (app, state) = create_test_app(&db, model.clone());
    let token = create_test_jwt("runner-1", &state);

    let response = app
        .oneshot(generate_request(Some(&token), "{}"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let body = body_json(response).await;
    assert_eq!(
        body["error"],
        "Free tier limit reached. You can generate 1 plan per month. Upgrade to Pro for unlimited plans."
    );
    assert_eq!(model.calls(), 0);
    assert_eq!(db.plans_for_user("runner-1").len(), 1);
}

#[tokio::test]
async fn test_quota_window_expires() {
    let db = MemoryDb::new();
    subscribe(&db, "runner-1", Tier::Free, SubscriptionStatus::Active);
    add_plan(&db, "runner-1", 45).await;

    let (app, state) = create_test_app(&db, MockModel::returning(plan_json(16).to_string()));
    let token = create_test_jwt("runner-1", &state);

    let response = app
        .oneshot(generate_request(Some(&token), "{}"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(db.plans_for_user("runner-1").len(), 2);
}

#[tokio::test]
async fn test_pro_user_not_limited() {
    let db = MemoryDb::new();
    subscribe(&db, "runner-1", Tier::Pro, SubscriptionStatus::Active);
    for days_ago in 0..10 {
        add_plan(&db, "runner-1", days_ago).await;
    }

    let (app, state) = create_test_app(&db, MockModel::returning(plan_json(16).to_string()));
    let token = create_test_jwt("runner-1", &state);

    let response = app
        .oneshot(generate_request(Some(&token), "{}"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(db.plans_for_user("runner-1").len(), 11);
}

#[tokio::test]
async fn test_repeated_requests_create_distinct_plans() {
    let db = MemoryDb::new();
    subscribe(&db, "runner-1", Tier::Pro, SubscriptionStatus::Active);

    let (app, state) = create_test_app(&db, MockModel::returning(plan_json(8).to_string()));
    let token = create_test_jwt("runner-1", &state);
    let body = r#"{"goal":"Base building"}"#;

    let first = app
        .clone()
        .oneshot(generate_request(Some(&token), body))
        .await
        .unwrap();
    let second = app
        .oneshot(generate_request(Some(&token), body))
        .await
        .unwrap();

    let first = body_json(first).await;
    let second = body_json(second).await;
    assert_ne!(first["plan_id"], second["plan_id"]);
    assert_eq!(db.plan_count(), 2);
    assert_eq!(db.workout_count(), 16);
}

#[tokio::test]
async fn test_missing_subscription_is_error() {
    let db = MemoryDb::new();

    let model = MockModel::returning(plan_json(16).to_string());
    let (app, state) = create_test_app(&db, model.clone());
    let token = create_test_jwt("runner-1", &state);

    let response = app
        .oneshot(generate_request(Some(&token), "{}"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(model.calls(), 0);
}

#[tokio::test]
async fn test_activity_fetch_failure_is_error() {
    let db = MemoryDb::new();
    subscribe(&db, "runner-1", Tier::Pro, SubscriptionStatus::Active);
    db.fail_activity_reads(true);

    let model = MockModel::returning(plan_json(16).to_string());
    let (app, state) = create_test_app(&db, model.clone());
    let token = create_test_jwt("runner-1", &state);

    let response = app
        .oneshot(generate_request(Some(&token), "{}"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = body_json(response).await;
    assert!(body["error"]
        .as_str()
        .unwrap()
        .contains("recent activities"));
    assert_eq!(model.calls(), 0);
}

#[tokio::test]
async fn test_generation_failure_hides_details() {
    let db = MemoryDb::new();
    subscribe(&db, "runner-1", Tier::Pro, SubscriptionStatus::Active);

    let model = MockModel::failing(ModelError::Fatal(
        "401 invalid api key sk-secret".to_string(),
    ));
    let (app, state) = create_test_app(&db, model);
    let token = create_test_jwt("runner-1", &state);

    let response = app
        .oneshot(generate_request(Some(&token), "{}"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = body_json(response).await;
    assert_eq!(body["error"], "Failed to generate workout plan");
    assert_eq!(db.plan_count(), 0);
}

#[tokio::test]
async fn test_non_json_model_output_rejected() {
    let db = MemoryDb::new();
    subscribe(&db, "runner-1", Tier::Pro, SubscriptionStatus::Active);

    let (app, state) = create_test_app(&db, MockModel::returning("Here is your plan!"));
    let token = create_test_jwt("runner-1", &state);

    let response = app
        .oneshot(generate_request(Some(&token), "{}"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(db.plan_count(), 0);
}

#[tokio::test]
async fn test_workout_insert_failure_is_rolled_back() {
    let db = MemoryDb::new();
    subscribe(&db, "runner-1", Tier::Free, SubscriptionStatus::Active);
    db.fail_workout_inserts(true);

    let (app, state) = create_test_app(&db, MockModel::returning(plan_json(16).to_string()));
    let token = create_test_jwt("runner-1", &state);

    let response = app
        .clone()
        .oneshot(generate_request(Some(&token), "{}"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = body_json(response).await;
    assert_eq!(body["error"], "Error saving plan");
    assert_eq!(db.plan_count(), 0);
    assert_eq!(db.workout_count(), 0);

    // The failed attempt must not consume the free plan.
    db.fail_workout_inserts(false);
    let retry = app
        .oneshot(generate_request(Some(&token), "{}"))
        .await
        .unwrap();
    assert_eq!(retry.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_failed_save_with_failed_cleanup_keeps_free_plan() {
    let db = MemoryDb::new();
    subscribe(&db, "runner-1", Tier::Free, SubscriptionStatus::Active);
    db.fail_workout_inserts(true);
    db.fail_plan_deletes(true);

    let (app, state) = create_test_app(&db, MockModel::returning(plan_json(16).to_string()));
    let token = create_test_jwt("runner-1", &state);

    let first = app
        .clone()
        .oneshot(generate_request(Some(&token), "{}"))
        .await
        .unwrap();
    assert_eq!(first.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(db.plan_count(), 0, "no plan header without workouts");

    db.fail_workout_inserts(false);
    db.fail_plan_deletes(false);
    let second = app
        .oneshot(generate_request(Some(&token), "{}"))
        .await
        .unwrap();
    assert_eq!(second.status(), StatusCode::OK);

    let plans = db.plans_for_user("runner-1");
    assert_eq!(plans.len(), 1);
    assert_eq!(db.workouts_for_plan(&plans[0].id).len(), 16);
}

#[tokio::test]
async fn test_activity_count_out_of_range() {
    let db = MemoryDb::new();
    subscribe(&db, "runner-1", Tier::Pro, SubscriptionStatus::Active);

    let model = MockModel::returning(plan_json(16).to_string());
    let (app, state) = create_test_app(&db, model.clone());
    let token = create_test_jwt("runner-1", &state);

    for body in [r#"{"activityCount":0}"#, r#"{"activityCount":51}"#] {
        let response = app
            .clone()
            .oneshot(generate_request(Some(&token), body))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_json(response).await;
        assert!(body["error"]
            .as_str()
            .unwrap()
            .starts_with("Invalid request:"));
    }
    assert_eq!(model.calls(), 0);
}

#[tokio::test]
async fn test_activity_count_limits_prompt_history() {
    let db = MemoryDb::new();
    subscribe(&db, "runner-1", Tier::Pro, SubscriptionStatus::Active);
    seed_activities(&db, "runner-1", 12);

    let model = MockModel::returning(plan_json(16).to_string());
    let (app, state) = create_test_app(&db, model.clone());
    let token = create_test_jwt("runner-1", &state);

    let response = app
        .oneshot(generate_request(Some(&token), r#"{"activityCount":3}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(model.prompts()[0].matches("km, ").count(), 3);
}

#[tokio::test]
async fn test_bad_bodies_rejected() {
    let db = MemoryDb::new();
    subscribe(&db, "runner-1", Tier::Pro, SubscriptionStatus::Active);

    let model = MockModel::returning(plan_json(16).to_string());
    let (app, state) = create_test_app(&db, model.clone());
    let token = create_test_jwt("runner-1", &state);

    for body in ["", "   ", "not json", r#"{"goal": 5}"#] {
        let response = app
            .clone()
            .oneshot(generate_request(Some(&token), body))
            .await
            .unwrap();
        assert_eq!(
            response.status(),
            StatusCode::INTERNAL_SERVER_ERROR,
            "body {:?}",
            body
        );
    }
    assert_eq!(model.calls(), 0);
}
