// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Training Planner API Server
//!
//! Serves the plan generation endpoint backed by Firestore and the OpenAI
//! chat-completions API.

use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use training_planner::{
    config::{Config, StoreBackend},
    db::{FirestoreDb, MemoryDb},
    services::{JwtVerifier, OpenAiClient},
    AppState, Stores,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize structured JSON logging for GCP
    init_logging()?;

    // Load configuration from environment
    let config = Config::from_env()?;
    tracing::info!(port = config.port, "Starting Training Planner API");

    let stores = match config.store_backend {
        StoreBackend::Firestore => Stores::single(FirestoreDb::new(&config.gcp_project_id).await?),
        StoreBackend::Memory => {
            tracing::warn!("Using in-memory store; data will not survive a restart");
            Stores::single(MemoryDb::new())
        }
    };

    let identity = Arc::new(JwtVerifier::new(
        &config.jwt_signing_key,
        config.jwt_audience.as_deref(),
    ));
    let model = Arc::new(OpenAiClient::new(&config)?);

    // Build shared state
    let state = Arc::new(AppState::new(config.clone(), stores, identity, model));

    // Build router
    let app = training_planner::routes::create_router(state);

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Initialize structured JSON logging (GCP-compliant).
fn init_logging() -> anyhow::Result<()> {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("training_planner=debug".parse()?)
                .add_directive("info".parse()?),
        )
        .with(format)
        .init();
    Ok(())
}
