// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - one module per plan-generation stage.

pub mod activity;
pub mod generator;
pub mod identity;
pub mod openai;
pub mod persister;
pub mod pipeline;
pub mod prompt;
pub mod quota;
pub mod validator;

pub use activity::ActivityAggregator;
pub use generator::{ModelError, ModelRequest, PlanGenerator, PlanModel, ResponseFormat};
pub use identity::{AuthUser, IdentityVerifier, JwtVerifier};
pub use openai::OpenAiClient;
pub use persister::PlanPersister;
pub use pipeline::{PlanInput, PlanPipeline};
pub use quota::{QuotaEnforcer, QuotaPermit};
