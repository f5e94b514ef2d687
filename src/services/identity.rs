// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Bearer credential verification.
//!
//! Access tokens are HS256 JWTs issued by the auth backend; the `sub` claim is
//! the opaque user id every later stage works with.

use crate::error::AppError;
use async_trait::async_trait;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};

/// JWT claims structure.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject (user id)
    pub sub: String,
    /// Expiration time (Unix timestamp)
    pub exp: usize,
    /// Issued at (Unix timestamp)
    #[serde(default)]
    pub iat: usize,
    /// Audience
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aud: Option<String>,
}

/// Authenticated user, resolved once per request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
    pub user_id: String,
}

/// Resolves a bearer credential to a user.
#[async_trait]
pub trait IdentityVerifier: Send + Sync {
    async fn verify(&self, credential: &str) -> Result<AuthUser, AppError>;
}

/// Extract the credential from an `Authorization` header value.
///
/// Missing headers, other schemes, and empty tokens are all rejected.
pub fn bearer_credential(header: Option<&str>) -> Result<&str, AppError> {
    let header = header.map(str::trim).filter(|h| !h.is_empty());
    let Some(header) = header else {
        return Err(AppError::Unauthenticated);
    };

    let (scheme, token) = header.split_once(' ').ok_or(AppError::Unauthenticated)?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return Err(AppError::Unauthenticated);
    }

    let token = token.trim();
    if token.is_empty() {
        return Err(AppError::Unauthenticated);
    }
    Ok(token)
}

/// Verifies HS256 access tokens with a shared secret.
pub struct JwtVerifier {
    key: DecodingKey,
    validation: Validation,
}

impl JwtVerifier {
    pub fn new(signing_key: &[u8], audience: Option<&str>) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        match audience {
            Some(aud) => validation.set_audience(&[aud]),
            None => validation.validate_aud = false,
        }

        Self {
            key: DecodingKey::from_secret(signing_key),
            validation,
        }
    }
}

#[async_trait]
impl IdentityVerifier for JwtVerifier {
    async fn verify(&self, credential: &str) -> Result<AuthUser, AppError> {
        let token_data = decode::<Claims>(credential, &self.key, &self.validation).map_err(|e| {
            tracing::debug!(error = %e, "Rejected bearer token");
            AppError::Unauthenticated
        })?;

        let user_id = token_data.claims.sub.trim();
        if user_id.is_empty() {
            return Err(AppError::Unauthenticated);
        }

        Ok(AuthUser {
            user_id: user_id.to_string(),
        })
    }
}

/// Create an access token for a user (local development and tests).
pub fn create_jwt(
    user_id: &str,
    signing_key: &[u8],
    audience: Option<&str>,
) -> anyhow::Result<String> {
    use jsonwebtoken::{encode, EncodingKey, Header};
    use std::time::{SystemTime, UNIX_EPOCH};

    let now = SystemTime::now().duration_since(UNIX_EPOCH)?.as_secs() as usize;

    let claims = Claims {
        sub: user_id.to_string(),
        iat: now,
        exp: now + 60 * 60, // 1 hour
        aud: audience.map(str::to_string),
    };

    Ok(encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(signing_key),
    )?)
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEY: &[u8] = b"test_jwt_key_32_bytes_minimum!!";

    #[test]
    fn test_bearer_credential() {
        assert_eq!(bearer_credential(Some("Bearer abc.def")).unwrap(), "abc.def");
        assert_eq!(bearer_credential(Some("bearer abc")).unwrap(), "abc");
        assert!(bearer_credential(None).is_err());
        assert!(bearer_credential(Some("")).is_err());
        assert!(bearer_credential(Some("Bearer ")).is_err());
        assert!(bearer_credential(Some("Basic dXNlcjpwYXNz")).is_err());
        assert!(bearer_credential(Some("abc.def")).is_err());
    }

    #[tokio::test]
    async fn test_valid_token_resolves_user() {
        let verifier = JwtVerifier::new(KEY, Some("authenticated"));
        let token = create_jwt("user-123", KEY, Some("authenticated")).unwrap();

        let user = verifier.verify(&token).await.unwrap();
        assert_eq!(user.user_id, "user-123");
    }

    #[tokio::test]
    async fn test_wrong_key_rejected() {
        let verifier = JwtVerifier::new(KEY, None);
        let token = create_jwt("user-123", b"some_other_key_entirely_32bytes", None).unwrap();

        assert!(matches!(
            verifier.verify(&token).await,
            Err(AppError::Unauthenticated)
        ));
    }

    #[tokio::test]
    async fn test_wrong_audience_rejected() {
        let verifier = JwtVerifier::new(KEY, Some("authenticated"));
        let token = create_jwt("user-123", KEY, Some("anon")).unwrap();

        assert!(verifier.verify(&token).await.is_err());
    }

    #[tokio::test]
    async fn test_garbage_rejected() {
        let verifier = JwtVerifier::new(KEY, None);
        assert!(verifier.verify("invalid.token.here").await.is_err());
    }
}
