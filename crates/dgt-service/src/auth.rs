//! Authentication extractors.
//!
//! End-user requests carry a platform JWT (HS256) with `sub` holding the
//! user UUID and `role` holding the platform role. When no JWT secret is
//! configured, only `test-token:<uuid>:<role>` bearer tokens are
//! accepted, which keeps local development and integration tests free of
//! key material.

use std::sync::Arc;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use jsonwebtoken::{Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};

use dgt_core::{Role, UserId};

use crate::error::ApiError;
use crate::state::AppState;

/// An authenticated user extracted from a bearer token.
#[derive(Debug, Clone)]
pub struct AuthUser {
    /// The user ID.
    pub user_id: UserId,
    /// The user's platform role.
    pub role: Role,
    /// The raw subject claim.
    pub subject: String,
}

impl AuthUser {
    /// Fail with `Forbidden` unless the caller is an admin.
    pub fn require_admin(&self) -> Result<(), ApiError> {
        if self.role == Role::Admin {
            Ok(())
        } else {
            Err(ApiError::Forbidden)
        }
    }
}

/// JWT claims for platform tokens.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwtClaims {
    /// Subject (user UUID).
    pub sub: String,
    /// Platform role: "user", "moderator", or "admin".
    #[serde(default = "default_role")]
    pub role: String,
    /// Issuer.
    pub iss: String,
    /// Expiration time.
    pub exp: i64,
    /// Issued at.
    pub iat: i64,
}

fn default_role() -> String {
    "user".into()
}

fn parse_role(role: &str) -> Result<Role, ApiError> {
    match role {
        "user" => Ok(Role::User),
        "moderator" => Ok(Role::Moderator),
        "admin" => Ok(Role::Admin),
        _ => Err(ApiError::Unauthorized),
    }
}

impl FromRequestParts<Arc<AppState>> for AuthUser {
    type Rejection = ApiError;

    fn from_request_parts<'life0, 'life1, 'async_trait>(
        parts: &'life0 mut Parts,
        state: &'life1 Arc<AppState>,
    ) -> ::core::pin::Pin<
        Box<
            dyn ::core::future::Future<Output = Result<Self, Self::Rejection>>
                + ::core::marker::Send
                + 'async_trait,
        >,
    >
    where
        'life0: 'async_trait,
        'life1: 'async_trait,
        Self: 'async_trait,
    {
        Box::pin(async move {
            let auth_header = parts
                .headers
                .get("authorization")
                .and_then(|v| v.to_str().ok())
                .ok_or(ApiError::Unauthorized)?;

            let token = auth_header
                .strip_prefix("Bearer ")
                .ok_or(ApiError::Unauthorized)?;

            match &state.config.jwt_secret {
                Some(secret) => validate_jwt(token, secret, &state.config.jwt_issuer),
                None => validate_test_token(token),
            }
        })
    }
}

fn validate_jwt(token: &str, secret: &str, issuer: &str) -> Result<AuthUser, ApiError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_issuer(&[issuer]);

    let data = jsonwebtoken::decode::<JwtClaims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )
    .map_err(|err| {
        tracing::debug!(error = %err, "JWT validation failed");
        ApiError::Unauthorized
    })?;

    let user_id = data
        .claims
        .sub
        .parse::<UserId>()
        .map_err(|_| ApiError::Unauthorized)?;
    let role = parse_role(&data.claims.role)?;

    Ok(AuthUser {
        user_id,
        role,
        subject: data.claims.sub,
    })
}

/// Parse a `test-token:<uuid>:<role>` bearer token.
fn validate_test_token(token: &str) -> Result<AuthUser, ApiError> {
    let rest = token
        .strip_prefix("test-token:")
        .ok_or(ApiError::Unauthorized)?;

    let (user_id_str, role_str) = rest.split_once(':').unwrap_or((rest, "user"));
    let user_id = user_id_str
        .parse::<UserId>()
        .map_err(|_| ApiError::Unauthorized)?;
    let role = parse_role(role_str)?;

    Ok(AuthUser {
        user_id,
        role,
        subject: user_id_str.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_parses_uuid_and_role() {
        let user_id = UserId::generate();

        let auth = validate_test_token(&format!("test-token:{user_id}:admin")).unwrap();
        assert_eq!(auth.user_id, user_id);
        assert_eq!(auth.role, Role::Admin);

        // Role defaults to "user" when omitted.
        let auth = validate_test_token(&format!("test-token:{user_id}")).unwrap();
        assert_eq!(auth.role, Role::User);
    }

    #[test]
    fn malformed_test_tokens_are_rejected() {
        assert!(validate_test_token("test-token:not-a-uuid:user").is_err());
        assert!(validate_test_token("something-else").is_err());

        let user_id = UserId::generate();
        assert!(validate_test_token(&format!("test-token:{user_id}:owner")).is_err());
    }

    #[test]
    fn jwt_round_trip() {
        let user_id = UserId::generate();
        let now = chrono::Utc::now().timestamp();
        let claims = JwtClaims {
            sub: user_id.to_string(),
            role: "moderator".into(),
            iss: "degentalk".into(),
            exp: now + 3600,
            iat: now,
        };
        let token = jsonwebtoken::encode(
            &jsonwebtoken::Header::default(),
            &claims,
            &jsonwebtoken::EncodingKey::from_secret(b"secret"),
        )
        .unwrap();

        let auth = validate_jwt(&token, "secret", "degentalk").unwrap();
        assert_eq!(auth.user_id, user_id);
        assert_eq!(auth.role, Role::Moderator);

        assert!(validate_jwt(&token, "wrong-secret", "degentalk").is_err());
        assert!(validate_jwt(&token, "secret", "other-issuer").is_err());
    }
}
