use std::ops::Deref;
use std::sync::Arc;

use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation};
use uuid::Uuid;

use crate::app::AppState;
use crate::authz::{Principal, Role};
use crate::errors::AppError;

/// Sessions live for a fixed 24 hours and are never refreshed.
pub const SESSION_TTL_HOURS: i64 = 24;

/// Signs and verifies session tokens with a symmetric HS256 key.
#[derive(Debug, Clone)]
pub struct JwtConfig {
    secret: Arc<Vec<u8>>,
}

/// The only outcome of a failed verification. The cause is logged, never returned.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("no valid session")]
pub struct Unauthenticated;

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct TokenClaims {
    pub sub: Uuid,
    pub email: String,
    pub name: String,
    pub role: Role,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub organization_id: Option<Uuid>,
    pub iat: i64,
    pub exp: i64,
}

impl TokenClaims {
    pub fn principal(&self) -> Principal {
        Principal {
            user_id: self.sub,
            email: self.email.clone(),
            name: self.name.clone(),
            role: self.role,
            organization_id: self.organization_id,
        }
    }
}

impl JwtConfig {
    pub fn new(secret: impl Into<Vec<u8>>) -> Result<Self, AppError> {
        let secret = secret.into();
        if secret.is_empty() {
            return Err(AppError::configuration("JWT_SECRET must not be empty"));
        }

        Ok(Self {
            secret: Arc::new(secret),
        })
    }

    pub fn from_env() -> Result<Self, AppError> {
        let secret = std::env::var("JWT_SECRET").map_err(|_| AppError::configuration("JWT_SECRET not set"))?;
        Self::new(secret)
    }

    pub fn issue(&self, principal: &Principal) -> Result<String, AppError> {
        self.issue_at(principal, Utc::now())
    }

    /// Issues a token as if the clock read `now`.
    pub fn issue_at(&self, principal: &Principal, now: DateTime<Utc>) -> Result<String, AppError> {
        if !principal.has_valid_scope() {
            return Err(AppError::internal(format!(
                "refusing to issue a {} session without an organization",
                principal.role
            )));
        }

        let exp = now + Duration::hours(SESSION_TTL_HOURS);
        let claims = TokenClaims {
            sub: principal.user_id,
            email: principal.email.clone(),
            name: principal.name.clone(),
            role: principal.role,
            organization_id: principal.organization_id,
            iat: now.timestamp(),
            exp: exp.timestamp(),
        };

        jsonwebtoken::encode(&Header::default(), &claims, &EncodingKey::from_secret(&self.secret))
            .map_err(|err| AppError::internal(format!("failed to sign token: {err}")))
    }

    pub fn verify(&self, token: &str) -> Result<TokenClaims, Unauthenticated> {
        let mut validation = Validation::default();
        validation.validate_exp = true;

        jsonwebtoken::decode::<TokenClaims>(token, &DecodingKey::from_secret(&self.secret), &validation)
            .map(|data| data.claims)
            .map_err(|err| {
                tracing::debug!(error = %err, "session token rejected");
                Unauthenticated
            })
    }
}

/// Verified caller of a JSON API handler, taken from `Authorization: Bearer`.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub principal: Principal,
}

impl Deref for AuthUser {
    type Target = Principal;

    fn deref(&self) -> &Self::Target {
        &self.principal
    }
}

pub fn bearer_token(parts: &Parts) -> Option<&str> {
    parts
        .headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts).ok_or_else(|| AppError::unauthorized("Authorization header missing"))?;

        let claims = state
            .jwt
            .verify(token)
            .map_err(|err| AppError::unauthorized(err.to_string()))?;

        Ok(AuthUser {
            principal: claims.principal(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn codec() -> JwtConfig {
        JwtConfig::new("unit-test-secret").unwrap()
    }

    fn staff() -> Principal {
        Principal {
            user_id: Uuid::new_v4(),
            email: "grace@school.test".to_string(),
            name: "Grace Hopper".to_string(),
            role: Role::Staff,
            organization_id: Some(Uuid::new_v4()),
        }
    }

    #[test]
    fn verify_returns_issued_identity() {
        let codec = codec();
        let principal = staff();
        let token = codec.issue(&principal).unwrap();

        let claims = codec.verify(&token).unwrap();
        assert_eq!(claims.principal(), principal);
        assert_eq!(claims.exp - claims.iat, SESSION_TTL_HOURS * 3600);
    }

    #[test]
    fn super_admin_token_has_no_organization() {
        let codec = codec();
        let principal = Principal {
            role: Role::SuperAdmin,
            organization_id: None,
            ..staff()
        };

        let claims = codec.verify(&codec.issue(&principal).unwrap()).unwrap();
        assert_eq!(claims.organization_id, None);
        assert_eq!(claims.role, Role::SuperAdmin);
    }

    #[test]
    fn expired_token_is_rejected() {
        let codec = codec();
        let issued = Utc::now() - Duration::hours(SESSION_TTL_HOURS + 1);
        let token = codec.issue_at(&staff(), issued).unwrap();

        assert_eq!(codec.verify(&token).unwrap_err(), Unauthenticated);
    }

    #[test]
    fn foreign_signature_is_rejected() {
        let token = JwtConfig::new("another-secret").unwrap().issue(&staff()).unwrap();
        assert!(codec().verify(&token).is_err());
    }

    #[test]
    fn malformed_and_tampered_tokens_are_rejected() {
        let codec = codec();
        assert!(codec.verify("").is_err());
        assert!(codec.verify("not.a.token").is_err());

        let token = codec.issue(&staff()).unwrap();
        let mut tampered = token.clone();
        tampered.push('x');
        assert!(codec.verify(&tampered).is_err());
    }

    #[test]
    fn tenant_session_without_organization_is_not_issued() {
        let orphan = Principal {
            organization_id: None,
            ..staff()
        };
        assert!(codec().issue(&orphan).is_err());
    }

    #[test]
    fn empty_secret_is_a_configuration_error() {
        assert!(matches!(JwtConfig::new(""), Err(AppError::Configuration(_))));
    }
}
