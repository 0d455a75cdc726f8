use std::convert::Infallible;

use axum::{extract::FromRequestParts, http::header};
use jsonwebtoken::{DecodingKey, Validation, decode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppError;

#[derive(Debug, Deserialize, Serialize)]
pub struct Claims {
    pub sub: String,
    pub email: String,
    pub exp: usize,
}

/// Authenticated caller, decoded from the bearer token and passed
/// explicitly into handlers.
#[derive(Debug, Clone)]
pub struct CallerIdentity {
    pub user_id: Uuid,
    pub email: String,
}

impl CallerIdentity {
    /// Display name recorded in the audit trail. The token only carries
    /// the subject id and email, so the email doubles as the name.
    pub fn display_name(&self) -> &str {
        &self.email
    }
}

impl<S> FromRequestParts<S> for CallerIdentity
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        _state: &S,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get(header::AUTHORIZATION)
            .ok_or_else(|| AppError::Unauthorized("No token provided".into()))?;

        let auth_str = auth_header.to_str().map_err(|_| AppError::Forbidden)?;

        let token = auth_str
            .strip_prefix("Bearer ")
            .ok_or(AppError::Forbidden)?
            .trim();

        let secret = std::env::var("JWT_SECRET")
            .map_err(|_| AppError::Internal(anyhow::anyhow!("JWT_SECRET is not set")))?;

        let decoded = decode::<Claims>(
            token,
            &DecodingKey::from_secret(secret.as_bytes()),
            &Validation::default(),
        )
        .map_err(|_| AppError::Forbidden)?;

        let user_id = Uuid::parse_str(&decoded.claims.sub).map_err(|_| AppError::Forbidden)?;

        Ok(CallerIdentity {
            user_id,
            email: decoded.claims.email,
        })
    }
}

/// Best-effort network origin and client agent, captured for the audit
/// trail. Extraction never fails.
#[derive(Debug, Clone, Default)]
pub struct RequestMeta {
    pub ip: Option<String>,
    pub user_agent: Option<String>,
}

impl<S> FromRequestParts<S> for RequestMeta
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        _state: &S,
    ) -> Result<Self, Self::Rejection> {
        let ip = parts
            .headers
            .get("x-forwarded-for")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(',').next())
            .map(|s| s.trim().to_string())
            .or_else(|| {
                parts
                    .headers
                    .get("x-real-ip")
                    .and_then(|v| v.to_str().ok())
                    .map(str::to_string)
            });

        let user_agent = parts
            .headers
            .get(header::USER_AGENT)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        Ok(RequestMeta { ip, user_agent })
    }
}
