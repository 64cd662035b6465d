use std::env;

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
    response::{IntoResponse, Response},
};
use jsonwebtoken::{DecodingKey, Validation, decode};
use serde::{Deserialize, Serialize};

/// Supplies the bearer token attached to every backend request. Absence means
/// the caller fails closed with `Unauthenticated` before any network I/O.
pub trait TokenProvider: Send + Sync {
    fn token(&self) -> Option<String>;
}

/// Fixed token, handed over at construction (e.g. from a login flow).
#[derive(Clone, Debug, Default)]
pub struct StaticTokenProvider {
    token: Option<String>,
}

impl StaticTokenProvider {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: Some(token.into()),
        }
    }

    pub fn empty() -> Self {
        Self { token: None }
    }
}

impl TokenProvider for StaticTokenProvider {
    fn token(&self) -> Option<String> {
        self.token.clone()
    }
}

/// Reads the token from an environment variable on every call, so rotation
/// does not require rebuilding the client.
#[derive(Clone, Debug)]
pub struct EnvTokenProvider {
    var: String,
}

impl EnvTokenProvider {
    pub fn new(var: impl Into<String>) -> Self {
        Self { var: var.into() }
    }
}

impl Default for EnvTokenProvider {
    fn default() -> Self {
        Self::new("ADMIN_TOKEN")
    }
}

impl TokenProvider for EnvTokenProvider {
    fn token(&self) -> Option<String> {
        env::var(&self.var).ok().filter(|token| !token.is_empty())
    }
}

/// JWT claims expected on requests hitting the admin gateway.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthClaims {
    pub sub: String,
    pub exp: i64,
    pub iat: i64,
    pub session_id: Option<String>,
    pub role: Option<String>,
    pub permissions: Option<Vec<String>>,
}

/// Rejection type returned when auth fails.
#[derive(Debug)]
pub enum AuthError {
    MissingToken,
    InvalidToken,
    MissingSecret,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        use axum::http::StatusCode;
        let status = match self {
            AuthError::MissingToken => StatusCode::UNAUTHORIZED,
            AuthError::InvalidToken => StatusCode::UNAUTHORIZED,
            AuthError::MissingSecret => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let msg = match self {
            AuthError::MissingToken => "missing bearer token",
            AuthError::InvalidToken => "invalid token",
            AuthError::MissingSecret => "server jwt secret not configured",
        };
        (status, msg).into_response()
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthClaims
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let bearer = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .ok_or(AuthError::MissingToken)?;

        let secret = env::var("JWT_SECRET").map_err(|_| AuthError::MissingSecret)?;

        let token_data = decode::<AuthClaims>(
            bearer,
            &DecodingKey::from_secret(secret.as_bytes()),
            &Validation::default(),
        )
        .map_err(|_| AuthError::InvalidToken)?;

        Ok(token_data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn static_provider_returns_its_token() {
        assert_eq!(
            StaticTokenProvider::new("t-1").token().as_deref(),
            Some("t-1")
        );
        assert!(StaticTokenProvider::empty().token().is_none());
    }

    #[test]
    fn env_provider_ignores_empty_values() {
        let provider = EnvTokenProvider::new("TRADE_ADMIN_TEST_TOKEN_UNSET");
        assert!(provider.token().is_none());
    }
}
