use axum::{
    extract::{FromRef, FromRequestParts},
    http::{header, request::Parts},
};
use chrono::{Duration, Utc};

use crate::{
    config::AppConfig,
    error::ApiError,
    models::User,
    repository::RepositoryState,
};

pub const TOKEN_REQUIRED: &str = "Unauthorized: Token required";
pub const INVALID_TOKEN: &str = "Unauthorized: Invalid token";

/// AuthUser
///
/// The resolved identity of an authenticated request. `token` is the credential that
/// was presented, kept so signout can clear exactly that session.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: i64,
    pub username: String,
    pub token: String,
}

/// AuthUser Extractor Implementation
///
/// Reads the raw `Authorization` header (no `Bearer` prefix is stripped) and looks up
/// the user whose stored token matches it exactly. Tokens are opaque server-side
/// state: there is no signature to check, only the lookup.
///
/// Rejection: `ApiError::Unauthorized` (401) when the header is missing, when no user
/// holds the token, or when the token is older than the configured TTL.
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    RepositoryState: FromRef<S>,
    AppConfig: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let repo = RepositoryState::from_ref(state);
        let config = AppConfig::from_ref(state);

        let token = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .filter(|value| !value.is_empty())
            .ok_or_else(|| {
                tracing::debug!("auth rejected: no token supplied");
                ApiError::unauthorized(TOKEN_REQUIRED)
            })?;

        let user = repo.find_user_by_token(token).await?.ok_or_else(|| {
            tracing::debug!("auth rejected: unknown token");
            ApiError::unauthorized(INVALID_TOKEN)
        })?;

        if is_expired(&user, config.token_ttl_secs) {
            tracing::debug!(user_id = user.id, "auth rejected: token expired");
            return Err(ApiError::unauthorized(INVALID_TOKEN));
        }

        Ok(AuthUser {
            id: user.id,
            username: user.username,
            token: token.to_string(),
        })
    }
}

/// is_expired
///
/// Expiry hook. With no TTL configured a token stays valid until it is rotated or
/// cleared. A token with no recorded issue time is treated as freshly issued.
pub fn is_expired(user: &User, ttl_secs: Option<u64>) -> bool {
    let (Some(ttl), Some(issued_at)) = (ttl_secs, user.token_issued_at) else {
        return false;
    };
    // A TTL too large to represent never expires anything.
    let Some(ttl) = i64::try_from(ttl).ok().and_then(Duration::try_seconds) else {
        return false;
    };
    Utc::now() - issued_at > ttl
}
