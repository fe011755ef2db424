use argon2::{
    Algorithm, Argon2, Params, PasswordHash, PasswordHasher, PasswordVerifier, Version,
    password_hash::{
        SaltString,
        rand_core::{OsRng, RngCore},
    },
};
use sha2::{Digest, Sha256};

use crate::{
    error::{ApiError, ApiResult},
    models::PublicUser,
    repository::{RepoError, Repository},
};

/// Credentials
///
/// Password hashing and verification. Production uses the Argon2id defaults; tests
/// build a cheap instance with `Credentials::fast()` so registration stays quick.
#[derive(Clone, Default)]
pub struct Credentials {
    argon2: Argon2<'static>,
}

impl Credentials {
    pub fn new() -> Self {
        Self::default()
    }

    /// Minimal-cost Argon2id parameters. Only meant for test setups.
    pub fn fast() -> Self {
        let params = Params::new(Params::MIN_M_COST, 1, 1, None).unwrap_or_default();
        Self {
            argon2: Argon2::new(Algorithm::Argon2id, Version::V0x13, params),
        }
    }

    pub fn hash(&self, password: &str) -> ApiResult<String> {
        let salt = SaltString::generate(&mut OsRng);
        self.argon2
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| ApiError::internal(format!("password hashing failed: {e}")))
    }

    /// Compares a candidate password against a stored PHC string. A corrupt stored
    /// hash is an internal error, not a failed comparison.
    pub fn verify(&self, password: &str, stored_hash: &str) -> ApiResult<bool> {
        let parsed = PasswordHash::new(stored_hash)
            .map_err(|e| ApiError::internal(format!("stored hash unreadable: {e}")))?;
        Ok(self
            .argon2
            .verify_password(password.as_bytes(), &parsed)
            .is_ok())
    }
}

/// 32 random bytes from the OS generator, hex-encoded (64 characters).
pub fn generate_session_token() -> String {
    let mut bytes = [0u8; 32];
    OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// backfill_token
///
/// Token assigned to a user found without one while listing the user index.
/// Deterministic for a given server key, but not derivable from the username alone.
pub fn backfill_token(key: &str, username: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(key.as_bytes());
    hasher.update(b":");
    hasher.update(username.as_bytes());
    hex::encode(hasher.finalize())
}

fn require_field(value: &str, name: &str) -> ApiResult<()> {
    if value.trim().is_empty() {
        return Err(ApiError::validation(format!(
            "Invalid input: {name} is required"
        )));
    }
    Ok(())
}

/// register
///
/// Creates the account and its first session. The existence check gives the fast
/// answer; the UNIQUE index catches a concurrent registration of the same name.
pub async fn register(
    repo: &dyn Repository,
    credentials: &Credentials,
    username: &str,
    password: &str,
) -> ApiResult<PublicUser> {
    require_field(username, "username")?;
    require_field(password, "password")?;

    if repo.find_user_by_username(username).await?.is_some() {
        return Err(ApiError::DuplicateUsername);
    }

    let password_hash = credentials.hash(password)?;
    let token = generate_session_token();

    let user = repo
        .create_user(username, &password_hash, &token)
        .await
        .map_err(|e| match e {
            RepoError::DuplicateUsername => ApiError::DuplicateUsername,
            other => other.into(),
        })?;

    tracing::info!(user_id = user.id, "user registered");
    Ok(PublicUser::from(&user))
}

/// login
///
/// Verifies the password and rotates the session token, so any earlier token for this
/// user stops authenticating.
pub async fn login(
    repo: &dyn Repository,
    credentials: &Credentials,
    username: &str,
    password: &str,
) -> ApiResult<PublicUser> {
    require_field(username, "username")?;
    require_field(password, "password")?;

    let mut user = repo
        .find_user_by_username(username)
        .await?
        .ok_or_else(|| ApiError::not_found("User"))?;

    if !credentials.verify(password, &user.password)? {
        tracing::debug!(user_id = user.id, "login rejected: wrong password");
        return Err(ApiError::unauthorized("Invalid password"));
    }

    let token = generate_session_token();
    repo.set_user_token(user.id, Some(&token)).await?;
    user.token = Some(token);

    tracing::info!(user_id = user.id, "user logged in");
    Ok(PublicUser::from(&user))
}

/// signout
///
/// Clears the session of whoever holds `token`.
pub async fn signout(repo: &dyn Repository, token: &str) -> ApiResult<()> {
    let user = repo
        .find_user_by_token(token)
        .await?
        .ok_or_else(|| ApiError::not_found("User"))?;

    repo.set_user_token(user.id, None).await?;
    tracing::info!(user_id = user.id, "user signed out");
    Ok(())
}
