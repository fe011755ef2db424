use crate::models::{Comment, NewPhoto, Photo, User};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{
    SqlitePool,
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    types::Json,
};
use std::{str::FromStr, sync::Arc, time::Duration};
use thiserror::Error;

/// RepoError
///
/// Failures of the persistence layer. Only the username uniqueness violation is a
/// caller mistake; everything else is an internal failure.
#[derive(Debug, Error)]
pub enum RepoError {
    #[error("username already exists")]
    DuplicateUsername,

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("migration error: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),
}

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository Trait
///
/// The persistence contract for users, photos and comments. Handlers, the `AuthUser`
/// extractor and the credential operations only see this trait, so tests can swap in
/// a hand-written mock.
///
/// Every listing returns `(total, rows)` with rows ordered newest first.
#[async_trait]
pub trait Repository: Send + Sync {
    // --- Users ---
    // Fails with `DuplicateUsername` if the name is taken.
    async fn create_user(&self, username: &str, password_hash: &str, token: &str)
    -> RepoResult<User>;
    async fn get_user(&self, id: i64) -> RepoResult<Option<User>>;
    async fn find_user_by_username(&self, username: &str) -> RepoResult<Option<User>>;
    // Exact, byte-for-byte match against the stored token.
    async fn find_user_by_token(&self, token: &str) -> RepoResult<Option<User>>;
    // `None` clears the session. A new token also resets `token_issued_at`.
    async fn set_user_token(&self, id: i64, token: Option<&str>) -> RepoResult<()>;
    async fn list_users(&self, limit: i64, offset: i64) -> RepoResult<(i64, Vec<User>)>;

    // --- Photos ---
    async fn create_photo(&self, photo: NewPhoto) -> RepoResult<Photo>;
    async fn get_photo(&self, id: i64) -> RepoResult<Option<Photo>>;
    async fn list_photos_by_owner(
        &self,
        user_id: i64,
        limit: i64,
        offset: i64,
    ) -> RepoResult<(i64, Vec<Photo>)>;
    /// Deletes the photo and every comment whose `image_id` matches, atomically.
    /// Returns false if the photo did not exist.
    async fn delete_photo(&self, id: i64) -> RepoResult<bool>;

    // --- Comments ---
    async fn create_comment(&self, image_id: i64, author: &str, content: &str)
    -> RepoResult<Comment>;
    async fn get_comment(&self, id: i64) -> RepoResult<Option<Comment>>;
    async fn list_comments(
        &self,
        image_id: i64,
        limit: i64,
        offset: i64,
    ) -> RepoResult<(i64, Vec<Comment>)>;
    async fn delete_comment(&self, id: i64) -> RepoResult<bool>;
}

/// RepositoryState
///
/// The concrete type used to share the persistence layer across the application state.
pub type RepositoryState = Arc<dyn Repository>;

const USER_COLUMNS: &str =
    "id, username, password, token, token_issued_at, created_at, updated_at";
const PHOTO_COLUMNS: &str = "id, title, user_id, image_metadata, created_at, updated_at";
const COMMENT_COLUMNS: &str = "id, image_id, author, content, created_at, updated_at";

/// SqliteRepository
///
/// The concrete implementation of the `Repository` trait, backed by SQLite.
pub struct SqliteRepository {
    pool: SqlitePool,
}

impl SqliteRepository {
    /// Creates a new repository instance using an initialized connection pool.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// connect
    ///
    /// Opens the database named by `db_url` and applies the embedded migrations.
    /// An in-memory database lives inside a single connection, so the pool is pinned
    /// to one connection that never expires.
    pub async fn connect(db_url: &str) -> RepoResult<Self> {
        let options = SqliteConnectOptions::from_str(db_url)?
            .create_if_missing(true)
            .foreign_keys(true);

        let pool_options = if db_url.contains(":memory:") {
            SqlitePoolOptions::new()
                .max_connections(1)
                .min_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            SqlitePoolOptions::new()
                .max_connections(5)
                .idle_timeout(Duration::from_secs(600))
        };

        let pool = pool_options.connect_with(options).await?;
        sqlx::migrate!("./migrations").run(&pool).await?;
        tracing::debug!("database ready at {}", db_url);

        Ok(Self::new(pool))
    }
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => db_err.is_unique_violation(),
        _ => false,
    }
}

#[async_trait]
impl Repository for SqliteRepository {
    /// create_user
    ///
    /// Inserts a user with a fresh session token. The UNIQUE constraint on `username`
    /// backs the caller's existence check against concurrent registrations.
    async fn create_user(
        &self,
        username: &str,
        password_hash: &str,
        token: &str,
    ) -> RepoResult<User> {
        let now = Utc::now();
        let sql = format!(
            "INSERT INTO users (username, password, token, token_issued_at, created_at, updated_at) \
             VALUES (?, ?, ?, ?, ?, ?) RETURNING {USER_COLUMNS}"
        );
        sqlx::query_as::<_, User>(&sql)
            .bind(username)
            .bind(password_hash)
            .bind(token)
            .bind(now)
            .bind(now)
            .bind(now)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                if is_unique_violation(&e) {
                    RepoError::DuplicateUsername
                } else {
                    tracing::error!("create_user error: {:?}", e);
                    RepoError::Database(e)
                }
            })
    }

    async fn get_user(&self, id: i64) -> RepoResult<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?");
        Ok(sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn find_user_by_username(&self, username: &str) -> RepoResult<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE username = ?");
        Ok(sqlx::query_as::<_, User>(&sql)
            .bind(username)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn find_user_by_token(&self, token: &str) -> RepoResult<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE token = ? LIMIT 1");
        Ok(sqlx::query_as::<_, User>(&sql)
            .bind(token)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn set_user_token(&self, id: i64, token: Option<&str>) -> RepoResult<()> {
        let now = Utc::now();
        let issued_at = token.map(|_| now);
        sqlx::query("UPDATE users SET token = ?, token_issued_at = ?, updated_at = ? WHERE id = ?")
            .bind(token)
            .bind(issued_at)
            .bind(now)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn list_users(&self, limit: i64, offset: i64) -> RepoResult<(i64, Vec<User>)> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await?;
        let sql = format!(
            "SELECT {USER_COLUMNS} FROM users ORDER BY created_at DESC, id DESC LIMIT ? OFFSET ?"
        );
        let users = sqlx::query_as::<_, User>(&sql)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await?;
        Ok((total, users))
    }

    /// create_photo
    ///
    /// Stores the blob descriptor as JSON next to the title and owner.
    async fn create_photo(&self, photo: NewPhoto) -> RepoResult<Photo> {
        let now = Utc::now();
        let sql = format!(
            "INSERT INTO photos (title, user_id, image_metadata, created_at, updated_at) \
             VALUES (?, ?, ?, ?, ?) RETURNING {PHOTO_COLUMNS}"
        );
        Ok(sqlx::query_as::<_, Photo>(&sql)
            .bind(&photo.title)
            .bind(photo.user_id)
            .bind(Json(&photo.image_metadata))
            .bind(now)
            .bind(now)
            .fetch_one(&self.pool)
            .await?)
    }

    async fn get_photo(&self, id: i64) -> RepoResult<Option<Photo>> {
        let sql = format!("SELECT {PHOTO_COLUMNS} FROM photos WHERE id = ?");
        Ok(sqlx::query_as::<_, Photo>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn list_photos_by_owner(
        &self,
        user_id: i64,
        limit: i64,
        offset: i64,
    ) -> RepoResult<(i64, Vec<Photo>)> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM photos WHERE user_id = ?")
            .bind(user_id)
            .fetch_one(&self.pool)
            .await?;
        let sql = format!(
            "SELECT {PHOTO_COLUMNS} FROM photos WHERE user_id = ? \
             ORDER BY created_at DESC, id DESC LIMIT ? OFFSET ?"
        );
        let photos = sqlx::query_as::<_, Photo>(&sql)
            .bind(user_id)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await?;
        Ok((total, photos))
    }

    /// delete_photo
    ///
    /// Comments first, then the photo, inside one transaction: a failure between the
    /// two statements rolls both back instead of leaving dangling comments.
    async fn delete_photo(&self, id: i64) -> RepoResult<bool> {
        let mut tx = self.pool.begin().await?;

        let comments = sqlx::query("DELETE FROM comments WHERE image_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        let photos = sqlx::query("DELETE FROM photos WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        tracing::debug!(
            photo_id = id,
            comments_removed = comments.rows_affected(),
            "photo deleted"
        );
        Ok(photos.rows_affected() > 0)
    }

    async fn create_comment(
        &self,
        image_id: i64,
        author: &str,
        content: &str,
    ) -> RepoResult<Comment> {
        let now = Utc::now();
        let sql = format!(
            "INSERT INTO comments (image_id, author, content, created_at, updated_at) \
             VALUES (?, ?, ?, ?, ?) RETURNING {COMMENT_COLUMNS}"
        );
        Ok(sqlx::query_as::<_, Comment>(&sql)
            .bind(image_id)
            .bind(author)
            .bind(content)
            .bind(now)
            .bind(now)
            .fetch_one(&self.pool)
            .await?)
    }

    async fn get_comment(&self, id: i64) -> RepoResult<Option<Comment>> {
        let sql = format!("SELECT {COMMENT_COLUMNS} FROM comments WHERE id = ?");
        Ok(sqlx::query_as::<_, Comment>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn list_comments(
        &self,
        image_id: i64,
        limit: i64,
        offset: i64,
    ) -> RepoResult<(i64, Vec<Comment>)> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM comments WHERE image_id = ?")
            .bind(image_id)
            .fetch_one(&self.pool)
            .await?;
        let sql = format!(
            "SELECT {COMMENT_COLUMNS} FROM comments WHERE image_id = ? \
             ORDER BY created_at DESC, id DESC LIMIT ? OFFSET ?"
        );
        let comments = sqlx::query_as::<_, Comment>(&sql)
            .bind(image_id)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await?;
        Ok((total, comments))
    }

    async fn delete_comment(&self, id: i64) -> RepoResult<bool> {
        let result = sqlx::query("DELETE FROM comments WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
