use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use ts_rs::TS;
use utoipa::ToSchema;

// --- Core Application Schemas (Mapped to Database) ---

/// User
///
/// The full `users` row, including the password hash and the current session token.
/// Never serialized directly: responses use `PublicUser` or `UserSummary`.
#[derive(Debug, Clone, FromRow, Default)]
pub struct User {
    pub id: i64,
    pub username: String,
    // Argon2 PHC string.
    pub password: String,
    // Bearer credential; `None` after signout.
    pub token: Option<String>,
    pub token_issued_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// PublicUser
///
/// The session view returned by register, login and `GET /users/me`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct PublicUser {
    pub id: i64,
    pub username: String,
    pub token: Option<String>,
}

impl From<&User> for PublicUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            token: user.token.clone(),
        }
    }
}

/// UserSummary
///
/// A gallery owner as shown in the user/gallery indexes. Carries no credential.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub id: i64,
    pub username: String,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
}

impl From<&User> for UserSummary {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            created_at: user.created_at,
        }
    }
}

/// ImageMetadata
///
/// Blob-location descriptor of an uploaded file, stored as JSON on the photo row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ImageMetadata {
    // Location of the stored file, relative to the process working directory.
    pub path: String,
    pub original_name: String,
    pub mime_type: String,
    pub size: i64,
}

/// Photo
///
/// A row of the `photos` table. `userId` in JSON is the owning user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Photo {
    pub id: i64,
    pub title: String,
    pub user_id: i64,
    #[sqlx(json)]
    pub image_metadata: ImageMetadata,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
    #[ts(type = "string")]
    pub updated_at: DateTime<Utc>,
}

/// NewPhoto
///
/// Everything needed to insert a photo; the owner always comes from the session.
#[derive(Debug, Clone)]
pub struct NewPhoto {
    pub title: String,
    pub user_id: i64,
    pub image_metadata: ImageMetadata,
}

/// Comment
///
/// A row of the `comments` table. `author` is free text supplied by the client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: i64,
    pub image_id: i64,
    pub author: String,
    pub content: String,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
    #[ts(type = "string")]
    pub updated_at: DateTime<Utc>,
}

// --- Request Payloads (Input Schemas) ---

/// CredentialsRequest
///
/// Body of `POST /users/register` and `POST /users/login`.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct CredentialsRequest {
    pub username: String,
    pub password: String,
}

/// CreateCommentRequest
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct CreateCommentRequest {
    pub content: String,
    pub author: String,
}

/// UploadPhotoForm
///
/// Documentation-only schema of the multipart body of `POST /users/me/photos`.
#[derive(Debug, ToSchema)]
#[allow(dead_code)]
pub struct UploadPhotoForm {
    pub title: String,
    #[schema(value_type = String, format = Binary)]
    pub photo: String,
}

// --- Response Schemas (Output) ---

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct AuthResponse {
    pub message: String,
    pub user: PublicUser,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct ErrorBody {
    pub error: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct PhotoCreated {
    pub message: String,
    pub photo_id: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CommentCreated {
    pub message: String,
    pub comment_id: i64,
}

/// UserListing
///
/// One page of gallery owners, newest account first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct UserListing {
    pub page: i64,
    pub total_pages: i64,
    pub users: Vec<UserSummary>,
}

/// PhotoListing
///
/// One page of a gallery. The `/users/...` listings echo `limit`, the `/gallery/...`
/// listing does not.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct PhotoListing {
    pub page: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub limit: Option<i64>,
    pub total_pages: i64,
    pub photos: Vec<Photo>,
}

/// CommentListing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CommentListing {
    pub page: i64,
    pub total_pages: i64,
    pub comments: Vec<Comment>,
}
