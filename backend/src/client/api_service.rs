//! Typed HTTP client for the gallery API.
//!
//! Mirrors the server routes one method each, attaches the stored session token as the
//! raw `Authorization` header, and turns non-2xx answers into `ClientError::Api` with
//! the server's `error` message.

use reqwest::{
    Method, RequestBuilder, Response,
    header::{AUTHORIZATION, CONTENT_TYPE},
    multipart::{Form, Part},
};
use serde::{Serialize, de::DeserializeOwned};
use std::{
    fs, io,
    path::PathBuf,
    sync::{Arc, Mutex},
};
use thiserror::Error;

use crate::models::{
    AuthResponse, CommentCreated, CommentListing, CreateCommentRequest, CredentialsRequest,
    ErrorBody, MessageResponse, PhotoCreated, PhotoListing, PublicUser, UserListing,
};

#[derive(Debug, Error)]
pub enum ClientError {
    /// The server answered with a non-success status.
    #[error("{message}")]
    Api { status: u16, message: String },

    #[error("No token found in local storage")]
    NoToken,

    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("token store error: {0}")]
    Store(#[from] io::Error),
}

impl ClientError {
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}

pub type ClientResult<T> = Result<T, ClientError>;

// --- Token persistence ---

/// TokenStore
///
/// Where the session token survives between calls (the browser kept it in
/// `localStorage`).
pub trait TokenStore: Send + Sync {
    fn get(&self) -> Option<String>;
    fn set(&self, token: &str) -> io::Result<()>;
    fn clear(&self) -> io::Result<()>;
}

#[derive(Default)]
pub struct MemoryTokenStore {
    token: Mutex<Option<String>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TokenStore for MemoryTokenStore {
    fn get(&self) -> Option<String> {
        self.token.lock().ok().and_then(|t| t.clone())
    }

    fn set(&self, token: &str) -> io::Result<()> {
        let mut slot = self
            .token
            .lock()
            .map_err(|_| io::Error::other("token store poisoned"))?;
        *slot = Some(token.to_string());
        Ok(())
    }

    fn clear(&self) -> io::Result<()> {
        let mut slot = self
            .token
            .lock()
            .map_err(|_| io::Error::other("token store poisoned"))?;
        *slot = None;
        Ok(())
    }
}

/// FileTokenStore
///
/// Keeps the token in a single file so a CLI session survives restarts. A missing
/// file means signed out.
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl TokenStore for FileTokenStore {
    fn get(&self) -> Option<String> {
        fs::read_to_string(&self.path)
            .ok()
            .map(|raw| raw.trim().to_string())
            .filter(|token| !token.is_empty())
    }

    fn set(&self, token: &str) -> io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, token)
    }

    fn clear(&self) -> io::Result<()> {
        match fs::remove_file(&self.path) {
            Err(e) if e.kind() != io::ErrorKind::NotFound => Err(e),
            _ => Ok(()),
        }
    }
}

// --- Service ---

/// ApiService
///
/// One method per endpoint. Cheap to clone: the HTTP connection pool and the token
/// store are shared.
#[derive(Clone)]
pub struct ApiService {
    http: reqwest::Client,
    base_url: String,
    tokens: Arc<dyn TokenStore>,
}

impl ApiService {
    pub fn new(base_url: impl Into<String>, tokens: Arc<dyn TokenStore>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            tokens,
        }
    }

    /// A service with an in-memory token store.
    pub fn in_memory(base_url: impl Into<String>) -> Self {
        Self::new(base_url, Arc::new(MemoryTokenStore::new()))
    }

    pub fn token(&self) -> Option<String> {
        self.tokens.get()
    }

    pub fn is_signed_in(&self) -> bool {
        self.tokens.get().is_some()
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.http.request(method, self.url(path))
    }

    fn authed(&self, method: Method, path: &str) -> ClientResult<RequestBuilder> {
        let token = self.tokens.get().ok_or(ClientError::NoToken)?;
        Ok(self.request(method, path).header(AUTHORIZATION, token))
    }

    async fn send<T: DeserializeOwned>(&self, label: &str, request: RequestBuilder) -> ClientResult<T> {
        let response = request.send().await?;
        tracing::debug!("[API] {} -> {}", label, response.status());
        decode(response).await
    }

    async fn post_json<B: Serialize, T: DeserializeOwned>(
        &self,
        label: &str,
        request: RequestBuilder,
        body: &B,
    ) -> ClientResult<T> {
        self.send(label, request.json(body)).await
    }

    // --- Session ---

    /// Registers and keeps the returned token.
    pub async fn register(&self, username: &str, password: &str) -> ClientResult<AuthResponse> {
        let body = CredentialsRequest {
            username: username.to_string(),
            password: password.to_string(),
        };
        let auth: AuthResponse = self
            .post_json("register", self.request(Method::POST, "/users/register"), &body)
            .await?;
        self.remember(&auth)?;
        Ok(auth)
    }

    /// Logs in and keeps the rotated token.
    pub async fn login(&self, username: &str, password: &str) -> ClientResult<AuthResponse> {
        let body = CredentialsRequest {
            username: username.to_string(),
            password: password.to_string(),
        };
        let auth: AuthResponse = self
            .post_json("login", self.request(Method::POST, "/users/login"), &body)
            .await?;
        self.remember(&auth)?;
        Ok(auth)
    }

    /// Signs out. The stored token is dropped only once the server confirms.
    pub async fn signout(&self) -> ClientResult<MessageResponse> {
        let request = self.authed(Method::GET, "/users/signout")?;
        let message: MessageResponse = self.send("signout", request).await?;
        self.tokens.clear()?;
        Ok(message)
    }

    pub async fn me(&self) -> ClientResult<PublicUser> {
        let request = self.authed(Method::GET, "/users/me")?;
        self.send("me", request).await
    }

    fn remember(&self, auth: &AuthResponse) -> ClientResult<()> {
        if let Some(token) = &auth.user.token {
            self.tokens.set(token)?;
        }
        Ok(())
    }

    // --- Listings ---

    pub async fn list_users(&self, page: i64, limit: i64) -> ClientResult<UserListing> {
        let path = format!("/users?page={page}&limit={limit}");
        self.send("list users", self.request(Method::GET, &path)).await
    }

    /// Gallery owners, one page at a time.
    pub async fn user_gallery(&self, page: i64, limit: i64) -> ClientResult<UserListing> {
        let path = format!("/gallery?page={page}&limit={limit}");
        self.send("gallery", self.request(Method::GET, &path)).await
    }

    /// Photos of one gallery via `/gallery/{id}/photos`.
    pub async fn gallery_photos(
        &self,
        gallery_id: i64,
        page: i64,
        limit: i64,
    ) -> ClientResult<PhotoListing> {
        let path = format!("/gallery/{gallery_id}/photos?page={page}&limit={limit}");
        self.send("gallery photos", self.request(Method::GET, &path))
            .await
    }

    /// Photos of one user via `/users/{id}/photos` (echoes `limit`).
    pub async fn user_photos(&self, user_id: i64, page: i64, limit: i64) -> ClientResult<PhotoListing> {
        let path = format!("/users/{user_id}/photos?page={page}&limit={limit}");
        self.send("user photos", self.request(Method::GET, &path))
            .await
    }

    pub async fn my_photos(&self, page: i64, limit: i64) -> ClientResult<PhotoListing> {
        let path = format!("/users/me/photos?page={page}&limit={limit}");
        let request = self.authed(Method::GET, &path)?;
        self.send("my photos", request).await
    }

    // --- Photos ---

    pub async fn upload_photo(
        &self,
        title: &str,
        file_name: &str,
        mime_type: &str,
        bytes: Vec<u8>,
    ) -> ClientResult<PhotoCreated> {
        let part = Part::bytes(bytes)
            .file_name(file_name.to_string())
            .mime_str(mime_type)?;
        let form = Form::new().text("title", title.to_string()).part("photo", part);
        let request = self.authed(Method::POST, "/users/me/photos")?.multipart(form);
        self.send("upload photo", request).await
    }

    /// Downloads the raw image together with its content type.
    pub async fn photo_image(&self, photo_id: i64) -> ClientResult<(String, Vec<u8>)> {
        let path = format!("/photos/{photo_id}/image");
        let response = self.request(Method::GET, &path).send().await?;
        let response = ensure_success(response).await?;
        let mime_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("application/octet-stream")
            .to_string();
        let bytes = response.bytes().await?;
        Ok((mime_type, bytes.to_vec()))
    }

    pub async fn delete_photo(&self, gallery_id: i64, photo_id: i64) -> ClientResult<MessageResponse> {
        let path = format!("/users/me/gallery/{gallery_id}/photos/{photo_id}");
        let request = self.authed(Method::DELETE, &path)?;
        self.send("delete photo", request).await
    }

    // --- Comments ---

    pub async fn photo_comments(
        &self,
        photo_id: i64,
        page: i64,
        limit: i64,
    ) -> ClientResult<CommentListing> {
        let path = format!("/users/me/photos/{photo_id}/comments?page={page}&limit={limit}");
        let request = self.authed(Method::GET, &path)?;
        self.send("photo comments", request).await
    }

    pub async fn add_photo_comment(
        &self,
        photo_id: i64,
        content: &str,
        author: &str,
    ) -> ClientResult<CommentCreated> {
        let path = format!("/users/me/photos/{photo_id}/comments");
        let body = CreateCommentRequest {
            content: content.to_string(),
            author: author.to_string(),
        };
        let request = self.authed(Method::POST, &path)?;
        self.post_json("add comment", request, &body).await
    }

    pub async fn delete_comment(
        &self,
        gallery_id: i64,
        comment_id: i64,
    ) -> ClientResult<MessageResponse> {
        let path = format!("/users/me/gallery/{gallery_id}/comments/{comment_id}");
        let request = self.authed(Method::DELETE, &path)?;
        self.send("delete comment", request).await
    }
}

async fn ensure_success(response: Response) -> ClientResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let text = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorBody>(&text)
        .map(|body| body.error)
        .unwrap_or_else(|_| {
            if text.is_empty() {
                status.canonical_reason().unwrap_or("Request failed").to_string()
            } else {
                text
            }
        });
    Err(ClientError::Api {
        status: status.as_u16(),
        message,
    })
}

async fn decode<T: DeserializeOwned>(response: Response) -> ClientResult<T> {
    let response = ensure_success(response).await?;
    Ok(response.json::<T>().await?)
}
