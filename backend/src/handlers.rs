use crate::{
    AppState,
    auth::{AuthUser, TOKEN_REQUIRED},
    credentials,
    error::{ApiError, ApiResult},
    models::{
        AuthResponse, Comment, CommentCreated, CommentListing, CreateCommentRequest,
        CredentialsRequest, ErrorBody, MessageResponse, NewPhoto, Photo, PhotoCreated,
        PhotoListing, PublicUser, UploadPhotoForm, UserListing, UserSummary,
    },
    pagination::{PageParams, PageRequest, paginate},
    policy,
};
use axum::{
    Json,
    body::Bytes,
    extract::{
        Multipart, Path, Query, State, multipart::MultipartRejection, rejection::JsonRejection,
    },
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Response},
};

// --- Per-route default page sizes ---

pub const USERS_PAGE_SIZE: i64 = 1;
pub const USER_PHOTOS_PAGE_SIZE: i64 = 1;
pub const COMMENTS_PAGE_SIZE: i64 = 10;
pub const GALLERY_PAGE_SIZE: i64 = 10;
pub const GALLERY_PHOTOS_PAGE_SIZE: i64 = 10;

// --- Input helpers ---

/// Unwraps a JSON body, turning a malformed or wrong-typed payload into a 400 with
/// the `{error}` shape instead of axum's plain-text rejection.
fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> ApiResult<T> {
    payload
        .map(|Json(body)| body)
        .map_err(|rejection| ApiError::validation(format!("Invalid input: {}", rejection.body_text())))
}

fn require_text(value: &str, field: &str) -> ApiResult<()> {
    if value.trim().is_empty() {
        return Err(ApiError::validation(format!("Invalid input: {field} is required")));
    }
    Ok(())
}

/// Path ids arrive as text; anything that is not an integer cannot name a row.
fn path_id(raw: &str, resource: &str) -> ApiResult<i64> {
    raw.parse::<i64>().map_err(|_| ApiError::not_found(resource))
}

async fn load_photo(state: &AppState, raw_id: &str) -> ApiResult<Photo> {
    let id = path_id(raw_id, "Photo")?;
    state
        .repo
        .get_photo(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Photo"))
}

async fn photo_page(
    state: &AppState,
    owner_id: i64,
    page: PageRequest,
) -> ApiResult<(i64, Vec<Photo>)> {
    let (total, photos) = state
        .repo
        .list_photos_by_owner(owner_id, page.limit, page.query_offset())
        .await?;
    Ok((paginate(total, page.page, page.limit).total_pages, photos))
}

async fn comment_page(
    state: &AppState,
    photo_id: i64,
    params: &PageParams,
) -> ApiResult<CommentListing> {
    let page = params.resolve(COMMENTS_PAGE_SIZE);
    let (total, comments) = state
        .repo
        .list_comments(photo_id, page.limit, page.query_offset())
        .await?;
    Ok(CommentListing {
        page: page.page,
        total_pages: paginate(total, page.page, page.limit).total_pages,
        comments,
    })
}

async fn add_comment_to(
    state: &AppState,
    raw_photo_id: &str,
    payload: Result<Json<CreateCommentRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<CommentCreated>)> {
    let body = json_body(payload)?;
    require_text(&body.content, "content")?;
    require_text(&body.author, "author")?;

    let photo = load_photo(state, raw_photo_id).await?;
    let comment = state
        .repo
        .create_comment(photo.id, &body.author, &body.content)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(CommentCreated {
            message: "Comment added successfully".to_string(),
            comment_id: comment.id,
        }),
    ))
}

async fn remove_photo(state: &AppState, photo_id: i64) -> ApiResult<Json<MessageResponse>> {
    if !state.repo.delete_photo(photo_id).await? {
        return Err(ApiError::not_found("Photo"));
    }
    tracing::info!(photo_id, "photo deleted with its comments");
    Ok(Json(MessageResponse::new("Photo deleted successfully")))
}

async fn remove_comment(state: &AppState, comment_id: i64) -> ApiResult<Json<MessageResponse>> {
    if !state.repo.delete_comment(comment_id).await? {
        return Err(ApiError::not_found("Comment"));
    }
    Ok(Json(MessageResponse::new("Comment deleted successfully")))
}

// --- Session Handlers ---

/// register_user
///
/// [Public Route] Creates an account and returns its first session token.
#[utoipa::path(
    post,
    path = "/users/register",
    request_body = CredentialsRequest,
    responses(
        (status = 201, description = "Registered", body = AuthResponse),
        (status = 400, description = "Invalid input or username taken", body = ErrorBody)
    )
)]
pub async fn register_user(
    State(state): State<AppState>,
    payload: Result<Json<CredentialsRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<AuthResponse>)> {
    let body = json_body(payload)?;
    let user = credentials::register(
        state.repo.as_ref(),
        &state.credentials,
        &body.username,
        &body.password,
    )
    .await?;

    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            message: "User registered successfully".to_string(),
            user,
        }),
    ))
}

/// login_user
///
/// [Public Route] Verifies the password and issues a new token. The previous token,
/// if any, stops working.
#[utoipa::path(
    post,
    path = "/users/login",
    request_body = CredentialsRequest,
    responses(
        (status = 200, description = "Logged in", body = AuthResponse),
        (status = 401, description = "Invalid password", body = ErrorBody),
        (status = 404, description = "User not found", body = ErrorBody)
    )
)]
pub async fn login_user(
    State(state): State<AppState>,
    payload: Result<Json<CredentialsRequest>, JsonRejection>,
) -> ApiResult<Json<AuthResponse>> {
    let body = json_body(payload)?;
    let user = credentials::login(
        state.repo.as_ref(),
        &state.credentials,
        &body.username,
        &body.password,
    )
    .await?;

    Ok(Json(AuthResponse {
        message: "Login successful".to_string(),
        user,
    }))
}

/// signout_user
///
/// [Public Route] Clears the session named by the `Authorization` header. Not behind
/// the auth layer: an unknown token answers 404 rather than 401.
#[utoipa::path(
    get,
    path = "/users/signout",
    responses(
        (status = 200, description = "Signed out", body = MessageResponse),
        (status = 401, description = "No token", body = ErrorBody),
        (status = 404, description = "User not found", body = ErrorBody)
    )
)]
pub async fn signout_user(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<Json<MessageResponse>> {
    let token = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .filter(|value| !value.is_empty())
        .ok_or_else(|| ApiError::unauthorized(TOKEN_REQUIRED))?;

    credentials::signout(state.repo.as_ref(), token).await?;
    Ok(Json(MessageResponse::new("User signed out successfully")))
}

/// get_me
///
/// [Authenticated Route] Echoes the resolved session.
#[utoipa::path(
    get,
    path = "/users/me",
    responses(
        (status = 200, description = "Current user", body = PublicUser),
        (status = 401, description = "Unauthorized", body = ErrorBody)
    )
)]
pub async fn get_me(AuthUser { id, username, token }: AuthUser) -> Json<PublicUser> {
    Json(PublicUser {
        id,
        username,
        token: Some(token),
    })
}

// --- User & Gallery Listings ---

/// list_users
///
/// [Public Route] The user index, newest account first. Users found without a token
/// are assigned the keyed backfill token on the way through. Tokens are never part of
/// the response.
#[utoipa::path(
    get,
    path = "/users",
    params(PageParams),
    responses(
        (status = 200, description = "One page of users", body = UserListing),
        (status = 404, description = "No users on this page", body = ErrorBody)
    )
)]
pub async fn list_users(
    State(state): State<AppState>,
    Query(params): Query<PageParams>,
) -> ApiResult<Json<UserListing>> {
    let page = params.resolve(USERS_PAGE_SIZE);
    let (total, users) = state
        .repo
        .list_users(page.limit, page.query_offset())
        .await?;

    if users.is_empty() {
        return Err(ApiError::NotFound("No users found".to_string()));
    }

    for user in users.iter().filter(|u| u.token.is_none()) {
        let token = credentials::backfill_token(&state.config.backfill_key, &user.username);
        state.repo.set_user_token(user.id, Some(&token)).await?;
        tracing::debug!(user_id = user.id, "backfilled missing session token");
    }

    Ok(Json(UserListing {
        page: page.page,
        total_pages: paginate(total, page.page, page.limit).total_pages,
        users: users.iter().map(UserSummary::from).collect(),
    }))
}

/// list_galleries
///
/// [Public Route] Gallery owners for the browsing UI. An empty page is a normal,
/// empty listing.
#[utoipa::path(
    get,
    path = "/gallery",
    params(PageParams),
    responses((status = 200, description = "One page of gallery owners", body = UserListing))
)]
pub async fn list_galleries(
    State(state): State<AppState>,
    Query(params): Query<PageParams>,
) -> ApiResult<Json<UserListing>> {
    let page = params.resolve(GALLERY_PAGE_SIZE);
    let (total, users) = state
        .repo
        .list_users(page.limit, page.query_offset())
        .await?;

    Ok(Json(UserListing {
        page: page.page,
        total_pages: paginate(total, page.page, page.limit).total_pages,
        users: users.iter().map(UserSummary::from).collect(),
    }))
}

/// get_user_photos
///
/// [Public Route] One page of a user's gallery, echoing the effective `limit`.
#[utoipa::path(
    get,
    path = "/users/{id}/photos",
    params(("id" = i64, Path, description = "Gallery owner id"), PageParams),
    responses(
        (status = 200, description = "One page of photos", body = PhotoListing),
        (status = 404, description = "User not found", body = ErrorBody)
    )
)]
pub async fn get_user_photos(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(params): Query<PageParams>,
) -> ApiResult<Json<PhotoListing>> {
    let user_id = path_id(&id, "User")?;
    let owner = state
        .repo
        .get_user(user_id)
        .await?
        .ok_or_else(|| ApiError::not_found("User"))?;

    let page = params.resolve(USER_PHOTOS_PAGE_SIZE);
    let (total_pages, photos) = photo_page(&state, owner.id, page).await?;

    Ok(Json(PhotoListing {
        page: page.page,
        limit: Some(page.limit),
        total_pages,
        photos,
    }))
}

/// get_gallery_photos
///
/// [Public Route] Same listing as `get_user_photos` with the browsing UI's page size.
#[utoipa::path(
    get,
    path = "/gallery/{id}/photos",
    params(("id" = i64, Path, description = "Gallery owner id"), PageParams),
    responses(
        (status = 200, description = "One page of photos", body = PhotoListing),
        (status = 404, description = "User not found", body = ErrorBody)
    )
)]
pub async fn get_gallery_photos(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(params): Query<PageParams>,
) -> ApiResult<Json<PhotoListing>> {
    let user_id = path_id(&id, "User")?;
    let owner = state
        .repo
        .get_user(user_id)
        .await?
        .ok_or_else(|| ApiError::not_found("User"))?;

    let page = params.resolve(GALLERY_PHOTOS_PAGE_SIZE);
    let (total_pages, photos) = photo_page(&state, owner.id, page).await?;

    Ok(Json(PhotoListing {
        page: page.page,
        limit: None,
        total_pages,
        photos,
    }))
}

/// get_my_photos
///
/// [Authenticated Route] The caller's own gallery.
#[utoipa::path(
    get,
    path = "/users/me/photos",
    params(PageParams),
    responses((status = 200, description = "One page of my photos", body = PhotoListing))
)]
pub async fn get_my_photos(
    AuthUser { id, .. }: AuthUser,
    State(state): State<AppState>,
    Query(params): Query<PageParams>,
) -> ApiResult<Json<PhotoListing>> {
    let page = params.resolve(USER_PHOTOS_PAGE_SIZE);
    let (total_pages, photos) = photo_page(&state, id, page).await?;

    Ok(Json(PhotoListing {
        page: page.page,
        limit: Some(page.limit),
        total_pages,
        photos,
    }))
}

// --- Photo Handlers ---

/// upload_photo
///
/// [Authenticated Route] Accepts a multipart body with a `photo` file and a `title`.
/// The blob goes to the store first; its descriptor and the caller's id are then
/// persisted as the new photo.
#[utoipa::path(
    post,
    path = "/users/me/photos",
    request_body(content = UploadPhotoForm, content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "Uploaded", body = PhotoCreated),
        (status = 400, description = "No file or no title", body = ErrorBody)
    )
)]
pub async fn upload_photo(
    AuthUser { id, .. }: AuthUser,
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResult<(StatusCode, Json<PhotoCreated>)> {
    let mut multipart =
        multipart.map_err(|e| ApiError::validation(format!("Invalid input: {}", e.body_text())))?;

    let mut title: Option<String> = None;
    let mut file: Option<(String, String, Bytes)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::validation(format!("Invalid input: {}", e.body_text())))?
    {
        let name = field.name().map(str::to_owned);
        match name.as_deref() {
            Some("title") => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| ApiError::validation(format!("Invalid input: {}", e.body_text())))?;
                title = Some(text);
            }
            Some("photo") => {
                let original_name = field.file_name().unwrap_or("upload").to_string();
                let mime_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::validation(format!("Invalid input: {}", e.body_text())))?;
                file = Some((original_name, mime_type, bytes));
            }
            // Unknown fields are drained and ignored.
            _ => {}
        }
    }

    let Some((original_name, mime_type, bytes)) = file.filter(|(_, _, b)| !b.is_empty()) else {
        return Err(ApiError::validation("No file uploaded"));
    };
    let title = title.unwrap_or_default();
    require_text(&title, "title")?;

    let image_metadata = state.storage.save(&original_name, &mime_type, bytes).await?;
    let photo = match state
        .repo
        .create_photo(NewPhoto {
            title,
            user_id: id,
            image_metadata: image_metadata.clone(),
        })
        .await
    {
        Ok(photo) => photo,
        Err(e) => {
            // No row points at the file; drop it before reporting the failure.
            if let Err(cleanup) = state.storage.delete(&image_metadata).await {
                tracing::warn!(path = %image_metadata.path, "orphaned upload left behind: {}", cleanup);
            }
            return Err(e.into());
        }
    };

    tracing::info!(photo_id = photo.id, owner_id = id, "photo uploaded");

    Ok((
        StatusCode::CREATED,
        Json(PhotoCreated {
            message: "Photo uploaded successfully".to_string(),
            photo_id: photo.id,
        }),
    ))
}

/// get_photo_image
///
/// [Public Route] Streams the stored file with its recorded content type.
#[utoipa::path(
    get,
    path = "/photos/{id}/image",
    params(("id" = i64, Path, description = "Photo id")),
    responses(
        (status = 200, description = "Raw image bytes"),
        (status = 404, description = "Photo or file not found", body = ErrorBody)
    )
)]
pub async fn get_photo_image(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Response> {
    let photo = load_photo(&state, &id).await?;
    let body = state.storage.open(&photo.image_metadata).await?;

    Ok((
        [(header::CONTENT_TYPE, photo.image_metadata.mime_type.clone())],
        body,
    )
        .into_response())
}

/// delete_gallery_photo
///
/// [Authenticated Route] Ownership-checked photo deletion. The claimed gallery is
/// checked before the photo is looked up, so a foreign gallery is 403 even for a
/// photo id that does not exist.
#[utoipa::path(
    delete,
    path = "/users/me/gallery/{gallery_id}/photos/{id}",
    params(
        ("gallery_id" = String, Path, description = "Claimed gallery owner id"),
        ("id" = i64, Path, description = "Photo id")
    ),
    responses(
        (status = 200, description = "Deleted", body = MessageResponse),
        (status = 403, description = "Not the owner", body = ErrorBody),
        (status = 404, description = "Photo not found", body = ErrorBody)
    )
)]
pub async fn delete_gallery_photo(
    caller: AuthUser,
    State(state): State<AppState>,
    Path((gallery_id, id)): Path<(String, String)>,
) -> ApiResult<Json<MessageResponse>> {
    if policy::claimed_gallery(&gallery_id)? != caller.id {
        return Err(ApiError::Forbidden);
    }
    let photo = load_photo(&state, &id).await?;
    policy::authorize_photo_delete(&caller, &gallery_id, &photo)?;
    remove_photo(&state, photo.id).await
}

// --- Comment Handlers ---

/// get_photo_comments
///
/// [Authenticated Route] Comment listing behind the session layer.
#[utoipa::path(
    get,
    path = "/users/me/photos/{photo_id}/comments",
    params(("photo_id" = i64, Path, description = "Photo id"), PageParams),
    responses(
        (status = 200, description = "One page of comments", body = CommentListing),
        (status = 404, description = "Photo not found", body = ErrorBody)
    )
)]
pub async fn get_photo_comments(
    _caller: AuthUser,
    State(state): State<AppState>,
    Path(photo_id): Path<String>,
    Query(params): Query<PageParams>,
) -> ApiResult<Json<CommentListing>> {
    let photo = load_photo(&state, &photo_id).await?;
    Ok(Json(comment_page(&state, photo.id, &params).await?))
}

/// add_photo_comment
///
/// [Authenticated Route] Posts a comment. `author` is taken from the body as given.
#[utoipa::path(
    post,
    path = "/users/me/photos/{photo_id}/comments",
    params(("photo_id" = i64, Path, description = "Photo id")),
    request_body = CreateCommentRequest,
    responses(
        (status = 201, description = "Comment added", body = CommentCreated),
        (status = 400, description = "Invalid input", body = ErrorBody),
        (status = 404, description = "Photo not found", body = ErrorBody)
    )
)]
pub async fn add_photo_comment(
    _caller: AuthUser,
    State(state): State<AppState>,
    Path(photo_id): Path<String>,
    payload: Result<Json<CreateCommentRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<CommentCreated>)> {
    add_comment_to(&state, &photo_id, payload).await
}

/// delete_gallery_comment
///
/// [Authenticated Route] Allowed for the owner of the photo (in their own gallery) or
/// for the caller named as the comment's author.
#[utoipa::path(
    delete,
    path = "/users/me/gallery/{gallery_id}/comments/{comment_id}",
    params(
        ("gallery_id" = String, Path, description = "Claimed gallery owner id"),
        ("comment_id" = i64, Path, description = "Comment id")
    ),
    responses(
        (status = 200, description = "Deleted", body = MessageResponse),
        (status = 403, description = "Neither owner nor author", body = ErrorBody),
        (status = 404, description = "Comment not found", body = ErrorBody)
    )
)]
pub async fn delete_gallery_comment(
    caller: AuthUser,
    State(state): State<AppState>,
    Path((gallery_id, comment_id)): Path<(String, String)>,
) -> ApiResult<Json<MessageResponse>> {
    if gallery_id == policy::SENTINEL_GALLERY_ID {
        return Err(ApiError::Forbidden);
    }

    let comment_id = path_id(&comment_id, "Comment")?;
    let comment: Comment = state
        .repo
        .get_comment(comment_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Comment"))?;
    let photo = state.repo.get_photo(comment.image_id).await?;

    policy::authorize_comment_delete(&caller, &gallery_id, &comment, photo.as_ref())?;
    remove_comment(&state, comment.id).await
}

// --- Compatibility Aliases ---

/// list_comments
///
/// [Public Route] Comment listing under `/photos`.
#[utoipa::path(
    get,
    path = "/photos/{id}/comments",
    params(("id" = i64, Path, description = "Photo id"), PageParams),
    responses(
        (status = 200, description = "One page of comments", body = CommentListing),
        (status = 404, description = "Photo not found", body = ErrorBody)
    )
)]
pub async fn list_comments(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(params): Query<PageParams>,
) -> ApiResult<Json<CommentListing>> {
    let photo = load_photo(&state, &id).await?;
    Ok(Json(comment_page(&state, photo.id, &params).await?))
}

/// add_comment
///
/// [Authenticated Route] Alias of `add_photo_comment`.
#[utoipa::path(
    post,
    path = "/photos/{id}/comments",
    params(("id" = i64, Path, description = "Photo id")),
    request_body = CreateCommentRequest,
    responses(
        (status = 201, description = "Comment added", body = CommentCreated),
        (status = 404, description = "Photo not found", body = ErrorBody)
    )
)]
pub async fn add_comment(
    _caller: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<CreateCommentRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<CommentCreated>)> {
    add_comment_to(&state, &id, payload).await
}

/// delete_photo
///
/// [Authenticated Route] Alias of `delete_gallery_photo` where the claimed gallery is
/// the photo's own. Only the owner gets through, and comments go with the photo.
#[utoipa::path(
    delete,
    path = "/photos/{id}",
    params(("id" = i64, Path, description = "Photo id")),
    responses(
        (status = 200, description = "Deleted", body = MessageResponse),
        (status = 403, description = "Not the owner", body = ErrorBody),
        (status = 404, description = "Photo not found", body = ErrorBody)
    )
)]
pub async fn delete_photo(
    caller: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<MessageResponse>> {
    let photo = load_photo(&state, &id).await?;
    policy::authorize_photo_delete(&caller, &photo.user_id.to_string(), &photo)?;
    remove_photo(&state, photo.id).await
}

/// delete_comment
///
/// [Authenticated Route] Alias of `delete_gallery_comment` scoped to the gallery the
/// comment's photo lives in.
#[utoipa::path(
    delete,
    path = "/comments/{id}",
    params(("id" = i64, Path, description = "Comment id")),
    responses(
        (status = 200, description = "Deleted", body = MessageResponse),
        (status = 403, description = "Neither owner nor author", body = ErrorBody),
        (status = 404, description = "Comment or photo not found", body = ErrorBody)
    )
)]
pub async fn delete_comment(
    caller: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<MessageResponse>> {
    let comment_id = path_id(&id, "Comment")?;
    let comment = state
        .repo
        .get_comment(comment_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Comment"))?;
    let photo = state
        .repo
        .get_photo(comment.image_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Photo"))?;

    policy::authorize_comment_delete(&caller, &photo.user_id.to_string(), &comment, Some(&photo))?;
    remove_comment(&state, comment.id).await
}
