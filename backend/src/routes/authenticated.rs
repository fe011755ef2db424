use crate::{AppState, handlers};
use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{delete, get, post},
};

/// Authenticated Router Module
///
/// Everything under `/users/me`. The router is wrapped in the auth route layer by
/// `create_router`, and every handler also takes `AuthUser` for the caller's identity.
///
/// Deletions name the gallery they act on; ownership is decided by the `policy`
/// module, not here. `upload_limit` caps the multipart upload body only.
pub fn authenticated_routes(upload_limit: usize) -> Router<AppState> {
    Router::<AppState>::new()
        // GET /users/me
        .route("/users/me", get(handlers::get_me))
        // GET/POST /users/me/photos
        // Own gallery listing, and multipart upload (`photo` file + `title`).
        .route(
            "/users/me/photos",
            get(handlers::get_my_photos).merge(
                post(handlers::upload_photo).layer(DefaultBodyLimit::max(upload_limit)),
            ),
        )
        // GET/POST /users/me/photos/{photo_id}/comments
        .route(
            "/users/me/photos/{photo_id}/comments",
            get(handlers::get_photo_comments).post(handlers::add_photo_comment),
        )
        // DELETE /users/me/gallery/{gallery_id}/photos/{id}
        // Caller must be the claimed gallery owner and own the photo. Cascades to comments.
        .route(
            "/users/me/gallery/{gallery_id}/photos/{id}",
            delete(handlers::delete_gallery_photo),
        )
        // DELETE /users/me/gallery/{gallery_id}/comments/{comment_id}
        // Photo owner in their own gallery, or the comment's named author.
        .route(
            "/users/me/gallery/{gallery_id}/comments/{comment_id}",
            delete(handlers::delete_gallery_comment),
        )
}
