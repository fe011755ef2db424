use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{delete, get, post},
};

/// Public half of the `/photos` aliases.
pub fn legacy_public_routes() -> Router<AppState> {
    Router::new().route("/photos/{id}/comments", get(handlers::list_comments))
}

/// Legacy Router Module
///
/// Mutating `/photos` and `/comments` aliases. These used to accept anyone who knew an
/// id; they are now mounted behind the auth route layer and run the same ownership
/// checks as the `/users/me/gallery/...` routes.
pub fn legacy_protected_routes() -> Router<AppState> {
    Router::new()
        .route("/photos/{id}/comments", post(handlers::add_comment))
        // DELETE /photos/{id}
        // Removes the photo's comments in the same transaction.
        .route("/photos/{id}", delete(handlers::delete_photo))
        .route("/comments/{id}", delete(handlers::delete_comment))
}
