use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, post},
};

/// Public Router Module
///
/// Endpoints that need no session: registration, login, signout (which resolves its
/// own token) and every read-only listing a visitor browses.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        // GET /health
        // Liveness probe for monitoring and load balancers.
        .route("/health", get(|| async { "ok" }))
        // --- Sessions ---
        .route("/users/register", post(handlers::register_user))
        .route("/users/login", post(handlers::login_user))
        // GET /users/signout
        // Reads the raw Authorization header itself: unknown token is 404, not 401.
        .route("/users/signout", get(handlers::signout_user))
        // --- Listings ---
        // GET /users?page=&limit=
        // User index, one per page by default. Backfills missing tokens.
        .route("/users", get(handlers::list_users))
        .route("/users/{id}/photos", get(handlers::get_user_photos))
        // GET /gallery?page=&limit=
        // Gallery owners for the browsing UI, ten per page by default.
        .route("/gallery", get(handlers::list_galleries))
        .route("/gallery/{id}/photos", get(handlers::get_gallery_photos))
        // --- Photos ---
        // GET /photos/{id}/image
        // Raw file stream with the stored content type.
        .route("/photos/{id}/image", get(handlers::get_photo_image))
}
