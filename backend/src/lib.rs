use axum::{
    Router,
    extract::{FromRef, Request},
    http::HeaderName,
    middleware::{self, Next},
    response::Response,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::{DefaultOnResponse, TraceLayer},
};
use tracing::{Level, Span};

// --- Module Structure ---

// Server-side core.
pub mod auth;
pub mod config;
pub mod credentials;
pub mod error;
pub mod handlers;
pub mod models;
pub mod pagination;
pub mod policy;
pub mod repository;
pub mod storage;

// Route groups (public, authenticated, legacy aliases).
pub mod routes;
use auth::AuthUser;
use routes::{authenticated, legacy, public};

// Client side: HTTP wrapper and UI state machine.
pub mod client;

// --- Public Re-exports ---

pub use config::AppConfig;
pub use credentials::Credentials;
pub use error::{ApiError, ApiResult};
pub use repository::{RepositoryState, SqliteRepository};
pub use storage::{LocalBlobStore, MockStorageService, StorageState};

/// ApiDoc
///
/// Aggregates every `#[utoipa::path]` handler and schema into the OpenAPI document
/// served at `/api-docs/openapi.json`.
#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::register_user, handlers::login_user, handlers::signout_user,
        handlers::get_me, handlers::list_users, handlers::list_galleries,
        handlers::get_user_photos, handlers::get_gallery_photos, handlers::get_my_photos,
        handlers::upload_photo, handlers::get_photo_image, handlers::delete_gallery_photo,
        handlers::get_photo_comments, handlers::add_photo_comment,
        handlers::delete_gallery_comment, handlers::list_comments, handlers::add_comment,
        handlers::delete_photo, handlers::delete_comment
    ),
    components(
        schemas(
            models::PublicUser, models::UserSummary, models::ImageMetadata, models::Photo,
            models::Comment, models::CredentialsRequest, models::CreateCommentRequest,
            models::UploadPhotoForm, models::AuthResponse, models::MessageResponse,
            models::ErrorBody, models::PhotoCreated, models::CommentCreated,
            models::UserListing, models::PhotoListing, models::CommentListing,
        )
    ),
    tags(
        (name = "photo-gallery", description = "Photo Gallery API")
    )
)]
struct ApiDoc;

/// AppState
///
/// The single shared container of services and configuration, cloned into every
/// request. Handlers take the whole state; the `AuthUser` extractor pulls only the
/// parts it needs through `FromRef`.
#[derive(Clone)]
pub struct AppState {
    /// Persistence layer (SQLite in production, hand-written mocks in tests).
    pub repo: RepositoryState,
    /// Where uploaded photo files live.
    pub storage: StorageState,
    /// Password hashing.
    pub credentials: Credentials,
    pub config: AppConfig,
}

// --- Axum FromRef Extractor Implementations ---

impl FromRef<AppState> for RepositoryState {
    fn from_ref(app_state: &AppState) -> RepositoryState {
        app_state.repo.clone()
    }
}

impl FromRef<AppState> for StorageState {
    fn from_ref(app_state: &AppState) -> StorageState {
        app_state.storage.clone()
    }
}

impl FromRef<AppState> for AppConfig {
    fn from_ref(app_state: &AppState) -> AppConfig {
        app_state.config.clone()
    }
}

/// auth_middleware
///
/// Route layer for the protected groups. Extracting `AuthUser` is the whole check: a
/// missing, unknown or expired token rejects with 401 before the handler runs.
async fn auth_middleware(_auth_user: AuthUser, request: Request, next: Next) -> Response {
    next.run(request).await
}

/// create_router
///
/// Assembles the routing structure, applies the auth layer to the protected groups and
/// wraps everything in the request-id, tracing and CORS layers.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_origin(Any)
        .allow_headers(Any);

    let x_request_id = HeaderName::from_static("x-request-id");

    let protected = authenticated::authenticated_routes(state.config.max_upload_bytes)
        .merge(legacy::legacy_protected_routes())
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    let base_router = Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .merge(public::public_routes())
        .merge(legacy::legacy_public_routes())
        .merge(protected)
        .with_state(state);

    base_router
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::new(x_request_id.clone(), MakeRequestUuid))
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(trace_span_logger)
                        .on_response(
                            DefaultOnResponse::new()
                                .level(Level::INFO)
                                .latency_unit(tower_http::LatencyUnit::Millis),
                        ),
                )
                .layer(PropagateRequestIdLayer::new(x_request_id)),
        )
        .layer(cors)
}

/// trace_span_logger
///
/// Span for `TraceLayer`: method, uri and the `x-request-id` set by the outer layer,
/// so every log line of one request can be correlated.
fn trace_span_logger(request: &axum::http::Request<axum::body::Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("unknown");

    tracing::info_span!(
        "http_request",
        method = ?request.method(),
        uri = ?request.uri(),
        req_id = %request_id,
    )
}
