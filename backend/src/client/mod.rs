//! Client side of the gallery: a typed HTTP wrapper and the UI state machine that
//! drives it.

pub mod api_service;
pub mod ui;

pub use api_service::{ApiService, ClientError, ClientResult, FileTokenStore, MemoryTokenStore, TokenStore};
pub use ui::{Effect, GalleryController, Renderer, Slice, UiState, UiStore, View, effects_for};
