//! Gallery UI as an explicit state store plus an effect-dispatch table.
//!
//! `UiStore` owns the six state slices. Every mutation reports which `Slice` changed,
//! and `effects_for` maps (state, changed slice) to what must happen next: views to
//! render and pages to fetch. `GalleryController` runs that loop against the
//! `ApiService` and a `Renderer`.
//!
//! Fetches carry a per-slice `Ticket`. A response is applied only if no newer fetch
//! for the same slice was started in the meantime, so a slow reply can never
//! overwrite a newer one.

use chrono::{DateTime, Utc};
use std::collections::VecDeque;

use super::api_service::{ApiService, ClientError, ClientResult};
use crate::models::{CommentListing, PhotoListing, PublicUser, UserListing};

pub const GALLERY_LIMIT: i64 = 1;
pub const IMAGE_LIMIT: i64 = 1;
pub const COMMENTS_LIMIT: i64 = 10;

/// Gallery id sent when no gallery is on screen. The server always refuses it.
pub const NO_GALLERY: i64 = -1;

const FILL_ALL_FIELDS: &str = "Please fill in all fields";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Slice {
    Auth,
    User,
    Gallery,
    Image,
    Comments,
    Loading,
}

impl Slice {
    fn index(self) -> usize {
        match self {
            Slice::Auth => 0,
            Slice::User => 1,
            Slice::Gallery => 2,
            Slice::Image => 3,
            Slice::Comments => 4,
            Slice::Loading => 5,
        }
    }
}

/// UiState
///
/// `gallery` is a page of gallery owners (one per page), `image` a page of that
/// owner's photos (one per page), `comments` a page of the shown photo's comments.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UiState {
    pub auth: bool,
    pub user: Option<PublicUser>,
    pub gallery: Option<UserListing>,
    pub image: Option<PhotoListing>,
    pub comments: Option<CommentListing>,
    pub loading: bool,
}

impl UiState {
    /// Owner of the gallery on screen.
    pub fn gallery_owner(&self) -> Option<(i64, &str)> {
        self.gallery
            .as_ref()
            .and_then(|g| g.users.first())
            .map(|u| (u.id, u.username.as_str()))
    }

    pub fn gallery_id(&self) -> i64 {
        self.gallery_owner().map(|(id, _)| id).unwrap_or(NO_GALLERY)
    }

    /// Id of the photo on screen.
    pub fn photo_id(&self) -> Option<i64> {
        self.image
            .as_ref()
            .and_then(|i| i.photos.first())
            .map(|p| p.id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket {
    slice: Slice,
    seq: u64,
}

/// UiStore
///
/// The only place UI state changes. Setters return the slice they touched so the
/// caller can look up the effects of that change.
#[derive(Debug, Default)]
pub struct UiStore {
    state: UiState,
    issued: [u64; 6],
}

impl UiStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &UiState {
        &self.state
    }

    pub fn set_auth(&mut self, auth: bool) -> Slice {
        self.state.auth = auth;
        Slice::Auth
    }

    pub fn set_user(&mut self, user: Option<PublicUser>) -> Slice {
        self.state.user = user;
        Slice::User
    }

    pub fn set_gallery(&mut self, gallery: Option<UserListing>) -> Slice {
        self.state.gallery = gallery;
        Slice::Gallery
    }

    pub fn set_image(&mut self, image: Option<PhotoListing>) -> Slice {
        self.state.image = image;
        Slice::Image
    }

    pub fn set_comments(&mut self, comments: Option<CommentListing>) -> Slice {
        self.state.comments = comments;
        Slice::Comments
    }

    pub fn set_loading(&mut self, loading: bool) -> Slice {
        self.state.loading = loading;
        Slice::Loading
    }

    /// Starts a fetch for `slice`, superseding any fetch still in flight for it.
    pub fn begin(&mut self, slice: Slice) -> Ticket {
        let seq = &mut self.issued[slice.index()];
        *seq += 1;
        Ticket { slice, seq: *seq }
    }

    pub fn is_current(&self, ticket: Ticket) -> bool {
        self.issued[ticket.slice.index()] == ticket.seq
    }

    pub fn resolve_gallery(&mut self, ticket: Ticket, gallery: UserListing) -> Option<Slice> {
        self.is_current(ticket).then(|| self.set_gallery(Some(gallery)))
    }

    pub fn resolve_image(&mut self, ticket: Ticket, image: PhotoListing) -> Option<Slice> {
        self.is_current(ticket).then(|| self.set_image(Some(image)))
    }

    pub fn resolve_comments(&mut self, ticket: Ticket, comments: CommentListing) -> Option<Slice> {
        self.is_current(ticket).then(|| self.set_comments(Some(comments)))
    }
}

// --- Views ---

#[derive(Debug, Clone, PartialEq)]
pub struct ImageView {
    pub photo_id: i64,
    pub title: String,
    pub owner: String,
    pub page: i64,
    pub total_pages: i64,
    pub can_delete: bool,
    pub can_comment: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CommentView {
    pub id: i64,
    pub author: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub can_delete: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum View {
    SignedIn { username: String },
    SignedOut,
    /// `owner` is set when a gallery is selected but holds no photos.
    NoGallery { owner: Option<String> },
    GalleryHeader { owner: String, page: i64, total_pages: i64 },
    NoImage,
    Image(ImageView),
    CommentsHidden,
    NoComments,
    Comments { items: Vec<CommentView>, page: i64, total_pages: i64 },
    Loading(bool),
}

impl View {
    /// Text the browser UI showed for the empty states.
    pub fn message(&self) -> Option<String> {
        match self {
            View::NoGallery { owner: Some(owner) } => Some(format!(
                "No gallery available for user {owner}. Please add a photo to create a gallery."
            )),
            View::NoGallery { owner: None } => Some(
                "No one posted anything yet, so no Galleries are available. Tell your friends to upload stuff!"
                    .to_string(),
            ),
            View::NoImage => Some(
                "No images available. Please add an image using the button on the right of the title!"
                    .to_string(),
            ),
            View::NoComments => Some("No comments available for this image yet.".to_string()),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    Render(View),
    FetchGallery { page: i64 },
    FetchImage { gallery_id: i64, page: i64 },
    FetchComments { photo_id: i64, page: i64 },
}

/// Where a listing's page sits relative to its page count.
enum PageFit {
    Empty,
    Below,
    Above(i64),
    Within,
}

fn fit(page: i64, total_pages: i64) -> PageFit {
    if total_pages == 0 {
        PageFit::Empty
    } else if page < 1 {
        PageFit::Below
    } else if page > total_pages {
        PageFit::Above(total_pages)
    } else {
        PageFit::Within
    }
}

/// effects_for
///
/// The dispatch table. Pure: the same state and slice always give the same effects.
/// Out-of-range pages are clamped here by refetching page 1 or the last page.
pub fn effects_for(state: &UiState, slice: Slice) -> Vec<Effect> {
    match slice {
        Slice::Auth => {
            let mut effects = vec![session_effect(state)];
            effects.extend(comment_effects(state));
            effects
        }
        Slice::User => vec![session_effect(state)],
        Slice::Gallery => gallery_effects(state),
        Slice::Image => image_effects(state),
        Slice::Comments => comment_effects(state),
        Slice::Loading => vec![Effect::Render(View::Loading(state.loading))],
    }
}

fn session_effect(state: &UiState) -> Effect {
    match (&state.user, state.auth) {
        (Some(user), true) => Effect::Render(View::SignedIn {
            username: user.username.clone(),
        }),
        _ => Effect::Render(View::SignedOut),
    }
}

fn gallery_effects(state: &UiState) -> Vec<Effect> {
    let Some(gallery) = &state.gallery else {
        return vec![Effect::Render(View::NoGallery { owner: None })];
    };
    let owner = state.gallery_owner();

    match fit(gallery.page, gallery.total_pages) {
        PageFit::Empty => vec![Effect::Render(View::NoGallery {
            owner: owner.map(|(_, name)| name.to_string()),
        })],
        PageFit::Below => vec![Effect::FetchGallery { page: 1 }],
        PageFit::Above(last) => vec![Effect::FetchGallery { page: last }],
        PageFit::Within => match owner {
            Some((id, name)) => vec![
                Effect::Render(View::GalleryHeader {
                    owner: name.to_string(),
                    page: gallery.page,
                    total_pages: gallery.total_pages,
                }),
                Effect::FetchImage {
                    gallery_id: id,
                    page: 1,
                },
            ],
            None => vec![Effect::Render(View::NoGallery { owner: None })],
        },
    }
}

fn image_effects(state: &UiState) -> Vec<Effect> {
    let Some(image) = &state.image else {
        return vec![Effect::Render(View::NoImage)];
    };
    let Some((gallery_id, owner)) = state.gallery_owner() else {
        return vec![Effect::Render(View::NoImage)];
    };

    match fit(image.page, image.total_pages) {
        PageFit::Empty => vec![Effect::Render(View::NoImage)],
        PageFit::Below => vec![Effect::FetchImage { gallery_id, page: 1 }],
        PageFit::Above(last) => vec![Effect::FetchImage {
            gallery_id,
            page: last,
        }],
        PageFit::Within => {
            let Some(photo) = image.photos.first() else {
                return vec![Effect::Render(View::NoImage)];
            };
            let viewer = state.user.as_ref().filter(|_| state.auth);
            let view = ImageView {
                photo_id: photo.id,
                title: photo.title.clone(),
                owner: owner.to_string(),
                page: image.page,
                total_pages: image.total_pages,
                can_delete: viewer.is_some_and(|u| u.id == photo.user_id),
                can_comment: viewer.is_some(),
            };

            let mut effects = vec![Effect::Render(View::Image(view))];
            if state.auth {
                effects.push(Effect::FetchComments {
                    photo_id: photo.id,
                    page: 1,
                });
            } else {
                effects.push(Effect::Render(View::CommentsHidden));
            }
            effects
        }
    }
}

fn comment_effects(state: &UiState) -> Vec<Effect> {
    if !state.auth {
        return vec![Effect::Render(View::CommentsHidden)];
    }
    let Some(comments) = &state.comments else {
        return vec![Effect::Render(View::NoComments)];
    };
    let Some(photo_id) = state.photo_id() else {
        return Vec::new();
    };

    match fit(comments.page, comments.total_pages) {
        PageFit::Empty => vec![Effect::Render(View::NoComments)],
        PageFit::Below => vec![Effect::FetchComments { photo_id, page: 1 }],
        PageFit::Above(last) => vec![Effect::FetchComments {
            photo_id,
            page: last,
        }],
        PageFit::Within => {
            let gallery_id = state.gallery_id();
            let photo_owner = state
                .image
                .as_ref()
                .and_then(|i| i.photos.first())
                .map(|p| p.user_id);
            let viewer = state.user.as_ref();

            let items = comments
                .comments
                .iter()
                .map(|c| {
                    let is_author = viewer.is_some_and(|u| u.username == c.author);
                    let is_owner = viewer
                        .is_some_and(|u| Some(u.id) == photo_owner && u.id == gallery_id);
                    CommentView {
                        id: c.id,
                        author: c.author.clone(),
                        content: c.content.clone(),
                        created_at: c.created_at,
                        can_delete: is_author || is_owner,
                    }
                })
                .collect();

            vec![Effect::Render(View::Comments {
                items,
                page: comments.page,
                total_pages: comments.total_pages,
            })]
        }
    }
}

// --- Controller ---

/// Renderer
///
/// The presentation side: draws views and reports failures to the user.
pub trait Renderer {
    fn render(&mut self, view: &View);
    fn alert(&mut self, message: &str);
}

/// GalleryController
///
/// Owns the store and drives the effect loop. User actions mutate state through the
/// API, then hand the changed slices to `settle`, which keeps dispatching until no
/// effect asks for more data.
pub struct GalleryController<R: Renderer> {
    api: ApiService,
    store: UiStore,
    renderer: R,
}

impl<R: Renderer> GalleryController<R> {
    pub fn new(api: ApiService, renderer: R) -> Self {
        Self {
            api,
            store: UiStore::new(),
            renderer,
        }
    }

    pub fn state(&self) -> &UiState {
        self.store.state()
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    pub fn api(&self) -> &ApiService {
        &self.api
    }

    /// Initial load: session buttons, then the first gallery.
    pub async fn start(&mut self) {
        let auth = self.store.set_auth(self.api.is_signed_in());
        self.settle(vec![auth]).await;
        self.run(vec![Effect::FetchGallery { page: 1 }]).await;
    }

    // --- Session actions ---

    pub async fn register(&mut self, username: &str, password: &str) -> ClientResult<()> {
        if username.is_empty() || password.is_empty() {
            self.renderer.alert(FILL_ALL_FIELDS);
            return Ok(());
        }
        let result = self.api.register(username, password).await;
        let auth = self.report(result)?;
        self.signed_in(auth.user).await;
        Ok(())
    }

    pub async fn login(&mut self, username: &str, password: &str) -> ClientResult<()> {
        if username.is_empty() || password.is_empty() {
            self.renderer.alert(FILL_ALL_FIELDS);
            return Ok(());
        }
        let result = self.api.login(username, password).await;
        let auth = self.report(result)?;
        self.signed_in(auth.user).await;
        Ok(())
    }

    pub async fn logout(&mut self) -> ClientResult<()> {
        let result = self.api.signout().await;
        self.report(result)?;
        let user = self.store.set_user(None);
        let auth = self.store.set_auth(false);
        let comments = self.store.set_comments(None);
        self.settle(vec![user, auth, comments]).await;
        // Photo permissions depend on who is looking.
        self.settle(vec![Slice::Image]).await;
        Ok(())
    }

    async fn signed_in(&mut self, user: PublicUser) {
        let user = self.store.set_user(Some(user));
        let auth = self.store.set_auth(true);
        self.settle(vec![user, auth]).await;
        self.run(vec![Effect::FetchGallery { page: 1 }]).await;
    }

    // --- Paging ---

    pub async fn next_gallery(&mut self) {
        let next = match &self.store.state().gallery {
            Some(g) if g.page < g.total_pages => g.page + 1,
            _ => return,
        };
        self.run(vec![Effect::FetchGallery { page: next }]).await;
    }

    pub async fn prev_gallery(&mut self) {
        let prev = match &self.store.state().gallery {
            Some(g) if g.page > 1 => g.page - 1,
            _ => return,
        };
        self.run(vec![Effect::FetchGallery { page: prev }]).await;
    }

    pub async fn next_image(&mut self) {
        self.step_image(1).await;
    }

    pub async fn prev_image(&mut self) {
        self.step_image(-1).await;
    }

    async fn step_image(&mut self, delta: i64) {
        let state = self.store.state();
        let Some(image) = &state.image else { return };
        let Some((gallery_id, _)) = state.gallery_owner() else {
            self.renderer.alert("No user ID found for gallery owner.");
            return;
        };
        let page = image.page + delta;
        self.run(vec![Effect::FetchImage { gallery_id, page }]).await;
    }

    pub async fn next_comments(&mut self) {
        self.step_comments(1).await;
    }

    pub async fn prev_comments(&mut self) {
        self.step_comments(-1).await;
    }

    async fn step_comments(&mut self, delta: i64) {
        let state = self.store.state();
        let (Some(comments), Some(photo_id)) = (&state.comments, state.photo_id()) else {
            return;
        };
        let page = comments.page + delta;
        self.run(vec![Effect::FetchComments { photo_id, page }]).await;
    }

    // --- Mutations ---

    pub async fn upload_photo(
        &mut self,
        title: &str,
        file_name: &str,
        mime_type: &str,
        bytes: Vec<u8>,
    ) -> ClientResult<()> {
        if title.is_empty() || bytes.is_empty() {
            self.renderer.alert(FILL_ALL_FIELDS);
            return Ok(());
        }
        let result = self.api.upload_photo(title, file_name, mime_type, bytes).await;
        self.report(result)?;

        if let Some((gallery_id, _)) = self.store.state().gallery_owner() {
            self.run(vec![Effect::FetchImage { gallery_id, page: 1 }]).await;
        } else {
            self.run(vec![Effect::FetchGallery { page: 1 }]).await;
        }
        Ok(())
    }

    /// Deletes the photo on screen and steps back one page; clamping takes care of
    /// landing on page 0.
    pub async fn delete_photo(&mut self) -> ClientResult<()> {
        let state = self.store.state();
        let (Some(photo_id), Some(image)) = (state.photo_id(), &state.image) else {
            return Ok(());
        };
        let page = image.page - 1;
        let gallery_id = state.gallery_id();

        let result = self.api.delete_photo(gallery_id, photo_id).await;
        self.report(result)?;
        self.run(vec![Effect::FetchImage { gallery_id, page }]).await;
        Ok(())
    }

    /// Posts a comment on the photo on screen as the signed-in user and shows the
    /// first comment page.
    pub async fn add_comment(&mut self, content: &str) -> ClientResult<()> {
        if content.is_empty() {
            self.renderer.alert(FILL_ALL_FIELDS);
            return Ok(());
        }
        let state = self.store.state();
        let Some(photo_id) = state.photo_id() else {
            return Ok(());
        };
        let author = state
            .user
            .as_ref()
            .map(|u| u.username.clone())
            .unwrap_or_else(|| "Anonymous".to_string());

        let result = self.api.add_photo_comment(photo_id, content, &author).await;
        self.report(result)?;
        self.run(vec![Effect::FetchComments { photo_id, page: 1 }])
            .await;
        Ok(())
    }

    pub async fn delete_comment(&mut self, comment_id: i64) -> ClientResult<()> {
        let state = self.store.state();
        let Some(photo_id) = state.photo_id() else {
            self.renderer.alert("No image ID found for comment deletion.");
            return Ok(());
        };
        let page = state.comments.as_ref().map(|c| c.page).unwrap_or(1);
        let gallery_id = state.gallery_id();

        let result = self.api.delete_comment(gallery_id, comment_id).await;
        self.report(result)?;
        self.run(vec![Effect::FetchComments { photo_id, page }]).await;
        Ok(())
    }

    // --- Effect loop ---

    fn report<T>(&mut self, result: ClientResult<T>) -> ClientResult<T> {
        if let Err(e) = &result {
            self.renderer.alert(&e.to_string());
        }
        result
    }

    async fn settle(&mut self, changed: Vec<Slice>) {
        let effects = changed
            .into_iter()
            .flat_map(|slice| effects_for(self.store.state(), slice))
            .collect();
        self.run(effects).await;
    }

    /// Executes effects breadth-first. Every applied fetch feeds the effects of its
    /// slice back into the queue.
    async fn run(&mut self, effects: Vec<Effect>) {
        let mut queue: VecDeque<Effect> = effects.into();
        let mut loading = false;

        while let Some(effect) = queue.pop_front() {
            if let Effect::Render(view) = &effect {
                self.renderer.render(view);
                continue;
            }

            if !loading {
                loading = true;
                let slice = self.store.set_loading(true);
                for e in effects_for(self.store.state(), slice) {
                    if let Effect::Render(view) = e {
                        self.renderer.render(&view);
                    }
                }
            }

            match self.fetch(effect).await {
                Ok(Some(slice)) => queue.extend(effects_for(self.store.state(), slice)),
                Ok(None) => tracing::debug!("discarded stale response"),
                Err(e) => {
                    tracing::debug!("fetch failed: {}", e);
                    self.renderer.alert(&e.to_string());
                }
            }
        }

        if loading {
            let slice = self.store.set_loading(false);
            for e in effects_for(self.store.state(), slice) {
                if let Effect::Render(view) = e {
                    self.renderer.render(&view);
                }
            }
        }
    }

    async fn fetch(&mut self, effect: Effect) -> Result<Option<Slice>, ClientError> {
        match effect {
            Effect::FetchGallery { page } => {
                let ticket = self.store.begin(Slice::Gallery);
                let gallery = self.api.user_gallery(page, GALLERY_LIMIT).await?;
                Ok(self.store.resolve_gallery(ticket, gallery))
            }
            Effect::FetchImage { gallery_id, page } => {
                let ticket = self.store.begin(Slice::Image);
                let image = self
                    .api
                    .gallery_photos(gallery_id, page, IMAGE_LIMIT)
                    .await?;
                Ok(self.store.resolve_image(ticket, image))
            }
            Effect::FetchComments { photo_id, page } => {
                let ticket = self.store.begin(Slice::Comments);
                let comments = self
                    .api
                    .photo_comments(photo_id, page, COMMENTS_LIMIT)
                    .await?;
                Ok(self.store.resolve_comments(ticket, comments))
            }
            Effect::Render(_) => Ok(None),
        }
    }
}
