use chrono::Utc;
use photo_gallery::{
    client::{Effect, Slice, UiState, UiStore, View, effects_for, ui::NO_GALLERY},
    models::{Comment, CommentListing, Photo, PhotoListing, PublicUser, UserListing, UserSummary},
};

// --- Fixtures ---

fn gallery(page: i64, total_pages: i64, owner: Option<(i64, &str)>) -> UserListing {
    UserListing {
        page,
        total_pages,
        users: owner
            .map(|(id, name)| UserSummary {
                id,
                username: name.to_string(),
                created_at: Utc::now(),
            })
            .into_iter()
            .collect(),
    }
}

fn image(page: i64, total_pages: i64, photo: Option<(i64, i64)>) -> PhotoListing {
    PhotoListing {
        page,
        limit: None,
        total_pages,
        photos: photo
            .map(|(id, owner)| Photo {
                id,
                title: format!("photo {id}"),
                user_id: owner,
                ..Photo::default()
            })
            .into_iter()
            .collect(),
    }
}

fn comments(page: i64, total_pages: i64, authors: &[&str]) -> CommentListing {
    CommentListing {
        page,
        total_pages,
        comments: authors
            .iter()
            .enumerate()
            .map(|(i, author)| Comment {
                id: i as i64 + 1,
                image_id: 10,
                author: author.to_string(),
                content: "text".to_string(),
                ..Comment::default()
            })
            .collect(),
    }
}

fn signed_in(id: i64, name: &str) -> UiState {
    UiState {
        auth: true,
        user: Some(PublicUser {
            id,
            username: name.to_string(),
            token: Some("t".to_string()),
        }),
        ..UiState::default()
    }
}

fn rendered(effects: &[Effect]) -> Vec<&View> {
    effects
        .iter()
        .filter_map(|e| match e {
            Effect::Render(view) => Some(view),
            _ => None,
        })
        .collect()
}

// --- Session ---

#[test]
fn test_auth_change_renders_session_and_comment_visibility() {
    let state = UiState::default();
    let effects = effects_for(&state, Slice::Auth);
    assert_eq!(
        effects,
        vec![Effect::Render(View::SignedOut), Effect::Render(View::CommentsHidden)]
    );

    let state = signed_in(1, "alice");
    let effects = effects_for(&state, Slice::Auth);
    assert_eq!(
        effects[0],
        Effect::Render(View::SignedIn {
            username: "alice".to_string()
        })
    );
}

#[test]
fn test_loading_slice_renders_indicator() {
    let state = UiState {
        loading: true,
        ..UiState::default()
    };
    assert_eq!(
        effects_for(&state, Slice::Loading),
        vec![Effect::Render(View::Loading(true))]
    );
}

// --- Gallery ---

#[test]
fn test_empty_gallery_message() {
    let state = UiState {
        gallery: Some(gallery(1, 0, None)),
        ..UiState::default()
    };
    let effects = effects_for(&state, Slice::Gallery);
    assert_eq!(effects, vec![Effect::Render(View::NoGallery { owner: None })]);

    let message = rendered(&effects)[0].message().unwrap();
    assert!(message.starts_with("No one posted anything yet"));
}

#[test]
fn test_gallery_page_is_clamped() {
    let below = UiState {
        gallery: Some(gallery(0, 3, None)),
        ..UiState::default()
    };
    assert_eq!(
        effects_for(&below, Slice::Gallery),
        vec![Effect::FetchGallery { page: 1 }]
    );

    let above = UiState {
        gallery: Some(gallery(7, 3, None)),
        ..UiState::default()
    };
    assert_eq!(
        effects_for(&above, Slice::Gallery),
        vec![Effect::FetchGallery { page: 3 }]
    );
}

#[test]
fn test_gallery_in_range_loads_first_image() {
    let state = UiState {
        gallery: Some(gallery(2, 3, Some((5, "alice")))),
        ..UiState::default()
    };
    assert_eq!(
        effects_for(&state, Slice::Gallery),
        vec![
            Effect::Render(View::GalleryHeader {
                owner: "alice".to_string(),
                page: 2,
                total_pages: 3,
            }),
            Effect::FetchImage {
                gallery_id: 5,
                page: 1
            },
        ]
    );
    assert_eq!(state.gallery_id(), 5);
    assert_eq!(UiState::default().gallery_id(), NO_GALLERY);
}

// --- Image ---

#[test]
fn test_image_without_gallery_or_photos() {
    let no_gallery = UiState {
        image: Some(image(1, 1, Some((10, 5)))),
        ..UiState::default()
    };
    assert_eq!(effects_for(&no_gallery, Slice::Image), vec![Effect::Render(View::NoImage)]);

    let empty = UiState {
        gallery: Some(gallery(1, 1, Some((5, "alice")))),
        image: Some(image(1, 0, None)),
        ..UiState::default()
    };
    assert_eq!(effects_for(&empty, Slice::Image), vec![Effect::Render(View::NoImage)]);
}

#[test]
fn test_image_clamps_to_last_page() {
    let state = UiState {
        gallery: Some(gallery(1, 1, Some((5, "alice")))),
        image: Some(image(4, 2, None)),
        ..UiState::default()
    };
    assert_eq!(
        effects_for(&state, Slice::Image),
        vec![Effect::FetchImage {
            gallery_id: 5,
            page: 2
        }]
    );
}

#[test]
fn test_image_for_visitor_hides_comments() {
    let state = UiState {
        gallery: Some(gallery(1, 1, Some((5, "alice")))),
        image: Some(image(1, 1, Some((10, 5)))),
        ..UiState::default()
    };
    let effects = effects_for(&state, Slice::Image);

    match &effects[0] {
        Effect::Render(View::Image(view)) => {
            assert_eq!(view.photo_id, 10);
            assert_eq!(view.owner, "alice");
            assert!(!view.can_delete);
            assert!(!view.can_comment);
        }
        other => panic!("expected image view, got {other:?}"),
    }
    assert_eq!(effects[1], Effect::Render(View::CommentsHidden));
}

#[test]
fn test_image_for_owner_fetches_comments() {
    let state = UiState {
        gallery: Some(gallery(1, 1, Some((5, "alice")))),
        image: Some(image(1, 1, Some((10, 5)))),
        ..signed_in(5, "alice")
    };
    let effects = effects_for(&state, Slice::Image);

    match &effects[0] {
        Effect::Render(View::Image(view)) => assert!(view.can_delete && view.can_comment),
        other => panic!("expected image view, got {other:?}"),
    }
    assert_eq!(
        effects[1],
        Effect::FetchComments {
            photo_id: 10,
            page: 1
        }
    );
}

// --- Comments ---

#[test]
fn test_comments_empty_and_clamped() {
    let base = UiState {
        gallery: Some(gallery(1, 1, Some((5, "alice")))),
        image: Some(image(1, 1, Some((10, 5)))),
        ..signed_in(7, "bob")
    };

    let empty = UiState {
        comments: Some(comments(1, 0, &[])),
        ..base.clone()
    };
    let effects = effects_for(&empty, Slice::Comments);
    assert_eq!(effects, vec![Effect::Render(View::NoComments)]);
    assert_eq!(
        rendered(&effects)[0].message().as_deref(),
        Some("No comments available for this image yet.")
    );

    let past_end = UiState {
        comments: Some(comments(3, 2, &[])),
        ..base
    };
    assert_eq!(
        effects_for(&past_end, Slice::Comments),
        vec![Effect::FetchComments {
            photo_id: 10,
            page: 2
        }]
    );
}

#[test]
fn test_comment_delete_buttons() {
    let listing = comments(1, 1, &["bob", "carol"]);
    let gallery_of_alice = Some(gallery(1, 1, Some((5, "alice"))));
    let photo_of_alice = Some(image(1, 1, Some((10, 5))));

    let can_delete = |state: &UiState| -> Vec<bool> {
        match &effects_for(state, Slice::Comments)[0] {
            Effect::Render(View::Comments { items, .. }) => {
                items.iter().map(|c| c.can_delete).collect()
            }
            other => panic!("expected comments, got {other:?}"),
        }
    };

    // bob can delete only his own comment.
    let as_bob = UiState {
        gallery: gallery_of_alice.clone(),
        image: photo_of_alice.clone(),
        comments: Some(listing.clone()),
        ..signed_in(7, "bob")
    };
    assert_eq!(can_delete(&as_bob), vec![true, false]);

    // alice owns the photo in her own gallery.
    let as_alice = UiState {
        gallery: gallery_of_alice,
        image: photo_of_alice,
        comments: Some(listing),
        ..signed_in(5, "alice")
    };
    assert_eq!(can_delete(&as_alice), vec![true, true]);
}

#[test]
fn test_comments_hidden_when_signed_out() {
    let state = UiState {
        comments: Some(comments(1, 1, &["bob"])),
        ..UiState::default()
    };
    assert_eq!(
        effects_for(&state, Slice::Comments),
        vec![Effect::Render(View::CommentsHidden)]
    );
}

// --- Store ---

#[test]
fn test_stale_response_is_discarded() {
    let mut store = UiStore::new();

    let slow = store.begin(Slice::Gallery);
    let fast = store.begin(Slice::Gallery);

    assert_eq!(
        store.resolve_gallery(fast, gallery(2, 2, Some((2, "new")))),
        Some(Slice::Gallery)
    );
    assert_eq!(store.resolve_gallery(slow, gallery(1, 2, Some((1, "old")))), None);
    assert_eq!(store.state().gallery.as_ref().unwrap().page, 2);
}

#[test]
fn test_tickets_are_per_slice() {
    let mut store = UiStore::new();

    let gallery_ticket = store.begin(Slice::Gallery);
    let image_ticket = store.begin(Slice::Image);
    store.begin(Slice::Comments);

    assert!(store.is_current(gallery_ticket));
    assert_eq!(
        store.resolve_image(image_ticket, image(1, 0, None)),
        Some(Slice::Image)
    );
}

#[test]
fn test_setters_report_their_slice() {
    let mut store = UiStore::new();
    assert_eq!(store.set_auth(true), Slice::Auth);
    assert_eq!(store.set_user(None), Slice::User);
    assert_eq!(store.set_loading(true), Slice::Loading);
    assert_eq!(store.set_comments(None), Slice::Comments);
    assert!(store.state().auth);
    assert!(store.state().loading);
}
