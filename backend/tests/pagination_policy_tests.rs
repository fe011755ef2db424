use photo_gallery::{
    auth::AuthUser,
    error::ApiError,
    models::{Comment, Photo},
    pagination::{PageParams, PageRequest, Window, paginate, total_pages},
    policy::{SENTINEL_GALLERY_ID, authorize_comment_delete, authorize_photo_delete, claimed_gallery},
};

fn params(page: &str, limit: &str) -> PageParams {
    PageParams {
        page: Some(page.to_string()),
        limit: Some(limit.to_string()),
    }
}

fn user(id: i64, username: &str) -> AuthUser {
    AuthUser {
        id,
        username: username.to_string(),
        token: format!("tok-{id}"),
    }
}

fn photo(id: i64, owner: i64) -> Photo {
    Photo {
        id,
        user_id: owner,
        ..Photo::default()
    }
}

fn comment(image_id: i64, author: &str) -> Comment {
    Comment {
        id: 100,
        image_id,
        author: author.to_string(),
        ..Comment::default()
    }
}

fn is_forbidden(result: Result<(), ApiError>) -> bool {
    matches!(result, Err(ApiError::Forbidden))
}

// --- Pagination ---

#[test]
fn test_total_pages_is_ceiling() {
    assert_eq!(total_pages(0, 1), 0);
    assert_eq!(total_pages(1, 1), 1);
    assert_eq!(total_pages(10, 10), 1);
    assert_eq!(total_pages(11, 10), 2);
    assert_eq!(total_pages(7, 3), 3);
}

#[test]
fn test_total_pages_with_huge_limit() {
    assert_eq!(total_pages(2, i64::MAX), 1);
    assert_eq!(total_pages(i64::MAX, i64::MAX), 1);
    assert_eq!(total_pages(i64::MAX, 1), i64::MAX);
    assert_eq!(total_pages(i64::MAX, 2), i64::MAX / 2 + 1);

    let request = params("1", "9223372036854775807").resolve(10);
    assert_eq!(request.limit, i64::MAX);
    assert_eq!(paginate(2, request.page, request.limit), Window { offset: 0, total_pages: 1 });
}

#[test]
fn test_paginate_windows() {
    assert_eq!(paginate(25, 1, 10), Window { offset: 0, total_pages: 3 });
    assert_eq!(paginate(25, 3, 10), Window { offset: 20, total_pages: 3 });
    // Past the end is representable and not clamped.
    assert_eq!(paginate(25, 9, 10), Window { offset: 80, total_pages: 3 });
    // Empty collection.
    assert_eq!(paginate(0, 1, 10).total_pages, 0);
}

#[test]
fn test_windows_cover_collection_without_overlap() {
    let total = 23_i64;
    let limit = 4_i64;
    let pages = total_pages(total, limit);

    let mut covered = Vec::new();
    for page in 1..=pages {
        let window = paginate(total, page, limit);
        let end = (window.offset + limit).min(total);
        covered.extend(window.offset..end);
    }
    assert_eq!(covered, (0..total).collect::<Vec<_>>());
}

#[test]
fn test_page_params_defaults_and_garbage() {
    assert_eq!(PageParams::default().resolve(10), PageRequest { page: 1, limit: 10 });
    assert_eq!(params("abc", "xyz").resolve(1), PageRequest { page: 1, limit: 1 });
    assert_eq!(params("0", "0").resolve(10), PageRequest { page: 1, limit: 10 });
    assert_eq!(params("3", "-2").resolve(10), PageRequest { page: 3, limit: 10 });
    assert_eq!(params("2abc", "5").resolve(10), PageRequest { page: 2, limit: 5 });
}

#[test]
fn test_negative_page_is_echoed_but_offset_floored() {
    let request = params("-2", "5").resolve(10);
    assert_eq!(request.page, -2);
    assert!(request.offset() < 0);
    assert_eq!(request.query_offset(), 0);
}

#[test]
fn test_page_params_new() {
    assert_eq!(PageParams::new(4, 2).resolve(10), PageRequest { page: 4, limit: 2 });
}

// --- Authorization policy ---

#[test]
fn test_claimed_gallery_rejects_sentinel_and_garbage() {
    assert!(matches!(claimed_gallery(SENTINEL_GALLERY_ID), Err(ApiError::Forbidden)));
    assert!(matches!(claimed_gallery("abc"), Err(ApiError::Forbidden)));
    assert!(matches!(claimed_gallery(""), Err(ApiError::Forbidden)));
    assert_eq!(claimed_gallery("12").unwrap(), 12);
}

#[test]
fn test_photo_delete_rules() {
    let alice = user(1, "alice");
    let bob = user(2, "bob");
    let alices_photo = photo(10, 1);

    assert!(authorize_photo_delete(&alice, "1", &alices_photo).is_ok());
    assert!(is_forbidden(authorize_photo_delete(&alice, "-1", &alices_photo)));
    assert!(is_forbidden(authorize_photo_delete(&alice, "2", &alices_photo)));
    assert!(is_forbidden(authorize_photo_delete(&bob, "2", &alices_photo)));
    assert!(is_forbidden(authorize_photo_delete(&bob, "1", &alices_photo)));
}

#[test]
fn test_comment_delete_owner_branch() {
    let alice = user(1, "alice");
    let on_alices_photo = comment(10, "bob");
    let alices_photo = photo(10, 1);

    assert!(authorize_comment_delete(&alice, "1", &on_alices_photo, Some(&alices_photo)).is_ok());
    // Owner outside their own gallery.
    assert!(is_forbidden(authorize_comment_delete(
        &alice,
        "2",
        &on_alices_photo,
        Some(&alices_photo)
    )));
    // Owner with a non-numeric gallery id.
    assert!(is_forbidden(authorize_comment_delete(
        &alice,
        "abc",
        &on_alices_photo,
        Some(&alices_photo)
    )));
    // Photo gone: the owner branch fails closed.
    assert!(is_forbidden(authorize_comment_delete(&alice, "1", &on_alices_photo, None)));
    // A photo that is not the comment's parent proves nothing.
    assert!(is_forbidden(authorize_comment_delete(
        &alice,
        "1",
        &on_alices_photo,
        Some(&photo(11, 1))
    )));
}

#[test]
fn test_comment_delete_author_branch() {
    let bob = user(2, "bob");
    let carol = user(3, "carol");
    let bobs_comment = comment(10, "bob");
    let alices_photo = photo(10, 1);

    // Author, regardless of which gallery is claimed or whether the photo exists.
    assert!(authorize_comment_delete(&bob, "1", &bobs_comment, Some(&alices_photo)).is_ok());
    assert!(authorize_comment_delete(&bob, "99", &bobs_comment, None).is_ok());
    // A non-numeric gallery id does not matter to the author.
    assert!(authorize_comment_delete(&bob, "abc", &bobs_comment, Some(&alices_photo)).is_ok());
    // Never with the sentinel.
    assert!(is_forbidden(authorize_comment_delete(&bob, "-1", &bobs_comment, None)));
    // Third party.
    assert!(is_forbidden(authorize_comment_delete(
        &carol,
        "3",
        &bobs_comment,
        Some(&alices_photo)
    )));
    // Author match is exact.
    assert!(is_forbidden(authorize_comment_delete(
        &user(4, "Bob"),
        "4",
        &bobs_comment,
        None
    )));
}
