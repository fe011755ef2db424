use chrono::Utc;
use photo_gallery::models::{
    AuthResponse, Comment, CreateCommentRequest, ImageMetadata, Photo, PhotoListing, PublicUser,
    User, UserListing, UserSummary,
};
use serde_json::json;

// --- Tests ---

#[test]
fn test_photo_serializes_camel_case_with_metadata() {
    let photo = Photo {
        id: 3,
        title: "Sunset".to_string(),
        user_id: 9,
        image_metadata: ImageMetadata {
            path: "uploads/abc".to_string(),
            original_name: "sunset.png".to_string(),
            mime_type: "image/png".to_string(),
            size: 42,
        },
        created_at: Utc::now(),
        updated_at: Utc::now(),
    };

    let value = serde_json::to_value(&photo).unwrap();

    assert_eq!(value["userId"], 9);
    assert_eq!(value["imageMetadata"]["mimeType"], "image/png");
    assert_eq!(value["imageMetadata"]["originalName"], "sunset.png");
    assert!(value.get("createdAt").is_some());
    assert!(value.get("user_id").is_none());
}

#[test]
fn test_comment_uses_image_id() {
    let comment = Comment {
        id: 1,
        image_id: 3,
        author: "bob".to_string(),
        content: "nice!".to_string(),
        ..Comment::default()
    };

    let value = serde_json::to_value(&comment).unwrap();
    assert_eq!(value["imageId"], 3);
    assert_eq!(value["author"], "bob");
}

#[test]
fn test_photo_listing_limit_is_optional() {
    let with_limit = PhotoListing {
        page: 1,
        limit: Some(1),
        total_pages: 4,
        photos: vec![],
    };
    let without_limit = PhotoListing {
        limit: None,
        ..with_limit.clone()
    };

    let value = serde_json::to_value(&with_limit).unwrap();
    assert_eq!(value, json!({ "page": 1, "limit": 1, "totalPages": 4, "photos": [] }));

    let value = serde_json::to_value(&without_limit).unwrap();
    assert!(value.get("limit").is_none());

    // And a body without `limit` still parses.
    let parsed: PhotoListing =
        serde_json::from_value(json!({ "page": 2, "totalPages": 0, "photos": [] })).unwrap();
    assert_eq!(parsed.limit, None);
    assert_eq!(parsed.page, 2);
}

#[test]
fn test_user_views_never_leak_password() {
    let user = User {
        id: 5,
        username: "alice".to_string(),
        password: "$argon2id$secret".to_string(),
        token: Some("tok".to_string()),
        ..User::default()
    };

    let public = serde_json::to_value(PublicUser::from(&user)).unwrap();
    assert_eq!(public, json!({ "id": 5, "username": "alice", "token": "tok" }));

    let summary = serde_json::to_value(UserSummary::from(&user)).unwrap();
    assert!(summary.get("password").is_none());
    assert!(summary.get("token").is_none());
    assert!(summary.get("createdAt").is_some());
}

#[test]
fn test_auth_response_shape() {
    let body = AuthResponse {
        message: "Login successful".to_string(),
        user: PublicUser {
            id: 1,
            username: "alice".to_string(),
            token: Some("t".to_string()),
        },
    };
    let value = serde_json::to_value(&body).unwrap();
    assert_eq!(value["user"]["token"], "t");
    assert_eq!(value["message"], "Login successful");
}

#[test]
fn test_listing_wire_names() {
    let listing = UserListing {
        page: 1,
        total_pages: 0,
        users: vec![],
    };
    let value = serde_json::to_value(&listing).unwrap();
    assert_eq!(value, json!({ "page": 1, "totalPages": 0, "users": [] }));
}

#[test]
fn test_comment_request_requires_both_fields() {
    let ok: Result<CreateCommentRequest, _> =
        serde_json::from_value(json!({ "content": "hi", "author": "bob" }));
    assert!(ok.is_ok());

    let missing: Result<CreateCommentRequest, _> = serde_json::from_value(json!({ "content": "hi" }));
    assert!(missing.is_err());

    let wrong_type: Result<CreateCommentRequest, _> =
        serde_json::from_value(json!({ "content": 5, "author": "bob" }));
    assert!(wrong_type.is_err());
}
