use photo_gallery::{
    models::{ImageMetadata, NewPhoto, Photo, User},
    repository::{RepoError, Repository, SqliteRepository},
};
use tokio::test;

// --- Test Context and Setup ---

/// A fresh, migrated in-memory database per test.
struct DbTestContext {
    repo: SqliteRepository,
}

impl DbTestContext {
    async fn setup() -> Self {
        let repo = SqliteRepository::connect("sqlite::memory:")
            .await
            .expect("Failed to open in-memory database for integration tests.");
        DbTestContext { repo }
    }

    fn repository(&self) -> &SqliteRepository {
        &self.repo
    }
}

// --- Test Data Helpers ---

async fn create_test_user(repo: &SqliteRepository, username: &str) -> User {
    let token = format!("token-{username}");
    repo.create_user(username, "$argon2id$placeholder", &token)
        .await
        .expect("Failed to create test user")
}

async fn create_test_photo(repo: &SqliteRepository, owner: i64, title: &str) -> Photo {
    repo.create_photo(NewPhoto {
        title: title.to_string(),
        user_id: owner,
        image_metadata: ImageMetadata {
            path: format!("uploads/{title}"),
            original_name: format!("{title}.jpg"),
            mime_type: "image/jpeg".to_string(),
            size: 1024,
        },
    })
    .await
    .expect("Failed to create test photo")
}

// --- Users ---

#[test]
async fn test_create_user_and_lookups() {
    let ctx = DbTestContext::setup().await;
    let repo = ctx.repository();

    let alice = create_test_user(repo, "alice").await;
    assert!(alice.id > 0);
    assert_eq!(alice.token.as_deref(), Some("token-alice"));
    assert!(alice.token_issued_at.is_some());

    let by_id = repo.get_user(alice.id).await.unwrap().unwrap();
    assert_eq!(by_id.username, "alice");

    let by_name = repo.find_user_by_username("alice").await.unwrap().unwrap();
    assert_eq!(by_name.id, alice.id);

    let by_token = repo.find_user_by_token("token-alice").await.unwrap().unwrap();
    assert_eq!(by_token.id, alice.id);

    assert!(repo.get_user(alice.id + 100).await.unwrap().is_none());
    assert!(repo.find_user_by_username("Alice").await.unwrap().is_none());
}

#[test]
async fn test_duplicate_username_is_reported() {
    let ctx = DbTestContext::setup().await;
    let repo = ctx.repository();

    create_test_user(repo, "alice").await;
    let second = repo.create_user("alice", "hash", "other-token").await;

    assert!(matches!(second, Err(RepoError::DuplicateUsername)));
}

#[test]
async fn test_set_and_clear_token() {
    let ctx = DbTestContext::setup().await;
    let repo = ctx.repository();
    let alice = create_test_user(repo, "alice").await;

    repo.set_user_token(alice.id, Some("rotated")).await.unwrap();
    assert!(repo.find_user_by_token("token-alice").await.unwrap().is_none());
    assert_eq!(
        repo.find_user_by_token("rotated").await.unwrap().unwrap().id,
        alice.id
    );

    repo.set_user_token(alice.id, None).await.unwrap();
    let cleared = repo.get_user(alice.id).await.unwrap().unwrap();
    assert_eq!(cleared.token, None);
    assert_eq!(cleared.token_issued_at, None);
    assert!(repo.find_user_by_token("rotated").await.unwrap().is_none());
}

#[test]
async fn test_list_users_pages_newest_first() {
    let ctx = DbTestContext::setup().await;
    let repo = ctx.repository();
    for name in ["u1", "u2", "u3"] {
        create_test_user(repo, name).await;
    }

    let (total, first) = repo.list_users(2, 0).await.unwrap();
    let (_, second) = repo.list_users(2, 2).await.unwrap();
    let (_, past_end) = repo.list_users(2, 4).await.unwrap();

    assert_eq!(total, 3);
    let names: Vec<_> = first
        .iter()
        .chain(second.iter())
        .map(|u| u.username.as_str())
        .collect();
    assert_eq!(names, vec!["u3", "u2", "u1"]);
    assert!(past_end.is_empty());
}

// --- Photos ---

#[test]
async fn test_photo_round_trip_keeps_metadata() {
    let ctx = DbTestContext::setup().await;
    let repo = ctx.repository();
    let alice = create_test_user(repo, "alice").await;

    let created = create_test_photo(repo, alice.id, "sunset").await;
    let fetched = repo.get_photo(created.id).await.unwrap().unwrap();

    assert_eq!(fetched.title, "sunset");
    assert_eq!(fetched.user_id, alice.id);
    assert_eq!(fetched.image_metadata, created.image_metadata);
    assert_eq!(fetched.image_metadata.mime_type, "image/jpeg");
}

#[test]
async fn test_list_photos_by_owner_is_scoped_and_paged() {
    let ctx = DbTestContext::setup().await;
    let repo = ctx.repository();
    let alice = create_test_user(repo, "alice").await;
    let bob = create_test_user(repo, "bob").await;

    let p1 = create_test_photo(repo, alice.id, "a1").await;
    create_test_photo(repo, bob.id, "b1").await;
    let p2 = create_test_photo(repo, alice.id, "a2").await;

    let (total, page1) = repo.list_photos_by_owner(alice.id, 1, 0).await.unwrap();
    let (_, page2) = repo.list_photos_by_owner(alice.id, 1, 1).await.unwrap();

    assert_eq!(total, 2);
    assert_eq!(page1[0].id, p2.id);
    assert_eq!(page2[0].id, p1.id);

    let (empty_total, none) = repo.list_photos_by_owner(999, 10, 0).await.unwrap();
    assert_eq!(empty_total, 0);
    assert!(none.is_empty());
}

#[test]
async fn test_delete_photo_removes_its_comments() {
    let ctx = DbTestContext::setup().await;
    let repo = ctx.repository();
    let alice = create_test_user(repo, "alice").await;
    let doomed = create_test_photo(repo, alice.id, "doomed").await;
    let kept = create_test_photo(repo, alice.id, "kept").await;

    repo.create_comment(doomed.id, "bob", "first").await.unwrap();
    repo.create_comment(doomed.id, "carol", "second").await.unwrap();
    let survivor = repo.create_comment(kept.id, "bob", "stays").await.unwrap();

    assert!(repo.delete_photo(doomed.id).await.unwrap());

    assert!(repo.get_photo(doomed.id).await.unwrap().is_none());
    let (total, comments) = repo.list_comments(doomed.id, 10, 0).await.unwrap();
    assert_eq!(total, 0);
    assert!(comments.is_empty());

    let (_, remaining) = repo.list_comments(kept.id, 10, 0).await.unwrap();
    assert_eq!(remaining, vec![survivor]);

    // Second delete reports nothing removed.
    assert!(!repo.delete_photo(doomed.id).await.unwrap());
}

// --- Comments ---

#[test]
async fn test_comments_newest_first_and_delete() {
    let ctx = DbTestContext::setup().await;
    let repo = ctx.repository();
    let alice = create_test_user(repo, "alice").await;
    let photo = create_test_photo(repo, alice.id, "p").await;

    let older = repo.create_comment(photo.id, "bob", "older").await.unwrap();
    let newer = repo.create_comment(photo.id, "Anonymous", "newer").await.unwrap();
    assert_eq!(newer.author, "Anonymous");

    let (total, listed) = repo.list_comments(photo.id, 10, 0).await.unwrap();
    assert_eq!(total, 2);
    assert_eq!(listed[0].id, newer.id);
    assert_eq!(listed[1].id, older.id);

    let fetched = repo.get_comment(older.id).await.unwrap().unwrap();
    assert_eq!(fetched.content, "older");
    assert_eq!(fetched.image_id, photo.id);

    assert!(repo.delete_comment(older.id).await.unwrap());
    assert!(!repo.delete_comment(older.id).await.unwrap());
    assert!(repo.get_comment(older.id).await.unwrap().is_none());
}
