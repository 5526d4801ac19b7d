//! Integration tests for the file ownership gate.
//!
//! - Listing only returns the caller's files
//! - Rename and share require an existing link
//! - Unlinking deletes the file only when the last owner leaves
//! - Deleting a user deletes the files nobody else owns

use assert_matches::assert_matches;
use sqlx::PgPool;
use xesviz_core::types::DbId;
use xesviz_core::xes::parse_xes_bytes;
use xesviz_db::models::file::UnlinkOutcome;
use xesviz_db::models::upload::NewUpload;
use xesviz_db::models::user::CreateUser;
use xesviz_db::repositories::{FileRepo, IngestRepo, UserActivityRepo, UserRepo};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

const LOG: &str = r#"<log xmlns="http://www.xes-standard.org/">
  <trace>
    <string key="concept:name" value="Order-1"/>
    <event>
      <string key="concept:name" value="Created"/>
      <string key="org:resource" value="Bob"/>
    </event>
  </trace>
</log>"#;

async fn create_user(pool: &PgPool, login: &str) -> DbId {
    UserRepo::create(
        pool,
        &CreateUser {
            login: login.to_string(),
            password_hash: "x".to_string(),
        },
    )
    .await
    .unwrap()
    .id
}

async fn upload(pool: &PgPool, owner: DbId, filename: &str) -> DbId {
    let traces = parse_xes_bytes(LOG.as_bytes()).unwrap();
    IngestRepo::ingest(
        pool,
        &NewUpload {
            owner_id: owner,
            filename,
            traces: &traces,
        },
    )
    .await
    .unwrap()
    .file_id
}

async fn count(pool: &PgPool, table: &str) -> i64 {
    sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {table}"))
        .fetch_one(pool)
        .await
        .unwrap()
}

// ---------------------------------------------------------------------------
// Listing
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_list_owned_returns_only_callers_files(pool: PgPool) {
    let alice = create_user(&pool, "alice").await;
    let bob = create_user(&pool, "bobby").await;
    let first = upload(&pool, alice, "first.xes").await;
    let second = upload(&pool, alice, "second.xes").await;
    let _theirs = upload(&pool, bob, "theirs.xes").await;

    let files = FileRepo::list_owned(&pool, alice).await.unwrap();
    let ids: Vec<_> = files.iter().map(|f| f.id).collect();
    assert_eq!(ids, [second, first]);
    assert_eq!(FileRepo::list_owned(&pool, bob).await.unwrap().len(), 1);
}

// ---------------------------------------------------------------------------
// Rename
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_owner_can_rename(pool: PgPool) {
    let alice = create_user(&pool, "alice").await;
    let file_id = upload(&pool, alice, "old.xes").await;

    let renamed = FileRepo::rename(&pool, alice, file_id, "new.xes")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(renamed.filename, "new.xes");

    let stored = FileRepo::find_by_id(&pool, file_id).await.unwrap().unwrap();
    assert_eq!(stored.filename, "new.xes");

    let activity = UserActivityRepo::list_for_user(&pool, alice, None).await.unwrap();
    assert_eq!(activity[0].action, "file_rename");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_non_owner_cannot_rename(pool: PgPool) {
    let alice = create_user(&pool, "alice").await;
    let bob = create_user(&pool, "bobby").await;
    let file_id = upload(&pool, alice, "mine.xes").await;

    let result = FileRepo::rename(&pool, bob, file_id, "stolen.xes").await.unwrap();
    assert!(result.is_none());

    let stored = FileRepo::find_by_id(&pool, file_id).await.unwrap().unwrap();
    assert_eq!(stored.filename, "mine.xes");
    assert!(UserActivityRepo::list_for_user(&pool, bob, None)
        .await
        .unwrap()
        .is_empty());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_rename_of_missing_file_returns_none(pool: PgPool) {
    let alice = create_user(&pool, "alice").await;
    let result = FileRepo::rename(&pool, alice, 999_999, "x.xes").await.unwrap();
    assert!(result.is_none());
}

// ---------------------------------------------------------------------------
// Share
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_share_grants_access_and_is_idempotent(pool: PgPool) {
    let alice = create_user(&pool, "alice").await;
    let bob = create_user(&pool, "bobby").await;
    let file_id = upload(&pool, alice, "shared.xes").await;

    assert!(FileRepo::add_owner(&pool, alice, file_id, bob).await.unwrap());
    assert!(FileRepo::add_owner(&pool, alice, file_id, bob).await.unwrap());

    assert!(FileRepo::is_owner(&pool, bob, file_id).await.unwrap());
    assert_eq!(FileRepo::owner_count(&pool, file_id).await.unwrap(), 2);

    let shares: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM user_activity WHERE action = 'file_share'")
            .fetch_one(&pool)
            .await
            .unwrap();
    assert_eq!(shares, 1);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_non_owner_cannot_share(pool: PgPool) {
    let alice = create_user(&pool, "alice").await;
    let bob = create_user(&pool, "bobby").await;
    let carol = create_user(&pool, "carol").await;
    let file_id = upload(&pool, alice, "private.xes").await;

    assert!(!FileRepo::add_owner(&pool, bob, file_id, carol).await.unwrap());
    assert!(!FileRepo::is_owner(&pool, carol, file_id).await.unwrap());
}

// ---------------------------------------------------------------------------
// Unlink and cascade
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_last_owner_unlink_deletes_everything(pool: PgPool) {
    let alice = create_user(&pool, "alice").await;
    let file_id = upload(&pool, alice, "gone.xes").await;
    assert!(count(&pool, "attributes").await > 0);

    let outcome = FileRepo::unlink(&pool, alice, file_id).await.unwrap();
    assert_eq!(outcome, UnlinkOutcome::Unlinked { file_deleted: true });

    for table in ["files", "user_files", "processes", "events", "attributes"] {
        assert_eq!(count(&pool, table).await, 0, "{table} should be empty");
    }

    let activity = UserActivityRepo::list_for_user(&pool, alice, None).await.unwrap();
    assert_eq!(activity[0].action, "file_delete");
    assert_eq!(activity[0].file_id, None);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_unlink_with_remaining_owner_keeps_file(pool: PgPool) {
    let alice = create_user(&pool, "alice").await;
    let bob = create_user(&pool, "bobby").await;
    let file_id = upload(&pool, alice, "kept.xes").await;
    FileRepo::add_owner(&pool, alice, file_id, bob).await.unwrap();

    let outcome = FileRepo::unlink(&pool, alice, file_id).await.unwrap();
    assert_eq!(outcome, UnlinkOutcome::Unlinked { file_deleted: false });

    assert!(!FileRepo::is_owner(&pool, alice, file_id).await.unwrap());
    assert!(FileRepo::is_owner(&pool, bob, file_id).await.unwrap());
    assert_eq!(count(&pool, "processes").await, 1);
    assert_eq!(count(&pool, "events").await, 1);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_non_owner_unlink_is_not_linked(pool: PgPool) {
    let alice = create_user(&pool, "alice").await;
    let bob = create_user(&pool, "bobby").await;
    let file_id = upload(&pool, alice, "mine.xes").await;

    let outcome = FileRepo::unlink(&pool, bob, file_id).await.unwrap();
    assert_matches!(outcome, UnlinkOutcome::NotLinked);
    assert_eq!(count(&pool, "files").await, 1);

    let outcome = FileRepo::unlink(&pool, alice, 999_999).await.unwrap();
    assert_matches!(outcome, UnlinkOutcome::NotLinked);
}

async fn delete_user(pool: &PgPool, user_id: DbId) {
    sqlx::query("DELETE FROM users WHERE id = $1")
        .bind(user_id)
        .execute(pool)
        .await
        .unwrap();
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_deleting_sole_owner_deletes_their_files(pool: PgPool) {
    let alice = create_user(&pool, "alice").await;
    upload(&pool, alice, "orphan.xes").await;

    delete_user(&pool, alice).await;

    for table in ["files", "user_files", "processes", "events", "attributes"] {
        assert_eq!(count(&pool, table).await, 0, "{table} should be empty");
    }
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_deleting_one_owner_keeps_shared_file(pool: PgPool) {
    let alice = create_user(&pool, "alice").await;
    let bob = create_user(&pool, "bobby").await;
    let file_id = upload(&pool, alice, "shared.xes").await;
    FileRepo::add_owner(&pool, alice, file_id, bob).await.unwrap();

    delete_user(&pool, alice).await;

    assert!(FileRepo::is_owner(&pool, bob, file_id).await.unwrap());
    assert_eq!(FileRepo::owner_count(&pool, file_id).await.unwrap(), 1);
    assert_eq!(count(&pool, "events").await, 1);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_concurrent_unlinks_by_both_owners_delete_the_file(pool: PgPool) {
    let alice = create_user(&pool, "alice").await;
    let bob = create_user(&pool, "bobby").await;
    let file_id = upload(&pool, alice, "race.xes").await;
    FileRepo::add_owner(&pool, alice, file_id, bob).await.unwrap();

    let (a, b) = tokio::join!(
        FileRepo::unlink(&pool, alice, file_id),
        FileRepo::unlink(&pool, bob, file_id),
    );
    let deleted = [a.unwrap(), b.unwrap()]
        .iter()
        .filter(|o| **o == UnlinkOutcome::Unlinked { file_deleted: true })
        .count();

    assert_eq!(deleted, 1);
    assert_eq!(count(&pool, "files").await, 0);
}
