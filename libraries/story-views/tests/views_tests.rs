
use std::sync::Arc;
use story_core::{StoryId, UserId, ViewBackend, ViewInsert};
use story_views::{views, SqliteViewStore, ViewGuard, ViewOutcome};
use test_helpers::*;

#[tokio::test]
async fn test_insert_then_duplicate_is_already_exists() {
    let db = TestDb::new().await;
    let viewer = UserId::new("u1");
    let story = StoryId::new("s7");

    let first = db.store.insert_view(&viewer, &story).await.unwrap();
    let second = db.store.insert_view(&viewer, &story).await.unwrap();

    assert_eq!(first, ViewInsert::Inserted);
    assert_eq!(second, ViewInsert::AlreadyExists);
    assert_eq!(db.store.view_count(&story).await.unwrap(), 1);
}

#[tokio::test]
async fn test_view_queries() {
    let db = TestDb::new().await;
    let story = StoryId::new("s1");

    assert!(!views::has_viewed(db.pool(), &UserId::new("u1"), &story)
        .await
        .unwrap());

    for viewer in ["u1", "u2", "u3"] {
        views::insert_view(db.pool(), &UserId::new(viewer), &story)
            .await
            .unwrap();
    }
    views::insert_view(db.pool(), &UserId::new("u1"), &StoryId::new("s2"))
        .await
        .unwrap();

    assert!(db.store.has_viewed(&UserId::new("u2"), &story).await.unwrap());
    assert!(!db
        .store
        .has_viewed(&UserId::new("u2"), &StoryId::new("s2"))
        .await
        .unwrap());
    assert_eq!(db.store.view_count(&story).await.unwrap(), 3);

    let viewers = db.store.viewers_of(&story).await.unwrap();
    let ids: Vec<_> = viewers.iter().map(|v| v.viewer_id.as_str()).collect();
    assert_eq!(ids, vec!["u1", "u2", "u3"]);
    assert!(viewers.iter().all(|v| v.story_id == story));
}

#[tokio::test]
async fn test_double_fire_makes_one_backend_attempt() {
    // One activation fires from both the load callback and the dwell timer
    let db = TestDb::new().await;
    let backend = Arc::new(GatedBackend::new(db.store.clone()));
    let guard = ViewGuard::new(backend.clone());
    let viewer = UserId::new("u1");
    let story = StoryId::new("s7");

    let from_load = {
        let guard = guard.clone();
        let (viewer, story) = (viewer.clone(), story.clone());
        tokio::spawn(async move { guard.record_view(&viewer, &story).await })
    };
    while backend.calls() == 0 {
        tokio::task::yield_now().await;
    }

    let from_dwell = guard.record_view(&viewer, &story).await;
    assert_eq!(from_dwell, ViewOutcome::InFlight);

    backend.gate.add_permits(1);
    assert_eq!(from_load.await.unwrap(), ViewOutcome::Recorded);

    assert_eq!(backend.calls(), 1);
    assert_eq!(db.store.view_count(&story).await.unwrap(), 1);
    assert_eq!(guard.record_view(&viewer, &story).await, ViewOutcome::Skipped);
    assert_eq!(backend.calls(), 1);
}

#[tokio::test]
async fn test_dedup_survives_restart() {
    let db = TestDb::new().await;
    let viewer = UserId::new("u1");
    let story = StoryId::new("s7");

    let first_session = ViewGuard::new(Arc::new(db.store.clone()));
    assert_eq!(
        first_session.record_view(&viewer, &story).await,
        ViewOutcome::Recorded
    );

    // App restart: fresh guard, reopened database
    let reopened = SqliteViewStore::open(&db.url()).await.unwrap();
    let second_session = ViewGuard::new(Arc::new(reopened.clone()));
    let outcome = second_session.record_view(&viewer, &story).await;

    assert_eq!(outcome, ViewOutcome::AlreadyRecorded);
    assert!(outcome.is_confirmed());
    assert!(second_session.is_recorded(&viewer, &story));
    assert_eq!(reopened.view_count(&story).await.unwrap(), 1);
}

#[tokio::test]
async fn test_backend_failure_is_swallowed_and_retried() {
    let guard = ViewGuard::new(Arc::new(UnavailableBackend));
    let viewer = UserId::new("u1");
    let story = StoryId::new("s7");

    assert_eq!(guard.record_view(&viewer, &story).await, ViewOutcome::Failed);
    assert!(!guard.is_recorded(&viewer, &story));
    // Not stuck in flight after the failure
    assert_eq!(guard.record_view(&viewer, &story).await, ViewOutcome::Failed);
}

#[tokio::test]
async fn test_abandoned_submission_does_not_block_later_attempts() {
    let db = TestDb::new().await;
    let backend = Arc::new(GatedBackend::new(db.store.clone()));
    let guard = ViewGuard::new(backend.clone());
    let viewer = UserId::new("u1");
    let story = StoryId::new("s7");

    let abandoned = {
        let guard = guard.clone();
        let (viewer, story) = (viewer.clone(), story.clone());
        tokio::spawn(async move { guard.record_view(&viewer, &story).await })
    };
    while backend.calls() == 0 {
        tokio::task::yield_now().await;
    }
    abandoned.abort();
    let _ = abandoned.await;

    backend.gate.add_permits(1);
    assert_eq!(guard.record_view(&viewer, &story).await, ViewOutcome::Recorded);
    assert_eq!(backend.calls(), 2);
}
