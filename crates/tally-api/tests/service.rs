mod common;

use chrono::{Duration, Utc};
use futures_util::future::join_all;
use uuid::Uuid;

use tally_api::ServiceError;
use tally_db::BoardStore;
use tally_types::BoardError;

use common::{memory_db, service, settings};

#[tokio::test]
async fn upvoted_message_reaches_the_queue() {
    let svc = service(memory_db());
    let board = svc.create_board("streamer", &settings(2, 3600, 5)).await.unwrap();

    let msg = svc.submit_message(board.id, "alice", "hello").await.unwrap();
    for _ in 0..3 {
        svc.upvote(board.id, msg.id).await.unwrap();
    }

    let report = svc.sweep_board(board.id, Utc::now()).await.unwrap();
    assert_eq!(report.promoted, vec![msg.id]);

    let board = svc.get_board(board.id).await.unwrap();
    assert!(board.pending().is_empty());
    assert_eq!(board.queue().len(), 1);
    assert_eq!(board.queue()[0].author, "alice");
    assert_eq!(board.queue()[0].body, "hello");
}

#[tokio::test]
async fn unvoted_message_expires() {
    let svc = service(memory_db());
    let board = svc.create_board("streamer", &settings(2, 3600, 5)).await.unwrap();
    let msg = svc.submit_message(board.id, "alice", "hello").await.unwrap();

    let later = Utc::now() + Duration::seconds(3601);
    let report = svc.sweep_board(board.id, later).await.unwrap();
    assert_eq!(report.expired, vec![msg.id]);
    assert!(report.promoted.is_empty());

    let board = svc.get_board(board.id).await.unwrap();
    assert!(board.pending().is_empty());
    assert!(board.queue().is_empty());
    assert!(matches!(
        svc.get_message(board.id, msg.id).await,
        Err(ServiceError::Board(BoardError::MessageNotFound(_)))
    ));
}

#[tokio::test]
async fn full_board_rejects_submission() {
    let svc = service(memory_db());
    let board = svc.create_board("streamer", &settings(2, 3600, 1)).await.unwrap();
    svc.submit_message(board.id, "alice", "first").await.unwrap();

    let err = svc.submit_message(board.id, "bob", "second").await.unwrap_err();
    assert!(matches!(
        err,
        ServiceError::Board(BoardError::CapacityExceeded { max: 1 })
    ));
    assert_eq!(svc.get_board(board.id).await.unwrap().pending().len(), 1);
}

#[tokio::test]
async fn empty_queue_pops_none() {
    let svc = service(memory_db());
    let board = svc.create_board("streamer", &settings(2, 3600, 5)).await.unwrap();
    assert!(svc.pop_announcement(board.id, "streamer").await.unwrap().is_none());
}

#[tokio::test]
async fn queue_drains_in_promotion_order() {
    let svc = service(memory_db());
    let board = svc.create_board("streamer", &settings(0, 3600, 5)).await.unwrap();

    let first = svc.submit_message(board.id, "alice", "first").await.unwrap();
    tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    let second = svc.submit_message(board.id, "bob", "second").await.unwrap();
    svc.upvote(board.id, second.id).await.unwrap();
    svc.upvote(board.id, first.id).await.unwrap();
    svc.sweep_board(board.id, Utc::now()).await.unwrap();

    let a = svc.pop_announcement(board.id, "streamer").await.unwrap().unwrap();
    let b = svc.pop_announcement(board.id, "streamer").await.unwrap().unwrap();
    assert_eq!(a.message_id, first.id);
    assert_eq!(b.message_id, second.id);
    assert!(svc.pop_announcement(board.id, "streamer").await.unwrap().is_none());
}

#[tokio::test]
async fn concurrent_votes_are_all_counted() {
    let svc = service(memory_db());
    let board = svc.create_board("streamer", &settings(1000, 3600, 5)).await.unwrap();
    let msg = svc.submit_message(board.id, "alice", "hello").await.unwrap();

    let votes = (0..40).map(|i| {
        let svc = svc.clone();
        async move {
            if i % 4 == 0 {
                svc.downvote(board.id, msg.id).await
            } else {
                svc.upvote(board.id, msg.id).await
            }
        }
    });
    for result in join_all(votes).await {
        result.unwrap();
    }

    let stored = svc.get_message(board.id, msg.id).await.unwrap();
    assert_eq!(stored.votes, 30 - 10);
}

#[tokio::test]
async fn concurrent_submissions_respect_capacity() {
    let svc = service(memory_db());
    let board = svc.create_board("streamer", &settings(2, 3600, 3)).await.unwrap();

    let submissions = (0..10).map(|i| {
        let svc = svc.clone();
        async move { svc.submit_message(board.id, "viewer", &format!("question {}", i)).await }
    });
    let results = join_all(submissions).await;

    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 3);
    assert_eq!(svc.get_board(board.id).await.unwrap().pending().len(), 3);
}

#[tokio::test]
async fn blank_body_is_rejected() {
    let svc = service(memory_db());
    let board = svc.create_board("streamer", &settings(2, 3600, 5)).await.unwrap();
    assert!(matches!(
        svc.submit_message(board.id, "alice", "   ").await,
        Err(ServiceError::Board(BoardError::Validation(_)))
    ));
}

#[tokio::test]
async fn missing_board_and_message_are_not_found() {
    let svc = service(memory_db());
    let ghost = Uuid::new_v4();

    assert!(matches!(svc.get_board(ghost).await, Err(ServiceError::BoardNotFound(_))));
    assert!(matches!(
        svc.submit_message(ghost, "alice", "hello").await,
        Err(ServiceError::BoardNotFound(_))
    ));

    let board = svc.create_board("streamer", &settings(2, 3600, 5)).await.unwrap();
    assert!(matches!(
        svc.upvote(board.id, Uuid::new_v4()).await,
        Err(ServiceError::Board(BoardError::MessageNotFound(_)))
    ));
}

#[tokio::test]
async fn unknown_boards_leave_no_locks_behind() {
    let svc = service(memory_db());
    for _ in 0..200 {
        assert!(svc.upvote(Uuid::new_v4(), Uuid::new_v4()).await.is_err());
        assert!(svc.submit_message(Uuid::new_v4(), "alice", "hi").await.is_err());
        assert!(svc.pop_announcement(Uuid::new_v4(), "alice").await.is_err());
    }
    assert_eq!(svc.locks().len().await, 0);

    let board = svc.create_board("streamer", &settings(2, 3600, 5)).await.unwrap();
    svc.submit_message(board.id, "alice", "hello").await.unwrap();
    assert_eq!(svc.locks().len().await, 1);
}

#[tokio::test]
async fn message_is_scoped_to_its_board() {
    let svc = service(memory_db());
    let a = svc.create_board("streamer", &settings(2, 3600, 5)).await.unwrap();
    let b = svc.create_board("streamer", &settings(2, 3600, 5)).await.unwrap();
    let msg = svc.submit_message(a.id, "alice", "hello").await.unwrap();

    assert_eq!(svc.get_message(a.id, msg.id).await.unwrap().id, msg.id);
    assert!(svc.get_message(b.id, msg.id).await.is_err());
    assert!(svc.upvote(b.id, msg.id).await.is_err());
}

#[tokio::test]
async fn only_the_streamer_may_manage_a_board() {
    let svc = service(memory_db());
    let board = svc.create_board("streamer", &settings(2, 3600, 5)).await.unwrap();

    assert!(matches!(
        svc.update_board(board.id, "mallory", settings(0, 0, 0)).await,
        Err(ServiceError::Forbidden)
    ));
    assert!(matches!(
        svc.delete_board(board.id, "mallory").await,
        Err(ServiceError::Forbidden)
    ));
    assert!(matches!(
        svc.pop_announcement(board.id, "mallory").await,
        Err(ServiceError::Forbidden)
    ));
    assert!(svc.get_board(board.id).await.is_ok());
}

#[tokio::test]
async fn update_replaces_settings() {
    let svc = service(memory_db());
    let board = svc.create_board("streamer", &settings(2, 3600, 5)).await.unwrap();

    let mut new_settings = settings(7, 60, 10);
    new_settings.title = "Lightning round".to_string();
    let updated = svc.update_board(board.id, "streamer", new_settings).await.unwrap();

    assert_eq!(updated.title, "Lightning round");
    assert_eq!(updated.count_threshold, 7);
    assert_eq!(updated.time_threshold, 60);
    assert_eq!(updated.max_messages, 10);
    assert!(updated.updated_at >= board.updated_at);

    let stored = svc.get_board(board.id).await.unwrap();
    assert_eq!(stored.title, "Lightning round");
}

#[tokio::test]
async fn negative_settings_are_rejected() {
    let svc = service(memory_db());
    assert!(matches!(
        svc.create_board("streamer", &settings(-1, 3600, 5)).await,
        Err(ServiceError::Board(BoardError::Validation(_)))
    ));
}

#[tokio::test]
async fn delete_cascades_and_forgets_lock() {
    let db = memory_db();
    let svc = service(db.clone());
    let board = svc.create_board("streamer", &settings(2, 3600, 5)).await.unwrap();
    let msg = svc.submit_message(board.id, "alice", "hello").await.unwrap();
    assert_eq!(svc.locks().len().await, 1);

    svc.delete_board(board.id, "streamer").await.unwrap();

    assert_eq!(svc.locks().len().await, 0);
    assert!(db.load_message(msg.id).unwrap().is_none());
    assert!(matches!(
        svc.delete_board(board.id, "streamer").await,
        Err(ServiceError::BoardNotFound(_))
    ));
}

#[tokio::test]
async fn list_returns_only_own_boards() {
    let svc = service(memory_db());
    svc.create_board("alice", &settings(2, 3600, 5)).await.unwrap();
    svc.create_board("alice", &settings(2, 3600, 5)).await.unwrap();
    svc.create_board("bob", &settings(2, 3600, 5)).await.unwrap();

    let boards = svc.list_boards("alice").await.unwrap();
    assert_eq!(boards.len(), 2);
    assert!(boards.iter().all(|b| b.streamer == "alice"));
    assert_eq!(svc.board_ids().await.unwrap().len(), 3);
}
