use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info};
use uuid::Uuid;

use tally_db::BoardStore;
use tally_types::{Announcement, Board, BoardError, BoardSettings, Message, SweepReport};

use crate::error::ServiceError;
use crate::locks::BoardLocks;

/// How long one board operation may wait for its lock and its storage call.
pub const DEFAULT_BOARD_TIMEOUT: Duration = Duration::from_secs(2);

/// Board operations for the HTTP layer and the sweep scheduler.
///
/// Every mutation takes the board's lock, then loads, mutates and saves the
/// board on a blocking thread while holding it. The guard is released only
/// when that thread finishes, even if the caller has already timed out.
#[derive(Clone)]
pub struct BoardService {
    store: Arc<dyn BoardStore>,
    locks: BoardLocks,
    timeout: Duration,
}

enum Vote {
    Up,
    Down,
}

impl BoardService {
    pub fn new(store: Arc<dyn BoardStore>, timeout: Duration) -> Self {
        Self {
            store,
            locks: BoardLocks::new(),
            timeout,
        }
    }

    pub fn locks(&self) -> &BoardLocks {
        &self.locks
    }

    pub async fn list_boards(&self, streamer: &str) -> Result<Vec<Board>, ServiceError> {
        let streamer = streamer.to_string();
        self.unlocked(move |store| Ok(store.load_boards_by_streamer(&streamer)?))
            .await
    }

    /// Ids of every stored board. Not bound by the per-board deadline: a slow
    /// listing delays the sweep tick but never empties it.
    pub async fn board_ids(&self) -> Result<Vec<Uuid>, ServiceError> {
        let store = self.store.clone();
        let ids = tokio::task::spawn_blocking(move || store.load_board_ids())
            .await
            .map_err(|e| ServiceError::Internal(format!("blocking task failed: {}", e)))??;
        Ok(ids)
    }

    pub async fn create_board(
        &self,
        streamer: &str,
        settings: &BoardSettings,
    ) -> Result<Board, ServiceError> {
        let board = Board::create(streamer, settings)?;
        let board = self
            .unlocked(move |store| {
                store.save_board(&board)?;
                Ok(board)
            })
            .await?;

        info!("Board {} created by {}", board.id, board.streamer);
        Ok(board)
    }

    pub async fn get_board(&self, board_id: Uuid) -> Result<Board, ServiceError> {
        self.unlocked(move |store| {
            store
                .load_board(board_id)?
                .ok_or(ServiceError::BoardNotFound(board_id))
        })
        .await
    }

    pub async fn update_board(
        &self,
        board_id: Uuid,
        caller: &str,
        settings: BoardSettings,
    ) -> Result<Board, ServiceError> {
        let caller = caller.to_string();
        self.mutate(board_id, move |store, board| {
            ensure_owner(board, &caller)?;
            board.apply_settings(&settings, Utc::now())?;
            store.save_board(board)?;
            Ok(board.clone())
        })
        .await
    }

    pub async fn delete_board(&self, board_id: Uuid, caller: &str) -> Result<(), ServiceError> {
        let caller = caller.to_string();
        self.mutate(board_id, move |store, board| {
            ensure_owner(board, &caller)?;
            if !store.delete_board(board.id)? {
                return Err(ServiceError::BoardNotFound(board.id));
            }
            Ok(())
        })
        .await?;

        self.locks.forget(board_id).await;
        info!("Board {} deleted", board_id);
        Ok(())
    }

    /// Add a viewer suggestion to the board's pending set.
    pub async fn submit_message(
        &self,
        board_id: Uuid,
        author: &str,
        body: &str,
    ) -> Result<Message, ServiceError> {
        let msg = Message::create(body, author, board_id)?;
        self.mutate(board_id, move |store, board| {
            board.add_message(msg.clone())?;
            store.save_message(&msg)?;
            debug!("Message {} submitted to board {}", msg.id, board.id);
            Ok(msg)
        })
        .await
    }

    /// A pending message of `board_id`.
    pub async fn get_message(
        &self,
        board_id: Uuid,
        message_id: Uuid,
    ) -> Result<Message, ServiceError> {
        self.unlocked(move |store| {
            store
                .load_message(message_id)?
                .filter(|m| m.board_id == board_id)
                .ok_or(ServiceError::Board(BoardError::MessageNotFound(message_id)))
        })
        .await
    }

    pub async fn upvote(&self, board_id: Uuid, message_id: Uuid) -> Result<Message, ServiceError> {
        self.vote(board_id, message_id, Vote::Up).await
    }

    pub async fn downvote(
        &self,
        board_id: Uuid,
        message_id: Uuid,
    ) -> Result<Message, ServiceError> {
        self.vote(board_id, message_id, Vote::Down).await
    }

    /// Remove and return the oldest announcement. Only the streamer may drain
    /// the queue. `None` when it is empty.
    pub async fn pop_announcement(
        &self,
        board_id: Uuid,
        caller: &str,
    ) -> Result<Option<Announcement>, ServiceError> {
        let caller = caller.to_string();
        self.mutate(board_id, move |store, board| {
            ensure_owner(board, &caller)?;
            let next = board.pop_announcement();
            if next.is_some() {
                board.touch(Utc::now());
                store.save_board(board)?;
            }
            Ok(next)
        })
        .await
    }

    /// Run one expire/promote pass over the current stored state of a board.
    /// Nothing is written when the pass changes nothing.
    pub async fn sweep_board(
        &self,
        board_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<SweepReport, ServiceError> {
        self.mutate(board_id, move |store, board| {
            let report = board.sweep(now);
            if !report.is_empty() {
                store.save_board(board)?;
            }
            Ok(report)
        })
        .await
    }

    async fn vote(
        &self,
        board_id: Uuid,
        message_id: Uuid,
        vote: Vote,
    ) -> Result<Message, ServiceError> {
        self.mutate(board_id, move |store, board| {
            let msg = match vote {
                Vote::Up => board.upvote_message(message_id)?,
                Vote::Down => board.downvote_message(message_id)?,
            }
            .clone();
            store.save_message(&msg)?;
            Ok(msg)
        })
        .await
    }

    /// Storage work that needs no board lock.
    async fn unlocked<T, F>(&self, f: F) -> Result<T, ServiceError>
    where
        F: FnOnce(&dyn BoardStore) -> Result<T, ServiceError> + Send + 'static,
        T: Send + 'static,
    {
        let deadline = Instant::now() + self.timeout;
        let store = self.store.clone();
        let task = tokio::task::spawn_blocking(move || f(store.as_ref()));
        join_by(deadline, task).await
    }

    /// Load, mutate and save one board under its lock.
    async fn mutate<T, F>(&self, board_id: Uuid, f: F) -> Result<T, ServiceError>
    where
        F: FnOnce(&dyn BoardStore, &mut Board) -> Result<T, ServiceError> + Send + 'static,
        T: Send + 'static,
    {
        let deadline = Instant::now() + self.timeout;
        let guard = tokio::time::timeout_at(deadline, self.locks.lock(board_id))
            .await
            .map_err(|_| ServiceError::Timeout)?;

        let store = self.store.clone();
        let task = tokio::task::spawn_blocking(move || -> Result<T, ServiceError> {
            let _guard = guard;
            let mut board = store
                .load_board(board_id)?
                .ok_or(ServiceError::BoardNotFound(board_id))?;
            f(store.as_ref(), &mut board)
        });

        let result = join_by(deadline, task).await;
        if let Err(ServiceError::BoardNotFound(_)) = result {
            // Unknown ids must not leave a lock behind.
            self.locks.forget(board_id).await;
        }
        result
    }
}

async fn join_by<T>(
    deadline: Instant,
    task: JoinHandle<Result<T, ServiceError>>,
) -> Result<T, ServiceError> {
    match tokio::time::timeout_at(deadline, task).await {
        Err(_) => Err(ServiceError::Timeout),
        Ok(Err(e)) => Err(ServiceError::Internal(format!("blocking task failed: {}", e))),
        Ok(Ok(result)) => result,
    }
}

fn ensure_owner(board: &Board, caller: &str) -> Result<(), ServiceError> {
    if board.is_owned_by(caller) {
        Ok(())
    } else {
        Err(ServiceError::Forbidden)
    }
}
