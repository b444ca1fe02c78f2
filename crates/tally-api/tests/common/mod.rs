#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Result, anyhow};
use uuid::Uuid;

use tally_api::BoardService;
use tally_db::{BoardStore, Database};
use tally_types::{Board, BoardSettings, Message};

pub const TEST_TIMEOUT: Duration = Duration::from_secs(5);

pub fn memory_db() -> Arc<Database> {
    Arc::new(Database::open_in_memory().unwrap())
}

pub fn service(store: Arc<dyn BoardStore>) -> BoardService {
    BoardService::new(store, TEST_TIMEOUT)
}

pub fn impatient_service(store: Arc<dyn BoardStore>, timeout: Duration) -> BoardService {
    BoardService::new(store, timeout)
}

pub fn settings(count_threshold: i64, time_threshold: i64, max_messages: i64) -> BoardSettings {
    BoardSettings {
        title: "Ask me anything".to_string(),
        count_threshold,
        time_threshold,
        max_messages,
    }
}

/// Delegates to a real database but fails every save of one board.
pub struct FailingStore {
    pub inner: Arc<Database>,
    pub broken: Uuid,
}

impl BoardStore for FailingStore {
    fn load_all_boards(&self) -> Result<Vec<Board>> {
        self.inner.load_all_boards()
    }

    fn load_board_ids(&self) -> Result<Vec<Uuid>> {
        self.inner.load_board_ids()
    }

    fn load_boards_by_streamer(&self, streamer: &str) -> Result<Vec<Board>> {
        self.inner.load_boards_by_streamer(streamer)
    }

    fn load_board(&self, id: Uuid) -> Result<Option<Board>> {
        self.inner.load_board(id)
    }

    fn save_board(&self, board: &Board) -> Result<()> {
        if board.id == self.broken {
            return Err(anyhow!("disk full"));
        }
        self.inner.save_board(board)
    }

    fn delete_board(&self, id: Uuid) -> Result<bool> {
        self.inner.delete_board(id)
    }

    fn load_message(&self, id: Uuid) -> Result<Option<Message>> {
        self.inner.load_message(id)
    }

    fn save_message(&self, msg: &Message) -> Result<()> {
        self.inner.save_message(msg)
    }
}

/// Delegates to a real database but stalls every load of one board.
pub struct HangingStore {
    pub inner: Arc<Database>,
    pub stuck: Uuid,
    pub stall: Duration,
}

impl BoardStore for HangingStore {
    fn load_all_boards(&self) -> Result<Vec<Board>> {
        self.inner.load_all_boards()
    }

    fn load_board_ids(&self) -> Result<Vec<Uuid>> {
        self.inner.load_board_ids()
    }

    fn load_boards_by_streamer(&self, streamer: &str) -> Result<Vec<Board>> {
        self.inner.load_boards_by_streamer(streamer)
    }

    fn load_board(&self, id: Uuid) -> Result<Option<Board>> {
        if id == self.stuck {
            std::thread::sleep(self.stall);
        }
        self.inner.load_board(id)
    }

    fn save_board(&self, board: &Board) -> Result<()> {
        self.inner.save_board(board)
    }

    fn delete_board(&self, id: Uuid) -> Result<bool> {
        self.inner.delete_board(id)
    }

    fn load_message(&self, id: Uuid) -> Result<Option<Message>> {
        self.inner.load_message(id)
    }

    fn save_message(&self, msg: &Message) -> Result<()> {
        self.inner.save_message(msg)
    }
}

/// Delegates to a real database but makes the board listing slow, or fail.
pub struct ListingStore {
    pub inner: Arc<Database>,
    pub stall: Duration,
    pub fail: bool,
}

impl BoardStore for ListingStore {
    fn load_all_boards(&self) -> Result<Vec<Board>> {
        std::thread::sleep(self.stall);
        self.inner.load_all_boards()
    }

    fn load_board_ids(&self) -> Result<Vec<Uuid>> {
        std::thread::sleep(self.stall);
        if self.fail {
            return Err(anyhow!("database is locked"));
        }
        self.inner.load_board_ids()
    }

    fn load_boards_by_streamer(&self, streamer: &str) -> Result<Vec<Board>> {
        self.inner.load_boards_by_streamer(streamer)
    }

    fn load_board(&self, id: Uuid) -> Result<Option<Board>> {
        self.inner.load_board(id)
    }

    fn save_board(&self, board: &Board) -> Result<()> {
        self.inner.save_board(board)
    }

    fn delete_board(&self, id: Uuid) -> Result<bool> {
        self.inner.delete_board(id)
    }

    fn load_message(&self, id: Uuid) -> Result<Option<Message>> {
        self.inner.load_message(id)
    }

    fn save_message(&self, msg: &Message) -> Result<()> {
        self.inner.save_message(msg)
    }
}
