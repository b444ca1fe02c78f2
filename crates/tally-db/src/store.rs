//! The persistence port consumed by the board service and sweep scheduler,
//! and its SQLite implementation.

use std::collections::HashMap;

use anyhow::{Context, Result, anyhow};
use chrono::{DateTime, Utc};
use uuid::Uuid;

use tally_types::{Announcement, Board, Message};

use crate::Database;
use crate::models::{AnnouncementRow, BoardRow, MessageRow};
use crate::queries::{
    BoardFilter, delete_board_row, query_announcement_rows, query_board_ids, query_board_rows,
    query_message_row, query_message_rows, replace_announcements, replace_messages,
    upsert_board_row, upsert_message_row,
};

/// Storage for boards and their messages.
///
/// Calls block; async callers run them on `tokio::task::spawn_blocking`.
pub trait BoardStore: Send + Sync {
    fn load_all_boards(&self) -> Result<Vec<Board>>;

    /// Ids only, oldest board first. Cheap enough to run every sweep tick.
    fn load_board_ids(&self) -> Result<Vec<Uuid>>;

    fn load_boards_by_streamer(&self, streamer: &str) -> Result<Vec<Board>>;

    fn load_board(&self, id: Uuid) -> Result<Option<Board>>;

    /// Idempotent upsert of the whole aggregate: board row, pending set and
    /// announcement queue are stored exactly as given.
    fn save_board(&self, board: &Board) -> Result<()>;

    /// Returns false if no such board existed. Owned messages go with it.
    fn delete_board(&self, id: Uuid) -> Result<bool>;

    fn load_message(&self, id: Uuid) -> Result<Option<Message>>;

    /// Upsert a single pending message without touching the rest of its board.
    fn save_message(&self, msg: &Message) -> Result<()>;
}

impl BoardStore for Database {
    fn load_all_boards(&self) -> Result<Vec<Board>> {
        self.with_conn(|conn| load_boards(conn, BoardFilter::All))
    }

    fn load_board_ids(&self) -> Result<Vec<Uuid>> {
        self.with_conn(query_board_ids)?
            .iter()
            .map(|id| parse_uuid(id, "board id"))
            .collect()
    }

    fn load_boards_by_streamer(&self, streamer: &str) -> Result<Vec<Board>> {
        self.with_conn(|conn| load_boards(conn, BoardFilter::Streamer(streamer)))
    }

    fn load_board(&self, id: Uuid) -> Result<Option<Board>> {
        let id = id.to_string();
        let mut boards = self.with_conn(|conn| load_boards(conn, BoardFilter::Id(&id)))?;
        Ok(boards.pop())
    }

    fn save_board(&self, board: &Board) -> Result<()> {
        let board_id = board.id.to_string();
        let board_row = board_to_row(board);
        let message_rows: Vec<MessageRow> = board.pending().values().map(message_to_row).collect();
        let announcement_rows: Vec<AnnouncementRow> = board
            .queue()
            .iter()
            .map(|a| announcement_to_row(&board_id, a))
            .collect();

        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            upsert_board_row(&tx, &board_row)?;
            replace_messages(&tx, &board_id, &message_rows)?;
            replace_announcements(&tx, &board_id, &announcement_rows)?;
            tx.commit()?;
            Ok(())
        })
    }

    fn delete_board(&self, id: Uuid) -> Result<bool> {
        let id = id.to_string();
        self.with_conn(|conn| delete_board_row(conn, &id))
    }

    fn load_message(&self, id: Uuid) -> Result<Option<Message>> {
        let id = id.to_string();
        self.with_conn(|conn| query_message_row(conn, &id))?
            .map(message_from_row)
            .transpose()
    }

    fn save_message(&self, msg: &Message) -> Result<()> {
        let row = message_to_row(msg);
        self.with_conn(|conn| upsert_message_row(conn, &row))
    }
}

/// Load boards plus their children with one query per table.
fn load_boards(conn: &rusqlite::Connection, filter: BoardFilter<'_>) -> Result<Vec<Board>> {
    let board_rows = query_board_rows(conn, filter)?;

    let mut messages: HashMap<String, Vec<Message>> = HashMap::new();
    for row in query_message_rows(conn, filter)? {
        let board_id = row.board_id.clone();
        messages.entry(board_id).or_default().push(message_from_row(row)?);
    }

    let mut queues: HashMap<String, Vec<Announcement>> = HashMap::new();
    for row in query_announcement_rows(conn, filter)? {
        let board_id = row.board_id.clone();
        queues.entry(board_id).or_default().push(announcement_from_row(row)?);
    }

    board_rows
        .into_iter()
        .map(|row| {
            let msgs = messages.remove(&row.id).unwrap_or_default();
            let queue = queues.remove(&row.id).unwrap_or_default();
            board_from_row(row, msgs, queue)
        })
        .collect()
}

// -- Row conversions --

fn parse_uuid(value: &str, what: &str) -> Result<Uuid> {
    value
        .parse()
        .with_context(|| format!("Corrupt {} '{}'", what, value))
}

fn from_millis(ms: i64) -> Result<DateTime<Utc>> {
    DateTime::from_timestamp_millis(ms).ok_or_else(|| anyhow!("Timestamp out of range: {}", ms))
}

fn to_u32(value: i64, what: &str) -> Result<u32> {
    u32::try_from(value).with_context(|| format!("Corrupt {} {}", what, value))
}

fn board_from_row(row: BoardRow, messages: Vec<Message>, queue: Vec<Announcement>) -> Result<Board> {
    let id = parse_uuid(&row.id, "board id")?;
    Board::restore(
        id,
        row.streamer,
        row.title,
        to_u32(row.count_threshold, "count_threshold")?,
        to_u32(row.time_threshold, "time_threshold")?,
        to_u32(row.max_messages, "max_messages")?,
        from_millis(row.created_at)?,
        from_millis(row.updated_at)?,
        messages,
        queue,
    )
    .with_context(|| format!("Corrupt board {}", id))
}

fn board_to_row(board: &Board) -> BoardRow {
    BoardRow {
        id: board.id.to_string(),
        streamer: board.streamer.clone(),
        title: board.title.clone(),
        count_threshold: i64::from(board.count_threshold),
        time_threshold: i64::from(board.time_threshold),
        max_messages: i64::from(board.max_messages),
        created_at: board.created_at.timestamp_millis(),
        updated_at: board.updated_at.timestamp_millis(),
    }
}

fn message_from_row(row: MessageRow) -> Result<Message> {
    Ok(Message {
        id: parse_uuid(&row.id, "message id")?,
        board_id: parse_uuid(&row.board_id, "board_id")?,
        author: row.author,
        body: row.body,
        votes: row.votes,
        created_at: from_millis(row.created_at)?,
    })
}

fn message_to_row(msg: &Message) -> MessageRow {
    MessageRow {
        id: msg.id.to_string(),
        board_id: msg.board_id.to_string(),
        body: msg.body.clone(),
        author: msg.author.clone(),
        votes: msg.votes,
        created_at: msg.created_at.timestamp_millis(),
    }
}

fn announcement_from_row(row: AnnouncementRow) -> Result<Announcement> {
    Ok(Announcement {
        message_id: parse_uuid(&row.message_id, "announcement message_id")?,
        author: row.author,
        body: row.body,
        promoted_at: from_millis(row.promoted_at)?,
    })
}

fn announcement_to_row(board_id: &str, a: &Announcement) -> AnnouncementRow {
    AnnouncementRow {
        board_id: board_id.to_string(),
        message_id: a.message_id.to_string(),
        author: a.author.clone(),
        body: a.body.clone(),
        promoted_at: a.promoted_at.timestamp_millis(),
    }
}
