use crate::Database;
use crate::models::{AnnouncementRow, BoardRow, MessageRow, UserRow};
use anyhow::Result;
use rusqlite::{Connection, OptionalExtension, params, params_from_iter};

impl Database {
    // -- Users --

    /// Insert a user. Returns false when the username is already taken,
    /// including when a concurrent insert wins the race.
    pub fn create_user(
        &self,
        id: &str,
        username: &str,
        password_hash: &str,
        created_at: i64,
    ) -> Result<bool> {
        self.with_conn(|conn| {
            let inserted = conn.execute(
                "INSERT INTO users (id, username, password, created_at) VALUES (?1, ?2, ?3, ?4)",
                params![id, username, password_hash, created_at],
            );
            match inserted {
                Ok(_) => Ok(true),
                Err(rusqlite::Error::SqliteFailure(e, _))
                    if e.code == rusqlite::ErrorCode::ConstraintViolation =>
                {
                    Ok(false)
                }
                Err(e) => Err(e.into()),
            }
        })
    }

    pub fn get_user_by_username(&self, username: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user_by_username(conn, username))
    }
}

fn query_user_by_username(conn: &Connection, username: &str) -> Result<Option<UserRow>> {
    let mut stmt =
        conn.prepare("SELECT id, username, password, created_at FROM users WHERE username = ?1")?;

    let row = stmt
        .query_row([username], |row| {
            Ok(UserRow {
                id: row.get(0)?,
                username: row.get(1)?,
                password: row.get(2)?,
                created_at: row.get(3)?,
            })
        })
        .optional()?;

    Ok(row)
}

// -- Boards --

/// Which boards (and their children) a read covers.
#[derive(Debug, Clone, Copy)]
pub(crate) enum BoardFilter<'a> {
    All,
    Id(&'a str),
    Streamer(&'a str),
}

impl BoardFilter<'_> {
    fn board_clause(&self) -> &'static str {
        match self {
            Self::All => "1 = 1",
            Self::Id(_) => "id = ?1",
            Self::Streamer(_) => "streamer = ?1",
        }
    }

    fn child_clause(&self) -> &'static str {
        match self {
            Self::All => "1 = 1",
            Self::Id(_) => "board_id = ?1",
            Self::Streamer(_) => "board_id IN (SELECT id FROM boards WHERE streamer = ?1)",
        }
    }

    fn param(&self) -> Option<&str> {
        match self {
            Self::All => None,
            Self::Id(v) | Self::Streamer(v) => Some(*v),
        }
    }
}

pub(crate) fn query_board_rows(conn: &Connection, filter: BoardFilter<'_>) -> Result<Vec<BoardRow>> {
    let sql = format!(
        "SELECT id, streamer, title, count_threshold, time_threshold, max_messages, created_at, updated_at
         FROM boards
         WHERE {}
         ORDER BY created_at, id",
        filter.board_clause()
    );

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map(params_from_iter(filter.param()), |row| {
            Ok(BoardRow {
                id: row.get(0)?,
                streamer: row.get(1)?,
                title: row.get(2)?,
                count_threshold: row.get(3)?,
                time_threshold: row.get(4)?,
                max_messages: row.get(5)?,
                created_at: row.get(6)?,
                updated_at: row.get(7)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(rows)
}

pub(crate) fn query_board_ids(conn: &Connection) -> Result<Vec<String>> {
    let mut stmt = conn.prepare("SELECT id FROM boards ORDER BY created_at, id")?;
    let ids = stmt
        .query_map([], |row| row.get::<_, String>(0))?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(ids)
}

pub(crate) fn query_message_rows(conn: &Connection, filter: BoardFilter<'_>) -> Result<Vec<MessageRow>> {
    let sql = format!(
        "SELECT id, board_id, body, author, votes, created_at
         FROM messages
         WHERE {}
         ORDER BY created_at, id",
        filter.child_clause()
    );

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map(params_from_iter(filter.param()), message_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(rows)
}

pub(crate) fn query_announcement_rows(
    conn: &Connection,
    filter: BoardFilter<'_>,
) -> Result<Vec<AnnouncementRow>> {
    let sql = format!(
        "SELECT board_id, message_id, author, body, promoted_at
         FROM announcements
         WHERE {}
         ORDER BY board_id, position",
        filter.child_clause()
    );

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map(params_from_iter(filter.param()), |row| {
            Ok(AnnouncementRow {
                board_id: row.get(0)?,
                message_id: row.get(1)?,
                author: row.get(2)?,
                body: row.get(3)?,
                promoted_at: row.get(4)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(rows)
}

pub(crate) fn query_message_row(conn: &Connection, id: &str) -> Result<Option<MessageRow>> {
    let row = conn
        .query_row(
            "SELECT id, board_id, body, author, votes, created_at FROM messages WHERE id = ?1",
            [id],
            message_row,
        )
        .optional()?;

    Ok(row)
}

fn message_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<MessageRow> {
    Ok(MessageRow {
        id: row.get(0)?,
        board_id: row.get(1)?,
        body: row.get(2)?,
        author: row.get(3)?,
        votes: row.get(4)?,
        created_at: row.get(5)?,
    })
}

// -- Writes (callers pass a transaction where atomicity matters) --

pub(crate) fn upsert_board_row(conn: &Connection, row: &BoardRow) -> Result<()> {
    conn.execute(
        "INSERT INTO boards (id, streamer, title, count_threshold, time_threshold, max_messages, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
         ON CONFLICT(id) DO UPDATE SET
            streamer = excluded.streamer,
            title = excluded.title,
            count_threshold = excluded.count_threshold,
            time_threshold = excluded.time_threshold,
            max_messages = excluded.max_messages,
            updated_at = excluded.updated_at",
        params![
            row.id,
            row.streamer,
            row.title,
            row.count_threshold,
            row.time_threshold,
            row.max_messages,
            row.created_at,
            row.updated_at,
        ],
    )?;
    Ok(())
}

/// Make the stored pending set of `board_id` exactly `rows`.
pub(crate) fn replace_messages(conn: &Connection, board_id: &str, rows: &[MessageRow]) -> Result<()> {
    conn.execute("DELETE FROM messages WHERE board_id = ?1", [board_id])?;
    for row in rows {
        upsert_message_row(conn, row)?;
    }
    Ok(())
}

/// Make the stored queue of `board_id` exactly `rows`, in order.
pub(crate) fn replace_announcements(
    conn: &Connection,
    board_id: &str,
    rows: &[AnnouncementRow],
) -> Result<()> {
    conn.execute("DELETE FROM announcements WHERE board_id = ?1", [board_id])?;
    let mut stmt = conn.prepare(
        "INSERT INTO announcements (board_id, position, message_id, author, body, promoted_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
    )?;
    for (position, row) in rows.iter().enumerate() {
        stmt.execute(params![
            board_id,
            position as i64,
            row.message_id,
            row.author,
            row.body,
            row.promoted_at,
        ])?;
    }
    Ok(())
}

pub(crate) fn upsert_message_row(conn: &Connection, row: &MessageRow) -> Result<()> {
    conn.execute(
        "INSERT INTO messages (id, board_id, body, author, votes, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)
         ON CONFLICT(id) DO UPDATE SET
            body = excluded.body,
            author = excluded.author,
            votes = excluded.votes",
        params![row.id, row.board_id, row.body, row.author, row.votes, row.created_at],
    )?;
    Ok(())
}

pub(crate) fn delete_board_row(conn: &Connection, id: &str) -> Result<bool> {
    let deleted = conn.execute("DELETE FROM boards WHERE id = ?1", [id])?;
    Ok(deleted > 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn users_round_trip_by_username() {
        let db = Database::open_in_memory().unwrap();
        assert!(db.create_user("u1", "alice", "hash", 1_700_000_000_000).unwrap());

        let user = db.get_user_by_username("alice").unwrap().unwrap();
        assert_eq!(user.id, "u1");
        assert_eq!(user.password, "hash");
        assert!(db.get_user_by_username("bob").unwrap().is_none());

        // usernames are unique; a second insert reports the name as taken
        assert!(!db.create_user("u2", "alice", "other", 0).unwrap());
        assert_eq!(db.get_user_by_username("alice").unwrap().unwrap().id, "u1");
    }

    #[test]
    fn message_rows_require_an_existing_board() {
        let db = Database::open_in_memory().unwrap();
        let orphan = MessageRow {
            id: "m1".into(),
            board_id: "missing".into(),
            body: "hello".into(),
            author: "alice".into(),
            votes: 0,
            created_at: 0,
        };
        assert!(db.with_conn(|conn| upsert_message_row(conn, &orphan)).is_err());
    }
}
