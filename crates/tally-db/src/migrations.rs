use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch("CREATE TABLE IF NOT EXISTS schema_version (version INTEGER NOT NULL);")?;

    let version: i64 = conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_version",
        [],
        |r| r.get(0),
    )?;

    if version < 1 {
        info!("Running migration v1 (initial schema)");
        // Timestamps are epoch milliseconds (UTC).
        conn.execute_batch(
            "
            CREATE TABLE users (
                id          TEXT PRIMARY KEY,
                username    TEXT NOT NULL UNIQUE,
                password    TEXT NOT NULL,
                created_at  INTEGER NOT NULL
            );

            CREATE TABLE boards (
                id              TEXT PRIMARY KEY,
                streamer        TEXT NOT NULL,
                title           TEXT NOT NULL,
                count_threshold INTEGER NOT NULL CHECK (count_threshold >= 0),
                time_threshold  INTEGER NOT NULL CHECK (time_threshold >= 0),
                max_messages    INTEGER NOT NULL CHECK (max_messages >= 0),
                created_at      INTEGER NOT NULL,
                updated_at      INTEGER NOT NULL
            );

            CREATE INDEX idx_boards_streamer ON boards(streamer);

            CREATE TABLE messages (
                id          TEXT PRIMARY KEY,
                board_id    TEXT NOT NULL REFERENCES boards(id) ON DELETE CASCADE,
                body        TEXT NOT NULL,
                author      TEXT NOT NULL,
                votes       INTEGER NOT NULL DEFAULT 0,
                created_at  INTEGER NOT NULL
            );

            CREATE INDEX idx_messages_board ON messages(board_id, created_at);

            CREATE TABLE announcements (
                board_id    TEXT NOT NULL REFERENCES boards(id) ON DELETE CASCADE,
                position    INTEGER NOT NULL,
                message_id  TEXT NOT NULL,
                author      TEXT NOT NULL,
                body        TEXT NOT NULL,
                promoted_at INTEGER NOT NULL,
                PRIMARY KEY (board_id, position)
            );

            INSERT INTO schema_version (version) VALUES (1);
            ",
        )?;
    }

    info!("Database migrations complete");
    Ok(())
}
