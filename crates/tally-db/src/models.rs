/// Database row types; these map directly to SQLite rows.
/// Conversion into tally-types entities happens in `store`.

pub struct UserRow {
    pub id: String,
    pub username: String,
    pub password: String,
    pub created_at: i64,
}

pub struct BoardRow {
    pub id: String,
    pub streamer: String,
    pub title: String,
    pub count_threshold: i64,
    pub time_threshold: i64,
    pub max_messages: i64,
    pub created_at: i64,
    pub updated_at: i64,
}

pub struct MessageRow {
    pub id: String,
    pub board_id: String,
    pub body: String,
    pub author: String,
    pub votes: i64,
    pub created_at: i64,
}

pub struct AnnouncementRow {
    pub board_id: String,
    pub message_id: String,
    pub author: String,
    pub body: String,
    pub promoted_at: i64,
}
