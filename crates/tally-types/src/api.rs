use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::board::{Announcement, Board};
use crate::message::Message;

// -- JWT Claims --

/// Bearer-token claims. `username` is the caller identity used as board
/// owner and message author.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub username: String,
    pub exp: usize,
}

// -- Auth --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RegisterResponse {
    pub user_id: Uuid,
    pub token: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    pub user_id: Uuid,
    pub username: String,
    pub token: String,
}

// -- Messages --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SubmitMessageRequest {
    pub body: String,
}

// -- Boards --

#[derive(Debug, Serialize, Deserialize)]
pub struct BoardResponse {
    pub id: Uuid,
    pub streamer: String,
    pub title: String,
    pub count_threshold: u32,
    pub time_threshold: u32,
    pub max_messages: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Pending messages, oldest first.
    pub messages: Vec<Message>,
    /// Announcement queue, head first.
    pub queue: Vec<Announcement>,
}

impl From<&Board> for BoardResponse {
    fn from(board: &Board) -> Self {
        Self {
            id: board.id,
            streamer: board.streamer.clone(),
            title: board.title.clone(),
            count_threshold: board.count_threshold,
            time_threshold: board.time_threshold,
            max_messages: board.max_messages,
            created_at: board.created_at,
            updated_at: board.updated_at,
            messages: board.pending_sorted().into_iter().cloned().collect(),
            queue: board.queue().iter().cloned().collect(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}
