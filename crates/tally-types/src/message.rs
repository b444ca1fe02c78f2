use std::hash::{Hash, Hasher};

use chrono::{DateTime, Duration, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::BoardError;

/// Longest accepted message body, in characters.
pub const MAX_BODY_CHARS: usize = 500;

/// A viewer suggestion sitting in a board's pending set.
///
/// Equality and hashing look at `(author, body)` only: two submissions of the
/// same text by the same viewer compare equal even though their ids differ.
/// Identity is always `id`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub id: Uuid,
    pub board_id: Uuid,
    pub author: String,
    pub body: String,
    pub votes: i64,
    pub created_at: DateTime<Utc>,
}

impl Message {
    /// Stamp a new message for `board_id`, created now (millisecond precision,
    /// matching what storage keeps).
    pub fn create(body: &str, author: &str, board_id: Uuid) -> Result<Self, BoardError> {
        Self::create_at(body, author, board_id, Utc::now().trunc_subsecs(3))
    }

    pub fn create_at(
        body: &str,
        author: &str,
        board_id: Uuid,
        created_at: DateTime<Utc>,
    ) -> Result<Self, BoardError> {
        let trimmed = body.trim();
        if trimmed.is_empty() {
            return Err(BoardError::validation("message body must not be blank"));
        }
        if trimmed.chars().count() > MAX_BODY_CHARS {
            return Err(BoardError::validation(format!(
                "message body must be at most {} characters",
                MAX_BODY_CHARS
            )));
        }

        Ok(Self {
            id: Uuid::new_v4(),
            board_id,
            author: author.to_string(),
            body: body.to_string(),
            votes: 0,
            created_at,
        })
    }

    pub fn upvote(&mut self) {
        self.votes = self.votes.saturating_add(1);
    }

    pub fn downvote(&mut self) {
        self.votes = self.votes.saturating_sub(1);
    }

    /// Time elapsed since creation. Negative if `now` is before `created_at`.
    pub fn age(&self, now: DateTime<Utc>) -> Duration {
        now.signed_duration_since(self.created_at)
    }

    /// Whole seconds elapsed since creation (truncated toward zero).
    pub fn age_secs(&self, now: DateTime<Utc>) -> i64 {
        self.age(now).num_seconds()
    }
}

impl PartialEq for Message {
    fn eq(&self, other: &Self) -> bool {
        self.author == other.author && self.body == other.body
    }
}

impl Eq for Message {}

impl Hash for Message {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.author.hash(state);
        self.body.hash(state);
    }
}
