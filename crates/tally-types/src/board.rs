use std::collections::{HashMap, VecDeque};

use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::BoardError;
use crate::message::Message;

/// Longest accepted board title, in characters.
pub const MAX_TITLE_CHARS: usize = 100;

/// Streamer-editable policy of a board, as submitted by a client.
///
/// Numbers arrive signed so that negative input is reported as a validation
/// error rather than a deserialization failure.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BoardSettings {
    pub title: String,
    pub count_threshold: i64,
    pub time_threshold: i64,
    pub max_messages: i64,
}

struct ValidSettings {
    title: String,
    count_threshold: u32,
    time_threshold: u32,
    max_messages: u32,
}

impl BoardSettings {
    fn validate(&self) -> Result<ValidSettings, BoardError> {
        let title = self.title.trim();
        if title.is_empty() {
            return Err(BoardError::validation("title must not be blank"));
        }
        if title.chars().count() > MAX_TITLE_CHARS {
            return Err(BoardError::validation(format!(
                "title must be at most {} characters",
                MAX_TITLE_CHARS
            )));
        }

        Ok(ValidSettings {
            title: title.to_string(),
            count_threshold: non_negative("count_threshold", self.count_threshold)?,
            time_threshold: non_negative("time_threshold", self.time_threshold)?,
            max_messages: non_negative("max_messages", self.max_messages)?,
        })
    }
}

fn non_negative(field: &str, value: i64) -> Result<u32, BoardError> {
    if value < 0 {
        return Err(BoardError::validation(format!("{} must be >= 0", field)));
    }
    u32::try_from(value)
        .map_err(|_| BoardError::validation(format!("{} must be at most {}", field, u32::MAX)))
}

/// A promoted message waiting to be read out by the streamer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Announcement {
    pub message_id: Uuid,
    pub author: String,
    pub body: String,
    pub promoted_at: DateTime<Utc>,
}

impl Announcement {
    fn promote(msg: Message, now: DateTime<Utc>) -> Self {
        Self {
            message_id: msg.id,
            author: msg.author,
            body: msg.body,
            promoted_at: now,
        }
    }
}

/// Outcome of one sweep pass over a board.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub expired: Vec<Uuid>,
    /// In the order the announcements were appended to the queue.
    pub promoted: Vec<Uuid>,
}

impl SweepReport {
    /// True when the pass changed nothing.
    pub fn is_empty(&self) -> bool {
        self.expired.is_empty() && self.promoted.is_empty()
    }
}

/// A streamer's moderation queue: a bounded pending set plus a FIFO of
/// promoted announcements.
///
/// The collections are private; every change goes through the methods below
/// so that capacity, ownership and pending/queue exclusivity always hold.
#[derive(Debug, Clone)]
pub struct Board {
    pub id: Uuid,
    pub streamer: String,
    pub title: String,
    pub count_threshold: u32,
    /// Seconds a message may stay pending before it expires.
    pub time_threshold: u32,
    pub max_messages: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pending: HashMap<Uuid, Message>,
    queue: VecDeque<Announcement>,
}

impl Board {
    pub fn create(streamer: &str, settings: &BoardSettings) -> Result<Self, BoardError> {
        let valid = settings.validate()?;
        let now = Utc::now().trunc_subsecs(3);

        Ok(Self {
            id: Uuid::new_v4(),
            streamer: streamer.to_string(),
            title: valid.title,
            count_threshold: valid.count_threshold,
            time_threshold: valid.time_threshold,
            max_messages: valid.max_messages,
            created_at: now,
            updated_at: now,
            pending: HashMap::new(),
            queue: VecDeque::new(),
        })
    }

    /// Rebuild a board from storage.
    ///
    /// A message owned by another board, or an announcement whose message is
    /// still pending, means storage is inconsistent and the load fails. A
    /// pending set over `max_messages` is kept as is; new submissions are
    /// refused until the sweep drains it.
    #[allow(clippy::too_many_arguments)]
    pub fn restore(
        id: Uuid,
        streamer: String,
        title: String,
        count_threshold: u32,
        time_threshold: u32,
        max_messages: u32,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
        messages: Vec<Message>,
        queue: Vec<Announcement>,
    ) -> Result<Self, BoardError> {
        let mut pending = HashMap::with_capacity(messages.len());
        for msg in messages {
            if msg.board_id != id {
                return Err(BoardError::validation(format!(
                    "message {} belongs to board {}, not {}",
                    msg.id, msg.board_id, id
                )));
            }
            if pending.insert(msg.id, msg).is_some() {
                return Err(BoardError::validation(format!(
                    "board {} lists a pending message twice",
                    id
                )));
            }
        }
        if pending.len() > max_messages as usize {
            warn!(
                "Board {} holds {} pending messages, above its limit of {}",
                id,
                pending.len(),
                max_messages
            );
        }

        if let Some(a) = queue.iter().find(|a| pending.contains_key(&a.message_id)) {
            return Err(BoardError::validation(format!(
                "message {} is both pending and queued on board {}",
                a.message_id, id
            )));
        }

        Ok(Self {
            id,
            streamer,
            title,
            count_threshold,
            time_threshold,
            max_messages,
            created_at,
            updated_at,
            pending,
            queue: queue.into(),
        })
    }

    pub fn pending(&self) -> &HashMap<Uuid, Message> {
        &self.pending
    }

    pub fn message(&self, id: Uuid) -> Option<&Message> {
        self.pending.get(&id)
    }

    /// Pending messages oldest-first.
    pub fn pending_sorted(&self) -> Vec<&Message> {
        let mut msgs: Vec<&Message> = self.pending.values().collect();
        msgs.sort_by_key(|m| (m.created_at, m.id));
        msgs
    }

    pub fn queue(&self) -> &VecDeque<Announcement> {
        &self.queue
    }

    pub fn is_owned_by(&self, identity: &str) -> bool {
        self.streamer == identity
    }

    pub fn touch(&mut self, now: DateTime<Utc>) {
        self.updated_at = now;
    }

    /// Replace title, thresholds and capacity.
    pub fn apply_settings(
        &mut self,
        settings: &BoardSettings,
        now: DateTime<Utc>,
    ) -> Result<(), BoardError> {
        let valid = settings.validate()?;
        if (valid.max_messages as usize) < self.pending.len() {
            return Err(BoardError::validation(format!(
                "max_messages {} is below the {} messages already pending",
                valid.max_messages,
                self.pending.len()
            )));
        }

        self.title = valid.title;
        self.count_threshold = valid.count_threshold;
        self.time_threshold = valid.time_threshold;
        self.max_messages = valid.max_messages;
        self.updated_at = now;
        Ok(())
    }

    /// Accept `msg` into the pending set.
    pub fn add_message(&mut self, msg: Message) -> Result<(), BoardError> {
        if msg.board_id != self.id {
            return Err(BoardError::validation(format!(
                "message {} belongs to board {}",
                msg.id, msg.board_id
            )));
        }
        if self.pending.contains_key(&msg.id) || self.queue.iter().any(|a| a.message_id == msg.id) {
            return Err(BoardError::DuplicateMessage(msg.id));
        }
        if self.pending.len() >= self.max_messages as usize {
            return Err(BoardError::CapacityExceeded {
                max: self.max_messages,
            });
        }

        self.pending.insert(msg.id, msg);
        Ok(())
    }

    pub fn upvote_message(&mut self, id: Uuid) -> Result<&Message, BoardError> {
        let msg = self.pending.get_mut(&id).ok_or(BoardError::MessageNotFound(id))?;
        msg.upvote();
        Ok(msg)
    }

    pub fn downvote_message(&mut self, id: Uuid) -> Result<&Message, BoardError> {
        let msg = self.pending.get_mut(&id).ok_or(BoardError::MessageNotFound(id))?;
        msg.downvote();
        Ok(msg)
    }

    /// Take the oldest promoted announcement, if any.
    pub fn pop_announcement(&mut self) -> Option<Announcement> {
        self.queue.pop_front()
    }

    /// Expire aged-out messages and promote those over the vote threshold.
    ///
    /// Age is checked before votes, so a message that is both too old and
    /// popular enough expires. Decisions are taken over a snapshot of the
    /// pending set and applied afterwards; promotions are appended in
    /// `(created_at, id)` order.
    pub fn sweep(&mut self, now: DateTime<Utc>) -> SweepReport {
        let max_age = i64::from(self.time_threshold);
        let min_votes = i64::from(self.count_threshold);

        let mut report = SweepReport::default();
        let mut to_promote = Vec::new();
        for msg in self.pending.values() {
            if msg.age_secs(now) > max_age {
                report.expired.push(msg.id);
            } else if msg.votes > min_votes {
                to_promote.push((msg.created_at, msg.id));
            }
        }
        to_promote.sort();

        for id in &report.expired {
            if let Some(msg) = self.pending.remove(id) {
                debug!("Board {}: message {} expired after {}s", self.id, id, msg.age_secs(now));
            }
        }

        for (_, id) in to_promote {
            if let Some(msg) = self.pending.remove(&id) {
                debug!("Board {}: message {} promoted with {} votes", self.id, id, msg.votes);
                self.queue.push_back(Announcement::promote(msg, now));
                report.promoted.push(id);
            }
        }

        if !report.is_empty() {
            self.updated_at = now;
        }
        report
    }
}
