use thiserror::Error;
use uuid::Uuid;

/// Rejections raised by board and message rules.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BoardError {
    /// Malformed input (blank title, negative threshold, blank body, ...)
    #[error("validation error: {0}")]
    Validation(String),

    /// The message is not in the pending set (expired, promoted, or never existed)
    #[error("message {0} is not pending on this board")]
    MessageNotFound(Uuid),

    #[error("board is full ({max} pending messages)")]
    CapacityExceeded { max: u32 },

    #[error("message {0} is already on this board")]
    DuplicateMessage(Uuid),
}

impl BoardError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }
}
