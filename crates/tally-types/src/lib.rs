//! Domain types for tally: boards, messages, the promotion engine that moves
//! messages from a board's pending set into its announcement queue, and the
//! request/response shapes shared with the HTTP layer.

pub mod api;
pub mod board;
pub mod error;
pub mod message;

pub use board::{Announcement, Board, BoardSettings, SweepReport};
pub use error::BoardError;
pub use message::Message;
