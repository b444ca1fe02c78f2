//! HTTP surface and board service for Tally.
//!
//! `BoardService` owns the per-board locking policy; `SweepScheduler` drives
//! expiry and promotion in the background; handlers translate HTTP to
//! service calls.

pub mod auth;
pub mod boards;
pub mod error;
pub mod locks;
pub mod messages;
pub mod middleware;
pub mod routes;
pub mod service;
pub mod sweep;

pub use error::ServiceError;
pub use routes::router;
pub use service::{BoardService, DEFAULT_BOARD_TIMEOUT};
pub use sweep::{DEFAULT_SWEEP_INTERVAL, SweepScheduler, TickSummary};
