use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex, OwnedMutexGuard, RwLock};
use uuid::Uuid;

/// One mutex per board id. Holding a board's guard is the only way to
/// read-modify-write that board, so concurrent mutations never interleave.
#[derive(Clone, Default)]
pub struct BoardLocks {
    inner: Arc<RwLock<HashMap<Uuid, Arc<Mutex<()>>>>>,
}

impl BoardLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to `board_id`. The guard is owned so it can
    /// be moved onto a blocking thread.
    pub async fn lock(&self, board_id: Uuid) -> OwnedMutexGuard<()> {
        self.handle(board_id).await.lock_owned().await
    }

    /// Drop the mutex of a deleted board.
    pub async fn forget(&self, board_id: Uuid) {
        self.inner.write().await.remove(&board_id);
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    async fn handle(&self, board_id: Uuid) -> Arc<Mutex<()>> {
        if let Some(existing) = self.inner.read().await.get(&board_id) {
            return existing.clone();
        }
        self.inner.write().await.entry(board_id).or_default().clone()
    }
}
