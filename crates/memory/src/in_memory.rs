//! In-memory store: useful for testing and ephemeral sessions.

use async_trait::async_trait;
use souschef_core::error::StoreError;
use souschef_core::memory::{MemoryBank, StateStore};
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use tokio::sync::RwLock;

/// A store that keeps the last saved snapshot in memory.
///
/// Saves can be made to fail on demand, which lets tests exercise the
/// persistence-failure path of the dispatch loop.
#[derive(Clone)]
pub struct InMemoryStore {
    snapshot: Arc<RwLock<Option<MemoryBank>>>,
    saves: Arc<AtomicUsize>,
    fail_saves: Arc<AtomicBool>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            snapshot: Arc::new(RwLock::new(None)),
            saves: Arc::new(AtomicUsize::new(0)),
            fail_saves: Arc::new(AtomicBool::new(false)),
        }
    }

    /// A store that already holds a snapshot.
    pub fn with_bank(bank: MemoryBank) -> Self {
        Self {
            snapshot: Arc::new(RwLock::new(Some(bank))),
            ..Self::new()
        }
    }

    /// Make subsequent saves fail (or succeed again).
    pub fn set_fail_saves(&self, fail: bool) {
        self.fail_saves.store(fail, Ordering::SeqCst);
    }

    /// Number of successful saves.
    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }

    /// The last saved snapshot, if any.
    pub async fn snapshot(&self) -> Option<MemoryBank> {
        self.snapshot.read().await.clone()
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl StateStore for InMemoryStore {
    fn name(&self) -> &str {
        "in_memory"
    }

    async fn load(&self) -> Result<MemoryBank, StoreError> {
        Ok(self.snapshot.read().await.clone().unwrap_or_default())
    }

    async fn save(&self, bank: &MemoryBank) -> Result<(), StoreError> {
        if self.fail_saves.load(Ordering::SeqCst) {
            return Err(StoreError::Write {
                path: PathBuf::from(":memory:"),
                reason: "simulated write failure".into(),
            });
        }
        *self.snapshot.write().await = Some(bank.clone());
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
