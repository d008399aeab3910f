//! Snapshot cache — the last successful snapshot behind an atomic pointer.

use std::sync::Arc;

use arc_swap::ArcSwapOption;

use vigil_core::Snapshot;

/// Holds the last successful snapshot.
///
/// Single writer (the refresh scheduler), unbounded concurrent readers
/// (HTTP handlers). Reads and writes are whole-object pointer swaps:
/// readers see either nothing or one fully-formed snapshot, never a mix
/// of old and new sections.
#[derive(Clone, Default)]
pub struct SnapshotCache {
    inner: Arc<ArcSwapOption<Snapshot>>,
}

impl SnapshotCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Latest snapshot, or `None` before the first refresh completes.
    pub fn load(&self) -> Option<Arc<Snapshot>> {
        self.inner.load_full()
    }

    /// Replace the cached snapshot wholesale.
    pub fn store(&self, snapshot: Snapshot) {
        self.inner.store(Some(Arc::new(snapshot)));
    }
}
