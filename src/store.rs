//! Process-wide corpus slot with atomic publish.
//!
//! A rebuild constructs the next corpus entirely before taking the
//! write lock, then swaps it in. Readers therefore observe either the
//! previous complete version or the new complete version, never a
//! half-built index. Only one in-flight rebuild may publish at a time;
//! the version counter is monotonic so stale handles are detectable.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

use crate::embedding::Embedder;
use crate::error::Result;
use crate::models::Document;
use crate::pipeline::{self, Corpus};

/// One published corpus version.
#[derive(Debug)]
pub struct CorpusVersion {
    /// Monotonically increasing, starting at 1.
    pub version: u64,
    pub corpus: Corpus,
}

/// Shared slot holding the current [`CorpusVersion`].
pub struct CorpusStore {
    current: RwLock<Option<Arc<CorpusVersion>>>,
    /// Serializes rebuilds: held across the entire ingest, not just the
    /// publish, so at most one rebuild is in flight.
    rebuild_lock: tokio::sync::Mutex<()>,
    next_version: AtomicU64,
}

impl CorpusStore {
    pub fn new() -> Self {
        Self {
            current: RwLock::new(None),
            rebuild_lock: tokio::sync::Mutex::new(()),
            next_version: AtomicU64::new(1),
        }
    }

    /// The currently published version, if any rebuild has completed.
    pub fn current(&self) -> Option<Arc<CorpusVersion>> {
        self.current.read().expect("corpus lock poisoned").clone()
    }

    /// Rebuild the corpus from `documents` and atomically publish the
    /// result. On failure the previously published version remains
    /// current.
    pub async fn rebuild(
        &self,
        embedder: &dyn Embedder,
        documents: Vec<Document>,
        chunk_size: usize,
        chunk_overlap: usize,
    ) -> Result<Arc<CorpusVersion>> {
        let _rebuild = self.rebuild_lock.lock().await;
        let corpus = pipeline::ingest(embedder, documents, chunk_size, chunk_overlap).await?;

        let published = Arc::new(CorpusVersion {
            version: self.next_version.fetch_add(1, Ordering::SeqCst),
            corpus,
        });

        let mut slot = self.current.write().expect("corpus lock poisoned");
        *slot = Some(published.clone());
        Ok(published)
    }
}

impl Default for CorpusStore {
    fn default() -> Self {
        Self::new()
    }
}
