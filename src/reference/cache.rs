use std::sync::Arc;

use tokio::sync::Mutex;

use crate::reference::{error::ReferenceError, source::ReferenceSource, types::ServiceIndex};

/// Lazily fetched service index.
///
/// The first caller fetches while holding the lock; everyone queued behind it
/// sees the stored result. A failed fetch leaves the slot empty, so the next
/// call tries again.
pub struct ServiceIndexCache {
    source: Arc<dyn ReferenceSource>,
    slot: Mutex<Option<Arc<ServiceIndex>>>,
}

impl ServiceIndexCache {
    pub fn new(source: Arc<dyn ReferenceSource>) -> Self {
        Self {
            source,
            slot: Mutex::new(None),
        }
    }

    pub async fn get(&self) -> Result<Arc<ServiceIndex>, ReferenceError> {
        let mut slot = self.slot.lock().await;
        if let Some(index) = slot.as_ref() {
            return Ok(Arc::clone(index));
        }

        let index = Arc::new(self.source.fetch_index().await?);
        tracing::info!(
            target: "reference",
            services = index.len(),
            "service_index_cached"
        );
        *slot = Some(Arc::clone(&index));
        Ok(index)
    }

    /// Current cached index, without triggering a fetch.
    pub async fn cached(&self) -> Option<Arc<ServiceIndex>> {
        self.slot.lock().await.clone()
    }
}
