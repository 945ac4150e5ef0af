use std::sync::Arc;

use tracing::info;

use crate::domain::CollectionKey;
use crate::errors::FeederResult;
use crate::storage::traits::RankedStore;

/// Caps the global collection at a fixed number of newest entries.
#[derive(Clone)]
pub struct RetentionService {
    store: Arc<dyn RankedStore>,
    max_entries: usize,
}

impl RetentionService {
    pub fn new(store: Arc<dyn RankedStore>, max_entries: usize) -> Self {
        Self { store, max_entries }
    }

    /// Returns how many entries were removed
    pub fn trim_global(&self) -> FeederResult<usize> {
        let removed = self
            .store
            .trim_to_max(&CollectionKey::global(), self.max_entries)?;

        if removed > 0 {
            info!(removed, max_entries = self.max_entries, "trimmed global collection");
        }

        Ok(removed)
    }
}
