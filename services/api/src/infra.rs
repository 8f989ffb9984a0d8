use std::collections::HashMap;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};

use casavista::content::{
    Apartment, ApartmentId, BlockId, ContentBlock, ContentRepository, RepositoryError,
};
use casavista::storage::Connect;
use metrics_exporter_prometheus::PrometheusHandle;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Process-local document engine backing the repository contract. A real
/// deployment swaps this for a document-store client behind the same trait.
#[derive(Default)]
pub(crate) struct MemoryRepository {
    blocks: Mutex<HashMap<BlockId, ContentBlock>>,
    apartments: Mutex<HashMap<ApartmentId, Apartment>>,
}

impl ContentRepository for MemoryRepository {
    fn block(&self, id: &BlockId) -> Result<Option<ContentBlock>, RepositoryError> {
        let guard = self.blocks.lock().expect("repository mutex poisoned");
        Ok(guard.get(id).cloned())
    }

    fn blocks_by_page(&self, page: &str) -> Result<Vec<ContentBlock>, RepositoryError> {
        let guard = self.blocks.lock().expect("repository mutex poisoned");
        Ok(guard
            .values()
            .filter(|block| block.page == page)
            .cloned()
            .collect())
    }

    fn upsert_block(&self, block: ContentBlock) -> Result<ContentBlock, RepositoryError> {
        let mut guard = self.blocks.lock().expect("repository mutex poisoned");
        guard.insert(block.id.clone(), block.clone());
        Ok(block)
    }

    fn delete_block(&self, id: &BlockId) -> Result<(), RepositoryError> {
        let mut guard = self.blocks.lock().expect("repository mutex poisoned");
        guard.remove(id).map(|_| ()).ok_or(RepositoryError::NotFound)
    }

    fn child_count(&self, id: &BlockId) -> Result<usize, RepositoryError> {
        let guard = self.blocks.lock().expect("repository mutex poisoned");
        Ok(guard
            .values()
            .filter(|block| block.parent_id.as_ref() == Some(id))
            .count())
    }

    fn set_block_rank(&self, id: &BlockId, rank: i64) -> Result<(), RepositoryError> {
        let mut guard = self.blocks.lock().expect("repository mutex poisoned");
        if let Some(block) = guard.get_mut(id) {
            block.order = rank;
        }
        Ok(())
    }

    fn apartments(&self) -> Result<Vec<Apartment>, RepositoryError> {
        let guard = self.apartments.lock().expect("repository mutex poisoned");
        Ok(guard.values().cloned().collect())
    }

    fn upsert_apartment(&self, entry: Apartment) -> Result<Apartment, RepositoryError> {
        let mut guard = self.apartments.lock().expect("repository mutex poisoned");
        guard.insert(entry.id.clone(), entry.clone());
        Ok(entry)
    }

    fn set_apartment_rank(&self, id: &ApartmentId, rank: i64) -> Result<(), RepositoryError> {
        let mut guard = self.apartments.lock().expect("repository mutex poisoned");
        if let Some(entry) = guard.get_mut(id) {
            entry.order_show = rank;
        }
        Ok(())
    }
}

/// Connector for the in-process engine. Keeps the connection-string
/// contract of a real document store: only `memory://` URLs are accepted.
pub(crate) struct MemoryConnector {
    url: String,
    repository: Arc<MemoryRepository>,
}

impl MemoryConnector {
    pub(crate) fn new(url: &str) -> Self {
        Self {
            url: url.to_string(),
            repository: Arc::new(MemoryRepository::default()),
        }
    }

    #[cfg(test)]
    pub(crate) fn with_repository(repository: Arc<MemoryRepository>) -> Self {
        Self {
            url: "memory://test".to_string(),
            repository,
        }
    }
}

impl Connect for MemoryConnector {
    type Conn = MemoryRepository;

    async fn connect(&self) -> Result<Arc<MemoryRepository>, RepositoryError> {
        if !self.url.starts_with("memory://") {
            return Err(RepositoryError::Unavailable(format!(
                "unsupported storage url scheme in '{}'",
                self.url
            )));
        }
        Ok(Arc::clone(&self.repository))
    }
}
