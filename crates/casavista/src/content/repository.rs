use super::domain::{Apartment, ApartmentId, BlockId, ContentBlock};

/// Storage abstraction decoupling the content model from any one document
/// engine's client library. Implementations return records in arbitrary
/// order; the store layers the sibling-rank sort on top.
pub trait ContentRepository: Send + Sync {
    fn block(&self, id: &BlockId) -> Result<Option<ContentBlock>, RepositoryError>;
    fn blocks_by_page(&self, page: &str) -> Result<Vec<ContentBlock>, RepositoryError>;
    fn upsert_block(&self, block: ContentBlock) -> Result<ContentBlock, RepositoryError>;
    /// `NotFound` when no block carries the id.
    fn delete_block(&self, id: &BlockId) -> Result<(), RepositoryError>;
    fn child_count(&self, id: &BlockId) -> Result<usize, RepositoryError>;
    /// Targeted write of the `order` field; an unknown id matches zero
    /// records and is a silent no-op, mirroring bulk-update semantics.
    fn set_block_rank(&self, id: &BlockId, rank: i64) -> Result<(), RepositoryError>;

    fn apartments(&self) -> Result<Vec<Apartment>, RepositoryError>;
    fn upsert_apartment(&self, entry: Apartment) -> Result<Apartment, RepositoryError>;
    /// Targeted write of `order_show`; unknown ids are a silent no-op.
    fn set_apartment_rank(&self, id: &ApartmentId, rank: i64) -> Result<(), RepositoryError>;
}

/// Infrastructure-level repository failures. Distinct from validation
/// errors: these are retryable, validation errors are not.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record not found")]
    NotFound,
    #[error("storage unavailable: {0}")]
    Unavailable(String),
}
