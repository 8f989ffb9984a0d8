//! Content-block and apartment-listing domain: typed records, the
//! repository contract, the validating store, and the order reconciler.

pub mod domain;
pub mod ordering;
pub mod repository;
pub mod router;
pub mod store;

pub use domain::{
    Apartment, ApartmentDraft, ApartmentId, BlockId, ContentBlock, ContentBlockDraft, ImageSlot,
    LocalizedCopy, MediaResolver,
};
pub use ordering::{derive_move, OrderError, OrderReconciler, RankUpdate};
pub use repository::{ContentRepository, RepositoryError};
pub use store::{ContentStore, StoreError, ValidationError};
