use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::Utc;
use tracing::debug;

use super::domain::{
    Apartment, ApartmentDraft, ApartmentId, BlockId, ContentBlock, ContentBlockDraft,
    MAX_IMAGE_SLOTS,
};
use super::repository::{ContentRepository, RepositoryError};
use crate::i18n::SUPPORTED_LOCALES;

/// Ancestor chains longer than this are rejected; the walk doubles as
/// cycle detection.
pub const MAX_PARENT_DEPTH: usize = 8;

static BLOCK_SEQUENCE: AtomicU64 = AtomicU64::new(1);
static APARTMENT_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_block_id() -> BlockId {
    let id = BLOCK_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    BlockId(format!("blk-{id:06}"))
}

fn next_apartment_id() -> ApartmentId {
    let id = APARTMENT_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    ApartmentId(format!("apt-{id:06}"))
}

/// Validating facade over the repository: assigns ids and timestamps,
/// fills locale gaps, enforces the hierarchy invariants, and sorts reads
/// by sibling rank.
pub struct ContentStore<R> {
    repository: Arc<R>,
}

impl<R: ContentRepository> ContentStore<R> {
    pub fn new(repository: Arc<R>) -> Self {
        Self { repository }
    }

    /// Flat list of a page's blocks, rank-sorted within each
    /// `(page, parent_id)` sibling group. Callers rebuild the tree from
    /// the `parent_id` links.
    pub fn fetch_by_page(&self, page: &str) -> Result<Vec<ContentBlock>, StoreError> {
        let mut blocks = self.repository.blocks_by_page(page)?;
        blocks.sort_by(|a, b| {
            a.parent_id
                .cmp(&b.parent_id)
                .then(a.order.cmp(&b.order))
                .then(a.id.cmp(&b.id))
        });
        Ok(blocks)
    }

    /// Full-document upsert. Missing locale copy defaults to empty
    /// strings; `created_at` survives updates, `updated_at` refreshes.
    pub fn upsert(&self, draft: ContentBlockDraft) -> Result<ContentBlock, StoreError> {
        if draft.key.trim().is_empty() {
            return Err(ValidationError::MissingKey.into());
        }
        if draft.page.trim().is_empty() {
            return Err(ValidationError::MissingPage.into());
        }
        if draft.images.len() > MAX_IMAGE_SLOTS {
            return Err(ValidationError::TooManyImages.into());
        }
        self.validate_parent_chain(draft.id.as_ref(), draft.parent_id.as_ref())?;

        let now = Utc::now();
        let (id, created_at) = match draft.id {
            Some(id) => match self.repository.block(&id)? {
                Some(existing) => (existing.id, existing.created_at),
                None => (id, now),
            },
            None => (next_block_id(), now),
        };

        let mut copy = draft.copy;
        for locale in SUPPORTED_LOCALES {
            copy.entry(locale).or_default();
        }

        let block = ContentBlock {
            id,
            key: draft.key,
            page: draft.page,
            parent_id: draft.parent_id,
            order: draft.order,
            published: draft.published,
            copy,
            images: draft.images,
            created_at,
            updated_at: now,
        };

        debug!(block = %block.id.0, page = %block.page, "upserting content block");
        Ok(self.repository.upsert_block(block)?)
    }

    /// Deletion policy: refused while children still reference the block.
    /// Admins re-parent or delete children first; nothing cascades.
    pub fn delete(&self, id: &BlockId) -> Result<(), StoreError> {
        let children = self.repository.child_count(id)?;
        if children > 0 {
            return Err(ValidationError::HasChildren {
                id: id.0.clone(),
                children,
            }
            .into());
        }
        Ok(self.repository.delete_block(id)?)
    }

    pub fn list_apartments(&self) -> Result<Vec<Apartment>, StoreError> {
        let mut entries = self.repository.apartments()?;
        entries.sort_by(|a, b| a.order_show.cmp(&b.order_show).then(a.id.cmp(&b.id)));
        Ok(entries)
    }

    pub fn upsert_apartment(&self, draft: ApartmentDraft) -> Result<Apartment, StoreError> {
        if draft.name.trim().is_empty() {
            return Err(ValidationError::MissingName.into());
        }
        let id = draft.id.unwrap_or_else(next_apartment_id);
        let entry = Apartment {
            id,
            name: draft.name,
            published: draft.published,
            order_show: draft.order_show,
        };
        Ok(self.repository.upsert_apartment(entry)?)
    }

    /// Walk the prospective parent chain to a root. Fails on an unknown
    /// parent, on a loop back to the block itself, or past the depth bound.
    fn validate_parent_chain(
        &self,
        id: Option<&BlockId>,
        parent_id: Option<&BlockId>,
    ) -> Result<(), StoreError> {
        let mut cursor = parent_id.cloned();
        let mut depth = 0;
        while let Some(current) = cursor {
            if Some(&current) == id {
                return Err(ValidationError::ParentCycle.into());
            }
            depth += 1;
            if depth > MAX_PARENT_DEPTH {
                return Err(ValidationError::ParentChainTooDeep.into());
            }
            let parent = self
                .repository
                .block(&current)?
                .ok_or(ValidationError::UnknownParent { id: current.0 })?;
            cursor = parent.parent_id;
        }
        Ok(())
    }
}

/// Client-input rejections; never retried and never reach the repository.
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("key must not be empty")]
    MissingKey,
    #[error("page must not be empty")]
    MissingPage,
    #[error("a block carries at most {MAX_IMAGE_SLOTS} image slots")]
    TooManyImages,
    #[error("parent block '{id}' does not exist")]
    UnknownParent { id: String },
    #[error("block cannot be its own ancestor")]
    ParentCycle,
    #[error("parent chain exceeds depth {MAX_PARENT_DEPTH}")]
    ParentChainTooDeep,
    #[error("block '{id}' still has {children} child blocks")]
    HasChildren { id: String, children: usize },
    #[error("name must not be empty")]
    MissingName,
}

/// Store failures keep validation and infrastructure distinguishable so
/// callers can retry the latter and surface the former as 400s.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}
