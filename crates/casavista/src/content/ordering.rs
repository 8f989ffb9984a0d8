//! Sibling reordering.
//!
//! A reorder is a batch of absolute-rank writes. The batch is not
//! transactional: a mid-batch failure leaves the applied prefix in place
//! and nothing rolls back. Because every write assigns an absolute rank,
//! re-submitting the same batch converges to the same final state, which
//! is what makes caller-side retry safe.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::domain::{ApartmentId, BlockId};
use super::repository::{ContentRepository, RepositoryError};

/// One targeted write: set the rank field on the record with this id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankUpdate {
    pub id: String,
    #[serde(rename = "orderShow", alias = "order")]
    pub rank: i64,
}

#[derive(Debug, thiserror::Error)]
pub enum OrderError {
    #[error("move index out of range")]
    IndexOutOfRange,
    #[error("order batch failed after {applied} of {total} writes: {source}")]
    Partial {
        applied: usize,
        total: usize,
        source: RepositoryError,
    },
}

/// Applies a desired sibling ordering as one best-effort batch.
pub struct OrderReconciler<R> {
    repository: Arc<R>,
}

impl<R: ContentRepository> OrderReconciler<R> {
    pub fn new(repository: Arc<R>) -> Self {
        Self { repository }
    }

    /// Rewrite apartment display ranks. An empty batch performs zero
    /// writes and still reports success.
    pub fn apply_listing_order(&self, updates: &[RankUpdate]) -> Result<usize, OrderError> {
        self.apply(updates, |update| {
            self.repository
                .set_apartment_rank(&ApartmentId(update.id.clone()), update.rank)
        })
    }

    /// Rewrite content-block sibling ranks.
    pub fn apply_block_order(&self, updates: &[RankUpdate]) -> Result<usize, OrderError> {
        self.apply(updates, |update| {
            self.repository
                .set_block_rank(&BlockId(update.id.clone()), update.rank)
        })
    }

    fn apply<F>(&self, updates: &[RankUpdate], mut write: F) -> Result<usize, OrderError>
    where
        F: FnMut(&RankUpdate) -> Result<(), RepositoryError>,
    {
        for (applied, update) in updates.iter().enumerate() {
            write(update).map_err(|source| OrderError::Partial {
                applied,
                total: updates.len(),
                source,
            })?;
        }
        debug!(writes = updates.len(), "order batch applied");
        Ok(updates.len())
    }
}

/// Canonical client-side rank derivation for a drag-and-drop move: remove
/// the element at `from`, insert it at `to`, then assign every element its
/// new 0-based positional index as an absolute rank.
pub fn derive_move(ids: &[String], from: usize, to: usize) -> Result<Vec<RankUpdate>, OrderError> {
    if from >= ids.len() || to >= ids.len() {
        return Err(OrderError::IndexOutOfRange);
    }
    let mut sequence = ids.to_vec();
    let moved = sequence.remove(from);
    sequence.insert(to, moved);
    Ok(sequence
        .into_iter()
        .enumerate()
        .map(|(rank, id)| RankUpdate {
            id,
            rank: rank as i64,
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::domain::{Apartment, ContentBlock};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn ids(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn derive_move_shifts_down() {
        let updates = derive_move(&ids(&["a", "b", "c", "d"]), 0, 2).expect("valid move");
        let order: Vec<_> = updates.iter().map(|u| (u.id.as_str(), u.rank)).collect();
        assert_eq!(order, vec![("b", 0), ("c", 1), ("a", 2), ("d", 3)]);
    }

    #[test]
    fn derive_move_shifts_up() {
        let updates = derive_move(&ids(&["a", "b", "c"]), 2, 0).expect("valid move");
        let order: Vec<_> = updates.iter().map(|u| (u.id.as_str(), u.rank)).collect();
        assert_eq!(order, vec![("c", 0), ("a", 1), ("b", 2)]);
    }

    #[test]
    fn derive_move_rejects_out_of_range_indices() {
        let err = derive_move(&ids(&["a", "b"]), 5, 0).expect_err("source out of range");
        assert!(matches!(err, OrderError::IndexOutOfRange));
        let err = derive_move(&ids(&["a", "b"]), 0, 2).expect_err("target out of range");
        assert!(matches!(err, OrderError::IndexOutOfRange));
    }

    /// Repository stub that fails every write past a threshold.
    struct FlakyRepository {
        writes: AtomicUsize,
        fail_after: usize,
    }

    impl ContentRepository for FlakyRepository {
        fn block(&self, _: &BlockId) -> Result<Option<ContentBlock>, RepositoryError> {
            Ok(None)
        }
        fn blocks_by_page(&self, _: &str) -> Result<Vec<ContentBlock>, RepositoryError> {
            Ok(Vec::new())
        }
        fn upsert_block(&self, block: ContentBlock) -> Result<ContentBlock, RepositoryError> {
            Ok(block)
        }
        fn delete_block(&self, _: &BlockId) -> Result<(), RepositoryError> {
            Ok(())
        }
        fn child_count(&self, _: &BlockId) -> Result<usize, RepositoryError> {
            Ok(0)
        }
        fn set_block_rank(&self, _: &BlockId, _: i64) -> Result<(), RepositoryError> {
            self.record_write()
        }
        fn apartments(&self) -> Result<Vec<Apartment>, RepositoryError> {
            Ok(Vec::new())
        }
        fn upsert_apartment(&self, entry: Apartment) -> Result<Apartment, RepositoryError> {
            Ok(entry)
        }
        fn set_apartment_rank(&self, _: &ApartmentId, _: i64) -> Result<(), RepositoryError> {
            self.record_write()
        }
    }

    impl FlakyRepository {
        fn record_write(&self) -> Result<(), RepositoryError> {
            let seen = self.writes.fetch_add(1, Ordering::SeqCst);
            if seen >= self.fail_after {
                return Err(RepositoryError::Unavailable("write failed".to_string()));
            }
            Ok(())
        }
    }

    #[test]
    fn empty_batch_is_a_successful_no_op() {
        let repo = Arc::new(FlakyRepository {
            writes: AtomicUsize::new(0),
            fail_after: 0,
        });
        let reconciler = OrderReconciler::new(Arc::clone(&repo));
        let written = reconciler.apply_listing_order(&[]).expect("empty batch ok");
        assert_eq!(written, 0);
        assert_eq!(repo.writes.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn partial_failure_reports_applied_prefix() {
        let repo = Arc::new(FlakyRepository {
            writes: AtomicUsize::new(0),
            fail_after: 2,
        });
        let reconciler = OrderReconciler::new(repo);
        let updates = derive_move(&ids(&["a", "b", "c", "d"]), 3, 0).expect("valid move");
        let err = reconciler
            .apply_listing_order(&updates)
            .expect_err("third write fails");
        let OrderError::Partial { applied, total, .. } = err else {
            panic!("expected partial failure");
        };
        assert_eq!(applied, 2);
        assert_eq!(total, 4);
    }
}
