//! Storage connection lifecycle.
//!
//! The storage connection is the only resource shared across requests. It is
//! established at most once per process: the first acquisition runs the
//! connector, and concurrent cold-start callers await that same in-flight
//! attempt instead of opening duplicates. A failed attempt is not cached, so
//! a later request retries.

use std::future::Future;
use std::sync::Arc;

use tokio::sync::OnceCell;
use tracing::info;

use crate::content::repository::RepositoryError;

/// Opens the backing storage from its connection string.
pub trait Connect: Send + Sync {
    type Conn: Send + Sync;

    fn connect(
        &self,
    ) -> impl Future<Output = Result<Arc<Self::Conn>, RepositoryError>> + Send;
}

/// Process-wide handle memoizing the first successful connection.
pub struct ConnectionPool<C: Connect> {
    connector: C,
    cell: OnceCell<Arc<C::Conn>>,
}

impl<C: Connect> ConnectionPool<C> {
    pub fn new(connector: C) -> Self {
        Self {
            connector,
            cell: OnceCell::new(),
        }
    }

    /// Return the shared connection, establishing it on first use. OnceCell
    /// serializes concurrent initializers, so the connector runs once even
    /// under a cold-start burst.
    pub async fn acquire(&self) -> Result<Arc<C::Conn>, RepositoryError> {
        let conn = self
            .cell
            .get_or_try_init(|| async {
                let conn = self.connector.connect().await?;
                info!("storage connection established");
                Ok::<_, RepositoryError>(conn)
            })
            .await?;
        Ok(Arc::clone(conn))
    }
}
