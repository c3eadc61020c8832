//! Request-scoped transaction with its deferred side effects.

use sea_orm::{DatabaseTransaction, DbErr, TransactionTrait};
use tracing::debug;

use crate::events::AfterCommit;

/// One database transaction plus the side effects to run once it commits.
///
/// Dropping a `RequestTx` without calling [`RequestTx::commit`] rolls the
/// transaction back and discards every deferred event.
pub struct RequestTx {
    txn: DatabaseTransaction,
    events: Vec<AfterCommit>,
}

impl RequestTx {
    pub async fn begin<D>(db: &D) -> Result<Self, DbErr>
    where
        D: TransactionTrait<Transaction = DatabaseTransaction>,
    {
        Ok(Self {
            txn: db.begin().await?,
            events: Vec::new(),
        })
    }

    /// Connection for queries that belong to this transaction.
    pub fn conn(&self) -> &DatabaseTransaction {
        &self.txn
    }

    pub fn defer(&mut self, event: AfterCommit) {
        self.events.push(event);
    }

    pub fn pending(&self) -> &[AfterCommit] {
        &self.events
    }

    /// Commit and hand back the deferred events, in the order they were added.
    pub async fn commit(self) -> Result<Vec<AfterCommit>, DbErr> {
        self.txn.commit().await?;
        debug!(events = self.events.len(), "transaction committed");
        Ok(self.events)
    }
}
