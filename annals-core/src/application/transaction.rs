use std::fmt;
use std::sync::Arc;

use tracing::warn;

use super::session::Session;
use crate::error::Result;

/// Guard over an open store transaction.
///
/// Call [`complete`](Self::complete) to commit. Dropping the scope without
/// completing it rolls the transaction back.
#[must_use = "dropping a transaction scope rolls it back"]
pub struct TransactionScope {
    session: Arc<Session>,
    finished: bool,
}

impl fmt::Debug for TransactionScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransactionScope")
            .field("finished", &self.finished)
            .finish()
    }
}

impl TransactionScope {
    pub(crate) fn new(session: Arc<Session>) -> Self {
        Self {
            session,
            finished: false,
        }
    }

    pub async fn complete(mut self) -> Result<()> {
        self.finished = true;
        self.session.commit().await
    }

    pub async fn rollback(mut self) -> Result<()> {
        self.finished = true;
        self.session.rollback().await
    }
}

impl Drop for TransactionScope {
    fn drop(&mut self) {
        if !self.finished {
            warn!("transaction scope dropped without completing; rolling back");
            self.session.abandon();
        }
    }
}
