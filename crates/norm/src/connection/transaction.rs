//! Transactions on a connection.

use tracing::warn;

use super::Connection;
use crate::error::Result;

/// An open transaction on a [`Connection`].
///
/// The caller owns the outcome: call [`commit`](Self::commit) or
/// [`rollback`](Self::rollback). A transaction dropped without either is
/// left open on the connection and a warning is logged.
#[derive(Debug)]
pub struct Transaction<'c> {
    connection: &'c Connection,
    finished: bool,
}

impl<'c> Transaction<'c> {
    pub(crate) fn begin(connection: &'c Connection) -> Result<Self> {
        let begin = connection.dialect().rules().begin_transaction;
        connection.execute_raw(begin)?;
        Ok(Self {
            connection,
            finished: false,
        })
    }

    /// The connection this transaction runs on.
    #[must_use]
    pub fn connection(&self) -> &'c Connection {
        self.connection
    }

    /// Commits the transaction.
    ///
    /// # Errors
    ///
    /// Returns the transport error if `COMMIT` fails.
    pub fn commit(mut self) -> Result<()> {
        self.finished = true;
        self.connection.execute_raw("COMMIT;").map(|_| ())
    }

    /// Rolls the transaction back.
    ///
    /// # Errors
    ///
    /// Returns the transport error if `ROLLBACK` fails.
    pub fn rollback(mut self) -> Result<()> {
        self.finished = true;
        self.connection.execute_raw("ROLLBACK;").map(|_| ())
    }
}

impl Drop for Transaction<'_> {
    fn drop(&mut self) {
        if !self.finished {
            warn!(
                dialect = %self.connection.dialect(),
                "Transaction dropped without commit or rollback"
            );
        }
    }
}
