//! Connections to the embedded (SQLite) and networked (MySQL) engines.
//!
//! A [`Connection`] owns one driver connection and a current-thread tokio
//! runtime; every call blocks until the database answers. Connections are
//! not `Sync`: one caller at a time.

mod mysql;
mod rows;
mod sqlite;
mod transaction;

use std::any::TypeId;
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::ptr;
use std::sync::Arc;

use norm_core::{Dialect, Entity, EntityDescriptor, Registry, RowMap, SqlPayload, SqlValue};
use sqlx::mysql::MySqlConnection;
use sqlx::sqlite::SqliteConnection;
use sqlx::{ConnectOptions, Connection as _};
use tokio::runtime::{Builder, Runtime};
use tracing::{debug, warn};

pub use rows::{Row, Rows};
pub use transaction::Transaction;

use crate::collection::Collection;
use crate::error::{OrmError, Result};
use crate::schema_sync;

enum Backend {
    Sqlite(SqliteConnection),
    MySql(MySqlConnection),
}

impl Backend {
    async fn fetch_all(&mut self, sql: &str) -> std::result::Result<Vec<Row>, sqlx::Error> {
        match self {
            Self::Sqlite(conn) => {
                let rows = sqlx::raw_sql(sql).fetch_all(&mut *conn).await?;
                sqlite::decode_rows(&rows)
            }
            Self::MySql(conn) => {
                let rows = sqlx::raw_sql(sql).fetch_all(&mut *conn).await?;
                mysql::decode_rows(&rows)
            }
        }
    }

    async fn execute(&mut self, sql: &str) -> std::result::Result<u64, sqlx::Error> {
        match self {
            Self::Sqlite(conn) => Ok(sqlx::raw_sql(sql).execute(&mut *conn).await?.rows_affected()),
            Self::MySql(conn) => Ok(sqlx::raw_sql(sql).execute(&mut *conn).await?.rows_affected()),
        }
    }

    async fn close(self) -> std::result::Result<(), sqlx::Error> {
        match self {
            Self::Sqlite(conn) => conn.close().await,
            Self::MySql(conn) => conn.close().await,
        }
    }
}

/// A connection to one database.
pub struct Connection {
    dialect: Dialect,
    connection_string: String,
    registry: Arc<Registry>,
    runtime: Runtime,
    backend: RefCell<Option<Backend>>,
    collections: RefCell<HashMap<TypeId, Arc<EntityDescriptor>>>,
}

impl Connection {
    /// Creates an unopened connection.
    ///
    /// Usually obtained from [`ConnectionBuilder`](crate::ConnectionBuilder).
    ///
    /// # Errors
    ///
    /// Returns [`OrmError::Io`] if the runtime cannot be started.
    pub fn new(
        dialect: Dialect,
        connection_string: impl Into<String>,
        registry: Arc<Registry>,
    ) -> Result<Self> {
        let runtime = Builder::new_current_thread().enable_all().build()?;
        Ok(Self {
            dialect,
            connection_string: connection_string.into(),
            registry,
            runtime,
            backend: RefCell::new(None),
            collections: RefCell::new(HashMap::new()),
        })
    }

    /// The dialect this connection speaks.
    #[must_use]
    pub const fn dialect(&self) -> Dialect {
        self.dialect
    }

    /// The connection string.
    #[must_use]
    pub fn connection_string(&self) -> &str {
        &self.connection_string
    }

    /// The metadata registry used by this connection.
    #[must_use]
    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    /// Opens the connection. Opening an open connection does nothing.
    ///
    /// # Errors
    ///
    /// Fails if the connection string is invalid or the database refuses.
    pub fn open(&self) -> Result<()> {
        if self.is_open() {
            return Ok(());
        }
        let backend = match self.dialect {
            Dialect::Sqlite => {
                let options = sqlite::connect_options(&self.connection_string)?;
                Backend::Sqlite(self.runtime.block_on(options.connect())?)
            }
            Dialect::MySql => {
                let options = mysql::connect_options(&self.connection_string)?;
                Backend::MySql(self.runtime.block_on(options.connect())?)
            }
        };
        *self.backend.borrow_mut() = Some(backend);
        debug!(dialect = %self.dialect, "Connection opened");
        Ok(())
    }

    /// Returns `true` if the connection is open.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.backend.borrow().is_some()
    }

    /// Closes the connection. Cached collections are forgotten.
    ///
    /// # Errors
    ///
    /// Returns the transport error reported while closing.
    pub fn close(&self) -> Result<()> {
        self.collections.borrow_mut().clear();
        let backend = self.backend.borrow_mut().take();
        if let Some(backend) = backend {
            self.runtime.block_on(backend.close())?;
            debug!(dialect = %self.dialect, "Connection closed");
        }
        Ok(())
    }

    /// Executes a payload, returning the number of affected rows.
    ///
    /// # Errors
    ///
    /// Fails on a payload of another dialect, a closed connection or a
    /// transport error.
    pub fn execute_non_query(&self, payload: &SqlPayload) -> Result<u64> {
        self.check_dialect(payload)?;
        self.execute_raw(payload.sql())
    }

    /// Executes a payload and returns a cursor over every row it produced.
    ///
    /// # Errors
    ///
    /// Fails on a payload of another dialect, a closed connection or a
    /// transport error.
    pub fn execute_query(&self, payload: &SqlPayload) -> Result<Rows> {
        self.check_dialect(payload)?;
        self.fetch_raw(payload.sql()).map(Rows::new)
    }

    /// Executes a payload and returns the first value of the first row, or
    /// `NULL` when it produced no rows.
    ///
    /// # Errors
    ///
    /// Fails on a payload of another dialect, a transaction of another
    /// connection, a closed connection or a transport error.
    pub fn execute_scalar(
        &self,
        payload: &SqlPayload,
        transaction: Option<&Transaction<'_>>,
    ) -> Result<SqlValue> {
        self.check_dialect(payload)?;
        if let Some(transaction) = transaction {
            if !ptr::eq(transaction.connection(), self) {
                return Err(OrmError::ProviderIncompatible(String::from(
                    "transaction belongs to another connection",
                )));
            }
        }
        let rows = self.fetch_raw(payload.sql())?;
        Ok(rows
            .into_iter()
            .next()
            .and_then(|row| row.get_index(0).cloned())
            .unwrap_or_default())
    }

    /// Executes a payload and materializes every row as a map.
    ///
    /// # Errors
    ///
    /// Fails on a payload of another dialect, a closed connection or a
    /// transport error.
    pub fn query(&self, payload: &SqlPayload) -> Result<Vec<RowMap>> {
        self.execute_query(payload)
            .map(|rows| rows.map(Row::into_map).collect())
    }

    /// Begins a transaction.
    ///
    /// # Errors
    ///
    /// Fails on a closed connection or a transport error.
    pub fn begin_transaction(&self) -> Result<Transaction<'_>> {
        Transaction::begin(self)
    }

    /// Returns the collection of `T`.
    ///
    /// The first call per type reconciles the live schema with `T`'s
    /// declaration; later calls reuse the cached descriptor.
    ///
    /// # Errors
    ///
    /// Fails if reconciliation fails.
    pub fn collection<T: Entity>(&self) -> Result<Collection<'_, T>> {
        let cached = self
            .collections
            .borrow()
            .get(&TypeId::of::<T>())
            .map(Arc::clone);
        if let Some(descriptor) = cached {
            return Ok(Collection::new(self, descriptor));
        }
        let descriptor = self.registry.descriptor::<T>();
        self.reconcile::<T>(&descriptor)?;
        Ok(Collection::new(self, descriptor))
    }

    /// Reconciles the live schema with `T` now, returning the alterations
    /// that were executed. The collection of `T` is cached afterwards.
    ///
    /// # Errors
    ///
    /// Fails if any statement fails; statements already executed stay
    /// applied.
    pub fn sync_schema<T: Entity>(&self) -> Result<Vec<SqlPayload>> {
        let descriptor = self.registry.descriptor::<T>();
        self.reconcile::<T>(&descriptor)
    }

    fn reconcile<T: Entity>(&self, descriptor: &Arc<EntityDescriptor>) -> Result<Vec<SqlPayload>> {
        let executed = schema_sync::reconcile(self, descriptor)?;
        self.collections
            .borrow_mut()
            .insert(TypeId::of::<T>(), Arc::clone(descriptor));
        Ok(executed)
    }

    fn check_dialect(&self, payload: &SqlPayload) -> Result<()> {
        if payload.dialect() == self.dialect {
            Ok(())
        } else {
            Err(OrmError::wrong_dialect(self.dialect, payload.dialect()))
        }
    }

    pub(crate) fn execute_raw(&self, sql: &str) -> Result<u64> {
        let mut backend = self.backend.borrow_mut();
        let backend = backend.as_mut().ok_or(OrmError::NotConnected)?;
        debug!(sql = %sql, "Executing SQL");
        Ok(self.runtime.block_on(backend.execute(sql))?)
    }

    fn fetch_raw(&self, sql: &str) -> Result<Vec<Row>> {
        let mut backend = self.backend.borrow_mut();
        let backend = backend.as_mut().ok_or(OrmError::NotConnected)?;
        debug!(sql = %sql, "Executing SQL");
        Ok(self.runtime.block_on(backend.fetch_all(sql))?)
    }
}

impl fmt::Debug for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection")
            .field("dialect", &self.dialect)
            .field("open", &self.is_open())
            .field("collections", &self.collections.borrow().len())
            .finish_non_exhaustive()
    }
}

impl Drop for Connection {
    fn drop(&mut self) {
        if let Some(backend) = self.backend.get_mut().take() {
            if let Err(e) = self.runtime.block_on(backend.close()) {
                warn!(error = %e, "Error closing connection");
            }
        }
    }
}
