//! Typed CRUD over one collection.

use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use norm_core::{Entity, EntityDescriptor, Predicate, SqlBuilder, SqlValue};

use crate::connection::{Connection, Transaction};
use crate::error::{OrmError, Result};

/// Handle on the collection of entity `T`, bound to a connection.
///
/// Obtained from [`Connection::collection`]; the schema has been reconciled
/// by then.
///
/// # Example
///
/// ```ignore
/// let posts = connection.collection::<Post>()?;
/// let post = posts.insert(Post { title: "Hello".into(), ..Post::default() })?;
/// let found = posts.find_one(Post::id().eq(post.id))?;
/// assert_eq!(found.as_ref(), Some(&post));
/// ```
pub struct Collection<'c, T: Entity> {
    connection: &'c Connection,
    descriptor: Arc<EntityDescriptor>,
    builder: SqlBuilder,
    _entity: PhantomData<fn() -> T>,
}

impl<'c, T: Entity> Collection<'c, T> {
    pub(crate) fn new(connection: &'c Connection, descriptor: Arc<EntityDescriptor>) -> Self {
        Self {
            connection,
            descriptor,
            builder: SqlBuilder::new(connection.dialect()),
            _entity: PhantomData,
        }
    }

    /// Descriptor of `T`.
    #[must_use]
    pub fn descriptor(&self) -> &EntityDescriptor {
        &self.descriptor
    }

    /// The connection this collection runs on.
    #[must_use]
    pub fn connection(&self) -> &'c Connection {
        self.connection
    }

    /// Inserts a record and returns it with its engine-assigned key.
    ///
    /// # Errors
    ///
    /// Fails on a transport error or if the assigned key does not fit the
    /// key field.
    pub fn insert(&self, record: T) -> Result<T> {
        self.insert_with(record, None)
    }

    /// Inserts a record inside `transaction`.
    ///
    /// # Errors
    ///
    /// Same as [`insert`](Self::insert); also fails if `transaction` belongs
    /// to another connection.
    pub fn insert_with(&self, mut record: T, transaction: Option<&Transaction<'_>>) -> Result<T> {
        let payload = self.builder.insert(&self.descriptor, &record)?;
        let identity = self.connection.execute_scalar(&payload, transaction)?;
        if let Some(index) = self.descriptor.primary_key_index() {
            if !identity.is_null() {
                self.assign(&mut record, index, identity)?;
            }
        }
        Ok(record)
    }

    /// Inserts records in one transaction and returns them in order.
    ///
    /// On failure the error is returned as is; the transaction is neither
    /// committed nor rolled back.
    ///
    /// # Errors
    ///
    /// Fails on the first failing insert or on commit.
    pub fn insert_many<I>(&self, records: I) -> Result<Vec<T>>
    where
        I: IntoIterator<Item = T>,
    {
        let transaction = self.begin_transaction()?;
        let inserted = records
            .into_iter()
            .map(|record| self.insert_with(record, Some(&transaction)))
            .collect::<Result<Vec<_>>>()?;
        transaction.commit()?;
        Ok(inserted)
    }

    /// Deletes the record with `record`'s primary key. Returns `true` if
    /// the engine reported a removal.
    ///
    /// # Errors
    ///
    /// Fails if `T` has no primary key or on a transport error.
    pub fn remove(&self, record: &T) -> Result<bool> {
        let payload = self.builder.delete(&self.descriptor, record)?;
        let rows = self.connection.execute_query(&payload)?;
        Ok(!rows.is_empty())
    }

    /// Deletes every record. Returns `false` when the collection was
    /// already empty.
    ///
    /// # Errors
    ///
    /// Fails on a transport error.
    pub fn truncate(&self) -> Result<bool> {
        let payload = self.builder.truncate(&self.descriptor)?;
        let rows = self.connection.execute_query(&payload)?;
        Ok(!rows.is_empty())
    }

    /// Returns the first record matching `predicate`.
    ///
    /// Columns missing from the row or holding `NULL` leave the field at its
    /// default.
    ///
    /// # Errors
    ///
    /// Fails on an unsupported predicate, a transport error, or a value
    /// that cannot be assigned to its field.
    pub fn find_one(&self, predicate: Predicate<T>) -> Result<Option<T>> {
        let payload = self.builder.select(&self.descriptor, &predicate)?;
        let mut rows = self.connection.execute_query(&payload)?;
        let Some(row) = rows.next() else {
            return Ok(None);
        };

        let mut record = T::default();
        for (index, column) in self.descriptor.columns().iter().enumerate() {
            match row.get(column.name) {
                None | Some(SqlValue::Null) => {}
                Some(value) => self.assign(&mut record, index, value.clone())?,
            }
        }
        Ok(Some(record))
    }

    /// Begins a transaction on the underlying connection.
    ///
    /// # Errors
    ///
    /// Fails on a closed connection or a transport error.
    pub fn begin_transaction(&self) -> Result<Transaction<'c>> {
        self.connection.begin_transaction()
    }

    fn assign(&self, record: &mut T, index: usize, value: SqlValue) -> Result<()> {
        let field = self.descriptor.columns()[index].field;
        let rendered = value.to_string();
        let value_type = value.kind();
        record
            .assign(index, value)
            .map_err(|source| OrmError::FieldAssignmentFailed {
                field,
                value: rendered,
                value_type,
                source,
            })
    }
}

impl<T: Entity> fmt::Debug for Collection<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Collection")
            .field("table", &self.descriptor.table_name())
            .field("dialect", &self.builder.dialect())
            .finish()
    }
}
