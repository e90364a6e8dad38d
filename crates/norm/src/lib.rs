//! # norm
//!
//! A lightweight ORM that projects plain Rust structs onto SQLite and MySQL
//! tables. Declare an entity with `#[derive(Entity)]`, open a
//! [`Connection`], and work through its [`Collection`]: the table is
//! created, and its columns reconciled with the declaration, the first time
//! the collection is touched.
//!
//! The derive emits paths into `norm_core`, so crates using it depend on
//! both `norm` and `norm-core`.
//!
//! ## Quick Start
//!
//! ```ignore
//! use chrono::{DateTime, Utc};
//! use norm::{ConnectionBuilder, Dialect, Entity};
//!
//! #[derive(Debug, Clone, Default, Entity)]
//! #[collection(name = "Posts")]
//! struct Post {
//!     #[column]
//!     #[primary_key]
//!     id: i32,
//!     #[column]
//!     title: String,
//!     #[column(name = "created")]
//!     created_at: DateTime<Utc>,
//! }
//!
//! fn main() -> norm::Result<()> {
//!     let connection = ConnectionBuilder::new(Dialect::Sqlite)
//!         .in_memory()?
//!         .build_and_connect()?;
//!
//!     let posts = connection.collection::<Post>()?;
//!     let post = posts.insert(Post { title: "Hello".into(), ..Post::default() })?;
//!
//!     let found = posts.find_one(Post::id().eq(post.id))?;
//!     assert_eq!(found.as_ref(), Some(&post));
//!
//!     posts.remove(&post)?;
//!     Ok(())
//! }
//! ```
//!
//! ## Predicates
//!
//! Column handles build typed predicates. Only equality joined by `and` can
//! be compiled to SQL; other shapes fail with
//! [`CoreError::UnsupportedPredicate`].
//!
//! ```ignore
//! let filter = Post::title().eq("Hello").and(Post::id().eq(1));
//! ```

pub mod collection;
pub mod config;
pub mod connection;
pub mod error;
mod schema_sync;

pub use collection::Collection;
pub use config::{ConnectionBuilder, ConnectionConfig};
pub use connection::{Connection, Row, Rows, Transaction};
pub use error::{OrmError, Result};

pub use norm_core::{
    Column, ColumnDescriptor, CoreError, Dialect, Entity, EntityDescriptor, Expr, FieldValue,
    LiveColumn, Predicate, Registry, RowMap, SemanticType, SqlBuilder, SqlPayload, SqlValue,
};
pub use norm_derive::Entity;
