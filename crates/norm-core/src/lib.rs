//! # norm-core
//!
//! The I/O-free half of `norm`: entity metadata, SQL value formatting,
//! predicate compilation, dialect rules, SQL synthesis and schema
//! reconciliation planning.
//!
//! ## Example
//!
//! ```rust
//! use norm_core::{
//!     ColumnDescriptor, Dialect, EntityDescriptor, SemanticType, SqlBuilder,
//! };
//!
//! let posts = EntityDescriptor::new(
//!     "Post",
//!     Some("Posts"),
//!     vec![
//!         ColumnDescriptor::new("id", "id", SemanticType::Int32).primary_key(true),
//!         ColumnDescriptor::new("title", "title", SemanticType::Text),
//!     ],
//!     vec![],
//! );
//!
//! let create = SqlBuilder::new(Dialect::MySql).create_collection(&posts).unwrap();
//! assert_eq!(
//!     create.sql(),
//!     "CREATE TABLE IF NOT EXISTS Posts (id INT PRIMARY KEY AUTO_INCREMENT, title VARCHAR(255));"
//! );
//! ```

pub mod builder;
pub mod dialect;
pub mod error;
pub mod reconcile;
pub mod registry;
pub mod schema;

pub use builder::{
    Column, CompareOp, Expr, Predicate, RowMap, SqlBuilder, SqlPayload, SqlValue, ToSqlValue,
};
pub use dialect::{Dialect, DialectRules, StatementTail};
pub use error::{CoreError, Result, ValueError};
pub use reconcile::LiveColumn;
pub use registry::Registry;
pub use schema::{
    ColumnDescriptor, Entity, EntityDescriptor, FieldValue, ReferenceDescriptor, SemanticType,
};
