//! Entity metadata: semantic types, field conversions and descriptors.

mod entity;
mod field;

pub use entity::{
    ColumnDescriptor, Entity, EntityDescriptor, ReferenceDescriptor, hash_record, records_equal,
};
pub use field::{FieldValue, SemanticType, parse_timestamp};
