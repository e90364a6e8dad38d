//! Memoized entity metadata.

use std::any::TypeId;
use std::sync::{Arc, OnceLock};

use dashmap::DashMap;

use crate::schema::{ColumnDescriptor, Entity, EntityDescriptor};

/// Cache of entity descriptors keyed by Rust type.
///
/// Each type is described at most once per registry; every later lookup
/// returns the same `Arc`. Concurrent first lookups of a type race on a
/// single shard entry, so only one descriptor is ever stored.
#[derive(Debug, Default)]
pub struct Registry {
    descriptors: DashMap<TypeId, Arc<EntityDescriptor>>,
}

static GLOBAL: OnceLock<Arc<Registry>> = OnceLock::new();

impl Registry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide registry, shared by connections that are not given
    /// one of their own.
    pub fn global() -> Arc<Self> {
        Arc::clone(GLOBAL.get_or_init(|| Arc::new(Self::new())))
    }

    /// Returns the descriptor of `T`, describing it on first use.
    pub fn descriptor<T: Entity>(&self) -> Arc<EntityDescriptor> {
        let key = TypeId::of::<T>();
        if let Some(found) = self.descriptors.get(&key) {
            return Arc::clone(found.value());
        }
        let entry = self
            .descriptors
            .entry(key)
            .or_insert_with(|| Arc::new(T::describe()));
        Arc::clone(entry.value())
    }

    /// Table name of `T`.
    pub fn table_name<T: Entity>(&self) -> &'static str {
        self.descriptor::<T>().table_name()
    }

    /// Columns of `T` in declaration order.
    pub fn columns<T: Entity>(&self) -> Vec<ColumnDescriptor> {
        self.descriptor::<T>().columns().to_vec()
    }

    /// Primary-key column of `T`, if any.
    pub fn primary_key<T: Entity>(&self) -> Option<ColumnDescriptor> {
        self.descriptor::<T>().primary_key().copied()
    }

    /// Number of described types.
    #[must_use]
    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    /// Returns `true` if no type has been described yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;

    use super::*;
    use crate::builder::value::SqlValue;
    use crate::error::ValueError;
    use crate::schema::SemanticType;

    static DESCRIBE_CALLS: AtomicUsize = AtomicUsize::new(0);

    #[derive(Default)]
    struct Tag;

    impl Entity for Tag {
        fn describe() -> EntityDescriptor {
            DESCRIBE_CALLS.fetch_add(1, Ordering::SeqCst);
            EntityDescriptor::new(
                "Tag",
                Some("Tags"),
                vec![ColumnDescriptor::new("label", "label", SemanticType::Text)],
                vec![],
            )
        }

        fn column_values(&self) -> Vec<SqlValue> {
            vec![SqlValue::Null]
        }

        fn assign(&mut self, index: usize, _value: SqlValue) -> Result<(), ValueError> {
            Err(ValueError::UnknownColumn(index))
        }
    }

    #[test]
    fn test_descriptor_identity() {
        let registry = Registry::new();
        let a = registry.descriptor::<Tag>();
        let b = registry.descriptor::<Tag>();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(registry.table_name::<Tag>(), "Tags");
        assert_eq!(registry.columns::<Tag>().len(), 1);
        assert!(registry.primary_key::<Tag>().is_none());
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_global_is_shared() {
        assert!(Arc::ptr_eq(&Registry::global(), &Registry::global()));
    }

    #[test]
    fn test_concurrent_first_touch_stores_one_descriptor() {
        let registry = Arc::new(Registry::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let registry = Arc::clone(&registry);
                thread::spawn(move || registry.descriptor::<Tag>())
            })
            .collect();
        let descriptors: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        for d in &descriptors[1..] {
            assert!(Arc::ptr_eq(&descriptors[0], d));
        }
        assert!(DESCRIBE_CALLS.load(Ordering::SeqCst) >= 1);
    }
}
