//! Command metadata.
//!
//! An append-only builder produces an immutable key/value store. Each node's
//! meta links to its parent's; lookups never cascade on their own, consumers
//! walk the chain when they want inheritance (permission propagation does).

use std::any::Any;
use std::collections::HashMap;
use std::marker::PhantomData;
use std::sync::Arc;

/// A typed, name-identified meta key.
///
/// Keys are declared as constants so the same key value is used for writing
/// and reading:
///
/// ```
/// use decli_core::meta::MetaKey;
/// pub const OWNER: MetaKey<String> = MetaKey::new("owner");
/// ```
pub struct MetaKey<V> {
    name: &'static str,
    _value: PhantomData<fn() -> V>,
}

impl<V> MetaKey<V> {
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            _value: PhantomData,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

/// Keys the tree builder writes on every node.
pub mod keys {
    use super::MetaKey;

    pub const NAME: MetaKey<String> = MetaKey::new("decli:name");
    pub const DESCRIPTION: MetaKey<String> = MetaKey::new("decli:description");
    pub const PERMISSION: MetaKey<String> = MetaKey::new("decli:permission");
}

/// Immutable metadata store with an optional parent link.
#[derive(Default)]
pub struct Meta {
    values: HashMap<&'static str, Box<dyn Any + Send + Sync>>,
    parent: Option<Arc<Meta>>,
}

impl Meta {
    pub fn builder() -> MetaBuilder {
        MetaBuilder::default()
    }

    pub fn get<V: 'static>(&self, key: &MetaKey<V>) -> Option<&V> {
        self.values.get(key.name).and_then(|v| v.downcast_ref())
    }

    pub fn get_or<'a, V: 'static>(&'a self, key: &MetaKey<V>, default: &'a V) -> &'a V {
        self.get(key).unwrap_or(default)
    }

    pub fn is_present<V: 'static>(&self, key: &MetaKey<V>) -> bool {
        self.get(key).is_some()
    }

    pub fn parent(&self) -> Option<&Meta> {
        self.parent.as_deref()
    }

    /// All values for `key` from this meta up through the parent chain,
    /// nearest first.
    pub fn chain<V: 'static>(&self, key: &MetaKey<V>) -> Vec<&V> {
        let mut out = Vec::new();
        let mut meta = Some(self);
        while let Some(current) = meta {
            if let Some(value) = current.get(key) {
                out.push(value);
            }
            meta = current.parent();
        }
        out
    }
}

impl std::fmt::Debug for Meta {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Meta")
            .field("keys", &self.values.keys().collect::<Vec<_>>())
            .field("has_parent", &self.parent.is_some())
            .finish()
    }
}

/// Builder for [`Meta`]; terminal `build` seals the store.
#[derive(Default)]
pub struct MetaBuilder {
    values: HashMap<&'static str, Box<dyn Any + Send + Sync>>,
    parent: Option<Arc<Meta>>,
}

impl MetaBuilder {
    pub fn parent(mut self, parent: Arc<Meta>) -> Self {
        self.parent = Some(parent);
        self
    }

    pub fn add<V: Send + Sync + 'static>(mut self, key: &MetaKey<V>, value: V) -> Self {
        self.values.insert(key.name, Box::new(value));
        self
    }

    pub fn build(self) -> Meta {
        Meta {
            values: self.values,
            parent: self.parent,
        }
    }
}
