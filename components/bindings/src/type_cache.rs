//! Per-context cache of realized constructors and prototypes.

use crate::type_registry::{ClassId, TypeRecord};
use core_types::ObjectId;
use memory_manager::{Trace, Visitor};
use std::collections::HashMap;

/// The constructor and prototype realized for one type in one context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TypeCacheEntry {
    /// Constructor object
    pub constructor: ObjectId,
    /// Prototype object
    pub prototype: ObjectId,
}

/// Map from class id to the realized [`TypeCacheEntry`].
///
/// At most one entry exists per record, and every entry is a collection
/// root for as long as the context lives.
#[derive(Debug, Default)]
pub struct ContextTypeCache {
    entries: HashMap<ClassId, TypeCacheEntry>,
}

impl ContextTypeCache {
    /// Creates an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// The entry realized for `record`.
    pub fn get(&self, record: &TypeRecord) -> Option<TypeCacheEntry> {
        self.entries.get(&record.class_id).copied()
    }

    /// Whether `record` has been realized.
    pub fn contains(&self, record: &TypeRecord) -> bool {
        self.entries.contains_key(&record.class_id)
    }

    /// Records the entry for `record`, keeping an existing one.
    ///
    /// Returns the entry that is cached afterwards.
    pub fn insert(&mut self, record: &TypeRecord, entry: TypeCacheEntry) -> TypeCacheEntry {
        *self.entries.entry(record.class_id).or_insert(entry)
    }

    /// Number of realized types.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when nothing is realized.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drops every entry.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

impl Trace for TypeCacheEntry {
    fn trace(&self, visitor: &mut Visitor) {
        self.constructor.trace(visitor);
        self.prototype.trace(visitor);
    }
}

impl Trace for ContextTypeCache {
    fn trace(&self, visitor: &mut Visitor) {
        for entry in self.entries.values() {
            entry.trace(visitor);
        }
    }
}
