//! Per-class type identity and inheritance.
//!
//! Every exposed native class has exactly one `'static` [`TypeRecord`]. The
//! record names its parent, so subtype checks are a walk up an explicit
//! ancestor chain keyed by a small [`ClassId`] instead of runtime type
//! information. Records are immutable and shared by every context.

use crate::{BindingError, BindingResult, ScriptContext};
use core_types::{JsError, ObjectId, Value};
use std::collections::HashSet;
use std::fmt;

/// Small integer identifying a class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClassId(pub u16);

impl fmt::Display for ClassId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Indexed getter: `Ok(None)` falls back to the prototype chain.
pub type IndexedGetter = fn(&mut ScriptContext, ObjectId, u32) -> Result<Option<Value>, JsError>;
/// Indexed setter: `Ok(false)` falls back to ordinary assignment.
pub type IndexedSetter = fn(&mut ScriptContext, ObjectId, u32, &Value) -> Result<bool, JsError>;
/// Named getter: `Ok(None)` falls back to the prototype chain.
pub type NamedGetter = fn(&mut ScriptContext, ObjectId, &str) -> Result<Option<Value>, JsError>;
/// Named setter: `Ok(false)` falls back to ordinary assignment.
pub type NamedSetter = fn(&mut ScriptContext, ObjectId, &str, &Value) -> Result<bool, JsError>;
/// Named deleter, replacing ordinary deletion.
pub type NamedDeleter = fn(&mut ScriptContext, ObjectId, &str) -> Result<bool, JsError>;
/// Property check, replacing the ordinary `in` test.
pub type PropertyChecker = fn(&ScriptContext, ObjectId, &str) -> bool;
/// Own-key enumeration, replacing the ordinary key list.
pub type PropertyEnumerator = fn(&ScriptContext, ObjectId) -> Vec<String>;
/// Installs methods and accessors on a freshly created prototype and constructor.
pub type InstallMembers =
    fn(&mut ScriptContext, ObjectId, ObjectId) -> Result<(), JsError>;
/// Backs `new Type(...)`. Types without one are not constructible from script.
pub type ConstructFn = fn(&mut ScriptContext, &[Value]) -> Result<Value, JsError>;

/// Optional property-interception hooks of a wrapped type.
///
/// Getters and setters run before ordinary property resolution on the
/// wrapper itself. Indexed hooks see array-index keys, named hooks see every
/// other key (and index keys too when no indexed hook exists).
#[derive(Clone, Copy, Default)]
pub struct PropertyHooks {
    /// Indexed getter
    pub indexed_getter: Option<IndexedGetter>,
    /// Indexed setter
    pub indexed_setter: Option<IndexedSetter>,
    /// Named getter
    pub named_getter: Option<NamedGetter>,
    /// Named setter
    pub named_setter: Option<NamedSetter>,
    /// Named deleter
    pub named_deleter: Option<NamedDeleter>,
    /// `in` check
    pub has: Option<PropertyChecker>,
    /// Own-key enumeration
    pub enumerate: Option<PropertyEnumerator>,
}

impl PropertyHooks {
    /// No interception.
    pub const NONE: PropertyHooks = PropertyHooks {
        indexed_getter: None,
        indexed_setter: None,
        named_getter: None,
        named_setter: None,
        named_deleter: None,
        has: None,
        enumerate: None,
    };

    /// Whether any hook is present.
    pub fn is_empty(&self) -> bool {
        self.indexed_getter.is_none()
            && self.indexed_setter.is_none()
            && self.named_getter.is_none()
            && self.named_setter.is_none()
            && self.named_deleter.is_none()
            && self.has.is_none()
            && self.enumerate.is_none()
    }
}

impl fmt::Debug for PropertyHooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PropertyHooks")
            .field("indexed_getter", &self.indexed_getter.is_some())
            .field("indexed_setter", &self.indexed_setter.is_some())
            .field("named_getter", &self.named_getter.is_some())
            .field("named_setter", &self.named_setter.is_some())
            .field("named_deleter", &self.named_deleter.is_some())
            .field("has", &self.has.is_some())
            .field("enumerate", &self.enumerate.is_some())
            .finish()
    }
}

/// Static descriptor of one exposed native class.
///
/// # Examples
///
/// ```
/// use bindings::{ClassId, PropertyHooks, TypeRecord};
///
/// static BASE: TypeRecord = TypeRecord::new(ClassId(900), "Base", None);
/// static DERIVED: TypeRecord = TypeRecord::new(ClassId(901), "Derived", Some(&BASE));
///
/// assert!(DERIVED.is_subclass_of(&BASE));
/// assert!(!BASE.is_subclass_of(&DERIVED));
/// assert_eq!(DERIVED.depth(), 1);
/// ```
pub struct TypeRecord {
    /// Class identity
    pub class_id: ClassId,
    /// Script-visible class name
    pub name: &'static str,
    /// Parent class, `None` for a root
    pub parent: Option<&'static TypeRecord>,
    /// Property interception for instances
    pub hooks: PropertyHooks,
    /// Member installation for the prototype and constructor
    pub install_members: Option<InstallMembers>,
    /// Constructor behavior
    pub construct: Option<ConstructFn>,
}

impl TypeRecord {
    /// A record with no hooks, members or constructor behavior.
    pub const fn new(
        class_id: ClassId,
        name: &'static str,
        parent: Option<&'static TypeRecord>,
    ) -> Self {
        Self {
            class_id,
            name,
            parent,
            hooks: PropertyHooks::NONE,
            install_members: None,
            construct: None,
        }
    }

    /// Replaces the property hooks.
    pub const fn with_hooks(mut self, hooks: PropertyHooks) -> Self {
        self.hooks = hooks;
        self
    }

    /// Sets the member installer.
    pub const fn with_members(mut self, install: InstallMembers) -> Self {
        self.install_members = Some(install);
        self
    }

    /// Makes the type constructible from script.
    pub const fn with_constructor(mut self, construct: ConstructFn) -> Self {
        self.construct = Some(construct);
        self
    }

    /// Identity comparison.
    pub fn equals(&self, other: &TypeRecord) -> bool {
        std::ptr::eq(self, other)
    }

    /// Whether `ancestor` is `self` or appears on its parent chain.
    pub fn is_subclass_of(&self, ancestor: &TypeRecord) -> bool {
        self.ancestors().any(|record| record.equals(ancestor))
    }

    /// Iterates `self` followed by each parent up to the root.
    pub fn ancestors(&self) -> Ancestors<'_> {
        Ancestors { next: Some(self) }
    }

    /// Number of parents above this record.
    pub fn depth(&self) -> usize {
        self.ancestors().count() - 1
    }
}

impl fmt::Debug for TypeRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeRecord")
            .field("class_id", &self.class_id)
            .field("name", &self.name)
            .field("parent", &self.parent.map(|p| p.name))
            .finish()
    }
}

impl fmt::Display for TypeRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// Iterator over a record and its ancestors.
#[derive(Debug, Clone)]
pub struct Ancestors<'a> {
    next: Option<&'a TypeRecord>,
}

impl<'a> Iterator for Ancestors<'a> {
    type Item = &'a TypeRecord;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;
        self.next = current.parent;
        Some(current)
    }
}

/// Immutable table of every record exposed by a build.
#[derive(Debug, Clone, Copy)]
pub struct TypeTable {
    records: &'static [&'static TypeRecord],
}

impl TypeTable {
    /// Wraps a static list of records. Order is irrelevant.
    pub const fn new(records: &'static [&'static TypeRecord]) -> Self {
        Self { records }
    }

    /// Looks a record up by class id.
    pub fn get(&self, class_id: ClassId) -> Option<&'static TypeRecord> {
        self.records.iter().copied().find(|r| r.class_id == class_id)
    }

    /// Looks a record up by class name.
    pub fn by_name(&self, name: &str) -> Option<&'static TypeRecord> {
        self.records.iter().copied().find(|r| r.name == name)
    }

    /// Iterates the records in table order.
    pub fn iter(&self) -> impl Iterator<Item = &'static TypeRecord> + '_ {
        self.records.iter().copied()
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// True for an empty table.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Direct children of `record`, in table order.
    pub fn children_of(&self, record: &TypeRecord) -> Vec<&'static TypeRecord> {
        self.iter()
            .filter(|r| r.parent.is_some_and(|p| p.equals(record)))
            .collect()
    }

    /// Checks that class ids and names are unique, that every parent is
    /// registered, and that no parent chain loops.
    pub fn validate(&self) -> BindingResult<()> {
        let mut ids = HashSet::new();
        let mut names = HashSet::new();
        for record in self.iter() {
            if !ids.insert(record.class_id) {
                return Err(BindingError::DuplicateType(format!(
                    "class id {} ({})",
                    record.class_id, record.name
                )));
            }
            if !names.insert(record.name) {
                return Err(BindingError::DuplicateType(record.name.to_string()));
            }
        }
        for record in self.iter() {
            if let Some(parent) = record.parent {
                if !self.iter().any(|r| r.equals(parent)) {
                    return Err(BindingError::UnregisteredParent {
                        child: record.name,
                        parent: parent.name,
                    });
                }
            }
            let mut seen: Vec<&TypeRecord> = Vec::new();
            for ancestor in record.ancestors() {
                if seen.iter().any(|r| r.equals(ancestor)) {
                    return Err(BindingError::InheritanceCycle(record.name));
                }
                seen.push(ancestor);
            }
        }
        Ok(())
    }
}
