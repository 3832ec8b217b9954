//! Native collections exposed through wrapped types.

use crate::iterable::PairIterationSource;
use crate::type_registry::TypeRecord;
use crate::wrappable::ScriptWrappable;
use crate::wrapper_types::{DOM_STRING_MAP, HTML_COLLECTION, URL_SEARCH_PARAMS};
use crate::ScriptContext;
use core_types::{array_index, JsError, ObjectId, Value};
use indexmap::IndexMap;
use memory_manager::{Trace, Visitor};
use std::any::Any;
use std::ffi::c_void;
use value_bridge::PointerKind;

macro_rules! impl_script_wrappable {
    ($ty:ty, $record:expr) => {
        impl ScriptWrappable for $ty {
            fn type_record(&self) -> &'static TypeRecord {
                &$record
            }

            fn as_any(&self) -> &dyn Any {
                self
            }

            fn as_any_mut(&mut self) -> &mut dyn Any {
                self
            }
        }
    };
}

/// Ordered name/value pairs of a query string (`URLSearchParams`).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchParams {
    pairs: Vec<(String, String)>,
}

impl SearchParams {
    /// An empty list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses `a=1&b=2`, with or without a leading `?`. `+` decodes to a
    /// space; a segment without `=` has an empty value.
    pub fn parse(query: &str) -> Self {
        let query = query.strip_prefix('?').unwrap_or(query);
        let pairs = query
            .split('&')
            .filter(|segment| !segment.is_empty())
            .map(|segment| {
                let (name, value) = segment.split_once('=').unwrap_or((segment, ""));
                (name.replace('+', " "), value.replace('+', " "))
            })
            .collect();
        Self { pairs }
    }

    /// Appends a pair.
    pub fn append(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.pairs.push((name.into(), value.into()));
    }

    /// The first value for `name`.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// The pair at `index`.
    pub fn pair(&self, index: usize) -> Option<&(String, String)> {
        self.pairs.get(index)
    }

    /// Number of pairs.
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    /// True when there are no pairs.
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

impl Trace for SearchParams {
    fn trace(&self, _: &mut Visitor) {}
}

impl_script_wrappable!(SearchParams, URL_SEARCH_PARAMS);

/// Pair source reading a wrapped [`SearchParams`] by position.
///
/// The source holds the wrapper, so the pairs stay alive while any
/// iterator over them does.
#[derive(Debug)]
pub struct SearchParamsIterationSource {
    owner: ObjectId,
    index: usize,
}

impl SearchParamsIterationSource {
    /// A source starting at the first pair of `owner`.
    pub fn new(owner: ObjectId) -> Self {
        Self { owner, index: 0 }
    }
}

impl Trace for SearchParamsIterationSource {
    fn trace(&self, visitor: &mut Visitor) {
        self.owner.trace(visitor);
    }
}

impl PairIterationSource for SearchParamsIterationSource {
    fn next_pair(&mut self, ctx: &mut ScriptContext) -> Result<Option<(Value, Value)>, JsError> {
        let index = self.index;
        let pair = ctx
            .with_wrappable(self.owner, |params: &SearchParams| params.pair(index).cloned())
            .ok_or_else(|| JsError::type_error("URLSearchParams is no longer available"))?;
        Ok(pair.map(|(name, value)| {
            self.index += 1;
            (Value::string(&name), Value::string(&value))
        }))
    }
}

/// A live list of objects (`HTMLCollection`).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ObjectList {
    items: Vec<ObjectId>,
}

impl ObjectList {
    /// A list over `items`.
    pub fn new(items: Vec<ObjectId>) -> Self {
        Self { items }
    }

    /// The item at `index`.
    pub fn item(&self, index: usize) -> Option<ObjectId> {
        self.items.get(index).copied()
    }

    /// Appends an item.
    pub fn push(&mut self, item: ObjectId) {
        self.items.push(item);
    }

    /// Number of items.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// True for an empty list.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl Trace for ObjectList {
    fn trace(&self, visitor: &mut Visitor) {
        self.items.trace(visitor);
    }
}

impl_script_wrappable!(ObjectList, HTML_COLLECTION);

pub(crate) fn object_list_indexed_get(
    ctx: &mut ScriptContext,
    object: ObjectId,
    index: u32,
) -> Result<Option<Value>, JsError> {
    Ok(ctx
        .with_wrappable(object, |list: &ObjectList| list.item(index as usize))
        .flatten()
        .map(Value::Object))
}

pub(crate) fn object_list_has(ctx: &ScriptContext, object: ObjectId, key: &str) -> bool {
    let Some(index) = array_index(key) else {
        return false;
    };
    ctx.with_wrappable(object, |list: &ObjectList| (index as usize) < list.len())
        .unwrap_or(false)
}

pub(crate) fn object_list_enumerate(ctx: &ScriptContext, object: ObjectId) -> Vec<String> {
    let len = ctx
        .with_wrappable(object, |list: &ObjectList| list.len())
        .unwrap_or(0);
    (0..len).map(|i| i.to_string()).collect()
}

/// String-to-string map behind named properties (`DOMStringMap`).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StringMap {
    entries: IndexMap<String, String>,
}

impl StringMap {
    /// An empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// The value for `name`.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries.get(name).map(String::as_str)
    }

    /// Inserts or replaces a value.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.entries.insert(name.into(), value.into());
    }

    /// Removes a value, returning whether it existed.
    pub fn remove(&mut self, name: &str) -> bool {
        self.entries.shift_remove(name).is_some()
    }

    /// Names in insertion order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }
}

impl Trace for StringMap {
    fn trace(&self, _: &mut Visitor) {}
}

impl_script_wrappable!(StringMap, DOM_STRING_MAP);

pub(crate) fn string_map_get(
    ctx: &mut ScriptContext,
    object: ObjectId,
    name: &str,
) -> Result<Option<Value>, JsError> {
    Ok(ctx
        .with_wrappable(object, |map: &StringMap| map.get(name).map(Value::string))
        .flatten())
}

pub(crate) fn string_map_set(
    ctx: &mut ScriptContext,
    object: ObjectId,
    name: &str,
    value: &Value,
) -> Result<bool, JsError> {
    let text = value.to_string();
    Ok(ctx
        .with_wrappable_mut(object, |map: &mut StringMap| map.set(name, text))
        .is_some())
}

pub(crate) fn string_map_delete(
    ctx: &mut ScriptContext,
    object: ObjectId,
    name: &str,
) -> Result<bool, JsError> {
    ctx.with_wrappable_mut(object, |map: &mut StringMap| {
        map.remove(name);
    });
    Ok(true)
}

pub(crate) fn string_map_has(ctx: &ScriptContext, object: ObjectId, name: &str) -> bool {
    ctx.with_wrappable(object, |map: &StringMap| map.get(name).is_some())
        .unwrap_or(false)
}

pub(crate) fn string_map_enumerate(ctx: &ScriptContext, object: ObjectId) -> Vec<String> {
    ctx.with_wrappable(object, |map: &StringMap| {
        map.names().map(str::to_string).collect()
    })
    .unwrap_or_default()
}

/// A host-owned object known only by address, such as a layout rectangle
/// or a canvas context.
///
/// The address is never dereferenced on this side.
#[derive(Debug, Clone)]
pub struct HostObject {
    record: &'static TypeRecord,
    address: usize,
    kind: PointerKind,
}

impl HostObject {
    /// Describes the host object at `address`.
    pub fn new(record: &'static TypeRecord, address: *const c_void, kind: PointerKind) -> Self {
        Self {
            record,
            address: address as usize,
            kind,
        }
    }

    /// The host address.
    pub fn address(&self) -> *const c_void {
        self.address as *const c_void
    }

    /// The pointer kind it arrived with.
    pub fn pointer_kind(&self) -> PointerKind {
        self.kind
    }
}

impl Trace for HostObject {
    fn trace(&self, _: &mut Visitor) {}
}

impl ScriptWrappable for HostObject {
    fn type_record(&self) -> &'static TypeRecord {
        self.record
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
