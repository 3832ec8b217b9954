//! Heap cells of the script engine stand-in.
//!
//! Every script-visible object is a [`ScriptObject`] stored in the context
//! heap. Properties keep insertion order, the prototype is a plain handle,
//! and the [`ObjectKind`] says what backs the object.

use crate::type_registry::TypeRecord;
use crate::wrappable::WrapperRef;
use crate::ScriptContext;
use core_types::{array_index, JsError, ObjectId, Value};
use indexmap::IndexMap;
use memory_manager::{Trace, Visitor};
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

/// Signature of every native function callable from script.
///
/// Arguments are the owning context, the `this` value and the call
/// arguments.
pub type NativeFn = Rc<dyn Fn(&mut ScriptContext, &Value, &[Value]) -> Result<Value, JsError>>;

/// A property slot.
#[derive(Debug, Clone, PartialEq)]
pub enum Property {
    /// Plain data property
    Data(Value),
    /// Getter/setter pair, each a callable object
    Accessor {
        /// Called with the receiver as `this`
        getter: Option<ObjectId>,
        /// Called with the receiver as `this` and the assigned value
        setter: Option<ObjectId>,
    },
}

/// A native function body plus its script-visible name.
#[derive(Clone)]
pub struct NativeFunction {
    /// Function name
    pub name: String,
    /// Body
    pub call: NativeFn,
}

impl fmt::Debug for NativeFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NativeFunction({})", self.name)
    }
}

/// Gap past the dense prefix up to which an index write still grows it.
const MAX_DENSE_GAP: usize = 1024;

/// Array element storage.
///
/// A dense prefix holds the common case. Writes far past it land in a sparse
/// map, and `length` is stored, so a large index or length costs nothing
/// until elements are actually written. Indices below `length` that hold no
/// element are holes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ArrayElements {
    dense: Vec<Value>,
    sparse: BTreeMap<u32, Value>,
    length: u32,
}

impl ArrayElements {
    /// Elements `0..items.len()`.
    pub fn from_vec(items: Vec<Value>) -> Self {
        let length = u32::try_from(items.len()).unwrap_or(u32::MAX);
        Self {
            dense: items,
            sparse: BTreeMap::new(),
            length,
        }
    }

    /// The array `length`.
    pub fn len(&self) -> u32 {
        self.length
    }

    /// True when `length` is zero.
    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    /// The element at `index`; `None` for holes and indices past the end.
    pub fn get(&self, index: u32) -> Option<&Value> {
        self.dense
            .get(index as usize)
            .or_else(|| self.sparse.get(&index))
    }

    /// Writes the element at `index`, extending `length` past it.
    pub fn set(&mut self, index: u32, value: Value) {
        let position = index as usize;
        if let Some(slot) = self.dense.get_mut(position) {
            *slot = value;
        } else if self.sparse.is_empty() && position - self.dense.len() <= MAX_DENSE_GAP {
            self.dense.resize(position, Value::Undefined);
            self.dense.push(value);
        } else {
            self.sparse.insert(index, value);
        }
        // Valid indices stop below u32::MAX.
        self.length = self.length.max(index + 1);
    }

    /// Sets `length`, dropping every element at or past it.
    pub fn set_length(&mut self, length: u32) {
        self.dense.truncate(length as usize);
        drop(self.sparse.split_off(&length));
        self.length = length;
    }

    /// Removes the element at `index`. A dense slot becomes `undefined`.
    pub fn remove(&mut self, index: u32) {
        match self.dense.get_mut(index as usize) {
            Some(slot) => *slot = Value::Undefined,
            None => {
                self.sparse.remove(&index);
            }
        }
    }

    /// Indices holding an element, ascending.
    pub fn indices(&self) -> impl Iterator<Item = u32> + '_ {
        (0..self.dense.len() as u32).chain(self.sparse.keys().copied())
    }

    /// Every stored element.
    pub fn values(&self) -> impl Iterator<Item = &Value> + '_ {
        self.dense.iter().chain(self.sparse.values())
    }

    /// All `length` slots, holes as `undefined`. Callers bound `length`
    /// first.
    pub fn to_vec(&self) -> Vec<Value> {
        let mut items = self.dense.clone();
        items.resize(self.length as usize, Value::Undefined);
        for (index, value) in &self.sparse {
            items[*index as usize] = value.clone();
        }
        items
    }
}

impl Trace for ArrayElements {
    fn trace(&self, visitor: &mut Visitor) {
        for value in self.values() {
            value.trace(visitor);
        }
    }
}

/// What backs a script object.
#[derive(Clone)]
pub enum ObjectKind {
    /// Ordinary object
    Ordinary,
    /// Array; `length` and index keys are virtual
    Array(ArrayElements),
    /// Native function
    Function(NativeFunction),
    /// Constructor of a registered type
    Constructor(&'static TypeRecord),
    /// Wrapper around a native object
    Wrapper(WrapperRef),
}

impl fmt::Debug for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ObjectKind::Ordinary => write!(f, "Ordinary"),
            ObjectKind::Array(elements) => write!(f, "Array(len={})", elements.len()),
            ObjectKind::Function(func) => func.fmt(f),
            ObjectKind::Constructor(record) => write!(f, "Constructor({})", record.name),
            ObjectKind::Wrapper(wrapper) => match wrapper.try_borrow() {
                Ok(inner) => write!(f, "Wrapper({})", inner.type_record().name),
                Err(_) => write!(f, "Wrapper(<borrowed>)"),
            },
        }
    }
}

/// A script object.
#[derive(Debug, Clone)]
pub struct ScriptObject {
    properties: IndexMap<String, Property>,
    prototype: Option<ObjectId>,
    kind: ObjectKind,
}

impl ScriptObject {
    /// Creates an object of `kind` with the given prototype.
    pub fn new(kind: ObjectKind, prototype: Option<ObjectId>) -> Self {
        Self {
            properties: IndexMap::new(),
            prototype,
            kind,
        }
    }

    /// The prototype handle.
    pub fn prototype(&self) -> Option<ObjectId> {
        self.prototype
    }

    pub(crate) fn set_prototype(&mut self, prototype: Option<ObjectId>) {
        self.prototype = prototype;
    }

    /// What backs the object.
    pub fn kind(&self) -> &ObjectKind {
        &self.kind
    }

    /// The wrapped native object, if any.
    pub fn wrapper(&self) -> Option<&WrapperRef> {
        match &self.kind {
            ObjectKind::Wrapper(wrapper) => Some(wrapper),
            _ => None,
        }
    }

    /// Whether calling the object is allowed.
    pub fn is_callable(&self) -> bool {
        matches!(self.kind, ObjectKind::Function(_) | ObjectKind::Constructor(_))
    }

    /// Array elements, if this is an array.
    pub fn elements(&self) -> Option<&ArrayElements> {
        match &self.kind {
            ObjectKind::Array(elements) => Some(elements),
            _ => None,
        }
    }

    /// Looks up an own property. Array `length` and elements are reported as
    /// data properties.
    pub fn own_property(&self, key: &str) -> Option<Property> {
        if let ObjectKind::Array(elements) = &self.kind {
            if key == "length" {
                return Some(Property::Data(Value::from_i64(i64::from(elements.len()))));
            }
            if let Some(index) = array_index(key) {
                return elements.get(index).cloned().map(Property::Data);
            }
        }
        self.properties.get(key).cloned()
    }

    /// Defines or replaces an own property.
    ///
    /// For arrays an index key writes the element and extends `length`, and
    /// `length` truncates or extends the array.
    pub fn define(&mut self, key: &str, property: Property) -> Result<(), JsError> {
        if let ObjectKind::Array(elements) = &mut self.kind {
            if key == "length" {
                let new_len = match &property {
                    Property::Data(value) => value
                        .as_number()
                        .filter(|n| n.fract() == 0.0 && *n >= 0.0 && *n <= u32::MAX as f64)
                        .ok_or_else(|| JsError::range_error("Invalid array length"))?,
                    Property::Accessor { .. } => {
                        return Err(JsError::type_error("Cannot redefine property: length"))
                    }
                };
                elements.set_length(new_len as u32);
                return Ok(());
            }
            if let (Some(index), Property::Data(value)) = (array_index(key), &property) {
                elements.set(index, value.clone());
                return Ok(());
            }
        }
        self.properties.insert(key.to_string(), property);
        Ok(())
    }

    /// Removes an own property. Array elements become `undefined`;
    /// `length` cannot be removed.
    pub fn remove(&mut self, key: &str) -> bool {
        if let ObjectKind::Array(elements) = &mut self.kind {
            if key == "length" {
                return false;
            }
            if let Some(index) = array_index(key) {
                elements.remove(index);
                return true;
            }
        }
        self.properties.shift_remove(key);
        true
    }

    /// Own keys: array indices first, then properties in insertion order.
    pub fn own_keys(&self) -> Vec<String> {
        let mut keys = Vec::new();
        if let ObjectKind::Array(elements) = &self.kind {
            keys.extend(elements.indices().map(|i| i.to_string()));
        }
        keys.extend(self.properties.keys().cloned());
        keys
    }
}

impl Trace for Property {
    fn trace(&self, visitor: &mut Visitor) {
        match self {
            Property::Data(value) => value.trace(visitor),
            Property::Accessor { getter, setter } => {
                getter.trace(visitor);
                setter.trace(visitor);
            }
        }
    }
}

impl Trace for ScriptObject {
    fn trace(&self, visitor: &mut Visitor) {
        self.prototype.trace(visitor);
        for property in self.properties.values() {
            property.trace(visitor);
        }
        match &self.kind {
            ObjectKind::Array(elements) => elements.trace(visitor),
            ObjectKind::Wrapper(wrapper) => wrapper.trace(visitor),
            ObjectKind::Ordinary | ObjectKind::Function(_) | ObjectKind::Constructor(_) => {}
        }
    }
}
