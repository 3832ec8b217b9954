//! The per-context owner of engine state.
//!
//! A [`ScriptContext`] exclusively owns its object heap, global object,
//! type cache, microtask queue, native-function records and binding-object
//! table. Everything here is single-threaded: the context and every handle
//! into it stay on the thread that created it.

use crate::native_function::{NativeFunctionList, PendingInvocations};
use crate::object::{ArrayElements, NativeFunction, ObjectKind, Property, ScriptObject};
use crate::type_cache::{ContextTypeCache, TypeCacheEntry};
use crate::type_registry::{PropertyHooks, TypeRecord};
use crate::wrappable::{wrapper_ref, ScriptWrappable, WrapperRef};
use crate::{BindingError, BindingResult, ContextOptions};
use async_runtime::{Microtask, MicrotaskQueue};
use core_types::{array_index, JsError, ObjectId, Value};
use memory_manager::{AliveStatus, GcStats, Heap, Trace, Visitor};
use std::cell::Cell;
use std::collections::HashMap;
use std::ffi::c_void;
use std::fmt;
use std::rc::Rc;

/// Liveness flag shared with records that outlive a borrow of the context.
#[derive(Debug)]
pub(crate) struct ContextToken {
    alive: Cell<bool>,
}

impl ContextToken {
    pub(crate) fn is_alive(&self) -> bool {
        self.alive.get()
    }
}

#[derive(Debug, Clone, Copy)]
struct BindingEntry {
    object: ObjectId,
    holds: usize,
}

/// One script context.
///
/// # Examples
///
/// ```
/// use bindings::{ContextOptions, ScriptContext};
/// use core_types::Value;
///
/// let mut ctx = ScriptContext::new(ContextOptions::default());
/// let object = ctx.create_object();
/// ctx.set_property(object, "answer", Value::Smi(42)).unwrap();
/// assert_eq!(ctx.get_property(object, "answer").unwrap(), Value::Smi(42));
/// ```
pub struct ScriptContext {
    heap: Heap<ScriptObject>,
    global: ObjectId,
    object_prototype: ObjectId,
    function_prototype: ObjectId,
    array_prototype: ObjectId,
    type_cache: ContextTypeCache,
    microtasks: MicrotaskQueue<ScriptContext>,
    functions: NativeFunctionList,
    pending_invocations: PendingInvocations,
    binding_objects: HashMap<usize, BindingEntry>,
    options: ContextOptions,
    installed: bool,
    disposed: bool,
    token: Rc<ContextToken>,
}

impl ScriptContext {
    /// Creates a context with fresh intrinsics and an empty global object.
    pub fn new(options: ContextOptions) -> Self {
        let mut heap = Heap::new();
        let object_prototype = heap.allocate(ScriptObject::new(ObjectKind::Ordinary, None));
        let function_prototype =
            heap.allocate(ScriptObject::new(ObjectKind::Ordinary, Some(object_prototype)));
        let array_prototype =
            heap.allocate(ScriptObject::new(ObjectKind::Ordinary, Some(object_prototype)));
        let global = heap.allocate(ScriptObject::new(ObjectKind::Ordinary, Some(object_prototype)));
        let ctx = Self {
            heap,
            global,
            object_prototype,
            function_prototype,
            array_prototype,
            type_cache: ContextTypeCache::new(),
            microtasks: MicrotaskQueue::for_context(),
            functions: NativeFunctionList::default(),
            pending_invocations: PendingInvocations::default(),
            binding_objects: HashMap::new(),
            options,
            installed: false,
            disposed: false,
            token: Rc::new(ContextToken {
                alive: Cell::new(true),
            }),
        };
        log::debug!("created script context {:#x}", ctx.id());
        ctx
    }

    /// Identity of this context, stable while it lives.
    pub fn id(&self) -> usize {
        Rc::as_ptr(&self.token) as usize
    }

    /// The options the context was created with.
    pub fn options(&self) -> &ContextOptions {
        &self.options
    }

    /// The global object.
    pub fn global(&self) -> ObjectId {
        self.global
    }

    /// `Object.prototype`
    pub fn object_prototype(&self) -> ObjectId {
        self.object_prototype
    }

    /// `Function.prototype`
    pub fn function_prototype(&self) -> ObjectId {
        self.function_prototype
    }

    /// `Array.prototype`
    pub fn array_prototype(&self) -> ObjectId {
        self.array_prototype
    }

    pub(crate) fn token(&self) -> &Rc<ContextToken> {
        &self.token
    }

    pub(crate) fn functions(&self) -> &NativeFunctionList {
        &self.functions
    }

    pub(crate) fn pending_invocations_mut(&mut self) -> &mut PendingInvocations {
        &mut self.pending_invocations
    }

    /// Number of asynchronous function-reference invocations not yet run.
    pub fn pending_invocations(&self) -> usize {
        self.pending_invocations.len()
    }

    pub(crate) fn functions_mut(&mut self) -> &mut NativeFunctionList {
        &mut self.functions
    }

    // ---- objects -------------------------------------------------------

    /// Resolves a handle. `None` once the object has been collected.
    pub fn object(&self, id: ObjectId) -> Option<&ScriptObject> {
        self.heap.get(id)
    }

    /// Number of live objects in the heap.
    pub fn live_objects(&self) -> usize {
        self.heap.len()
    }

    fn object_ref(&self, id: ObjectId) -> Result<&ScriptObject, JsError> {
        self.heap.get(id).ok_or_else(|| stale_handle(id))
    }

    fn object_mut(&mut self, id: ObjectId) -> Result<&mut ScriptObject, JsError> {
        self.heap.get_mut(id).ok_or_else(|| stale_handle(id))
    }

    /// Creates an ordinary object inheriting from `Object.prototype`.
    pub fn create_object(&mut self) -> ObjectId {
        self.create_object_with_proto(Some(self.object_prototype))
    }

    /// Creates an ordinary object with the given prototype.
    pub fn create_object_with_proto(&mut self, prototype: Option<ObjectId>) -> ObjectId {
        self.heap
            .allocate(ScriptObject::new(ObjectKind::Ordinary, prototype))
    }

    /// Creates an array holding `items`.
    pub fn create_array(&mut self, items: Vec<Value>) -> ObjectId {
        self.heap.allocate(ScriptObject::new(
            ObjectKind::Array(ArrayElements::from_vec(items)),
            Some(self.array_prototype),
        ))
    }

    /// Creates a native function object.
    ///
    /// The body must not capture object handles: nothing traces a closure.
    /// Handles it needs come through `this` or the arguments.
    pub fn create_function<F>(&mut self, name: &str, f: F) -> ObjectId
    where
        F: Fn(&mut ScriptContext, &Value, &[Value]) -> Result<Value, JsError> + 'static,
    {
        let mut function = ScriptObject::new(
            ObjectKind::Function(NativeFunction {
                name: name.to_string(),
                call: Rc::new(f),
            }),
            Some(self.function_prototype),
        );
        // Plain objects never reject a data define.
        let _ = function.define("name", Property::Data(Value::string(name)));
        self.heap.allocate(function)
    }

    /// Defines an own property without running setters or hooks.
    pub fn define_property(
        &mut self,
        target: ObjectId,
        key: &str,
        property: Property,
    ) -> Result<(), JsError> {
        self.object_mut(target)?.define(key, property)
    }

    /// Creates a native function and stores it as a data property of `target`.
    pub fn define_method<F>(&mut self, target: ObjectId, name: &str, f: F) -> Result<ObjectId, JsError>
    where
        F: Fn(&mut ScriptContext, &Value, &[Value]) -> Result<Value, JsError> + 'static,
    {
        let function = self.create_function(name, f);
        self.define_property(target, name, Property::Data(Value::Object(function)))?;
        Ok(function)
    }

    /// Defines an accessor property from existing callables.
    pub fn define_accessor(
        &mut self,
        target: ObjectId,
        name: &str,
        getter: Option<ObjectId>,
        setter: Option<ObjectId>,
    ) -> Result<(), JsError> {
        self.define_property(target, name, Property::Accessor { getter, setter })
    }

    /// Defines a read-only accessor backed by a native getter.
    pub fn define_getter<F>(&mut self, target: ObjectId, name: &str, f: F) -> Result<(), JsError>
    where
        F: Fn(&mut ScriptContext, &Value, &[Value]) -> Result<Value, JsError> + 'static,
    {
        let getter = self.create_function(&format!("get {}", name), f);
        self.define_accessor(target, name, Some(getter), None)
    }

    // ---- property access -----------------------------------------------

    fn hooks_of(&self, id: ObjectId) -> Result<Option<PropertyHooks>, JsError> {
        match self.object_ref(id)?.wrapper() {
            Some(wrapper) => {
                let native = wrapper
                    .try_borrow()
                    .map_err(|_| JsError::internal_error("wrapped object is busy"))?;
                let hooks = native.type_record().hooks;
                Ok((!hooks.is_empty()).then_some(hooks))
            }
            None => Ok(None),
        }
    }

    /// Reads `object[key]`.
    ///
    /// Interceptors of a wrapped type run first: an indexed getter for
    /// array-index keys, otherwise a named getter. When the interceptor
    /// yields nothing the prototype chain is consulted with `object` as
    /// receiver.
    pub fn get_property(&mut self, object: ObjectId, key: &str) -> Result<Value, JsError> {
        if let Some(hooks) = self.hooks_of(object)? {
            let intercepted = match (array_index(key), hooks.indexed_getter, hooks.named_getter) {
                (Some(index), Some(getter), _) => getter(self, object, index)?,
                (_, _, Some(getter)) => getter(self, object, key)?,
                _ => None,
            };
            if let Some(value) = intercepted {
                return Ok(value);
            }
        }
        self.ordinary_get(object, key, &Value::Object(object))
    }

    /// Reads `value[key]` for any value; primitives have no properties here.
    pub fn get_value_property(&mut self, value: &Value, key: &str) -> Result<Value, JsError> {
        match value {
            Value::Object(id) => self.get_property(*id, key),
            Value::Undefined | Value::Null => Err(JsError::type_error(format!(
                "Cannot read properties of {} (reading '{}')",
                value, key
            ))),
            _ => Ok(Value::Undefined),
        }
    }

    fn ordinary_get(&mut self, start: ObjectId, key: &str, receiver: &Value) -> Result<Value, JsError> {
        let mut current = Some(start);
        while let Some(id) = current {
            let object = self.object_ref(id)?;
            match object.own_property(key) {
                Some(Property::Data(value)) => return Ok(value),
                Some(Property::Accessor { getter, .. }) => {
                    return match getter {
                        Some(getter) => self.call_function(getter, receiver, &[]),
                        None => Ok(Value::Undefined),
                    }
                }
                None => current = object.prototype(),
            }
        }
        Ok(Value::Undefined)
    }

    /// Writes `object[key] = value`, returning whether the write happened.
    ///
    /// A wrapped type's setter interceptor runs first. If it declines, only
    /// an accessor setter found on the prototype chain can take the write.
    /// Objects without interceptors follow ordinary assignment: an accessor
    /// on the chain runs its setter (or refuses when it has none), anything
    /// else becomes an own data property.
    pub fn set_property(&mut self, object: ObjectId, key: &str, value: Value) -> Result<bool, JsError> {
        if let Some(hooks) = self.hooks_of(object)? {
            let handled = match (array_index(key), hooks.indexed_setter, hooks.named_setter) {
                (Some(index), Some(setter), _) => Some(setter(self, object, index, &value)?),
                (_, _, Some(setter)) => Some(setter(self, object, key, &value)?),
                _ => None,
            };
            match handled {
                Some(true) => return Ok(true),
                Some(false) => {
                    let start = self.object_ref(object)?.prototype();
                    return match self.find_setter(start, key)? {
                        Some(setter) => {
                            self.call_function(setter, &Value::Object(object), &[value])?;
                            Ok(true)
                        }
                        None => Ok(false),
                    };
                }
                None => {}
            }
        }
        self.ordinary_set(object, key, value)
    }

    fn ordinary_set(&mut self, object: ObjectId, key: &str, value: Value) -> Result<bool, JsError> {
        let mut current = Some(object);
        while let Some(id) = current {
            let holder = self.object_ref(id)?;
            match holder.own_property(key) {
                Some(Property::Accessor { setter, .. }) => {
                    return match setter {
                        Some(setter) => {
                            self.call_function(setter, &Value::Object(object), &[value])?;
                            Ok(true)
                        }
                        None => Ok(false),
                    }
                }
                Some(Property::Data(_)) => break,
                None => current = holder.prototype(),
            }
        }
        self.object_mut(object)?.define(key, Property::Data(value))?;
        Ok(true)
    }

    fn find_setter(&self, start: Option<ObjectId>, key: &str) -> Result<Option<ObjectId>, JsError> {
        let mut current = start;
        while let Some(id) = current {
            let object = self.object_ref(id)?;
            match object.own_property(key) {
                Some(Property::Accessor { setter, .. }) => return Ok(setter),
                Some(Property::Data(_)) => return Ok(None),
                None => current = object.prototype(),
            }
        }
        Ok(None)
    }

    /// `key in object`. A `has` interceptor answers first; keys it does not
    /// claim fall through to the chain walk.
    pub fn has_property(&self, object: ObjectId, key: &str) -> Result<bool, JsError> {
        if let Some(has) = self.hooks_of(object)?.and_then(|hooks| hooks.has) {
            if has(self, object, key) {
                return Ok(true);
            }
        }
        let mut current = Some(object);
        while let Some(id) = current {
            let holder = self.object_ref(id)?;
            if holder.own_property(key).is_some() {
                return Ok(true);
            }
            current = holder.prototype();
        }
        Ok(false)
    }

    /// `delete object[key]`. A named deleter replaces ordinary deletion.
    pub fn delete_property(&mut self, object: ObjectId, key: &str) -> Result<bool, JsError> {
        if let Some(deleter) = self.hooks_of(object)?.and_then(|hooks| hooks.named_deleter) {
            return deleter(self, object, key);
        }
        Ok(self.object_mut(object)?.remove(key))
    }

    /// Own enumerable keys. An enumerate interceptor replaces the
    /// ordinary key list.
    pub fn own_keys(&self, object: ObjectId) -> Result<Vec<String>, JsError> {
        if let Some(enumerate) = self.hooks_of(object)?.and_then(|hooks| hooks.enumerate) {
            return Ok(enumerate(self, object));
        }
        Ok(self.object_ref(object)?.own_keys())
    }

    /// The prototype of `object`.
    pub fn prototype_of(&self, object: ObjectId) -> Result<Option<ObjectId>, JsError> {
        Ok(self.object_ref(object)?.prototype())
    }

    /// Replaces the prototype of `object`, rejecting cycles.
    pub fn set_prototype_of(&mut self, object: ObjectId, prototype: Option<ObjectId>) -> Result<(), JsError> {
        let mut current = prototype;
        while let Some(id) = current {
            if id == object {
                return Err(JsError::type_error("Cyclic __proto__ value"));
            }
            current = self.object_ref(id)?.prototype();
        }
        self.object_mut(object)?.set_prototype(prototype);
        Ok(())
    }

    // ---- calls ---------------------------------------------------------

    /// Whether `value` is a callable object.
    pub fn is_callable(&self, value: &Value) -> bool {
        value
            .as_object()
            .and_then(|id| self.heap.get(id))
            .is_some_and(|object| matches!(object.kind(), ObjectKind::Function(_)))
    }

    /// Calls `function` with `this` and `args`.
    pub fn call_function(&mut self, function: ObjectId, this: &Value, args: &[Value]) -> Result<Value, JsError> {
        let call = match self.object_ref(function)?.kind() {
            ObjectKind::Function(native) => Rc::clone(&native.call),
            ObjectKind::Constructor(record) => {
                return Err(JsError::type_error(format!(
                    "Failed to construct '{}': Please use the 'new' operator, this DOM object constructor cannot be called as a function.",
                    record.name
                )))
            }
            _ => return Err(JsError::type_error(format!("{} is not a function", function))),
        };
        call(self, this, args)
    }

    /// Calls any value, failing for non-callables.
    pub fn call_value(&mut self, function: &Value, this: &Value, args: &[Value]) -> Result<Value, JsError> {
        match function {
            Value::Object(id) => self.call_function(*id, this, args),
            other => Err(JsError::type_error(format!("{} is not a function", other))),
        }
    }

    /// `new constructor(...args)`.
    ///
    /// Registered types without construct behavior throw
    /// "Illegal constructor".
    pub fn construct(&mut self, constructor: ObjectId, args: &[Value]) -> Result<Value, JsError> {
        let record = match self.object_ref(constructor)?.kind() {
            ObjectKind::Constructor(record) => *record,
            _ => return Err(JsError::type_error(format!("{} is not a constructor", constructor))),
        };
        match record.construct {
            Some(construct) => construct(self, args),
            None => Err(JsError::type_error("Illegal constructor")),
        }
    }

    // ---- wrappers ------------------------------------------------------

    /// Creates the script wrapper for a native object.
    ///
    /// The wrapper's prototype is the cached prototype of the object's type,
    /// realized on first use. Fails once the context is disposed.
    pub fn wrap(&mut self, native: WrapperRef) -> Result<ObjectId, JsError> {
        if self.disposed {
            return Err(JsError::internal_error("script context is disposed"));
        }
        let record = native
            .try_borrow()
            .map_err(|_| JsError::internal_error("wrapped object is busy"))?
            .type_record();
        let prototype = self.prototype_for_type(record)?;
        Ok(self.heap.allocate(ScriptObject::new(
            ObjectKind::Wrapper(native),
            Some(prototype),
        )))
    }

    /// Moves `native` behind a wrapper and wraps it.
    pub fn wrap_native<T: ScriptWrappable>(&mut self, native: T) -> Result<ObjectId, JsError> {
        self.wrap(wrapper_ref(native))
    }

    /// The native object behind a wrapper.
    pub fn wrappable(&self, id: ObjectId) -> Option<WrapperRef> {
        self.heap.get(id)?.wrapper().cloned()
    }

    /// Runs `f` on the native `T` behind a wrapper.
    ///
    /// `None` when `id` is not a live wrapper of `T` or the native object is
    /// mutably borrowed.
    pub fn with_wrappable<T: 'static, R>(&self, id: ObjectId, f: impl FnOnce(&T) -> R) -> Option<R> {
        let wrapper = self.heap.get(id)?.wrapper()?;
        let guard = wrapper.try_borrow().ok()?;
        let native = guard.as_any().downcast_ref::<T>()?;
        Some(f(native))
    }

    /// Mutable counterpart of [`ScriptContext::with_wrappable`].
    pub fn with_wrappable_mut<T: 'static, R>(
        &self,
        id: ObjectId,
        f: impl FnOnce(&mut T) -> R,
    ) -> Option<R> {
        let wrapper = self.heap.get(id)?.wrapper()?;
        let mut guard = wrapper.try_borrow_mut().ok()?;
        let native = guard.as_any_mut().downcast_mut::<T>()?;
        Some(f(native))
    }

    /// Whether `value` is an instance of `record` or one of its subtypes.
    ///
    /// Wrappers answer from their native type; other objects from their
    /// prototype chain.
    pub fn is_instance_of(&self, value: &Value, record: &'static TypeRecord) -> bool {
        let Some(id) = value.as_object() else {
            return false;
        };
        let Some(object) = self.heap.get(id) else {
            return false;
        };
        if let Some(wrapper) = object.wrapper() {
            if let Ok(native) = wrapper.try_borrow() {
                return native.type_record().is_subclass_of(record);
            }
        }
        let Some(entry) = self.type_cache.get(record) else {
            return false;
        };
        let mut current = object.prototype();
        while let Some(proto) = current {
            if proto == entry.prototype {
                return true;
            }
            current = self.heap.get(proto).and_then(ScriptObject::prototype);
        }
        false
    }

    // ---- types ---------------------------------------------------------

    /// The realized types of this context.
    pub fn type_cache(&self) -> &ContextTypeCache {
        &self.type_cache
    }

    /// The prototype of `record`, realizing it and its ancestors top-down
    /// when needed.
    pub fn prototype_for_type(&mut self, record: &'static TypeRecord) -> Result<ObjectId, JsError> {
        Ok(self.realize_type(record)?.prototype)
    }

    /// The constructor of `record`, realizing it when needed.
    pub fn constructor_for_type(&mut self, record: &'static TypeRecord) -> Result<ObjectId, JsError> {
        Ok(self.realize_type(record)?.constructor)
    }

    fn realize_type(&mut self, record: &'static TypeRecord) -> Result<TypeCacheEntry, JsError> {
        if let Some(entry) = self.type_cache.get(record) {
            return Ok(entry);
        }
        let (parent_prototype, parent_constructor) = match record.parent {
            Some(parent) => {
                let entry = self.realize_type(parent)?;
                (entry.prototype, entry.constructor)
            }
            None => (self.object_prototype, self.function_prototype),
        };
        self.create_type_entry(record, parent_prototype, parent_constructor)
    }

    /// Realizes `record`, requiring its parent to be realized already.
    pub fn install_type(&mut self, record: &'static TypeRecord) -> BindingResult<TypeCacheEntry> {
        if self.disposed {
            return Err(BindingError::ContextDisposed);
        }
        if let Some(entry) = self.type_cache.get(record) {
            return Ok(entry);
        }
        let (parent_prototype, parent_constructor) = match record.parent {
            Some(parent) => {
                let entry = self.type_cache.get(parent).ok_or(BindingError::ParentNotInstalled {
                    child: record.name,
                    parent: parent.name,
                })?;
                (entry.prototype, entry.constructor)
            }
            None => (self.object_prototype, self.function_prototype),
        };
        Ok(self.create_type_entry(record, parent_prototype, parent_constructor)?)
    }

    fn create_type_entry(
        &mut self,
        record: &'static TypeRecord,
        parent_prototype: ObjectId,
        parent_constructor: ObjectId,
    ) -> Result<TypeCacheEntry, JsError> {
        let prototype = self.create_object_with_proto(Some(parent_prototype));
        let constructor = self.heap.allocate(ScriptObject::new(
            ObjectKind::Constructor(record),
            Some(parent_constructor),
        ));
        self.define_property(constructor, "prototype", Property::Data(Value::Object(prototype)))?;
        self.define_property(constructor, "name", Property::Data(Value::string(record.name)))?;
        self.define_property(prototype, "constructor", Property::Data(Value::Object(constructor)))?;
        let entry = self.type_cache.insert(
            record,
            TypeCacheEntry {
                constructor,
                prototype,
            },
        );
        if let Some(install_members) = record.install_members {
            install_members(self, prototype, constructor)?;
        }
        log::debug!("realized {} (class {})", record.name, record.class_id);
        Ok(entry)
    }

    // ---- lifetime ------------------------------------------------------

    /// Adds a keep-alive hold on `object`.
    pub fn keep_alive(&mut self, object: ObjectId) -> Option<AliveStatus> {
        self.heap.keep_alive(object)
    }

    /// Removes one keep-alive hold.
    pub fn release_alive(&mut self, object: ObjectId) -> bool {
        self.heap.release_alive(object)
    }

    /// The liveness status of `object`.
    pub fn alive_status(&self, object: ObjectId) -> Option<AliveStatus> {
        self.heap.status(object)
    }

    /// Runs a full collection.
    ///
    /// Roots are the global object, the intrinsics, the type cache, the
    /// callables of live native-function records and every keep-alive hold
    /// (binding objects included).
    pub fn collect_garbage(&mut self) -> GcStats {
        let mut visitor = Visitor::new();
        for root in [
            self.global,
            self.object_prototype,
            self.function_prototype,
            self.array_prototype,
        ] {
            visitor.visit(root);
        }
        self.type_cache.trace(&mut visitor);
        self.functions.trace(&mut visitor);
        self.heap.collect_from(visitor)
    }

    // ---- binding objects -----------------------------------------------

    /// Publishes a wrapper to the host and returns its address.
    ///
    /// The address is the native object's, so the same native object always
    /// maps to the same address. Each registration adds a keep-alive hold.
    pub fn register_binding_object(&mut self, object: ObjectId) -> Result<*const c_void, JsError> {
        let wrapper = self
            .wrappable(object)
            .ok_or_else(|| JsError::type_error(format!("{} is not a bindable object", object)))?;
        let address = Rc::as_ptr(&wrapper) as *const () as usize;
        self.heap.keep_alive(object);
        let entry = self.binding_objects.entry(address).or_insert(BindingEntry {
            object,
            holds: 0,
        });
        if entry.object != object {
            // Re-wrapped native object: the newest wrapper answers.
            let previous = std::mem::replace(entry, BindingEntry { object, holds: 0 });
            for _ in 0..previous.holds {
                self.heap.release_alive(previous.object);
            }
        }
        entry.holds += 1;
        Ok(address as *const c_void)
    }

    /// Resolves an address published by
    /// [`ScriptContext::register_binding_object`].
    pub fn binding_object(&self, address: *const c_void) -> Option<ObjectId> {
        self.binding_objects
            .get(&(address as usize))
            .map(|entry| entry.object)
            .filter(|id| self.heap.contains(*id))
    }

    /// Drops one registration of a binding object. Returns false for an
    /// unknown address.
    pub fn release_binding_object(&mut self, address: *const c_void) -> bool {
        let key = address as usize;
        let Some(entry) = self.binding_objects.get_mut(&key) else {
            return false;
        };
        let object = entry.object;
        entry.holds -= 1;
        if entry.holds == 0 {
            self.binding_objects.remove(&key);
        }
        self.heap.release_alive(object);
        true
    }

    // ---- microtasks ----------------------------------------------------

    /// A handle to this context's microtask queue.
    pub fn microtask_queue(&self) -> MicrotaskQueue<ScriptContext> {
        self.microtasks.clone()
    }

    /// Schedules `f` to run at the next drain.
    ///
    /// Like a native function body, the closure is not traced: it must not
    /// capture object handles that an explicit [`ScriptContext::collect_garbage`]
    /// could sweep before it runs. Pin such handles with
    /// [`ScriptContext::keep_alive`] and release them inside the closure.
    pub fn enqueue_microtask<F>(&self, f: F)
    where
        F: FnOnce(&mut ScriptContext) + 'static,
    {
        self.microtasks.enqueue(Microtask::with_context(f));
    }

    /// Number of pending microtasks.
    pub fn pending_microtasks(&self) -> usize {
        self.microtasks.len()
    }

    /// Runs microtasks until the queue is empty, then collects garbage when
    /// enough allocations have happened since the last collection.
    ///
    /// Returns how many microtasks ran.
    pub fn drain_microtasks(&mut self) -> usize {
        if self.disposed {
            return 0;
        }
        let queue = self.microtasks.clone();
        let executed = queue.drain_with(self);
        let threshold = self.options.gc_allocation_threshold;
        if !self.disposed && threshold > 0 && self.heap.allocations_since_collection() >= threshold {
            self.collect_garbage();
        }
        executed
    }

    // ---- lifecycle -----------------------------------------------------

    /// Whether bindings have been installed.
    pub fn is_installed(&self) -> bool {
        self.installed
    }

    pub(crate) fn mark_installed(&mut self) {
        self.installed = true;
    }

    /// Whether [`ScriptContext::dispose`] has run.
    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    /// Tears the context down. Idempotent.
    ///
    /// Native-function records are invalidated in bulk, pending microtasks
    /// are dropped without running, and every object is finalized. Pending
    /// asynchronous function-reference invocations are completed with
    /// `InvalidatedFunction` after the teardown.
    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        self.disposed = true;
        self.token.alive.set(false);
        let invalidated = self.functions.invalidate_all();
        let dropped = self.microtasks.clear();
        self.binding_objects.clear();
        self.type_cache.clear();
        let finalized = self.heap.clear();
        let cancelled = PendingInvocations::cancel_all(self);
        log::debug!(
            "disposed context {:#x}: {} function refs invalidated, {} microtasks dropped, {} async calls cancelled, {} objects finalized",
            self.id(),
            invalidated,
            dropped,
            cancelled,
            finalized
        );
    }
}

impl Drop for ScriptContext {
    fn drop(&mut self) {
        self.dispose();
    }
}

impl fmt::Debug for ScriptContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScriptContext")
            .field("id", &format_args!("{:#x}", self.id()))
            .field("live_objects", &self.heap.len())
            .field("types", &self.type_cache.len())
            .field("pending_microtasks", &self.microtasks.len())
            .field("installed", &self.installed)
            .field("disposed", &self.disposed)
            .finish()
    }
}

fn stale_handle(id: ObjectId) -> JsError {
    JsError::reference_error(format!("object {} is no longer alive", id))
}
