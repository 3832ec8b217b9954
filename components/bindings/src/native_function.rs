//! References to script functions handed to the host.
//!
//! Encoding a callable for the host creates a [`NativeFunctionContext`]
//! record owned by the context's list. The host only ever sees the record's
//! address; every lookup compares addresses against the live list, so an
//! unknown or stale address is reported instead of dereferenced.

use crate::context::ContextToken;
use crate::script_value::{from_tagged, to_tagged};
use crate::{BindingError, BindingResult, ScriptContext};
use core_types::{ObjectId, Value};
use indexmap::IndexMap;
use memory_manager::{Trace, Visitor};
use std::cell::Cell;
use std::ffi::c_void;
use std::rc::{Rc, Weak};
use value_bridge::{BridgeError, TaggedValue};

/// Record behind a function reference.
#[derive(Debug)]
pub struct NativeFunctionContext {
    callable: Cell<Option<ObjectId>>,
    context: Weak<ContextToken>,
    is_async: bool,
}

impl NativeFunctionContext {
    /// The referenced callable while the record and its context are alive.
    pub fn callable(&self) -> Option<ObjectId> {
        if self.context.upgrade().is_some_and(|token| token.is_alive()) {
            self.callable.get()
        } else {
            None
        }
    }

    /// Whether the reference was created for asynchronous invocation.
    pub fn is_async(&self) -> bool {
        self.is_async
    }

    /// Whether invoking the reference is still allowed.
    pub fn is_valid(&self) -> bool {
        self.callable().is_some()
    }

    fn invalidate(&self) {
        self.callable.set(None);
    }
}

/// The records of one context.
#[derive(Debug, Default)]
pub(crate) struct NativeFunctionList {
    records: Vec<Rc<NativeFunctionContext>>,
}

impl NativeFunctionList {
    fn push(&mut self, record: NativeFunctionContext) -> *const c_void {
        let record = Rc::new(record);
        let address = Rc::as_ptr(&record) as *const c_void;
        self.records.push(record);
        address
    }

    pub(crate) fn find(&self, address: *const c_void) -> Option<Rc<NativeFunctionContext>> {
        self.records
            .iter()
            .find(|record| Rc::as_ptr(record) as *const c_void == address)
            .cloned()
    }

    fn remove(&mut self, address: *const c_void) -> Option<Rc<NativeFunctionContext>> {
        let position = self
            .records
            .iter()
            .position(|record| Rc::as_ptr(record) as *const c_void == address)?;
        Some(self.records.swap_remove(position))
    }

    pub(crate) fn len(&self) -> usize {
        self.records.len()
    }

    /// Invalidates and unlinks every record. Returns how many there were.
    pub(crate) fn invalidate_all(&mut self) -> usize {
        for record in &self.records {
            record.invalidate();
        }
        let count = self.records.len();
        self.records.clear();
        count
    }
}

impl Trace for NativeFunctionList {
    fn trace(&self, visitor: &mut Visitor) {
        for record in &self.records {
            record.callable.get().trace(visitor);
        }
    }
}

type Completion = Box<dyn FnOnce(&mut ScriptContext, BindingResult<TaggedValue>)>;

/// An asynchronous invocation waiting for the next drain.
struct PendingInvocation {
    address: *const c_void,
    args: Vec<TaggedValue>,
    on_complete: Completion,
}

/// Asynchronous invocations scheduled but not yet run, in schedule order.
///
/// Entries own their host arguments until the microtask takes them, so
/// teardown can free the arguments and report every invocation that will
/// never run.
#[derive(Default)]
pub(crate) struct PendingInvocations {
    next_id: u64,
    entries: IndexMap<u64, PendingInvocation>,
}

impl PendingInvocations {
    fn insert(&mut self, invocation: PendingInvocation) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        self.entries.insert(id, invocation);
        id
    }

    fn take(&mut self, id: u64) -> Option<PendingInvocation> {
        self.entries.shift_remove(&id)
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    /// Completes every pending invocation with
    /// [`BridgeError::InvalidatedFunction`], freeing its arguments.
    /// Returns how many were reported.
    pub(crate) fn cancel_all(ctx: &mut ScriptContext) -> usize {
        let mut cancelled = 0;
        // Callbacks may schedule more work; keep taking until empty.
        while let Some((_, invocation)) = ctx.pending_invocations_mut().entries.shift_remove_index(0) {
            log::debug!(
                "cancelled async invocation of {:p} with {} argument(s)",
                invocation.address,
                invocation.args.len()
            );
            invocation.args.into_iter().for_each(TaggedValue::free);
            (invocation.on_complete)(ctx, Err(BindingError::Bridge(BridgeError::InvalidatedFunction)));
            cancelled += 1;
        }
        cancelled
    }
}

impl std::fmt::Debug for PendingInvocations {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PendingInvocations")
            .field("pending", &self.entries.len())
            .finish()
    }
}

/// Encodes `callable` as a function reference for the host.
///
/// The callable stays alive until [`release_function_ref`] or disposal.
pub fn create_function_ref(
    ctx: &mut ScriptContext,
    callable: ObjectId,
    is_async: bool,
) -> BindingResult<TaggedValue> {
    if ctx.is_disposed() {
        return Err(BindingError::ContextDisposed);
    }
    if !ctx.is_callable(&Value::Object(callable)) {
        return Err(core_types::JsError::type_error(format!("{} is not a function", callable)).into());
    }
    let record = NativeFunctionContext {
        callable: Cell::new(Some(callable)),
        context: Rc::downgrade(ctx.token()),
        is_async,
    };
    let address = ctx.functions_mut().push(record);
    Ok(if is_async {
        TaggedValue::from_async_function(address)
    } else {
        TaggedValue::from_function(address)
    })
}

/// The callable behind a function-reference address.
///
/// Unknown and invalidated addresses yield
/// [`BridgeError::InvalidatedFunction`].
pub fn resolve_function_ref(ctx: &ScriptContext, address: *const c_void) -> BindingResult<ObjectId> {
    ctx.functions()
        .find(address)
        .and_then(|record| record.callable())
        .ok_or_else(|| {
            log::warn!("rejected invalidated function reference {:p}", address);
            BindingError::Bridge(BridgeError::InvalidatedFunction)
        })
}

/// Calls the function behind `address` with host arguments.
///
/// Arguments are decoded into script values, the callable runs with an
/// undefined `this`, and its result is encoded back. Arguments are freed
/// on every path.
pub fn invoke_function_ref(
    ctx: &mut ScriptContext,
    address: *const c_void,
    args: Vec<TaggedValue>,
) -> BindingResult<TaggedValue> {
    let callable = match resolve_function_ref(ctx, address) {
        Ok(callable) => callable,
        Err(err) => {
            args.into_iter().for_each(TaggedValue::free);
            return Err(err);
        }
    };
    let mut values = Vec::with_capacity(args.len());
    let mut args = args.into_iter();
    while let Some(arg) = args.next() {
        match from_tagged(ctx, arg) {
            Ok(value) => values.push(value),
            Err(err) => {
                args.for_each(TaggedValue::free);
                return Err(err);
            }
        }
    }
    let result = ctx.call_function(callable, &Value::Undefined, &values)?;
    to_tagged(ctx, &result)
}

/// Schedules the function behind `address` as a microtask.
///
/// `on_complete` receives the encoded result while the queue drains. The
/// reference is checked when the microtask runs, so a release in between is
/// reported through `on_complete`. Disposing the context before the drain
/// frees the arguments and completes with
/// [`BridgeError::InvalidatedFunction`]; scheduling on a disposed context
/// completes the same way immediately.
pub fn invoke_async_function_ref<F>(
    ctx: &mut ScriptContext,
    address: *const c_void,
    args: Vec<TaggedValue>,
    on_complete: F,
) where
    F: FnOnce(&mut ScriptContext, BindingResult<TaggedValue>) + 'static,
{
    if ctx.is_disposed() {
        args.into_iter().for_each(TaggedValue::free);
        on_complete(ctx, Err(BindingError::Bridge(BridgeError::InvalidatedFunction)));
        return;
    }
    let id = ctx.pending_invocations_mut().insert(PendingInvocation {
        address,
        args,
        on_complete: Box::new(on_complete),
    });
    ctx.enqueue_microtask(move |ctx| {
        let Some(invocation) = ctx.pending_invocations_mut().take(id) else {
            return;
        };
        let result = invoke_function_ref(ctx, invocation.address, invocation.args);
        (invocation.on_complete)(ctx, result);
    });
}

/// Unlinks a reference and releases its callable. Returns false for an
/// unknown address.
pub fn release_function_ref(ctx: &mut ScriptContext, address: *const c_void) -> bool {
    match ctx.functions_mut().remove(address) {
        Some(record) => {
            record.invalidate();
            true
        }
        None => false,
    }
}

/// Number of live function references.
pub fn function_ref_count(ctx: &ScriptContext) -> usize {
    ctx.functions().len()
}
