//! Synchronous pair iteration for host collections.
//!
//! A collection exposes its contents through a [`PairIterationSource`];
//! `keys()`, `values()` and `entries()` each wrap the same kind of source in
//! a [`SyncIterator`] that shapes every pair for its [`IterationKind`].

use crate::type_registry::TypeRecord;
use crate::wrappable::{wrapper_ref, ScriptWrappable};
use crate::wrapper_types::SYNC_ITERATOR;
use crate::ScriptContext;
use core_types::{JsError, ObjectId, Value};
use memory_manager::{Trace, Visitor};
use std::any::Any;
use std::cell::RefCell;
use std::rc::Rc;

/// Which part of each pair an iterator yields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IterationKind {
    /// The key
    Key,
    /// The value
    Value,
    /// `[key, value]`
    Entries,
}

/// Produces the pairs of a collection one at a time.
///
/// Implementations must trace the collection they read from so that it
/// survives for as long as an iterator over it is reachable.
pub trait PairIterationSource: Trace {
    /// The next pair, or `None` once exhausted.
    fn next_pair(&mut self, ctx: &mut ScriptContext) -> Result<Option<(Value, Value)>, JsError>;
}

/// Iterator result `{ value, done }`
#[derive(Debug, Clone, PartialEq)]
pub struct IteratorResult {
    /// The value returned by the iterator
    pub value: Value,
    /// Whether the iterator is exhausted
    pub done: bool,
}

impl IteratorResult {
    /// A result carrying a value.
    pub fn value(value: Value) -> Self {
        IteratorResult { value, done: false }
    }

    /// The exhausted result.
    pub fn done() -> Self {
        IteratorResult {
            value: Value::Undefined,
            done: true,
        }
    }

    /// Builds the script object for this result.
    pub fn to_script_object(&self, ctx: &mut ScriptContext) -> Result<ObjectId, JsError> {
        let object = ctx.create_object();
        ctx.set_property(object, "value", self.value.clone())?;
        ctx.set_property(object, "done", Value::Boolean(self.done))?;
        Ok(object)
    }
}

impl Trace for IteratorResult {
    fn trace(&self, visitor: &mut Visitor) {
        self.value.trace(visitor);
    }
}

/// Iterator over a shared pair source.
///
/// Once `next` has reported `done` it keeps doing so, even if the
/// underlying collection grows.
pub struct SyncIterator {
    source: Rc<RefCell<dyn PairIterationSource>>,
    kind: IterationKind,
    done: bool,
}

impl SyncIterator {
    /// Creates an iterator of `kind` over `source`.
    pub fn new(source: Rc<RefCell<dyn PairIterationSource>>, kind: IterationKind) -> Self {
        Self {
            source,
            kind,
            done: false,
        }
    }

    /// The iteration kind.
    pub fn kind(&self) -> IterationKind {
        self.kind
    }

    /// Whether the iterator has reported `done`.
    pub fn is_done(&self) -> bool {
        self.done
    }

    /// Advances the iterator.
    pub fn next(&mut self, ctx: &mut ScriptContext) -> Result<IteratorResult, JsError> {
        if self.done {
            return Ok(IteratorResult::done());
        }
        let pair = pull(&self.source, ctx)?;
        self.done = pair.is_none();
        Ok(shape(ctx, self.kind, pair))
    }
}

/// Takes the next pair from `source`. The source is mutably borrowed while
/// it runs, which a collection in the meantime treats as untraceable.
fn pull(
    source: &Rc<RefCell<dyn PairIterationSource>>,
    ctx: &mut ScriptContext,
) -> Result<Option<(Value, Value)>, JsError> {
    source
        .try_borrow_mut()
        .map_err(|_| JsError::type_error("Iterator source is already being iterated"))?
        .next_pair(ctx)
}

fn shape(ctx: &mut ScriptContext, kind: IterationKind, pair: Option<(Value, Value)>) -> IteratorResult {
    let Some((key, value)) = pair else {
        return IteratorResult::done();
    };
    let value = match kind {
        IterationKind::Key => key,
        IterationKind::Value => value,
        IterationKind::Entries => Value::Object(ctx.create_array(vec![key, value])),
    };
    IteratorResult::value(value)
}

impl Trace for SyncIterator {
    fn trace(&self, visitor: &mut Visitor) {
        self.source.trace(visitor);
    }
}

impl ScriptWrappable for SyncIterator {
    fn type_record(&self) -> &'static TypeRecord {
        &SYNC_ITERATOR
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Wraps a new iterator over `source` for script.
pub fn create_iterator(
    ctx: &mut ScriptContext,
    source: Rc<RefCell<dyn PairIterationSource>>,
    kind: IterationKind,
) -> Result<ObjectId, JsError> {
    ctx.wrap(wrapper_ref(SyncIterator::new(source, kind)))
}

/// Advances the iterator wrapped by `iterator` and returns the script
/// result object.
///
/// The wrapper is only borrowed to read and update its state; the source
/// runs with the wrapper free, so the iterator stays traceable.
pub fn iterator_next(ctx: &mut ScriptContext, iterator: ObjectId) -> Result<ObjectId, JsError> {
    let illegal = || JsError::type_error("Illegal invocation");
    let running = || JsError::type_error("Iterator is already running");
    let wrapper = ctx.wrappable(iterator).ok_or_else(illegal)?;
    let (source, kind) = {
        let guard = wrapper.try_borrow().map_err(|_| running())?;
        let iterator = guard.as_any().downcast_ref::<SyncIterator>().ok_or_else(illegal)?;
        if iterator.done {
            return IteratorResult::done().to_script_object(ctx);
        }
        (Rc::clone(&iterator.source), iterator.kind)
    };
    let pair = pull(&source, ctx)?;
    if pair.is_none() {
        let mut guard = wrapper.try_borrow_mut().map_err(|_| running())?;
        if let Some(iterator) = guard.as_any_mut().downcast_mut::<SyncIterator>() {
            iterator.done = true;
        }
    }
    shape(ctx, kind, pair).to_script_object(ctx)
}
