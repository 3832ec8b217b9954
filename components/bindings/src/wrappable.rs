//! Native objects exposed to script.

use crate::type_registry::TypeRecord;
use crate::ScriptContext;
use core_types::{JsError, Value};
use memory_manager::Trace;
use std::any::Any;
use std::cell::RefCell;
use std::rc::Rc;

/// A native object that can be wrapped by a script object.
///
/// The wrapper owns the native object through a [`WrapperRef`]; the native
/// object lives until its wrapper is collected and every other `Rc` is gone.
/// `trace` must report every script handle the object holds.
pub trait ScriptWrappable: Trace + Any {
    /// The record of the most derived exposed class.
    fn type_record(&self) -> &'static TypeRecord;

    /// Upcast for downcasting to the concrete type.
    fn as_any(&self) -> &dyn Any;

    /// Mutable upcast for downcasting to the concrete type.
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// Shared ownership of a wrapped native object.
pub type WrapperRef = Rc<RefCell<dyn ScriptWrappable>>;

/// Moves a native object behind a [`WrapperRef`].
pub fn wrapper_ref<T: ScriptWrappable>(native: T) -> WrapperRef {
    Rc::new(RefCell::new(native))
}

/// Runs `f` on the native `T` behind a `this` value.
///
/// Fails with "Illegal invocation" when `this` is not a wrapper of `T`.
pub fn with_this<T: 'static, R>(
    ctx: &ScriptContext,
    this: &Value,
    f: impl FnOnce(&T) -> R,
) -> Result<R, JsError> {
    this.as_object()
        .and_then(|id| ctx.with_wrappable(id, f))
        .ok_or_else(illegal_invocation)
}

/// Mutable counterpart of [`with_this`].
pub fn with_this_mut<T: 'static, R>(
    ctx: &ScriptContext,
    this: &Value,
    f: impl FnOnce(&mut T) -> R,
) -> Result<R, JsError> {
    this.as_object()
        .and_then(|id| ctx.with_wrappable_mut(id, f))
        .ok_or_else(illegal_invocation)
}

fn illegal_invocation() -> JsError {
    JsError::type_error("Illegal invocation")
}
