//! Bindings - native objects exposed to a script context
//!
//! This component provides:
//! - [`ScriptContext`], the per-context owner of heap, global object, type
//!   cache, microtask queue and boundary tables
//! - [`TypeRecord`] and [`TypeTable`], static per-class identity and
//!   inheritance
//! - Wrapped native objects ([`ScriptWrappable`]) with optional property
//!   interception
//! - [`Dictionary`] conversion and [`SyncIterator`] pair iteration
//! - Native-function references and script value <-> [`value_bridge::TaggedValue`]
//!   conversion for the host boundary
//! - [`BindingInstaller`] and [`install_bindings`]
//!
//! # Examples
//!
//! ```
//! use bindings::{install_bindings, ContextOptions, ScriptContext};
//! use core_types::Value;
//!
//! let mut ctx = ScriptContext::new(ContextOptions::default());
//! install_bindings(&mut ctx).unwrap();
//!
//! let global = ctx.global();
//! let ctor = ctx.get_property(global, "URLSearchParams").unwrap();
//! let params = ctx
//!     .construct(ctor.as_object().unwrap(), &[Value::string("q=rust")])
//!     .unwrap();
//! let get = ctx.get_value_property(&params, "get").unwrap();
//! let found = ctx.call_value(&get, &params, &[Value::string("q")]).unwrap();
//! assert_eq!(found, Value::string("rust"));
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

mod collections;
mod context;
pub mod converter;
pub mod dictionaries;
mod dictionary;
mod error;
mod installer;
mod iterable;
mod native_function;
mod object;
mod options;
mod script_value;
mod type_cache;
mod type_registry;
mod wrappable;
pub mod wrapper_types;

pub use collections::{HostObject, ObjectList, SearchParams, SearchParamsIterationSource, StringMap};
pub use context::ScriptContext;
pub use converter::{FromScriptValue, ToScriptValue};
pub use dictionary::{get_member, optional_member, required_member, Dictionary};
pub use error::{BindingError, BindingResult};
pub use installer::{install_bindings, BindingInstaller};
pub use iterable::{
    create_iterator, iterator_next, IterationKind, IteratorResult, PairIterationSource,
    SyncIterator,
};
pub use native_function::{
    create_function_ref, function_ref_count, invoke_async_function_ref, invoke_function_ref,
    release_function_ref, resolve_function_ref, NativeFunctionContext,
};
pub use object::{ArrayElements, NativeFn, NativeFunction, ObjectKind, Property, ScriptObject};
pub use options::ContextOptions;
pub use script_value::{from_json, from_tagged, stringify_exception, to_json, to_tagged};
pub use type_cache::{ContextTypeCache, TypeCacheEntry};
pub use type_registry::{
    Ancestors, ClassId, ConstructFn, IndexedGetter, IndexedSetter, InstallMembers, NamedDeleter,
    NamedGetter, NamedSetter, PropertyChecker, PropertyEnumerator, PropertyHooks, TypeRecord,
    TypeTable,
};
pub use wrappable::{with_this, with_this_mut, wrapper_ref, ScriptWrappable, WrapperRef};
pub use wrapper_types::{EventData, STANDARD_TYPES};
