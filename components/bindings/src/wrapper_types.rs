//! Type records of every class exposed by [`crate::install_bindings`].
//!
//! The DOM hierarchy is installed as shells: constructor, prototype and
//! inheritance only. Events, collections and iterators carry the members
//! needed to exercise dictionaries, interception and iteration.

use crate::collections::{
    object_list_enumerate, object_list_has, object_list_indexed_get, string_map_delete,
    string_map_enumerate, string_map_get, string_map_has, string_map_set, ObjectList, SearchParams,
    SearchParamsIterationSource,
};
use crate::converter::to_number;
use crate::dictionaries::{CustomEventInit, EventInit};
use crate::dictionary::Dictionary;
use crate::iterable::{create_iterator, iterator_next, IterationKind, PairIterationSource};
use crate::type_registry::{ClassId, PropertyHooks, TypeRecord, TypeTable};
use crate::wrappable::{with_this, with_this_mut, ScriptWrappable};
use crate::ScriptContext;
use core_types::{ExceptionState, JsError, ObjectId, Value};
use memory_manager::{Trace, Visitor};
use std::any::Any;
use std::cell::RefCell;
use std::rc::Rc;

// ---- DOM shells ---------------------------------------------------------

/// `EventTarget`
pub static EVENT_TARGET: TypeRecord = TypeRecord::new(ClassId(1), "EventTarget", None);
/// `Node`
pub static NODE: TypeRecord = TypeRecord::new(ClassId(2), "Node", Some(&EVENT_TARGET));
/// `ContainerNode`
pub static CONTAINER_NODE: TypeRecord =
    TypeRecord::new(ClassId(3), "ContainerNode", Some(&NODE));
/// `Element`
pub static ELEMENT: TypeRecord = TypeRecord::new(ClassId(4), "Element", Some(&CONTAINER_NODE));
/// `HTMLElement`
pub static HTML_ELEMENT: TypeRecord = TypeRecord::new(ClassId(5), "HTMLElement", Some(&ELEMENT));
/// `HTMLDivElement`
pub static HTML_DIV_ELEMENT: TypeRecord =
    TypeRecord::new(ClassId(6), "HTMLDivElement", Some(&HTML_ELEMENT));
/// `HTMLAnchorElement`
pub static HTML_ANCHOR_ELEMENT: TypeRecord =
    TypeRecord::new(ClassId(7), "HTMLAnchorElement", Some(&HTML_ELEMENT));
/// `HTMLCanvasElement`
pub static HTML_CANVAS_ELEMENT: TypeRecord =
    TypeRecord::new(ClassId(8), "HTMLCanvasElement", Some(&HTML_ELEMENT));
/// `HTMLImageElement`
pub static HTML_IMAGE_ELEMENT: TypeRecord =
    TypeRecord::new(ClassId(9), "HTMLImageElement", Some(&HTML_ELEMENT));
/// `Document`
pub static DOCUMENT: TypeRecord = TypeRecord::new(ClassId(10), "Document", Some(&CONTAINER_NODE));
/// `Window`, the prototype of the global object
pub static WINDOW: TypeRecord = TypeRecord::new(ClassId(11), "Window", Some(&EVENT_TARGET));

// ---- events -------------------------------------------------------------

/// `Event`
pub static EVENT: TypeRecord = TypeRecord::new(ClassId(20), "Event", None)
    .with_constructor(construct_event)
    .with_members(install_event_members);
/// `UIEvent`
pub static UI_EVENT: TypeRecord = TypeRecord::new(ClassId(21), "UIEvent", Some(&EVENT));
/// `MouseEvent`
pub static MOUSE_EVENT: TypeRecord = TypeRecord::new(ClassId(22), "MouseEvent", Some(&UI_EVENT));
/// `KeyboardEvent`
pub static KEYBOARD_EVENT: TypeRecord =
    TypeRecord::new(ClassId(23), "KeyboardEvent", Some(&UI_EVENT));
/// `CustomEvent`
pub static CUSTOM_EVENT: TypeRecord = TypeRecord::new(ClassId(24), "CustomEvent", Some(&EVENT))
    .with_constructor(construct_custom_event)
    .with_members(install_custom_event_members);
/// `MessageEvent`
pub static MESSAGE_EVENT: TypeRecord = TypeRecord::new(ClassId(25), "MessageEvent", Some(&EVENT));

// ---- collections --------------------------------------------------------

/// `HTMLCollection`, indexed access over an [`ObjectList`]
pub static HTML_COLLECTION: TypeRecord = TypeRecord::new(ClassId(30), "HTMLCollection", None)
    .with_hooks(PropertyHooks {
        indexed_getter: Some(object_list_indexed_get),
        has: Some(object_list_has),
        enumerate: Some(object_list_enumerate),
        ..PropertyHooks::NONE
    })
    .with_members(install_html_collection_members);
/// `DOMStringMap`, named access over a [`crate::StringMap`]
pub static DOM_STRING_MAP: TypeRecord = TypeRecord::new(ClassId(31), "DOMStringMap", None)
    .with_hooks(PropertyHooks {
        indexed_getter: None,
        indexed_setter: None,
        named_getter: Some(string_map_get),
        named_setter: Some(string_map_set),
        named_deleter: Some(string_map_delete),
        has: Some(string_map_has),
        enumerate: Some(string_map_enumerate),
    });
/// `URLSearchParams`
pub static URL_SEARCH_PARAMS: TypeRecord = TypeRecord::new(ClassId(32), "URLSearchParams", None)
    .with_constructor(construct_search_params)
    .with_members(install_search_params_members);
/// Iterator returned by `keys()`, `values()` and `entries()`
pub static SYNC_ITERATOR: TypeRecord = TypeRecord::new(ClassId(33), "SyncIterator", None)
    .with_members(install_iterator_members);

// ---- host objects -------------------------------------------------------

/// Layout rectangle owned by the host
pub static BOUNDING_CLIENT_RECT: TypeRecord =
    TypeRecord::new(ClassId(40), "BoundingClientRect", None);
/// 2D drawing context owned by the host
pub static CANVAS_RENDERING_CONTEXT_2D: TypeRecord =
    TypeRecord::new(ClassId(41), "CanvasRenderingContext2D", None);

static STANDARD_RECORDS: [&TypeRecord; 23] = [
    &HTML_DIV_ELEMENT,
    &HTML_ANCHOR_ELEMENT,
    &HTML_CANVAS_ELEMENT,
    &HTML_IMAGE_ELEMENT,
    &HTML_ELEMENT,
    &ELEMENT,
    &DOCUMENT,
    &CONTAINER_NODE,
    &NODE,
    &WINDOW,
    &EVENT_TARGET,
    &MOUSE_EVENT,
    &KEYBOARD_EVENT,
    &UI_EVENT,
    &CUSTOM_EVENT,
    &MESSAGE_EVENT,
    &EVENT,
    &HTML_COLLECTION,
    &DOM_STRING_MAP,
    &URL_SEARCH_PARAMS,
    &SYNC_ITERATOR,
    &BOUNDING_CLIENT_RECT,
    &CANVAS_RENDERING_CONTEXT_2D,
];

/// Every exposed type. Table order carries no meaning.
pub static STANDARD_TYPES: TypeTable = TypeTable::new(&STANDARD_RECORDS);

// ---- shared helpers -----------------------------------------------------

fn not_enough_arguments(operation: &str, interface: &str, required: usize, present: usize) -> JsError {
    JsError::type_error(format!(
        "Failed to {} '{}': {} argument{} required, but only {} present.",
        operation,
        interface,
        required,
        if required == 1 { "" } else { "s" },
        present
    ))
}

fn dictionary_argument<D: Dictionary>(
    ctx: &mut ScriptContext,
    args: &[Value],
    index: usize,
) -> Result<D, JsError> {
    let mut exception_state = ExceptionState::new();
    let value = args.get(index).cloned().unwrap_or(Value::Undefined);
    let dictionary = D::from_script_object(ctx, &value, &mut exception_state);
    match (dictionary, exception_state.take()) {
        (Some(dictionary), None) => Ok(dictionary),
        (_, Some(error)) => Err(error),
        (None, None) => Err(JsError::internal_error(format!("{} conversion failed", D::NAME))),
    }
}

fn this_object(this: &Value) -> Result<ObjectId, JsError> {
    this.as_object()
        .ok_or_else(|| JsError::type_error("Illegal invocation"))
}

// ---- events -------------------------------------------------------------

/// Native state of an `Event` or `CustomEvent`.
#[derive(Debug, Clone)]
pub struct EventData {
    record: &'static TypeRecord,
    event_type: String,
    init: EventInit,
    detail: Value,
}

impl EventData {
    /// An event of type `event_type`.
    pub fn new(record: &'static TypeRecord, event_type: impl Into<String>, init: EventInit) -> Self {
        Self {
            record,
            event_type: event_type.into(),
            init,
            detail: Value::Null,
        }
    }

    /// The event type string.
    pub fn event_type(&self) -> &str {
        &self.event_type
    }

    /// The init flags.
    pub fn init(&self) -> &EventInit {
        &self.init
    }

    /// `CustomEvent.detail`
    pub fn detail(&self) -> &Value {
        &self.detail
    }
}

impl Trace for EventData {
    fn trace(&self, visitor: &mut Visitor) {
        self.detail.trace(visitor);
    }
}

impl ScriptWrappable for EventData {
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

fn event_type_argument(interface: &str, args: &[Value]) -> Result<String, JsError> {
    args.first()
        .map(|value| value.to_string())
        .ok_or_else(|| not_enough_arguments("construct", interface, 1, 0))
}

fn construct_event(ctx: &mut ScriptContext, args: &[Value]) -> Result<Value, JsError> {
    let event_type = event_type_argument(EVENT.name, args)?;
    let init: EventInit = dictionary_argument(ctx, args, 1)?;
    let event = ctx.wrap_native(EventData::new(&EVENT, event_type, init))?;
    Ok(Value::Object(event))
}

fn construct_custom_event(ctx: &mut ScriptContext, args: &[Value]) -> Result<Value, JsError> {
    let event_type = event_type_argument(CUSTOM_EVENT.name, args)?;
    let init: CustomEventInit = dictionary_argument(ctx, args, 1)?;
    let mut event = EventData::new(&CUSTOM_EVENT, event_type, init.event_init);
    event.detail = init.detail;
    Ok(Value::Object(ctx.wrap_native(event)?))
}

fn install_event_members(
    ctx: &mut ScriptContext,
    prototype: ObjectId,
    _constructor: ObjectId,
) -> Result<(), JsError> {
    ctx.define_getter(prototype, "type", |ctx, this, _| {
        with_this(ctx, this, |event: &EventData| Value::string(event.event_type()))
    })?;
    ctx.define_getter(prototype, "bubbles", |ctx, this, _| {
        with_this(ctx, this, |event: &EventData| Value::Boolean(event.init.bubbles))
    })?;
    ctx.define_getter(prototype, "cancelable", |ctx, this, _| {
        with_this(ctx, this, |event: &EventData| Value::Boolean(event.init.cancelable))
    })?;
    ctx.define_getter(prototype, "composed", |ctx, this, _| {
        with_this(ctx, this, |event: &EventData| Value::Boolean(event.init.composed))
    })
}

fn install_custom_event_members(
    ctx: &mut ScriptContext,
    prototype: ObjectId,
    _constructor: ObjectId,
) -> Result<(), JsError> {
    ctx.define_getter(prototype, "detail", |ctx, this, _| {
        with_this(ctx, this, |event: &EventData| event.detail.clone())
    })
}

// ---- collections --------------------------------------------------------

fn install_html_collection_members(
    ctx: &mut ScriptContext,
    prototype: ObjectId,
    _constructor: ObjectId,
) -> Result<(), JsError> {
    ctx.define_getter(prototype, "length", |ctx, this, _| {
        with_this(ctx, this, |list: &ObjectList| Value::from_i64(list.len() as i64))
    })?;
    ctx.define_method(prototype, "item", |ctx, this, args| {
        let index = args
            .first()
            .map(to_number)
            .ok_or_else(|| not_enough_arguments("execute 'item' on", "HTMLCollection", 1, 0))?;
        with_this(ctx, this, |list: &ObjectList| {
            if index.is_finite() && index >= 0.0 {
                list.item(index as usize).map(Value::Object).unwrap_or(Value::Null)
            } else {
                Value::Null
            }
        })
    })?;
    Ok(())
}

fn construct_search_params(ctx: &mut ScriptContext, args: &[Value]) -> Result<Value, JsError> {
    let params = match args.first() {
        None | Some(Value::Undefined) => SearchParams::new(),
        Some(init) => SearchParams::parse(&init.to_string()),
    };
    Ok(Value::Object(ctx.wrap_native(params)?))
}

fn search_params_iterator(
    ctx: &mut ScriptContext,
    this: &Value,
    kind: IterationKind,
) -> Result<Value, JsError> {
    with_this(ctx, this, |_: &SearchParams| ())?;
    let source: Rc<RefCell<dyn PairIterationSource>> =
        Rc::new(RefCell::new(SearchParamsIterationSource::new(this_object(this)?)));
    Ok(Value::Object(create_iterator(ctx, source, kind)?))
}

fn install_search_params_members(
    ctx: &mut ScriptContext,
    prototype: ObjectId,
    _constructor: ObjectId,
) -> Result<(), JsError> {
    ctx.define_method(prototype, "append", |ctx, this, args| {
        if args.len() < 2 {
            return Err(not_enough_arguments(
                "execute 'append' on",
                "URLSearchParams",
                2,
                args.len(),
            ));
        }
        let (name, value) = (args[0].to_string(), args[1].to_string());
        with_this_mut(ctx, this, |params: &mut SearchParams| params.append(name, value))?;
        Ok(Value::Undefined)
    })?;
    ctx.define_method(prototype, "get", |ctx, this, args| {
        let name = args
            .first()
            .map(|value| value.to_string())
            .ok_or_else(|| not_enough_arguments("execute 'get' on", "URLSearchParams", 1, 0))?;
        with_this(ctx, this, |params: &SearchParams| {
            params.get(&name).map(Value::string).unwrap_or(Value::Null)
        })
    })?;
    ctx.define_getter(prototype, "size", |ctx, this, _| {
        with_this(ctx, this, |params: &SearchParams| Value::from_i64(params.len() as i64))
    })?;
    ctx.define_method(prototype, "keys", |ctx, this, _| {
        search_params_iterator(ctx, this, IterationKind::Key)
    })?;
    ctx.define_method(prototype, "values", |ctx, this, _| {
        search_params_iterator(ctx, this, IterationKind::Value)
    })?;
    ctx.define_method(prototype, "entries", |ctx, this, _| {
        search_params_iterator(ctx, this, IterationKind::Entries)
    })?;
    Ok(())
}

fn install_iterator_members(
    ctx: &mut ScriptContext,
    prototype: ObjectId,
    _constructor: ObjectId,
) -> Result<(), JsError> {
    ctx.define_method(prototype, "next", |ctx, this, _| {
        let iterator = this_object(this)?;
        Ok(Value::Object(iterator_next(ctx, iterator)?))
    })?;
    Ok(())
}
