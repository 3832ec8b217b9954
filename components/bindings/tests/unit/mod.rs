use bindings::dictionaries::{EventInit, IntersectionObserverEntryInit, ScrollBehavior, ScrollToOptions};
use bindings::wrapper_types::{
    BOUNDING_CLIENT_RECT, CUSTOM_EVENT, DOCUMENT, ELEMENT, EVENT, EVENT_TARGET, HTML_DIV_ELEMENT,
    NODE, URL_SEARCH_PARAMS, WINDOW,
};
use bindings::{
    create_function_ref, from_tagged, function_ref_count, install_bindings,
    invoke_async_function_ref, invoke_function_ref, release_function_ref, resolve_function_ref,
    to_tagged, BindingError, BindingResult, ContextOptions, Dictionary, ObjectList, ScriptContext,
    SearchParams, StringMap,
};
use core_types::{ErrorKind, ExceptionState, ObjectId, Value};
use std::cell::RefCell;
use std::ffi::c_void;
use std::rc::Rc;
use value_bridge::{BridgeError, PointerKind, Tag, TaggedValue};

fn installed() -> ScriptContext {
    let mut ctx = ScriptContext::new(ContextOptions::default());
    install_bindings(&mut ctx).expect("Should install bindings");
    ctx
}

fn global_constructor(ctx: &mut ScriptContext, name: &str) -> ObjectId {
    let global = ctx.global();
    ctx.get_property(global, name)
        .expect("Should read global")
        .as_object()
        .expect("Constructor should be an object")
}

fn call_method(ctx: &mut ScriptContext, receiver: &Value, name: &str, args: &[Value]) -> Value {
    let method = ctx
        .get_value_property(receiver, name)
        .expect("Should read method");
    ctx.call_value(&method, receiver, args)
        .expect("Method should succeed")
}

fn plain_object(ctx: &mut ScriptContext, members: &[(&str, Value)]) -> ObjectId {
    let object = ctx.create_object();
    for (key, value) in members {
        ctx.set_property(object, key, value.clone())
            .expect("Should set member");
    }
    object
}

#[cfg(test)]
mod installer_tests {
    use super::*;

    #[test]
    fn test_every_type_is_exposed_on_global() {
        let mut ctx = installed();
        for record in bindings::STANDARD_TYPES.iter() {
            let ctor = global_constructor(&mut ctx, record.name);
            assert_eq!(Some(ctor), ctx.type_cache().get(record).map(|e| e.constructor));
        }
    }

    #[test]
    fn test_prototype_chain_follows_inheritance() {
        let mut ctx = installed();
        let div = ctx.prototype_for_type(&HTML_DIV_ELEMENT).unwrap();
        let element = ctx.prototype_for_type(&ELEMENT).unwrap();
        let target = ctx.prototype_for_type(&EVENT_TARGET).unwrap();
        let mut chain = Vec::new();
        let mut current = ctx.prototype_of(div).unwrap();
        while let Some(proto) = current {
            chain.push(proto);
            current = ctx.prototype_of(proto).unwrap();
        }
        assert!(chain.contains(&element));
        assert!(chain.contains(&target));
        assert_eq!(chain.last().copied(), Some(ctx.object_prototype()));
    }

    #[test]
    fn test_global_is_a_window() {
        let ctx = installed();
        let global = ctx.global();
        let window = ctx.type_cache().get(&WINDOW).unwrap().prototype;
        assert_eq!(ctx.prototype_of(global).unwrap(), Some(window));
        assert!(ctx.is_instance_of(&Value::Object(global), &EVENT_TARGET));
        assert!(!ctx.is_instance_of(&Value::Object(global), &NODE));
    }

    #[test]
    fn test_window_and_global_this_alias_global() {
        let mut ctx = installed();
        let global = ctx.global();
        assert_eq!(ctx.get_property(global, "window").unwrap(), Value::Object(global));
        assert_eq!(ctx.get_property(global, "globalThis").unwrap(), Value::Object(global));
    }

    #[test]
    fn test_constructor_links() {
        let mut ctx = installed();
        let ctor = global_constructor(&mut ctx, "Document");
        let proto = ctx.get_property(ctor, "prototype").unwrap();
        assert_eq!(proto, Value::Object(ctx.prototype_for_type(&DOCUMENT).unwrap()));
        assert_eq!(ctx.get_value_property(&proto, "constructor").unwrap(), Value::Object(ctor));
        assert_eq!(ctx.get_property(ctor, "name").unwrap(), Value::string("Document"));
    }

    #[test]
    fn test_shell_types_are_illegal_constructors() {
        let mut ctx = installed();
        let ctor = global_constructor(&mut ctx, "Node");
        let err = ctx.construct(ctor, &[]).unwrap_err();
        assert_eq!(err.kind, ErrorKind::TypeError);
        assert_eq!(err.message, "Illegal constructor");
    }

    #[test]
    fn test_calling_constructor_without_new_fails() {
        let mut ctx = installed();
        let ctor = global_constructor(&mut ctx, "Event");
        let err = ctx
            .call_function(ctor, &Value::Undefined, &[Value::string("x")])
            .unwrap_err();
        assert!(err.message.starts_with("Failed to construct 'Event'"));
    }

    #[test]
    fn test_install_on_disposed_context_fails() {
        let mut ctx = ScriptContext::new(ContextOptions::default());
        ctx.dispose();
        assert_eq!(install_bindings(&mut ctx), Err(BindingError::ContextDisposed));
    }
}

#[cfg(test)]
mod event_tests {
    use super::*;

    #[test]
    fn test_event_reads_init_dictionary() {
        let mut ctx = installed();
        let ctor = global_constructor(&mut ctx, "Event");
        let init = plain_object(&mut ctx, &[("bubbles", Value::Boolean(true))]);
        let event = ctx
            .construct(ctor, &[Value::string("click"), Value::Object(init)])
            .unwrap();
        assert!(ctx.is_instance_of(&event, &EVENT));
        assert_eq!(ctx.get_value_property(&event, "type").unwrap(), Value::string("click"));
        assert_eq!(ctx.get_value_property(&event, "bubbles").unwrap(), Value::Boolean(true));
        assert_eq!(ctx.get_value_property(&event, "cancelable").unwrap(), Value::Boolean(false));
    }

    #[test]
    fn test_event_without_init_uses_defaults() {
        let mut ctx = installed();
        let ctor = global_constructor(&mut ctx, "Event");
        let event = ctx.construct(ctor, &[Value::string("load")]).unwrap();
        assert_eq!(ctx.get_value_property(&event, "composed").unwrap(), Value::Boolean(false));
    }

    #[test]
    fn test_event_requires_type_argument() {
        let mut ctx = installed();
        let ctor = global_constructor(&mut ctx, "Event");
        let err = ctx.construct(ctor, &[]).unwrap_err();
        assert_eq!(
            err.message,
            "Failed to construct 'Event': 1 argument required, but only 0 present."
        );
    }

    #[test]
    fn test_event_rejects_primitive_init() {
        let mut ctx = installed();
        let ctor = global_constructor(&mut ctx, "Event");
        let err = ctx
            .construct(ctor, &[Value::string("x"), Value::Smi(5)])
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::TypeError);
        assert!(err.message.contains("'EventInit'"));
    }

    #[test]
    fn test_custom_event_detail() {
        let mut ctx = installed();
        let ctor = global_constructor(&mut ctx, "CustomEvent");
        let init = plain_object(
            &mut ctx,
            &[("detail", Value::Smi(42)), ("cancelable", Value::Boolean(true))],
        );
        let event = ctx
            .construct(ctor, &[Value::string("ping"), Value::Object(init)])
            .unwrap();
        assert!(ctx.is_instance_of(&event, &CUSTOM_EVENT));
        assert!(ctx.is_instance_of(&event, &EVENT));
        assert_eq!(ctx.get_value_property(&event, "detail").unwrap(), Value::Smi(42));
        assert_eq!(ctx.get_value_property(&event, "cancelable").unwrap(), Value::Boolean(true));
    }

    #[test]
    fn test_getter_on_foreign_receiver_is_illegal() {
        let mut ctx = installed();
        let proto = ctx.prototype_for_type(&EVENT).unwrap();
        let err = ctx.get_property(proto, "type").unwrap_err();
        assert_eq!(err.message, "Illegal invocation");
    }
}

#[cfg(test)]
mod interception_tests {
    use super::*;

    #[test]
    fn test_string_map_named_access() {
        let mut ctx = installed();
        let map = ctx.wrap_native(StringMap::new()).unwrap();
        assert_eq!(ctx.get_property(map, "fooBar").unwrap(), Value::Undefined);
        assert!(!ctx.has_property(map, "fooBar").unwrap());

        assert!(ctx.set_property(map, "fooBar", Value::Smi(1)).unwrap());
        assert_eq!(ctx.get_property(map, "fooBar").unwrap(), Value::string("1"));
        assert!(ctx.has_property(map, "fooBar").unwrap());
        assert_eq!(ctx.own_keys(map).unwrap(), vec!["fooBar".to_string()]);
        assert_eq!(
            ctx.with_wrappable(map, |m: &StringMap| m.get("fooBar").map(str::to_string)),
            Some(Some("1".to_string()))
        );

        assert!(ctx.delete_property(map, "fooBar").unwrap());
        assert!(!ctx.has_property(map, "fooBar").unwrap());
        assert!(ctx.own_keys(map).unwrap().is_empty());
    }

    #[test]
    fn test_string_map_set_does_not_create_own_property() {
        let mut ctx = installed();
        let map = ctx.wrap_native(StringMap::new()).unwrap();
        ctx.set_property(map, "k", Value::Boolean(true)).unwrap();
        assert!(ctx.object(map).unwrap().own_property("k").is_none());
    }

    #[test]
    fn test_object_list_indexed_access() {
        let mut ctx = installed();
        let first = ctx.create_object();
        let second = ctx.create_object();
        let list = ctx.wrap_native(ObjectList::new(vec![first, second])).unwrap();
        assert_eq!(ctx.get_property(list, "0").unwrap(), Value::Object(first));
        assert_eq!(ctx.get_property(list, "1").unwrap(), Value::Object(second));
        assert_eq!(ctx.get_property(list, "2").unwrap(), Value::Undefined);
        assert_eq!(ctx.get_property(list, "length").unwrap(), Value::Smi(2));
        assert_eq!(ctx.own_keys(list).unwrap(), vec!["0".to_string(), "1".to_string()]);
        let item = call_method(&mut ctx, &Value::Object(list), "item", &[Value::Smi(1)]);
        assert_eq!(item, Value::Object(second));
        let missing = call_method(&mut ctx, &Value::Object(list), "item", &[Value::Smi(9)]);
        assert_eq!(missing, Value::Null);
    }

    #[test]
    fn test_object_list_reports_present_indices() {
        let mut ctx = installed();
        let item = ctx.create_object();
        let list = ctx.wrap_native(ObjectList::new(vec![item])).unwrap();
        assert_eq!(ctx.get_property(list, "0").unwrap(), Value::Object(item));
        assert!(ctx.has_property(list, "0").unwrap());
        assert!(!ctx.has_property(list, "1").unwrap());
        assert!(!ctx.has_property(list, "01").unwrap());
        assert!(ctx.has_property(list, "item").unwrap());
        assert!(ctx.has_property(list, "length").unwrap());
    }

    #[test]
    fn test_object_list_keeps_items_alive() {
        let mut ctx = installed();
        let item = ctx.create_object();
        let list = ctx.wrap_native(ObjectList::new(vec![item])).unwrap();
        let global = ctx.global();
        ctx.set_property(global, "list", Value::Object(list)).unwrap();
        ctx.collect_garbage();
        assert!(ctx.object(item).is_some());
    }

    #[test]
    fn test_ordinary_objects_ignore_hooks() {
        let mut ctx = installed();
        let object = ctx.create_object();
        ctx.set_property(object, "0", Value::Smi(3)).unwrap();
        assert_eq!(ctx.get_property(object, "0").unwrap(), Value::Smi(3));
        assert!(ctx.delete_property(object, "0").unwrap());
        assert_eq!(ctx.get_property(object, "0").unwrap(), Value::Undefined);
    }
}

#[cfg(test)]
mod iterator_tests {
    use super::*;

    fn search_params(ctx: &mut ScriptContext, query: &str) -> Value {
        let ctor = global_constructor(ctx, "URLSearchParams");
        ctx.construct(ctor, &[Value::string(query)]).unwrap()
    }

    fn step(ctx: &mut ScriptContext, iterator: &Value) -> (Value, bool) {
        let result = call_method(ctx, iterator, "next", &[]);
        let value = ctx.get_value_property(&result, "value").unwrap();
        let done = ctx.get_value_property(&result, "done").unwrap();
        (value, done == Value::Boolean(true))
    }

    #[test]
    fn test_keys_then_done() {
        let mut ctx = installed();
        let params = search_params(&mut ctx, "a=1&b=2");
        let keys = call_method(&mut ctx, &params, "keys", &[]);
        assert_eq!(step(&mut ctx, &keys), (Value::string("a"), false));
        assert_eq!(step(&mut ctx, &keys), (Value::string("b"), false));
        assert_eq!(step(&mut ctx, &keys), (Value::Undefined, true));
    }

    #[test]
    fn test_done_stays_done_after_growth() {
        let mut ctx = installed();
        let params = search_params(&mut ctx, "a=1");
        let values = call_method(&mut ctx, &params, "values", &[]);
        assert_eq!(step(&mut ctx, &values), (Value::string("1"), false));
        assert!(step(&mut ctx, &values).1);
        call_method(&mut ctx, &params, "append", &[Value::string("c"), Value::string("3")]);
        assert!(step(&mut ctx, &values).1);
        assert!(step(&mut ctx, &values).1);
    }

    #[test]
    fn test_entries_are_pairs() {
        let mut ctx = installed();
        let params = search_params(&mut ctx, "?q=rust+lang");
        let entries = call_method(&mut ctx, &params, "entries", &[]);
        let (pair, done) = step(&mut ctx, &entries);
        assert!(!done);
        assert_eq!(ctx.get_value_property(&pair, "0").unwrap(), Value::string("q"));
        assert_eq!(ctx.get_value_property(&pair, "1").unwrap(), Value::string("rust lang"));
        assert_eq!(ctx.get_value_property(&pair, "length").unwrap(), Value::Smi(2));
    }

    #[test]
    fn test_iterators_are_independent() {
        let mut ctx = installed();
        let params = search_params(&mut ctx, "a=1&b=2");
        let first = call_method(&mut ctx, &params, "keys", &[]);
        let second = call_method(&mut ctx, &params, "keys", &[]);
        step(&mut ctx, &first);
        assert_eq!(step(&mut ctx, &second), (Value::string("a"), false));
        assert_eq!(step(&mut ctx, &first), (Value::string("b"), false));
    }

    #[test]
    fn test_next_on_wrong_receiver_is_illegal() {
        let mut ctx = installed();
        let params = search_params(&mut ctx, "");
        let keys = call_method(&mut ctx, &params, "keys", &[]);
        let next = ctx.get_value_property(&keys, "next").unwrap();
        let err = ctx.call_value(&next, &params, &[]).unwrap_err();
        assert_eq!(err.message, "Illegal invocation");
    }

    #[test]
    fn test_append_requires_two_arguments() {
        let mut ctx = installed();
        let params = search_params(&mut ctx, "");
        let append = ctx.get_value_property(&params, "append").unwrap();
        let err = ctx
            .call_value(&append, &params, &[Value::string("only")])
            .unwrap_err();
        assert_eq!(
            err.message,
            "Failed to execute 'append' on 'URLSearchParams': 2 arguments required, but only 1 present."
        );
        assert_eq!(ctx.get_value_property(&params, "size").unwrap(), Value::Smi(0));
    }
}

#[cfg(test)]
mod dictionary_tests {
    use super::*;

    #[test]
    fn test_missing_required_member_sets_exception() {
        let mut ctx = installed();
        let init = plain_object(&mut ctx, &[("time", Value::Smi(10))]);
        let mut exception_state = ExceptionState::new();
        let parsed = IntersectionObserverEntryInit::from_script_object(
            &mut ctx,
            &Value::Object(init),
            &mut exception_state,
        );
        assert!(parsed.is_none());
        let error = exception_state.exception().unwrap();
        assert_eq!(error.kind, ErrorKind::TypeError);
        assert_eq!(
            error.message,
            "Failed to read the 'target' property from 'IntersectionObserverEntryInit': Required member is undefined."
        );
    }

    #[test]
    fn test_required_dictionary_rejects_undefined() {
        let mut ctx = installed();
        let mut exception_state = ExceptionState::new();
        let parsed = IntersectionObserverEntryInit::from_script_object(
            &mut ctx,
            &Value::Undefined,
            &mut exception_state,
        );
        assert!(parsed.is_none());
        assert!(exception_state.has_exception());
    }

    #[test]
    fn test_complete_required_dictionary() {
        let mut ctx = installed();
        let target = ctx.create_object();
        let init = plain_object(
            &mut ctx,
            &[
                ("time", Value::Double(1.5)),
                ("target", Value::Object(target)),
                ("isIntersecting", Value::Boolean(true)),
            ],
        );
        let mut exception_state = ExceptionState::new();
        let parsed = IntersectionObserverEntryInit::from_script_object(
            &mut ctx,
            &Value::Object(init),
            &mut exception_state,
        )
        .unwrap();
        assert!(!exception_state.has_exception());
        assert_eq!(parsed.time, 1.5);
        assert_eq!(parsed.target, Some(target));
        assert!(parsed.is_intersecting);
        assert_eq!(parsed.intersection_ratio, 0.0);
    }

    #[test]
    fn test_fill_failure_yields_none() {
        let mut ctx = installed();
        let missing_target = IntersectionObserverEntryInit::default();
        assert!(missing_target.to_script_object(&mut ctx).is_none());
    }

    #[test]
    fn test_optional_dictionary_from_null_is_default() {
        let mut ctx = installed();
        let mut exception_state = ExceptionState::new();
        let parsed = EventInit::from_script_object(&mut ctx, &Value::Null, &mut exception_state);
        assert_eq!(parsed, Some(EventInit::default()));
        assert!(!exception_state.has_exception());
    }

    #[test]
    fn test_dictionary_to_script_object() {
        let mut ctx = installed();
        let options = ScrollToOptions {
            left: Some(4.0),
            top: None,
            behavior: ScrollBehavior::Smooth,
        };
        let object = options.to_script_object(&mut ctx).unwrap();
        assert_eq!(ctx.get_property(object, "left").unwrap(), Value::Smi(4));
        assert!(!ctx.has_property(object, "top").unwrap());
        assert_eq!(ctx.get_property(object, "behavior").unwrap(), Value::string("smooth"));
    }

    #[test]
    fn test_invalid_enum_member() {
        let mut ctx = installed();
        let init = plain_object(&mut ctx, &[("behavior", Value::string("fast"))]);
        let mut exception_state = ExceptionState::new();
        let parsed =
            ScrollToOptions::from_script_object(&mut ctx, &Value::Object(init), &mut exception_state);
        assert!(parsed.is_none());
        assert!(exception_state
            .exception()
            .unwrap()
            .message
            .contains("not a valid enum value of type ScrollBehavior"));
    }
}

#[cfg(test)]
mod gc_tests {
    use super::*;

    #[test]
    fn test_unreachable_wrapper_is_collected() {
        let mut ctx = installed();
        let params = ctx.wrap_native(SearchParams::parse("a=1")).unwrap();
        let status = ctx.alive_status(params).unwrap();
        ctx.collect_garbage();
        assert!(ctx.object(params).is_none());
        assert!(status.is_disposed());
    }

    #[test]
    fn test_iterator_keeps_its_collection_alive() {
        let mut ctx = installed();
        let params = ctx.wrap_native(SearchParams::parse("a=1&b=2")).unwrap();
        let keys = call_method(&mut ctx, &Value::Object(params), "keys", &[]);
        let global = ctx.global();
        ctx.set_property(global, "it", keys.clone()).unwrap();

        ctx.collect_garbage();
        assert!(ctx.object(params).is_some());
        let result = call_method(&mut ctx, &keys, "next", &[]);
        assert_eq!(ctx.get_value_property(&result, "value").unwrap(), Value::string("a"));

        assert!(ctx.delete_property(global, "it").unwrap());
        ctx.collect_garbage();
        assert!(ctx.object(params).is_none());
        assert!(ctx.object(keys.as_object().unwrap()).is_none());
    }

    #[test]
    fn test_keep_alive_holds_are_counted() {
        let mut ctx = installed();
        let object = ctx.wrap_native(StringMap::new()).unwrap();
        ctx.keep_alive(object).unwrap();
        ctx.keep_alive(object).unwrap();
        ctx.collect_garbage();
        assert!(ctx.release_alive(object));
        ctx.collect_garbage();
        assert!(ctx.object(object).is_some());
        assert!(ctx.release_alive(object));
        ctx.collect_garbage();
        assert!(ctx.object(object).is_none());
    }

    #[test]
    fn test_drain_collects_past_threshold() {
        let options = ContextOptions {
            gc_allocation_threshold: 1,
            ..ContextOptions::default()
        };
        let mut ctx = ScriptContext::new(options);
        ctx.enqueue_microtask(|ctx| {
            ctx.create_object();
        });
        let before = ctx.live_objects();
        assert_eq!(ctx.drain_microtasks(), 1);
        assert_eq!(ctx.live_objects(), before);
    }

    #[test]
    fn test_dispose_finalizes_held_objects() {
        let mut ctx = installed();
        let object = ctx.wrap_native(StringMap::new()).unwrap();
        ctx.keep_alive(object);
        let status = ctx.alive_status(object).unwrap();
        ctx.dispose();
        assert!(status.is_disposed());
        assert_eq!(ctx.live_objects(), 0);
    }
}

#[cfg(test)]
mod function_ref_tests {
    use super::*;

    fn adder(ctx: &mut ScriptContext) -> ObjectId {
        ctx.create_function("add", |_, _, args| {
            let sum: f64 = args.iter().filter_map(Value::as_number).sum();
            Ok(Value::number(sum))
        })
    }

    fn address(tagged: TaggedValue) -> *const c_void {
        tagged.into_function().expect("Should be a function reference")
    }

    #[test]
    fn test_invoke_decodes_args_and_encodes_result() {
        let mut ctx = installed();
        let add = adder(&mut ctx);
        let reference = address(create_function_ref(&mut ctx, add, false).unwrap());
        let result = invoke_function_ref(
            &mut ctx,
            reference,
            vec![TaggedValue::from_i64(2), TaggedValue::from_f64(0.5)],
        )
        .unwrap();
        assert_eq!(result.into_f64(), Ok(2.5));
    }

    #[test]
    fn test_reference_roots_its_callable() {
        let mut ctx = installed();
        let add = adder(&mut ctx);
        let reference = address(create_function_ref(&mut ctx, add, false).unwrap());
        ctx.collect_garbage();
        assert!(ctx.object(add).is_some());
        assert!(release_function_ref(&mut ctx, reference));
        ctx.collect_garbage();
        assert!(ctx.object(add).is_none());
    }

    #[test]
    fn test_released_reference_is_rejected() {
        let mut ctx = installed();
        let add = adder(&mut ctx);
        let reference = address(create_function_ref(&mut ctx, add, false).unwrap());
        assert_eq!(function_ref_count(&ctx), 1);
        assert!(release_function_ref(&mut ctx, reference));
        assert!(!release_function_ref(&mut ctx, reference));
        assert_eq!(function_ref_count(&ctx), 0);
        assert_eq!(
            invoke_function_ref(&mut ctx, reference, vec![TaggedValue::from_i64(1)]),
            Err(BindingError::Bridge(BridgeError::InvalidatedFunction))
        );
    }

    #[test]
    fn test_dispose_invalidates_references() {
        let mut ctx = installed();
        let add = adder(&mut ctx);
        let reference = address(create_function_ref(&mut ctx, add, false).unwrap());
        ctx.dispose();
        assert_eq!(
            resolve_function_ref(&ctx, reference),
            Err(BindingError::Bridge(BridgeError::InvalidatedFunction))
        );
    }

    #[test]
    fn test_non_callable_is_rejected() {
        let mut ctx = installed();
        let object = ctx.create_object();
        let err = create_function_ref(&mut ctx, object, false).unwrap_err();
        assert!(matches!(err, BindingError::Script(e) if e.kind == ErrorKind::TypeError));
    }

    #[test]
    fn test_script_error_propagates() {
        let mut ctx = installed();
        let thrower = ctx.create_function("thrower", |_, _, _| {
            Err(core_types::JsError::range_error("out of range"))
        });
        let reference = address(create_function_ref(&mut ctx, thrower, false).unwrap());
        let err = invoke_function_ref(&mut ctx, reference, Vec::new()).unwrap_err();
        assert_eq!(err.to_string(), "RangeError: out of range");
    }

    #[test]
    fn test_async_invocation_runs_at_drain() {
        let mut ctx = installed();
        let add = adder(&mut ctx);
        let tagged = create_function_ref(&mut ctx, add, true).unwrap();
        assert_eq!(tagged.tag(), Ok(Tag::AsyncFunction));
        let reference = tagged.into_async_function().unwrap();

        let outcome: Rc<RefCell<Option<BindingResult<TaggedValue>>>> = Rc::new(RefCell::new(None));
        let sink = Rc::clone(&outcome);
        invoke_async_function_ref(
            &mut ctx,
            reference,
            vec![TaggedValue::from_i64(40), TaggedValue::from_i64(2)],
            move |_, result| {
                *sink.borrow_mut() = Some(result);
            },
        );
        assert!(outcome.borrow().is_none());
        assert_eq!(ctx.pending_microtasks(), 1);
        assert_eq!(ctx.drain_microtasks(), 1);
        let result = outcome.borrow_mut().take().unwrap().unwrap();
        assert_eq!(result.into_i64(), Ok(42));
    }

    #[test]
    fn test_async_invocation_cancelled_by_dispose() {
        let mut ctx = installed();
        let add = adder(&mut ctx);
        let reference = create_function_ref(&mut ctx, add, true)
            .unwrap()
            .into_async_function()
            .unwrap();
        let outcome = Rc::new(RefCell::new(None));
        let sink = Rc::clone(&outcome);
        invoke_async_function_ref(
            &mut ctx,
            reference,
            vec![TaggedValue::from_string(value_bridge::NativeString::from_utf8("arg").unwrap())],
            move |_, result| {
                *sink.borrow_mut() = Some(result.map(|tagged| tagged.tag()));
            },
        );
        ctx.dispose();
        assert_eq!(ctx.drain_microtasks(), 0);
        assert_eq!(
            outcome.borrow_mut().take(),
            Some(Err(BindingError::Bridge(BridgeError::InvalidatedFunction)))
        );
        assert_eq!(ctx.pending_invocations(), 0);
    }

    #[test]
    fn test_async_invocation_after_release_reports_error() {
        let mut ctx = installed();
        let add = adder(&mut ctx);
        let reference = create_function_ref(&mut ctx, add, true)
            .unwrap()
            .into_async_function()
            .unwrap();
        let outcome = Rc::new(RefCell::new(None));
        let sink = Rc::clone(&outcome);
        invoke_async_function_ref(&mut ctx, reference, Vec::new(), move |_, result| {
            *sink.borrow_mut() = Some(result.map(|tagged| tagged.tag()));
        });
        release_function_ref(&mut ctx, reference);
        ctx.drain_microtasks();
        assert_eq!(
            outcome.borrow_mut().take(),
            Some(Err(BindingError::Bridge(BridgeError::InvalidatedFunction)))
        );
    }
}

#[cfg(test)]
mod boundary_tests {
    use super::*;

    #[test]
    fn test_plain_object_travels_as_json() {
        let mut ctx = installed();
        let inner = ctx.create_array(vec![Value::Smi(1), Value::Double(2.5)]);
        let object = plain_object(
            &mut ctx,
            &[
                ("list", Value::Object(inner)),
                ("name", Value::string("x")),
                ("skip", Value::Undefined),
            ],
        );
        let tagged = to_tagged(&mut ctx, &Value::Object(object)).unwrap();
        assert_eq!(tagged.tag(), Ok(Tag::Json));
        let json: serde_json::Value =
            serde_json::from_str(&tagged.into_json_text().unwrap()).unwrap();
        assert_eq!(json, serde_json::json!({"list": [1, 2.5], "name": "x"}));
    }

    #[test]
    fn test_json_becomes_fresh_objects() {
        let mut ctx = installed();
        let tagged = TaggedValue::from_json_text(r#"{"a":[1,"two"],"b":null}"#.to_string());
        let value = from_tagged(&mut ctx, tagged).unwrap();
        let a = ctx.get_value_property(&value, "a").unwrap();
        assert_eq!(ctx.get_value_property(&a, "1").unwrap(), Value::string("two"));
        assert_eq!(ctx.get_value_property(&value, "b").unwrap(), Value::Null);
    }

    #[test]
    fn test_malformed_json_is_rejected() {
        let mut ctx = installed();
        let tagged = TaggedValue::from_json_text("{".to_string());
        assert!(matches!(
            from_tagged(&mut ctx, tagged),
            Err(BindingError::Bridge(BridgeError::Json(_)))
        ));
    }

    #[test]
    fn test_arrays_travel_as_lists() {
        let mut ctx = installed();
        let array = ctx.create_array(vec![Value::Boolean(true), Value::string("s")]);
        let tagged = to_tagged(&mut ctx, &Value::Object(array)).unwrap();
        assert_eq!(tagged.tag(), Ok(Tag::List));
        let back = from_tagged(&mut ctx, tagged).unwrap();
        assert_ne!(back, Value::Object(array));
        assert_eq!(ctx.get_value_property(&back, "1").unwrap(), Value::string("s"));
    }

    #[test]
    fn test_cyclic_array_is_rejected() {
        let mut ctx = installed();
        let array = ctx.create_array(Vec::new());
        ctx.set_property(array, "0", Value::Object(array)).unwrap();
        let err = to_tagged(&mut ctx, &Value::Object(array)).unwrap_err();
        assert!(matches!(err, BindingError::Script(e) if e.kind == ErrorKind::TypeError));
    }

    #[test]
    fn test_list_limit() {
        let options = ContextOptions {
            max_list_length: 2,
            ..ContextOptions::default()
        };
        let mut ctx = ScriptContext::new(options);
        let tagged = TaggedValue::from_list(vec![
            TaggedValue::from_i64(1),
            TaggedValue::from_i64(2),
            TaggedValue::from_i64(3),
        ]);
        assert!(matches!(
            from_tagged(&mut ctx, tagged),
            Err(BindingError::Bridge(BridgeError::LimitExceeded { got: 3, max: 2, .. }))
        ));
    }

    #[test]
    fn test_failed_list_encode_releases_what_it_registered() {
        let options = ContextOptions {
            max_string_length: 2,
            ..ContextOptions::default()
        };
        let mut ctx = ScriptContext::new(options);
        install_bindings(&mut ctx).unwrap();
        let params = ctx.wrap_native(SearchParams::new()).unwrap();
        let callback = ctx.create_function("cb", |_, _, _| Ok(Value::Null));
        let inner = ctx.create_array(vec![Value::Object(callback), Value::Object(params)]);
        let array = ctx.create_array(vec![
            Value::Object(params),
            Value::Object(callback),
            Value::Object(inner),
            Value::string("too long"),
        ]);

        let err = to_tagged(&mut ctx, &Value::Object(array)).unwrap_err();
        assert!(matches!(
            err,
            BindingError::Bridge(BridgeError::LimitExceeded { what: "string", .. })
        ));
        assert_eq!(function_ref_count(&ctx), 0);

        ctx.collect_garbage();
        assert!(ctx.object(params).is_none());
        assert!(ctx.object(callback).is_none());
    }

    #[test]
    fn test_far_array_index_stays_cheap() {
        let mut ctx = installed();
        let array = ctx.create_array(vec![Value::Smi(0)]);
        assert!(ctx.set_property(array, "4294967294", Value::Smi(1)).unwrap());
        assert_eq!(ctx.get_property(array, "4294967294").unwrap(), Value::Smi(1));
        assert_eq!(
            ctx.get_property(array, "length").unwrap(),
            Value::from_i64(4_294_967_295)
        );
        assert_eq!(
            ctx.own_keys(array).unwrap(),
            vec!["0".to_string(), "4294967294".to_string()]
        );
        assert!(matches!(
            to_tagged(&mut ctx, &Value::Object(array)),
            Err(BindingError::Bridge(BridgeError::LimitExceeded { what: "list", .. }))
        ));

        assert!(ctx.set_property(array, "length", Value::Smi(1)).unwrap());
        let tagged = to_tagged(&mut ctx, &Value::Object(array)).unwrap();
        assert_eq!(from_tagged(&mut ctx, tagged).map(|v| v.as_object().is_some()), Ok(true));
    }

    #[test]
    fn test_wrapper_round_trips_by_address() {
        let mut ctx = installed();
        let params = ctx.wrap_native(SearchParams::new()).unwrap();
        let tagged = to_tagged(&mut ctx, &Value::Object(params)).unwrap();
        assert_eq!(tagged.pointer_kind(), Ok(PointerKind::BindingObject));
        let (address, _) = tagged.into_pointer().unwrap();

        ctx.collect_garbage();
        assert!(ctx.object(params).is_some());
        let again = to_tagged(&mut ctx, &Value::Object(params))
            .unwrap()
            .into_pointer()
            .unwrap()
            .0;
        assert_eq!(again, address);

        let back = from_tagged(
            &mut ctx,
            TaggedValue::from_pointer(address, PointerKind::BindingObject),
        )
        .unwrap();
        assert_eq!(back, Value::Object(params));

        assert!(ctx.release_binding_object(address));
        assert!(ctx.release_binding_object(address));
        assert!(!ctx.release_binding_object(address));
        ctx.collect_garbage();
        assert!(ctx.object(params).is_none());
    }

    #[test]
    fn test_host_rect_is_wrapped() {
        let mut ctx = installed();
        let address = 0x1000 as *const c_void;
        let value = from_tagged(
            &mut ctx,
            TaggedValue::from_pointer(address, PointerKind::BoundingRect),
        )
        .unwrap();
        assert!(ctx.is_instance_of(&value, &BOUNDING_CLIENT_RECT));
        let held = ctx.with_wrappable(value.as_object().unwrap(), |host: &bindings::HostObject| {
            host.address()
        });
        assert_eq!(held, Some(address));
    }

    #[test]
    fn test_null_pointer_is_null() {
        let mut ctx = installed();
        let tagged = TaggedValue::from_pointer(std::ptr::null(), PointerKind::BoundingRect);
        assert_eq!(from_tagged(&mut ctx, tagged).unwrap(), Value::Null);
    }

    #[test]
    fn test_async_context_pointer_is_unsupported() {
        let mut ctx = installed();
        let tagged = TaggedValue::from_pointer(0x10 as *const c_void, PointerKind::AsyncContext);
        assert_eq!(
            from_tagged(&mut ctx, tagged),
            Err(BindingError::Bridge(BridgeError::UnsupportedPointerKind(
                PointerKind::AsyncContext
            )))
        );
    }

    #[test]
    fn test_function_travels_as_reference() {
        let mut ctx = installed();
        let f = ctx.create_function("f", |_, _, _| Ok(Value::Undefined));
        let tagged = to_tagged(&mut ctx, &Value::Object(f)).unwrap();
        assert_eq!(tagged.tag(), Ok(Tag::Function));
        assert_eq!(from_tagged(&mut ctx, tagged).unwrap(), Value::Object(f));
    }

    #[test]
    fn test_constructor_encodes_as_null() {
        let mut ctx = installed();
        let ctor = global_constructor(&mut ctx, "URLSearchParams");
        let proto = ctx.prototype_for_type(&URL_SEARCH_PARAMS).unwrap();
        assert!(!ctx.is_instance_of(&Value::Object(proto), &URL_SEARCH_PARAMS));
        let tagged = to_tagged(&mut ctx, &Value::Object(ctor)).unwrap();
        assert_eq!(tagged.tag(), Ok(Tag::Null));
    }
}

#[cfg(test)]
mod microtask_tests {
    use super::*;

    #[test]
    fn test_nested_microtasks_run_in_order() {
        let mut ctx = ScriptContext::new(ContextOptions::default());
        let log = Rc::new(RefCell::new(Vec::new()));
        let outer = Rc::clone(&log);
        ctx.enqueue_microtask(move |ctx| {
            outer.borrow_mut().push("first");
            let inner = Rc::clone(&outer);
            ctx.enqueue_microtask(move |_| inner.borrow_mut().push("nested"));
        });
        let second = Rc::clone(&log);
        ctx.enqueue_microtask(move |_| second.borrow_mut().push("second"));
        assert_eq!(ctx.drain_microtasks(), 3);
        assert_eq!(*log.borrow(), vec!["first", "second", "nested"]);
        assert_eq!(ctx.pending_microtasks(), 0);
    }

    #[test]
    fn test_dispose_inside_microtask_stops_the_drain() {
        let mut ctx = ScriptContext::new(ContextOptions::default());
        let ran = Rc::new(RefCell::new(0));
        ctx.enqueue_microtask(|ctx| ctx.dispose());
        let counter = Rc::clone(&ran);
        ctx.enqueue_microtask(move |_| *counter.borrow_mut() += 1);
        ctx.drain_microtasks();
        assert_eq!(*ran.borrow(), 0);
        assert!(ctx.is_disposed());
    }

    #[test]
    fn test_pinned_handle_survives_until_microtask_runs() {
        let mut ctx = ScriptContext::new(ContextOptions::default());
        let target = ctx.create_object();
        ctx.set_property(target, "n", Value::Smi(5)).unwrap();
        let status = ctx.keep_alive(target).unwrap();
        let seen = Rc::new(RefCell::new(None));
        let sink = Rc::clone(&seen);
        ctx.enqueue_microtask(move |ctx| {
            *sink.borrow_mut() = ctx.get_property(target, "n").ok();
            ctx.release_alive(target);
        });

        ctx.collect_garbage();
        assert!(!status.is_disposed());
        ctx.drain_microtasks();
        assert_eq!(*seen.borrow(), Some(Value::Smi(5)));

        ctx.collect_garbage();
        assert!(status.is_disposed());
    }
}
