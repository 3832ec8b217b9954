//! Memory Manager and Bindings Integration Tests
//!
//! Verifies that wrapper lifetimes follow reachability through the heap:
//! traced native state, host holds and context disposal.

use bindings::{
    install_bindings, to_tagged, ContextOptions, ObjectList, ScriptContext, SearchParams,
};
use core_types::Value;

fn installed(options: ContextOptions) -> ScriptContext {
    let mut ctx = ScriptContext::new(options);
    install_bindings(&mut ctx).expect("Should install bindings");
    ctx
}

/// Test: objects referenced only from native state survive collection
#[test]
fn test_native_state_is_traced() {
    let mut ctx = installed(ContextOptions::default());
    let a = ctx.create_object();
    let b = ctx.create_object();
    let list = ctx.wrap_native(ObjectList::new(vec![a])).unwrap();
    ctx.keep_alive(list);
    ctx.with_wrappable_mut(list, |items: &mut ObjectList| items.push(b))
        .unwrap();

    let stats = ctx.collect_garbage();
    assert!(ctx.object(a).is_some());
    assert!(ctx.object(b).is_some());
    assert_eq!(stats.live_objects, ctx.live_objects());
}

/// Test: a host hold keeps a wrapper alive until the host lets go
#[test]
fn test_host_hold_until_release() {
    let mut ctx = installed(ContextOptions::default());
    let params = ctx.wrap_native(SearchParams::parse("a=1")).unwrap();
    let (address, _) = to_tagged(&mut ctx, &Value::Object(params))
        .unwrap()
        .into_pointer()
        .unwrap();
    for _ in 0..3 {
        ctx.collect_garbage();
        assert!(ctx.object(params).is_some());
    }
    assert_eq!(ctx.binding_object(address), Some(params));
    assert!(ctx.release_binding_object(address));
    ctx.collect_garbage();
    assert!(ctx.object(params).is_none());
    assert_eq!(ctx.binding_object(address), None);
}

/// Test: draining microtasks collects short-lived objects past the threshold
#[test]
fn test_drain_is_a_collection_point() {
    let options = ContextOptions {
        gc_allocation_threshold: 8,
        ..ContextOptions::default()
    };
    let mut ctx = installed(options);
    ctx.collect_garbage();
    let baseline = ctx.live_objects();
    ctx.enqueue_microtask(|ctx| {
        for _ in 0..16 {
            ctx.create_object();
        }
    });
    ctx.drain_microtasks();
    assert_eq!(ctx.live_objects(), baseline);
}

/// Test: below the threshold nothing is collected at a drain
#[test]
fn test_drain_below_threshold_keeps_garbage() {
    let options = ContextOptions {
        gc_allocation_threshold: 1000,
        ..ContextOptions::default()
    };
    let mut ctx = installed(options);
    ctx.collect_garbage();
    let baseline = ctx.live_objects();
    ctx.enqueue_microtask(|ctx| {
        ctx.create_object();
    });
    ctx.drain_microtasks();
    assert_eq!(ctx.live_objects(), baseline + 1);
}

/// Test: disposal finalizes everything, held or not
#[test]
fn test_dispose_finalizes_everything() {
    let mut ctx = installed(ContextOptions::default());
    let held = ctx.wrap_native(SearchParams::new()).unwrap();
    ctx.keep_alive(held);
    let status = ctx.alive_status(held).unwrap();
    assert!(!status.is_disposed());
    ctx.dispose();
    assert!(status.is_disposed());
    assert_eq!(ctx.live_objects(), 0);
    assert!(ctx.wrap_native(SearchParams::new()).is_err());
}
