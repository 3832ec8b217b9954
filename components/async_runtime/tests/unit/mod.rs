//! Unit tests for MicrotaskQueue

use async_runtime::{Microtask, MicrotaskQueue};
use std::cell::RefCell;
use std::rc::Rc;

type Log = Rc<RefCell<Vec<&'static str>>>;

fn record(log: &Log, name: &'static str) -> Microtask {
    let log = log.clone();
    Microtask::new(move || log.borrow_mut().push(name))
}

#[test]
fn new_queue_is_empty() {
    let queue = MicrotaskQueue::new();
    assert!(queue.is_empty());
    assert_eq!(queue.len(), 0);
}

#[test]
fn enqueue_adds_to_tail() {
    let queue = MicrotaskQueue::new();
    let log: Log = Rc::default();
    queue.enqueue(record(&log, "first"));
    queue.enqueue(record(&log, "second"));
    assert_eq!(queue.len(), 2);
    assert!(log.borrow().is_empty());
}

#[test]
fn drain_runs_in_fifo_order() {
    let queue = MicrotaskQueue::new();
    let log: Log = Rc::default();
    for name in ["one", "two", "three"] {
        queue.enqueue(record(&log, name));
    }
    assert_eq!(queue.drain(), 3);
    assert_eq!(*log.borrow(), vec!["one", "two", "three"]);
    assert!(queue.is_empty());
}

#[test]
fn reentrant_enqueue_runs_after_earlier_entries() {
    let queue = MicrotaskQueue::new();
    let log: Log = Rc::default();

    let (q, l) = (queue.clone(), log.clone());
    queue.enqueue(Microtask::new(move || {
        l.borrow_mut().push("A");
        q.enqueue(record(&l, "C"));
    }));
    queue.enqueue(record(&log, "B"));

    assert_eq!(queue.drain(), 3);
    assert_eq!(*log.borrow(), vec!["A", "B", "C"]);
}

#[test]
fn reentrant_chain_drains_fully() {
    fn step(queue: MicrotaskQueue, counter: Rc<RefCell<u32>>) {
        let mut count = counter.borrow_mut();
        *count += 1;
        if *count < 5 {
            let next = queue.clone();
            let counter = counter.clone();
            queue.enqueue(Microtask::new(move || step(next, counter)));
        }
    }

    let queue = MicrotaskQueue::new();
    let counter = Rc::new(RefCell::new(0));
    let (q, c) = (queue.clone(), counter.clone());
    queue.enqueue(Microtask::new(move || step(q, c)));

    assert_eq!(queue.drain(), 5);
    assert_eq!(*counter.borrow(), 5);
}

#[test]
fn clearing_during_drain_terminates() {
    let queue = MicrotaskQueue::new();
    let log: Log = Rc::default();

    let (q, l) = (queue.clone(), log.clone());
    queue.enqueue(Microtask::new(move || {
        l.borrow_mut().push("clear");
        q.clear();
    }));
    queue.enqueue(record(&log, "dropped"));
    queue.enqueue(record(&log, "also dropped"));

    assert_eq!(queue.drain(), 1);
    assert_eq!(*log.borrow(), vec!["clear"]);
    assert!(queue.is_empty());
}

#[test]
fn enqueue_after_clear_inside_callback_still_runs() {
    let queue = MicrotaskQueue::new();
    let log: Log = Rc::default();

    let (q, l) = (queue.clone(), log.clone());
    queue.enqueue(Microtask::new(move || {
        q.clear();
        q.enqueue(record(&l, "late"));
    }));
    queue.enqueue(record(&log, "dropped"));

    assert_eq!(queue.drain(), 2);
    assert_eq!(*log.borrow(), vec!["late"]);
}

#[test]
fn enqueue_fn_carries_opaque_data() {
    let queue = MicrotaskQueue::new();
    let log: Log = Rc::default();
    queue.enqueue_fn(|(log, name): (Log, &'static str)| log.borrow_mut().push(name), (log.clone(), "data"));
    queue.drain();
    assert_eq!(*log.borrow(), vec!["data"]);
}

#[test]
fn entries_are_dropped_after_running() {
    let queue = MicrotaskQueue::new();
    let token = Rc::new(());
    let held = token.clone();
    queue.enqueue(Microtask::new(move || drop(held)));
    assert_eq!(Rc::strong_count(&token), 2);
    queue.drain();
    assert_eq!(Rc::strong_count(&token), 1);
}
