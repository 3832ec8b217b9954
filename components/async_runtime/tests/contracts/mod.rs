//! Contract tests for async_runtime component
//!
//! These tests pin the queue surface a script context relies on.

use async_runtime::{Microtask, MicrotaskQueue};

mod microtask_queue_contract {
    use super::*;

    #[test]
    fn queue_new_returns_self() {
        let queue = MicrotaskQueue::new();
        let _ = queue;
    }

    #[test]
    fn queue_default_is_empty() {
        let queue: MicrotaskQueue = MicrotaskQueue::default();
        assert!(queue.is_empty());
    }

    #[test]
    fn enqueue_takes_shared_reference() {
        let queue = MicrotaskQueue::new();
        let alias = &queue;
        alias.enqueue(Microtask::new(|| {}));
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn drain_returns_executed_count() {
        let queue = MicrotaskQueue::new();
        queue.enqueue(Microtask::new(|| {}));
        queue.enqueue(Microtask::new(|| {}));
        let executed: usize = queue.drain();
        assert_eq!(executed, 2);
    }

    #[test]
    fn clones_share_one_queue() {
        let queue = MicrotaskQueue::new();
        let clone = queue.clone();
        clone.enqueue(Microtask::new(|| {}));
        assert_eq!(queue.len(), 1);
        queue.clear();
        assert!(clone.is_empty());
    }
}

mod microtask_contract {
    use super::*;

    #[test]
    fn microtask_with_data_runs_callback() {
        fn bump(cell: std::rc::Rc<std::cell::Cell<u8>>) {
            cell.set(cell.get() + 1);
        }
        let cell = std::rc::Rc::new(std::cell::Cell::new(0));
        Microtask::<()>::with_data(bump, cell.clone()).run();
        assert_eq!(cell.get(), 1);
    }
}
