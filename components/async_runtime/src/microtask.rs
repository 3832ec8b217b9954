//! Microtask queue management.
//!
//! A context owns exactly one queue. Callbacks run in strict enqueue order,
//! including callbacks enqueued by a running microtask, and the drain loop
//! returns only once the queue is empty.
//!
//! The queue is generic over the context `C` a callback receives while it
//! runs. Queues that need no context use the default `C = ()`.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::fmt;
use std::rc::Rc;

/// A queued callback together with the data it captured.
///
/// The microtask is destroyed immediately after it runs.
pub struct Microtask<C = ()> {
    callback: Box<dyn FnOnce(&mut C)>,
}

impl Microtask<()> {
    /// Creates a microtask from a closure that needs no context.
    pub fn new<F>(f: F) -> Self
    where
        F: FnOnce() + 'static,
    {
        Self::with_context(move |_: &mut ()| f())
    }
}

impl<C> Microtask<C> {
    /// Creates a microtask that receives the draining context.
    pub fn with_context<F>(f: F) -> Self
    where
        F: FnOnce(&mut C) + 'static,
    {
        Self {
            callback: Box::new(f),
        }
    }

    /// Creates a microtask from a plain callback and the opaque data passed to it.
    pub fn with_data<D: 'static>(callback: fn(D), data: D) -> Self {
        Self::with_context(move |_: &mut C| callback(data))
    }

    /// Runs the microtask against `cx`, consuming it.
    pub fn run_with(self, cx: &mut C) {
        (self.callback)(cx)
    }
}

impl Microtask<()> {
    /// Runs the microtask, consuming it.
    pub fn run(self) {
        self.run_with(&mut ())
    }
}

impl<C> fmt::Debug for Microtask<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Microtask {{ ... }}")
    }
}

/// FIFO queue of microtasks for one script context.
///
/// The handle is cheap to clone; clones share the same queue, which is how a
/// running microtask enqueues follow-up work. The queue is `!Send`: it belongs
/// to the thread of its context.
///
/// Failures inside a callback are the callback's responsibility. The queue
/// guarantees ordering only.
///
/// # Examples
///
/// ```
/// use async_runtime::{Microtask, MicrotaskQueue};
/// use std::cell::RefCell;
/// use std::rc::Rc;
///
/// let queue = MicrotaskQueue::new();
/// let log = Rc::new(RefCell::new(Vec::new()));
///
/// let (q, l) = (queue.clone(), log.clone());
/// queue.enqueue(Microtask::new(move || {
///     l.borrow_mut().push("A");
///     let l = l.clone();
///     q.enqueue(Microtask::new(move || l.borrow_mut().push("C")));
/// }));
/// let l = log.clone();
/// queue.enqueue(Microtask::new(move || l.borrow_mut().push("B")));
///
/// assert_eq!(queue.drain(), 3);
/// assert_eq!(*log.borrow(), vec!["A", "B", "C"]);
/// ```
pub struct MicrotaskQueue<C = ()> {
    queue: Rc<RefCell<VecDeque<Microtask<C>>>>,
}

impl MicrotaskQueue<()> {
    /// Creates a new empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs microtasks until the queue is empty and returns how many ran.
    pub fn drain(&self) -> usize {
        self.drain_with(&mut ())
    }
}

impl<C> MicrotaskQueue<C> {
    /// Creates a new empty queue whose callbacks receive a `C`.
    pub fn for_context() -> Self {
        Self {
            queue: Rc::new(RefCell::new(VecDeque::new())),
        }
    }

    /// Appends a microtask to the tail of the queue.
    pub fn enqueue(&self, microtask: Microtask<C>) {
        self.queue.borrow_mut().push_back(microtask);
    }

    /// Appends a callback with its opaque data.
    pub fn enqueue_fn<D: 'static>(&self, callback: fn(D), data: D) {
        self.enqueue(Microtask::with_data(callback, data));
    }

    /// Runs microtasks against `cx` until the queue is empty and returns how
    /// many ran.
    ///
    /// Emptiness is re-checked after every invocation, so microtasks enqueued
    /// while draining run before this returns, and a callback that clears the
    /// queue simply ends the loop.
    pub fn drain_with(&self, cx: &mut C) -> usize {
        let mut executed = 0;
        loop {
            // The borrow ends before the callback runs so it can enqueue.
            let next = self.queue.borrow_mut().pop_front();
            match next {
                Some(microtask) => {
                    microtask.run_with(cx);
                    executed += 1;
                }
                None => break,
            }
        }
        if executed > 0 {
            log::trace!("drained {} microtasks", executed);
        }
        executed
    }

    /// Drops every pending microtask without running it. Returns how many
    /// were dropped.
    pub fn clear(&self) -> usize {
        // Taken out first so dropped captures may touch the queue.
        let pending = std::mem::take(&mut *self.queue.borrow_mut());
        pending.len()
    }

    /// Returns true if no microtask is pending.
    pub fn is_empty(&self) -> bool {
        self.queue.borrow().is_empty()
    }

    /// Returns the number of pending microtasks.
    pub fn len(&self) -> usize {
        self.queue.borrow().len()
    }
}

impl<C> Clone for MicrotaskQueue<C> {
    fn clone(&self) -> Self {
        Self {
            queue: Rc::clone(&self.queue),
        }
    }
}

impl<C> Default for MicrotaskQueue<C> {
    fn default() -> Self {
        Self::for_context()
    }
}

impl<C> fmt::Debug for MicrotaskQueue<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MicrotaskQueue")
            .field("pending", &self.len())
            .finish()
    }
}
