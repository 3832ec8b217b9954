//! Tracing contract between the collector and the objects it manages.
//!
//! Every native object reachable from script implements [`Trace`]. During the
//! mark phase the heap hands each gray object a [`Visitor`]; the object reports
//! every handle it owns, directly or through composed parts, and the visitor
//! queues them for marking.

use core_types::{ObjectId, Value};
use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

/// Mark colors for tri-color marking.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum MarkColor {
    /// Unmarked (not yet visited)
    White = 0,
    /// In process (reachable, needs scanning)
    Gray = 1,
    /// Fully processed (reachable, all references scanned)
    Black = 2,
}

/// Reports the handles an object keeps alive.
///
/// Implementations must forward to every owned traced child, including
/// handles reachable only through shared state such as an iteration source.
/// A handle that is not reported may be collected while still referenced.
///
/// # Examples
///
/// ```
/// use core_types::ObjectId;
/// use memory_manager::{Trace, Visitor};
///
/// struct Pair {
///     first: ObjectId,
///     second: Option<ObjectId>,
/// }
///
/// impl Trace for Pair {
///     fn trace(&self, visitor: &mut Visitor) {
///         self.first.trace(visitor);
///         self.second.trace(visitor);
///     }
/// }
///
/// let mut visitor = Visitor::new();
/// Pair { first: ObjectId::new(1, 0), second: None }.trace(&mut visitor);
/// assert_eq!(visitor.pending(), 1);
/// ```
pub trait Trace {
    /// Reports every handle owned by `self` to `visitor`.
    fn trace(&self, visitor: &mut Visitor);
}

/// Gray worklist filled while tracing.
///
/// A visitor that met a cell it could not read is incomplete: the children
/// behind that cell are unknown, so the marking it drove cannot justify a
/// sweep.
#[derive(Debug, Default)]
pub struct Visitor {
    worklist: VecDeque<ObjectId>,
    visited: usize,
    incomplete: bool,
}

impl Visitor {
    /// Creates an empty visitor.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a handle for marking.
    pub fn visit(&mut self, id: ObjectId) {
        self.visited += 1;
        self.worklist.push_back(id);
    }

    /// Reports a value, queueing it when it is an object.
    pub fn visit_value(&mut self, value: &Value) {
        if let Value::Object(id) = value {
            self.visit(*id);
        }
    }

    /// Takes the next queued handle.
    pub fn pop(&mut self) -> Option<ObjectId> {
        self.worklist.pop_front()
    }

    /// Number of handles still queued.
    pub fn pending(&self) -> usize {
        self.worklist.len()
    }

    /// Total number of handles reported so far.
    pub fn visited(&self) -> usize {
        self.visited
    }

    /// Records that some children could not be reported.
    pub fn mark_incomplete(&mut self) {
        self.incomplete = true;
    }

    /// False once any traced object failed to report its children.
    pub fn is_complete(&self) -> bool {
        !self.incomplete
    }
}

impl Trace for ObjectId {
    fn trace(&self, visitor: &mut Visitor) {
        visitor.visit(*self);
    }
}

impl Trace for Value {
    fn trace(&self, visitor: &mut Visitor) {
        visitor.visit_value(self);
    }
}

impl<T: Trace> Trace for Option<T> {
    fn trace(&self, visitor: &mut Visitor) {
        if let Some(inner) = self {
            inner.trace(visitor);
        }
    }
}

impl<T: Trace> Trace for [T] {
    fn trace(&self, visitor: &mut Visitor) {
        for item in self {
            item.trace(visitor);
        }
    }
}

impl<T: Trace> Trace for Vec<T> {
    fn trace(&self, visitor: &mut Visitor) {
        self.as_slice().trace(visitor);
    }
}

impl<T: Trace + ?Sized> Trace for Box<T> {
    fn trace(&self, visitor: &mut Visitor) {
        (**self).trace(visitor);
    }
}

impl<T: Trace + ?Sized> Trace for Rc<T> {
    fn trace(&self, visitor: &mut Visitor) {
        (**self).trace(visitor);
    }
}

impl<T: Trace + ?Sized> Trace for RefCell<T> {
    fn trace(&self, visitor: &mut Visitor) {
        match self.try_borrow() {
            Ok(inner) => inner.trace(visitor),
            Err(_) => {
                log::debug!("traced cell is mutably borrowed; marking is incomplete");
                visitor.mark_incomplete();
            }
        }
    }
}

impl<A: Trace, B: Trace> Trace for (A, B) {
    fn trace(&self, visitor: &mut Visitor) {
        self.0.trace(visitor);
        self.1.trace(visitor);
    }
}

macro_rules! impl_leaf_trace {
    ($($ty:ty),* $(,)?) => {
        $(
            impl Trace for $ty {
                fn trace(&self, _visitor: &mut Visitor) {}
            }
        )*
    };
}

impl_leaf_trace!(bool, i32, i64, u32, u64, f64, String, core_types::JsString);
