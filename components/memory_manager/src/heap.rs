//! Arena heap with mark-and-sweep collection.
//!
//! Objects live in slots addressed by [`ObjectId`]. A slot's generation is
//! bumped whenever its object is swept, so stale handles never resolve to a
//! newer occupant. Collection is a stop-the-world tri-color mark from the
//! caller's roots plus every keep-alive hold, followed by a sweep that drops
//! each unmarked object.

use crate::{MarkColor, Trace, Visitor};
use core_types::ObjectId;
use std::cell::Cell;
use std::collections::HashMap;
use std::rc::Rc;

/// Shared liveness flag for an object handed across the boundary.
///
/// Each heap object has one status block. Holders of an `AliveStatus` can
/// observe that the object has been finalized without resolving its handle.
#[derive(Debug, Clone)]
pub struct AliveStatus {
    disposed: Rc<Cell<bool>>,
}

impl AliveStatus {
    fn new() -> Self {
        Self {
            disposed: Rc::new(Cell::new(false)),
        }
    }

    /// True once the object has been finalized.
    pub fn is_disposed(&self) -> bool {
        self.disposed.get()
    }

    fn mark_disposed(&self) {
        self.disposed.set(true);
    }
}

/// Statistics reported by one collection cycle.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct GcStats {
    /// Objects found reachable
    pub objects_marked: usize,
    /// Objects finalized by the sweep
    pub objects_swept: usize,
    /// Objects alive after the cycle
    pub live_objects: usize,
    /// Completed collections, this one included
    pub collections: usize,
    /// The sweep was skipped because some object could not be traced
    pub sweep_skipped: bool,
}

struct HeapCell<T> {
    value: T,
    color: MarkColor,
    status: AliveStatus,
}

struct Slot<T> {
    generation: u32,
    cell: Option<HeapCell<T>>,
}

/// Heap of traced objects.
///
/// # Examples
///
/// ```
/// use core_types::ObjectId;
/// use memory_manager::{Heap, Trace, Visitor};
///
/// struct Node(Option<ObjectId>);
///
/// impl Trace for Node {
///     fn trace(&self, visitor: &mut Visitor) {
///         self.0.trace(visitor);
///     }
/// }
///
/// let mut heap = Heap::new();
/// let leaf = heap.allocate(Node(None));
/// let root = heap.allocate(Node(Some(leaf)));
/// let garbage = heap.allocate(Node(None));
///
/// let stats = heap.collect_garbage([root]);
/// assert_eq!(stats.objects_swept, 1);
/// assert!(heap.contains(leaf));
/// assert!(!heap.contains(garbage));
/// ```
pub struct Heap<T: Trace> {
    slots: Vec<Slot<T>>,
    free_list: Vec<u32>,
    holds: HashMap<ObjectId, usize>,
    live: usize,
    allocations_since_collection: usize,
    collections: usize,
}

impl<T: Trace> Heap<T> {
    /// Creates an empty heap.
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            free_list: Vec::new(),
            holds: HashMap::new(),
            live: 0,
            allocations_since_collection: 0,
            collections: 0,
        }
    }

    /// Moves `value` into the heap and returns its handle.
    pub fn allocate(&mut self, value: T) -> ObjectId {
        let cell = HeapCell {
            value,
            color: MarkColor::White,
            status: AliveStatus::new(),
        };
        self.live += 1;
        self.allocations_since_collection += 1;
        if let Some(index) = self.free_list.pop() {
            let slot = &mut self.slots[index as usize];
            slot.cell = Some(cell);
            return ObjectId::new(index, slot.generation);
        }
        let index = self.slots.len() as u32;
        self.slots.push(Slot {
            generation: 0,
            cell: Some(cell),
        });
        ObjectId::new(index, 0)
    }

    fn cell(&self, id: ObjectId) -> Option<&HeapCell<T>> {
        let slot = self.slots.get(id.index() as usize)?;
        if slot.generation != id.generation() {
            return None;
        }
        slot.cell.as_ref()
    }

    fn cell_mut(&mut self, id: ObjectId) -> Option<&mut HeapCell<T>> {
        let slot = self.slots.get_mut(id.index() as usize)?;
        if slot.generation != id.generation() {
            return None;
        }
        slot.cell.as_mut()
    }

    /// Resolves a handle. Stale handles resolve to `None`.
    pub fn get(&self, id: ObjectId) -> Option<&T> {
        self.cell(id).map(|cell| &cell.value)
    }

    /// Resolves a handle mutably.
    pub fn get_mut(&mut self, id: ObjectId) -> Option<&mut T> {
        self.cell_mut(id).map(|cell| &mut cell.value)
    }

    /// Whether the handle refers to a live object.
    pub fn contains(&self, id: ObjectId) -> bool {
        self.cell(id).is_some()
    }

    /// Number of live objects.
    pub fn len(&self) -> usize {
        self.live
    }

    /// True when the heap holds no objects.
    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    /// Allocations since the last completed collection.
    pub fn allocations_since_collection(&self) -> usize {
        self.allocations_since_collection
    }

    /// Iterates live objects in slot order.
    pub fn iter(&self) -> impl Iterator<Item = (ObjectId, &T)> + '_ {
        self.slots.iter().enumerate().filter_map(|(index, slot)| {
            slot.cell
                .as_ref()
                .map(|cell| (ObjectId::new(index as u32, slot.generation), &cell.value))
        })
    }

    /// The liveness status of an object.
    pub fn status(&self, id: ObjectId) -> Option<AliveStatus> {
        self.cell(id).map(|cell| cell.status.clone())
    }

    /// Adds a keep-alive hold. While any hold exists the object is a root.
    ///
    /// Returns `None` for a stale handle.
    pub fn keep_alive(&mut self, id: ObjectId) -> Option<AliveStatus> {
        let status = self.status(id)?;
        *self.holds.entry(id).or_insert(0) += 1;
        Some(status)
    }

    /// Removes one keep-alive hold. Returns false when the object had none.
    pub fn release_alive(&mut self, id: ObjectId) -> bool {
        match self.holds.get_mut(&id) {
            Some(count) if *count > 1 => {
                *count -= 1;
                true
            }
            Some(_) => {
                self.holds.remove(&id);
                true
            }
            None => false,
        }
    }

    /// Number of keep-alive holds on an object.
    pub fn hold_count(&self, id: ObjectId) -> usize {
        self.holds.get(&id).copied().unwrap_or(0)
    }

    /// The mark color left on an object by the last collection.
    pub fn color(&self, id: ObjectId) -> Option<MarkColor> {
        self.cell(id).map(|cell| cell.color)
    }

    /// Runs a full collection.
    ///
    /// Everything reachable from `roots` or from a keep-alive hold survives;
    /// every other object is dropped and its status flagged disposed.
    ///
    /// When an object could not report its children (a cell mutably borrowed
    /// by running native code) nothing is swept and the allocation count is
    /// kept, so the next safe point tries again.
    pub fn collect_garbage<I>(&mut self, roots: I) -> GcStats
    where
        I: IntoIterator<Item = ObjectId>,
    {
        let mut visitor = Visitor::new();
        for root in roots {
            visitor.visit(root);
        }
        self.collect_from(visitor)
    }

    /// Runs a full collection seeded by a visitor the owner has already
    /// traced its roots into. An incomplete visitor skips the sweep.
    pub fn collect_from(&mut self, mut visitor: Visitor) -> GcStats {
        for slot in &mut self.slots {
            if let Some(cell) = slot.cell.as_mut() {
                cell.color = MarkColor::White;
            }
        }

        let held: Vec<ObjectId> = self.holds.keys().copied().collect();
        for id in held {
            visitor.visit(id);
        }

        let marked = self.mark(&mut visitor);
        let sweep_skipped = !visitor.is_complete();
        let swept = if sweep_skipped {
            log::debug!("gc: tracing incomplete, sweep skipped");
            0
        } else {
            self.allocations_since_collection = 0;
            self.sweep()
        };

        self.collections += 1;
        let stats = GcStats {
            objects_marked: marked,
            objects_swept: swept,
            live_objects: self.live,
            collections: self.collections,
            sweep_skipped,
        };
        log::trace!(
            "gc #{}: marked {}, swept {}, live {}",
            stats.collections,
            stats.objects_marked,
            stats.objects_swept,
            stats.live_objects
        );
        stats
    }

    fn mark(&mut self, visitor: &mut Visitor) -> usize {
        let mut marked = 0;
        while let Some(id) = visitor.pop() {
            match self.cell_mut(id) {
                Some(cell) if cell.color == MarkColor::White => cell.color = MarkColor::Gray,
                _ => continue,
            }
            if let Some(cell) = self.cell(id) {
                cell.value.trace(visitor);
            }
            if let Some(cell) = self.cell_mut(id) {
                cell.color = MarkColor::Black;
            }
            marked += 1;
        }
        marked
    }

    fn sweep(&mut self) -> usize {
        let mut dead = Vec::new();
        for (index, slot) in self.slots.iter_mut().enumerate() {
            let unreachable = matches!(&slot.cell, Some(cell) if cell.color == MarkColor::White);
            if unreachable {
                if let Some(cell) = slot.cell.take() {
                    cell.status.mark_disposed();
                    dead.push(cell.value);
                }
                slot.generation = slot.generation.wrapping_add(1);
                self.free_list.push(index as u32);
            }
        }
        let swept = dead.len();
        self.live -= swept;
        // Finalizers run after the heap is consistent again.
        drop(dead);
        swept
    }

    /// Drops every object and hold, flagging each status disposed.
    ///
    /// Handles issued before the call never resolve again.
    pub fn clear(&mut self) -> usize {
        let mut dead = Vec::new();
        for (index, slot) in self.slots.iter_mut().enumerate() {
            if let Some(cell) = slot.cell.take() {
                cell.status.mark_disposed();
                dead.push(cell.value);
                slot.generation = slot.generation.wrapping_add(1);
                self.free_list.push(index as u32);
            }
        }
        self.holds.clear();
        self.live = 0;
        let cleared = dead.len();
        drop(dead);
        cleared
    }
}

impl<T: Trace> Default for Heap<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Trace> std::fmt::Debug for Heap<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Heap")
            .field("live", &self.live)
            .field("slots", &self.slots.len())
            .field("holds", &self.holds.len())
            .field("collections", &self.collections)
            .finish()
    }
}
