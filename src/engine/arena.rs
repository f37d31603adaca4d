//! Node arena - slot allocation with generation-tagged ids.
//!
//! Nodes live in a slab of reusable slots; parent/child/root references
//! are plain [`NodeId`]s, so the tree has no reference-counting cycles to
//! manage. Each id carries the slot's generation: a scheduled task holding
//! an id whose node was destroyed (and whose slot was reused) sees a stale
//! generation and misses, instead of touching the new occupant.
//!
//! Destroy callbacks registered via [`NodeArena::on_destroy`] run when the
//! slot is removed, before the value is dropped.

use std::collections::HashMap;

/// Generation-tagged handle to a live node.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct NodeId {
    index: u32,
    generation: u32,
}

struct Slot<T> {
    generation: u32,
    value: Option<T>,
}

pub(crate) struct NodeArena<T> {
    slots: Vec<Slot<T>>,
    free: Vec<u32>,
    destroy: HashMap<NodeId, Vec<Box<dyn FnOnce()>>>,
}

impl<T> NodeArena<T> {
    pub(crate) fn new() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            destroy: HashMap::new(),
        }
    }

    pub(crate) fn insert(&mut self, value: T) -> NodeId {
        match self.free.pop() {
            Some(index) => {
                let slot = &mut self.slots[index as usize];
                slot.value = Some(value);
                NodeId {
                    index,
                    generation: slot.generation,
                }
            }
            None => {
                let index = self.slots.len() as u32;
                self.slots.push(Slot {
                    generation: 0,
                    value: Some(value),
                });
                NodeId {
                    index,
                    generation: 0,
                }
            }
        }
    }

    pub(crate) fn contains(&self, id: NodeId) -> bool {
        self.slots
            .get(id.index as usize)
            .is_some_and(|slot| slot.generation == id.generation && slot.value.is_some())
    }

    pub(crate) fn get(&self, id: NodeId) -> Option<&T> {
        self.slots
            .get(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.value.as_ref())
    }

    pub(crate) fn get_mut(&mut self, id: NodeId) -> Option<&mut T> {
        self.slots
            .get_mut(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.value.as_mut())
    }

    /// Remove a node, running its destroy callbacks first.
    ///
    /// The slot's generation is bumped so outstanding ids go stale.
    pub(crate) fn remove(&mut self, id: NodeId) -> Option<T> {
        if !self.contains(id) {
            return None;
        }
        if let Some(callbacks) = self.destroy.remove(&id) {
            for callback in callbacks {
                callback();
            }
        }
        let slot = &mut self.slots[id.index as usize];
        let value = slot.value.take();
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(id.index);
        value
    }

    /// Register a callback for when `id` is removed. Dropped silently if
    /// the node is already gone.
    pub(crate) fn on_destroy(&mut self, id: NodeId, callback: impl FnOnce() + 'static) {
        if self.contains(id) {
            self.destroy.entry(id).or_default().push(Box::new(callback));
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.slots.iter().filter(|slot| slot.value.is_some()).count()
    }
}

// =============================================================================
// Tests
// =============================================================================
