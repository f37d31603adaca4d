//! Drawable container - abstraction over a native parent view.
//!
//! The reconciler never talks to a concrete toolkit. It drives a
//! [`DrawableContainer`]: add a child view, mutate the native view,
//! reorder, remove. Each child handle is itself a container, so the
//! logical node tree maps 1:1 onto a container tree.
//!
//! Handle identity is pointer identity ([`same_container`]); containers
//! are held behind `Rc<RefCell<..>>` because the native side (a terminal
//! buffer, a view hierarchy) is shared mutable state on one thread.
//!
//! [`MemoryContainer`] is the in-memory implementation used by the test
//! suite and headless hosts: it stores views as `Box<dyn Any>` and counts
//! every mutation in a shared [`MutationLog`], so tests can assert that
//! reconciliation performed exactly the native mutations it claims.

use std::any::Any;
use std::cell::RefCell;
use std::rc::Rc;

use crate::engine::animation::AnimationSpec;

// =============================================================================
// Container Capability
// =============================================================================

/// Shared handle to a drawable container.
pub type ContainerRef = Rc<RefCell<dyn DrawableContainer>>;

/// Capability implemented by the native toolkit layer.
///
/// "Front" means topmost in draw order; implementations keep the topmost
/// child last in their sibling list.
pub trait DrawableContainer {
    /// Instantiate and attach a child view produced by `factory`,
    /// returning the container wrapping it.
    fn add_child(&mut self, factory: &mut dyn FnMut() -> Box<dyn Any>) -> ContainerRef;

    /// Mutate this container's native view, optionally inside a
    /// native-level animation (implementations may ignore the spec).
    fn update_view(&mut self, animation: Option<&AnimationSpec>, f: &mut dyn FnMut(&mut dyn Any));

    /// Current child containers in draw order (bottom to top).
    fn child_containers(&self) -> Vec<ContainerRef>;

    /// Move `child` to the front (topmost). No-op if untracked.
    fn bring_child_to_front(&mut self, child: &ContainerRef);

    /// Detach `child` and its subtree. No-op if untracked.
    fn remove_child(&mut self, child: &ContainerRef);

    /// Detach every child.
    fn remove_all_children(&mut self);
}

/// Pointer identity for container handles.
pub fn same_container(a: &ContainerRef, b: &ContainerRef) -> bool {
    Rc::as_ptr(a) as *const () == Rc::as_ptr(b) as *const ()
}

// =============================================================================
// Memory Container
// =============================================================================

/// Counts of native mutations, shared across a [`MemoryContainer`] tree.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MutationLog {
    pub adds: usize,
    pub updates: usize,
    pub moves: usize,
    pub removals: usize,
}

/// In-memory drawable container for tests and headless rendering.
pub struct MemoryContainer {
    view: Box<dyn Any>,
    children: Vec<Rc<RefCell<MemoryContainer>>>,
    log: Rc<RefCell<MutationLog>>,
}

impl MemoryContainer {
    /// Create a root container with an empty `()` view.
    pub fn new_root() -> Rc<RefCell<MemoryContainer>> {
        Rc::new(RefCell::new(MemoryContainer {
            view: Box::new(()),
            children: Vec::new(),
            log: Rc::new(RefCell::new(MutationLog::default())),
        }))
    }

    /// Handle to the mutation log shared by this container tree.
    pub fn log_handle(&self) -> Rc<RefCell<MutationLog>> {
        self.log.clone()
    }

    /// Snapshot of the mutation counts.
    pub fn log(&self) -> MutationLog {
        *self.log.borrow()
    }

    /// Typed read of the native view.
    pub fn view_as<T: 'static>(&self) -> Option<&T> {
        self.view.downcast_ref::<T>()
    }

    pub fn child_count(&self) -> usize {
        self.children.len()
    }

    /// Typed child handle, bottom-to-top order. Panics when out of range.
    pub fn child_at(&self, index: usize) -> Rc<RefCell<MemoryContainer>> {
        self.children[index].clone()
    }

    fn position_of(&self, child: &ContainerRef) -> Option<usize> {
        self.children
            .iter()
            .position(|c| Rc::as_ptr(c) as *const () == Rc::as_ptr(child) as *const ())
    }
}

impl DrawableContainer for MemoryContainer {
    fn add_child(&mut self, factory: &mut dyn FnMut() -> Box<dyn Any>) -> ContainerRef {
        self.log.borrow_mut().adds += 1;
        let child = Rc::new(RefCell::new(MemoryContainer {
            view: factory(),
            children: Vec::new(),
            log: self.log.clone(),
        }));
        self.children.push(child.clone());
        child
    }

    fn update_view(&mut self, _animation: Option<&AnimationSpec>, f: &mut dyn FnMut(&mut dyn Any)) {
        self.log.borrow_mut().updates += 1;
        f(self.view.as_mut());
    }

    fn child_containers(&self) -> Vec<ContainerRef> {
        self.children
            .iter()
            .map(|c| c.clone() as ContainerRef)
            .collect()
    }

    fn bring_child_to_front(&mut self, child: &ContainerRef) {
        if let Some(position) = self.position_of(child) {
            let c = self.children.remove(position);
            self.children.push(c);
            self.log.borrow_mut().moves += 1;
        }
    }

    fn remove_child(&mut self, child: &ContainerRef) {
        if let Some(position) = self.position_of(child) {
            self.children.remove(position);
            self.log.borrow_mut().removals += 1;
        }
    }

    fn remove_all_children(&mut self) {
        self.log.borrow_mut().removals += self.children.len();
        self.children.clear();
    }
}

// =============================================================================
// Tests
// =============================================================================
