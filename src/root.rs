//! Root - mounting a description tree into a container.
//!
//! A [`Root`] owns one live tree: it materializes the top description,
//! draws it into a caller-supplied container, subscribes to the store
//! so connected components refresh after every dispatch, and drives the
//! deferred-work queue through [`Root::tick`] / [`Root::drain`].
//!
//! Nothing here spins an event loop. Hosts call `drain` whenever they
//! want queued work (state updates, store refreshes, deferred animation
//! phases) to land; a terminal host typically drains once per frame.
//!
//! # Example
//!
//! ```ignore
//! let store = Store::new(AppState::default(), reduce);
//! let mut root = Root::new(Description::new::<App>(AppProps::default()), store);
//! root.render(&container);
//!
//! loop {
//!     root.drain();
//!     // ... poll input, dispatch actions ...
//! }
//! ```

use std::cell::RefCell;
use std::rc::Rc;

use crate::container::ContainerRef;
use crate::description::Description;
use crate::engine::animation::AnimationSpec;
use crate::engine::node::{NodeFlags, Tree};
use crate::engine::reconcile;
use crate::engine::scheduler::{Scheduler, Task};
use crate::engine::NodeId;
use crate::store::{Store, Unsubscribe};

/// Handle to a mounted tree. Dropping the root unsubscribes from the
/// store and tears the whole tree down, firing destroy callbacks.
pub struct Root<S: Clone + 'static, A: 'static> {
    tree: Rc<RefCell<Tree<S, A>>>,
    top: NodeId,
    scheduler: Scheduler<S, A>,
    unsubscribe: Option<Unsubscribe>,
    rendered: bool,
}

impl<S: Clone + 'static, A: 'static> Root<S, A> {
    /// Materialize `description` against `store`. The tree is built but
    /// not drawn; call [`Root::render`] next.
    ///
    /// Every store dispatch enqueues a forced refresh of the whole tree,
    /// so connected components recompute their props on the next drain.
    pub fn new(description: Description<S, A>, store: Rc<Store<S, A>>) -> Self {
        let scheduler = Scheduler::new();
        let mut tree = Tree::new(store.clone(), scheduler.clone());
        let top = tree.materialize(description, None);
        tree.root = Some(top);

        let task_scheduler = scheduler.clone();
        let unsubscribe = store.subscribe(move |_store| {
            let task: Task<S, A> = Box::new(move |tree: &mut Tree<S, A>| {
                let node = tree.expect_node(top);
                if !node.flags.contains(NodeFlags::RENDERED) {
                    tracing::debug!("store refresh before render ignored");
                    return;
                }
                let description = node.description.clone();
                reconcile::update_node(tree, top, description, None, true, None, None);
            });
            task_scheduler.enqueue(task);
        });

        Self {
            tree: Rc::new(RefCell::new(tree)),
            top,
            scheduler,
            unsubscribe: Some(unsubscribe),
            rendered: false,
        }
    }

    /// Draw the tree into `host`. Callable exactly once; a second call
    /// is a contract violation.
    pub fn render(&mut self, host: &ContainerRef) {
        if self.rendered {
            panic!("root already rendered");
        }
        self.tree.borrow_mut().render_node(self.top, host);
        self.rendered = true;
    }

    /// Reconcile the tree against a new top description.
    pub fn update(&self, description: Description<S, A>) {
        self.update_with(description, None, None);
    }

    /// [`Root::update`] with an animation hint offered to the top
    /// component's children-animation directive, and an optional
    /// completion callback that fires once the update and everything it
    /// started (including deferred animation phases) are done.
    pub fn update_with(
        &self,
        description: Description<S, A>,
        animation: Option<AnimationSpec>,
        on_complete: Option<Box<dyn FnOnce()>>,
    ) {
        let mut tree = self.tree.borrow_mut();
        reconcile::update_node(
            &mut tree,
            self.top,
            description,
            animation,
            false,
            None,
            on_complete,
        );
    }

    /// Run the oldest queued task. Returns false when the queue is empty.
    pub fn tick(&self) -> bool {
        match self.scheduler.pop() {
            Some(task) => {
                let mut tree = self.tree.borrow_mut();
                task(&mut tree);
                true
            }
            None => false,
        }
    }

    /// Run queued tasks until the queue is empty, including tasks the
    /// tasks themselves enqueue.
    pub fn drain(&self) {
        while self.tick() {}
    }

    pub fn store(&self) -> Rc<Store<S, A>> {
        self.tree.borrow().store.clone()
    }

    // =========================================================================
    // Introspection
    // =========================================================================

    pub fn top(&self) -> NodeId {
        self.top
    }

    pub fn is_live(&self, id: NodeId) -> bool {
        self.tree.borrow().arena.contains(id)
    }

    pub fn children_of(&self, id: NodeId) -> Vec<NodeId> {
        self.tree.borrow().expect_node(id).children.clone()
    }

    /// Register a disposal callback on a live node. Fires once, when the
    /// node is destroyed (reconciliation drop, managed removal, or root
    /// teardown).
    pub fn on_node_destroyed(&self, id: NodeId, callback: impl FnOnce() + 'static) {
        self.tree.borrow_mut().arena.on_destroy(id, callback);
    }

    // =========================================================================
    // Managed Children
    // =========================================================================

    /// Attach a child outside normal reconciliation, drawn into a
    /// caller-supplied container. The caller owns its lifecycle: update
    /// it with [`Root::update_managed_child`], remove it with
    /// [`Root::remove_managed_child`]. Reconciliation of `parent` never
    /// touches it.
    pub fn add_managed_child(
        &self,
        parent: NodeId,
        description: Description<S, A>,
        host: &ContainerRef,
    ) -> NodeId {
        self.tree
            .borrow_mut()
            .add_managed_child(parent, description, host)
    }

    /// Reconcile a managed child against a new description.
    pub fn update_managed_child(&self, child: NodeId, description: Description<S, A>) {
        let mut tree = self.tree.borrow_mut();
        reconcile::update_node(&mut tree, child, description, None, false, None, None);
    }

    /// Destroy a managed child and detach its view. Panics if `child`
    /// was not added to `parent` via [`Root::add_managed_child`].
    pub fn remove_managed_child(&self, parent: NodeId, child: NodeId) {
        self.tree.borrow_mut().remove_managed_child(parent, child);
    }
}

impl<S: Clone + 'static, A: 'static> Drop for Root<S, A> {
    fn drop(&mut self) {
        if let Some(unsubscribe) = self.unsubscribe.take() {
            unsubscribe();
        }
        let mut tree = self.tree.borrow_mut();
        if tree.arena.contains(self.top) {
            tree.destroy_node(self.top, self.rendered);
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
