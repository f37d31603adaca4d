//! Live node tree - construction, initial draw, managed children.
//!
//! A [`Node`] owns one description's live instance: its current effective
//! props, its state (default-constructed once, persisted across updates),
//! its child nodes, and the container its native view was drawn into.
//! Nodes are arena slots; all algorithms are [`Tree`] methods recursing
//! over [`NodeId`]s.
//!
//! Lifecycle: a node is materialized when a parent description produces
//! it (or when a root is attached), drawn at most once into a container,
//! updated in place while its replace-key keeps appearing in the parent's
//! children list, and destroyed when it stops appearing.
//!
//! The reconciliation pass itself lives in `engine::reconcile`.

use std::any::Any;
use std::rc::Rc;

use crate::container::ContainerRef;
use crate::description::{Description, Dispatch, NodeContext};
use crate::store::Store;

use super::arena::{NodeArena, NodeId};
use super::scheduler::{Scheduler, Task};

bitflags::bitflags! {
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub(crate) struct NodeFlags: u8 {
        /// Native view exists; a second render is a contract violation.
        const RENDERED = 1 << 0;
        /// Effective props are recomputed from store state on update.
        const CONNECTED = 1 << 1;
        /// A deferred FINAL transition phase is outstanding.
        const ANIMATING = 1 << 2;
    }
}

// =============================================================================
// Node
// =============================================================================

pub(crate) struct Node<S, A> {
    /// Last supplied description (raw props, pre-connect).
    pub(crate) description: Description<S, A>,
    /// Effective props: either the raw props or the connect output.
    pub(crate) props: Rc<dyn Any>,
    pub(crate) state: Box<dyn Any>,
    pub(crate) children: Vec<NodeId>,
    /// Managed children live outside normal reconciliation.
    pub(crate) managed: Vec<NodeId>,
    pub(crate) parent: Option<NodeId>,
    /// Container wrapping this node's native view; set on first render.
    pub(crate) container: Option<ContainerRef>,
    /// Container the view was added into (parent's container, or the
    /// caller-supplied one for managed children).
    pub(crate) host: Option<ContainerRef>,
    pub(crate) flags: NodeFlags,
    /// Token of the most recent update pass; a deferred animation phase
    /// holding an older token has been interrupted.
    pub(crate) epoch: u64,
}

// =============================================================================
// Tree
// =============================================================================

/// The live tree: arena, store handle, and the deferred-work queue.
/// Owned by the root; one per mounted UI tree.
pub(crate) struct Tree<S, A> {
    pub(crate) arena: NodeArena<Node<S, A>>,
    pub(crate) store: Rc<Store<S, A>>,
    pub(crate) scheduler: Scheduler<S, A>,
    pub(crate) root: Option<NodeId>,
    epochs: u64,
}

impl<S: Clone + 'static, A: 'static> Tree<S, A> {
    pub(crate) fn new(store: Rc<Store<S, A>>, scheduler: Scheduler<S, A>) -> Self {
        Self {
            arena: NodeArena::new(),
            store,
            scheduler,
            root: None,
            epochs: 0,
        }
    }

    pub(crate) fn next_epoch(&mut self) -> u64 {
        self.epochs += 1;
        self.epochs
    }

    pub(crate) fn expect_node(&self, id: NodeId) -> &Node<S, A> {
        self.arena
            .get(id)
            .unwrap_or_else(|| panic!("node {id:?} is no longer alive"))
    }

    pub(crate) fn expect_node_mut(&mut self, id: NodeId) -> &mut Node<S, A> {
        self.arena
            .get_mut(id)
            .unwrap_or_else(|| panic!("node {id:?} is no longer alive"))
    }

    /// Build the erased context handed to component code for `id`:
    /// a state-update callback that enqueues onto the scheduler (never
    /// reenters the caller synchronously) and the store's dispatch.
    pub(crate) fn node_context(&self, id: NodeId) -> NodeContext<A> {
        let scheduler = self.scheduler.clone();
        let update_any: Rc<dyn Fn(Box<dyn Any>)> = Rc::new(move |state: Box<dyn Any>| {
            let task: Task<S, A> =
                Box::new(move |tree: &mut Tree<S, A>| tree.set_state_and_update(id, state));
            scheduler.enqueue(task);
        });
        let store = self.store.clone();
        let dispatcher: Dispatch<A> = Rc::new(move |action: A| store.dispatch(action));
        NodeContext {
            update_any,
            dispatcher,
        }
    }

    // =========================================================================
    // Construction
    // =========================================================================

    /// Materialize a description into a live node under `parent`
    /// (`None` only for the root's top node).
    ///
    /// Default-constructs state, recomputes props through connect for
    /// connected descriptions, computes and materializes children
    /// recursively. The node is not drawn yet.
    pub(crate) fn materialize(
        &mut self,
        description: Description<S, A>,
        parent: Option<NodeId>,
    ) -> NodeId {
        let component = description.component().clone();
        let kind = description.kind_name();

        let state = component.initial_state();
        let props: Rc<dyn Any> = if component.connected() {
            component.connect(description.raw_props().as_ref(), &self.store.state())
        } else {
            description.raw_props().clone()
        };
        let mut flags = NodeFlags::empty();
        if component.connected() {
            flags.insert(NodeFlags::CONNECTED);
        }

        let id = self.arena.insert(Node {
            description,
            props,
            state,
            children: Vec::new(),
            managed: Vec::new(),
            parent,
            container: None,
            host: None,
            flags,
            epoch: 0,
        });

        let ctx = self.node_context(id);
        let children = {
            let node = self.expect_node(id);
            component.children(node.props.as_ref(), node.state.as_ref(), &ctx)
        };
        let child_ids: Vec<NodeId> = children
            .into_iter()
            .map(|child| self.materialize(child, Some(id)))
            .collect();
        self.expect_node_mut(id).children = child_ids;

        tracing::trace!(node = ?id, kind, "materialized node");
        id
    }

    // =========================================================================
    // Initial Draw
    // =========================================================================

    /// Draw `id` into `host`: attach a native view placeholder, apply
    /// current props/state, recurse into children. Callable at most once
    /// per node; a second call is a contract violation.
    pub(crate) fn render_node(&mut self, id: NodeId, host: &ContainerRef) {
        let component = {
            let node = self.expect_node(id);
            if node.flags.contains(NodeFlags::RENDERED) {
                panic!(
                    "render called twice on `{}` node {id:?}",
                    node.description.kind_name()
                );
            }
            node.description.component().clone()
        };

        let container = {
            let view_component = component.clone();
            let mut factory = move || view_component.make_view();
            host.borrow_mut().add_child(&mut factory)
        };

        let ctx = self.node_context(id);
        {
            let node = self.expect_node(id);
            container.borrow_mut().update_view(None, &mut |view: &mut dyn Any| {
                component.apply(view, node.props.as_ref(), node.state.as_ref(), &ctx)
            });
        }

        {
            let node = self.expect_node_mut(id);
            node.container = Some(container.clone());
            node.host = Some(host.clone());
            node.flags.insert(NodeFlags::RENDERED);
        }
        tracing::trace!(node = ?id, "rendered node");

        for child in self.expect_node(id).children.clone() {
            self.render_node(child, &container);
        }
    }

    // =========================================================================
    // Scheduled State Updates
    // =========================================================================

    /// Task body for a queued `set_state`: replace the node's state and
    /// reconcile it against its current description. A stale id (node
    /// destroyed since the callback fired) is ignored.
    pub(crate) fn set_state_and_update(&mut self, id: NodeId, state: Box<dyn Any>) {
        if !self.arena.contains(id) {
            tracing::debug!(node = ?id, "state update for destroyed node ignored");
            return;
        }
        let description = self.expect_node(id).description.clone();
        super::reconcile::update_node(self, id, description, None, false, Some(state), None);
    }

    // =========================================================================
    // Managed Children
    // =========================================================================

    /// Materialize and draw a child outside normal reconciliation. The
    /// caller owns its update/removal lifecycle.
    pub(crate) fn add_managed_child(
        &mut self,
        parent: NodeId,
        description: Description<S, A>,
        host: &ContainerRef,
    ) -> NodeId {
        self.expect_node(parent);
        let id = self.materialize(description, Some(parent));
        self.expect_node_mut(parent).managed.push(id);
        self.render_node(id, host);
        id
    }

    /// Remove a managed child added via [`Tree::add_managed_child`].
    /// Removing a node the parent does not manage is a contract violation.
    pub(crate) fn remove_managed_child(&mut self, parent: NodeId, child: NodeId) {
        let position = self
            .expect_node(parent)
            .managed
            .iter()
            .position(|managed| *managed == child)
            .unwrap_or_else(|| {
                panic!("node {child:?} is not a managed child of {parent:?}")
            });
        self.expect_node_mut(parent).managed.remove(position);
        self.destroy_node(child, true);
    }

    // =========================================================================
    // Destruction
    // =========================================================================

    /// Destroy a node and its whole subtree (normal and managed
    /// children), firing destroy callbacks bottom-up. `detach` removes
    /// the subtree root's view from its host container; descendants'
    /// views go with it.
    pub(crate) fn destroy_node(&mut self, id: NodeId, detach: bool) {
        let Some(node) = self.arena.get(id) else {
            return;
        };
        let children = node.children.clone();
        let managed = node.managed.clone();
        let container = node.container.clone();
        let host = node.host.clone();

        for child in children {
            self.destroy_node(child, false);
        }
        for child in managed {
            self.destroy_node(child, false);
        }

        if detach {
            if let (Some(container), Some(host)) = (container, host) {
                host.borrow_mut().remove_child(&container);
            }
        }

        self.arena.remove(id);
        tracing::trace!(node = ?id, "destroyed node");
    }
}

// =============================================================================
// Tests
// =============================================================================
