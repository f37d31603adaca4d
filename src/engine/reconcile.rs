//! Reconciliation - updating a live node against a new description.
//!
//! [`update_node`] is the single entry point: it recomputes effective
//! props (through connect for store-connected kinds), short-circuits
//! when nothing changed, commits the new description/props/state, and
//! reconciles the node's children against the freshly computed target
//! list. Children are paired to live nodes by replace-key, FIFO within
//! a key; unmatched targets materialize new nodes, unmatched live
//! children are destroyed.
//!
//! When the component's children-animation directive asks for a
//! transition, the children update runs in four phases: the two
//! intermediate lists are applied synchronously (the first instantly,
//! the second under the native animation) and the FINAL commit of the
//! exact target list is deferred onto the scheduler. A newer update on
//! the same node bumps its epoch and the stale FINAL task becomes a
//! no-op, so an interrupted transition never clobbers fresher content.
//!
//! Completion callbacks are tracked by a [`Gate`]: one native-view
//! update plus a counter of in-flight child updates, sealed once the
//! pass has started everything it is going to start.

use std::any::Any;
use std::cell::{Cell, RefCell};
use std::collections::{HashMap, HashSet, VecDeque};
use std::rc::Rc;

use crate::container::{same_container, ContainerRef};
use crate::description::{Description, ReplaceKey};

use super::animation::{merge_children, AnimationSpec, ChildrenAnimation};
use super::arena::NodeId;
use super::node::{NodeFlags, Tree};

// =============================================================================
// Completion Gate
// =============================================================================

struct GateInner {
    native_done: Cell<bool>,
    pending_children: Cell<usize>,
    sealed: Cell<bool>,
    callback: RefCell<Option<Box<dyn FnOnce()>>>,
}

/// Fires its callback once the native-view update has run, every child
/// update counted against it has finished, and the pass has been sealed
/// (no more children will be added). Child updates may outlive the pass
/// that started them when a descendant defers its own FINAL phase.
#[derive(Clone)]
pub(crate) struct Gate(Rc<GateInner>);

impl Gate {
    fn new(callback: Option<Box<dyn FnOnce()>>) -> Self {
        Self(Rc::new(GateInner {
            native_done: Cell::new(false),
            pending_children: Cell::new(0),
            sealed: Cell::new(false),
            callback: RefCell::new(callback),
        }))
    }

    fn native_done(&self) {
        self.0.native_done.set(true);
        self.try_fire();
    }

    fn child_started(&self) {
        self.0.pending_children.set(self.0.pending_children.get() + 1);
    }

    fn child_done(&self) {
        let pending = self.0.pending_children.get();
        debug_assert!(pending > 0, "child_done without child_started");
        self.0.pending_children.set(pending.saturating_sub(1));
        self.try_fire();
    }

    fn seal(&self) {
        self.0.sealed.set(true);
        self.try_fire();
    }

    fn try_fire(&self) {
        if self.0.sealed.get() && self.0.native_done.get() && self.0.pending_children.get() == 0 {
            if let Some(callback) = self.0.callback.borrow_mut().take() {
                callback();
            }
        }
    }
}

// =============================================================================
// Node Update
// =============================================================================

/// Reconcile live node `id` against `description`.
///
/// `parent_animation` is the native spec of an enclosing children
/// update, offered to this node's own animation directive. `force`
/// disables the unchanged-props-and-state short-circuit so connected
/// descendants recompute after a store change. `pending_state`, when
/// present, replaces the node's state wholesale (queued `set_state`).
/// `completion` fires once this update and everything it started are
/// done.
///
/// The description's component kind must match the node's; a mismatch
/// is a contract violation (replace-key pairing upstream is broken).
pub(crate) fn update_node<S: Clone + 'static, A: 'static>(
    tree: &mut Tree<S, A>,
    id: NodeId,
    description: Description<S, A>,
    parent_animation: Option<AnimationSpec>,
    force: bool,
    pending_state: Option<Box<dyn Any>>,
    completion: Option<Box<dyn FnOnce()>>,
) {
    let component = {
        let node = tree.expect_node(id);
        let current = node.description.component().clone();
        if current.kind() != description.component().kind() {
            panic!(
                "update replaced a `{}` node with a `{}` description; replace-keys must match",
                node.description.kind_name(),
                description.kind_name(),
            );
        }
        current
    };

    let next_props: Rc<dyn Any> = if component.connected() {
        let store_state = tree.store.state();
        component.connect(description.raw_props().as_ref(), &store_state)
    } else {
        description.raw_props().clone()
    };
    let next_state: Box<dyn Any> = match pending_state {
        Some(state) => state,
        None => component.clone_state(tree.expect_node(id).state.as_ref()),
    };

    let (props_changed, state_changed) = {
        let node = tree.expect_node(id);
        (
            !component.props_eq(node.props.as_ref(), next_props.as_ref()),
            !component.state_eq(node.state.as_ref(), next_state.as_ref()),
        )
    };

    if !force && !props_changed && !state_changed {
        // Equal by value; keep the newer description (fresher closures)
        // but touch nothing else.
        tree.expect_node_mut(id).description = description;
        if let Some(done) = completion {
            done();
        }
        return;
    }

    let directive = {
        let node = tree.expect_node(id);
        component.children_animation(
            node.props.as_ref(),
            next_props.as_ref(),
            node.state.as_ref(),
            next_state.as_ref(),
            parent_animation.as_ref(),
        )
    };

    // Commit before computing children, so callbacks created during the
    // children pass close over the new values.
    {
        let node = tree.expect_node_mut(id);
        node.description = description;
        node.props = next_props;
        node.state = next_state;
    }

    let ctx = tree.node_context(id);
    let target = {
        let node = tree.expect_node(id);
        component.children(node.props.as_ref(), node.state.as_ref(), &ctx)
    };

    // Every committed update bumps the epoch, interrupting any deferred
    // FINAL phase still in flight for this node.
    let epoch = tree.next_epoch();
    tree.expect_node_mut(id).epoch = epoch;

    if directive.wants_transition() {
        animated_children_update(tree, id, target, directive, epoch, force, completion);
    } else {
        let gate = Gate::new(completion);
        apply_children_update(tree, id, &target, directive.native.as_ref(), force, &gate);
    }
}

// =============================================================================
// Animated Path
// =============================================================================

/// Run the four-phase children transition.
///
/// INITIAL is the current container content. FIRST_INTERMEDIATE adds
/// entering children with their entry transforms applied, keeping
/// exiting children untouched at their old positions; it is applied
/// instantly. SECOND_INTERMEDIATE is the target list plus exiting
/// children with their exit transforms applied, run under the native
/// animation. FINAL commits the exact target list and is deferred to
/// the scheduler, guarded by the epoch taken here.
fn animated_children_update<S: Clone + 'static, A: 'static>(
    tree: &mut Tree<S, A>,
    id: NodeId,
    target: Vec<Description<S, A>>,
    directive: ChildrenAnimation<S, A>,
    epoch: u64,
    force: bool,
    completion: Option<Box<dyn FnOnce()>>,
) {
    let old: Vec<(usize, Description<S, A>)> = {
        let children = tree.expect_node(id).children.clone();
        children
            .iter()
            .enumerate()
            .map(|(index, &child)| (index, tree.expect_node(child).description.clone()))
            .collect()
    };

    // Classify against the live children the same way the plain pass
    // pairs them: FIFO within a replace-key.
    let mut buckets: HashMap<ReplaceKey, VecDeque<usize>> = HashMap::new();
    for (index, description) in &old {
        buckets
            .entry(description.replace_key())
            .or_default()
            .push_back(*index);
    }
    let mut claimed = vec![false; old.len()];
    let mut entering = vec![false; target.len()];
    for (index, description) in target.iter().enumerate() {
        let matched = buckets
            .get_mut(&description.replace_key())
            .and_then(|queue| queue.pop_front());
        match matched {
            Some(old_index) => claimed[old_index] = true,
            None => entering[index] = true,
        }
    }
    let exiting: Vec<(usize, Description<S, A>)> = old
        .iter()
        .filter(|(index, _)| !claimed[*index])
        .cloned()
        .collect();

    let first: Vec<Description<S, A>> = target
        .iter()
        .enumerate()
        .map(|(index, description)| {
            if entering[index] {
                directive.apply_entry(description.clone())
            } else {
                description.clone()
            }
        })
        .collect();
    let first = merge_children(&first, &exiting);

    let exiting_transformed: Vec<(usize, Description<S, A>)> = exiting
        .iter()
        .map(|(index, description)| (*index, directive.apply_exit(description.clone())))
        .collect();
    let second = merge_children(&target, &exiting_transformed);

    tracing::debug!(
        node = ?id,
        entering = entering.iter().filter(|e| **e).count(),
        exiting = exiting.len(),
        "starting children transition"
    );

    let phase_gate = Gate::new(None);
    apply_children_update(tree, id, &first, None, force, &phase_gate);
    tree.expect_node_mut(id).flags.insert(NodeFlags::ANIMATING);
    let phase_gate = Gate::new(None);
    apply_children_update(
        tree,
        id,
        &second,
        directive.native.as_ref(),
        force,
        &phase_gate,
    );

    tree.scheduler.enqueue(Box::new(move |tree: &mut Tree<S, A>| {
        if tree.arena.get(id).map(|node| node.epoch) != Some(epoch) {
            // A newer update owns this node now; the transition was
            // interrupted. Its content is already correct, so only the
            // caller's completion is owed.
            tracing::debug!(node = ?id, "transition interrupted; final phase skipped");
            if let Some(done) = completion {
                done();
            }
            return;
        }
        tree.expect_node_mut(id).flags.remove(NodeFlags::ANIMATING);
        let gate = Gate::new(completion);
        apply_children_update(tree, id, &target, None, force, &gate);
    }));
}

// =============================================================================
// Children Pass
// =============================================================================

/// Apply one children list to a rendered node: reapply its own view
/// under `native`, pair target entries to live children by replace-key
/// (FIFO within a key), materialize and draw newcomers, reorder the
/// container, destroy leftovers. Seals `gate` before returning.
fn apply_children_update<S: Clone + 'static, A: 'static>(
    tree: &mut Tree<S, A>,
    id: NodeId,
    target: &[Description<S, A>],
    native: Option<&AnimationSpec>,
    force: bool,
    gate: &Gate,
) {
    let container = tree.expect_node(id).container.clone().unwrap_or_else(|| {
        panic!(
            "children update on `{}` node {id:?} before it was rendered",
            tree.expect_node(id).description.kind_name(),
        )
    });

    let component = tree.expect_node(id).description.component().clone();
    let ctx = tree.node_context(id);
    {
        let node = tree.expect_node(id);
        container.borrow_mut().update_view(native, &mut |view: &mut dyn Any| {
            component.apply(view, node.props.as_ref(), node.state.as_ref(), &ctx)
        });
    }
    gate.native_done();

    let current = tree.expect_node(id).children.clone();
    let mut buckets: HashMap<ReplaceKey, VecDeque<NodeId>> = HashMap::new();
    for &child in &current {
        let key = tree.expect_node(child).description.replace_key();
        buckets.entry(key).or_default().push_back(child);
    }

    let mut seen_keys: HashSet<ReplaceKey> = HashSet::new();
    let mut next_children: Vec<NodeId> = Vec::with_capacity(target.len());
    let mut created: Vec<NodeId> = Vec::new();
    let mut kept: HashSet<NodeId> = HashSet::new();

    for description in target {
        let key = description.replace_key();
        if description.key().is_some() && !seen_keys.insert(key.clone()) {
            tracing::warn!(
                kind = description.kind_name(),
                key = description.key(),
                "duplicate key among siblings; first occurrence claims the live node"
            );
        }
        let existing = buckets.get_mut(&key).and_then(|queue| queue.pop_front());
        match existing {
            Some(child) => {
                kept.insert(child);
                gate.child_started();
                let child_gate = gate.clone();
                update_node(
                    tree,
                    child,
                    description.clone(),
                    native.copied(),
                    force,
                    None,
                    Some(Box::new(move || child_gate.child_done())),
                );
                next_children.push(child);
            }
            None => {
                let child = tree.materialize(description.clone(), Some(id));
                created.push(child);
                next_children.push(child);
            }
        }
    }

    let dropped: Vec<NodeId> = current
        .iter()
        .copied()
        .filter(|child| !kept.contains(child))
        .collect();
    tree.expect_node_mut(id).children = next_children.clone();

    tracing::debug!(
        node = ?id,
        matched = kept.len(),
        added = created.len(),
        removed = dropped.len(),
        "children reconciled"
    );

    for &child in &created {
        tree.render_node(child, &container);
    }

    reorder_container(tree, &container, &next_children);

    for child in dropped {
        tree.destroy_node(child, true);
    }
    gate.seal();
}

/// Bring the container's child order in line with `children`.
///
/// "Front" is the end of the container's child list. The longest prefix
/// of the desired order that is already an in-order subsequence of the
/// container's current order stays put; every element after it is
/// brought to the front in desired order. Container children that do
/// not belong to `children` (managed views) keep their positions.
fn reorder_container<S: Clone + 'static, A: 'static>(
    tree: &Tree<S, A>,
    container: &ContainerRef,
    children: &[NodeId],
) {
    let desired: Vec<ContainerRef> = children
        .iter()
        .filter_map(|&child| tree.expect_node(child).container.clone())
        .collect();
    if desired.len() < 2 {
        return;
    }

    let current: Vec<ContainerRef> = container
        .borrow()
        .child_containers()
        .into_iter()
        .filter(|candidate| desired.iter().any(|d| same_container(candidate, d)))
        .collect();

    let mut cursor = 0usize;
    let mut stable = 0usize;
    for d in &desired {
        match current[cursor..]
            .iter()
            .position(|candidate| same_container(candidate, d))
        {
            Some(offset) => {
                cursor += offset + 1;
                stable += 1;
            }
            None => break,
        }
    }
    if stable == desired.len() {
        return;
    }
    for d in &desired[stable..] {
        container.borrow_mut().bring_child_to_front(d);
    }
}

// =============================================================================
// Tests
// =============================================================================
