//! Descriptions - immutable component specifications.
//!
//! A [`Description`] is an immutable value describing *what to render*:
//! a component kind, its props, and an optional key. Live [`Node`]s are
//! matched to descriptions across reconciliation passes by
//! [`ReplaceKey`] (component kind + key); two descriptions with the same
//! replace-key are the same logical node even when their props differ.
//!
//! Component kinds implement [`Component`]: typed props and state,
//! children computation, a native-view apply function, and optionally a
//! store connection and a children-animation directive. The engine works
//! with descriptions through a type-erased bridge resolved once at
//! construction time; the only runtime downcasts are the props/state/view
//! casts behind [`checked_downcast_ref`], and a failed cast is a contract
//! violation that aborts with a diagnostic rather than continuing with a
//! diverged tree.
//!
//! [`Node`]: crate::engine
//!
//! # Example
//!
//! ```ignore
//! struct Label;
//!
//! impl Component<AppState, AppAction> for Label {
//!     type Props = LabelProps;
//!     type State = ();
//!
//!     fn make_view() -> Box<dyn Any> { Box::new(TextView::default()) }
//!
//!     fn children(_: &LabelProps, _: &(), _: &ComponentContext<AppAction, ()>)
//!         -> Vec<Description<AppState, AppAction>> { Vec::new() }
//!
//!     fn apply(view: &mut dyn Any, props: &LabelProps, _: &(), _: &ComponentContext<AppAction, ()>) {
//!         let view = view.downcast_mut::<TextView>().unwrap();
//!         view.text = props.text.clone();
//!     }
//! }
//!
//! let description = Description::new::<Label>(LabelProps { text: "hi".into() })
//!     .with_key("greeting");
//! ```

use std::any::{Any, TypeId};
use std::fmt;
use std::marker::PhantomData;
use std::rc::Rc;

use crate::engine::animation::{AnimationSpec, ChildrenAnimation};

// =============================================================================
// Callback Types
// =============================================================================

/// Dispatch handle handed to components (Rc so it clones into closures).
pub type Dispatch<A> = Rc<dyn Fn(A)>;

/// Typed state updater derived from [`ComponentContext::updater`].
pub type Updater<St> = Rc<dyn Fn(St)>;

// =============================================================================
// Component Context
// =============================================================================

/// What a component can reach while computing children or applying props:
/// schedule a state replacement for its own node, and dispatch actions.
///
/// State updates are never applied inline; they are queued on the tree's
/// scheduler and run on the next drain, so a component can safely call
/// [`ComponentContext::set_state`] from inside event callbacks created
/// during `children` or `apply`.
pub struct ComponentContext<A, St> {
    update_any: Rc<dyn Fn(Box<dyn Any>)>,
    dispatcher: Dispatch<A>,
    _state: PhantomData<fn(St)>,
}

impl<A: 'static, St: 'static> ComponentContext<A, St> {
    /// Schedule a wholesale state replacement for this node.
    pub fn set_state(&self, state: St) {
        (self.update_any)(Box::new(state));
    }

    /// Dispatch an action to the store.
    pub fn dispatch(&self, action: A) {
        (self.dispatcher)(action);
    }

    /// Clone out the dispatch handle for event callbacks.
    pub fn dispatcher(&self) -> Dispatch<A> {
        self.dispatcher.clone()
    }

    /// Clone out a typed state updater for event callbacks.
    pub fn updater(&self) -> Updater<St> {
        let update_any = self.update_any.clone();
        Rc::new(move |state: St| update_any(Box::new(state)))
    }
}

/// Erased context built by the engine; typed views are derived per call.
pub(crate) struct NodeContext<A> {
    pub(crate) update_any: Rc<dyn Fn(Box<dyn Any>)>,
    pub(crate) dispatcher: Dispatch<A>,
}

impl<A> NodeContext<A> {
    fn typed<St>(&self) -> ComponentContext<A, St> {
        ComponentContext {
            update_any: self.update_any.clone(),
            dispatcher: self.dispatcher.clone(),
            _state: PhantomData,
        }
    }
}

// =============================================================================
// Component Capability
// =============================================================================

/// A component kind: the per-type capability behind a [`Description`].
///
/// `S` is the store state, `A` the action type. All operations are static;
/// instance data lives in `Props` (supplied by the parent) and `State`
/// (owned by the live node, default-constructed once and persisted across
/// updates).
pub trait Component<S: 'static, A: 'static>: 'static {
    type Props: Clone + PartialEq + 'static;
    type State: Default + Clone + PartialEq + 'static;

    /// Instantiate the native-view placeholder for this kind.
    fn make_view() -> Box<dyn Any>;

    /// Compute child descriptions from current props and state.
    fn children(
        props: &Self::Props,
        state: &Self::State,
        ctx: &ComponentContext<A, Self::State>,
    ) -> Vec<Description<S, A>>;

    /// Apply props and state onto the native view.
    fn apply(
        view: &mut dyn Any,
        props: &Self::Props,
        state: &Self::State,
        ctx: &ComponentContext<A, Self::State>,
    );

    /// Children-animation directive for the next render. Default: none.
    fn children_animation(
        _current_props: &Self::Props,
        _next_props: &Self::Props,
        _current_state: &Self::State,
        _next_state: &Self::State,
        _parent: Option<&AnimationSpec>,
    ) -> ChildrenAnimation<S, A> {
        ChildrenAnimation::none()
    }

    /// Whether this kind recomputes props from store state. A connected
    /// component must also override [`Component::connect`].
    fn connected() -> bool {
        false
    }

    /// Pure mapping `(parent props, store state) -> effective props`.
    fn connect(props: Self::Props, _store_state: &S) -> Self::Props {
        props
    }

    /// Hook to filter or augment the computed child list before
    /// materialization. Default: identity.
    fn filter_children(
        children: Vec<Description<S, A>>,
        _props: &Self::Props,
        _state: &Self::State,
    ) -> Vec<Description<S, A>> {
        children
    }
}

// =============================================================================
// Type Erasure
// =============================================================================

/// Abort with a diagnostic when an erased value has the wrong concrete
/// type. Reaching this means the surrounding code broke the
/// description/node pairing contract; continuing would let the logical
/// tree and the native views diverge.
pub(crate) fn checked_downcast_ref<'a, T: 'static>(
    value: &'a dyn Any,
    what: &str,
    component: &str,
) -> &'a T {
    value.downcast_ref::<T>().unwrap_or_else(|| {
        panic!("{what} for component `{component}` has an unexpected concrete type")
    })
}

/// Object-safe vtable over a [`Component`] kind, resolved once when the
/// description is constructed.
pub(crate) trait AnyComponent<S, A> {
    fn kind(&self) -> TypeId;
    fn kind_name(&self) -> &'static str;
    fn make_view(&self) -> Box<dyn Any>;
    fn initial_state(&self) -> Box<dyn Any>;
    fn clone_state(&self, state: &dyn Any) -> Box<dyn Any>;
    fn state_eq(&self, a: &dyn Any, b: &dyn Any) -> bool;
    fn props_eq(&self, a: &dyn Any, b: &dyn Any) -> bool;
    fn connected(&self) -> bool;
    fn connect(&self, props: &dyn Any, store_state: &S) -> Rc<dyn Any>;
    fn children(
        &self,
        props: &dyn Any,
        state: &dyn Any,
        ctx: &NodeContext<A>,
    ) -> Vec<Description<S, A>>;
    fn apply(&self, view: &mut dyn Any, props: &dyn Any, state: &dyn Any, ctx: &NodeContext<A>);
    fn children_animation(
        &self,
        current_props: &dyn Any,
        next_props: &dyn Any,
        current_state: &dyn Any,
        next_state: &dyn Any,
        parent: Option<&AnimationSpec>,
    ) -> ChildrenAnimation<S, A>;
}

struct Bridge<C>(PhantomData<fn() -> C>);

impl<S: 'static, A: 'static, C: Component<S, A>> AnyComponent<S, A> for Bridge<C> {
    fn kind(&self) -> TypeId {
        TypeId::of::<C>()
    }

    fn kind_name(&self) -> &'static str {
        std::any::type_name::<C>()
    }

    fn make_view(&self) -> Box<dyn Any> {
        C::make_view()
    }

    fn initial_state(&self) -> Box<dyn Any> {
        Box::new(C::State::default())
    }

    fn clone_state(&self, state: &dyn Any) -> Box<dyn Any> {
        Box::new(checked_downcast_ref::<C::State>(state, "state", self.kind_name()).clone())
    }

    fn state_eq(&self, a: &dyn Any, b: &dyn Any) -> bool {
        let name = self.kind_name();
        checked_downcast_ref::<C::State>(a, "state", name)
            == checked_downcast_ref::<C::State>(b, "state", name)
    }

    fn props_eq(&self, a: &dyn Any, b: &dyn Any) -> bool {
        let name = self.kind_name();
        checked_downcast_ref::<C::Props>(a, "props", name)
            == checked_downcast_ref::<C::Props>(b, "props", name)
    }

    fn connected(&self) -> bool {
        C::connected()
    }

    fn connect(&self, props: &dyn Any, store_state: &S) -> Rc<dyn Any> {
        let props = checked_downcast_ref::<C::Props>(props, "props", self.kind_name()).clone();
        Rc::new(C::connect(props, store_state))
    }

    fn children(
        &self,
        props: &dyn Any,
        state: &dyn Any,
        ctx: &NodeContext<A>,
    ) -> Vec<Description<S, A>> {
        let name = self.kind_name();
        let props = checked_downcast_ref::<C::Props>(props, "props", name);
        let state = checked_downcast_ref::<C::State>(state, "state", name);
        let children = C::children(props, state, &ctx.typed());
        C::filter_children(children, props, state)
    }

    fn apply(&self, view: &mut dyn Any, props: &dyn Any, state: &dyn Any, ctx: &NodeContext<A>) {
        let name = self.kind_name();
        let props = checked_downcast_ref::<C::Props>(props, "props", name);
        let state = checked_downcast_ref::<C::State>(state, "state", name);
        C::apply(view, props, state, &ctx.typed());
    }

    fn children_animation(
        &self,
        current_props: &dyn Any,
        next_props: &dyn Any,
        current_state: &dyn Any,
        next_state: &dyn Any,
        parent: Option<&AnimationSpec>,
    ) -> ChildrenAnimation<S, A> {
        let name = self.kind_name();
        C::children_animation(
            checked_downcast_ref::<C::Props>(current_props, "props", name),
            checked_downcast_ref::<C::Props>(next_props, "props", name),
            checked_downcast_ref::<C::State>(current_state, "state", name),
            checked_downcast_ref::<C::State>(next_state, "state", name),
            parent,
        )
    }
}

// =============================================================================
// Replace Key
// =============================================================================

/// Identity used to match nodes across reconciliation passes: component
/// kind plus optional key. Descriptions without a key collide on kind
/// alone, so unkeyed siblings of the same kind pair up positionally.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ReplaceKey {
    kind: TypeId,
    key: Option<String>,
}

// =============================================================================
// Description
// =============================================================================

/// Immutable specification of one UI node: component kind + props +
/// optional key. Cheap to clone (Rc internals).
pub struct Description<S, A> {
    component: Rc<dyn AnyComponent<S, A>>,
    props: Rc<dyn Any>,
    key: Option<String>,
}

impl<S, A> Clone for Description<S, A> {
    fn clone(&self) -> Self {
        Self {
            component: self.component.clone(),
            props: self.props.clone(),
            key: self.key.clone(),
        }
    }
}

impl<S, A> fmt::Debug for Description<S, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Description")
            .field("component", &self.component.kind_name())
            .field("key", &self.key)
            .finish()
    }
}

impl<S: 'static, A: 'static> Description<S, A> {
    /// Describe a node of component kind `C` with the given props.
    pub fn new<C: Component<S, A>>(props: C::Props) -> Self {
        Self {
            component: Rc::new(Bridge::<C>(PhantomData)),
            props: Rc::new(props),
            key: None,
        }
    }

    /// Attach a key, making the replace-key unique among same-kind siblings.
    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    pub fn key(&self) -> Option<&str> {
        self.key.as_deref()
    }

    /// The node-matching identity for this description.
    pub fn replace_key(&self) -> ReplaceKey {
        ReplaceKey {
            kind: self.component.kind(),
            key: self.key.clone(),
        }
    }

    pub fn kind_name(&self) -> &'static str {
        self.component.kind_name()
    }

    /// Typed view of the raw props. Panics if `C` is not this
    /// description's component kind (contract violation).
    pub fn props<C: Component<S, A>>(&self) -> &C::Props {
        assert_eq!(
            self.component.kind(),
            TypeId::of::<C>(),
            "props::<{}>() on a `{}` description",
            std::any::type_name::<C>(),
            self.kind_name(),
        );
        checked_downcast_ref::<C::Props>(self.props.as_ref(), "props", self.kind_name())
    }

    /// Rewrite the typed props, keeping kind and key. Used by animation
    /// entry/exit transforms.
    pub fn map_props<C: Component<S, A>>(
        mut self,
        f: impl FnOnce(C::Props) -> C::Props,
    ) -> Self {
        let props = self.props::<C>().clone();
        self.props = Rc::new(f(props));
        self
    }

    pub(crate) fn component(&self) -> &Rc<dyn AnyComponent<S, A>> {
        &self.component
    }

    pub(crate) fn raw_props(&self) -> &Rc<dyn Any> {
        &self.props
    }
}

// =============================================================================
// Tests
// =============================================================================
