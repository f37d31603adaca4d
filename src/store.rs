//! Application store - reducer, middleware chain, listeners.
//!
//! The store is the single owner of application state. State is replaced
//! wholesale on every dispatch:
//!
//! ```text
//! dispatch(action) → middleware chain → reducer → new state → listeners
//! ```
//!
//! Everything is synchronous and single-threaded. The store asserts the
//! single-writer discipline by construction (`Rc`, no `Send`), not with
//! locks; dispatching from a listener or reducer is unsupported and is
//! logged as a defect rather than prevented.
//!
//! # Example
//!
//! ```
//! use cinder_ui::Store;
//!
//! #[derive(Clone)]
//! struct Counter { count: i32 }
//!
//! enum Msg { Increment }
//!
//! let store = Store::new(Counter { count: 0 }, |state, action| match action {
//!     Msg::Increment => Counter { count: state.count + 1 },
//! });
//!
//! store.dispatch(Msg::Increment);
//! assert_eq!(store.state().count, 1);
//! ```

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

// =============================================================================
// Type Aliases
// =============================================================================

/// A single link in the dispatch chain.
pub type DispatchChain<A> = Rc<dyn Fn(A)>;

/// Middleware wraps the dispatch function at construction time.
///
/// Given the store and the next link, a middleware returns its own link.
/// It may forward, transform, or swallow the action. The chain is composed
/// right-to-left: the last-registered middleware runs closest to the
/// reducer, the first-registered sees the action first.
///
/// Capture the store weakly inside the returned closure; the composed
/// chain is cached on the store itself.
pub type Middleware<S, A> = Rc<dyn Fn(&Rc<Store<S, A>>, DispatchChain<A>) -> DispatchChain<A>>;

/// Listener invoked after every state replacement, with the store.
pub type Listener<S, A> = Rc<dyn Fn(&Store<S, A>)>;

/// Unsubscribe closure returned by [`Store::subscribe`].
pub type Unsubscribe = Box<dyn FnOnce()>;

// =============================================================================
// Store
// =============================================================================

/// Central holder of application state.
///
/// Constructed behind `Rc`; one store per mounted tree. Listeners are
/// notified in insertion order. See the module docs for the dispatch flow.
pub struct Store<S, A> {
    state: RefCell<S>,
    reducer: Box<dyn Fn(&S, &A) -> S>,
    middleware: Vec<Middleware<S, A>>,
    /// Tombstoned slots keep unsubscribe indices stable.
    listeners: RefCell<Vec<Option<Listener<S, A>>>>,
    /// Composed middleware chain, built lazily on first dispatch.
    chain: RefCell<Option<DispatchChain<A>>>,
    dispatching: Cell<bool>,
    this: Weak<Store<S, A>>,
}

impl<S: 'static, A: 'static> Store<S, A> {
    /// Create a store with the given initial state and reducer.
    pub fn new(initial: S, reducer: impl Fn(&S, &A) -> S + 'static) -> Rc<Self> {
        Self::with_middleware(initial, reducer, Vec::new())
    }

    /// Create a store with a fixed middleware sequence.
    ///
    /// The sequence cannot change after construction. Composition is
    /// right-to-left: `middleware[last]` runs closest to the reducer.
    pub fn with_middleware(
        initial: S,
        reducer: impl Fn(&S, &A) -> S + 'static,
        middleware: Vec<Middleware<S, A>>,
    ) -> Rc<Self> {
        Rc::new_cyclic(|this| Store {
            state: RefCell::new(initial),
            reducer: Box::new(reducer),
            middleware,
            listeners: RefCell::new(Vec::new()),
            chain: RefCell::new(None),
            dispatching: Cell::new(false),
            this: this.clone(),
        })
    }

    /// Current state snapshot.
    pub fn state(&self) -> S
    where
        S: Clone,
    {
        self.state.borrow().clone()
    }

    /// Run `f` against the current state without cloning it.
    pub fn with_state<T>(&self, f: impl FnOnce(&S) -> T) -> T {
        f(&self.state.borrow())
    }

    /// Dispatch an action through the full middleware chain.
    ///
    /// Replaces the state wholesale, then synchronously notifies every
    /// listener registered at the time of the dispatch.
    pub fn dispatch(&self, action: A) {
        let chain = self.ensure_chain();
        chain(action);
    }

    /// Append a listener. Returns an unsubscribe closure that removes
    /// exactly the listener registered here, regardless of how many
    /// listeners were added or removed in between.
    pub fn subscribe(&self, listener: impl Fn(&Store<S, A>) + 'static) -> Unsubscribe {
        let index = {
            let mut listeners = self.listeners.borrow_mut();
            listeners.push(Some(Rc::new(listener)));
            listeners.len() - 1
        };
        let store = self.this.clone();
        Box::new(move || {
            if let Some(store) = store.upgrade() {
                store.listeners.borrow_mut()[index] = None;
            }
        })
    }

    /// Number of live listeners.
    pub fn listener_count(&self) -> usize {
        self.listeners.borrow().iter().flatten().count()
    }

    fn ensure_chain(&self) -> DispatchChain<A> {
        if let Some(chain) = self.chain.borrow().clone() {
            return chain;
        }
        let this = self
            .this
            .upgrade()
            .expect("store invoked outside of its Rc");
        let weak = Rc::downgrade(&this);
        let base: DispatchChain<A> = Rc::new(move |action: A| {
            if let Some(store) = weak.upgrade() {
                store.reduce_and_notify(action);
            }
        });
        let chain = self
            .middleware
            .iter()
            .rev()
            .fold(base, |next, middleware| middleware(&this, next));
        *self.chain.borrow_mut() = Some(chain.clone());
        chain
    }

    fn reduce_and_notify(&self, action: A) {
        if self.dispatching.replace(true) {
            // Unsupported per design; surfaced, not prevented.
            tracing::warn!("nested dispatch during reducer or listener notification");
        }
        let next = {
            let state = self.state.borrow();
            (self.reducer)(&state, &action)
        };
        *self.state.borrow_mut() = next;
        self.dispatching.set(false);

        // Snapshot so listener add/remove during notification cannot
        // invalidate the iteration.
        let listeners: Vec<Listener<S, A>> =
            self.listeners.borrow().iter().flatten().cloned().collect();
        tracing::trace!(listeners = listeners.len(), "store dispatched action");
        for listener in listeners {
            listener(self);
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone, Debug, PartialEq)]
    struct AppState {
        count: i32,
    }

    #[derive(Clone, Copy, Debug)]
    enum AppAction {
        Increment,
        Add(i32),
    }

    fn reduce(state: &AppState, action: &AppAction) -> AppState {
        match action {
            AppAction::Increment => AppState {
                count: state.count + 1,
            },
            AppAction::Add(n) => AppState {
                count: state.count + n,
            },
        }
    }

    fn counter_store() -> Rc<Store<AppState, AppAction>> {
        Store::new(AppState { count: 0 }, reduce)
    }

    #[test]
    fn test_dispatch_folds_reducer_over_actions() {
        let store = counter_store();
        let actions = [
            AppAction::Increment,
            AppAction::Add(4),
            AppAction::Increment,
        ];
        for action in actions {
            store.dispatch(action);
        }

        let expected = actions
            .iter()
            .fold(AppState { count: 0 }, |state, action| {
                reduce(&state, action)
            });
        assert_eq!(store.state(), expected);
    }

    #[test]
    fn test_three_increments_notify_listener_each_time() {
        use std::cell::Cell;

        let store = counter_store();
        let calls = Rc::new(Cell::new(0));
        let calls_clone = calls.clone();
        let _unsub = store.subscribe(move |store| {
            calls_clone.set(calls_clone.get() + 1);
            // The listener receives the store itself.
            assert!(store.state().count > 0);
        });

        store.dispatch(AppAction::Increment);
        store.dispatch(AppAction::Increment);
        store.dispatch(AppAction::Increment);

        assert_eq!(store.state().count, 3);
        assert_eq!(calls.get(), 3);
    }

    #[test]
    fn test_unsubscribe_removes_originally_registered_listener() {
        use std::cell::RefCell;

        let store = counter_store();
        let hits: Rc<RefCell<Vec<&'static str>>> = Rc::new(RefCell::new(Vec::new()));

        let hits_a = hits.clone();
        let unsub_a = store.subscribe(move |_| hits_a.borrow_mut().push("a"));

        // Additional listeners registered after the unsubscribe was obtained.
        let hits_b = hits.clone();
        let _unsub_b = store.subscribe(move |_| hits_b.borrow_mut().push("b"));
        let hits_c = hits.clone();
        let _unsub_c = store.subscribe(move |_| hits_c.borrow_mut().push("c"));

        unsub_a();
        store.dispatch(AppAction::Increment);

        assert_eq!(*hits.borrow(), vec!["b", "c"]);
        assert_eq!(store.listener_count(), 2);
    }

    #[test]
    fn test_listeners_notified_in_insertion_order() {
        use std::cell::RefCell;

        let store = counter_store();
        let order: Rc<RefCell<Vec<u8>>> = Rc::new(RefCell::new(Vec::new()));
        for tag in 0..4u8 {
            let order = order.clone();
            let _ = store.subscribe(move |_| order.borrow_mut().push(tag));
        }

        store.dispatch(AppAction::Increment);
        assert_eq!(*order.borrow(), vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_middleware_composed_right_to_left() {
        use std::cell::RefCell;

        let order: Rc<RefCell<Vec<&'static str>>> = Rc::new(RefCell::new(Vec::new()));

        let first = {
            let order = order.clone();
            let mw: Middleware<AppState, AppAction> = Rc::new(move |_store, next| {
                let order = order.clone();
                Rc::new(move |action| {
                    order.borrow_mut().push("first");
                    next(action);
                })
            });
            mw
        };
        let last = {
            let order = order.clone();
            let mw: Middleware<AppState, AppAction> = Rc::new(move |_store, next| {
                let order = order.clone();
                Rc::new(move |action| {
                    order.borrow_mut().push("last");
                    next(action);
                })
            });
            mw
        };

        let store = Store::with_middleware(AppState { count: 0 }, reduce, vec![first, last]);
        store.dispatch(AppAction::Increment);

        // First-registered sees the action first; last-registered runs
        // closest to the reducer.
        assert_eq!(*order.borrow(), vec!["first", "last"]);
        assert_eq!(store.state().count, 1);
    }

    #[test]
    fn test_middleware_can_short_circuit() {
        let drop_adds: Middleware<AppState, AppAction> = Rc::new(|_store, next| {
            Rc::new(move |action| match action {
                AppAction::Add(_) => {}
                other => next(other),
            })
        });

        let store = Store::with_middleware(AppState { count: 0 }, reduce, vec![drop_adds]);
        store.dispatch(AppAction::Add(10));
        assert_eq!(store.state().count, 0);

        store.dispatch(AppAction::Increment);
        assert_eq!(store.state().count, 1);
    }

    #[test]
    fn test_middleware_can_transform_action() {
        let double: Middleware<AppState, AppAction> = Rc::new(|_store, next| {
            Rc::new(move |action| match action {
                AppAction::Add(n) => next(AppAction::Add(n * 2)),
                other => next(other),
            })
        });

        let store = Store::with_middleware(AppState { count: 0 }, reduce, vec![double]);
        store.dispatch(AppAction::Add(3));
        assert_eq!(store.state().count, 6);
    }

    #[test]
    fn test_with_state_avoids_clone() {
        let store = counter_store();
        store.dispatch(AppAction::Add(7));
        let count = store.with_state(|state| state.count);
        assert_eq!(count, 7);
    }
}
