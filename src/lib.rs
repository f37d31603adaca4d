//! # cinder-ui
//!
//! Declarative UI core: a reducer store, immutable view descriptions,
//! and a keyed reconciliation engine with animated child transitions.
//!
//! ## Architecture
//!
//! State lives in a single [`Store`] and changes only through dispatched
//! actions. Components describe what should exist as immutable
//! [`Description`] values; the engine pairs descriptions to live nodes
//! by replace-key (component kind + optional key), mutates only the
//! native views that actually changed, and turns list changes into a
//! four-phase animated transition when the owning component asks for
//! one.
//!
//! ```text
//! Store → dispatch → Descriptions → reconcile → DrawableContainer mutations
//!                                       ↓
//!                            scheduler (deferred phases)
//! ```
//!
//! Native views are abstract: the engine talks to hosts through
//! [`DrawableContainer`], so the same tree drives the bundled terminal
//! backend, the in-memory test backend, or anything a host supplies.
//!
//! ## Modules
//!
//! - [`store`] - Reducer store with middleware and change listeners
//! - [`description`] - Component trait, descriptions, replace-keys
//! - [`container`] - Native-view container abstraction
//! - [`engine`] - Live node tree, reconciliation, animation phases
//! - [`root`] - Mounting, updates, and the deferred-work loop
//! - [`renderer`] - Terminal backend (diffed, synchronized output)

pub mod container;
pub mod description;
pub mod engine;
pub mod renderer;
pub mod root;
pub mod store;

// Re-export commonly used items
pub use store::{DispatchChain, Listener, Middleware, Store, Unsubscribe};

pub use description::{
    Component, ComponentContext, Description, Dispatch, ReplaceKey, Updater,
};

pub use container::{
    same_container, ContainerRef, DrawableContainer, MemoryContainer, MutationLog,
};

pub use engine::{
    AnimationSpec, ChildrenAnimation, Curve, DescriptionTransform, NodeId, TransitionPhase,
};

pub use root::Root;

pub use renderer::{TermContainer, TermError, TermRenderer, TermView};
