//! Tree Engine - live nodes and reconciliation.
//!
//! The engine manages the core data structures:
//! - Arena: generational slot storage behind stable [`NodeId`]s
//! - Node/Tree: live instances of descriptions, wired to containers
//! - Reconcile: keyed children diffing and the animated update phases
//! - Scheduler: FIFO queue for deferred tree work
//!
//! # Architecture
//!
//! A node never holds pointers to other nodes; all edges are `NodeId`s
//! resolved through the arena:
//!
//! ```text
//! NodeId 0: Row     (parent=-, container=#1, children=[1, 2])
//! NodeId 1: Label   (parent=0, container=#2, key="a")
//! NodeId 2: Counter (parent=0, container=#3, key="b", state=7)
//! ```
//!
//! Generations make dangling ids inert: a scheduled state update or a
//! deferred animation phase that outlives its node resolves to nothing
//! instead of touching a recycled slot.

pub mod animation;
mod arena;
#[cfg(test)]
pub(crate) mod fixtures;
pub(crate) mod node;
pub(crate) mod reconcile;
pub(crate) mod scheduler;

pub use animation::{
    AnimationSpec, ChildrenAnimation, Curve, DescriptionTransform, TransitionPhase,
};
pub use arena::NodeId;
