//! Animation protocol - native-level plans and children transitions.
//!
//! Two layers:
//!
//! - [`AnimationSpec`] describes a native-level transition (duration and
//!   curve). The core never interpolates anything itself; the spec is
//!   handed to the drawable container, which interprets or ignores it.
//! - [`ChildrenAnimation`] is the per-update directive a component returns
//!   for the upcoming children transition: the native spec for the visible
//!   step plus entry/exit transforms that rewrite child descriptions for
//!   the intermediate frames (e.g. an entering child made invisible, an
//!   exiting child faded out).
//!
//! The 4-phase state machine that consumes the directive lives in
//! `engine::reconcile`; this module owns the value types and the
//! intermediate-list merge.

use std::rc::Rc;
use std::time::Duration;

use crate::description::Description;

// =============================================================================
// Native-Level Plan
// =============================================================================

/// Interpolation curve for a native transition.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Curve {
    #[default]
    Linear,
    EaseIn,
    EaseOut,
    EaseInOut,
}

/// A native-level transition plan: how long, and along which curve.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AnimationSpec {
    pub duration: Duration,
    pub curve: Curve,
}

impl AnimationSpec {
    pub fn new(duration: Duration) -> Self {
        Self {
            duration,
            curve: Curve::default(),
        }
    }

    pub fn with_curve(mut self, curve: Curve) -> Self {
        self.curve = curve;
        self
    }
}

// =============================================================================
// Children Animation Directive
// =============================================================================

/// Rewrites a child description for an intermediate transition frame.
pub type DescriptionTransform<S, A> = Rc<dyn Fn(Description<S, A>) -> Description<S, A>>;

/// Directive for one children transition, returned by
/// `Component::children_animation` ahead of a reconciliation pass.
///
/// When `entry`/`exit` are empty the directive only carries the native
/// spec (possibly none) and the update applies in a single step. When
/// either transform list is non-empty and a native spec is present, the
/// reconciler runs the 4-phase transition instead.
pub struct ChildrenAnimation<S, A> {
    /// Native-level spec for the visible step; also wraps single-step applies.
    pub native: Option<AnimationSpec>,
    /// Applied to entering children in the first intermediate frame.
    pub entry: Vec<DescriptionTransform<S, A>>,
    /// Applied to exiting children in the second intermediate frame.
    pub exit: Vec<DescriptionTransform<S, A>>,
}

impl<S, A> Clone for ChildrenAnimation<S, A> {
    fn clone(&self) -> Self {
        Self {
            native: self.native,
            entry: self.entry.clone(),
            exit: self.exit.clone(),
        }
    }
}

impl<S, A> ChildrenAnimation<S, A> {
    /// No animation at all: a plain, instant update.
    pub fn none() -> Self {
        Self {
            native: None,
            entry: Vec::new(),
            exit: Vec::new(),
        }
    }

    /// Native-level animation only; children snap in a single step.
    pub fn native(spec: AnimationSpec) -> Self {
        Self {
            native: Some(spec),
            entry: Vec::new(),
            exit: Vec::new(),
        }
    }

    /// Full directive with entry/exit transforms for the 4-phase transition.
    pub fn transition(
        spec: AnimationSpec,
        entry: Vec<DescriptionTransform<S, A>>,
        exit: Vec<DescriptionTransform<S, A>>,
    ) -> Self {
        Self {
            native: Some(spec),
            entry,
            exit,
        }
    }

    /// Whether the reconciler should run the 4-phase transition.
    pub(crate) fn wants_transition(&self) -> bool {
        self.native.is_some() && (!self.entry.is_empty() || !self.exit.is_empty())
    }

    pub(crate) fn apply_entry(&self, description: Description<S, A>) -> Description<S, A> {
        self.entry
            .iter()
            .fold(description, |description, transform| transform(description))
    }

    pub(crate) fn apply_exit(&self, description: Description<S, A>) -> Description<S, A> {
        self.exit
            .iter()
            .fold(description, |description, transform| transform(description))
    }
}

// =============================================================================
// Transition Phases
// =============================================================================

/// Phase of an animated children update. Terminal state is `Final`;
/// an interrupted transition stops at `SecondIntermediate`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TransitionPhase {
    Initial,
    FirstIntermediate,
    SecondIntermediate,
    Final,
}

/// Merge a target children list with the exiting children from the
/// previous list, keeping each exiting child near its old position.
///
/// `exiting` carries `(old index, description)` pairs in old-list order.
pub(crate) fn merge_children<S, A>(
    target: &[Description<S, A>],
    exiting: &[(usize, Description<S, A>)],
) -> Vec<Description<S, A>> {
    let mut merged: Vec<Description<S, A>> = target.to_vec();
    for (old_index, description) in exiting {
        let at = (*old_index).min(merged.len());
        merged.insert(at, description.clone());
    }
    merged
}

// =============================================================================
// Tests
// =============================================================================
