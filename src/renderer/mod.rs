//! Terminal renderer.
//!
//! The bundled [`DrawableContainer`] backend: tree nodes draw into
//! [`TermContainer`]s holding positioned text views, and
//! [`TermRenderer`] diffs whole frames and writes each changed frame to
//! the terminal in one synchronized flush.
//!
//! The engine does not depend on this module; any host can supply its
//! own container implementation instead.
//!
//! [`DrawableContainer`]: crate::container::DrawableContainer

mod output;
mod term;

pub use output::OutputBuffer;
pub use term::{flatten, DrawCommand, TermContainer, TermError, TermRenderer, TermView};
