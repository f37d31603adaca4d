//! Terminal container backend.
//!
//! [`TermContainer`] is the terminal's [`DrawableContainer`]: every
//! node's native view is a [`TermView`] (absolute-positioned text plus
//! a foreground color), containers nest the same way nodes do, and
//! sibling order is z-order with the last child on top.
//!
//! [`TermRenderer`] turns a container tree into terminal output: it
//! flattens the tree back-to-front into draw commands, diffs them
//! against the previous frame, and when anything changed redraws inside
//! a synchronized block flushed as one write. Animation specs handed to
//! [`DrawableContainer::update_view`] are ignored; terminal cells have
//! no intermediate values, so every update lands instantly.

use std::any::Any;
use std::cell::RefCell;
use std::io;
use std::rc::Rc;

use crossterm::style::{Color, Print, ResetColor, SetForegroundColor};
use crossterm::terminal::{
    self, BeginSynchronizedUpdate, Clear, ClearType, EndSynchronizedUpdate, EnterAlternateScreen,
    LeaveAlternateScreen,
};
use crossterm::{cursor, execute, queue};

use crate::container::{same_container, ContainerRef, DrawableContainer};
use crate::engine::animation::AnimationSpec;

use super::output::OutputBuffer;

/// Terminal backend failure.
#[derive(Debug, thiserror::Error)]
pub enum TermError {
    #[error("terminal io: {0}")]
    Io(#[from] io::Error),
}

// =============================================================================
// Views
// =============================================================================

/// Native view for the terminal backend: a run of text at an absolute
/// cell position.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TermView {
    pub x: u16,
    pub y: u16,
    pub text: String,
    pub fg: Option<Color>,
}

/// One flattened draw instruction, in paint order.
#[derive(Clone, Debug, PartialEq)]
pub struct DrawCommand {
    pub x: u16,
    pub y: u16,
    pub text: String,
    pub fg: Option<Color>,
}

// =============================================================================
// Container
// =============================================================================

/// Terminal node container: one [`TermView`] plus ordered children.
pub struct TermContainer {
    view: TermView,
    children: Vec<Rc<RefCell<TermContainer>>>,
}

impl TermContainer {
    /// Empty root container; its own view draws nothing.
    pub fn new_root() -> Rc<RefCell<TermContainer>> {
        Rc::new(RefCell::new(TermContainer {
            view: TermView::default(),
            children: Vec::new(),
        }))
    }

    pub fn view(&self) -> &TermView {
        &self.view
    }

    /// Flatten into paint order: own view first, then children
    /// back-to-front. Empty text draws nothing.
    fn collect(&self, commands: &mut Vec<DrawCommand>) {
        if !self.view.text.is_empty() {
            commands.push(DrawCommand {
                x: self.view.x,
                y: self.view.y,
                text: self.view.text.clone(),
                fg: self.view.fg,
            });
        }
        for child in &self.children {
            child.borrow().collect(commands);
        }
    }

    fn position_of(&self, child: &ContainerRef) -> Option<usize> {
        self.children.iter().position(|candidate| {
            let candidate: ContainerRef = candidate.clone();
            same_container(&candidate, child)
        })
    }
}

impl DrawableContainer for TermContainer {
    fn add_child(&mut self, factory: &mut dyn FnMut() -> Box<dyn Any>) -> ContainerRef {
        let view = *factory()
            .downcast::<TermView>()
            .unwrap_or_else(|_| panic!("terminal backend requires TermView native views"));
        let child = Rc::new(RefCell::new(TermContainer {
            view,
            children: Vec::new(),
        }));
        self.children.push(child.clone());
        child
    }

    fn update_view(&mut self, _animation: Option<&AnimationSpec>, f: &mut dyn FnMut(&mut dyn Any)) {
        f(&mut self.view);
    }

    fn child_containers(&self) -> Vec<ContainerRef> {
        self.children
            .iter()
            .map(|child| {
                let child: ContainerRef = child.clone();
                child
            })
            .collect()
    }

    fn bring_child_to_front(&mut self, child: &ContainerRef) {
        if let Some(position) = self.position_of(child) {
            let moved = self.children.remove(position);
            self.children.push(moved);
        }
    }

    fn remove_child(&mut self, child: &ContainerRef) {
        if let Some(position) = self.position_of(child) {
            self.children.remove(position);
        }
    }

    fn remove_all_children(&mut self) {
        self.children.clear();
    }
}

// =============================================================================
// Renderer
// =============================================================================

/// Draws a [`TermContainer`] tree to the terminal.
///
/// Frames are diffed as whole command lists: an unchanged tree costs
/// nothing, any change costs one synchronized clear-and-redraw in a
/// single write. Call [`TermRenderer::enter`] before the first frame
/// and [`TermRenderer::leave`] (or drop) to restore the terminal.
pub struct TermRenderer {
    output: OutputBuffer,
    previous: Option<Vec<DrawCommand>>,
    entered: bool,
}

impl TermRenderer {
    pub fn new() -> Self {
        Self {
            output: OutputBuffer::new(),
            previous: None,
            entered: false,
        }
    }

    /// Switch to the alternate screen with raw mode and a hidden cursor.
    pub fn enter(&mut self) -> Result<(), TermError> {
        terminal::enable_raw_mode()?;
        execute!(io::stdout(), EnterAlternateScreen, cursor::Hide)?;
        self.entered = true;
        tracing::debug!("entered alternate screen");
        Ok(())
    }

    /// Restore the terminal. Safe to call when not entered.
    pub fn leave(&mut self) -> Result<(), TermError> {
        if !self.entered {
            return Ok(());
        }
        execute!(io::stdout(), cursor::Show, LeaveAlternateScreen)?;
        terminal::disable_raw_mode()?;
        self.entered = false;
        tracing::debug!("left alternate screen");
        Ok(())
    }

    /// Render a frame. Returns true when the terminal was touched.
    pub fn render(&mut self, root: &Rc<RefCell<TermContainer>>) -> Result<bool, TermError> {
        let commands = flatten(root);
        if self.previous.as_ref() == Some(&commands) {
            return Ok(false);
        }

        queue!(self.output, BeginSynchronizedUpdate, Clear(ClearType::All))?;
        for command in &commands {
            queue!(self.output, cursor::MoveTo(command.x, command.y))?;
            match command.fg {
                Some(color) => queue!(
                    self.output,
                    SetForegroundColor(color),
                    Print(&command.text),
                    ResetColor
                )?,
                None => queue!(self.output, Print(&command.text))?,
            }
        }
        queue!(self.output, EndSynchronizedUpdate)?;
        self.output.flush_stdout()?;

        tracing::trace!(commands = commands.len(), "frame drawn");
        self.previous = Some(commands);
        Ok(true)
    }
}

impl Default for TermRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for TermRenderer {
    fn drop(&mut self) {
        let _ = self.leave();
    }
}

/// Flatten a container tree into paint-ordered draw commands.
pub fn flatten(root: &Rc<RefCell<TermContainer>>) -> Vec<DrawCommand> {
    let mut commands = Vec::new();
    root.borrow().collect(&mut commands);
    commands
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn text_view(x: u16, y: u16, text: &str) -> TermView {
        TermView {
            x,
            y,
            text: text.into(),
            fg: None,
        }
    }

    fn add(root: &Rc<RefCell<TermContainer>>, view: TermView) -> ContainerRef {
        let mut factory = || Box::new(view.clone()) as Box<dyn Any>;
        root.borrow_mut().add_child(&mut factory)
    }

    #[test]
    fn test_flatten_paints_back_to_front() {
        let root = TermContainer::new_root();
        add(&root, text_view(0, 0, "back"));
        let front = add(&root, text_view(0, 0, "front"));
        root.borrow_mut().bring_child_to_front(&front);

        let commands = flatten(&root);
        assert_eq!(commands.len(), 2);
        assert_eq!(commands[0].text, "back");
        assert_eq!(commands[1].text, "front");
    }

    #[test]
    fn test_update_view_is_instant() {
        let root = TermContainer::new_root();
        let child = add(&root, text_view(1, 2, "old"));

        let spec = AnimationSpec::new(std::time::Duration::from_millis(200));
        child.borrow_mut().update_view(Some(&spec), &mut |view| {
            view.downcast_mut::<TermView>().unwrap().text = "new".into();
        });

        let commands = flatten(&root);
        assert_eq!(commands, vec![DrawCommand {
            x: 1,
            y: 2,
            text: "new".into(),
            fg: None,
        }]);
    }

    #[test]
    #[should_panic(expected = "TermView")]
    fn test_foreign_view_panics() {
        let root = TermContainer::new_root();
        let mut factory = || Box::new(42u32) as Box<dyn Any>;
        root.borrow_mut().add_child(&mut factory);
    }

    #[test]
    fn test_remove_child_by_identity() {
        let root = TermContainer::new_root();
        let a = add(&root, text_view(0, 0, "a"));
        add(&root, text_view(0, 1, "b"));

        root.borrow_mut().remove_child(&a);
        let commands = flatten(&root);
        assert_eq!(commands.len(), 1);
        assert_eq!(commands[0].text, "b");
    }
}
