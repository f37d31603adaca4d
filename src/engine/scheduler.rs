//! Task queue for deferred tree work.
//!
//! Nothing in the engine hops threads: work that must not run inline
//! (state-update callbacks fired from component code, the FINAL phase of
//! an animated transition) is pushed here and drained by the root's
//! `tick`/`drain` loop on the owning execution context. FIFO order, no
//! hidden reentrancy.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use super::node::Tree;

pub(crate) type Task<S, A> = Box<dyn FnOnce(&mut Tree<S, A>)>;

pub(crate) struct Scheduler<S, A> {
    queue: Rc<RefCell<VecDeque<Task<S, A>>>>,
}

impl<S, A> Clone for Scheduler<S, A> {
    fn clone(&self) -> Self {
        Self {
            queue: self.queue.clone(),
        }
    }
}

impl<S, A> Scheduler<S, A> {
    pub(crate) fn new() -> Self {
        Self {
            queue: Rc::new(RefCell::new(VecDeque::new())),
        }
    }

    pub(crate) fn enqueue(&self, task: Task<S, A>) {
        self.queue.borrow_mut().push_back(task);
    }

    /// Pop the oldest task. The borrow is released before the task runs.
    pub(crate) fn pop(&self) -> Option<Task<S, A>> {
        self.queue.borrow_mut().pop_front()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.queue.borrow().is_empty()
    }

    pub(crate) fn len(&self) -> usize {
        self.queue.borrow().len()
    }
}
