//! Deferred parse requests.
//!
//! A sink cannot call back into the parser while it is being driven, so it
//! keeps a [`ParseQueue`] handle instead and pushes requests there. The parser
//! drains the queue in order once the active request has run to completion.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ParseRequest {
    pub text: String,
    /// Input came from the server rather than from local echo.
    pub remote: bool,
    /// Run immediately even if other requests are pending.
    pub force: bool,
    /// Splice the text into a sequence that is still being scanned.
    pub prepend_tail: bool,
}

impl ParseRequest {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            remote: true,
            force: false,
            prepend_tail: false,
        }
    }

    pub fn local(text: impl Into<String>) -> Self {
        Self {
            remote: false,
            ..Self::new(text)
        }
    }

    pub fn with_force(mut self, force: bool) -> Self {
        self.force = force;
        self
    }

    pub fn with_prepend_tail(mut self, prepend_tail: bool) -> Self {
        self.prepend_tail = prepend_tail;
        self
    }

    pub fn ends_line(&self) -> bool {
        self.text.ends_with('\n')
    }
}

/// FIFO of pending requests; clones share the same queue.
#[derive(Debug, Clone, Default)]
pub struct ParseQueue(Rc<RefCell<VecDeque<ParseRequest>>>);

impl ParseQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues `request`. Empty requests are dropped.
    pub fn push(&self, request: ParseRequest) {
        if request.text.is_empty() {
            return;
        }
        self.0.borrow_mut().push_back(request);
    }

    pub fn pop(&self) -> Option<ParseRequest> {
        self.0.borrow_mut().pop_front()
    }

    pub fn len(&self) -> usize {
        self.0.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.borrow().is_empty()
    }

    /// Whether the last queued request completes a line.
    pub fn tail_ends_line(&self) -> bool {
        self.0.borrow().back().is_some_and(ParseRequest::ends_line)
    }

    pub fn clear(&self) {
        self.0.borrow_mut().clear();
    }
}
