use std::cell::RefCell;
use std::rc::Rc;

use gloo_timers::callback::Timeout;

/// Cancel-and-reschedule timer, one per hook instance.
///
/// Each [`schedule`](Debounce::schedule) cancels the pending timeout and arms
/// a fresh one, so a burst of calls collapses into a single firing after
/// `delay_ms` of quiescence. Single-threaded event loop — no locking.
#[derive(Clone)]
pub(crate) struct Debounce {
    delay_ms: u32,
    pending: Rc<RefCell<Option<Timeout>>>,
}

impl Debounce {
    pub(crate) fn new(delay_ms: u32) -> Self {
        Self {
            delay_ms,
            pending: Rc::new(RefCell::new(None)),
        }
    }

    pub(crate) fn schedule(&self, f: impl FnOnce() + 'static) {
        if let Some(pending) = self.pending.borrow_mut().take() {
            pending.cancel();
        }
        let slot = Rc::clone(&self.pending);
        let timeout = Timeout::new(self.delay_ms, move || {
            // Release the handle before running so a re-schedule from inside
            // the callback starts clean.
            slot.borrow_mut().take();
            f();
        });
        *self.pending.borrow_mut() = Some(timeout);
    }

    pub(crate) fn cancel(&self) {
        if let Some(pending) = self.pending.borrow_mut().take() {
            pending.cancel();
        }
    }
}
