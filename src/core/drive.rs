//! Per-thread activation loop.
//!
//! A task that signals its completion before returning would otherwise
//! activate the next node from inside its own call, growing the stack by a
//! few frames per node. Activations requested while this thread is already
//! driving are queued instead, and the outermost caller runs them in order.
//! A thread that is not driving (a worker thread, a spawned future) starts
//! its own loop and runs the activation at once.

use std::cell::RefCell;
use std::collections::VecDeque;

type Step = Box<dyn FnOnce()>;

thread_local! {
    static PENDING: RefCell<Option<VecDeque<Step>>> = const { RefCell::new(None) };
}

/// Run `step` now, or after the activation currently on this thread's stack
pub(crate) fn schedule<F>(step: F)
where
    F: FnOnce() + 'static,
{
    let step: Step = Box::new(step);
    let first = PENDING.with(|pending| match pending.borrow_mut().as_mut() {
        Some(queue) => {
            queue.push_back(step);
            None
        }
        None => Some(step),
    });

    let Some(first) = first else {
        return;
    };

    PENDING.with(|pending| *pending.borrow_mut() = Some(VecDeque::new()));
    let _driving = Driving;

    first();
    while let Some(next) = PENDING.with(|pending| pending.borrow_mut().as_mut().and_then(VecDeque::pop_front)) {
        next();
    }
}

/// Clears the queue when the loop exits, including by unwinding
struct Driving;

impl Drop for Driving {
    fn drop(&mut self) {
        let leftover = PENDING.with(|pending| pending.borrow_mut().take());
        drop(leftover);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::rc::Rc;

    #[test]
    fn test_nested_steps_run_after_current() {
        let log = Rc::new(RefCell::new(Vec::new()));

        let outer = Rc::clone(&log);
        schedule(move || {
            let inner = Rc::clone(&outer);
            schedule(move || inner.borrow_mut().push("inner"));
            outer.borrow_mut().push("outer");
        });

        assert_eq!(*log.borrow(), vec!["outer", "inner"]);
    }

    #[test]
    fn test_deep_recursion_is_flattened() {
        fn countdown(n: usize, hits: Rc<RefCell<usize>>) {
            *hits.borrow_mut() += 1;
            if n > 0 {
                schedule(move || countdown(n - 1, hits));
            }
        }

        let hits = Rc::new(RefCell::new(0));
        let counter = Rc::clone(&hits);
        schedule(move || countdown(200_000, counter));

        assert_eq!(*hits.borrow(), 200_001);
    }

    #[test]
    fn test_loop_resets_after_panic() {
        let result = std::panic::catch_unwind(|| schedule(|| panic!("step failed")));
        assert!(result.is_err());

        let ran = Rc::new(RefCell::new(false));
        let flag = Rc::clone(&ran);
        schedule(move || *flag.borrow_mut() = true);
        assert!(*ran.borrow());
    }
}
