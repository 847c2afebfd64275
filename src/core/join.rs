//! Join point for a compound's concurrent members.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};

use tracing::debug;

use crate::domain::{CompoundError, ReactionError};

use super::node::Cursor;

/// Counts member arrivals and collects their errors. The member that brings
/// the count to zero resumes the outer cursor; nobody else touches it.
pub(crate) struct Join<E> {
    remaining: AtomicUsize,
    errors: Mutex<Vec<ReactionError<E>>>,
    cursor: Mutex<Option<Cursor<E>>>,
}

impl<E: Send + 'static> Join<E> {
    pub(crate) fn new(members: usize, cursor: Cursor<E>) -> Self {
        Self {
            remaining: AtomicUsize::new(members),
            errors: Mutex::new(Vec::new()),
            cursor: Mutex::new(Some(cursor)),
        }
    }

    /// Record one member's outcome
    pub(crate) fn arrive(&self, error: Option<ReactionError<E>>) {
        // The error is pushed before the decrement so the last arrival sees it.
        if let Some(error) = error {
            self.errors
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push(error);
        }

        if self.remaining.fetch_sub(1, Ordering::AcqRel) != 1 {
            return;
        }

        let cursor = self
            .cursor
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        let errors = std::mem::take(&mut *self.errors.lock().unwrap_or_else(PoisonError::into_inner));

        let Some(cursor) = cursor else {
            return;
        };

        debug!(run_id = %cursor.run_id(), failed = errors.len(), "Compound joined");
        if errors.is_empty() {
            cursor.advance();
        } else {
            cursor.fail(ReactionError::Compound(CompoundError::new(errors)));
        }
    }
}
