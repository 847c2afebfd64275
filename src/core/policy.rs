//! Failure classification for particles.
//!
//! A policy decides whether an error reported by a task halts the chain
//! (fatal) or is discarded so the chain keeps going.

use std::fmt;
use std::sync::Arc;

/// Predicate over a task error: `true` means fatal
pub struct FailurePolicy<E> {
    predicate: Arc<dyn Fn(&E) -> bool + Send + Sync>,
}

impl<E> FailurePolicy<E> {
    /// Build a policy from an arbitrary predicate
    pub fn new<F>(predicate: F) -> Self
    where
        F: Fn(&E) -> bool + Send + Sync + 'static,
    {
        Self {
            predicate: Arc::new(predicate),
        }
    }

    /// Every error halts the chain
    pub fn always_fatal() -> Self {
        Self::new(|_| true)
    }

    /// Every error is ignored and the chain continues
    pub fn never_fatal() -> Self {
        Self::new(|_| false)
    }

    /// Classify an error
    pub fn is_fatal(&self, error: &E) -> bool {
        (self.predicate)(error)
    }
}

impl<E> Default for FailurePolicy<E> {
    fn default() -> Self {
        Self::always_fatal()
    }
}

impl<E> Clone for FailurePolicy<E> {
    fn clone(&self) -> Self {
        Self {
            predicate: Arc::clone(&self.predicate),
        }
    }
}

impl<E> fmt::Debug for FailurePolicy<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FailurePolicy").finish_non_exhaustive()
    }
}
