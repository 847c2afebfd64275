//! Nodes and the activation protocol.
//!
//! A chain is a shared, immutable sequence of nodes. "Next" is resolved by
//! position through a [`Cursor`], so nodes never hold links to each other.

use std::sync::Arc;

use tracing::{debug, warn};
use uuid::Uuid;

use crate::domain::ReactionError;

use super::drive;
use super::join::Join;
use super::policy::FailurePolicy;
use super::task::{Completion, Task};

/// Terminal callbacks threaded through every advance; exactly one fires
pub(crate) struct Handlers<E> {
    on_finished: Box<dyn FnOnce() + Send>,
    on_failed: Box<dyn FnOnce(ReactionError<E>) + Send>,
}

impl<E> Handlers<E> {
    pub(crate) fn new<F, G>(on_finished: F, on_failed: G) -> Self
    where
        F: FnOnce() + Send + 'static,
        G: FnOnce(ReactionError<E>) + Send + 'static,
    {
        Self {
            on_finished: Box::new(on_finished),
            on_failed: Box::new(on_failed),
        }
    }

    pub(crate) fn finish(self) {
        (self.on_finished)()
    }

    pub(crate) fn fail(self, error: ReactionError<E>) {
        (self.on_failed)(error)
    }
}

/// Position of the active node within its sequence
pub(crate) struct Cursor<E> {
    nodes: Arc<[Arc<Node<E>>]>,
    position: usize,
    handlers: Handlers<E>,
    run_id: Uuid,
}

impl<E: Send + 'static> Cursor<E> {
    /// Activate the first node of `nodes`, or finish at once if empty
    pub(crate) fn start(nodes: Arc<[Arc<Node<E>>]>, handlers: Handlers<E>, run_id: Uuid) {
        let cursor = Self {
            nodes,
            position: 0,
            handlers,
            run_id,
        };
        drive::schedule(move || cursor.activate());
    }

    pub(crate) fn run_id(&self) -> Uuid {
        self.run_id
    }

    /// Activate the following node, or finish the sequence
    pub(crate) fn advance(self) {
        let next = Self {
            position: self.position + 1,
            ..self
        };
        drive::schedule(move || next.activate());
    }

    /// Halt the sequence; later nodes are never activated
    pub(crate) fn fail(self, error: ReactionError<E>) {
        self.handlers.fail(error)
    }

    fn activate(self) {
        let current = self.nodes.get(self.position).cloned();
        match current {
            Some(node) => {
                debug!(run_id = %self.run_id, position = self.position, "Activating node");
                node.activate(self);
            }
            None => self.handlers.finish(),
        }
    }
}

/// A unit of chain execution
pub enum Node<E> {
    Particle(Particle<E>),
    Compound(Compound<E>),
}

impl<E: Send + 'static> Node<E> {
    pub(crate) fn activate(&self, cursor: Cursor<E>) {
        match self {
            Self::Particle(particle) => particle.activate(cursor),
            Self::Compound(compound) => compound.activate(cursor),
        }
    }
}

/// One task plus its failure policy
pub struct Particle<E> {
    task: Arc<dyn Task<E>>,
    policy: FailurePolicy<E>,
    label: Option<String>,
}

impl<E> Particle<E> {
    /// Wrap a task with the default always-fatal policy
    pub fn new<T>(task: T) -> Self
    where
        T: Task<E> + 'static,
    {
        Self {
            task: Arc::new(task),
            policy: FailurePolicy::always_fatal(),
            label: None,
        }
    }

    /// Label used in logs
    pub fn named(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn with_policy(mut self, policy: FailurePolicy<E>) -> Self {
        self.policy = policy;
        self
    }
}

impl<E: Send + 'static> Particle<E> {
    fn activate(&self, cursor: Cursor<E>) {
        let run_id = cursor.run_id();
        let label = self.label.clone().unwrap_or_default();
        let policy = self.policy.clone();
        debug!(%run_id, particle = %label, "Activating particle");

        self.task.start(Completion::new(move |outcome| match outcome {
            None => cursor.advance(),
            Some(error) if policy.is_fatal(&error) => {
                warn!(%run_id, particle = %label, "Particle failed");
                cursor.fail(ReactionError::Particle(error));
            }
            Some(_) => {
                warn!(%run_id, particle = %label, "Particle error ignored by policy");
                cursor.advance();
            }
        }));
    }
}

/// Nodes run concurrently and joined before the chain continues
pub struct Compound<E> {
    members: Vec<Arc<Node<E>>>,
}

impl<E> Compound<E> {
    /// Snapshot of another chain's nodes; the handles are shared, not moved
    pub(crate) fn new(members: Vec<Arc<Node<E>>>) -> Self {
        Self { members }
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

impl<E: Send + 'static> Compound<E> {
    fn activate(&self, cursor: Cursor<E>) {
        if self.members.is_empty() {
            return cursor.advance();
        }

        let run_id = cursor.run_id();
        debug!(%run_id, members = self.members.len(), "Fanning out compound");

        let join = Arc::new(Join::new(self.members.len(), cursor));
        for member in &self.members {
            let on_done = Arc::clone(&join);
            let on_error = Arc::clone(&join);
            let handlers = Handlers::new(
                move || on_done.arrive(None),
                move |error| on_error.arrive(Some(error)),
            );

            // Each member runs as a sequence of one; its own successors are
            // not followed.
            let standalone: Arc<[Arc<Node<E>>]> = Arc::from(vec![Arc::clone(member)]);
            Cursor::start(standalone, handlers, run_id);
        }
    }
}
