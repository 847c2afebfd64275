//! The chain: ordered container and run controller for nodes.
//!
//! Nodes are stored in insertion order, which is execution order. A run
//! snapshots the sequence, so appending during a run never affects it.

use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex, PoisonError};
use std::task::{Context, Poll};

use tokio::sync::oneshot;
use tracing::{info, warn};

use crate::domain::{Reaction, ReactionError, ReactionState};

use super::node::{Compound, Cursor, Handlers, Node, Particle};
use super::policy::FailurePolicy;
use super::task::{AsyncTask, Completion, FutureTask, Spawned, Task};

const DEFAULT_CHAIN_NAME: &str = "chain";

/// Ordered sequence of particles and compounds
pub struct Chain<E> {
    name: String,
    nodes: Vec<Arc<Node<E>>>,
}

impl<E> Default for Chain<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> Chain<E> {
    /// Create an empty chain
    pub fn new() -> Self {
        Self::named(DEFAULT_CHAIN_NAME)
    }

    /// Create an empty chain with a name used in logs and reports
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            nodes: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Append a prepared particle
    pub fn push(&mut self, particle: Particle<E>) -> &mut Self {
        self.nodes.push(Arc::new(Node::Particle(particle)));
        self
    }

    /// Append a closure task; any error it reports is fatal
    pub fn add_particle<F>(&mut self, task: F) -> &mut Self
    where
        F: Fn(Completion<E>) + Send + Sync + 'static,
    {
        self.push(Particle::new(task))
    }

    /// Append a closure task with its own failure policy
    pub fn add_particle_with_policy<F>(&mut self, task: F, policy: FailurePolicy<E>) -> &mut Self
    where
        F: Fn(Completion<E>) + Send + Sync + 'static,
    {
        self.push(Particle::new(task).with_policy(policy))
    }

    /// Append any [`Task`] implementation
    pub fn add_task<T>(&mut self, task: T, policy: FailurePolicy<E>) -> &mut Self
    where
        T: Task<E> + 'static,
    {
        self.push(Particle::new(task).with_policy(policy))
    }

    /// Append a group whose members are this moment's nodes of `source`.
    /// `source` is left untouched and later changes to it are not seen.
    pub fn add_compound(&mut self, source: &Chain<E>) -> &mut Self {
        let members = source.nodes.iter().map(Arc::clone).collect();
        self.nodes.push(Arc::new(Node::Compound(Compound::new(members))));
        self
    }
}

impl<E: Send + 'static> Chain<E> {
    /// Append an [`AsyncTask`], spawned on the tokio runtime when activated
    ///
    /// The particle must be activated from within a tokio runtime. Without
    /// one the task is not spawned, its completion is dropped, and the run
    /// never settles; [`Chain::react`] resolves to
    /// [`ReactionError::Abandoned`] in that case.
    pub fn add_async_task<T>(&mut self, task: T, policy: FailurePolicy<E>) -> &mut Self
    where
        T: AsyncTask<E> + 'static,
    {
        self.add_task(Spawned::new(task), policy)
    }

    /// Append a closure producing a future; any error it returns is fatal
    ///
    /// Needs a tokio runtime at activation, as for [`Chain::add_async_task`].
    pub fn add_async<F, Fut>(&mut self, factory: F) -> &mut Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), E>> + Send + 'static,
    {
        self.push(Particle::new(FutureTask::new(factory)))
    }

    /// Start the chain. Exactly one of the handlers fires, once.
    ///
    /// An empty chain calls `on_finished` before returning. Tasks that
    /// complete synchronously are driven in a loop, so chain length is not
    /// limited by stack depth. A run started from inside a task body begins
    /// once that task returns. Running the same chain concurrently is
    /// allowed, each run gets its own [`Reaction`].
    pub fn run<F, G>(&self, on_finished: F, on_failed: G) -> Reaction
    where
        F: FnOnce() + Send + 'static,
        G: FnOnce(ReactionError<E>) + Send + 'static,
    {
        let reaction = Reaction::new(self.name.clone());
        info!(run_id = %reaction.id(), chain = %self.name, nodes = self.nodes.len(), "Starting reaction");

        let finished = reaction.clone();
        let failed = reaction.clone();
        let handlers = Handlers::new(
            move || {
                finished.settle(ReactionState::Finished);
                info!(run_id = %finished.id(), "Reaction finished");
                on_finished();
            },
            move |error| {
                failed.settle(ReactionState::Failed);
                warn!(run_id = %failed.id(), "Reaction failed");
                on_failed(error);
            },
        );

        let nodes: Arc<[Arc<Node<E>>]> = Arc::from(self.nodes.clone());
        reaction.begin();
        Cursor::start(nodes, handlers, reaction.id());

        reaction
    }

    /// Start the chain and return a future for its outcome
    pub fn react(&self) -> ReactionFuture<E> {
        let (tx, rx) = oneshot::channel();
        let sender = Arc::new(Mutex::new(Some(tx)));
        let failed_sender = Arc::clone(&sender);

        let reaction = self.run(
            move || deliver(&sender, Ok(())),
            move |error| deliver(&failed_sender, Err(error)),
        );

        ReactionFuture {
            reaction,
            receiver: rx,
        }
    }
}

type Outcome<E> = Result<(), ReactionError<E>>;

fn deliver<E>(sender: &Mutex<Option<oneshot::Sender<Outcome<E>>>>, outcome: Outcome<E>) {
    let tx = sender.lock().unwrap_or_else(PoisonError::into_inner).take();
    if let Some(tx) = tx {
        // Receiver may already be gone; nothing to report to then.
        let _ = tx.send(outcome);
    }
}

/// Outcome of a started reaction
///
/// Resolves to [`ReactionError::Abandoned`] if the run can no longer settle
/// because a task dropped its completion.
pub struct ReactionFuture<E> {
    reaction: Reaction,
    receiver: oneshot::Receiver<Outcome<E>>,
}

impl<E> ReactionFuture<E> {
    /// Handle to the run this future waits on
    pub fn reaction(&self) -> &Reaction {
        &self.reaction
    }
}

impl<E> Unpin for ReactionFuture<E> {}

impl<E> Future for ReactionFuture<E> {
    type Output = Outcome<E>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();
        Pin::new(&mut this.receiver)
            .poll(cx)
            .map(|received| received.unwrap_or(Err(ReactionError::Abandoned)))
    }
}
