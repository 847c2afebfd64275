//! Core orchestration logic.
//!
//! This module contains:
//! - Task: the completion-callback contract for caller-supplied work
//! - Policy: fatal/ignorable classification of task errors
//! - Node: particles, compounds, and sequential activation
//! - Join: fan-in for a compound's concurrent members
//! - Drive: per-thread loop keeping synchronous activation off the stack
//! - Chain: the container and run controller

pub mod chain;
mod drive;
mod join;
pub mod node;
pub mod policy;
pub mod task;

// Re-export commonly used types
pub use chain::{Chain, ReactionFuture};
pub use node::{Compound, Node, Particle};
pub use policy::FailurePolicy;
pub use task::{AsyncTask, Completion, Spawned, Task};
