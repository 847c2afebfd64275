//! chainreact - Chain reactions of asynchronous particles
//!
//! Register asynchronous operations ("particles") that run one after
//! another, stop on the first fatal failure, and group operations into
//! "compounds" that run concurrently and join before the chain continues.
//!
//! # Modules
//!
//! - `core`: Orchestration engine (Task, FailurePolicy, Node, Chain)
//! - `domain`: Data structures (ReactionError, Reaction)
//! - `scenario`: YAML-defined chains of simulated particles
//! - `cli`: Command-line interface
//!
//! # Usage
//!
//! ```no_run
//! use chainreact::{Chain, FailurePolicy};
//!
//! let mut chain: Chain<String> = Chain::new();
//! chain.add_particle(|done| done.succeed());
//! chain.add_particle_with_policy(
//!     |done| done.fail("cache miss".to_string()),
//!     FailurePolicy::never_fatal(),
//! );
//!
//! let mut group: Chain<String> = Chain::new();
//! group.add_particle(|done| done.succeed());
//! group.add_particle(|done| done.succeed());
//! chain.add_compound(&group);
//!
//! chain.run(|| println!("done"), |error| eprintln!("failed: {}", error));
//! ```

pub mod cli;
pub mod config;
pub mod core;
pub mod domain;
pub mod scenario;

// Re-export main types at crate root for convenience
pub use crate::core::{AsyncTask, Chain, Completion, FailurePolicy, Particle, ReactionFuture, Spawned, Task};
pub use crate::domain::{CompoundError, Reaction, ReactionError, ReactionReport, ReactionState};
pub use crate::scenario::{Journal, Scenario, SimulatedError};
