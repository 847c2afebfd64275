//! Domain types for chainreact.
//!
//! This module contains the plain data structures:
//! - Error: values reported to a chain's failure handler
//! - Reaction: run state and reporting

pub mod error;
pub mod reaction;

// Re-export commonly used types
pub use error::{CompoundError, ReactionError};
pub use reaction::{Reaction, ReactionReport, ReactionState};
