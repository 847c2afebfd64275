//! Errors surfaced to a chain's failure handler.

use std::fmt;

use thiserror::Error;

/// The single error value a failed reaction reports
#[derive(Debug, Error)]
pub enum ReactionError<E> {
    /// A particle's task reported an error its policy classified as fatal.
    /// The task error is carried unchanged.
    #[error("{0}")]
    Particle(E),

    /// One or more members of a compound failed
    #[error("{0}")]
    Compound(CompoundError<E>),

    /// Every handle to the run was dropped without signalling
    #[error("reaction abandoned: a task dropped its completion without signalling")]
    Abandoned,
}

impl<E> ReactionError<E> {
    /// The task error, if this is a particle failure
    pub fn as_particle(&self) -> Option<&E> {
        match self {
            Self::Particle(e) => Some(e),
            _ => None,
        }
    }

    /// The aggregate, if this is a compound failure
    pub fn as_compound(&self) -> Option<&CompoundError<E>> {
        match self {
            Self::Compound(c) => Some(c),
            _ => None,
        }
    }

    fn collect_leaves<'a>(&'a self, out: &mut Vec<&'a E>) {
        match self {
            Self::Particle(e) => out.push(e),
            Self::Compound(c) => {
                for inner in &c.errors {
                    inner.collect_leaves(out);
                }
            }
            Self::Abandoned => {}
        }
    }
}

/// Errors from the failed members of a compound, in completion order
#[derive(Debug)]
pub struct CompoundError<E> {
    errors: Vec<ReactionError<E>>,
}

impl<E> CompoundError<E> {
    pub(crate) fn new(errors: Vec<ReactionError<E>>) -> Self {
        Self { errors }
    }

    /// Number of failed members
    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Member errors in the order the members completed
    pub fn errors(&self) -> &[ReactionError<E>] {
        &self.errors
    }

    /// Task errors from every failed particle, including those inside
    /// nested compounds
    pub fn leaf_errors(&self) -> Vec<&E> {
        let mut out = Vec::new();
        for error in &self.errors {
            error.collect_leaves(&mut out);
        }
        out
    }
}

impl<E: fmt::Display> fmt::Display for CompoundError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} compound member(s) failed", self.errors.len())?;
        for (i, error) in self.errors.iter().enumerate() {
            let sep = if i == 0 { ": " } else { "; " };
            write!(f, "{}{}", sep, error)?;
        }
        Ok(())
    }
}

impl<E: fmt::Debug + fmt::Display> std::error::Error for CompoundError<E> {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_particle_error_displays_unchanged() {
        let err: ReactionError<String> = ReactionError::Particle("disk full".to_string());
        assert_eq!(err.to_string(), "disk full");
        assert_eq!(err.as_particle().map(String::as_str), Some("disk full"));
    }

    #[test]
    fn test_compound_display_lists_members() {
        let err = CompoundError::new(vec![
            ReactionError::Particle("a"),
            ReactionError::Particle("b"),
        ]);
        assert_eq!(err.to_string(), "2 compound member(s) failed: a; b");
    }

    #[test]
    fn test_leaf_errors_flatten_nested_compounds() {
        let inner = CompoundError::new(vec![
            ReactionError::Particle(2),
            ReactionError::Particle(3),
        ]);
        let outer = CompoundError::new(vec![
            ReactionError::Particle(1),
            ReactionError::Compound(inner),
        ]);

        assert_eq!(outer.len(), 2);
        assert_eq!(outer.leaf_errors(), vec![&1, &2, &3]);
    }
}
