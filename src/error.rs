use thiserror::Error;

/// Error kinds surfaced by the fallible mutators and constructors of this
/// crate.
///
/// `EmptyInput` is deliberately absent: epsilon elimination, determinization
/// and minimization all accept empty automata and return the empty
/// automaton rather than failing.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// An argument is not of the required semantic shape.
    #[error("type mismatch: {0}")]
    TypeMismatch(String),

    /// A mutation would violate a structural invariant of the automaton
    /// (e.g. a conflicting deterministic edge, or a reference to a state
    /// absent from `Q` where presence is required).
    #[error("invariant violation: {0}")]
    InvariantViolation(String),

    /// The requested edge is forbidden by the capability of the container
    /// (e.g. an epsilon edge or a nondeterministic fan-out on a DFA).
    #[error("forbidden operation: {0}")]
    ForbiddenOperation(String),
}

pub type Result<T> = std::result::Result<T, Error>;
