use crate::automaton::Kind;

/// Structural failures. A simulation that merely rejects its input is not an
/// error; it is reported in-band through [`crate::Run::accepted`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    #[error("{operation} expects {expected}, found {found}")]
    WrongKind {
        operation: &'static str,
        expected: &'static str,
        found: Kind,
    },

    #[error("automaton has no start state")]
    MissingStart,

    /// The interchange document describes something other than a finite
    /// automaton.
    #[error("unsupported structure type {0:?}, only finite automata (\"fa\") can be imported")]
    UnsupportedStructure(String),

    #[error("malformed document: {}", .0.join("; "))]
    Malformed(Vec<String>),

    #[error("invalid json: {0}")]
    Json(String),
}
