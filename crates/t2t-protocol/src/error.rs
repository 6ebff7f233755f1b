//! Error types for building the interface model.

use thiserror::Error;

/// Errors raised while constructing or loading interfaces. Any of these
/// aborts the construction as a whole; no partial model is produced.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SchemaError {
    #[error("{kind} name must be non-empty")]
    EmptyName { kind: &'static str },
    #[error("cyclic interface reference: {}", path.join(" -> "))]
    CyclicReference { path: Vec<String> },
    #[error("interface {interface} references unknown interface {reference}")]
    UnknownReference { interface: String, reference: String },
    #[error("interface {0} is declared more than once")]
    DuplicateInterface(String),
    #[error("declarations for property '{property}' of interface {interface} have inconsistent types")]
    InconsistentPropertyType { interface: String, property: String },
    #[error("declarations for method '{method}' of interface {interface} have inconsistent parameters")]
    InconsistentMethod { interface: String, method: String },
    #[error("method '{method}' of interface {interface} declares more than one out parameter")]
    MultipleOutParameters { interface: String, method: String },
    #[error("interface unavailable: {0}")]
    Unavailable(String),
}

/// Convenience result type for schema operations.
pub type SchemaResult<T> = Result<T, SchemaError>;
