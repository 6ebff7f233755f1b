//! Error types for the AllJoyn codec and document reader/writer.

use std::path::PathBuf;

use t2t_protocol::SchemaError;
use thiserror::Error;

/// Errors converting between type signatures and type descriptors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CodecError {
    #[error("invalid type signature '{signature}': {reason}")]
    InvalidSignature { signature: String, reason: String },
    #[error("type has no AllJoyn representation: {0}")]
    UnsupportedType(String),
    #[error("unsupported integer min/max values: {minimum:?}/{maximum:?}")]
    UnsupportedRange {
        minimum: Option<i128>,
        maximum: Option<i128>,
    },
}

/// Errors reading or writing an introspection document.
#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("malformed XML: {0}")]
    Xml(#[from] roxmltree::Error),
    #[error("missing {0} element(s)")]
    MissingElement(&'static str),
    #[error("missing {element}/{attribute} attribute")]
    MissingAttribute {
        element: &'static str,
        attribute: &'static str,
    },
    #[error("invalid value '{value}' for {element}/{attribute} attribute")]
    InvalidAttribute {
        element: &'static str,
        attribute: &'static str,
        value: String,
    },
    #[error("signal '{signal}' is missing its out argument")]
    MissingSignalPayload { signal: String },
    #[error("signal '{signal}' declares more than one out argument")]
    MultipleSignalPayloads { signal: String },
    #[error("signal '{signal}' declares an in argument; signal inputs are not supported")]
    SignalInputNotSupported { signal: String },
    #[error("type of {element} '{name}': {source}")]
    Codec {
        element: &'static str,
        name: String,
        #[source]
        source: CodecError,
    },
    #[error(transparent)]
    Schema(#[from] SchemaError),
    #[error("io error on {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
