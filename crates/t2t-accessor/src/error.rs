//! Error types for member access on translator devices.

use thiserror::Error;

/// Errors raised by [`DeviceAccessor`](crate::DeviceAccessor) operations.
///
/// Validation failures (unknown interface, missing member, bad arguments) are
/// returned before any translator code runs. Failures of the translator call
/// itself surface as [`AccessError::Adapter`] when the pending call settles.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AccessError {
    #[error("interface not implemented by translator: {interface}")]
    InterfaceNotImplemented { interface: String },
    #[error("property '{property}' getter for interface {interface} not implemented by translator")]
    PropertyGetterNotImplemented { interface: String, property: String },
    #[error("property '{property}' setter for interface {interface} not implemented by translator")]
    PropertySetterNotImplemented { interface: String, property: String },
    #[error("method '{method}' for interface {interface} not implemented by translator")]
    MethodNotImplemented { interface: String, method: String },
    #[error("property '{property}' notifier for interface {interface} not implemented by translator")]
    NotifierNotImplemented { interface: String, property: String },
    #[error("invalid arguments for method '{method}': {reason}")]
    InvalidArguments { method: String, reason: String },
    #[error("member name must be non-empty")]
    InvalidMemberName,
    #[error("translator call '{member}' for interface {interface} failed: {message}")]
    Adapter {
        interface: String,
        member: String,
        message: String,
    },
    #[error("translator failed to create device: {0}")]
    DeviceCreation(String),
}

/// Convenience result type for accessor operations.
pub type AccessResult<T> = Result<T, AccessError>;
