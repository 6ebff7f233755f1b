//! # t2t-alljoyn: AllJoyn introspection support
//!
//! Imports and exports translator interfaces in the D-Bus style introspection
//! XML used by AllJoyn, and converts the type signatures found in that XML to
//! and from [`t2t_protocol::TypeDescriptor`]s.
//!
//! - [`signature`]: `decode` / `encode` between signatures and descriptors
//! - [`reader`]: XML → interfaces (property/signal merging, signal payload checks)
//! - [`writer`]: interfaces → XML
//! - [`provider`]: directory-backed `InterfaceProvider`

pub mod error;
pub mod provider;
pub mod reader;
pub mod signature;
pub mod writer;

pub use error::{CodecError, DocumentError};
pub use provider::DirectoryInterfaceProvider;
pub use reader::{read_interfaces, read_interfaces_from_file};
pub use signature::{decode, encode};
pub use writer::{write_interfaces, write_interfaces_to_file};
