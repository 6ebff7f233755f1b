//! # t2t-protocol: translator interface model
//!
//! Shared types that describe what a device translator exposes. The crate is
//! dependency-light (no runtime, no XML) so every reader, writer and accessor
//! can depend on it as a pure contract crate.
//!
//! ## Module Overview
//!
//! - [`types`]: TypeDescriptor, the JSON-Schema-shaped structural type
//! - [`schema`]: Interface, Property, Method, Parameter and interface merging
//! - [`catalog`]: InterfaceCatalog, name-keyed declarations resolved into an acyclic graph
//! - [`ports`]: InterfaceProvider boundary
//! - [`error`]: SchemaError, SchemaResult

pub mod catalog;
pub mod error;
pub mod ports;
pub mod schema;
pub mod types;

pub use catalog::{InterfaceCatalog, InterfaceDeclaration};
pub use error::{SchemaError, SchemaResult};
pub use ports::InterfaceProvider;
pub use schema::{Characteristic, Interface, InterfaceBuilder, Method, Parameter, Property};
pub use types::{ArrayItems, TypeDescriptor};
