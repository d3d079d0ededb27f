//! Operations
//!
//! This module turns the root fields of an introspected schema into MCP tools, and synthesizes
//! the GraphQL document each tool sends.

mod catalog;
mod operation;
pub mod schema_walker;
#[cfg(test)]
pub(crate) mod test_support;

pub use catalog::Catalog;
pub use operation::{ArgDescriptor, FieldDescriptor, Operation, OperationKind, synthesize_document};
